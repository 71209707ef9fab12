use heck::ToSnakeCase;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

use super::{Filter, Flow};
use crate::errors::{FilterError, FilterErrors};
use crate::filtering::{ParameterSet, normalize};
use crate::filters::{Page, PerPage};
use crate::meta::MetaRef;
use crate::pagination::{CURSOR_KEY, PAGE_KEY, PageRequest};
use crate::targets::{QueryBuilder, Record, RecordCollection, RelatedRecord, Target};

/// Raw request parameters, keyed by filter name, in encounter order
pub type RawQuery = Map<String, Value>;

/// Creation hook run on every registration.
///
/// Receives the canonical name and the filter, and returns the filter to
/// register, possibly replaced, or `None` to skip the registration.
pub type Interceptor = Box<dyn Fn(&str, Box<dyn Filter>) -> Option<Box<dyn Filter>> + Send + Sync>;

/// Named filters of one model, and the fold applying them to a target.
///
/// ```rust,ignore
/// let registry = FilterRegistry::setup(meta, |filters| {
///     filters.register("order_by", OrderBy::new(&config.order_by))?;
///     filters.register("per_page", PerPage::new(&config.per_page))?;
///     Ok(())
/// })?;
///
/// let query = registry.apply_to_query(QueryPlan::new(), &raw)?;
/// ```
pub struct FilterRegistry {
    meta: MetaRef,
    filters: Vec<Box<dyn Filter>>,
    paginate: bool,
    interceptor: Option<Interceptor>,
}

impl fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterRegistry")
            .field("model", &self.meta.model_name())
            .field("filters", &self.names())
            .field("paginate", &self.paginate)
            .field("intercepted", &self.interceptor.is_some())
            .finish()
    }
}

impl FilterRegistry {
    #[must_use]
    pub fn new(meta: MetaRef) -> Self {
        Self {
            meta,
            filters: Vec::new(),
            paginate: false,
            interceptor: None,
        }
    }

    /// Build a registry and let `define` register its filters
    pub fn setup<F>(meta: MetaRef, define: F) -> Result<Self, FilterError>
    where
        F: FnOnce(&mut Self) -> Result<(), FilterError>,
    {
        let mut registry = Self::new(meta);
        define(&mut registry)?;
        tracing::debug!(
            model = %registry.meta.model_name(),
            filters = ?registry.names(),
            "Filter registry ready"
        );
        Ok(registry)
    }

    /// Pagination mode: `page` and `cursor` are consumed by pagination
    /// resolution and are no longer unknown filters
    #[must_use]
    pub const fn paginate(mut self, paginate: bool) -> Self {
        self.paginate = paginate;
        self
    }

    #[must_use]
    pub fn intercept<F>(mut self, interceptor: F) -> Self
    where
        F: Fn(&str, Box<dyn Filter>) -> Option<Box<dyn Filter>> + Send + Sync + 'static,
    {
        self.interceptor = Some(Box::new(interceptor));
        self
    }

    #[must_use]
    pub const fn is_paginating(&self) -> bool {
        self.paginate
    }

    #[must_use]
    pub fn meta(&self) -> &MetaRef {
        &self.meta
    }

    /// Register `filter` under the snake-cased `name`
    pub fn register<F>(&mut self, name: &str, filter: F) -> Result<&mut Self, FilterError>
    where
        F: Filter + 'static,
    {
        self.set(name, Box::new(filter))
    }

    pub fn set(&mut self, name: &str, filter: Box<dyn Filter>) -> Result<&mut Self, FilterError> {
        let name = name.to_snake_case();
        if self.has(&name) {
            return Err(FilterError::configuration(
                &name,
                "A filter is already registered under this name",
            ));
        }

        let mut filter = match &self.interceptor {
            Some(intercept) => match intercept(&name, filter) {
                Some(filter) => filter,
                None => {
                    tracing::debug!(filter = %name, "Filter registration vetoed");
                    return Ok(self);
                }
            },
            None => filter,
        };

        filter.base_mut().set_name(name.as_str())?;
        filter.base_mut().own(&name, Arc::clone(&self.meta))?;
        filter.owned()?;

        tracing::debug!(
            filter = %name,
            kind = filter.type_name(),
            model = %self.meta.model_name(),
            "Registered filter"
        );
        self.filters.push(filter);

        Ok(self)
    }

    /// Look a filter up by name.
    ///
    /// `Ok(None)` means the name is reserved for pagination and is not a
    /// filter; any other unknown name is a `NotFound` error.
    pub fn get(&self, name: &str) -> Result<Option<&dyn Filter>, FilterError> {
        if let Some(filter) = self.filters.iter().find(|f| f.name() == name) {
            return Ok(Some(filter.as_ref()));
        }

        if self.paginate && (name == PAGE_KEY || name == CURSOR_KEY) {
            return Ok(None);
        }

        Err(FilterError::not_found(name))
    }

    /// Typed access to a registered filter
    #[must_use]
    pub fn get_as<T: 'static>(&self, name: &str) -> Option<&T> {
        self.filters
            .iter()
            .find(|f| f.name() == name)
            .and_then(|f| f.as_any().downcast_ref::<T>())
    }

    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.filters.iter().any(|f| f.name() == name)
    }

    /// Registered names, in registration order
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.filters.iter().map(|f| f.name().to_string()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// First registered filter of type `T`
    fn find<T: 'static>(&self) -> Option<&T> {
        self.filters
            .iter()
            .find_map(|f| f.as_any().downcast_ref::<T>())
    }

    /// Apply every requested filter to `target`, in encounter order.
    ///
    /// Filters without the capability for the target's kind are skipped.
    /// Stops at the first error, or at the first occurrence asking for the
    /// target to be excluded.
    pub fn apply_to(&self, mut target: Target<'_>, raw: &RawQuery) -> Result<Flow, FilterError> {
        let kind = target.kind();

        for (name, value) in raw {
            let Some(filter) = self.get(name)? else {
                continue;
            };

            if !filter.supports(kind) {
                tracing::trace!(filter = %name, ?kind, "Filter does not apply to target");
                continue;
            }

            for occurrence in normalize(value) {
                let params = filter.build_params(occurrence)?;
                let flow = apply_once(filter, &mut target, &params).unwrap_or(Ok(Flow::Continue))?;

                if flow == Flow::Exclude {
                    tracing::debug!(filter = %name, ?kind, "Target excluded by filter");
                    return Ok(Flow::Exclude);
                }
            }

            tracing::debug!(filter = %name, ?kind, "Applied filter");
        }

        Ok(Flow::Continue)
    }

    /// Fold over a query; `None` when a filter excluded it
    pub fn apply_to_query<Q>(&self, mut query: Q, raw: &RawQuery) -> Result<Option<Q>, FilterError>
    where
        Q: QueryBuilder,
    {
        Ok(match self.apply_to(Target::Query(&mut query), raw)? {
            Flow::Continue => Some(query),
            Flow::Exclude => None,
        })
    }

    /// Fold over a query, then paginate it when pagination mode is on
    pub fn paginate_query<Q>(&self, query: Q, raw: &RawQuery) -> Result<Option<Q>, FilterError>
    where
        Q: QueryBuilder,
    {
        let Some(mut query) = self.apply_to_query(query, raw)? else {
            return Ok(None);
        };

        if let Some(page) = self.resolve_pagination(raw)? {
            query.paginate(&page);
        }

        Ok(Some(query))
    }

    pub fn apply_to_collection<C>(
        &self,
        mut collection: C,
        raw: &RawQuery,
    ) -> Result<Option<C>, FilterError>
    where
        C: RecordCollection,
    {
        Ok(match self.apply_to(Target::Collection(&mut collection), raw)? {
            Flow::Continue => Some(collection),
            Flow::Exclude => None,
        })
    }

    pub fn apply_to_record<R>(&self, mut record: R, raw: &RawQuery) -> Result<Option<R>, FilterError>
    where
        R: Record,
    {
        Ok(match self.apply_to(Target::Record(&mut record), raw)? {
            Flow::Continue => Some(record),
            Flow::Exclude => None,
        })
    }

    pub fn apply_to_related<R>(&self, mut record: R, raw: &RawQuery) -> Result<Option<R>, FilterError>
    where
        R: RelatedRecord,
    {
        Ok(match self.apply_to(Target::Related(&mut record), raw)? {
            Flow::Continue => Some(record),
            Flow::Exclude => None,
        })
    }

    /// Build every occurrence without applying anything.
    ///
    /// Validation failures are collected across filters. An unknown filter
    /// name still aborts at once.
    pub fn validate(&self, raw: &RawQuery) -> Result<(), FilterErrors> {
        let mut errors = FilterErrors::new();

        for (name, value) in raw {
            let Some(filter) = self.get(name)? else {
                continue;
            };

            for occurrence in normalize(value) {
                if let Err(error) = filter.build_params(occurrence) {
                    errors.push(error);
                }
            }
        }

        if let Err(error) = self.resolve_pagination(raw) {
            errors.push(error);
        }

        errors.result()
    }

    /// Page request for `raw`, or `None` when pagination mode is off.
    ///
    /// A `cursor` key wins over the page number. The page size comes from
    /// the registered [`PerPage`] filter, else from the model's default.
    pub fn resolve_pagination(&self, raw: &RawQuery) -> Result<Option<PageRequest>, FilterError> {
        if !self.paginate {
            return Ok(None);
        }

        let per_page = self.per_page(raw)?;

        if let Some(cursor) = raw.get(CURSOR_KEY) {
            return match cursor {
                Value::String(cursor) if !cursor.is_empty() => Ok(Some(PageRequest::Cursor {
                    cursor: cursor.clone(),
                    per_page,
                })),
                _ => Err(FilterError::validation(
                    CURSOR_KEY,
                    "The cursor must be a non-empty string",
                )),
            };
        }

        let fallback;
        let page: &dyn Filter = match self.find::<Page>() {
            Some(page) => page,
            None => {
                fallback = Page::default();
                &fallback
            }
        };

        Ok(Some(PageRequest::Offset {
            page: positive(page, &occurrence_for(page, raw))?,
            per_page,
        }))
    }

    fn per_page(&self, raw: &RawQuery) -> Result<u64, FilterError> {
        match self.find::<PerPage>() {
            Some(per_page) => positive(per_page, &occurrence_for(per_page, raw)),
            None => Ok(self.meta.default_per_page()),
        }
    }
}

/// Last occurrence of `filter` in `raw`, or an empty one
fn occurrence_for(filter: &dyn Filter, raw: &RawQuery) -> ParameterSet {
    raw.get(filter.name())
        .and_then(|value| normalize(value).pop())
        .unwrap_or_default()
}

/// Built `value` of `occurrence` as a positive integer
fn positive(filter: &dyn Filter, occurrence: &ParameterSet) -> Result<u64, FilterError> {
    let params = filter.build_params(occurrence.clone())?;
    params
        .value()
        .as_i64()
        .and_then(|value| u64::try_from(value).ok())
        .filter(|value| *value > 0)
        .ok_or_else(|| FilterError::validation(filter.name(), "Must be a positive integer"))
}

fn apply_once(
    filter: &dyn Filter,
    target: &mut Target<'_>,
    params: &ParameterSet,
) -> Option<Result<Flow, FilterError>> {
    match target {
        Target::Query(query) => filter.as_query().map(|f| f.filter_query(&mut **query, params)),
        Target::Collection(collection) => filter
            .as_collection()
            .map(|f| f.filter_collection(&mut **collection, params)),
        Target::Record(record) => filter
            .as_record()
            .map(|f| f.filter_record(&mut **record, params)),
        Target::Related(record) => filter
            .as_related()
            .map(|f| f.filter_related(&mut **record, params)),
    }
}
