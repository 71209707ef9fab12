use super::{Boolean, Direction, GroupBuilder, QueryBuilder, TrashMode};
use crate::filtering::{Operator, Param};
use crate::pagination::PageRequest;

/// One recorded query-builder call.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    With(String),
    WithCount(String),
    Where {
        column: String,
        operator: Operator,
        value: Param,
    },
    Group {
        boolean: Boolean,
        directives: Vec<Directive>,
    },
    OrderBy {
        column: String,
        direction: Direction,
    },
    RandomOrder,
    PageSize(u64),
    Trash(TrashMode),
    Paginate(PageRequest),
}

/// A [`QueryBuilder`] that records every call in order.
///
/// Useful to inspect what a request asks for before translating it to a
/// concrete query engine, and in tests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryPlan {
    directives: Vec<Directive>,
}

impl QueryPlan {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            directives: Vec::new(),
        }
    }

    #[must_use]
    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    #[must_use]
    pub fn into_directives(self) -> Vec<Directive> {
        self.directives
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.directives.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    /// Last page size set, if any
    #[must_use]
    pub fn page_size(&self) -> Option<u64> {
        self.directives.iter().rev().find_map(|d| match d {
            Directive::PageSize(size) => Some(*size),
            _ => None,
        })
    }

    /// Relations requested for eager loading
    #[must_use]
    pub fn relations(&self) -> Vec<&str> {
        self.directives
            .iter()
            .filter_map(|d| match d {
                Directive::With(relation) => Some(relation.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl QueryBuilder for QueryPlan {
    fn with_relation(&mut self, relation: &str) {
        self.directives.push(Directive::With(relation.to_string()));
    }

    fn with_count(&mut self, relation: &str) {
        self.directives.push(Directive::WithCount(relation.to_string()));
    }

    fn where_clause(
        &mut self,
        column: &str,
        operator: Operator,
        value: &Param,
    ) -> Result<(), String> {
        self.directives.push(Directive::Where {
            column: column.to_string(),
            operator,
            value: value.clone(),
        });
        Ok(())
    }

    fn where_group(&mut self, boolean: Boolean, build: &mut GroupBuilder<'_>) -> Result<(), String> {
        let mut group = Self::new();
        build(&mut group)?;
        self.directives.push(Directive::Group {
            boolean,
            directives: group.directives,
        });
        Ok(())
    }

    fn order_by(&mut self, column: &str, direction: Direction) {
        self.directives.push(Directive::OrderBy {
            column: column.to_string(),
            direction,
        });
    }

    fn random_order(&mut self) {
        self.directives.push(Directive::RandomOrder);
    }

    fn set_page_size(&mut self, size: u64) {
        self.directives.push(Directive::PageSize(size));
    }

    fn trash_visibility(&mut self, mode: TrashMode) {
        self.directives.push(Directive::Trash(mode));
    }

    fn paginate(&mut self, page: &PageRequest) {
        self.directives.push(Directive::Paginate(page.clone()));
    }
}
