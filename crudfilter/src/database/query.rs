use sea_orm::sea_query::{
    Alias, Asterisk, Condition, Expr, IntoCondition, Order, Query, SelectStatement, SimpleExpr,
    Value,
};
use sea_orm::{EntityTrait, QueryFilter as _, QueryOrder, QuerySelect, Select};

use crate::filtering::{Operator, Param};
use crate::pagination::PageRequest;
use crate::targets::{Boolean, Direction, GroupBuilder, QueryBuilder, TrashMode};

/// A [`QueryBuilder`] producing sea-query conditions and orderings.
///
/// ```rust,ignore
/// let query = registry
///     .paginate_query(SeaQuery::new().with_soft_delete("deleted_at"), &raw)?
///     .unwrap_or_default();
///
/// let todos = query.apply_to_select(todo::Entity::find()).all(&db).await?;
/// ```
#[derive(Debug, Clone)]
pub struct SeaQuery {
    /// Open groups; the first is the root `WHERE` condition
    groups: Vec<Condition>,
    orders: Vec<(SimpleExpr, Order)>,
    relations: Vec<String>,
    counts: Vec<String>,
    page_size: Option<u64>,
    page: Option<PageRequest>,
    soft_delete: Option<String>,
    trash: TrashMode,
    random: String,
}

impl Default for SeaQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl SeaQuery {
    #[must_use]
    pub fn new() -> Self {
        Self {
            groups: vec![Condition::all()],
            orders: Vec::new(),
            relations: Vec::new(),
            counts: Vec::new(),
            page_size: None,
            page: None,
            soft_delete: None,
            trash: TrashMode::Without,
            random: "RANDOM()".to_string(),
        }
    }

    /// Soft-delete column; trashed rows are hidden unless asked for
    #[must_use]
    pub fn with_soft_delete(mut self, column: impl Into<String>) -> Self {
        self.soft_delete = Some(column.into());
        self
    }

    /// SQL function used for random ordering (`RAND()` on MySQL)
    #[must_use]
    pub fn with_random_function(mut self, function: impl Into<String>) -> Self {
        self.random = function.into();
        self
    }

    fn current(&mut self) -> &mut Condition {
        if self.groups.is_empty() {
            self.groups.push(Condition::all());
        }
        let last = self.groups.len() - 1;
        &mut self.groups[last]
    }

    fn push_condition(&mut self, expr: impl IntoCondition) {
        let current = std::mem::replace(self.current(), Condition::all());
        *self.current() = current.add(expr.into_condition());
    }

    /// The full `WHERE` condition, soft-delete visibility included
    #[must_use]
    pub fn condition(&self) -> Condition {
        let mut condition = self.groups.first().cloned().unwrap_or_else(Condition::all);

        if let Some(column) = &self.soft_delete {
            let column = Expr::col(Alias::new(column.as_str()));
            match self.trash {
                TrashMode::With => {}
                TrashMode::Without => condition = condition.add(column.is_null()),
                TrashMode::Only => condition = condition.add(column.is_not_null()),
            }
        }

        condition
    }

    #[must_use]
    pub fn orders(&self) -> &[(SimpleExpr, Order)] {
        &self.orders
    }

    /// Relations requested for eager loading
    #[must_use]
    pub fn relations(&self) -> &[String] {
        &self.relations
    }

    /// Relations whose records should be counted
    #[must_use]
    pub fn counts(&self) -> &[String] {
        &self.counts
    }

    #[must_use]
    pub const fn trash(&self) -> TrashMode {
        self.trash
    }

    /// Row limit: the paginated page size, else the page size filter
    #[must_use]
    pub fn limit(&self) -> Option<u64> {
        self.page.as_ref().map(PageRequest::per_page).or(self.page_size)
    }

    #[must_use]
    pub fn offset(&self) -> Option<u64> {
        self.page.as_ref().and_then(PageRequest::offset)
    }

    /// Cursor handed over by the request, for the caller to decode
    #[must_use]
    pub fn cursor(&self) -> Option<&str> {
        match &self.page {
            Some(PageRequest::Cursor { cursor, .. }) => Some(cursor),
            _ => None,
        }
    }

    /// `SELECT * FROM table` with every filter applied
    #[must_use]
    pub fn into_statement(&self, table: &str) -> SelectStatement {
        let mut statement = Query::select();
        statement.column(Asterisk).from(Alias::new(table));

        let condition = self.condition();
        if !condition.is_empty() {
            statement.cond_where(condition);
        }

        for (expr, order) in &self.orders {
            statement.order_by_expr(expr.clone(), order.clone());
        }
        if let Some(limit) = self.limit() {
            statement.limit(limit);
        }
        if let Some(offset) = self.offset() {
            statement.offset(offset);
        }

        statement
    }

    /// Apply conditions, orderings and limits to an entity query
    #[must_use]
    pub fn apply_to_select<E: EntityTrait>(&self, select: Select<E>) -> Select<E> {
        let condition = self.condition();
        let mut select = if condition.is_empty() {
            select
        } else {
            select.filter(condition)
        };

        for (expr, order) in &self.orders {
            select = select.order_by(expr.clone(), order.clone());
        }

        select.limit(self.limit()).offset(self.offset())
    }
}

fn to_value(column: &str, param: &Param) -> Result<Value, String> {
    Ok(match param {
        Param::Bool(b) => (*b).into(),
        Param::Int(i) => (*i).into(),
        Param::Float(f) => (*f).into(),
        Param::Text(s) => s.as_str().into(),
        Param::Date(d) => (*d).into(),
        Param::DateTime(dt) => (*dt).into(),
        Param::Uuid(u) => (*u).into(),
        Param::Field(field) => field.native().into(),
        Param::Operator(op) => op.name().into(),
        Param::Null => return Err(format!("A value is required to compare `{column}`")),
        Param::List(_) | Param::Map(_) => {
            return Err(format!("`{column}` can only be compared to a single value"));
        }
    })
}

fn to_values(column: &str, param: &Param) -> Result<Vec<Value>, String> {
    match param {
        Param::List(items) => items.iter().map(|item| to_value(column, item)).collect(),
        single => to_value(column, single).map(|value| vec![value]),
    }
}

fn to_pattern(column: &str, param: &Param) -> Result<String, String> {
    param
        .as_text()
        .ok_or_else(|| format!("`{column}` can only be matched against text"))
}

fn comparison(column: &str, operator: Operator, value: &Param) -> Result<SimpleExpr, String> {
    let col = Expr::col(Alias::new(column));

    Ok(match operator {
        Operator::Eq if value.is_null() => col.is_null(),
        Operator::NotEq if value.is_null() => col.is_not_null(),
        Operator::Eq => col.eq(to_value(column, value)?),
        Operator::NotEq => col.ne(to_value(column, value)?),
        Operator::Gt => col.gt(to_value(column, value)?),
        Operator::Gte => col.gte(to_value(column, value)?),
        Operator::Lt => col.lt(to_value(column, value)?),
        Operator::Lte => col.lte(to_value(column, value)?),
        Operator::Like => col.like(to_pattern(column, value)?),
        Operator::NotLike => col.not_like(to_pattern(column, value)?),
        Operator::In => col.is_in(to_values(column, value)?),
        Operator::NotIn => col.is_not_in(to_values(column, value)?),
        Operator::Null => col.is_null(),
        Operator::NotNull => col.is_not_null(),
    })
}

impl QueryBuilder for SeaQuery {
    fn with_relation(&mut self, relation: &str) {
        if !self.relations.iter().any(|r| r == relation) {
            self.relations.push(relation.to_string());
        }
    }

    fn with_count(&mut self, relation: &str) {
        if !self.counts.iter().any(|r| r == relation) {
            self.counts.push(relation.to_string());
        }
    }

    fn where_clause(&mut self, column: &str, operator: Operator, value: &Param) -> Result<(), String> {
        let expr = comparison(column, operator, value)?;
        self.push_condition(expr);
        Ok(())
    }

    fn where_group(&mut self, boolean: Boolean, build: &mut GroupBuilder<'_>) -> Result<(), String> {
        self.groups.push(match boolean {
            Boolean::And => Condition::all(),
            Boolean::Or => Condition::any(),
        });

        let result = build(self);
        let group = if self.groups.len() > 1 {
            self.groups.pop()
        } else {
            None
        };
        result?;

        if let Some(group) = group.filter(|g| !g.is_empty()) {
            self.push_condition(group);
        }
        Ok(())
    }

    fn order_by(&mut self, column: &str, direction: Direction) {
        let order = match direction {
            Direction::Asc => Order::Asc,
            Direction::Desc => Order::Desc,
        };
        self.orders.push((Expr::col(Alias::new(column)).into(), order));
    }

    fn random_order(&mut self) {
        self.orders.push((Expr::cust(self.random.as_str()), Order::Asc));
    }

    fn set_page_size(&mut self, size: u64) {
        self.page_size = Some(size);
    }

    fn trash_visibility(&mut self, mode: TrashMode) {
        if self.soft_delete.is_none() {
            tracing::debug!(?mode, "Trash visibility requested on a query without soft delete");
        }
        self.trash = mode;
    }

    fn paginate(&mut self, page: &PageRequest) {
        self.page = Some(page.clone());
    }
}
