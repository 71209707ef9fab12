//! Comparison operators accepted by the `operator` parameter.

use std::fmt;

/// A comparison operator.
///
/// Operators are looked up either by name (`gte`, `not_like`) or by symbol
/// (`>=`). Operators flagged as collection operators expect a list value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Equality (=)
    Eq,
    /// Not equal (!=)
    NotEq,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Gte,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Lte,
    /// LIKE pattern matching
    Like,
    /// NOT LIKE pattern matching
    NotLike,
    /// IN (list of values)
    In,
    /// NOT IN (list of values)
    NotIn,
    /// IS NULL
    Null,
    /// IS NOT NULL
    NotNull,
}

impl Operator {
    pub const ALL: [Self; 12] = [
        Self::Eq,
        Self::NotEq,
        Self::Gt,
        Self::Gte,
        Self::Lt,
        Self::Lte,
        Self::Like,
        Self::NotLike,
        Self::In,
        Self::NotIn,
        Self::Null,
        Self::NotNull,
    ];

    /// Find an operator by name, alias or symbol
    #[must_use]
    pub fn find(key: &str) -> Option<Self> {
        let key = key.trim();
        Self::ALL.into_iter().find(|op| op.matches(key))
    }

    /// Whether `key` designates this operator
    #[must_use]
    pub fn matches(self, key: &str) -> bool {
        self.name() == key || self.symbol() == key || self.aliases().contains(&key)
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::NotEq => "not_eq",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Like => "like",
            Self::NotLike => "not_like",
            Self::In => "in",
            Self::NotIn => "not_in",
            Self::Null => "null",
            Self::NotNull => "not_null",
        }
    }

    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Like => "like",
            Self::NotLike => "not like",
            Self::In => "in",
            Self::NotIn => "not in",
            Self::Null => "is null",
            Self::NotNull => "is not null",
        }
    }

    const fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Eq => &["equal", "=="],
            Self::NotEq => &["not_equal", "<>", "neq"],
            Self::Gt => &["greater"],
            Self::Gte => &["greater_or_equal"],
            Self::Lt => &["lower"],
            Self::Lte => &["lower_or_equal"],
            Self::NotLike => &["not like"],
            Self::In => &["where_in"],
            Self::NotIn => &["where_not_in"],
            Self::Null => &["is_null"],
            Self::NotNull => &["is_not_null"],
            Self::Like => &[],
        }
    }

    /// Operators that compare against a list of values
    #[must_use]
    pub const fn needs_collection(self) -> bool {
        matches!(self, Self::In | Self::NotIn)
    }

    /// Operators that take no value at all
    #[must_use]
    pub const fn needs_no_value(self) -> bool {
        matches!(self, Self::Null | Self::NotNull)
    }

    /// Name of the operator-specific builder hook a field may provide
    #[must_use]
    pub const fn where_method(self) -> &'static str {
        match self {
            Self::In => "where_in",
            Self::NotIn => "where_not_in",
            Self::Null => "where_null",
            Self::NotNull => "where_not_null",
            _ => "where",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
