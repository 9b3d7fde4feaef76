//! Comparison operators carried by filter data.
//!
//! Operators have the textual forms used in query expressions, and
//! can be parsed from and displayed as those forms:
//!
//! [`ComparisonOperator`]   | Text
//! -------------------------|--------------
//! [`Eq`](ComparisonOperator::Eq)               | `=`
//! [`Neq`](ComparisonOperator::Neq)             | `!=`
//! [`Lt`](ComparisonOperator::Lt)               | `<`
//! [`Lte`](ComparisonOperator::Lte)             | `<=`
//! [`Gt`](ComparisonOperator::Gt)               | `>`
//! [`Gte`](ComparisonOperator::Gte)             | `>=`
//! [`Like`](ComparisonOperator::Like)           | `like`
//! [`NotLike`](ComparisonOperator::NotLike)     | `not like`
//! [`Between`](ComparisonOperator::Between)     | `between`
//! [`In`](ComparisonOperator::In)               | `in`
//! [`IsNull`](ComparisonOperator::IsNull)       | `is null`
//! [`IsNotNull`](ComparisonOperator::IsNotNull) | `is not null`

/// How a filter's value is compared with the filtered property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
pub enum ComparisonOperator {
    #[strum(serialize = "=")]
    Eq,
    #[strum(serialize = "!=")]
    Neq,
    #[strum(serialize = "<")]
    Lt,
    #[strum(serialize = "<=")]
    Lte,
    #[strum(serialize = ">")]
    Gt,
    #[strum(serialize = ">=")]
    Gte,
    #[strum(serialize = "like")]
    Like,
    #[strum(serialize = "not like")]
    NotLike,
    #[strum(serialize = "between")]
    Between,
    #[strum(serialize = "in")]
    In,
    #[strum(serialize = "is null")]
    IsNull,
    #[strum(serialize = "is not null")]
    IsNotNull,
}

impl ComparisonOperator {
    /// The number of values the operator consumes: zero for the null
    /// checks, two for `between`, one otherwise.
    pub fn arity(&self) -> usize {
        match self {
            ComparisonOperator::IsNull | ComparisonOperator::IsNotNull => 0,
            ComparisonOperator::Between => 2,
            _ => 1,
        }
    }
}

impl Default for ComparisonOperator {
    fn default() -> Self {
        ComparisonOperator::Eq
    }
}
