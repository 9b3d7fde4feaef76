//! The query construction interface filters work against.
//!
//! A [`QueryBuilder`] is one query under construction. Filters add
//! joins, conditions and parameters to it; nothing here executes the
//! query. The builder also exposes the [`MetadataProvider`] for the
//! data model it queries, so that filters can inspect the mapping of
//! the classes they touch.

use crate::filtering::FilterError;
use crate::metadata::MetadataProvider;

/// A query under construction.
///
/// Aliases name the entities taking part in the query: the root
/// entity has one, and each join declares another. Join expressions
/// are of the form `<alias>.<association>`.
pub trait QueryBuilder {
    /// Add a left join of the association `join` (`alias.association`)
    /// under the new alias `alias`.
    fn left_join(&mut self, join: &str, alias: &str) -> Result<(), FilterError>;

    /// Every alias currently declared, the root alias first, then
    /// joined aliases in the order they were added.
    fn all_aliases(&self) -> Vec<String>;

    /// The metadata for the data model this query runs against.
    fn metadata(&self) -> &dyn MetadataProvider;

    /// Add a condition that every result must satisfy, in addition to
    /// any already present.
    fn and_where(&mut self, condition: &str);

    /// Bind a named parameter used in a condition. A name can only
    /// be bound once per query.
    fn set_parameter(&mut self, name: &str, value: serde_json::Value) -> Result<(), FilterError>;
}
