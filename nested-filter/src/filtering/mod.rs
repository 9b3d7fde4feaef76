//! # Filters over queries
//!
//! A [`Filter`] is a configured restriction that can be applied to a
//! [`QueryBuilder`]. It describes itself with a [`FilterDescriptor`]
//! (which property it filters, and how its form is configured), and
//! when a request supplies values for it, it receives them as
//! [`FilterData`] and turns them into conditions on the query.
//!
//! Filters only ever see properties belonging directly to the entity
//! described by the [`EntityContext`] they are given, under the alias
//! in the [`FilterData`]. To filter on a property reached through
//! associations, wrap the filter in a
//! [`NestedFilter`](crate::nested::NestedFilter), which rewrites both
//! before delegating.
//!
//! The filters in [`ops`] are small reference implementations of
//! comparison semantics.
//!
//! Example:
//! ```rust
//! use nested_filter::filtering::{EntityContext, Filter, FilterData, FilterValues};
//! use nested_filter::filtering::ops::ComparisonFilter;
//! use nested_filter::memory::MemoryQueryBuilder;
//! use nested_filter::metadata::{EntityMetadata, MetadataProvider, MetadataRegistry};
//! use nested_filter::operators::ComparisonOperator;
//!
//! let mut registry = MetadataRegistry::new();
//! registry.register(EntityMetadata::new("Author").with_field("age"));
//! let entity = EntityContext::new(registry.class_metadata("Author").unwrap());
//!
//! let mut qb = MemoryQueryBuilder::new("Author", "entity", registry);
//! let filter = ComparisonFilter::new("age");
//! let data = FilterData::new(
//!     0,
//!     filter.descriptor().clone(),
//!     "entity",
//!     FilterValues::new(serde_json::json!(30), ComparisonOperator::Gte),
//! );
//! filter.apply(&mut qb, &data, None, &entity).unwrap();
//! assert_eq!(
//!     qb.dql(),
//!     "SELECT entity FROM Author entity WHERE (entity.age >= :age_0)"
//! );
//! ```

pub mod ops;

use std::fmt::Debug;
use std::sync::Arc;

use thiserror::Error;

use crate::metadata::EntityMetadata;
use crate::operators::ComparisonOperator;
use crate::query::QueryBuilder;

/// Errors produced by filtering.
#[derive(Debug, Error)]
pub enum FilterError {
    /// A property path could not be used.
    #[error(transparent)]
    InvalidPath(#[from] PathError),
    /// There is no metadata for the named class.
    #[error("no metadata for class '{0}'")]
    UnknownClass(String),
    /// A join could not be added to the query.
    #[error("cannot join '{join}' as '{alias}': {reason}")]
    InvalidJoin {
        join: String,
        alias: String,
        reason: String,
    },
    /// A query parameter name was bound twice.
    #[error("parameter ':{0}' is already bound")]
    DuplicateParameter(String),
    /// The filter data carries a value the filter cannot use.
    #[error("invalid filter value: {0}")]
    InvalidValue(String),
    /// A filter failed for its own reasons.
    #[error(transparent)]
    Apply(#[from] anyhow::Error),
}

/// Errors in nested property paths.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    /// A path given to [`NestedFilter::wrap`](crate::nested::NestedFilter::wrap)
    /// does not traverse anything.
    #[error("the nested property path must contain '{separator}', '{path}' given")]
    MissingSeparator { path: String, separator: char },
    /// A segment names neither a field nor an association.
    #[error("the property path '{path}' for class '{class}' is invalid")]
    InvalidSegment { path: String, class: String },
    /// A segment before the last is not something that can be joined.
    #[error("the property path '{path}' should traverse only valid associations, '{segment}' is not one")]
    NotAssociation { path: String, segment: String },
}

/// The configuration of a filter.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterDescriptor {
    /// The property filtered on.
    pub property: String,
    /// The form type used to render the filter.
    pub form_type: String,
    /// Options for the form type.
    pub form_type_options: serde_json::Map<String, serde_json::Value>,
    /// Identifies the filter implementation.
    pub filter_type: String,
}

impl FilterDescriptor {
    pub fn new(
        property: impl Into<String>,
        form_type: impl Into<String>,
        filter_type: impl Into<String>,
    ) -> Self {
        Self {
            property: property.into(),
            form_type: form_type.into(),
            form_type_options: serde_json::Map::new(),
            filter_type: filter_type.into(),
        }
    }

    /// Set a form type option, replacing any earlier value.
    pub fn set_form_type_option(&mut self, name: impl Into<String>, value: serde_json::Value) {
        self.form_type_options.insert(name.into(), value);
    }

    pub fn form_type_option(&self, name: &str) -> Option<&serde_json::Value> {
        self.form_type_options.get(name)
    }
}

/// The values supplied by a request for one filter.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterValues {
    pub value: serde_json::Value,
    /// The upper bound for range comparisons, `Null` otherwise.
    pub value2: serde_json::Value,
    pub comparison: ComparisonOperator,
}

impl FilterValues {
    pub fn new(value: serde_json::Value, comparison: ComparisonOperator) -> Self {
        Self {
            value,
            value2: serde_json::Value::Null,
            comparison,
        }
    }

    pub fn with_value2(mut self, value2: serde_json::Value) -> Self {
        self.value2 = value2;
        self
    }
}

/// One filter's part of a request: which filter, against which
/// alias, with what values.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterData {
    index: usize,
    descriptor: FilterDescriptor,
    entity_alias: String,
    values: FilterValues,
}

impl FilterData {
    /// Create filter data. `index` is the position of the filter
    /// among those applied to the same query, and keeps parameter
    /// names unique.
    pub fn new(
        index: usize,
        descriptor: FilterDescriptor,
        entity_alias: impl Into<String>,
        values: FilterValues,
    ) -> Self {
        Self {
            index,
            descriptor,
            entity_alias: entity_alias.into(),
            values,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn descriptor(&self) -> &FilterDescriptor {
        &self.descriptor
    }

    /// The property being filtered, taken from the descriptor.
    pub fn property(&self) -> &str {
        &self.descriptor.property
    }

    pub fn entity_alias(&self) -> &str {
        &self.entity_alias
    }

    pub fn values(&self) -> &FilterValues {
        &self.values
    }

    pub fn value(&self) -> &serde_json::Value {
        &self.values.value
    }

    pub fn value2(&self) -> &serde_json::Value {
        &self.values.value2
    }

    pub fn comparison(&self) -> ComparisonOperator {
        self.values.comparison
    }

    /// The parameter name a filter should bind its value under.
    pub fn parameter_name(&self) -> String {
        format!("{}_{}", self.descriptor.property, self.index)
    }

    /// The parameter name for the upper bound of a range. It never
    /// ends in digits, so it cannot be another filter's
    /// [`parameter_name`](Self::parameter_name).
    pub fn upper_parameter_name(&self) -> String {
        format!("{}_{}_upper", self.descriptor.property, self.index)
    }
}

/// The entity a filter is applied to.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityContext {
    class: String,
    metadata: Arc<EntityMetadata>,
}

impl EntityContext {
    pub fn new(metadata: Arc<EntityMetadata>) -> Self {
        Self {
            class: metadata.name().to_string(),
            metadata,
        }
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn metadata(&self) -> &Arc<EntityMetadata> {
        &self.metadata
    }
}

/// Display information for the field a filter was declared on.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldDescriptor {
    pub property: String,
    pub label: Option<String>,
}

/// A restriction that can be applied to a query.
pub trait Filter: Debug + Send + Sync {
    /// Describe this filter's configuration.
    fn descriptor(&self) -> &FilterDescriptor;

    /// Restrict `query` using the values in `data`. The filtered
    /// property is `data.property()` on the entity described by
    /// `entity`, which is known in the query as
    /// `data.entity_alias()`.
    fn apply(
        &self,
        query: &mut dyn QueryBuilder,
        data: &FilterData,
        field: Option<&FieldDescriptor>,
        entity: &EntityContext,
    ) -> Result<(), FilterError>;
}
