pub mod filtering;
#[cfg(feature = "memory")]
pub mod memory;
pub mod metadata;
pub mod nested;
pub mod operators;
pub mod query;

pub use crate::filtering::{
    EntityContext, FieldDescriptor, Filter, FilterData, FilterDescriptor, FilterError,
    FilterValues, PathError,
};
pub use crate::metadata::{
    AssociationKind, Entity, EntityMetadata, MetadataProvider, MetadataRegistry,
};
pub use crate::nested::NestedFilter;
pub use crate::operators::ComparisonOperator;
pub use crate::query::QueryBuilder;

#[cfg(feature = "derive")]
pub use nested_filter_derive::Entity;
