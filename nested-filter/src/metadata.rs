//! # Describe entities and their associations
//!
//! Resolving a nested property path needs to know, for each entity
//! class along the way, which names are plain scalar fields and which
//! are associations to other classes. That knowledge lives in an
//! [`EntityMetadata`] for each class, and is looked up by class name
//! through a [`MetadataProvider`].
//!
//! Metadata can be assembled by hand with the builder methods on
//! [`EntityMetadata`], or derived for a struct with
//! [`macro@Entity`](crate::Entity) and collected into a
//! [`MetadataRegistry`].
//!
//! Example:
//! ```rust
//! use nested_filter::metadata::{AssociationKind, EntityMetadata, MetadataProvider, MetadataRegistry};
//!
//! let mut registry = MetadataRegistry::new();
//! registry.register(
//!     EntityMetadata::new("Book")
//!         .with_field("title")
//!         .with_association("author", AssociationKind::ManyToOne, "Author"),
//! );
//! registry.register(EntityMetadata::new("Author").with_field("name"));
//!
//! let book = registry.class_metadata("Book").unwrap();
//! assert!(book.has_association("author"));
//! assert_eq!(book.association_target_class("author"), Some("Author"));
//! ```

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::filtering::FilterError;

/// The cardinality of an association between two entity classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum AssociationKind {
    ManyToOne,
    OneToOne,
    OneToMany,
    ManyToMany,
}

impl AssociationKind {
    /// Whether following this association from one entity reaches at
    /// most one entity of the target class.
    pub fn is_single_valued(&self) -> bool {
        matches!(self, AssociationKind::ManyToOne | AssociationKind::OneToOne)
    }
}

/// One association declared on an entity class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationMapping {
    pub kind: AssociationKind,
    pub target_class: String,
}

/// The mapping information for one entity class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMetadata {
    name: String,
    fields: BTreeSet<String>,
    associations: BTreeMap<String, AssociationMapping>,
}

impl EntityMetadata {
    /// Create metadata for `name` with no fields or associations.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: BTreeSet::new(),
            associations: BTreeMap::new(),
        }
    }

    /// Declare a scalar field.
    pub fn with_field(mut self, name: impl Into<String>) -> Self {
        self.add_field(name);
        self
    }

    /// Declare an association to `target_class`.
    pub fn with_association(
        mut self,
        name: impl Into<String>,
        kind: AssociationKind,
        target_class: impl Into<String>,
    ) -> Self {
        self.add_association(name, kind, target_class);
        self
    }

    pub fn add_field(&mut self, name: impl Into<String>) {
        self.fields.insert(name.into());
    }

    pub fn add_association(
        &mut self,
        name: impl Into<String>,
        kind: AssociationKind,
        target_class: impl Into<String>,
    ) {
        self.associations.insert(
            name.into(),
            AssociationMapping {
                kind,
                target_class: target_class.into(),
            },
        );
    }

    /// The class name this metadata describes.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains(name)
    }

    pub fn has_association(&self, name: &str) -> bool {
        self.associations.contains_key(name)
    }

    pub fn association(&self, name: &str) -> Option<&AssociationMapping> {
        self.associations.get(name)
    }

    /// The class an association points at, if `name` is an
    /// association of this class.
    pub fn association_target_class(&self, name: &str) -> Option<&str> {
        self.associations
            .get(name)
            .map(|mapping| mapping.target_class.as_str())
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }

    pub fn association_names(&self) -> impl Iterator<Item = &str> {
        self.associations.keys().map(String::as_str)
    }
}

/// Look up [`EntityMetadata`] by class name.
///
/// This is the only view of the data model that path resolution
/// needs. Implementations are expected to be cheap to query
/// repeatedly; the returned metadata is shared, not copied.
pub trait MetadataProvider {
    /// Fetch the metadata for `class`, failing with
    /// [`FilterError::UnknownClass`] if the class is not mapped.
    fn class_metadata(&self, class: &str) -> Result<Arc<EntityMetadata>, FilterError>;
}

impl<P> MetadataProvider for &P
where
    P: MetadataProvider + ?Sized,
{
    fn class_metadata(&self, class: &str) -> Result<Arc<EntityMetadata>, FilterError> {
        (**self).class_metadata(class)
    }
}

impl<P> MetadataProvider for Arc<P>
where
    P: MetadataProvider + ?Sized,
{
    fn class_metadata(&self, class: &str) -> Result<Arc<EntityMetadata>, FilterError> {
        (**self).class_metadata(class)
    }
}

/// A type that can describe its own mapping.
///
/// This is normally derived with [`macro@Entity`](crate::Entity).
pub trait Entity {
    /// Produce the metadata for this type.
    fn metadata() -> EntityMetadata;
}

/// A [`MetadataProvider`] holding a fixed set of classes.
#[derive(Debug, Clone, Default)]
pub struct MetadataRegistry {
    classes: BTreeMap<String, Arc<EntityMetadata>>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `metadata`, replacing any earlier registration of the same
    /// class name.
    pub fn register(&mut self, metadata: EntityMetadata) -> &mut Self {
        self.classes
            .insert(metadata.name().to_string(), Arc::new(metadata));
        self
    }

    /// Add the metadata produced by an [`Entity`] type.
    pub fn register_entity<E: Entity>(&mut self) -> &mut Self {
        self.register(E::metadata())
    }

    pub fn contains(&self, class: &str) -> bool {
        self.classes.contains_key(class)
    }
}

impl MetadataProvider for MetadataRegistry {
    fn class_metadata(&self, class: &str) -> Result<Arc<EntityMetadata>, FilterError> {
        self.classes
            .get(class)
            .cloned()
            .ok_or_else(|| FilterError::UnknownClass(class.to_string()))
    }
}
