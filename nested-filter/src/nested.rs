//! # Filter on properties reached through associations
//!
//! An ordinary [`Filter`] works on a property of the entity it is
//! applied to. A [`NestedFilter`] wraps one so that it can be declared
//! against a path like `author.country.name` instead: when applied,
//! it walks the associations `author` and `country` in the metadata,
//! left joins them into the query, and hands the wrapped filter the
//! property `name` of the joined country, as though the wrapped filter
//! had been declared on the country entity directly.
//!
//! Paths are given with `.` between segments, and stored with `_`
//! instead, so `author.country.name` is held as `author_country_name`.
//! Joined aliases are built the same way from the alias of the root
//! entity: with a root alias of `entity` the example above joins
//! `entity.author` as `entity_author` and `entity_author.country` as
//! `entity_author_country`. Joins already declared on the query are
//! reused, so several nested filters sharing a path prefix share its
//! joins.
//!
//! Example:
//! ```rust
//! use std::sync::Arc;
//!
//! use nested_filter::filtering::{EntityContext, Filter, FilterData, FilterValues};
//! use nested_filter::filtering::ops::TextFilter;
//! use nested_filter::memory::MemoryQueryBuilder;
//! use nested_filter::metadata::{AssociationKind, EntityMetadata, MetadataProvider, MetadataRegistry};
//! use nested_filter::nested::NestedFilter;
//! use nested_filter::operators::ComparisonOperator;
//!
//! let mut registry = MetadataRegistry::new();
//! registry
//!     .register(EntityMetadata::new("Book").with_association("author", AssociationKind::ManyToOne, "Author"))
//!     .register(EntityMetadata::new("Author").with_association("country", AssociationKind::ManyToOne, "Country"))
//!     .register(EntityMetadata::new("Country").with_field("name"));
//! let book = EntityContext::new(registry.class_metadata("Book").unwrap());
//!
//! let filter = NestedFilter::wrap(Arc::new(TextFilter::new("author.country.name"))).unwrap();
//! assert_eq!(filter.descriptor().property, "author_country_name");
//!
//! let mut qb = MemoryQueryBuilder::new("Book", "entity", registry);
//! let data = FilterData::new(
//!     0,
//!     filter.descriptor().clone(),
//!     "entity",
//!     FilterValues::new(serde_json::json!("Peru"), ComparisonOperator::Eq),
//! );
//! filter.apply(&mut qb, &data, None, &book).unwrap();
//! assert_eq!(
//!     qb.dql(),
//!     "SELECT entity FROM Book entity \
//!      LEFT JOIN entity.author entity_author \
//!      LEFT JOIN entity_author.country entity_author_country \
//!      WHERE (entity_author_country.name = :name_0)"
//! );
//! ```
//!
//! A [`NestedFilter`] can only be built by wrapping a filter:
//! ```compile_fail
//! use nested_filter::nested::NestedFilter;
//!
//! let filter = NestedFilter::new("author.name", None);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, trace};

use crate::filtering::{
    EntityContext, FieldDescriptor, Filter, FilterData, FilterDescriptor, FilterError, PathError,
};
use crate::metadata::{EntityMetadata, MetadataProvider};
use crate::query::QueryBuilder;

/// The form option under which a [`NestedFilter`] records the filter
/// it wraps.
pub const FORM_OPTION_WRAPPED_FILTER: &str = "attr.wrapped_filter";

/// The separator between segments in paths given to
/// [`NestedFilter::wrap`].
pub const PATH_SEPARATOR_EXPECTED: char = '.';

/// The separator between segments in stored paths and in generated
/// aliases.
pub const PATH_SEPARATOR: char = '_';

/// A [`Filter`] applied to a property reached through associations.
#[derive(Debug, Clone)]
pub struct NestedFilter {
    wrapped: Arc<dyn Filter>,
    descriptor: FilterDescriptor,
}

impl NestedFilter {
    pub const FILTER_TYPE: &'static str = "NestedFilter";

    /// Wrap `filter`, whose property must be a path containing at
    /// least one `.`.
    ///
    /// Nothing about the path is checked beyond that here: whether it
    /// names real associations depends on the entity the filter is
    /// eventually applied to.
    pub fn wrap(filter: Arc<dyn Filter>) -> Result<Self, FilterError> {
        let wrapped_descriptor = filter.descriptor();
        let property = &wrapped_descriptor.property;

        if !property.contains(PATH_SEPARATOR_EXPECTED) {
            return Err(PathError::MissingSeparator {
                path: property.clone(),
                separator: PATH_SEPARATOR_EXPECTED,
            }
            .into());
        }

        let mut descriptor = FilterDescriptor {
            property: property.replace(PATH_SEPARATOR_EXPECTED, &PATH_SEPARATOR.to_string()),
            form_type: wrapped_descriptor.form_type.clone(),
            form_type_options: wrapped_descriptor.form_type_options.clone(),
            filter_type: Self::FILTER_TYPE.to_string(),
        };
        descriptor.set_form_type_option(
            FORM_OPTION_WRAPPED_FILTER,
            serde_json::json!({
                "filter_type": wrapped_descriptor.filter_type,
                "property": property,
            }),
        );

        Ok(Self {
            wrapped: filter,
            descriptor,
        })
    }

    /// The filter this one delegates to.
    pub fn wrapped_filter(&self) -> &Arc<dyn Filter> {
        &self.wrapped
    }
}

impl Filter for NestedFilter {
    fn descriptor(&self) -> &FilterDescriptor {
        &self.descriptor
    }

    fn apply(
        &self,
        query: &mut dyn QueryBuilder,
        data: &FilterData,
        _field: Option<&FieldDescriptor>,
        entity: &EntityContext,
    ) -> Result<(), FilterError> {
        let path = data.property();

        let (target_metadata, target_property) =
            extract_targets(query.metadata(), entity.class(), path)?;
        let target_entity = EntityContext::new(target_metadata);

        let mut target_descriptor = self.wrapped.descriptor().clone();
        target_descriptor.property = target_property;

        let alias = apply_left_joins(query, data.entity_alias(), path)?;

        let target_data = FilterData::new(
            data.index(),
            target_descriptor,
            alias,
            data.values().clone(),
        );

        debug!(
            "Applying {} to {}.{} for path {} on {}",
            target_data.descriptor().filter_type,
            target_data.entity_alias(),
            target_data.property(),
            path,
            entity.class()
        );
        self.wrapped.apply(query, &target_data, None, &target_entity)
    }
}

/// Follow `path` from `class` through the metadata in `provider`.
///
/// Every segment but the last must be a single valued association;
/// the last may be a field or an association. Returns the metadata of
/// the class holding the last segment, and the last segment itself.
pub fn extract_targets(
    provider: &dyn MetadataProvider,
    class: &str,
    path: &str,
) -> Result<(Arc<EntityMetadata>, String), FilterError> {
    let segments = path.split(PATH_SEPARATOR).collect::<Vec<_>>();
    let invalid = || -> FilterError {
        PathError::InvalidSegment {
            path: path.to_string(),
            class: class.to_string(),
        }
        .into()
    };
    let (terminal, traversed) = segments.split_last().ok_or_else(invalid)?;

    let mut cache: HashMap<String, Arc<EntityMetadata>> = HashMap::new();
    let mut metadata = provider.class_metadata(class)?;
    cache.insert(class.to_string(), metadata.clone());

    for segment in traversed {
        if !metadata.has_field(segment) && !metadata.has_association(segment) {
            return Err(invalid());
        }

        let target = match metadata.association(segment) {
            Some(mapping) if mapping.kind.is_single_valued() => mapping.target_class.clone(),
            _ => {
                return Err(PathError::NotAssociation {
                    path: path.to_string(),
                    segment: segment.to_string(),
                }
                .into())
            }
        };

        trace!("Following {}.{} to {}", metadata.name(), segment, target);
        metadata = match cache.get(&target) {
            Some(cached) => cached.clone(),
            None => {
                let fetched = provider.class_metadata(&target)?;
                cache.insert(target, fetched.clone());
                fetched
            }
        };
    }

    if !metadata.has_field(terminal) && !metadata.has_association(terminal) {
        return Err(invalid());
    }

    Ok((metadata, terminal.to_string()))
}

/// Left join every association along `path`, starting from `alias`,
/// and return the alias of the entity holding the last segment.
///
/// Joins whose alias is already declared on `query` are not added
/// again.
pub fn apply_left_joins(
    query: &mut dyn QueryBuilder,
    alias: &str,
    path: &str,
) -> Result<String, FilterError> {
    let segments = path.split(PATH_SEPARATOR).collect::<Vec<_>>();
    let mut current = alias.to_string();

    if let Some((_, traversed)) = segments.split_last() {
        for segment in traversed {
            let next = format!("{}{}{}", current, PATH_SEPARATOR, segment);
            if query.all_aliases().contains(&next) {
                trace!("Reusing join {}", next);
            } else {
                let join = format!("{}.{}", current, segment);
                debug!("Left joining {} as {}", join, next);
                query.left_join(&join, &next)?;
            }
            current = next;
        }
    }

    Ok(current)
}
