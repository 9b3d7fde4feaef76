use std::sync::Arc;

use serde_json::json;

use nested_filter::filtering::ops::{ComparisonFilter, TextFilter};
use nested_filter::memory::MemoryQueryBuilder;
use nested_filter::nested::FORM_OPTION_WRAPPED_FILTER;
use nested_filter::*;

use crate::entities::registry;

fn book_query(alias: &str) -> MemoryQueryBuilder<MetadataRegistry> {
    MemoryQueryBuilder::new("Book", alias, registry())
}

fn apply(
    qb: &mut MemoryQueryBuilder<MetadataRegistry>,
    filter: &dyn Filter,
    index: usize,
    values: FilterValues,
) -> Result<(), FilterError> {
    let entity = EntityContext::new(qb.metadata().class_metadata("Book")?);
    let data = FilterData::new(
        index,
        filter.descriptor().clone(),
        qb.root_alias().to_string(),
        values,
    );
    filter.apply(qb, &data, None, &entity)
}

#[test_log::test]
fn filters_share_joins() {
    let name = NestedFilter::wrap(Arc::new(TextFilter::new("author.country.name"))).unwrap();
    let age = NestedFilter::wrap(Arc::new(ComparisonFilter::new("author.age"))).unwrap();

    let mut qb = book_query("entity");
    apply(
        &mut qb,
        &name,
        0,
        FilterValues::new(json!("Peru"), ComparisonOperator::Like),
    )
    .unwrap();
    apply(
        &mut qb,
        &age,
        1,
        FilterValues::new(json!(40), ComparisonOperator::Gte),
    )
    .unwrap();

    assert_eq!(
        qb.dql(),
        "SELECT entity FROM Book entity \
         LEFT JOIN entity.author entity_author \
         LEFT JOIN entity_author.country entity_author_country \
         WHERE (entity_author_country.name like :name_0) AND (entity_author.age >= :age_1)"
    );
    assert_eq!(qb.parameter("name_0"), Some(&json!("%Peru%")));
    assert_eq!(qb.parameter("age_1"), Some(&json!(40)));
    assert_eq!(qb.class_of("entity_author"), Some("Person"));
    assert_eq!(qb.class_of("entity_author_country"), Some("Country"));
}

#[test]
fn range_through_self_reference() {
    let filter = NestedFilter::wrap(Arc::new(ComparisonFilter::new("author.mentor.age"))).unwrap();

    let mut qb = book_query("b");
    apply(
        &mut qb,
        &filter,
        2,
        FilterValues::new(json!(30), ComparisonOperator::Between).with_value2(json!(50)),
    )
    .unwrap();

    assert_eq!(
        qb.dql(),
        "SELECT b FROM Book b \
         LEFT JOIN b.author b_author \
         LEFT JOIN b_author.mentor b_author_mentor \
         WHERE (b_author_mentor.age between :age_2 and :age_2_upper)"
    );
    assert_eq!(qb.parameter("age_2"), Some(&json!(30)));
    assert_eq!(qb.parameter("age_2_upper"), Some(&json!(50)));
}

#[test]
fn one_to_one_is_traversed() {
    let filter =
        NestedFilter::wrap(Arc::new(TextFilter::new("author.country.capital.name"))).unwrap();

    let mut qb = book_query("e");
    apply(
        &mut qb,
        &filter,
        0,
        FilterValues::new(json!("Lima"), ComparisonOperator::Eq),
    )
    .unwrap();

    assert_eq!(
        qb.all_aliases(),
        vec!["e", "e_author", "e_author_country", "e_author_country_capital"]
    );
    assert_eq!(qb.conditions(), ["e_author_country_capital.name = :name_0"]);
}

#[test]
fn terminal_association() {
    let filter = NestedFilter::wrap(Arc::new(ComparisonFilter::new("author.country"))).unwrap();

    let mut qb = book_query("e");
    apply(
        &mut qb,
        &filter,
        0,
        FilterValues::new(serde_json::Value::Null, ComparisonOperator::IsNull),
    )
    .unwrap();

    assert_eq!(
        qb.dql(),
        "SELECT e FROM Book e LEFT JOIN e.author e_author WHERE (e_author.country is null)"
    );
}

#[test]
fn raw_identifier_property() {
    let filter = NestedFilter::wrap(Arc::new(ComparisonFilter::new("parent.type"))).unwrap();

    let mut qb = MemoryQueryBuilder::new("Doc", "d", registry());
    let entity = EntityContext::new(qb.metadata().class_metadata("Doc").unwrap());
    let data = FilterData::new(
        0,
        filter.descriptor().clone(),
        "d",
        FilterValues::new(json!("memo"), ComparisonOperator::Eq),
    );
    filter.apply(&mut qb, &data, None, &entity).unwrap();

    assert_eq!(
        qb.dql(),
        "SELECT d FROM Doc d LEFT JOIN d.parent d_parent WHERE (d_parent.type = :type_0)"
    );
}

#[test]
fn renamed_property() {
    let filter = NestedFilter::wrap(Arc::new(TextFilter::new("author.nickname"))).unwrap();

    let mut qb = book_query("e");
    apply(
        &mut qb,
        &filter,
        0,
        FilterValues::new(json!("ed"), ComparisonOperator::Neq),
    )
    .unwrap();
    assert_eq!(qb.conditions(), ["e_author.nickname != :nickname_0"]);
}

#[test]
fn collections_are_not_traversed() {
    let filter = NestedFilter::wrap(Arc::new(ComparisonFilter::new("reviews.stars"))).unwrap();

    let mut qb = book_query("e");
    let err = apply(
        &mut qb,
        &filter,
        0,
        FilterValues::new(json!(5), ComparisonOperator::Eq),
    )
    .unwrap_err();

    assert!(matches!(
        err,
        FilterError::InvalidPath(PathError::NotAssociation { ref segment, .. }) if segment == "reviews"
    ));
    assert!(qb.joins().is_empty());
    assert!(qb.conditions().is_empty());
}

#[test]
fn fields_are_not_traversed() {
    let filter = NestedFilter::wrap(Arc::new(ComparisonFilter::new("title.length"))).unwrap();

    let mut qb = book_query("e");
    let err = apply(
        &mut qb,
        &filter,
        0,
        FilterValues::new(json!(5), ComparisonOperator::Eq),
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "the property path 'title_length' should traverse only valid associations, 'title' is not one"
    );
}

#[test]
fn excluded_fields_are_unknown() {
    let filter = NestedFilter::wrap(Arc::new(TextFilter::new("cache.value"))).unwrap();

    let mut qb = book_query("e");
    let err = apply(
        &mut qb,
        &filter,
        0,
        FilterValues::new(json!("x"), ComparisonOperator::Eq),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        FilterError::InvalidPath(PathError::InvalidSegment { .. })
    ));

    let filter = NestedFilter::wrap(Arc::new(TextFilter::new("author.cache"))).unwrap();
    let err = apply(
        &mut qb,
        &filter,
        0,
        FilterValues::new(json!("x"), ComparisonOperator::Eq),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        FilterError::InvalidPath(PathError::InvalidSegment { ref class, .. }) if class == "Book"
    ));
}

#[test]
fn existing_joins_are_reused() {
    let filter = NestedFilter::wrap(Arc::new(TextFilter::new("author.country.code"))).unwrap();

    let mut qb = book_query("e");
    qb.left_join("e.author", "e_author").unwrap();
    apply(
        &mut qb,
        &filter,
        0,
        FilterValues::new(json!("PE"), ComparisonOperator::Eq),
    )
    .unwrap();
    apply(
        &mut qb,
        &filter,
        1,
        FilterValues::new(json!("CL"), ComparisonOperator::Neq),
    )
    .unwrap();

    assert_eq!(qb.joins().len(), 2);
    assert_eq!(
        qb.conditions(),
        [
            "e_author_country.code = :code_0",
            "e_author_country.code != :code_1"
        ]
    );
}

#[test]
fn one_adapter_many_queries() {
    let filter = NestedFilter::wrap(Arc::new(ComparisonFilter::new("author.age"))).unwrap();

    for alias in ["b", "book"] {
        let mut qb = book_query(alias);
        apply(
            &mut qb,
            &filter,
            0,
            FilterValues::new(json!(18), ComparisonOperator::Lt),
        )
        .unwrap();
        assert_eq!(
            qb.dql(),
            format!(
                "SELECT {0} FROM Book {0} LEFT JOIN {0}.author {0}_author WHERE ({0}_author.age < :age_0)",
                alias
            )
        );
    }

    assert_eq!(filter.descriptor().property, "author_age");
}

#[test]
fn wrap_keeps_form_configuration() {
    let wrapped = ComparisonFilter::new("author.age").with_form_type_option("min", json!(0));
    let filter = NestedFilter::wrap(Arc::new(wrapped)).unwrap();

    let descriptor = filter.descriptor();
    assert_eq!(descriptor.form_type, "comparison");
    assert_eq!(descriptor.form_type_option("min"), Some(&json!(0)));
    assert_eq!(
        descriptor.form_type_option(FORM_OPTION_WRAPPED_FILTER),
        Some(&json!({"filter_type": "ComparisonFilter", "property": "author.age"}))
    );
    assert_eq!(filter.wrapped_filter().descriptor().filter_type, "ComparisonFilter");
}

#[test]
fn wrap_rejects_flat_paths() {
    let err = NestedFilter::wrap(Arc::new(ComparisonFilter::new("published"))).unwrap_err();
    assert_eq!(
        err.to_string(),
        "the nested property path must contain '.', 'published' given"
    );
}

#[test]
fn missing_metadata() {
    let mut partial = MetadataRegistry::new();
    partial.register(crate::entities::registry().class_metadata("Book").unwrap().as_ref().clone());
    let filter = NestedFilter::wrap(Arc::new(ComparisonFilter::new("author.age"))).unwrap();

    let mut qb = MemoryQueryBuilder::new("Book", "e", partial);
    let err = apply_generic(&mut qb, &filter).unwrap_err();
    assert!(matches!(err, FilterError::UnknownClass(ref c) if c == "Person"));
    assert!(qb.joins().is_empty());
}

fn apply_generic(
    qb: &mut MemoryQueryBuilder<MetadataRegistry>,
    filter: &dyn Filter,
) -> Result<(), FilterError> {
    apply(qb, filter, 0, FilterValues::new(json!(1), ComparisonOperator::Eq))
}

#[derive(Debug)]
struct FailingFilter {
    descriptor: FilterDescriptor,
}

impl Filter for FailingFilter {
    fn descriptor(&self) -> &FilterDescriptor {
        &self.descriptor
    }

    fn apply(
        &self,
        _query: &mut dyn QueryBuilder,
        data: &FilterData,
        _field: Option<&FieldDescriptor>,
        _entity: &EntityContext,
    ) -> Result<(), FilterError> {
        Err(anyhow::anyhow!("cannot filter on {}", data.property()).into())
    }
}

#[test]
fn wrapped_failures_propagate() {
    let filter = NestedFilter::wrap(Arc::new(FailingFilter {
        descriptor: FilterDescriptor::new("author.age", "number", "FailingFilter"),
    }))
    .unwrap();

    let mut qb = book_query("e");
    let err = apply_generic(&mut qb, &filter).unwrap_err();
    assert!(matches!(err, FilterError::Apply(_)));
    assert_eq!(err.to_string(), "cannot filter on age");
    // the joins made before delegating stay on the query
    assert_eq!(qb.joins().len(), 1);
}
