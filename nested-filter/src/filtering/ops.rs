//! Reference filters.
//!
//! These translate [`FilterData`] into conditions using the text form
//! of the [`ComparisonOperator`] carried in the data:
//!
//! Filter               | Operators                 | Value
//! ---------------------|---------------------------|------------------------------------
//! [`ComparisonFilter`] | all                       | `between` also uses `value2`, `in` needs an array
//! [`TextFilter`]       | `=` `!=` `like` `not like`| a string, wrapped in `%` for `like`

use serde_json::Value;

use crate::filtering::{
    EntityContext, FieldDescriptor, Filter, FilterData, FilterDescriptor, FilterError, PathError,
};
use crate::operators::ComparisonOperator;
use crate::query::QueryBuilder;

fn check_property(data: &FilterData, entity: &EntityContext) -> Result<(), FilterError> {
    let metadata = entity.metadata();
    if metadata.has_field(data.property()) || metadata.has_association(data.property()) {
        Ok(())
    } else {
        Err(PathError::InvalidSegment {
            path: data.property().to_string(),
            class: entity.class().to_string(),
        }
        .into())
    }
}

/// Compare a property with the request's value using any
/// [`ComparisonOperator`].
#[derive(Debug, Clone)]
pub struct ComparisonFilter {
    descriptor: FilterDescriptor,
}

impl ComparisonFilter {
    pub const FILTER_TYPE: &'static str = "ComparisonFilter";

    pub fn new(property: impl Into<String>) -> Self {
        Self {
            descriptor: FilterDescriptor::new(property, "comparison", Self::FILTER_TYPE),
        }
    }

    pub fn with_form_type_option(mut self, name: impl Into<String>, value: Value) -> Self {
        self.descriptor.set_form_type_option(name, value);
        self
    }
}

impl Filter for ComparisonFilter {
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
        check_property(data, entity)?;

        let target = format!("{}.{}", data.entity_alias(), data.property());
        let parameter = data.parameter_name();
        let comparison = data.comparison();

        match comparison {
            ComparisonOperator::IsNull | ComparisonOperator::IsNotNull => {
                query.and_where(&format!("{} {}", target, comparison));
            }
            ComparisonOperator::Between => {
                if data.value().is_null() || data.value2().is_null() {
                    return Err(FilterError::InvalidValue(
                        "between requires two values".to_string(),
                    ));
                }
                let upper = data.upper_parameter_name();
                query.set_parameter(&parameter, data.value().clone())?;
                query.set_parameter(&upper, data.value2().clone())?;
                query.and_where(&format!(
                    "{} between :{} and :{}",
                    target, parameter, upper
                ));
            }
            ComparisonOperator::In => {
                if !data.value().is_array() {
                    return Err(FilterError::InvalidValue(
                        "in requires an array of values".to_string(),
                    ));
                }
                query.set_parameter(&parameter, data.value().clone())?;
                query.and_where(&format!("{} in (:{})", target, parameter));
            }
            _ => {
                if data.value().is_null() {
                    return Err(FilterError::InvalidValue(format!(
                        "'{}' requires a value",
                        comparison
                    )));
                }
                query.set_parameter(&parameter, data.value().clone())?;
                query.and_where(&format!("{} {} :{}", target, comparison, parameter));
            }
        }

        Ok(())
    }
}

/// Match a string property, exactly or by substring.
#[derive(Debug, Clone)]
pub struct TextFilter {
    descriptor: FilterDescriptor,
}

impl TextFilter {
    pub const FILTER_TYPE: &'static str = "TextFilter";

    pub fn new(property: impl Into<String>) -> Self {
        Self {
            descriptor: FilterDescriptor::new(property, "text", Self::FILTER_TYPE),
        }
    }
}

impl Filter for TextFilter {
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
        check_property(data, entity)?;

        let text = data
            .value()
            .as_str()
            .ok_or_else(|| FilterError::InvalidValue("text filters need a string".to_string()))?;
        let comparison = data.comparison();
        let value = match comparison {
            ComparisonOperator::Like | ComparisonOperator::NotLike => format!("%{}%", text),
            ComparisonOperator::Eq | ComparisonOperator::Neq => text.to_string(),
            other => {
                return Err(FilterError::InvalidValue(format!(
                    "text filters do not support '{}'",
                    other
                )))
            }
        };

        let parameter = data.parameter_name();
        query.set_parameter(&parameter, Value::String(value))?;
        query.and_where(&format!(
            "{}.{} {} :{}",
            data.entity_alias(),
            data.property(),
            comparison,
            parameter
        ));
        Ok(())

    }
}
