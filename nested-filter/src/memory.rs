//! An in-memory [`QueryBuilder`].
//!
//! [`MemoryQueryBuilder`] records what filters do to a query and can
//! render it as a DQL-style string. It checks joins against the
//! metadata it was given, the way a real query builder would reject
//! them at compile time, which makes it suitable for tests and for
//! inspecting what a set of filters will produce.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use log::trace;
use regex::Regex;

use crate::filtering::FilterError;
use crate::metadata::MetadataProvider;
use crate::query::QueryBuilder;

static JOIN_PATTERN: OnceLock<Regex> = OnceLock::new();
static ALIAS_PATTERN: OnceLock<Regex> = OnceLock::new();

fn join_pattern() -> &'static Regex {
    JOIN_PATTERN.get_or_init(|| {
        Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\.([A-Za-z_][A-Za-z0-9_]*)$").unwrap()
    })
}

fn alias_pattern() -> &'static Regex {
    ALIAS_PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap())
}

/// A left join declared on a [`MemoryQueryBuilder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    /// The joined association, as `alias.association`.
    pub join: String,
    /// The alias the joined entity is known by.
    pub alias: String,
    /// The class of the joined entity.
    pub class: String,
}

/// A query under construction, held in memory.
#[derive(Debug, Clone)]
pub struct MemoryQueryBuilder<P> {
    root_class: String,
    root_alias: String,
    joins: Vec<Join>,
    conditions: Vec<String>,
    parameters: BTreeMap<String, serde_json::Value>,
    metadata: P,
}

impl<P: MetadataProvider> MemoryQueryBuilder<P> {
    /// Start a query selecting `root_class` as `root_alias`.
    pub fn new(root_class: impl Into<String>, root_alias: impl Into<String>, metadata: P) -> Self {
        Self {
            root_class: root_class.into(),
            root_alias: root_alias.into(),
            joins: Vec::new(),
            conditions: Vec::new(),
            parameters: BTreeMap::new(),
            metadata,
        }
    }

    pub fn root_alias(&self) -> &str {
        &self.root_alias
    }

    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    pub fn conditions(&self) -> &[String] {
        &self.conditions
    }

    pub fn parameters(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&serde_json::Value> {
        self.parameters.get(name)
    }

    /// The class of the entity known as `alias`, if declared.
    pub fn class_of(&self, alias: &str) -> Option<&str> {
        if alias == self.root_alias {
            Some(&self.root_class)
        } else {
            self.joins
                .iter()
                .find(|j| j.alias == alias)
                .map(|j| j.class.as_str())
        }
    }

    /// Render the query.
    pub fn dql(&self) -> String {
        let mut dql = format!(
            "SELECT {} FROM {} {}",
            self.root_alias, self.root_class, self.root_alias
        );
        for join in &self.joins {
            dql.push_str(&format!(" LEFT JOIN {} {}", join.join, join.alias));
        }
        if !self.conditions.is_empty() {
            let conditions = self
                .conditions
                .iter()
                .map(|c| format!("({})", c))
                .collect::<Vec<_>>();
            dql.push_str(" WHERE ");
            dql.push_str(&conditions.join(" AND "));
        }
        dql
    }

    fn invalid_join(join: &str, alias: &str, reason: impl Into<String>) -> FilterError {
        FilterError::InvalidJoin {
            join: join.to_string(),
            alias: alias.to_string(),
            reason: reason.into(),
        }
    }
}

impl<P: MetadataProvider> QueryBuilder for MemoryQueryBuilder<P> {
    fn left_join(&mut self, join: &str, alias: &str) -> Result<(), FilterError> {
        let captures = join_pattern()
            .captures(join)
            .ok_or_else(|| Self::invalid_join(join, alias, "expected 'alias.association'"))?;
        if !alias_pattern().is_match(alias) {
            return Err(Self::invalid_join(join, alias, "malformed alias"));
        }
        if self.class_of(alias).is_some() {
            return Err(Self::invalid_join(join, alias, "alias is already declared"));
        }

        let parent = &captures[1];
        let association = &captures[2];
        let parent_class = self
            .class_of(parent)
            .ok_or_else(|| Self::invalid_join(join, alias, format!("unknown alias '{}'", parent)))?
            .to_string();
        let metadata = self.metadata.class_metadata(&parent_class)?;
        let class = metadata
            .association_target_class(association)
            .ok_or_else(|| {
                Self::invalid_join(
                    join,
                    alias,
                    format!("'{}' is not an association of '{}'", association, parent_class),
                )
            })?
            .to_string();

        trace!("Declared {} as {} ({})", join, alias, class);
        self.joins.push(Join {
            join: join.to_string(),
            alias: alias.to_string(),
            class,
        });
        Ok(())
    }

    fn all_aliases(&self) -> Vec<String> {
        std::iter::once(self.root_alias.clone())
            .chain(self.joins.iter().map(|j| j.alias.clone()))
            .collect()
    }

    fn metadata(&self) -> &dyn MetadataProvider {
        &self.metadata
    }

    fn and_where(&mut self, condition: &str) {
        self.conditions.push(condition.to_string());
    }

    fn set_parameter(&mut self, name: &str, value: serde_json::Value) -> Result<(), FilterError> {
        if self.parameters.contains_key(name) {
            return Err(FilterError::DuplicateParameter(name.to_string()));
        }
        trace!("Bound :{}", name);
        self.parameters.insert(name.to_string(), value);
        Ok(())
    }
}
