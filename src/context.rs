use crate::error::ContextError;
use crate::feature_table::FeatureTable;
use crate::float_trait::Float;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Name of the per-object period field of the [ContextKey::Period] table
pub const MULTIBAND_PERIOD_FIELD: &str = "Multiband_period";

/// Keys of intermediate results shared between extractors
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ContextKey {
    /// Periodogram results, the [MULTIBAND_PERIOD_FIELD] is the best period estimation
    Period,
}

impl ContextKey {
    pub fn name(&self) -> &'static str {
        match self {
            ContextKey::Period => "period",
        }
    }
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What an extractor publishes into and reads from [SharedContext]
///
/// Producers are evaluated before all other extractors of a batch
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ContextRole {
    pub produces: Option<ContextKey>,
    pub consumes: Option<ContextKey>,
}

impl ContextRole {
    pub const fn none() -> Self {
        Self {
            produces: None,
            consumes: None,
        }
    }

    pub const fn producer(key: ContextKey) -> Self {
        Self {
            produces: Some(key),
            consumes: None,
        }
    }

    pub const fn consumer(key: ContextKey) -> Self {
        Self {
            produces: None,
            consumes: Some(key),
        }
    }

    pub fn is_producer(&self) -> bool {
        self.produces.is_some()
    }
}

/// Intermediate feature tables of a single batch
///
/// A new context is created for every orchestration run, it is read-only while objects are
/// evaluated.
#[derive(Clone, Debug, Default)]
pub struct SharedContext<T> {
    tables: BTreeMap<ContextKey, FeatureTable<T>>,
}

impl<T> SharedContext<T>
where
    T: Float,
{
    pub fn new() -> Self {
        Self {
            tables: BTreeMap::new(),
        }
    }

    /// Context already containing a table
    pub fn with_table(mut self, key: ContextKey, table: FeatureTable<T>) -> Self {
        self.publish(key, table);
        self
    }

    /// Put a table, replacing the previous one for the same key
    pub fn publish(&mut self, key: ContextKey, table: FeatureTable<T>) {
        self.tables.insert(key, table);
    }

    pub fn contains(&self, key: ContextKey) -> bool {
        self.tables.contains_key(&key)
    }

    pub fn get(&self, key: ContextKey) -> Option<&FeatureTable<T>> {
        self.tables.get(&key)
    }

    /// Single per-object value
    pub fn lookup(&self, key: ContextKey, oid: &str, field: &str) -> Result<T, ContextError> {
        let table = self.get(key).ok_or(ContextError::MissingKey(key))?;
        let index = table
            .column_index(field)
            .ok_or_else(|| ContextError::MissingField {
                key,
                field: field.to_owned(),
            })?;
        let row = table.row(oid).ok_or_else(|| ContextError::MissingObject {
            key,
            object: oid.to_owned(),
        })?;
        Ok(row[index])
    }
}
