use crate::execution::DomainKwargs;
use crate::store::ColumnTypeDescriptor;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const TABLE_COLUMN_TYPES: &str = "table.column_types";

/// Identifies one metric computation: name, domain and value kwargs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricConfiguration {
    pub metric_name: String,
    pub metric_domain_kwargs: DomainKwargs,
    #[serde(default)]
    pub metric_value_kwargs: Map<String, Value>,
}

impl MetricConfiguration {
    pub fn new(
        metric_name: impl Into<String>,
        metric_domain_kwargs: DomainKwargs,
        metric_value_kwargs: Map<String, Value>,
    ) -> Self {
        Self { metric_name: metric_name.into(), metric_domain_kwargs, metric_value_kwargs }
    }
}

/// A computed metric value handed back by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MetricValue {
    ColumnTypes(Vec<ColumnTypeDescriptor>),
}

/// Precomputed dependency values, keyed by the dependency name used at declaration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedMetrics {
    values: BTreeMap<String, MetricValue>,
}

impl ResolvedMetrics {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, name: impl Into<String>, value: MetricValue) {
        self.values.insert(name.into(), value);
    }

    pub fn column_types(&self) -> Option<&[ColumnTypeDescriptor]> {
        match self.values.get(TABLE_COLUMN_TYPES)? {
            MetricValue::ColumnTypes(types) => Some(types),
        }
    }
}
