//! A windowed execution engine: registers tables, narrows compute domains and
//! materializes the lazy conditions that metrics hand back.
use super::domain::{DomainKwargs, FilterKind, MetricDomainType, RowFilter};
use crate::compute::{self, ComputeError, Expr};
use crate::metrics::configuration::{MetricConfiguration, MetricValue, TABLE_COLUMN_TYPES};
use crate::store::{Scalar, Table};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Unknown table: {0}")]
    UnknownTable(String),
    #[error("Domain names no table and the engine holds {0} tables")]
    AmbiguousTable(usize),
    #[error("Column domain requires a 'column' key")]
    MissingColumnKey,
    #[error("Unsupported metric: {0}")]
    UnsupportedMetric(String),
    #[error("Condition produced a non-boolean value at row {row}: {value}")]
    NonBooleanCondition { row: usize, value: String },
    #[error(transparent)]
    Compute(#[from] ComputeError),
}

/// What a windowed metric returns: a lazy per-row condition plus the domains
/// the engine needs to materialize it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowCondition {
    pub condition: Expr,
    pub compute_domain: DomainKwargs,
    pub accessor_domain: DomainKwargs,
}

/// A table restricted to a domain, with the kwargs split the way metrics expect.
#[derive(Debug, Clone)]
pub struct ComputeDomain<'a> {
    pub table: Cow<'a, Table>,
    pub compute_kwargs: DomainKwargs,
    pub accessor_kwargs: DomainKwargs,
}

#[derive(Debug, Clone, Default)]
pub struct WindowedExecutionEngine {
    tables: BTreeMap<String, Table>,
}

impl WindowedExecutionEngine {
    pub fn new() -> Self { Self::default() }

    pub fn with_table(mut self, name: impl Into<String>, table: Table) -> Self {
        self.register_table(name, table);
        self
    }

    pub fn register_table(&mut self, name: impl Into<String>, table: Table) {
        self.tables.insert(name.into(), table);
    }

    fn table_for(&self, domain: &DomainKwargs) -> Result<&Table, EngineError> {
        match &domain.table {
            Some(name) => self.tables.get(name).ok_or_else(|| EngineError::UnknownTable(name.clone())),
            None if self.tables.len() == 1 => Ok(self.tables.values().next().ok_or(EngineError::AmbiguousTable(0))?),
            None => Err(EngineError::AmbiguousTable(self.tables.len())),
        }
    }

    /// Adds null and/or NaN filters on the domain's column.
    ///
    /// Asking for neither is tolerated: a warning is logged and the domain comes back unchanged.
    pub fn add_column_row_condition(
        &self,
        domain: &DomainKwargs,
        filter_null: bool,
        filter_nan: bool,
    ) -> Result<DomainKwargs, EngineError> {
        let column = domain.column.clone().ok_or(EngineError::MissingColumnKey)?;
        let mut narrowed = domain.clone();

        if !filter_null && !filter_nan {
            tracing::warn!(column = %column, "add_column_row_condition called without specifying a desired row condition");
            return Ok(narrowed);
        }

        let wanted = [(filter_null, FilterKind::NotNull), (filter_nan, FilterKind::NotNan)];
        for (enabled, kind) in wanted {
            let filter = RowFilter::new(column.clone(), kind);
            if enabled && !narrowed.filter_conditions.contains(&filter) {
                narrowed.filter_conditions.push(filter);
            }
        }
        tracing::debug!(column = %column, filters = narrowed.filter_conditions.len(), "narrowed compute domain");
        Ok(narrowed)
    }

    /// Resolves the table for `domain`, applies its row filters and splits the kwargs.
    ///
    /// For a column domain the compute kwargs drop `column` and the accessor kwargs keep only it.
    pub fn get_compute_domain(
        &self,
        domain: &DomainKwargs,
        domain_type: MetricDomainType,
    ) -> Result<ComputeDomain<'_>, EngineError> {
        let table = self.table_for(domain)?;

        let table = match domain.row_filter_expr() {
            None => Cow::Borrowed(table),
            Some(filter) => {
                let mask = to_flags(compute::evaluate(&filter, table)?)?;
                Cow::Owned(table.filter(&mask))
            }
        };

        let (compute_kwargs, accessor_kwargs) = match domain_type {
            MetricDomainType::Table => (domain.clone(), DomainKwargs::default()),
            MetricDomainType::Column => {
                if domain.column.is_none() {
                    return Err(EngineError::MissingColumnKey);
                }
                (domain.without_column(), domain.accessor())
            }
        };

        Ok(ComputeDomain { table, compute_kwargs, accessor_kwargs })
    }

    /// Computes a metric the metrics in this crate declare as a dependency.
    pub fn resolve(&self, metric: &MetricConfiguration) -> Result<MetricValue, EngineError> {
        match metric.metric_name.as_str() {
            TABLE_COLUMN_TYPES => {
                let include_nested = metric
                    .metric_value_kwargs
                    .get("include_nested")
                    .and_then(serde_json::Value::as_bool)
                    .unwrap_or(true);
                let table = self.table_for(&metric.metric_domain_kwargs)?;
                Ok(MetricValue::ColumnTypes(table.column_types(include_nested)))
            }
            other => Err(EngineError::UnsupportedMetric(other.to_string())),
        }
    }

    /// Evaluates a window condition over its compute domain. A null condition counts as `false`.
    pub fn materialize(&self, condition: &WindowCondition) -> Result<Vec<bool>, EngineError> {
        let domain = self.get_compute_domain(&condition.compute_domain, MetricDomainType::Table)?;
        let values = compute::evaluate(&condition.condition, &domain.table)?;
        to_flags(values)
    }
}

fn to_flags(values: Vec<Scalar>) -> Result<Vec<bool>, EngineError> {
    values
        .into_iter()
        .enumerate()
        .map(|(row, v)| match v {
            Scalar::Boolean(b) => Ok(b),
            Scalar::Null => Ok(false),
            other => Err(EngineError::NonBooleanCondition { row, value: other.to_string() }),
        })
        .collect()
}
