//! Compute-domain descriptors: which table, which column, which rows.
use crate::compute::expr::{col, Expr};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricDomainType {
    Table,
    Column,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    NotNull,
    NotNan,
}

/// A row predicate attached to a domain. Rows failing any filter are excluded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowFilter {
    pub column: String,
    pub kind: FilterKind,
}

impl RowFilter {
    pub fn new(column: impl Into<String>, kind: FilterKind) -> Self {
        Self { column: column.into(), kind }
    }

    pub fn to_expr(&self) -> Expr {
        match self.kind {
            FilterKind::NotNull => col(self.column.clone()).is_null().not(),
            FilterKind::NotNan => col(self.column.clone()).is_nan().not(),
        }
    }
}

/// Domain kwargs in the shape the host framework passes them around.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainKwargs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filter_conditions: Vec<RowFilter>,
}

impl DomainKwargs {
    pub fn for_column(column: impl Into<String>) -> Self {
        Self { column: Some(column.into()), ..Default::default() }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn with_batch_id(mut self, batch_id: impl Into<String>) -> Self {
        self.batch_id = Some(batch_id.into());
        self
    }

    /// The same domain at table level: everything except the `column` key.
    pub fn without_column(&self) -> Self {
        Self { column: None, ..self.clone() }
    }

    /// Only the `column` key, which is what an accessor needs to pick the column.
    pub fn accessor(&self) -> Self {
        Self { column: self.column.clone(), ..Default::default() }
    }

    /// Conjunction of all row filters, if any.
    pub fn row_filter_expr(&self) -> Option<Expr> {
        self.filter_conditions
            .iter()
            .map(RowFilter::to_expr)
            .reduce(|acc, e| acc.and(e))
    }
}
