//! Host-side collaborators the metrics rely on: compute domains and the
//! windowed engine that narrows and materializes them.
pub mod domain;
pub mod engine;

pub use domain::{DomainKwargs, FilterKind, MetricDomainType, RowFilter};
pub use engine::{ComputeDomain, EngineError, WindowCondition, WindowedExecutionEngine};
