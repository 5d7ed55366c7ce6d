//! Column-map metrics and their evaluation backends.
pub mod configuration;
pub mod datetime;
pub mod deprecation;
pub mod error;
pub mod evaluator;
pub mod increasing;

pub use configuration::{MetricConfiguration, MetricValue, ResolvedMetrics, TABLE_COLUMN_TYPES};
pub use deprecation::{Deprecation, Deprecations};
pub use error::MetricError;
pub use evaluator::{Evaluation, TabularEvaluator};
pub use increasing::{
    default_value_kwargs, violation_condition, ColumnValuesIncreasing, InMemoryEvaluator, IncreasingConfig,
    WindowedDomain, WindowedEvaluator, CONDITION_METRIC_NAME, CONDITION_VALUE_KEYS, FILTER_COLUMN_ISNULL,
};
