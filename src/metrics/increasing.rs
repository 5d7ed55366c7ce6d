//! The "column values increasing" condition metric.
//!
//! One predicate, two backends:
//! - [`InMemoryEvaluator`] answers per row, `true` where the condition holds.
//! - [`WindowedEvaluator`] builds a lazy lag-window expression flagging the rows
//!   that *violate* the condition, for its engine to materialize.
use super::configuration::{MetricConfiguration, ResolvedMetrics, TABLE_COLUMN_TYPES};
use super::datetime::ParseOutcome;
use super::deprecation::{self, Deprecation, Deprecations, PARSE_STRINGS_AS_DATETIMES};
use super::error::MetricError;
use super::evaluator::{Evaluation, TabularEvaluator};
use crate::compute::{col, date_diff, lit, when, Expr, WindowSpec};
use crate::execution::{ComputeDomain, DomainKwargs, MetricDomainType, WindowCondition, WindowedExecutionEngine};
use crate::store::types::midnight;
use crate::store::{Column, ColumnType, Scalar};
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const CONDITION_METRIC_NAME: &str = "column_values.increasing";
pub const STRICTLY: &str = "strictly";
pub const CONDITION_VALUE_KEYS: [&str; 2] = [STRICTLY, PARSE_STRINGS_AS_DATETIMES];
/// Column-map metrics drop null rows from their domain unless told otherwise.
pub const FILTER_COLUMN_ISNULL: bool = true;

/// Value kwargs of the metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncreasingConfig {
    /// Only strictly greater successors pass; flat runs fail.
    #[serde(default)]
    pub strictly: bool,
    /// Deprecated. Coerce string values to date/times before comparing.
    #[serde(default)]
    pub parse_strings_as_datetimes: bool,
}

impl IncreasingConfig {
    pub fn strict() -> Self {
        Self { strictly: true, ..Default::default() }
    }

    /// Reads the condition value keys. Missing or `null` keys mean `false`.
    pub fn from_value_kwargs(kwargs: &Map<String, Value>) -> Result<Self, MetricError> {
        let flag = |key: &str| match kwargs.get(key) {
            None | Some(Value::Null) => Ok(false),
            Some(Value::Bool(b)) => Ok(*b),
            Some(other) => Err(MetricError::InvalidValueKwarg { key: key.to_string(), value: other.to_string() }),
        };
        Ok(Self {
            strictly: flag(STRICTLY)?,
            parse_strings_as_datetimes: flag(PARSE_STRINGS_AS_DATETIMES)?,
        })
    }

    pub fn to_value_kwargs(&self) -> Map<String, Value> {
        let mut kwargs = Map::new();
        kwargs.insert(STRICTLY.to_string(), Value::Bool(self.strictly));
        kwargs.insert(PARSE_STRINGS_AS_DATETIMES.to_string(), Value::Bool(self.parse_strings_as_datetimes));
        kwargs
    }
}

/// Defaults for every condition value key.
pub fn default_value_kwargs() -> Map<String, Value> {
    IncreasingConfig::default().to_value_kwargs()
}

/// Registration surface of the metric.
pub struct ColumnValuesIncreasing;

impl ColumnValuesIncreasing {
    /// Metrics the host must compute before the windowed backend can run.
    ///
    /// The column-type lookup runs on the table-level domain (no `column` key)
    /// and asks for nested struct fields.
    pub fn evaluation_dependencies(metric: &MetricConfiguration) -> BTreeMap<String, MetricConfiguration> {
        let mut value_kwargs = Map::new();
        value_kwargs.insert("include_nested".to_string(), Value::Bool(true));

        let mut dependencies = BTreeMap::new();
        dependencies.insert(
            TABLE_COLUMN_TYPES.to_string(),
            MetricConfiguration::new(TABLE_COLUMN_TYPES, metric.metric_domain_kwargs.without_column(), value_kwargs),
        );
        dependencies
    }

    /// Declares, resolves and evaluates the metric on `engine`, then materializes
    /// the violation flags. Convenience for hosts without their own resolver.
    pub fn evaluate_windowed(
        engine: &WindowedExecutionEngine,
        domain: &DomainKwargs,
        config: &IncreasingConfig,
    ) -> Result<Evaluation<Vec<bool>>, MetricError> {
        let metric = MetricConfiguration::new(CONDITION_METRIC_NAME, domain.clone(), config.to_value_kwargs());
        let mut resolved = ResolvedMetrics::new();
        for (name, dependency) in Self::evaluation_dependencies(&metric) {
            resolved.insert(name, engine.resolve(&dependency)?);
        }

        let evaluation = WindowedEvaluator::new(engine)
            .column_values_increasing(WindowedDomain { domain_kwargs: domain, metrics: &resolved }, config)?;
        let flags = engine.materialize(&evaluation.value)?;
        Ok(Evaluation::new(flags, evaluation.deprecations))
    }
}

// --- In-memory backend ---

/// Step between a value and its predecessor.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Difference {
    Int(i128),
    Float(f64),
    Elapsed(TimeDelta),
}

impl Difference {
    fn passes(&self, strictly: bool) -> bool {
        match (self, strictly) {
            (Difference::Int(d), true) => *d > 0,
            (Difference::Int(d), false) => *d >= 0,
            (Difference::Float(d), true) => *d > 0.0,
            (Difference::Float(d), false) => *d >= 0.0,
            (Difference::Elapsed(d), true) => *d > TimeDelta::zero(),
            (Difference::Elapsed(d), false) => *d >= TimeDelta::zero(),
        }
    }
}

/// `None` when either side is missing (null or NaN) or the result is NaN.
fn difference(current: &Scalar, previous: &Scalar, row: usize) -> Result<Option<Difference>, MetricError> {
    if current.is_missing() || previous.is_missing() {
        return Ok(None);
    }
    let diff = match (current, previous) {
        (Scalar::Int(a), Scalar::Int(b)) => Difference::Int(*a as i128 - *b as i128),
        (Scalar::Int(a), Scalar::Float(b)) => Difference::Float(*a as f64 - b),
        (Scalar::Float(a), Scalar::Int(b)) => Difference::Float(a - *b as f64),
        (Scalar::Float(a), Scalar::Float(b)) => Difference::Float(a - b),
        (Scalar::Timestamp(a), Scalar::Timestamp(b)) => Difference::Elapsed(*a - *b),
        (Scalar::Date(a), Scalar::Date(b)) => Difference::Elapsed(*a - *b),
        (Scalar::Timestamp(a), Scalar::Date(b)) => Difference::Elapsed(*a - midnight(*b)),
        (Scalar::Date(a), Scalar::Timestamp(b)) => Difference::Elapsed(midnight(*a) - *b),
        (a, b) => {
            return Err(MetricError::UnsupportedDifference {
                row,
                current: a.type_name(),
                previous: b.type_name(),
            })
        }
    };
    Ok(match diff {
        Difference::Float(f) if f.is_nan() => None,
        d => Some(d),
    })
}

/// Evaluates the condition over a materialized column.
#[derive(Debug, Clone, Copy, Default)]
pub struct InMemoryEvaluator;

impl TabularEvaluator for InMemoryEvaluator {
    type Domain<'a> = &'a Column;
    type Condition = Vec<bool>;

    fn column_values_increasing(
        &self,
        column: &Column,
        config: &IncreasingConfig,
    ) -> Result<Evaluation<Vec<bool>>, MetricError> {
        let mut deprecations = Deprecations::new();

        let values = if config.parse_strings_as_datetimes {
            deprecation::emit(&mut deprecations, Deprecation::parse_strings_as_datetimes(None));
            ParseOutcome::coerce(&column.values)?.into_scalars()
        } else {
            column.values.clone()
        };

        // Undefined steps (first row, missing operands) get a positive unit step.
        let datetime_mode = config.parse_strings_as_datetimes || column.column_type.is_temporal();
        let unit_step = if datetime_mode { Difference::Elapsed(TimeDelta::seconds(1)) } else { Difference::Int(1) };

        let mut result = Vec::with_capacity(values.len());
        for (row, value) in values.iter().enumerate() {
            let step = match row.checked_sub(1) {
                Some(prev) => difference(value, &values[prev], row)?.unwrap_or(unit_step),
                None => unit_step,
            };
            result.push(step.passes(config.strictly));
        }

        Ok(Evaluation::new(result, deprecations))
    }
}

// --- Windowed backend ---

/// Inputs of the windowed backend: the metric domain and the precomputed
/// `table.column_types` dependency.
#[derive(Debug, Clone, Copy)]
pub struct WindowedDomain<'a> {
    pub domain_kwargs: &'a DomainKwargs,
    pub metrics: &'a ResolvedMetrics,
}

/// Builds the violation condition for a [`WindowedExecutionEngine`].
#[derive(Debug, Clone, Copy)]
pub struct WindowedEvaluator<'e> {
    engine: &'e WindowedExecutionEngine,
}

impl<'e> WindowedEvaluator<'e> {
    pub fn new(engine: &'e WindowedExecutionEngine) -> Self {
        Self { engine }
    }
}

/// `true` on rows that break the condition.
///
/// The step is `value - lag(value)` over a single window ordered by a constant,
/// or whole days via `date_diff` for date/timestamp columns. Only non-temporal
/// steps replace the undefined first step with `1`; temporal ones stay null,
/// which the `CASE` then treats as "not a violation".
pub fn violation_condition(column: &str, column_type: &ColumnType, strictly: bool) -> Expr {
    let window = WindowSpec::order_by(vec![lit("constant")]);
    let previous = col(column).lag(1, window);

    let step = if column_type.is_temporal() {
        date_diff(col(column), previous)
    } else {
        let raw = col(column).sub(previous);
        when(raw.clone().is_null()).then(lit(1i64)).otherwise(raw)
    };

    let violated = if strictly { step.lt_eq(lit(0i64)) } else { step.lt(lit(0i64)) };
    when(violated).then(lit(true)).otherwise(lit(false))
}

impl<'e> TabularEvaluator for WindowedEvaluator<'e> {
    type Domain<'a> = WindowedDomain<'a>;
    type Condition = WindowCondition;

    fn column_values_increasing(
        &self,
        domain: WindowedDomain<'_>,
        config: &IncreasingConfig,
    ) -> Result<Evaluation<WindowCondition>, MetricError> {
        let mut deprecations = Deprecations::new();
        if config.parse_strings_as_datetimes {
            deprecation::emit(
                &mut deprecations,
                Deprecation::parse_strings_as_datetimes(Some(
                    "Moreover, in the windowed evaluator, types are detected naturally.",
                )),
            );
        }

        let column = domain.domain_kwargs.column.as_deref().ok_or(MetricError::MissingColumn)?;
        let column_types = domain
            .metrics
            .column_types()
            .ok_or(MetricError::MissingDependency(TABLE_COLUMN_TYPES))?;
        let metadata = column_types
            .iter()
            .find(|d| d.name == column)
            .ok_or_else(|| MetricError::ColumnTypeNotFound { column: column.to_string() })?;

        // Plain null filtering misses NaN markers in these types.
        let compute_kwargs = if metadata.column_type.may_contain_nan() {
            self.engine.add_column_row_condition(domain.domain_kwargs, FILTER_COLUMN_ISNULL, true)?
        } else {
            domain.domain_kwargs.clone()
        };

        let ComputeDomain { compute_kwargs, accessor_kwargs, .. } =
            self.engine.get_compute_domain(&compute_kwargs, MetricDomainType::Column)?;

        let condition = violation_condition(column, &metadata.column_type, config.strictly);
        tracing::debug!(column, column_type = %metadata.column_type, "windowed condition: {}", condition);

        Ok(Evaluation::new(
            WindowCondition { condition, compute_domain: compute_kwargs, accessor_domain: accessor_kwargs },
            deprecations,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::FilterKind;
    use crate::metrics::configuration::MetricValue;
    use crate::store::{ColumnTypeDescriptor, StructField, Table};
    use chrono::{NaiveDate, NaiveDateTime};
    use proptest::prelude::*;
    use rstest::rstest;
    use serde_json::json;

    fn longs(values: &[i64]) -> Column {
        Column::from_values("x", ColumnType::Long, values.iter().copied())
    }

    fn in_memory(column: &Column, config: IncreasingConfig) -> Vec<bool> {
        InMemoryEvaluator.column_values_increasing(column, &config).unwrap().value
    }

    fn ts(s: &str) -> Scalar {
        Scalar::Timestamp(NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap())
    }

    fn windowed(table: Table, column: &str, config: IncreasingConfig) -> Evaluation<Vec<bool>> {
        let engine = WindowedExecutionEngine::new().with_table("t", table);
        ColumnValuesIncreasing::evaluate_windowed(&engine, &DomainKwargs::for_column(column), &config).unwrap()
    }

    // --- configuration ---

    #[test]
    fn test_defaults() {
        assert_eq!(default_value_kwargs(), {
            let mut m = Map::new();
            m.insert("strictly".into(), json!(false));
            m.insert("parse_strings_as_datetimes".into(), json!(false));
            m
        });
        assert_eq!(CONDITION_VALUE_KEYS, ["strictly", "parse_strings_as_datetimes"]);
    }

    #[test]
    fn test_config_from_kwargs_treats_null_and_missing_as_false() {
        let kwargs = json!({ "strictly": null }).as_object().unwrap().clone();
        assert_eq!(IncreasingConfig::from_value_kwargs(&kwargs).unwrap(), IncreasingConfig::default());

        let kwargs = json!({ "strictly": true, "parse_strings_as_datetimes": false }).as_object().unwrap().clone();
        assert_eq!(IncreasingConfig::from_value_kwargs(&kwargs).unwrap(), IncreasingConfig::strict());
    }

    #[test]
    fn test_config_rejects_non_boolean() {
        let kwargs = json!({ "strictly": "yes" }).as_object().unwrap().clone();
        let err = IncreasingConfig::from_value_kwargs(&kwargs).unwrap_err();
        assert_eq!(err, MetricError::InvalidValueKwarg { key: "strictly".into(), value: "\"yes\"".into() });
    }

    // --- dependency declaration ---

    #[test]
    fn test_dependencies_request_table_level_column_types() {
        let domain = DomainKwargs::for_column("x").with_table("t").with_batch_id("b");
        let metric = MetricConfiguration::new(CONDITION_METRIC_NAME, domain, default_value_kwargs());
        let deps = ColumnValuesIncreasing::evaluation_dependencies(&metric);

        assert_eq!(deps.len(), 1);
        let dep = &deps[TABLE_COLUMN_TYPES];
        assert_eq!(dep.metric_name, TABLE_COLUMN_TYPES);
        assert_eq!(dep.metric_domain_kwargs, DomainKwargs::default().with_table("t").with_batch_id("b"));
        assert_eq!(dep.metric_value_kwargs.get("include_nested"), Some(&json!(true)));
    }

    // --- in-memory backend ---

    #[rstest]
    #[case(&[42], false, &[true])]
    #[case(&[-7], true, &[true])]
    #[case(&[1, 2, 2, 3], false, &[true, true, true, true])]
    #[case(&[1, 2, 2, 3], true, &[true, true, false, true])]
    #[case(&[1, 2, 3, 4], false, &[true, true, true, true])]
    #[case(&[1, 2, 3, 4], true, &[true, true, true, true])]
    #[case(&[5, 5, 5], false, &[true, true, true])]
    #[case(&[5, 5, 5], true, &[true, false, false])]
    #[case(&[3, 2, 1], false, &[true, false, false])]
    #[case(&[3, 2, 1], true, &[true, false, false])]
    #[case(&[i64::MIN, i64::MAX], true, &[true, true])]
    fn test_in_memory_numeric(#[case] values: &[i64], #[case] strictly: bool, #[case] expected: &[bool]) {
        let config = IncreasingConfig { strictly, ..Default::default() };
        assert_eq!(in_memory(&longs(values), config), expected);
    }

    #[test]
    fn test_in_memory_empty_column() {
        assert!(in_memory(&longs(&[]), IncreasingConfig::default()).is_empty());
    }

    #[test]
    fn test_in_memory_missing_values_pass() {
        let column = Column::new(
            "x",
            ColumnType::Double,
            vec![Scalar::Float(3.0), Scalar::Null, Scalar::Float(1.0), Scalar::Float(f64::NAN), Scalar::Float(0.5)],
        );
        // Any step touching a null or NaN is undefined and therefore passes.
        assert_eq!(in_memory(&column, IncreasingConfig::strict()), vec![true, true, true, true, true]);
    }

    #[test]
    fn test_in_memory_mixed_int_float() {
        let column = Column::new("x", ColumnType::Double, vec![Scalar::Int(1), Scalar::Float(1.0), Scalar::Float(1.5)]);
        assert_eq!(in_memory(&column, IncreasingConfig::strict()), vec![true, false, true]);
    }

    #[test]
    fn test_in_memory_parses_strings_and_warns_once() {
        let column = Column::from_values("d", ColumnType::String, ["2020-01-01", "2020-01-02"]);
        let config = IncreasingConfig { parse_strings_as_datetimes: true, ..Default::default() };
        let evaluation = InMemoryEvaluator.column_values_increasing(&column, &config).unwrap();

        assert_eq!(evaluation.value, vec![true, true]);
        assert_eq!(evaluation.deprecations.len(), 1);
        assert_eq!(evaluation.deprecations[0].parameter, PARSE_STRINGS_AS_DATETIMES);
    }

    #[test]
    fn test_in_memory_parsed_strings_compare_by_elapsed_time() {
        let column = Column::from_values(
            "d",
            ColumnType::String,
            ["2020-01-01 10:00:00", "2020-01-01 10:00:00", "2020-01-01 09:59:59", "Jan 2, 2020"],
        );
        let config = IncreasingConfig { strictly: true, parse_strings_as_datetimes: true };
        assert_eq!(in_memory(&column, config), vec![true, false, false, true]);
    }

    #[test]
    fn test_in_memory_without_flag_emits_nothing() {
        let evaluation = InMemoryEvaluator.column_values_increasing(&longs(&[1, 2]), &IncreasingConfig::default()).unwrap();
        assert!(evaluation.deprecations.is_empty());
    }

    #[test]
    fn test_in_memory_parse_falls_back_to_raw_values() {
        let column = Column::from_values("x", ColumnType::Long, [1i64, 3, 2]);
        let config = IncreasingConfig { parse_strings_as_datetimes: true, ..Default::default() };
        let evaluation = InMemoryEvaluator.column_values_increasing(&column, &config).unwrap();
        assert_eq!(evaluation.value, vec![true, true, false]);
        assert_eq!(evaluation.deprecations.len(), 1);
    }

    #[test]
    fn test_in_memory_unparseable_string_is_an_error() {
        let column = Column::from_values("d", ColumnType::String, ["2020-01-01", "someday"]);
        let config = IncreasingConfig { parse_strings_as_datetimes: true, ..Default::default() };
        let err = InMemoryEvaluator.column_values_increasing(&column, &config).unwrap_err();
        assert_eq!(err, MetricError::UnparseableDatetime { row: 1, value: "someday".into() });
    }

    #[test]
    fn test_in_memory_raw_strings_cannot_be_differenced() {
        let column = Column::from_values("d", ColumnType::String, ["a", "b"]);
        let err = InMemoryEvaluator.column_values_increasing(&column, &IncreasingConfig::default()).unwrap_err();
        assert_eq!(err, MetricError::UnsupportedDifference { row: 1, current: "string", previous: "string" });
    }

    #[test]
    fn test_in_memory_temporal_column() {
        let column = Column::new(
            "t",
            ColumnType::Timestamp,
            vec![ts("2020-01-01 06:00:00"), ts("2020-01-01 18:00:00"), ts("2020-01-01 18:00:00")],
        );
        assert_eq!(in_memory(&column, IncreasingConfig::strict()), vec![true, true, false]);
        assert_eq!(in_memory(&column, IncreasingConfig::default()), vec![true, true, true]);
    }

    // --- windowed backend ---

    #[test]
    fn test_windowed_expression_for_numeric_column() {
        let e = violation_condition("x", &ColumnType::Long, true);
        assert_eq!(
            e.to_string(),
            "CASE WHEN (CASE WHEN ((x - lag(x, 1) OVER (ORDER BY 'constant' ASC NULLS FIRST)) IS NULL) THEN 1 \
             ELSE (x - lag(x, 1) OVER (ORDER BY 'constant' ASC NULLS FIRST)) END <= 0) THEN true ELSE false END"
        );
    }

    #[test]
    fn test_windowed_expression_for_temporal_column_keeps_null_first_step() {
        let e = violation_condition("d", &ColumnType::Date, false);
        assert_eq!(
            e.to_string(),
            "CASE WHEN (datediff(d, lag(d, 1) OVER (ORDER BY 'constant' ASC NULLS FIRST)) < 0) THEN true ELSE false END"
        );
    }

    #[rstest]
    #[case(&[1, 2, 2, 3], false, &[false, false, false, false])]
    #[case(&[1, 2, 2, 3], true, &[false, false, true, false])]
    #[case(&[3, 2, 1], false, &[false, true, true])]
    #[case(&[9], true, &[false])]
    #[case(&[i64::MIN, i64::MAX, i64::MIN], false, &[false, false, true])]
    fn test_windowed_numeric(#[case] values: &[i64], #[case] strictly: bool, #[case] expected: &[bool]) {
        let table = Table::new(vec![longs(values)]).unwrap();
        let config = IncreasingConfig { strictly, ..Default::default() };
        assert_eq!(windowed(table, "x", config).value, expected);
    }

    #[test]
    fn test_windowed_narrows_nan_capable_domain() {
        let table = Table::new(vec![Column::new(
            "x",
            ColumnType::Double,
            vec![Scalar::Float(1.0), Scalar::Null, Scalar::Float(f64::NAN), Scalar::Float(0.5), Scalar::Float(2.0)],
        )])
        .unwrap();
        let engine = WindowedExecutionEngine::new().with_table("t", table);
        let domain = DomainKwargs::for_column("x");
        let metric = MetricConfiguration::new(CONDITION_METRIC_NAME, domain.clone(), default_value_kwargs());

        let mut resolved = ResolvedMetrics::new();
        for (name, dep) in ColumnValuesIncreasing::evaluation_dependencies(&metric) {
            resolved.insert(name, engine.resolve(&dep).unwrap());
        }
        let evaluation = WindowedEvaluator::new(&engine)
            .column_values_increasing(WindowedDomain { domain_kwargs: &domain, metrics: &resolved }, &IncreasingConfig::default())
            .unwrap();

        let condition = &evaluation.value;
        assert_eq!(condition.accessor_domain, DomainKwargs::for_column("x"));
        assert_eq!(condition.compute_domain.column, None);
        let kinds: Vec<_> = condition.compute_domain.filter_conditions.iter().map(|f| f.kind).collect();
        assert_eq!(kinds, vec![FilterKind::NotNull, FilterKind::NotNan]);

        // Rows left after narrowing: 1.0, 0.5, 2.0
        assert_eq!(engine.materialize(condition).unwrap(), vec![false, true, false]);
    }

    #[test]
    fn test_windowed_does_not_narrow_float_or_string_types() {
        for column_type in [ColumnType::Float, ColumnType::String, ColumnType::Date] {
            let table = Table::new(vec![Column::new("c", column_type, vec![Scalar::Null])]).unwrap();
            let engine = WindowedExecutionEngine::new().with_table("t", table.clone());
            let mut resolved = ResolvedMetrics::new();
            resolved.insert(TABLE_COLUMN_TYPES, MetricValue::ColumnTypes(table.column_types(true)));
            let domain = DomainKwargs::for_column("c");
            let evaluation = WindowedEvaluator::new(&engine)
                .column_values_increasing(WindowedDomain { domain_kwargs: &domain, metrics: &resolved }, &IncreasingConfig::default())
                .unwrap();
            assert!(evaluation.value.compute_domain.filter_conditions.is_empty());
        }
    }

    #[test]
    fn test_windowed_missing_column_type_is_fatal() {
        let engine = WindowedExecutionEngine::new().with_table("t", Table::new(vec![longs(&[1])]).unwrap());
        let mut resolved = ResolvedMetrics::new();
        resolved.insert(
            TABLE_COLUMN_TYPES,
            MetricValue::ColumnTypes(vec![ColumnTypeDescriptor {
                name: "other".into(),
                column_type: ColumnType::Long,
            }]),
        );
        let domain = DomainKwargs::for_column("x");
        let err = WindowedEvaluator::new(&engine)
            .column_values_increasing(WindowedDomain { domain_kwargs: &domain, metrics: &resolved }, &IncreasingConfig::default())
            .unwrap_err();
        assert_eq!(err, MetricError::ColumnTypeNotFound { column: "x".into() });
    }

    #[test]
    fn test_windowed_requires_column_types_dependency() {
        let engine = WindowedExecutionEngine::new();
        let resolved = ResolvedMetrics::new();
        let domain = DomainKwargs::for_column("x");
        let err = WindowedEvaluator::new(&engine)
            .column_values_increasing(WindowedDomain { domain_kwargs: &domain, metrics: &resolved }, &IncreasingConfig::default())
            .unwrap_err();
        assert_eq!(err, MetricError::MissingDependency(TABLE_COLUMN_TYPES));
    }

    #[rstest]
    #[case("s.n")]
    #[case("s.`x.y`")]
    fn test_windowed_evaluates_nested_field(#[case] column: &str) {
        let fields = vec![StructField::new("n", ColumnType::Long), StructField::new("x.y", ColumnType::Double)];
        let table = Table::new(vec![Column::new(
            "s",
            ColumnType::Struct { fields },
            vec![
                Scalar::Struct(vec![Scalar::Int(1), Scalar::Float(2.5)]),
                Scalar::Null,
                Scalar::Struct(vec![Scalar::Int(0), Scalar::Float(1.5)]),
                Scalar::Struct(vec![Scalar::Int(3), Scalar::Float(3.0)]),
            ],
        )])
        .unwrap();
        // The null struct row is dropped by the null/NaN narrowing.
        assert_eq!(windowed(table, column, IncreasingConfig::default()).value, vec![false, true, false]);
    }

    #[test]
    fn test_windowed_ignores_parsing_but_warns_once() {
        let table = Table::new(vec![Column::from_values("d", ColumnType::String, ["2020-01-02", "2020-01-01"])]).unwrap();
        let config = IncreasingConfig { parse_strings_as_datetimes: true, ..Default::default() };
        let evaluation = windowed(table, "d", config);

        // Strings are cast numerically and become null, so nothing is flagged.
        assert_eq!(evaluation.value, vec![false, false]);
        assert_eq!(evaluation.deprecations.len(), 1);
        assert!(evaluation.deprecations[0].message.contains("types are detected naturally"));
    }

    #[test]
    fn test_windowed_temporal_first_row_is_not_flagged() {
        let dates = ["2020-01-05", "2020-01-04", "2020-01-06"]
            .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap());
        let table = Table::new(vec![Column::from_values("d", ColumnType::Date, dates)]).unwrap();
        assert_eq!(windowed(table, "d", IncreasingConfig::strict()).value, vec![false, true, false]);
    }

    /// Known discrepancy between the backends: the windowed path steps temporal
    /// columns in whole days, so timestamps later on the same day look flat.
    #[test]
    fn test_windowed_temporal_day_granularity_discrepancy() {
        let column = Column::new(
            "t",
            ColumnType::Timestamp,
            vec![ts("2020-01-01 06:00:00"), ts("2020-01-01 18:00:00")],
        );
        let config = IncreasingConfig::strict();
        let expected_in_memory = in_memory(&column, config);
        let flags = windowed(Table::new(vec![column]).unwrap(), "t", config).value;

        assert_eq!(expected_in_memory, vec![true, true]);
        assert_eq!(flags, vec![false, true]);
        assert_ne!(flags[1], !expected_in_memory[1]);
    }

    proptest! {
        #[test]
        fn prop_windowed_flags_negate_in_memory_result(
            values in prop::collection::vec(any::<i64>(), 0..40),
            strictly in any::<bool>(),
        ) {
            let config = IncreasingConfig { strictly, ..Default::default() };
            let column = longs(&values);
            let passes = in_memory(&column, config);
            let flags = windowed(Table::new(vec![column]).unwrap(), "x", config).value;
            let negated: Vec<bool> = passes.iter().map(|p| !p).collect();
            prop_assert_eq!(flags, negated);
        }

        #[test]
        fn prop_first_row_always_passes(first in any::<i64>(), strictly in any::<bool>()) {
            let config = IncreasingConfig { strictly, ..Default::default() };
            prop_assert_eq!(in_memory(&longs(&[first]), config), vec![true]);
        }
    }
}
