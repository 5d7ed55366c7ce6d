use crate::execution::DomainKwargs;
use crate::metrics::{
    default_value_kwargs, ColumnValuesIncreasing, InMemoryEvaluator, IncreasingConfig, MetricConfiguration,
    TabularEvaluator, CONDITION_METRIC_NAME,
};
use crate::store::{Column, ColumnType, Scalar};
use pyo3::exceptions::{PyDeprecationWarning, PyTypeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyBool, PyDate, PyDateTime, PyFloat, PyInt, PyString};
use std::ffi::CString;

/// Python objects map to scalars by their runtime type. `bool` is checked
/// before `int` and `datetime` before `date`, since each subclasses the other.
fn to_scalar(obj: &Bound<'_, PyAny>) -> PyResult<Scalar> {
    if obj.is_none() {
        Ok(Scalar::Null)
    } else if obj.is_instance_of::<PyBool>() {
        Ok(Scalar::Boolean(obj.extract()?))
    } else if obj.is_instance_of::<PyInt>() {
        Ok(Scalar::Int(obj.extract()?))
    } else if obj.is_instance_of::<PyFloat>() {
        Ok(Scalar::Float(obj.extract()?))
    } else if obj.is_instance_of::<PyString>() {
        Ok(Scalar::Str(obj.extract()?))
    } else if obj.is_instance_of::<PyDateTime>() {
        Ok(Scalar::Timestamp(obj.extract()?))
    } else if obj.is_instance_of::<PyDate>() {
        Ok(Scalar::Date(obj.extract()?))
    } else {
        Err(PyTypeError::new_err(format!("Unsupported value type: {}", obj.get_type().name()?)))
    }
}

/// Column type implied by the first non-null value; an all-null column is a string column.
fn infer_column_type(values: &[Scalar]) -> ColumnType {
    match values.iter().find(|v| !v.is_null()) {
        Some(Scalar::Boolean(_)) => ColumnType::Boolean,
        Some(Scalar::Int(_)) => ColumnType::Long,
        Some(Scalar::Float(_)) => ColumnType::Double,
        Some(Scalar::Date(_)) => ColumnType::Date,
        Some(Scalar::Timestamp(_)) => ColumnType::Timestamp,
        _ => ColumnType::String,
    }
}

/// Evaluates the condition on a Python sequence; `True` where the value does not decrease.
#[pyfunction]
#[pyo3(signature = (values, strictly=false, parse_strings_as_datetimes=false))]
fn column_values_increasing(
    py: Python<'_>,
    values: Vec<Bound<'_, PyAny>>,
    strictly: bool,
    parse_strings_as_datetimes: bool,
) -> PyResult<Vec<bool>> {
    let scalars = values.iter().map(to_scalar).collect::<PyResult<Vec<_>>>()?;
    let column = Column::new("values", infer_column_type(&scalars), scalars);
    let config = IncreasingConfig { strictly, parse_strings_as_datetimes };

    let evaluation = InMemoryEvaluator
        .column_values_increasing(&column, &config)
        .map_err(|e| PyValueError::new_err(e.to_string()))?;

    for deprecation in &evaluation.deprecations {
        let message = CString::new(deprecation.message.as_str()).map_err(|e| PyValueError::new_err(e.to_string()))?;
        PyErr::warn(py, py.get_type::<PyDeprecationWarning>().as_any(), &message, 1)?;
    }
    Ok(evaluation.value)
}

/// Takes the metric's domain kwargs as JSON and returns its dependencies as JSON.
#[pyfunction]
fn column_values_increasing_dependencies(domain_json: &str) -> PyResult<String> {
    let domain: DomainKwargs = serde_json::from_str(domain_json).map_err(|e| PyValueError::new_err(e.to_string()))?;
    let metric = MetricConfiguration::new(CONDITION_METRIC_NAME, domain, default_value_kwargs());
    let dependencies = ColumnValuesIncreasing::evaluation_dependencies(&metric);
    serde_json::to_string(&dependencies).map_err(|e| PyValueError::new_err(e.to_string()))
}

pub fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(column_values_increasing, m)?)?;
    m.add_function(wrap_pyfunction!(column_values_increasing_dependencies, m)?)?;
    Ok(())
}
