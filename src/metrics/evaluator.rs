use super::deprecation::Deprecations;
use super::error::MetricError;
use super::increasing::IncreasingConfig;

/// The result of one backend call, together with any deprecations it raised.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation<T> {
    pub value: T,
    pub deprecations: Deprecations,
}

impl<T> Evaluation<T> {
    pub fn new(value: T, deprecations: Deprecations) -> Self {
        Self { value, deprecations }
    }
}

/// A backend able to express the increasing-sequence condition natively.
///
/// The in-memory backend answers per row directly; the windowed backend
/// returns a lazy condition for its engine to materialize.
pub trait TabularEvaluator {
    /// What the backend reads the column from.
    type Domain<'a>;
    /// What the backend hands back.
    type Condition;

    fn column_values_increasing(
        &self,
        domain: Self::Domain<'_>,
        config: &IncreasingConfig,
    ) -> Result<Evaluation<Self::Condition>, MetricError>;
}
