//! Runtime deprecation notices for metric parameters.
use serde::Serialize;
use smallvec::SmallVec;

pub const PARSE_STRINGS_AS_DATETIMES: &str = "parse_strings_as_datetimes";

/// A deprecated parameter was used. Recorded on the evaluation and logged once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deprecation {
    pub parameter: &'static str,
    pub message: String,
}

impl Deprecation {
    pub fn parse_strings_as_datetimes(detail: Option<&str>) -> Self {
        let mut message = format!(
            "The parameter \"{}\" is no longer supported and will be deprecated in a future release.  \
             Please update code accordingly.",
            PARSE_STRINGS_AS_DATETIMES
        );
        if let Some(detail) = detail {
            message.push_str("  ");
            message.push_str(detail);
        }
        Self { parameter: PARSE_STRINGS_AS_DATETIMES, message }
    }
}

/// The deprecations raised during one call; almost always zero or one.
pub type Deprecations = SmallVec<[Deprecation; 1]>;

/// Logs the notice and records it on the call's deprecation list.
pub(crate) fn emit(sink: &mut Deprecations, deprecation: Deprecation) {
    tracing::warn!(
        target: "column_metrics::deprecation",
        parameter = deprecation.parameter,
        "{}",
        deprecation.message
    );
    sink.push(deprecation);
}
