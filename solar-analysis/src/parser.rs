use tracing::warn;

use crate::error::{AnalyzerError, Result};
use crate::models::SolarAnalysis;

/// Slice the reply from the first `{` to the last `}`.
///
/// This is a span, not a balanced-brace scan: prose around a single JSON
/// object is stripped, but two sibling objects produce one span covering
/// both, and the subsequent parse fails.
pub fn extract_json_span(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (start <= end).then(|| &reply[start..=end])
}

/// Parse the raw model reply into a [`SolarAnalysis`].
///
/// On any failure the complete reply text is carried in the error so it can
/// be shown to the user for diagnosis.
pub fn parse_analysis(reply: &str) -> Result<SolarAnalysis> {
    let span = extract_json_span(reply).ok_or_else(|| AnalyzerError::Parse {
        raw: reply.to_string(),
    })?;

    serde_json::from_str(span).map_err(|e| {
        warn!(error = %e, "model reply did not parse as a solar analysis");
        AnalyzerError::Parse {
            raw: reply.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = r#"{
        "rooftop_area_sqft": 1500,
        "solar_suitability_score": 8,
        "roof_orientation": "South",
        "estimated_panel_capacity_kw": 12.5,
        "annual_energy_production_kwh": 14000,
        "estimated_installation_cost": 42000,
        "annual_savings": 1820,
        "payback_period_years": 6.5,
        "key_observations": ["Large unshaded area", "Minimal obstructions"],
        "recommendations": ["Install south-facing array", "Consider microinverters"]
    }"#;

    #[test]
    fn parses_a_bare_json_reply() {
        let analysis = parse_analysis(WELL_FORMED).unwrap();
        assert_eq!(analysis.solar_suitability_score, 8);
        assert_eq!(analysis.roof_orientation, "South");
        assert_eq!(analysis.key_observations.len(), 2);
    }

    #[test]
    fn strips_prose_around_a_single_object() {
        let reply = format!("Here is the assessment you asked for:\n{WELL_FORMED}\nLet me know if you need more detail.");
        let analysis = parse_analysis(&reply).unwrap();
        assert_eq!(analysis.estimated_panel_capacity_kw, 12.5);
    }

    #[test]
    fn reply_without_a_brace_is_an_error_carrying_the_text() {
        let reply = "I cannot analyze this image.";
        match parse_analysis(reply) {
            Err(AnalyzerError::Parse { raw }) => assert_eq!(raw, reply),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn reply_missing_a_field_is_an_error_carrying_the_text() {
        let reply = r#"{"solar_suitability_score": 8}"#;
        match parse_analysis(reply) {
            Err(AnalyzerError::Parse { raw }) => assert_eq!(raw, reply),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    // The extractor takes the first `{` to the last `}`, so two sibling
    // objects in one reply yield a span covering both and the parse fails.
    // Inherited behavior, pinned here so a change shows up in review.
    #[test]
    fn sibling_objects_span_both_and_fail_to_parse() {
        let reply = format!("{WELL_FORMED}\nAnd an alternative: {WELL_FORMED}");
        let span = extract_json_span(&reply).unwrap();
        assert!(span.contains("alternative"));
        assert!(parse_analysis(&reply).is_err());
    }

    #[test]
    fn trailing_stray_brace_extends_the_span() {
        let reply = format!("{WELL_FORMED}\nNote: braces {{}} are special.");
        let span = extract_json_span(&reply).unwrap();
        assert!(span.ends_with("{}"));
    }

    #[test]
    fn empty_span_candidates_are_rejected() {
        assert!(extract_json_span("} nothing here {").is_none());
        assert!(extract_json_span("").is_none());
    }
}
