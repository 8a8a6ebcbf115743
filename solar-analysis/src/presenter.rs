use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::SolarAnalysis;

/// One labeled display value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricView {
    pub label: String,
    pub value: String,
}

impl MetricView {
    fn new(label: &str, value: String) -> Self {
        Self {
            label: label.to_string(),
            value,
        }
    }
}

/// Display model for a completed analysis: grouped and formatted, ready for
/// the page to render. Pure formatting, no validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportView {
    pub headline: Vec<MetricView>,
    pub financial: Vec<MetricView>,
    pub technical: Vec<MetricView>,
    pub key_observations: Vec<String>,
    pub recommendations: Vec<String>,
}

impl ReportView {
    pub fn from_analysis(analysis: &SolarAnalysis) -> Self {
        Self {
            headline: vec![
                MetricView::new(
                    "Suitability Score",
                    format!("{}/10", analysis.solar_suitability_score),
                ),
                MetricView::new(
                    "Panel Capacity",
                    format!("{} kW", trim_number(analysis.estimated_panel_capacity_kw)),
                ),
                MetricView::new(
                    "Annual Production",
                    format!(
                        "{} kWh",
                        group_thousands(analysis.annual_energy_production_kwh)
                    ),
                ),
                MetricView::new(
                    "Payback Period",
                    format!("{} years", trim_number(analysis.payback_period_years)),
                ),
            ],
            financial: vec![
                MetricView::new(
                    "Installation Cost",
                    format!("${}", group_thousands(analysis.estimated_installation_cost)),
                ),
                MetricView::new(
                    "Annual Savings",
                    format!("${}", group_thousands(analysis.annual_savings)),
                ),
            ],
            technical: vec![
                MetricView::new(
                    "Rooftop Area",
                    format!("{} sq ft", group_thousands(analysis.rooftop_area_sqft)),
                ),
                MetricView::new("Roof Orientation", analysis.roof_orientation.clone()),
            ],
            key_observations: analysis.key_observations.clone(),
            recommendations: analysis.recommendations.clone(),
        }
    }
}

/// Indented JSON re-serialization of the record, used verbatim as the
/// downloadable report body. No envelope, no versioning.
pub fn report_json(analysis: &SolarAnalysis) -> Result<String> {
    Ok(serde_json::to_string_pretty(analysis)?)
}

/// Whole values print without a fraction, everything else with one decimal.
fn trim_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value:.1}")
    }
}

/// Comma-group the integer part of a number, keeping any fraction.
fn group_thousands(value: f64) -> String {
    let text = trim_number(value);
    let (int_part, frac_part) = match text.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (text.as_str(), None),
    };
    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", int_part),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.char_indices() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}
