use serde::{Deserialize, Serialize};

/// Structured assessment produced by parsing the model's reply.
///
/// The prompt asks the model for a 1-10 score, the four cardinal roof
/// orientations, and positive quantities, but none of that is validated
/// locally: whatever parses is what the user sees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolarAnalysis {
    pub rooftop_area_sqft: f64,
    pub solar_suitability_score: u8,
    pub roof_orientation: String,
    pub estimated_panel_capacity_kw: f64,
    pub annual_energy_production_kwh: f64,
    pub estimated_installation_cost: f64,
    pub annual_savings: f64,
    pub payback_period_years: f64,
    pub key_observations: Vec<String>,
    pub recommendations: Vec<String>,
}
