/// Instruction string sent with every analysis request.
///
/// This is the sole schema-enforcement mechanism: the model is asked to
/// honor the field names and industry assumptions below, and the parser
/// trusts the reply shape. Keep the field names in sync with
/// [`crate::models::SolarAnalysis`].
const SOLAR_ANALYSIS_PROMPT: &str = r#"You are a solar energy expert analyzing a rooftop satellite/aerial image for solar panel installation potential.

Analyze the image and provide a basic assessment in the following JSON format:

{
    "rooftop_area_sqft": <estimated usable rooftop area in square feet>,
    "solar_suitability_score": <score from 1-10, where 10 is excellent>,
    "roof_orientation": "<primary roof direction: North/South/East/West>",
    "estimated_panel_capacity_kw": <total solar capacity in kilowatts>,
    "annual_energy_production_kwh": <estimated annual energy production>,
    "estimated_installation_cost": <rough cost estimate in USD>,
    "annual_savings": <estimated annual electricity bill savings>,
    "payback_period_years": <estimated payback period>,
    "key_observations": [
        "<observation 1>",
        "<observation 2>"
    ],
    "recommendations": [
        "<recommendation 1>",
        "<recommendation 2>"
    ]
}

Base your analysis on these solar industry standards:
- Average solar panel: 400W, 21 sq ft
- Typical installation cost: $3-4 per watt
- Average electricity rate: $0.13/kWh
- Solar panel efficiency: 20-22%
- Useful roof area: 60-70% of total roof area

Only return the JSON, no additional text.
"#;

/// The fixed analysis prompt. Constant across calls.
pub fn solar_analysis_prompt() -> &'static str {
    SOLAR_ANALYSIS_PROMPT
}
