use crate::report::HourlyEstimate;
use crate::severity::SeverityTier;

/// Advice text driven only by the tier of the peak hour.
pub fn build_insight(peak: &HourlyEstimate) -> String {
    match peak.tier {
        SeverityTier::High => format!(
            "Peak congestion expected at {}:00. Consider alternative routes or delay travel by 1-2 hours.",
            peak.hour
        ),
        SeverityTier::Moderate => format!(
            "Moderate traffic expected. {}:00 shows highest activity. Plan buffer time.",
            peak.hour
        ),
        SeverityTier::Normal => {
            "Traffic conditions are favorable. Smooth commute expected throughout the selected time range."
                .to_string()
        }
    }
}
