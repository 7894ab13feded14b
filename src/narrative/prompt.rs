//! Prompt construction for journal entries.

use crate::stats::derived::{AltitudeRange, SessionSummary};

/// Describe where the trip started and ended.
pub fn location_context(summary: &SessionSummary) -> String {
    format!(
        "started at {:.4},{:.4} and ended at {:.4},{:.4}",
        summary.start.0, summary.start.1, summary.end.0, summary.end.1
    )
}

/// Describe the altitude span, or its absence.
pub fn altitude_context(altitude: &AltitudeRange) -> String {
    match altitude {
        AltitudeRange::Range { min, max } => {
            format!("Elevation ranged from {:.1}m to {:.1}m.", min, max)
        }
        AltitudeRange::Unavailable => "Altitude data was unavailable.".to_string(),
    }
}

/// Build the journal prompt for a summarised session.
pub fn build_prompt(summary: &SessionSummary) -> String {
    format!(
        "I just finished a tracked trip.\n\
         Duration: {:.1} minutes.\n\
         Location Data: {}.\n\
         Altitude Data: {}\n\
         \n\
         Please write a short, creative and minimalist travel journal entry (max 3 sentences) \
         describing this journey. Focus on the feeling of exploration and the verticality of \
         the trip if applicable. Do not include technical stats in the output text, just the prose.",
        summary.duration_minutes(),
        location_context(summary),
        altitude_context(&summary.altitude),
    )
}
