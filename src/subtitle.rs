use crate::model::TranscribeResult;

/// Caption text for a playback position.
///
/// Selects every segment whose span contains `time` (boundaries
/// inclusive, so adjacent segments briefly overlap at their shared edge)
/// and joins the texts in segment order. Pure and stateless: the external
/// player drives this on each of its time updates, at whatever rate it
/// likes.
pub fn text_at_time(time: f64, result: &TranscribeResult) -> String {
    if !result.decoded {
        return String::new();
    }
    result
        .segments
        .iter()
        .filter(|segment| segment.end >= time && segment.start <= time)
        .map(|segment| segment.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Total decoded tokens, used for the cost readout.
pub fn token_count(result: &TranscribeResult) -> u64 {
    result
        .segments
        .iter()
        .map(|segment| u64::from(segment.token_count))
        .sum()
}
