//! Conversions between the two confidence representations.
//!
//! Connections carry both an integer similarity (0-100) and a float score
//! (0-1). All conversions between the two happen here, at ingestion
//! boundaries; no other code guesses which representation a value is in.

use serde_json::Value;

/// Convert a raw numeric value to an integer similarity.
///
/// Values `<= 1.0` are treated as a 0-1 fraction; anything larger is taken
/// as already being on the 0-100 scale. Clamped to `[0, 100]`.
pub fn similarity_from_score(score: f64) -> u8 {
    let v = if score <= 1.0 { score * 100.0 } else { score };
    v.round().clamp(0.0, 100.0) as u8
}

/// Convert an integer similarity to a 0-1 score.
pub fn score_from_similarity(sim: u8) -> f32 {
    f32::from(sim.min(100)) / 100.0
}

/// Coerce an arbitrary JSON value to an integer similarity in `[0, 100]`.
///
/// Accepts numbers and numeric strings, including a trailing `%`.
/// Returns `None` for anything non-numeric.
pub fn coerce_similarity(value: &Value) -> Option<u8> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok()?,
        _ => return None,
    };
    Some(n.round().clamp(0.0, 100.0) as u8)
}
