use std::num::NonZeroU32;

/// Normalizes a frame rate reported by a container.
///
/// Backends report 0 or NaN when the rate is unknown; both map to `None`.
pub fn detect(raw: f64) -> Option<f64> {
    (raw.is_finite() && raw > 0.0).then_some(raw)
}

/// Keep every `ratio`-th decoded frame: `max(1, round(source / target))`.
///
/// Halves round to even, so 30 fps sampled at 12 keeps every 2nd frame.
/// An unknown source rate keeps every frame.
pub fn sampling_ratio(source_fps: Option<f64>, target_fps: NonZeroU32) -> usize {
    match source_fps {
        Some(fps) if fps > 0.0 => {
            let ratio = (fps / target_fps.get() as f64).round_ties_even();
            (ratio as usize).max(1)
        }
        _ => 1,
    }
}

/// Source rate as shown to the user.
pub fn reported_fps(source_fps: Option<f64>) -> Option<u32> {
    source_fps.map(|fps| fps.round() as u32)
}
