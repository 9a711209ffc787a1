//! Ambient noise energy estimation

/// Root-mean-square amplitude of one mono block.
///
/// Single pass over the block, accumulated in `f64` so long blocks of quiet
/// samples keep their precision. The result is zero only when every sample
/// is exactly zero.
///
/// Capture always delivers non-empty blocks; an empty block is treated as
/// silence.
pub fn estimate(block: &[f32]) -> f32 {
    debug_assert!(!block.is_empty(), "noise estimator received an empty block");
    if block.is_empty() {
        return 0.0;
    }

    let sum_squares: f64 = block.iter().map(|&s| f64::from(s) * f64::from(s)).sum();
    (sum_squares / block.len() as f64).sqrt() as f32
}
