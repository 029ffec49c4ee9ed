//! Shared inference utilities.

/// Returns the `k` highest scores as `(index, score)`, highest first.
///
/// Ties keep the lower index first. NaN scores sort last.
#[must_use]
pub fn top_k(scores: &[f32], k: usize) -> Vec<(usize, f32)> {
    let mut ranked: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or_else(|| a.1.is_nan().cmp(&b.1.is_nan()))
            .then(a.0.cmp(&b.0))
    });
    ranked.truncate(k);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_k_descending() {
        let ranked = top_k(&[0.1, 0.7, 0.05, 0.15], 3);
        let indices: Vec<usize> = ranked.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![1, 3, 0]);
    }

    #[test]
    fn test_top_k_larger_than_input() {
        assert_eq!(top_k(&[0.5, 0.5], 5).len(), 2);
    }

    #[test]
    fn test_top_k_ties_keep_order() {
        let ranked = top_k(&[0.25, 0.25, 0.25, 0.25], 2);
        assert_eq!(ranked[0].0, 0);
        assert_eq!(ranked[1].0, 1);
    }

    #[test]
    fn test_top_k_nan_last() {
        let ranked = top_k(&[f32::NAN, 0.2, 0.8], 3);
        assert_eq!(ranked[0].0, 2);
        assert_eq!(ranked[1].0, 1);
        assert_eq!(ranked[2].0, 0);
    }
}
