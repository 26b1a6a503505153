/// Cosine similarity between two optional embeddings.
///
/// Returns `0.0` when either side is missing, the lengths differ, or either
/// vector has zero norm. Accumulates in `f64` so long embeddings do not lose
/// precision.
pub fn cosine_similarity(a: Option<&[f32]>, b: Option<&[f32]>) -> f64 {
    let (a, b) = match (a, b) {
        (Some(a), Some(b)) if a.len() == b.len() => (a, b),
        _ => return 0.0,
    };

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_inputs_score_zero() {
        let v = vec![1.0, 2.0, 3.0];
        assert_eq!(cosine_similarity(None, Some(&v)), 0.0);
        assert_eq!(cosine_similarity(Some(&v), None), 0.0);
        assert_eq!(cosine_similarity(None, None), 0.0);
        assert_eq!(cosine_similarity(Some(&v), Some(&[1.0, 2.0])), 0.0);
        assert_eq!(cosine_similarity(Some(&v), Some(&[0.0, 0.0, 0.0])), 0.0);
        assert_eq!(cosine_similarity(Some(&[]), Some(&[])), 0.0);
    }

    #[test]
    fn test_self_similarity_is_one() {
        let v = vec![0.3, -1.2, 4.5, 0.01];
        let sim = cosine_similarity(Some(&v), Some(&v));
        assert!((sim - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_orthogonal_and_opposite() {
        let x = vec![1.0, 0.0];
        let y = vec![0.0, 1.0];
        let neg = vec![-1.0, 0.0];
        assert!(cosine_similarity(Some(&x), Some(&y)).abs() < 1e-12);
        assert!((cosine_similarity(Some(&x), Some(&neg)) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_scale_invariance() {
        let a = vec![1.0, 2.0, 2.0];
        let b = vec![2.0, 4.0, 4.0];
        assert!((cosine_similarity(Some(&a), Some(&b)) - 1.0).abs() < 1e-9);
    }
}
