//! Vector arithmetic used by the similarity rule

/// Inner product of two vectors. Vectors of different length score 0.0.
pub fn inner_product(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Scale a vector to unit length in place and return its original norm.
/// Zero vectors are left untouched.
pub fn l2_normalize(vector: &mut [f32]) -> f32 {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm > f32::EPSILON {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }

    norm
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inner_product() {
        assert_eq!(inner_product(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]), 32.0);
    }

    #[test]
    fn test_inner_product_different_lengths() {
        assert_eq!(inner_product(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn test_normalized_self_product_is_one() {
        let mut v = vec![3.0, 4.0];
        let norm = l2_normalize(&mut v);

        assert!((norm - 5.0).abs() < 1e-6);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((inner_product(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_zero_vector() {
        let mut v = vec![0.0, 0.0];
        assert_eq!(l2_normalize(&mut v), 0.0);
        assert_eq!(v, vec![0.0, 0.0]);
    }
}
