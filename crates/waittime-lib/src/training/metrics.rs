//! Holdout split and regression metrics

use crate::error::{PredictorError, Result};
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Shuffle `0..n` with `seed` and cut it into (train, holdout) index sets.
///
/// The holdout gets `round(n * holdout_fraction)` rows, clamped so both sides
/// keep at least one row.
pub fn train_holdout_split(
    n: usize,
    holdout_fraction: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>)> {
    if n < 2 {
        return Err(PredictorError::invalid(format!(
            "need at least 2 samples to split into train and holdout, got {}",
            n
        )));
    }
    if !(holdout_fraction > 0.0 && holdout_fraction < 1.0) {
        return Err(PredictorError::invalid(format!(
            "holdout fraction must be in (0, 1), got {}",
            holdout_fraction
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut StdRng::seed_from_u64(seed));

    let holdout_len = ((n as f64 * holdout_fraction).round() as usize).clamp(1, n - 1);
    let train = indices.split_off(holdout_len);
    Ok((train, indices))
}

pub fn mean_squared_error(actual: &Array1<f64>, predicted: &Array1<f64>) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    (actual - predicted).mapv(|d| d * d).sum() / actual.len() as f64
}

/// Coefficient of determination. A constant target scores 1.0 when matched
/// exactly and 0.0 otherwise.
pub fn r2_score(actual: &Array1<f64>, predicted: &Array1<f64>) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let mean = actual.sum() / actual.len() as f64;
    let ss_res: f64 = (actual - predicted).mapv(|d| d * d).sum();
    let ss_tot: f64 = actual.mapv(|a| (a - mean) * (a - mean)).sum();
    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_split_sizes() {
        let (train, holdout) = train_holdout_split(300, 0.2, 42).unwrap();
        assert_eq!(holdout.len(), 60);
        assert_eq!(train.len(), 240);

        let mut all: Vec<usize> = train.iter().chain(holdout.iter()).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..300).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_deterministic() {
        assert_eq!(
            train_holdout_split(50, 0.2, 7).unwrap(),
            train_holdout_split(50, 0.2, 7).unwrap()
        );
    }

    #[test]
    fn test_split_tiny_dataset() {
        let (train, holdout) = train_holdout_split(2, 0.2, 1).unwrap();
        assert_eq!(train.len(), 1);
        assert_eq!(holdout.len(), 1);
        assert!(train_holdout_split(1, 0.2, 1).is_err());
        assert!(train_holdout_split(10, 1.0, 1).is_err());
    }

    #[test]
    fn test_perfect_prediction() {
        let y = array![1.0, 2.0, 3.0];
        assert_eq!(r2_score(&y, &y), 1.0);
        assert_eq!(mean_squared_error(&y, &y), 0.0);
    }

    #[test]
    fn test_mean_prediction_scores_zero() {
        let y = array![1.0, 2.0, 3.0];
        let p = array![2.0, 2.0, 2.0];
        assert!(r2_score(&y, &p).abs() < 1e-12);
        assert!((mean_squared_error(&y, &p) - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_constant_target() {
        let y = array![5.0, 5.0];
        assert_eq!(r2_score(&y, &array![5.0, 5.0]), 1.0);
        assert_eq!(r2_score(&y, &array![4.0, 6.0]), 0.0);
    }
}
