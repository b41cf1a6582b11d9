//! Bagged regression trees
//!
//! Each tree is a CART regressor grown on a bootstrap resample, splitting on
//! the threshold that minimizes the summed squared error of the two children.
//! All features are considered at every split. Predictions average the trees.

use super::estimator::Regressor;
use crate::error::{PredictorError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Hyperparameters for [`RandomForestModel`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: usize,
    /// Nodes with fewer samples become leaves
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 2,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestModel {
    params: ForestParams,
    trees: Vec<RegressionTree>,
}

impl RandomForestModel {
    pub fn new(params: ForestParams) -> Self {
        Self {
            params,
            trees: Vec::new(),
        }
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }
}

impl Regressor for RandomForestModel {
    fn fit(&mut self, features: &Array2<f64>, targets: &Array1<f64>) -> Result<()> {
        if self.params.n_trees == 0 {
            return Err(PredictorError::invalid("random forest needs at least one tree"));
        }
        let n = features.nrows();
        let params = self.params.clone();
        let mut rng = StdRng::seed_from_u64(params.seed);

        let trees = (0..params.n_trees)
            .map(|_| {
                let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                RegressionTree::grow(features, targets, bootstrap, &params)
            })
            .collect();

        self.trees = trees;
        Ok(())
    }

    fn predict(&self, features: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(PredictorError::ModelUnavailable(
                "random forest has not been fitted".to_string(),
            ));
        }
        let count = self.trees.len() as f64;
        Ok(features
            .rows()
            .into_iter()
            .map(|row| self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>() / count)
            .collect())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Flat node arena; index 0 is the root
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RegressionTree {
    nodes: Vec<Node>,
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    sse: f64,
}

impl RegressionTree {
    fn grow(
        features: &Array2<f64>,
        targets: &Array1<f64>,
        indices: Vec<usize>,
        params: &ForestParams,
    ) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.build(features, targets, indices, 0, params);
        tree
    }

    fn build(
        &mut self,
        features: &Array2<f64>,
        targets: &Array1<f64>,
        indices: Vec<usize>,
        depth: usize,
        params: &ForestParams,
    ) -> usize {
        let mean = indices.iter().map(|&i| targets[i]).sum::<f64>() / indices.len() as f64;
        let node_id = self.nodes.len();
        self.nodes.push(Node::Leaf { value: mean });

        if depth >= params.max_depth || indices.len() < params.min_samples_split.max(2) {
            return node_id;
        }
        let Some(split) = best_split(features, targets, &indices) else {
            return node_id;
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| features[[i, split.feature]] <= split.threshold);
        if left_idx.is_empty() || right_idx.is_empty() {
            return node_id;
        }

        let left = self.build(features, targets, left_idx, depth + 1, params);
        let right = self.build(features, targets, right_idx, depth + 1, params);
        self.nodes[node_id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        node_id
    }

    fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut id = 0;
        loop {
            match self.nodes[id] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => id = if row[feature] <= threshold { left } else { right },
            }
        }
    }
}

/// Lowest-SSE split over all features, if any split improves on the parent
fn best_split(features: &Array2<f64>, targets: &Array1<f64>, indices: &[usize]) -> Option<SplitCandidate> {
    let n = indices.len() as f64;
    let total_sum: f64 = indices.iter().map(|&i| targets[i]).sum();
    let total_sq: f64 = indices.iter().map(|&i| targets[i] * targets[i]).sum();
    let parent_sse = total_sq - total_sum * total_sum / n;
    if parent_sse <= 0.0 {
        return None;
    }

    let mut best: Option<SplitCandidate> = None;
    let mut order = indices.to_vec();

    for feature in 0..features.ncols() {
        order.sort_by(|&a, &b| features[[a, feature]].total_cmp(&features[[b, feature]]));

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        for pos in 0..order.len() - 1 {
            let y = targets[order[pos]];
            left_sum += y;
            left_sq += y * y;

            let here = features[[order[pos], feature]];
            let next = features[[order[pos + 1], feature]];
            if here == next {
                continue;
            }

            let n_left = (pos + 1) as f64;
            let n_right = n - n_left;
            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let sse = (left_sq - left_sum * left_sum / n_left)
                + (right_sq - right_sum * right_sum / n_right);

            if best.map_or(true, |b| sse < b.sse) {
                best = Some(SplitCandidate {
                    feature,
                    threshold: here + (next - here) / 2.0,
                    sse,
                });
            }
        }
    }

    best.filter(|b| b.sse < parent_sse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn grid_data() -> (Array2<f64>, Array1<f64>) {
        let mut rows = Vec::new();
        let mut targets = Vec::new();
        for a in 0..10 {
            for b in 0..10 {
                rows.extend_from_slice(&[a as f64, b as f64, 1.0]);
                targets.push(10.0 * a as f64 + b as f64);
            }
        }
        (Array2::from_shape_vec((100, 3), rows).unwrap(), Array1::from_vec(targets))
    }

    fn small_params() -> ForestParams {
        ForestParams {
            n_trees: 20,
            ..Default::default()
        }
    }

    #[test]
    fn test_fits_grid_closely() {
        let (features, targets) = grid_data();
        let mut model = RandomForestModel::new(small_params());
        model.fit(&features, &targets).unwrap();
        assert_eq!(model.tree_count(), 20);

        let predictions = model.predict(&features).unwrap();
        let mse = predictions
            .iter()
            .zip(targets.iter())
            .map(|(p, t)| (p - t).powi(2))
            .sum::<f64>()
            / targets.len() as f64;
        assert!(mse < 25.0, "mse was {}", mse);
    }

    #[test]
    fn test_same_seed_same_forest() {
        let (features, targets) = grid_data();
        let mut a = RandomForestModel::new(small_params());
        let mut b = RandomForestModel::new(small_params());
        a.fit(&features, &targets).unwrap();
        b.fit(&features, &targets).unwrap();
        let probe = array![[3.5, 7.2, 1.0], [9.0, 0.0, 1.0]];
        assert_eq!(a.predict(&probe).unwrap(), b.predict(&probe).unwrap());
    }

    #[test]
    fn test_constant_targets_give_constant_prediction() {
        let features = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]];
        let targets = array![42.0, 42.0, 42.0];
        let mut model = RandomForestModel::new(small_params());
        model.fit(&features, &targets).unwrap();
        let p = model.predict(&array![[100.0, 0.0, 0.0]]).unwrap();
        assert!((p[0] - 42.0).abs() < 1e-9);
    }

    #[test]
    fn test_depth_zero_is_mean_of_bootstrap() {
        let (features, targets) = grid_data();
        let mut model = RandomForestModel::new(ForestParams {
            n_trees: 1,
            max_depth: 0,
            ..Default::default()
        });
        model.fit(&features, &targets).unwrap();
        let p = model.predict(&array![[0.0, 0.0, 1.0], [9.0, 9.0, 1.0]]).unwrap();
        assert_eq!(p[0], p[1]);
    }

    #[test]
    fn test_zero_trees_rejected() {
        let (features, targets) = grid_data();
        let mut model = RandomForestModel::new(ForestParams {
            n_trees: 0,
            ..Default::default()
        });
        assert!(model.fit(&features, &targets).is_err());
    }

    #[test]
    fn test_unfitted_predict_fails() {
        let model = RandomForestModel::new(ForestParams::default());
        let err = model.predict(&array![[1.0, 2.0, 3.0]]).unwrap_err();
        assert_eq!(err.kind(), "model_unavailable");
    }
}
