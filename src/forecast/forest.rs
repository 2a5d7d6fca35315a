//! Multi-output random forest regression.
//!
//! Each tree is a CART regressor grown on a bootstrap sample until its leaves are
//! pure or cannot be split, choosing at every node the split (over all features)
//! that minimizes the summed squared error of all outputs. Predictions average the
//! trees.

use log::debug;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use ordered_float::OrderedFloat;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ForestError {
    #[error("Cannot fit a forest on zero samples")]
    NoSamples,

    #[error("A forest needs at least one tree")]
    NoEstimators,

    #[error("Features have {features} rows but targets have {targets}")]
    RowMismatch { features: usize, targets: usize },

    #[error("Prediction input has {found} features, the forest was fit on {expected}")]
    FeatureMismatch { expected: usize, found: usize },
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        value: Array1<f64>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn predict(&self, sample: ArrayView1<f64>) -> &Array1<f64> {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if sample[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

struct TreeBuilder<'a> {
    features: ArrayView2<'a, f64>,
    targets: ArrayView2<'a, f64>,
    nodes: Vec<Node>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    /// Samples going left, a prefix of the indices sorted by `feature`.
    left_len: usize,
    error: f64,
}

impl TreeBuilder<'_> {
    fn leaf_value(&self, samples: &[usize]) -> Array1<f64> {
        self.targets
            .select(Axis(0), samples)
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(self.targets.ncols()))
    }

    /// Mean squared deviation over all outputs, computed in two passes so that
    /// constant targets give exactly zero.
    fn impurity(&self, samples: &[usize], mean: &Array1<f64>) -> f64 {
        let mut total = 0.0;
        for &i in samples {
            for (value, m) in self.targets.row(i).iter().zip(mean) {
                total += (value - m).powi(2);
            }
        }
        total / (samples.len() * self.targets.ncols()).max(1) as f64
    }

    fn best_split(&self, samples: &mut [usize]) -> Option<BestSplit> {
        let n = samples.len();
        let outputs = self.targets.ncols();
        let mut best: Option<BestSplit> = None;

        for feature in 0..self.features.ncols() {
            samples.sort_by_key(|&i| OrderedFloat(self.features[[i, feature]]));

            let mut total_sum = vec![0.0; outputs];
            let mut total_sq = vec![0.0; outputs];
            for &i in samples.iter() {
                for (k, value) in self.targets.row(i).iter().enumerate() {
                    total_sum[k] += value;
                    total_sq[k] += value * value;
                }
            }

            let mut left_sum = vec![0.0; outputs];
            let mut left_sq = vec![0.0; outputs];
            for left_len in 1..n {
                let moved = samples[left_len - 1];
                for (k, value) in self.targets.row(moved).iter().enumerate() {
                    left_sum[k] += value;
                    left_sq[k] += value * value;
                }

                let below = self.features[[moved, feature]];
                let above = self.features[[samples[left_len], feature]];
                if below >= above {
                    continue;
                }

                let right_len = (n - left_len) as f64;
                let error: f64 = (0..outputs)
                    .map(|k| {
                        let right_sum = total_sum[k] - left_sum[k];
                        let right_sq = total_sq[k] - left_sq[k];
                        (left_sq[k] - left_sum[k] * left_sum[k] / left_len as f64)
                            + (right_sq - right_sum * right_sum / right_len)
                    })
                    .sum();

                if best.as_ref().map_or(true, |b| error < b.error) {
                    let mut threshold = below / 2.0 + above / 2.0;
                    if threshold >= above {
                        threshold = below;
                    }
                    best = Some(BestSplit {
                        feature,
                        threshold,
                        left_len,
                        error,
                    });
                }
            }
        }
        best
    }

    fn grow(&mut self, samples: &mut [usize]) -> usize {
        let value = self.leaf_value(samples);
        let pure = self.impurity(samples, &value) <= f64::EPSILON;

        let split = if samples.len() < 2 || pure {
            None
        } else {
            self.best_split(samples)
        };

        let Some(split) = split else {
            self.nodes.push(Node::Leaf { value });
            return self.nodes.len() - 1;
        };

        let feature = split.feature;
        samples.sort_by_key(|&i| OrderedFloat(self.features[[i, feature]]));
        let (left_samples, right_samples) = samples.split_at_mut(split.left_len);

        let index = self.nodes.len();
        self.nodes.push(Node::Leaf { value });
        let left = self.grow(left_samples);
        let right = self.grow(right_samples);
        self.nodes[index] = Node::Split {
            feature,
            threshold: split.threshold,
            left,
            right,
        };
        index
    }
}

/// An ensemble of regression trees, each fit on a bootstrap sample drawn from a
/// seeded generator. The same inputs and seed always give the same forest.
#[derive(Debug, Clone)]
pub struct RandomForestRegressor {
    trees: Vec<Tree>,
    n_features: usize,
    n_outputs: usize,
}

impl RandomForestRegressor {
    /// Fits `n_estimators` trees on `features` (samples × features) and `targets`
    /// (samples × outputs).
    pub fn fit<'a>(
        features: ArrayView2<'a, f64>,
        targets: ArrayView2<'a, f64>,
        n_estimators: usize,
        seed: u64,
    ) -> Result<Self, ForestError> {
        if n_estimators == 0 {
            return Err(ForestError::NoEstimators);
        }
        let n_samples = features.nrows();
        if n_samples == 0 {
            return Err(ForestError::NoSamples);
        }
        if targets.nrows() != n_samples {
            return Err(ForestError::RowMismatch {
                features: n_samples,
                targets: targets.nrows(),
            });
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let trees = (0..n_estimators)
            .map(|_| {
                let mut samples: Vec<usize> =
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();
                let mut builder = TreeBuilder {
                    features,
                    targets,
                    nodes: Vec::new(),
                };
                builder.grow(&mut samples);
                Tree {
                    nodes: builder.nodes,
                }
            })
            .collect::<Vec<_>>();

        debug!(
            "Fit {} trees on {} samples ({} features -> {} outputs), {} nodes in total",
            trees.len(),
            n_samples,
            features.ncols(),
            targets.ncols(),
            trees.iter().map(|t| t.nodes.len()).sum::<usize>()
        );

        Ok(Self {
            trees,
            n_features: features.ncols(),
            n_outputs: targets.ncols(),
        })
    }

    pub fn n_estimators(&self) -> usize {
        self.trees.len()
    }

    /// Predicts the outputs for one sample as the mean of the trees' leaves.
    pub fn predict(&self, sample: ArrayView1<f64>) -> Result<Array1<f64>, ForestError> {
        if sample.len() != self.n_features {
            return Err(ForestError::FeatureMismatch {
                expected: self.n_features,
                found: sample.len(),
            });
        }
        let mut sum = Array1::<f64>::zeros(self.n_outputs);
        for tree in &self.trees {
            sum += tree.predict(sample.view());
        }
        Ok(sum / self.trees.len() as f64)
    }

    /// Predicts every row of `samples`.
    pub fn predict_many(&self, samples: ArrayView2<f64>) -> Result<Array2<f64>, ForestError> {
        let mut out = Array2::zeros((samples.nrows(), self.n_outputs));
        for (sample, mut row) in samples.rows().into_iter().zip(out.rows_mut()) {
            row.assign(&self.predict(sample)?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn zero_estimators_is_rejected() {
        let x = Array2::from_shape_fn((4, 1), |(i, _)| i as f64);
        let y = Array2::from_shape_fn((4, 2), |(i, j)| (i + j) as f64);
        let result = RandomForestRegressor::fit(x.view(), y.view(), 0, 42);
        assert_eq!(result.err(), Some(ForestError::NoEstimators));
    }

    #[test]
    fn fits_views_of_owned_arrays_built_separately() -> Result<(), ForestError> {
        let features = Array2::from_shape_fn((6, 1), |(i, _)| i as f64);
        let targets = features.mapv(|v| v * 2.0);
        let forest = fit_views(features.view(), targets.view())?;
        assert_eq!(forest.n_estimators(), 5);
        Ok(())
    }

    fn fit_views<'a>(
        features: ArrayView2<'a, f64>,
        targets: ArrayView2<'a, f64>,
    ) -> Result<RandomForestRegressor, ForestError> {
        RandomForestRegressor::fit(features, targets, 5, 7)
    }

    #[test]
    fn constant_targets_predict_the_constant() -> Result<(), ForestError> {
        let x = Array2::from_shape_fn((10, 2), |(i, j)| (i * 3 + j) as f64);
        let y = Array2::from_elem((10, 3), 13.7);
        let forest = RandomForestRegressor::fit(x.view(), y.view(), 20, 42)?;
        let prediction = forest.predict(array![100.0, -5.0].view())?;
        for value in prediction.iter() {
            assert!((value - 13.7).abs() < 1e-9);
        }
        Ok(())
    }

    #[test]
    fn separates_two_regimes() -> Result<(), ForestError> {
        // y = 10 for x < 5, y = 20 otherwise
        let x = Array2::from_shape_fn((40, 1), |(i, _)| (i % 10) as f64);
        let y = Array2::from_shape_fn((40, 2), |(i, k)| {
            if i % 10 < 5 {
                10.0 + k as f64
            } else {
                20.0 + k as f64
            }
        });
        let forest = RandomForestRegressor::fit(x.view(), y.view(), 50, 7)?;
        let low = forest.predict(array![1.0].view())?;
        let high = forest.predict(array![8.0].view())?;
        assert!((low[0] - 10.0).abs() < 1.0, "low regime predicted {}", low[0]);
        assert!((high[1] - 21.0).abs() < 1.0, "high regime predicted {}", high[1]);
        Ok(())
    }

    #[test]
    fn same_seed_same_forest() -> Result<(), ForestError> {
        let x = Array2::from_shape_fn((15, 3), |(i, j)| ((i * 7 + j * 3) % 11) as f64);
        let y = Array2::from_shape_fn((15, 2), |(i, k)| ((i * 5 + k) % 13) as f64);
        let sample = array![3.0, 4.0, 5.0];

        let a = RandomForestRegressor::fit(x.view(), y.view(), 30, 42)?.predict(sample.view())?;
        let b = RandomForestRegressor::fit(x.view(), y.view(), 30, 42)?.predict(sample.view())?;
        assert_eq!(a, b);
        Ok(())
    }

    #[test]
    fn single_sample_is_a_leaf() -> Result<(), ForestError> {
        let x = array![[1.0, 2.0]];
        let y = array![[3.0, 4.0, 5.0]];
        let forest = RandomForestRegressor::fit(x.view(), y.view(), 5, 0)?;
        assert_eq!(forest.n_estimators(), 5);
        let many = forest.predict_many(array![[0.0, 0.0], [9.0, 9.0]].view())?;
        assert_eq!(many.row(1).to_vec(), vec![3.0, 4.0, 5.0]);
        Ok(())
    }

    #[test]
    fn rejects_bad_shapes() {
        let x = Array2::<f64>::zeros((0, 2));
        let y = Array2::<f64>::zeros((0, 1));
        assert_eq!(
            RandomForestRegressor::fit(x.view(), y.view(), 10, 1).err(),
            Some(ForestError::NoSamples)
        );

        let x = Array2::<f64>::zeros((3, 2));
        let y = Array2::<f64>::zeros((2, 1));
        assert!(matches!(
            RandomForestRegressor::fit(x.view(), y.view(), 10, 1),
            Err(ForestError::RowMismatch { .. })
        ));
    }
}
