//! Training metrics.

use std::collections::BTreeMap;

use burn::prelude::*;

/// Logged values keyed by name, e.g. `val_loss` or `train_accuracy`.
pub type MetricLog = BTreeMap<String, f64>;

/// Trait for training metrics.
///
/// Classification metrics read `targets` of width 1 as class indices and
/// wider targets as one-hot rows.
pub trait Metric<B: Backend>: Send + Sync {
    /// Compute the metric from predictions and targets.
    fn compute(&self, preds: &Tensor<B, 2>, targets: &Tensor<B, 2>) -> f32;

    /// Get the metric name.
    fn name(&self) -> &str;

    /// Whether higher is better.
    fn higher_is_better(&self) -> bool {
        true
    }
}

fn target_classes<B: Backend>(targets: &Tensor<B, 2>) -> Tensor<B, 2, Int> {
    if targets.dims()[1] > 1 {
        targets.clone().argmax(1)
    } else {
        targets.clone().int()
    }
}

fn to_class_vec<B: Backend>(classes: Tensor<B, 2, Int>) -> Vec<i64> {
    classes
        .float()
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .unwrap_or_default()
        .into_iter()
        .map(|c| c as i64)
        .collect()
}

/// Classification accuracy metric.
#[derive(Debug, Clone, Default)]
pub struct Accuracy;

impl<B: Backend> Metric<B> for Accuracy {
    fn compute(&self, preds: &Tensor<B, 2>, targets: &Tensor<B, 2>) -> f32 {
        let total = preds.dims()[0] as f32;
        if total == 0.0 {
            return 0.0;
        }

        let correct = preds.clone().argmax(1).equal(target_classes(targets));
        let correct_sum: f32 = correct.int().sum().into_scalar().elem();

        correct_sum / total
    }

    fn name(&self) -> &str {
        "accuracy"
    }
}

/// F1 Score metric (macro average).
///
/// Computes the macro-averaged F1 score across the classes that appear in
/// either the predictions or the targets. F1 = 2 * (precision * recall) / (precision + recall)
#[derive(Debug, Clone)]
pub struct F1Score {
    n_classes: usize,
}

impl F1Score {
    /// Create a new F1 score metric.
    pub fn new(n_classes: usize) -> Self {
        Self { n_classes }
    }
}

impl<B: Backend> Metric<B> for F1Score {
    fn compute(&self, preds: &Tensor<B, 2>, targets: &Tensor<B, 2>) -> f32 {
        let pred_vec = to_class_vec(preds.clone().argmax(1));
        let target_vec = to_class_vec(target_classes(targets));

        if pred_vec.is_empty() {
            return 0.0;
        }

        let mut total_f1 = 0.0;
        let mut valid_classes = 0;

        for class in 0..self.n_classes as i64 {
            let mut tp = 0;
            let mut fp = 0;
            let mut fn_ = 0;

            for (&pred, &target) in pred_vec.iter().zip(&target_vec) {
                match (pred == class, target == class) {
                    (true, true) => tp += 1,
                    (true, false) => fp += 1,
                    (false, true) => fn_ += 1,
                    (false, false) => {}
                }
            }

            // Classes absent from both predictions and targets are skipped
            if tp + fp + fn_ == 0 {
                continue;
            }

            let precision = if tp + fp > 0 {
                tp as f32 / (tp + fp) as f32
            } else {
                0.0
            };
            let recall = if tp + fn_ > 0 {
                tp as f32 / (tp + fn_) as f32
            } else {
                0.0
            };

            total_f1 += if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            valid_classes += 1;
        }

        if valid_classes > 0 {
            total_f1 / valid_classes as f32
        } else {
            0.0
        }
    }

    fn name(&self) -> &str {
        "f1_score"
    }
}

/// Mean Squared Error metric.
#[derive(Debug, Clone, Default)]
pub struct Mse;

impl<B: Backend> Metric<B> for Mse {
    fn compute(&self, preds: &Tensor<B, 2>, targets: &Tensor<B, 2>) -> f32 {
        let diff = preds.clone() - targets.clone();
        (diff.clone() * diff).mean().into_scalar().elem()
    }

    fn name(&self) -> &str {
        "mse"
    }

    fn higher_is_better(&self) -> bool {
        false
    }
}

/// Root Mean Squared Error metric.
#[derive(Debug, Clone, Default)]
pub struct Rmse;

impl<B: Backend> Metric<B> for Rmse {
    fn compute(&self, preds: &Tensor<B, 2>, targets: &Tensor<B, 2>) -> f32 {
        Metric::<B>::compute(&Mse, preds, targets).sqrt()
    }

    fn name(&self) -> &str {
        "rmse"
    }

    fn higher_is_better(&self) -> bool {
        false
    }
}

/// Mean Absolute Error metric.
#[derive(Debug, Clone, Default)]
pub struct Mae;

impl<B: Backend> Metric<B> for Mae {
    fn compute(&self, preds: &Tensor<B, 2>, targets: &Tensor<B, 2>) -> f32 {
        let diff = preds.clone() - targets.clone();
        diff.abs().mean().into_scalar().elem()
    }

    fn name(&self) -> &str {
        "mae"
    }

    fn higher_is_better(&self) -> bool {
        false
    }
}

/// A named group of metrics logged under a common prefix.
pub struct MetricCollection<B: Backend> {
    prefix: String,
    metrics: Vec<Box<dyn Metric<B>>>,
}

impl<B: Backend> MetricCollection<B> {
    /// Create an empty collection whose keys start with `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            metrics: Vec::new(),
        }
    }

    /// Add a metric.
    #[must_use]
    pub fn with_metric<M: Metric<B> + 'static>(mut self, metric: M) -> Self {
        self.metrics.push(Box::new(metric));
        self
    }

    /// Key prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Prefixed metric names.
    pub fn keys(&self) -> Vec<String> {
        self.metrics
            .iter()
            .map(|m| format!("{}{}", self.prefix, m.name()))
            .collect()
    }

    /// Number of metrics.
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Compute every metric into a prefixed log.
    pub fn compute(&self, preds: &Tensor<B, 2>, targets: &Tensor<B, 2>) -> MetricLog {
        self.metrics
            .iter()
            .map(|m| {
                (
                    format!("{}{}", self.prefix, m.name()),
                    f64::from(m.compute(preds, targets)),
                )
            })
            .collect()
    }
}

impl<B: Backend> Default for MetricCollection<B> {
    fn default() -> Self {
        Self::new("")
    }
}

impl<B: Backend> std::fmt::Debug for MetricCollection<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricCollection")
            .field("prefix", &self.prefix)
            .field("metrics", &self.keys())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn preds() -> Tensor<TestBackend, 2> {
        Tensor::from_floats(
            [[0.9, 0.1], [0.2, 0.8], [0.7, 0.3], [0.4, 0.6]],
            &Default::default(),
        )
    }

    #[test]
    fn test_accuracy_with_class_indices() {
        let targets = Tensor::<TestBackend, 2>::from_floats([[0.0], [1.0], [1.0], [1.0]], &Default::default());
        let acc = Metric::<TestBackend>::compute(&Accuracy, &preds(), &targets);
        assert!((acc - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_accuracy_with_one_hot() {
        let targets = Tensor::<TestBackend, 2>::from_floats(
            [[1.0, 0.0], [0.0, 1.0], [1.0, 0.0], [0.0, 1.0]],
            &Default::default(),
        );
        let acc = Metric::<TestBackend>::compute(&Accuracy, &preds(), &targets);
        assert!((acc - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_f1_macro() {
        // preds: 0, 1, 0, 1; targets: 0, 1, 1, 1
        let targets = Tensor::<TestBackend, 2>::from_floats([[0.0], [1.0], [1.0], [1.0]], &Default::default());
        let f1 = Metric::<TestBackend>::compute(&F1Score::new(2), &preds(), &targets);

        // class 0: p=1/2, r=1 -> 2/3; class 1: p=1, r=2/3 -> 4/5
        let expected = (2.0 / 3.0 + 4.0 / 5.0) / 2.0;
        assert!((f1 - expected).abs() < 1e-5);
    }

    #[test]
    fn test_f1_counts_predicted_only_class() {
        // preds: 0, 1, 0, 1; targets all 0. Class 1 is predicted but never a target.
        let targets = Tensor::<TestBackend, 2>::from_floats([[0.0], [0.0], [0.0], [0.0]], &Default::default());
        let f1 = Metric::<TestBackend>::compute(&F1Score::new(2), &preds(), &targets);

        // class 0: p=1, r=1/2 -> 2/3; class 1: p=0, r=0 -> 0
        assert!((f1 - 1.0 / 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_f1_skips_absent_class() {
        let device = Default::default();
        let preds = Tensor::<TestBackend, 2>::from_floats([[0.9, 0.1, 0.0], [0.1, 0.9, 0.0]], &device);
        let targets = Tensor::<TestBackend, 2>::from_floats([[0.0], [1.0]], &device);
        let f1 = Metric::<TestBackend>::compute(&F1Score::new(3), &preds, &targets);
        assert!((f1 - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_regression_metrics() {
        let device = Default::default();
        let preds = Tensor::<TestBackend, 2>::from_floats([[1.0], [2.0], [3.0]], &device);
        let targets = Tensor::<TestBackend, 2>::from_floats([[2.0], [2.0], [5.0]], &device);

        let mse = Metric::<TestBackend>::compute(&Mse, &preds, &targets);
        let rmse = Metric::<TestBackend>::compute(&Rmse, &preds, &targets);
        let mae = Metric::<TestBackend>::compute(&Mae, &preds, &targets);

        assert!((mse - 5.0 / 3.0).abs() < 1e-5);
        assert!((rmse - (5.0f32 / 3.0).sqrt()).abs() < 1e-5);
        assert!((mae - 1.0).abs() < 1e-5);
        assert!(!Metric::<TestBackend>::higher_is_better(&Mae));
    }

    #[test]
    fn test_collection_prefixes_keys() {
        let collection = MetricCollection::<TestBackend>::new("val_")
            .with_metric(Accuracy)
            .with_metric(F1Score::new(2));

        assert_eq!(collection.len(), 2);
        assert_eq!(collection.keys(), vec!["val_accuracy", "val_f1_score"]);

        let targets = Tensor::<TestBackend, 2>::from_floats([[0.0], [1.0], [0.0], [1.0]], &Default::default());
        let log = collection.compute(&preds(), &targets);

        assert_eq!(log.len(), 2);
        assert!((log["val_accuracy"] - 1.0).abs() < 1e-6);
        assert!((log["val_f1_score"] - 1.0).abs() < 1e-6);
    }
}
