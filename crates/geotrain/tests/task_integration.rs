//! Integration tests for task construction and optimization.
//!
//! These tests drive tasks the way a training loop would, with small synthetic data.

use std::collections::BTreeMap;

use burn::optim::GradientsParams;
use burn::prelude::*;
use geotrain::backend::{Autodiff, NdArray};
use geotrain::prelude::*;

type TrainBackend = Autodiff<NdArray>;

/// Rows of two features on a grid, with target `2 * a - b`.
fn create_regression_data(
    n_samples: usize,
    device: &<TrainBackend as Backend>::Device,
) -> RegressionBatch<TrainBackend> {
    let mut x_data = Vec::with_capacity(n_samples * 2);
    let mut y_data = Vec::with_capacity(n_samples);

    for i in 0..n_samples {
        let a = i as f32 / n_samples as f32;
        let b = ((i * 7) % n_samples) as f32 / n_samples as f32;
        x_data.push(a);
        x_data.push(b);
        y_data.push(2.0 * a - b);
    }

    let inputs = Tensor::<TrainBackend, 1>::from_floats(x_data.as_slice(), device)
        .reshape([n_samples, 2]);
    let targets = Tensor::<TrainBackend, 1>::from_floats(y_data.as_slice(), device)
        .reshape([n_samples, 1]);
    RegressionBatch::new(inputs, targets)
}

/// Two well separated clusters, labelled by the sign of the first feature.
fn create_classification_data(
    device: &<TrainBackend as Backend>::Device,
) -> ClassificationBatch<TrainBackend> {
    ClassificationBatch::new(
        Tensor::from_floats(
            [
                [1.0, 0.2],
                [1.2, -0.1],
                [0.9, 0.0],
                [-1.0, 0.1],
                [-1.1, -0.2],
                [-0.8, 0.0],
            ],
            device,
        ),
        Tensor::from_ints([1, 1, 1, 0, 0, 0], device),
    )
}

#[test]
fn test_regression_training_reduces_loss() {
    let device = Default::default();
    let config = RegressionTaskConfig::new(2, 1)
        .with_hidden(16)
        .with_lr(1e-2)
        .with_patience(5);

    let mut task = RegressionTask::<TrainBackend>::build(&config, &device).expect("Failed to build task");
    let mut optim = task.configure_optimizers().expect("Failed to configure optimizers");
    assert!((optim.lr() - 1e-2).abs() < 1e-12);

    let batch = create_regression_data(32, &device);
    let initial = task.validation_step(batch.clone()).unwrap()["val_loss"];

    for _ in 0..100 {
        let output = task.training_step(batch.clone()).unwrap();
        let grads = GradientsParams::from_grads(output.loss.backward(), task.model());
        task.optimizer_step(&mut optim, grads);
    }

    let trained = task.validation_step(batch).unwrap()["val_loss"];
    assert!(
        trained < initial,
        "loss did not decrease: {initial} -> {trained}"
    );
}

#[test]
fn test_classification_training_and_scheduling() {
    let device = Default::default();
    let config = ClassificationTaskConfig::new(2, 2)
        .with_hidden(8)
        .with_lr(5e-2)
        .with_patience(1);

    let mut task =
        ClassificationTask::<TrainBackend>::build(&config, &device).expect("Failed to build task");
    let mut optim = task.configure_optimizers().unwrap();
    assert_eq!(optim.monitor(), DEFAULT_MONITOR);

    let batch = create_classification_data(&device);
    for _ in 0..100 {
        let output = task.training_step(batch.clone()).unwrap();
        let grads = GradientsParams::from_grads(output.loss.backward(), task.model());
        task.optimizer_step(&mut optim, grads);
    }

    let logged = task.validation_step(batch).unwrap();
    assert!((logged["val_accuracy"] - 1.0).abs() < 1e-6);

    // The first epoch sets the best value; the next `patience + 1` plateau.
    assert!(!optim.scheduler_step(&logged).unwrap());
    assert!(!optim.scheduler_step(&logged).unwrap());
    assert!(optim.scheduler_step(&logged).unwrap());
    assert!((optim.lr() - 5e-3).abs() < 1e-12);
}

#[test]
fn test_scheduler_missing_monitor() {
    let device = Default::default();
    let config = RegressionTaskConfig::new(2, 1);
    let task = RegressionTask::<TrainBackend>::build(&config, &device).unwrap();
    let mut optim = task.configure_optimizers().unwrap();

    let output = task.training_step(create_regression_data(8, &device)).unwrap();
    let err = optim.scheduler_step(&output.log).unwrap_err();

    assert!(matches!(err, TrainError::MonitorNotFound { .. }));
    assert!(err.to_string().contains("val_loss"));
}

#[test]
fn test_forward_matches_model() {
    let device = Default::default();
    let config = ClassificationTaskConfig::new(2, 3);
    let task = ClassificationTask::<TrainBackend>::build(&config, &device).unwrap();
    let inputs = create_classification_data(&device).inputs;

    let via_task: Vec<f32> = task.forward(inputs.clone()).into_data().to_vec().unwrap();
    let via_model: Vec<f32> = task.model().forward(inputs).into_data().to_vec().unwrap();

    assert_eq!(via_task, via_model);
}

#[test]
fn test_hparams_roundtrip_rebuilds_task() {
    let device = Default::default();
    let dir = tempfile::tempdir().unwrap();
    let config = ClassificationTaskConfig::new(2, 3)
        .with_focal_loss(1.5)
        .with_lr(3e-4)
        .with_patience(7);

    let task = ClassificationTask::<TrainBackend>::build(&config, &device).unwrap();
    task.hparams().save(dir.path()).unwrap();

    let loaded = Hyperparameters::load(dir.path()).unwrap();
    assert_eq!(&loaded, task.hparams());

    let restored: ClassificationTaskConfig = loaded.to_config().unwrap();
    assert_eq!(restored.loss, "focal");
    assert_eq!(restored.gamma, Some(1.5));

    let rebuilt = Task::new(ClassificationTask::<TrainBackend>::default(), loaded, &device).unwrap();
    assert_eq!(
        rebuilt.inner().criterion(),
        ClassificationLoss::Focal { gamma: 1.5 }
    );

    let optim = rebuilt.configure_optimizers().unwrap();
    assert!((optim.lr() - 3e-4).abs() < 1e-12);
    assert_eq!(optim.scheduler().patience(), 7);
}

#[test]
fn test_hand_written_hparams() {
    let device = Default::default();
    let hparams: Hyperparameters = serde_json::from_str(
        r#"{"in_features": 4, "num_outputs": 2, "lr": 0.001, "patience": 5}"#,
    )
    .unwrap();

    let task = Task::new(RegressionTask::<TrainBackend>::default(), hparams, &device).unwrap();
    let mut optim = task.configure_optimizers().unwrap();

    assert!((optim.lr() - 1e-3).abs() < 1e-12);
    assert_eq!(optim.scheduler().patience(), 5);
    assert_eq!(optim.monitor(), "val_loss");

    let mut logged = BTreeMap::new();
    logged.insert("val_loss".to_string(), 1.0);
    assert!(!optim.scheduler_step(&logged).unwrap());
}
