//! End-to-end rewiring over several epochs through the public API.

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use recablear::layer::{Layer, SparseDense, SparseWeights};
use recablear::rewire::{RewiringCallback, RewiringConfig, RewiringStats};
use recablear::train::{CallbackContext, MaskedSgd, Optimizer};

struct Relu;

impl Layer for Relu {
    fn name(&self) -> &str {
        "relu"
    }
}

fn lenet_like(rng: &mut StdRng) -> Vec<Box<dyn Layer>> {
    vec![
        Box::new(SparseDense::random("dense_1", 196, 60, 0.1, rng).unwrap()),
        Box::new(Relu),
        Box::new(SparseDense::random("dense_2", 60, 20, 0.15, rng).unwrap()),
        Box::new(Relu),
        Box::new(SparseDense::random("dense_3", 20, 10, 0.3, rng).unwrap()),
    ]
}

fn random_grads(layers: &[Box<dyn Layer>], rng: &mut StdRng) -> Vec<Array2<f32>> {
    layers
        .iter()
        .filter_map(|l| l.sparse_weights())
        .map(|w| Array2::from_shape_simple_fn(w.shape(), || rng.random_range(-1.0..1.0)))
        .collect()
}

fn run(config: RewiringConfig, epochs: usize, steps: usize) -> (Vec<Box<dyn Layer>>, RewiringStats) {
    let mut rng = StdRng::seed_from_u64(300_100);
    let mut layers = lenet_like(&mut rng);
    let mut optimizer = MaskedSgd::new(0.05, 0.9).with_noise(1e-5).with_seed(1);
    let mut rewiring = RewiringCallback::new(config).unwrap();
    let targets = rewiring.config().connectivity_proportion().to_vec();

    for epoch in 0..epochs {
        for step in 0..steps {
            let ctx = CallbackContext::at(epoch, step, steps);
            let pre = rewiring.before_batch(&layers);

            let grads = random_grads(&layers, &mut rng);
            let mut params: Vec<&mut SparseWeights> = layers
                .iter_mut()
                .filter_map(|l| l.sparse_weights_mut())
                .collect();
            optimizer.step(&mut params, &grads).unwrap();

            rewiring.after_batch(&mut layers, pre, &ctx).unwrap();

            for (weights, &target) in layers
                .iter()
                .filter_map(|l| l.sparse_weights())
                .zip(&targets)
            {
                assert!(weights.first_pruned_violation().is_none());
                assert_eq!(weights.proportion(), target);
            }
        }
        rewiring.after_epoch(&layers, epoch);
    }

    (layers, rewiring.stats().clone())
}

#[test]
fn test_hard_rewiring_over_epochs() {
    let config = RewiringConfig::new(vec![0.1, 0.15, 0.3]).with_seed(7);
    let (_, stats) = run(config, 3, 10);

    assert_eq!(stats.epoch_data().len(), 3);
    assert_eq!(stats.batch_data().len(), 30);
    assert!(stats.total_rewired() > 0);
    for (name, target) in [("dense_1", 0.1), ("dense_2", 0.15), ("dense_3", 0.3)] {
        let history = stats.layer_history(name);
        assert_eq!(history.len(), 3);
        assert!(history.values().all(|r| r.proportion == target));
    }
    assert!(stats.layer_history("relu").is_empty());
}

#[test]
fn test_fixed_connectivity_keeps_masks() {
    let mut rng = StdRng::seed_from_u64(300_100);
    let initial: Vec<Array2<bool>> = lenet_like(&mut rng)
        .iter()
        .filter_map(|l| l.sparse_weights().map(|w| w.mask().clone()))
        .collect();

    let config = RewiringConfig::new(vec![0.1, 0.15, 0.3])
        .with_seed(7)
        .with_fixed_conn(true);
    let (layers, stats) = run(config, 2, 5);

    assert_eq!(stats.total_rewired(), 0);
    let masks: Vec<Array2<bool>> = layers
        .iter()
        .filter_map(|l| l.sparse_weights().map(|w| w.mask().clone()))
        .collect();
    assert_eq!(masks, initial);
}

#[test]
fn test_stats_export() {
    let config = RewiringConfig::new(vec![0.1, 0.15, 0.3]).with_seed(3);
    let (_, stats) = run(config, 2, 3);

    let dir = tempfile::tempdir().unwrap();
    let json = dir.path().join("stats.json");
    stats.write_json(&json).unwrap();
    let parsed: RewiringStats =
        serde_json::from_str(&std::fs::read_to_string(&json).unwrap()).unwrap();
    assert_eq!(parsed, stats);
}
