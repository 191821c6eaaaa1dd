//! Simulate command implementation
//!
//! Drives the rewiring hooks with synthetic Gaussian gradients. Useful for
//! checking a configuration against realistic layer sizes without a dataset.

use crate::cli::{parse_layer_spec, SimulateArgs};
use crate::error::{RewireError, Result};
use crate::layer::SparseDense;
use crate::rewire::{RewiringCallback, RewiringConfig};
use crate::train::{gaussian, MaskedSgd, RewiringTrainer, TrainResult};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

/// Result file stem:
/// `results_for_<model>_<activation>_<loss>_<sparsity>_sgd[_<suffix>]`
///
/// `--result-filename` replaces the `results_for_<model>` prefix.
pub fn result_file_stem(args: &SimulateArgs, config: &RewiringConfig) -> String {
    let prefix = match &args.result_filename {
        Some(name) => name.clone(),
        None => {
            let model = args.model.strip_prefix(':').unwrap_or(&args.model);
            format!("results_for_{model}")
        }
    };
    let mut stem = format!(
        "{prefix}_{}_{}_{}_sgd",
        args.activation,
        args.loss,
        config.mode_name()
    );
    if let Some(suffix) = &args.suffix {
        stem.push('_');
        stem.push_str(suffix);
    }
    stem
}

/// Run the simulation and write statistics if an output directory was given
pub fn run_simulate(args: &SimulateArgs) -> Result<TrainResult> {
    let mut config = RewiringConfig::load(&args.config)?;
    if args.no_asserts {
        config = config.with_asserts_on(false);
    }
    let shapes = args
        .layers
        .iter()
        .map(|s| parse_layer_spec(s))
        .collect::<Result<Vec<_>>>()?;
    config.validate_shapes(&shapes)?;

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let layers = shapes
        .iter()
        .zip(config.connectivity_proportion())
        .enumerate()
        .map(|(i, (&(inputs, outputs), &p))| {
            SparseDense::random(format!("dense_{}", i + 1), inputs, outputs, p, &mut rng)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut optimizer = MaskedSgd::new(args.lr, args.momentum).with_noise(args.noise_coeff);
    if let Some(seed) = args.seed {
        optimizer = optimizer.with_seed(seed.wrapping_add(1));
    }

    info!(
        "Simulating {} epochs x {} steps, mode {}",
        args.epochs,
        args.steps,
        config.mode_name()
    );

    let stem = result_file_stem(args, &config);
    let rewiring = RewiringCallback::new(config)?;
    let mut trainer = RewiringTrainer::new(layers, Box::new(optimizer), rewiring);

    let grad_scale = args.grad_scale;
    let result = trainer.train(args.epochs, args.steps, |_, layers| {
        layers
            .iter()
            .map(|l| {
                Array2::from_shape_simple_fn(l.weights().shape(), || {
                    grad_scale * gaussian(&mut rng)
                })
            })
            .collect()
    })?;

    info!(
        "Done: {} connections rewired over {} epochs",
        result.total_rewired, result.epochs_completed
    );

    if let Some(dir) = &args.output_dir {
        std::fs::create_dir_all(dir).map_err(|e| RewireError::io(dir, e))?;
        let json = dir.join(format!("{stem}.json"));
        let csv = dir.join(format!("{stem}.csv"));
        trainer.stats().write_json(&json)?;
        trainer.stats().write_epoch_csv(&csv)?;
        info!("Results saved at {} and {}", json.display(), csv.display());
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    fn args(config: PathBuf, output_dir: Option<PathBuf>) -> SimulateArgs {
        SimulateArgs {
            config,
            layers: vec!["20x10".to_string(), "10x4".to_string()],
            epochs: 2,
            steps: 5,
            lr: 0.1,
            momentum: 0.0,
            noise_coeff: 1e-5,
            grad_scale: 1.0,
            seed: Some(42),
            no_asserts: false,
            model: "mlp".to_string(),
            activation: "relu".to_string(),
            loss: "crossent".to_string(),
            result_filename: None,
            suffix: None,
            output_dir,
        }
    }

    fn write_config(dir: &Path, yaml: &str) -> PathBuf {
        let path = dir.join("rewire.yaml");
        std::fs::write(&path, yaml).unwrap();
        path
    }

    #[test]
    fn test_result_file_stem() {
        let config = RewiringConfig::new(vec![0.1]);
        let mut a = args(PathBuf::from("rewire.yaml"), None);
        a.model = ":lenet".to_string();
        assert_eq!(
            result_file_stem(&a, &config),
            "results_for_lenet_relu_crossent_sparse_hard_sgd"
        );

        a.suffix = Some("run2".to_string());
        assert_eq!(
            result_file_stem(&a, &config.clone().with_fixed_conn(true)),
            "results_for_lenet_relu_crossent_sparse_hard_sgd_run2"
        );
        assert_eq!(
            result_file_stem(&a, &config.clone().with_soft_limit(true)),
            "results_for_lenet_relu_crossent_sparse_soft_sgd_run2"
        );

        a.result_filename = Some("mnist".to_string());
        a.loss = "mse".to_string();
        assert_eq!(
            result_file_stem(&a, &config),
            "mnist_relu_mse_sparse_hard_sgd_run2"
        );
    }

    #[test]
    fn test_simulate_writes_results() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(dir.path(), "connectivity_proportion: [0.1, 0.25]\nseed: 1\n");
        let out = dir.path().join("results");

        let result = run_simulate(&args(config, Some(out.clone()))).unwrap();
        assert_eq!(result.epochs_completed, 2);
        assert_eq!(result.final_connectivity[0].connections, 20);
        assert_eq!(result.final_connectivity[1].connections, 10);

        let stem = "results_for_mlp_relu_crossent_sparse_hard_sgd";
        assert!(out.join(format!("{stem}.json")).exists());
        let csv = std::fs::read_to_string(out.join(format!("{stem}.csv"))).unwrap();
        assert_eq!(csv.lines().count(), 1 + 2 * 2);
    }

    #[test]
    fn test_simulate_rejects_layer_count_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(dir.path(), "connectivity_proportion: [0.1]\n");
        assert!(matches!(
            run_simulate(&args(config, None)),
            Err(RewireError::LayerCountMismatch {
                expected: 1,
                found: 2
            })
        ));
    }

    #[test]
    fn test_simulate_rejects_unreachable_proportion() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(dir.path(), "connectivity_proportion: [0.1, 0.33]\n");
        assert!(matches!(
            run_simulate(&args(config, None)),
            Err(RewireError::UnrealizableProportion { size: 40, .. })
        ));
    }

    #[test]
    fn test_simulate_without_asserts() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(dir.path(), "connectivity_proportion: [0.1, 0.25]\nseed: 4\n");
        let mut a = args(config, None);
        a.no_asserts = true;
        let result = run_simulate(&a).unwrap();
        assert_eq!(result.final_connectivity[1].connections, 10);
    }
}
