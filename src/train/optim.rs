//! Mask-aware optimizers

use crate::error::{RewireError, Result};
use crate::layer::SparseWeights;
use ndarray::{Array2, Zip};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::PI;

/// Trait for optimizers that update sparse kernels in place
pub trait Optimizer {
    /// Apply one update. `grads[i]` must have the shape of `params[i]`.
    ///
    /// Implementations must leave masks untouched and pruned weights at zero.
    fn step(&mut self, params: &mut [&mut SparseWeights], grads: &[Array2<f32>]) -> Result<()>;

    /// Get learning rate
    fn lr(&self) -> f32;

    /// Set learning rate
    fn set_lr(&mut self, lr: f32);
}

/// SGD with momentum that only moves active connections.
///
/// After each update the kernel is multiplied by the mask and the velocity of
/// pruned connections is reset, so a regrown connection starts from rest.
/// With a nonzero `noise_coeff` Gaussian noise of standard deviation
/// `sqrt(2 * lr * noise_coeff)` is added to active weights (DEEP-R's
/// exploration term).
#[derive(Debug)]
pub struct MaskedSgd {
    lr: f32,
    momentum: f32,
    noise_coeff: f32,
    velocities: Vec<Option<Array2<f32>>>,
    rng: StdRng,
}

impl MaskedSgd {
    /// Create a new SGD optimizer
    pub fn new(lr: f32, momentum: f32) -> Self {
        Self {
            lr,
            momentum,
            noise_coeff: 0.0,
            velocities: Vec::new(),
            rng: StdRng::from_os_rng(),
        }
    }

    /// Enable exploration noise
    pub fn with_noise(mut self, noise_coeff: f32) -> Self {
        self.noise_coeff = noise_coeff.max(0.0);
        self
    }

    /// Seed the noise generator
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn momentum(&self) -> f32 {
        self.momentum
    }

    pub fn noise_coeff(&self) -> f32 {
        self.noise_coeff
    }

    fn ensure_velocities(&mut self, n: usize) {
        if self.velocities.len() != n {
            self.velocities = vec![None; n];
        }
    }
}

impl Optimizer for MaskedSgd {
    fn step(&mut self, params: &mut [&mut SparseWeights], grads: &[Array2<f32>]) -> Result<()> {
        if params.len() != grads.len() {
            return Err(RewireError::LayerCountMismatch {
                expected: params.len(),
                found: grads.len(),
            });
        }
        for (param, grad) in params.iter().zip(grads) {
            if param.shape() != grad.dim() {
                return Err(RewireError::ShapeMismatch {
                    kernel: param.shape(),
                    mask: grad.dim(),
                });
            }
        }
        self.ensure_velocities(params.len());

        let noise_std = (2.0 * self.lr * self.noise_coeff).sqrt();

        for (i, (param, grad)) in params.iter_mut().zip(grads).enumerate() {
            let update = if self.momentum > 0.0 {
                // v = momentum * v - lr * grad
                let velocity = match &self.velocities[i] {
                    Some(v) => v * self.momentum - grad * self.lr,
                    None => grad * (-self.lr),
                };
                self.velocities[i] = Some(velocity.clone());
                velocity
            } else {
                grad * (-self.lr)
            };

            let (mut kernel, mask) = param.parts_mut();
            kernel += &update;

            if noise_std > 0.0 {
                for (k, &m) in kernel.iter_mut().zip(mask.iter()) {
                    if m {
                        *k += noise_std * gaussian(&mut self.rng);
                    }
                }
            }

            if let Some(v) = self.velocities[i].as_mut() {
                Zip::from(v).and(&mask).for_each(|v, &m| {
                    if !m {
                        *v = 0.0;
                    }
                });
            }
            param.apply_mask();
        }
        Ok(())
    }

    fn lr(&self) -> f32 {
        self.lr
    }

    fn set_lr(&mut self, lr: f32) {
        self.lr = lr;
    }
}

/// Standard normal sample (Box-Muller transform)
pub(crate) fn gaussian<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    let u1: f32 = rng.random::<f32>().max(1e-10);
    let u2: f32 = rng.random::<f32>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}
