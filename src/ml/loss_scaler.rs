// ============================================================
// Layer 5 - Mixed Precision: Dynamic Loss Scaling
// ============================================================
// In half precision, small gradients underflow to zero. The fix
// is to multiply the loss by a large factor before backprop,
// which scales every gradient by the same factor, then divide it
// back out before the optimiser sees it.
//
// The factor is tuned on the fly:
//   - any inf/NaN gradient after unscaling → skip this step,
//     halve the scale
//   - `growth_interval` clean steps in a row → double the scale
//
// Constants follow the usual defaults: start at 2^16, grow ×2
// every 2000 clean steps, back off ×0.5 on overflow.
//
// With full precision the scaler is disabled: scale stays 1 and
// steps are never skipped.

use std::marker::PhantomData;

use burn::{
    module::{AutodiffModule, ModuleVisitor, ParamId},
    optim::{GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Arithmetic precision of the training backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    /// f32 everywhere
    Full,
    /// f16 tensors with dynamic loss scaling
    Half,
}

impl Precision {
    pub fn uses_loss_scaling(self) -> bool {
        matches!(self, Precision::Half)
    }
}

// Above f16::MAX, so on the half backend the first scaled loss is inf:
// expect one skipped step per network before the scale settles.
pub const DEFAULT_INIT_SCALE:      f64   = 65536.0;
pub const DEFAULT_GROWTH_FACTOR:   f64   = 2.0;
pub const DEFAULT_BACKOFF_FACTOR:  f64   = 0.5;
pub const DEFAULT_GROWTH_INTERVAL: usize = 2000;

#[derive(Debug, Clone)]
pub struct LossScaler {
    enabled:         bool,
    scale:           f64,
    growth_factor:   f64,
    backoff_factor:  f64,
    growth_interval: usize,
    clean_steps:     usize,
    skipped:         usize,
}

impl LossScaler {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            scale:           if enabled { DEFAULT_INIT_SCALE } else { 1.0 },
            growth_factor:   DEFAULT_GROWTH_FACTOR,
            backoff_factor:  DEFAULT_BACKOFF_FACTOR,
            growth_interval: DEFAULT_GROWTH_INTERVAL,
            clean_steps:     0,
            skipped:         0,
        }
    }

    pub fn for_precision(precision: Precision) -> Self {
        Self::new(precision.uses_loss_scaling())
    }

    pub fn with_init_scale(mut self, scale: f64) -> Self {
        if self.enabled {
            self.scale = scale;
        }
        self
    }

    pub fn with_growth_interval(mut self, interval: usize) -> Self {
        self.growth_interval = interval.max(1);
        self
    }

    pub fn scale(&self) -> f64 { self.scale }

    /// Total optimiser steps skipped because of overflow
    pub fn skipped_steps(&self) -> usize { self.skipped }

    /// Record the outcome of one step and adapt the scale.
    /// Returns true when the optimiser step should be applied.
    pub fn update(&mut self, found_non_finite: bool) -> bool {
        if !self.enabled {
            return true;
        }
        if found_non_finite {
            self.scale *= self.backoff_factor;
            self.clean_steps = 0;
            self.skipped += 1;
            tracing::debug!("Gradient overflow, loss scale lowered to {}", self.scale);
            return false;
        }
        self.clean_steps += 1;
        if self.clean_steps >= self.growth_interval {
            self.scale *= self.growth_factor;
            self.clean_steps = 0;
        }
        true
    }

    /// Backprop `loss` into `module` and apply one optimiser step,
    /// scaling and unscaling gradients when enabled.
    ///
    /// Only `module`'s own parameters are updated; gradients the loss
    /// produced for any other module are dropped. Returns the (possibly
    /// unchanged) module and whether the step was applied.
    pub fn step<B, M, O>(
        &mut self,
        optim:  &mut O,
        lr:     f64,
        module: M,
        loss:   Tensor<B, 1>,
    ) -> (M, bool)
    where
        B: AutodiffBackend,
        M: AutodiffModule<B>,
        O: Optimizer<M, B>,
    {
        if !self.enabled {
            let grads = GradientsParams::from_grads(loss.backward(), &module);
            return (optim.step(lr, module, grads), true);
        }

        let grads = loss.mul_scalar(self.scale).backward();
        let mut grads = GradientsParams::from_grads(grads, &module);

        let mut unscaler = GradUnscaler::<B> {
            grads:      &mut grads,
            inv_scale:  1.0 / self.scale,
            non_finite: false,
            _backend:   PhantomData,
        };
        module.visit(&mut unscaler);
        let non_finite = unscaler.non_finite;

        if self.update(non_finite) {
            (optim.step(lr, module, grads), true)
        } else {
            (module, false)
        }
    }
}

/// Walks every float parameter, divides its gradient by the loss
/// scale and notes whether any gradient is inf or NaN.
struct GradUnscaler<'a, B: AutodiffBackend> {
    grads:      &'a mut GradientsParams,
    inv_scale:  f64,
    non_finite: bool,
    _backend:   PhantomData<B>,
}

impl<B: AutodiffBackend> ModuleVisitor<B> for GradUnscaler<'_, B> {
    fn visit_float<const D: usize>(&mut self, id: ParamId, _tensor: &Tensor<B, D>) {
        let Some(grad) = self.grads.remove::<B::InnerBackend, D>(id) else {
            return;
        };
        let grad = grad.mul_scalar(self.inv_scale);
        if has_non_finite(&grad) {
            self.non_finite = true;
        }
        self.grads.register::<B::InnerBackend, D>(id, grad);
    }
}

/// True when any element is NaN or ±inf. Uses the largest magnitude
/// rather than a sum, which overflows f16 on many finite values.
fn has_non_finite<B: Backend, const D: usize>(tensor: &Tensor<B, D>) -> bool {
    if tensor.clone().is_nan().any().into_scalar() {
        return true;
    }
    let peak = tensor.clone().abs().max().into_scalar().elem::<f32>();
    !peak.is_finite()
}
