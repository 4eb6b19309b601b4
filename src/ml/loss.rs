// ============================================================
// Layer 5 - Adversarial Losses
// ============================================================
// Binary cross-entropy on raw logits.
//
//   BCE(x, t) = -( t·log σ(x) + (1 - t)·log(1 - σ(x)) )
//             = -( t·logσ(x) + (1 - t)·logσ(-x) )
//
// Written with log-sigmoid instead of sigmoid + log so that large
// logits never produce log(0). This matters twice over in half
// precision, where σ(x) rounds to exactly 1.0 for x > ~8.
//
// Targets are plain floats so one-sided label smoothing
// (real label 0.9 instead of 1.0) is just a different constant.

use burn::{prelude::*, tensor::activation::log_sigmoid};

/// Mean BCE of `logits` against a constant target.
pub fn bce_with_logits<B: Backend>(logits: Tensor<B, 2>, target: f64) -> Tensor<B, 1> {
    let pos = log_sigmoid(logits.clone()).mul_scalar(target);
    let neg = log_sigmoid(logits.neg()).mul_scalar(1.0 - target);
    (pos + neg).neg().mean()
}

/// D wants real → `real_label`, fake → 0
pub fn discriminator_loss<B: Backend>(
    real_logits: Tensor<B, 2>,
    fake_logits: Tensor<B, 2>,
    real_label:  f64,
) -> Tensor<B, 1> {
    bce_with_logits(real_logits, real_label) + bce_with_logits(fake_logits, 0.0)
}

/// G wants D to call its fakes real
pub fn generator_loss<B: Backend>(fake_logits: Tensor<B, 2>) -> Tensor<B, 1> {
    bce_with_logits(fake_logits, 1.0)
}

/// Mean of σ(logits): the discriminator's average "realness" score
pub fn mean_probability<B: Backend>(logits: Tensor<B, 2>) -> f32 {
    burn::tensor::activation::sigmoid(logits)
        .mean()
        .into_scalar()
        .elem::<f32>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn logits(values: &[f32]) -> Tensor<TestBackend, 2> {
        let device = Default::default();
        Tensor::<TestBackend, 1>::from_floats(values, &device).reshape([values.len(), 1])
    }

    fn scalar(t: Tensor<TestBackend, 1>) -> f32 {
        t.into_scalar().elem::<f32>()
    }

    #[test]
    fn test_zero_logit_costs_ln2() {
        let l = scalar(bce_with_logits(logits(&[0.0, 0.0]), 1.0));
        assert!((l - std::f32::consts::LN_2).abs() < 1e-5);
    }

    #[test]
    fn test_confident_correct_prediction_is_cheap() {
        let right = scalar(bce_with_logits(logits(&[10.0]), 1.0));
        let wrong = scalar(bce_with_logits(logits(&[-10.0]), 1.0));
        assert!(right < 1e-3);
        assert!((wrong - 10.0).abs() < 1e-2);
    }

    #[test]
    fn test_large_logits_stay_finite() {
        let l = scalar(bce_with_logits(logits(&[200.0, -200.0]), 0.5));
        assert!(l.is_finite());
    }

    #[test]
    fn test_discriminator_loss_sums_both_terms() {
        let d = scalar(discriminator_loss(logits(&[0.0]), logits(&[0.0]), 1.0));
        assert!((d - 2.0 * std::f32::consts::LN_2).abs() < 1e-5);
    }

    #[test]
    fn test_mean_probability() {
        let p = mean_probability(logits(&[0.0, 0.0, 0.0]));
        assert!((p - 0.5).abs() < 1e-6);
    }
}
