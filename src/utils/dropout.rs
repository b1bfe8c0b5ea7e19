use crate::error::ConfigError;
use crate::mode::Mode;
use burn::prelude::*;
use burn::tensor::Distribution;

/// Configuration to create a [Dropout](Dropout) layer.
#[derive(Config, Debug)]
pub struct DropoutConfig {
    /// The probability of zeroing an element.
    pub prob: f64,
}

impl DropoutConfig {
    /// Initialize a new [Dropout](Dropout) module.
    ///
    /// Fails if the probability is outside of `[0, 1]`.
    pub fn init(&self) -> Result<Dropout, ConfigError> {
        if !(0.0..=1.0).contains(&self.prob) {
            return Err(ConfigError::InvalidDropout(self.prob));
        }
        Ok(Dropout { prob: self.prob })
    }
}

/// Randomly zeroes elements with probability `prob` during training, scaling the
/// survivors by `1 / (1 - prob)`.
///
/// Unlike `burn::nn::Dropout`, whether it is active is decided by the given [Mode]
/// rather than by the backend having autodiff enabled.
#[derive(Module, Clone, Debug)]
pub struct Dropout {
    pub prob: f64,
}

impl Dropout {
    /// Applies the forward pass on the input tensor.
    ///
    /// # Shapes
    ///
    /// - input: `[..., any]`
    /// - output: `[..., any]`
    pub fn forward<B: Backend, const D: usize>(&self, x: Tensor<B, D>, mode: Mode) -> Tensor<B, D> {
        if !mode.is_train() || self.prob == 0.0 {
            return x;
        }
        if self.prob >= 1.0 {
            return x.zeros_like();
        }

        let keep = 1.0 - self.prob;
        let mask = Tensor::<B, D>::random(x.shape(), Distribution::Bernoulli(keep), &x.device());
        x * mask / keep
    }
}
