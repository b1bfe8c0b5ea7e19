use crate::error::ConfigError;
use crate::utils::uniform_init;
use burn::nn::{Initializer, Linear, LinearConfig};
use burn::constant;
use burn::prelude::*;
use core::fmt;
use core::str::FromStr;

/// How the feature axis is squeezed into one value per time step.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SePooling {
    #[default]
    Avg,
    Max,
}

impl FromStr for SePooling {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "avg" => Ok(SePooling::Avg),
            "max" => Ok(SePooling::Max),
            other => Err(ConfigError::UnknownPooling(other.to_string())),
        }
    }
}

constant!(SePooling);

impl fmt::Display for SePooling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SePooling::Avg => f.write_str("avg"),
            SePooling::Max => f.write_str("max"),
        }
    }
}

/// Squeeze-and-excitation gate over the time axis, as described in the paper [Squeeze-and-Excitation Networks](https://arxiv.org/abs/1709.01507).
///
/// Each time step is squeezed into a scalar, the `[batch, seq_len]` summary goes through
/// a `seq_len -> seq_len / r -> seq_len` bottleneck ending in a sigmoid, and the result
/// rescales every feature of the matching time step.
#[derive(Module, Debug)]
pub struct SqueezeExcitation<B: Backend> {
    /// Input channel: seq_len.
    /// Output channel: seq_len / reduction_ratio.
    pub fc1: Linear<B>,

    /// Input channel: seq_len / reduction_ratio.
    /// Output channel: seq_len.
    pub fc2: Linear<B>,

    pub pooling: SePooling,
}

#[derive(Config, Debug)]
pub struct SqueezeExcitationConfig {
    /// Length of the gated (time) axis.
    pub seq_len: usize,

    /// Bottleneck reduction `r`, the hidden size being `seq_len / r`.
    #[config(default = 4)]
    pub reduction_ratio: usize,

    #[config(default = "SePooling::Avg")]
    pub pooling: SePooling,

    /// Overwrites the default PyTorch-style initializer.
    #[config(default = "None")]
    pub initializer: Option<Initializer>,
}

impl SqueezeExcitationConfig {
    /// Size of the excitation bottleneck.
    pub fn bottleneck(&self) -> Result<usize, ConfigError> {
        let hidden = self.seq_len.checked_div(self.reduction_ratio).unwrap_or(0);
        if hidden == 0 {
            return Err(ConfigError::DegenerateBottleneck {
                seq_len: self.seq_len,
                ratio: self.reduction_ratio,
            });
        }
        Ok(hidden)
    }

    /// Returns the initialized gate.
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> Result<SqueezeExcitation<B>, ConfigError> {
        let hidden = self.bottleneck()?;

        Ok(SqueezeExcitation {
            fc1: LinearConfig::new(self.seq_len, hidden)
                .with_bias(false)
                .with_initializer(uniform_init(self.seq_len, self.initializer.as_ref()))
                .init(device),
            fc2: LinearConfig::new(hidden, self.seq_len)
                .with_bias(false)
                .with_initializer(uniform_init(hidden, self.initializer.as_ref()))
                .init(device),
            pooling: self.pooling,
        })
    }
}

impl<B: Backend> SqueezeExcitation<B> {
    /// # Shapes
    ///   - Input [batch, sequence, d_model]
    ///   - Output [batch, sequence, d_model]
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let [batch, sequence, d_model] = x.dims();

        // squeeze
        let y = match self.pooling {
            SePooling::Avg => x.clone().mean_dim(2),
            SePooling::Max => x.clone().max_dim(2),
        };
        debug_assert_eq!([batch, sequence, 1], y.dims());
        let y = y.reshape([batch, sequence]);

        let gate = self.excitation(y);
        debug_assert_eq!([batch, sequence], gate.dims());

        let gate = gate.unsqueeze_dim::<3>(2).expand([batch, sequence, d_model]);
        x * gate
    }

    /// Maps the squeezed summary into gate values within `(0, 1)`.
    ///
    /// # Shapes
    ///   - Input [batch, sequence]
    ///   - Output [batch, sequence]
    pub fn excitation(&self, y: Tensor<B, 2>) -> Tensor<B, 2> {
        let y = self.fc1.forward(y);
        let y = burn::tensor::activation::relu(y);
        let y = self.fc2.forward(y);
        burn::tensor::activation::sigmoid(y)
    }
}
