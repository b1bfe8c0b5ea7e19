use crate::error::ConfigError;
use crate::mode::Mode;
use crate::utils::activation::Activation;
use crate::utils::batch_norm::{BatchNorm, BatchNormConfig};
use crate::utils::dropout::{Dropout, DropoutConfig};
use crate::utils::uniform_init;
use burn::nn::{Initializer, Linear, LinearConfig};
use burn::prelude::*;

/// Regularization applied after each linear stage of a [MlpBlock].
///
/// Built once from the numeric `regularization` value, so the forward path never
/// branches on configuration.
#[derive(Module, Debug)]
pub struct Regularizer<B: Backend> {
    pub dropout: Option<Dropout>,
    pub batch_norm: Option<BatchNorm<B>>,
}

impl<B: Backend> Regularizer<B> {
    /// Selects the strategy from the numeric `regularization` value:
    /// - `> 0`: dropout with that probability;
    /// - `== -1`: batch normalization over axis 1, of size `bn_dim`;
    /// - otherwise: identity.
    pub fn new(
        regularization: f64,
        bn_dim: usize,
        device: &B::Device,
    ) -> Result<Self, ConfigError> {
        let mut reg = Regularizer {
            dropout: None,
            batch_norm: None,
        };
        if regularization > 0.0 {
            reg.dropout = Some(DropoutConfig::new(regularization).init()?);
        } else if regularization == -1.0 {
            reg.batch_norm = Some(BatchNormConfig::new(bn_dim).init(device));
        }
        Ok(reg)
    }

    /// # Shapes
    ///   - Input [batch, bn_dim, any]
    ///   - Output [batch, bn_dim, any]
    pub fn forward(&self, x: Tensor<B, 3>, mode: Mode) -> Tensor<B, 3> {
        if let Some(dropout) = &self.dropout {
            dropout.forward(x, mode)
        } else if let Some(batch_norm) = &self.batch_norm {
            batch_norm.forward(x, mode)
        } else {
            x
        }
    }
}

/// Two-layer feed-forward transform over the last axis.
///
/// `fc1 -> activation -> reg1 -> fc2 -> reg2`
#[derive(Module, Debug)]
pub struct MlpBlock<B: Backend> {
    /// Input channel: mlp_input_dim.
    /// Output channel: mlp_hidden_dim.
    pub fc1: Linear<B>,

    /// Input channel: mlp_hidden_dim.
    /// Output channel: mlp_input_dim.
    pub fc2: Linear<B>,

    pub activation: Activation,
    pub reg1: Regularizer<B>,
    pub reg2: Regularizer<B>,
}

#[derive(Config, Debug)]
pub struct MlpBlockConfig {
    pub mlp_hidden_dim: usize,

    /// Size of the mixed (last) axis.
    pub mlp_input_dim: usize,

    /// Size of axis 1, normalized when batch normalization is selected.
    pub mlp_bn_dim: usize,

    #[config(default = "Activation::Gelu")]
    pub activation: Activation,

    /// `> 0` for dropout, `-1` for batch normalization, anything else for none.
    #[config(default = 0.0)]
    pub regularization: f64,

    /// Overwrites the default PyTorch-style initializer.
    #[config(default = "None")]
    pub initializer: Option<Initializer>,
}

impl MlpBlockConfig {
    /// Returns the initialized block.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<MlpBlock<B>, ConfigError> {
        Ok(MlpBlock {
            fc1: LinearConfig::new(self.mlp_input_dim, self.mlp_hidden_dim)
                .with_initializer(uniform_init(self.mlp_input_dim, self.initializer.as_ref()))
                .init(device),
            fc2: LinearConfig::new(self.mlp_hidden_dim, self.mlp_input_dim)
                .with_initializer(uniform_init(self.mlp_hidden_dim, self.initializer.as_ref()))
                .init(device),
            activation: self.activation,
            reg1: Regularizer::new(self.regularization, self.mlp_bn_dim, device)?,
            reg2: Regularizer::new(self.regularization, self.mlp_bn_dim, device)?,
        })
    }
}

impl<B: Backend> MlpBlock<B> {
    /// # Shapes
    ///   - Input [batch, mlp_bn_dim, mlp_input_dim]
    ///   - Output [batch, mlp_bn_dim, mlp_input_dim]
    pub fn forward(&self, x: Tensor<B, 3>, mode: Mode) -> Tensor<B, 3> {
        let [batch, bn_dim, input_dim] = x.dims();
        let [_input_dim, hidden_dim] = self.fc1.weight.dims();

        let x = self.fc1.forward(x);
        debug_assert_eq!([batch, bn_dim, hidden_dim], x.dims());
        let x = self.activation.forward(x);
        let x = self.reg1.forward(x, mode);

        let x = self.fc2.forward(x);
        debug_assert_eq!([batch, bn_dim, input_dim], x.dims());
        self.reg2.forward(x, mode)
    }
}
