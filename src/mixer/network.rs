//! Embeds a padded sequence, runs it through [MixerBlocks] and classifies the masked mean
//! of the resulting time steps.
//!
//! References:
//! - https://arxiv.org/abs/2105.01601 (MLP-Mixer)
//! - https://arxiv.org/abs/1709.01507 (Squeeze-and-Excitation)

use crate::error::ConfigError;
use crate::mixer::*;
use crate::mode::Mode;
use crate::utils::activation::Activation;
use crate::utils::layer_norm::{LayerNorm, LayerNormConfig};
use crate::utils::masked_mean::{count_empty_rows, masked_mean};
use crate::utils::uniform_init;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::{Initializer, Linear, LinearConfig};
use burn::prelude::*;

#[derive(Module, Debug)]
pub struct MlpMixer<B: Backend> {
    /// Per-timestep embedding, a `[1, input_size]` kernel over the `[sequence, input_size]` grid.
    ///
    /// Input channel: 1.
    /// Output channel: hidden_dim.
    pub embedding: Conv2d<B>,
    pub blocks: MixerBlocks<B>,
    pub norm: LayerNorm<B>,
    /// Input channel: hidden_dim.
    /// Output channel: num_classes.
    pub fc_out: Linear<B>,
}

#[derive(Config, Debug)]
pub struct MlpMixerConfig {
    pub num_classes: usize,
    pub num_blocks: usize,

    /// Embedding size, i.e. the number of channels mixed by the blocks.
    pub hidden_dim: usize,

    pub tokens_mlp_dim: usize,
    pub channels_mlp_dim: usize,

    /// Number of time steps of every (padded) input sequence.
    pub seq_len: usize,

    /// One of `gelu`, `mish`.
    #[config(default = "String::from(\"gelu\")")]
    pub activation: String,

    /// One of `normal`, `temporal`, `spatial`.
    #[config(default = "String::from(\"normal\")")]
    pub mlp_block_type: String,

    /// `> 0` for dropout, `-1` for batch normalization, anything else for none.
    #[config(default = 0.0)]
    pub regularization: f64,

    /// Number of features of each time step.
    #[config(default = 51)]
    pub input_size: usize,

    #[config(default = 4)]
    pub se_reduction_ratio: usize,

    /// One of `avg`, `max`.
    #[config(default = "String::from(\"avg\")")]
    pub se_pooling: String,

    #[config(default = false)]
    pub use_se: bool,

    /// Overwrites the default PyTorch-style initializer of every linear and convolution layer.
    #[config(default = "None")]
    pub initializer: Option<Initializer>,
}

impl MlpMixerConfig {
    /// Resolves the named options into the configuration shared by every block.
    pub fn block_config(&self) -> Result<MixerBlockConfig, ConfigError> {
        let variant: MixerVariant = self.mlp_block_type.parse()?;
        let activation: Activation = self.activation.parse()?;
        let se_pooling: SePooling = self.se_pooling.parse()?;

        Ok(MixerBlockConfig::new(
            self.tokens_mlp_dim,
            self.channels_mlp_dim,
            self.seq_len,
            self.hidden_dim,
        )
        .with_variant(variant)
        .with_activation(activation)
        .with_regularization(self.regularization)
        .with_se_reduction_ratio(self.se_reduction_ratio)
        .with_se_pooling(se_pooling)
        .with_use_se(self.use_se)
        .with_initializer(self.initializer.clone()))
    }

    /// Returns the initialized model.
    ///
    /// Every named option is validated here, so a model that was built never fails
    /// because of its configuration.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<MlpMixer<B>, ConfigError> {
        let block = self.block_config()?;
        let blocks = MixerBlocksConfig::new(self.num_blocks, block).init(device)?;

        let model = MlpMixer {
            embedding: Conv2dConfig::new([1, self.hidden_dim], [1, self.input_size])
                // fan_in = in_channels * kernel_height * kernel_width
                .with_initializer(uniform_init(self.input_size, self.initializer.as_ref()))
                .init(device),
            blocks,
            norm: LayerNormConfig::new(self.hidden_dim).init(device),
            fc_out: LinearConfig::new(self.hidden_dim, self.num_classes)
                .with_initializer(uniform_init(self.hidden_dim, self.initializer.as_ref()))
                .init(device),
        };
        tracing::debug!(
            num_classes = self.num_classes,
            num_blocks = self.num_blocks,
            hidden_dim = self.hidden_dim,
            seq_len = self.seq_len,
            input_size = self.input_size,
            mlp_block_type = %self.mlp_block_type,
            "initialized mlp-mixer"
        );

        Ok(model)
    }
}

impl<B: Backend> MlpMixer<B> {
    /// Returns unnormalized class logits.
    ///
    /// `padded` flags valid time steps with 1 and padding with 0. Its values are used as
    /// weights as-is.
    ///
    /// # Shapes
    ///   - Input x [batch, sequence, input_size]
    ///   - Input padded [batch, sequence]
    ///   - Output [batch, num_classes]
    pub fn forward(&self, x: Tensor<B, 3>, padded: Tensor<B, 2>, mode: Mode) -> Tensor<B, 2> {
        let [batch, sequence, input_size] = x.dims();
        let [d_model, _, _, _] = self.embedding.weight.dims();
        let [_d_model, num_classes] = self.fc_out.weight.dims();

        // embedding
        let x = x.unsqueeze_dim::<4>(1);
        debug_assert_eq!([batch, 1, sequence, input_size], x.dims());
        let x = self.embedding.forward(x);
        debug_assert_eq!([batch, d_model, sequence, 1], x.dims());
        let x = x.reshape([batch, d_model, sequence]).swap_dims(1, 2);
        debug_assert_eq!([batch, sequence, d_model], x.dims());

        let x = self.blocks.forward(x, mode);
        let x = self.norm.forward(x);

        if let Some(empty) = Self::empty_rows(&padded).filter(|empty| *empty > 0) {
            tracing::warn!(empty, batch, "fully padded rows pool to a zero vector");
        }
        let x = masked_mean(x, padded);
        debug_assert_eq!([batch, d_model], x.dims());

        let x = self.fc_out.forward(x);
        debug_assert_eq!([batch, num_classes], x.dims());

        x
    }

    /// Number of fully padded rows, when they would be reported.
    ///
    /// Counting reads the mask back from the device, so it only happens in debug
    /// builds with WARN enabled.
    fn empty_rows(padded: &Tensor<B, 2>) -> Option<usize> {
        if cfg!(debug_assertions) && tracing::enabled!(tracing::Level::WARN) {
            Some(count_empty_rows(padded.clone()))
        } else {
            None
        }
    }
}
