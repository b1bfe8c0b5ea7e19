use crate::error::ConfigError;
use crate::mixer::*;
use crate::mode::Mode;
use crate::utils::activation::Activation;
use crate::utils::layer_norm::{LayerNorm, LayerNormConfig};
use burn::nn::Initializer;
use burn::constant;
use burn::prelude::*;
use core::fmt;
use core::str::FromStr;

/// Which sub-steps a [MixerBlock] is made of.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MixerVariant {
    /// Token mixing followed by channel mixing.
    #[default]
    Normal,
    /// Channel mixing only.
    Temporal,
    /// Token mixing only.
    Spatial,
}

impl MixerVariant {
    pub fn has_token_mixing(&self) -> bool {
        matches!(self, MixerVariant::Normal | MixerVariant::Spatial)
    }

    pub fn has_channel_mixing(&self) -> bool {
        matches!(self, MixerVariant::Normal | MixerVariant::Temporal)
    }
}

impl FromStr for MixerVariant {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(MixerVariant::Normal),
            "temporal" => Ok(MixerVariant::Temporal),
            "spatial" => Ok(MixerVariant::Spatial),
            other => Err(ConfigError::UnknownVariant(other.to_string())),
        }
    }
}

constant!(MixerVariant);

impl fmt::Display for MixerVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MixerVariant::Normal => f.write_str("normal"),
            MixerVariant::Temporal => f.write_str("temporal"),
            MixerVariant::Spatial => f.write_str("spatial"),
        }
    }
}

/// Mixes information across time steps, independently for each channel.
#[derive(Module, Debug)]
pub struct TokenMixing<B: Backend> {
    pub norm: LayerNorm<B>,
    /// Runs over the time axis: `seq_len -> tokens_mlp_dim -> seq_len`.
    pub mlp: MlpBlock<B>,
}

impl<B: Backend> TokenMixing<B> {
    /// # Shapes
    ///   - Input [batch, sequence, d_model]
    ///   - Output [batch, sequence, d_model]
    pub fn forward(
        &self,
        x: Tensor<B, 3>,
        se: Option<&SqueezeExcitation<B>>,
        mode: Mode,
    ) -> Tensor<B, 3> {
        let [batch, sequence, d_model] = x.dims();

        let res = x.clone();
        let y = self.norm.forward(x);

        let y = y.swap_dims(1, 2);
        debug_assert_eq!([batch, d_model, sequence], y.dims());
        let y = self.mlp.forward(y, mode);
        let y = y.swap_dims(1, 2);
        debug_assert_eq!([batch, sequence, d_model], y.dims());

        let y = match se {
            Some(se) => se.forward(y),
            None => y,
        };

        res + y
    }
}

/// Mixes features within each time step.
#[derive(Module, Debug)]
pub struct ChannelMixing<B: Backend> {
    pub norm: LayerNorm<B>,
    /// Runs over the channel axis: `hidden_dim -> channels_mlp_dim -> hidden_dim`.
    pub mlp: MlpBlock<B>,
}

impl<B: Backend> ChannelMixing<B> {
    /// # Shapes
    ///   - Input [batch, sequence, d_model]
    ///   - Output [batch, sequence, d_model]
    pub fn forward(
        &self,
        x: Tensor<B, 3>,
        se: Option<&SqueezeExcitation<B>>,
        mode: Mode,
    ) -> Tensor<B, 3> {
        let [batch, sequence, d_model] = x.dims();

        let res = x.clone();
        let y = self.norm.forward(x);
        let y = self.mlp.forward(y, mode);
        debug_assert_eq!([batch, sequence, d_model], y.dims());

        let y = match se {
            Some(se) => se.forward(y),
            None => y,
        };

        res + y
    }
}

/// A pre-norm residual mixer block.
///
/// The sub-steps present depend on the [MixerVariant]. When enabled, a single
/// squeeze-excitation gate is shared by both sub-steps of the block.
#[derive(Module, Debug)]
pub struct MixerBlock<B: Backend> {
    pub variant: MixerVariant,
    pub token_mixing: Option<TokenMixing<B>>,
    pub channel_mixing: Option<ChannelMixing<B>>,
    pub se: Option<SqueezeExcitation<B>>,
}

#[derive(Config, Debug)]
pub struct MixerBlockConfig {
    /// Hidden size of the token-mixing mlp.
    pub tokens_mlp_dim: usize,

    /// Hidden size of the channel-mixing mlp.
    pub channels_mlp_dim: usize,

    /// Number of time steps.
    pub seq_len: usize,

    /// Number of channels, i.e. the embedding size.
    pub hidden_dim: usize,

    #[config(default = "MixerVariant::Normal")]
    pub variant: MixerVariant,

    #[config(default = "Activation::Gelu")]
    pub activation: Activation,

    /// `> 0` for dropout, `-1` for batch normalization, anything else for none.
    #[config(default = 0.0)]
    pub regularization: f64,

    #[config(default = 4)]
    pub se_reduction_ratio: usize,

    #[config(default = "SePooling::Avg")]
    pub se_pooling: SePooling,

    #[config(default = true)]
    pub use_se: bool,

    /// Overwrites the default PyTorch-style initializer.
    #[config(default = "None")]
    pub initializer: Option<Initializer>,
}

impl MixerBlockConfig {
    /// Returns the initialized block.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<MixerBlock<B>, ConfigError> {
        let token_mixing = if self.variant.has_token_mixing() {
            let mlp = MlpBlockConfig::new(self.tokens_mlp_dim, self.seq_len, self.hidden_dim)
                .with_activation(self.activation)
                .with_regularization(self.regularization)
                .with_initializer(self.initializer.clone())
                .init(device)?;
            Some(TokenMixing {
                norm: LayerNormConfig::new(self.hidden_dim).init(device),
                mlp,
            })
        } else {
            None
        };

        let channel_mixing = if self.variant.has_channel_mixing() {
            let mlp = MlpBlockConfig::new(self.channels_mlp_dim, self.hidden_dim, self.seq_len)
                .with_activation(self.activation)
                .with_regularization(self.regularization)
                .with_initializer(self.initializer.clone())
                .init(device)?;
            Some(ChannelMixing {
                norm: LayerNormConfig::new(self.hidden_dim).init(device),
                mlp,
            })
        } else {
            None
        };

        let se = if self.use_se {
            let se = SqueezeExcitationConfig::new(self.seq_len)
                .with_reduction_ratio(self.se_reduction_ratio)
                .with_pooling(self.se_pooling)
                .with_initializer(self.initializer.clone())
                .init(device)?;
            Some(se)
        } else {
            None
        };

        Ok(MixerBlock {
            variant: self.variant,
            token_mixing,
            channel_mixing,
            se,
        })
    }
}

impl<B: Backend> MixerBlock<B> {
    /// # Shapes
    ///   - Input [batch, sequence, d_model]
    ///   - Output [batch, sequence, d_model]
    pub fn forward(&self, x: Tensor<B, 3>, mode: Mode) -> Tensor<B, 3> {
        let dims = x.dims();
        let se = self.se.as_ref();

        let x = match &self.token_mixing {
            Some(token_mixing) => token_mixing.forward(x, se, mode),
            None => x,
        };
        let x = match &self.channel_mixing {
            Some(channel_mixing) => channel_mixing.forward(x, se, mode),
            None => x,
        };
        debug_assert_eq!(dims, x.dims());

        x
    }
}
