mod block;
mod blocks;
mod mlp_block;
mod network;
mod squeeze_excitation;

pub use block::{ChannelMixing, MixerBlock, MixerBlockConfig, MixerVariant, TokenMixing};
pub use blocks::{MixerBlocks, MixerBlocksConfig};
pub use mlp_block::{MlpBlock, MlpBlockConfig, Regularizer};
pub use network::{MlpMixer, MlpMixerConfig};
pub use squeeze_excitation::{SePooling, SqueezeExcitation, SqueezeExcitationConfig};
