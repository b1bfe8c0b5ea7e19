use crate::error::ConfigError;
use crate::mixer::*;
use crate::mode::Mode;
use burn::prelude::*;

/// An ordered stack of [MixerBlock]s of a single variant.
#[derive(Module, Debug)]
pub struct MixerBlocks<B: Backend> {
    /// # Shape
    /// [n_blocks]
    pub blocks: Vec<MixerBlock<B>>,
}

#[derive(Config, Debug)]
pub struct MixerBlocksConfig {
    pub n_blocks: usize,
    /// Shared by every block; each block still owns its own parameters.
    pub block: MixerBlockConfig,
}

impl MixerBlocksConfig {
    /// Returns the initialized stack.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<MixerBlocks<B>, ConfigError> {
        let mut blocks = Vec::with_capacity(self.n_blocks);
        for _ in 0..self.n_blocks {
            blocks.push(self.block.init(device)?);
        }
        tracing::debug!(
            n_blocks = self.n_blocks,
            variant = %self.block.variant,
            use_se = self.block.use_se,
            "initialized mixer blocks"
        );
        Ok(MixerBlocks { blocks })
    }
}

impl<B: Backend> MixerBlocks<B> {
    /// # Shapes
    ///   - Input [batch, sequence, d_model]
    ///   - Output [batch, sequence, d_model]
    pub fn forward(&self, mut x: Tensor<B, 3>, mode: Mode) -> Tensor<B, 3> {
        for block in self.blocks.iter() {
            x = block.forward(x, mode);
        }
        x
    }
}
