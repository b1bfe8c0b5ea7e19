use serde::{Deserialize, Serialize};

/// Whether a forward pass is part of training.
///
/// Dropout and batch normalization read this instead of any backend-wide flag.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// Dropout is active, batch normalization uses (and records) batch statistics.
    Train,
    /// Dropout is the identity, batch normalization uses the running statistics.
    #[default]
    Inference,
}

impl Mode {
    pub fn is_train(&self) -> bool {
        matches!(self, Mode::Train)
    }
}
