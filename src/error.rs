/// Errors raised while building a model from its configuration.
///
/// Forward passes never return these; shape mismatches surface from the backend.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("unknown activation function type: {0}")]
    UnknownActivation(String),

    #[error("unknown mlp-block type: {0}")]
    UnknownVariant(String),

    #[error("unknown squeeze-excitation pooling: {0}")]
    UnknownPooling(String),

    /// `seq_len / ratio` leaves no room for the excitation bottleneck.
    #[error("reduction ratio {ratio} leaves an empty bottleneck for seq_len {seq_len}")]
    DegenerateBottleneck { seq_len: usize, ratio: usize },

    #[error("dropout probability must be within [0, 1], got {0}")]
    InvalidDropout(f64),
}
