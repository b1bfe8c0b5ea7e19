use burn::nn::Initializer;

pub mod activation;
pub mod batch_norm;
pub mod dropout;
pub mod layer_norm;
pub mod masked_mean;

/// PyTorch's default initializer for linear and convolution layers,
/// `U(-1/sqrt(fan_in), 1/sqrt(fan_in))`.
///
/// `overwrite` takes precedence when set.
pub fn uniform_init(fan_in: usize, overwrite: Option<&Initializer>) -> Initializer {
    if let Some(initializer) = overwrite {
        return initializer.clone();
    }
    let bound = 1.0 / (fan_in as f64).sqrt();
    Initializer::Uniform {
        min: -bound,
        max: bound,
    }
}
