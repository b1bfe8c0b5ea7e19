use crate::error::ConfigError;
use burn::constant;
use burn::prelude::*;
use burn::tensor::{DType, Element};
use core::fmt;
use core::str::FromStr;

/// Elementwise nonlinearity used inside the mlp blocks.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    /// `x * Φ(x)`, with the exact (erf based) gaussian cdf.
    #[default]
    Gelu,
    /// `x * tanh(softplus(x))`.
    Mish,
}

impl Activation {
    /// Applies the forward pass on the input tensor.
    ///
    /// # Shapes
    ///
    /// - input: `[..., any]`
    /// - output: `[..., any]`
    pub fn forward<B: Backend, const D: usize>(&self, x: Tensor<B, D>) -> Tensor<B, D> {
        match self {
            Activation::Gelu => burn::tensor::activation::gelu(x),
            Activation::Mish => mish(x),
        }
    }
}

impl FromStr for Activation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gelu" => Ok(Activation::Gelu),
            "mish" => Ok(Activation::Mish),
            other => Err(ConfigError::UnknownActivation(other.to_string())),
        }
    }
}

constant!(Activation);

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Activation::Gelu => f.write_str("gelu"),
            Activation::Mish => f.write_str("mish"),
        }
    }
}

/// Applies the Mish function element-wise.
///
/// `mish(x) = x * tanh(softplus(x))`
pub fn mish<const D: usize, B: Backend>(x: Tensor<B, D>) -> Tensor<B, D> {
    x.clone() * softplus(x).tanh()
}

/// Applies the SoftPlus function element-wise, `log(1 + e^x)`.
pub fn softplus<const D: usize, B: Backend>(x: Tensor<B, D>) -> Tensor<B, D> {
    match <B::FloatElem as Element>::dtype() {
        DType::F16 => {
            // e^x overflows early in half precision
            // softplus = max(x, 0) + log(e^-|x| + 1)
            //          = (x + |x|) / 2 + log(e^-|x| + 1)
            let xabs = x.clone().abs();
            (x + xabs.clone()) / 2. + xabs.neg().exp().log1p()
        }
        _ => x.exp().log1p(),
    }
}
