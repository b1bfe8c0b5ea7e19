pub mod error;
pub mod mixer;
pub mod mode;

pub mod prelude {
    pub use crate::error::ConfigError;
    pub use crate::mixer::*;
    pub use crate::mode::Mode;
    pub use crate::utils::activation::Activation;
}

pub mod utils;
