use crate::mode::Mode;
use burn::module::{Content, DisplaySettings, ModuleDisplay, Param, RunningState};
use burn::nn::Initializer;
use burn::prelude::*;

/// Configuration to create a [BatchNorm](BatchNorm) layer.
#[derive(Config, Debug)]
pub struct BatchNormConfig {
    /// The size of axis 1 (the normalized axis).
    pub num_features: usize,
    /// A value required for numerical stability. Default: 1e-5
    #[config(default = 1e-5)]
    pub epsilon: f64,
    /// Weight of the newest batch statistics in the running statistics. Default: 0.1
    #[config(default = 0.1)]
    pub momentum: f64,
}

impl BatchNormConfig {
    /// Initialize a new [BatchNorm](BatchNorm) module.
    pub fn init<B: Backend>(&self, device: &B::Device) -> BatchNorm<B> {
        let gamma = Initializer::Ones.init([self.num_features], device);
        let beta = Initializer::Zeros.init([self.num_features], device);
        let running_mean = Tensor::zeros([self.num_features], device);
        let running_var = Tensor::ones([self.num_features], device);

        BatchNorm {
            gamma,
            beta,
            running_mean: RunningState::new(running_mean),
            running_var: RunningState::new(running_var),
            epsilon: self.epsilon,
            momentum: self.momentum,
        }
    }
}

/// Applies Batch Normalization over axis 1 of a `[batch, features, length]` tensor.
///
/// In [Mode::Train] each feature is normalized with the statistics of the current
/// batch (over the batch and length axes), which are also folded into the running
/// statistics. In [Mode::Inference] the running statistics are used instead.
///
/// Training needs more than one value per feature (`batch * length > 1`).
#[derive(Module, Debug)]
#[module(custom_display)]
pub struct BatchNorm<B: Backend> {
    /// The learnable weight.
    pub gamma: Param<Tensor<B, 1>>,
    /// The learnable bias.
    pub beta: Param<Tensor<B, 1>>,
    pub running_mean: RunningState<Tensor<B, 1>>,
    /// Unbiased running variance.
    pub running_var: RunningState<Tensor<B, 1>>,
    epsilon: f64,
    momentum: f64,
}

impl<B: Backend> BatchNorm<B> {
    /// # Shapes
    ///   - Input [batch, features, length]
    ///   - Output [batch, features, length]
    pub fn forward(&self, x: Tensor<B, 3>, mode: Mode) -> Tensor<B, 3> {
        let [batch, features, length] = x.dims();

        let (mean, var) = if mode.is_train() {
            debug_assert!(
                batch * length > 1,
                "expected more than 1 value per feature when training"
            );
            let flat = x.clone().swap_dims(0, 1).reshape([features, batch * length]);
            let mean = flat.clone().mean_dim(1).reshape([features]);
            let centered = flat - mean.clone().unsqueeze_dim(1);
            let var = (centered.clone() * centered).mean_dim(1).reshape([features]);

            let n = (batch * length) as f64;
            let correction = if n > 1.0 { n / (n - 1.0) } else { 1.0 };
            let unbiased = var.clone() * correction;
            let running_mean = self.running_mean.value_sync();
            let running_var = self.running_var.value_sync();
            self.running_mean.update(
                running_mean * (1.0 - self.momentum) + mean.clone().detach() * self.momentum,
            );
            self.running_var.update(
                running_var * (1.0 - self.momentum) + unbiased.detach() * self.momentum,
            );

            (mean, var)
        } else {
            (self.running_mean.value_sync(), self.running_var.value_sync())
        };
        debug_assert_eq!([features], mean.dims());
        debug_assert_eq!([features], var.dims());

        let shape = [1, features, 1];
        let x_normalized = (x - mean.reshape(shape)) / (var.reshape(shape) + self.epsilon).sqrt();

        x_normalized * self.gamma.val().reshape(shape) + self.beta.val().reshape(shape)
    }
}

impl<B: Backend> ModuleDisplay for BatchNorm<B> {
    fn custom_settings(&self) -> Option<DisplaySettings> {
        DisplaySettings::new()
            .with_new_line_after_attribute(false)
            .optional()
    }

    fn custom_content(&self, content: Content) -> Option<Content> {
        let [num_features] = self.gamma.shape().dims();
        content
            .add("num_features", &num_features)
            .add("epsilon", &self.epsilon)
            .add("momentum", &self.momentum)
            .optional()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn input(device: &<TestBackend as Backend>::Device) -> Tensor<TestBackend, 3> {
        // feature 0 holds 1..=4, feature 1 is constant 10
        Tensor::from_floats(
            [[[1.0, 2.0], [10.0, 10.0]], [[3.0, 4.0], [10.0, 10.0]]],
            device,
        )
    }

    #[test]
    fn train_mode_uses_batch_statistics() {
        let device = Default::default();
        let norm = BatchNormConfig::new(2).init::<TestBackend>(&device);

        let y = norm.forward(input(&device), Mode::Train);
        assert_eq!([2, 2, 2], y.dims());

        let y = y.into_data().to_vec::<f32>().unwrap();
        // feature 0: mean 2.5, biased variance 1.25
        let std = (1.25f32 + 1e-5).sqrt();
        let expected = [-1.5 / std, -0.5 / std, 0.0, 0.0, 0.5 / std, 1.5 / std, 0.0, 0.0];
        for (y, e) in y.iter().zip(expected) {
            assert!((y - e).abs() < 1e-4, "{y} != {e}");
        }
    }

    #[test]
    fn train_mode_updates_running_statistics() {
        let device = Default::default();
        let norm = BatchNormConfig::new(2).init::<TestBackend>(&device);

        let _ = norm.forward(input(&device), Mode::Train);

        let mean = norm.running_mean.value_sync().into_data().to_vec::<f32>().unwrap();
        let var = norm.running_var.value_sync().into_data().to_vec::<f32>().unwrap();
        assert!((mean[0] - 0.25).abs() < 1e-5);
        assert!((mean[1] - 1.0).abs() < 1e-5);
        // unbiased variance of 1..=4 is 5/3
        assert!((var[0] - (0.9 + 0.1 * 5.0 / 3.0)).abs() < 1e-5);
        assert!((var[1] - 0.9).abs() < 1e-5);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "more than 1 value per feature")]
    fn training_rejects_a_single_value_per_feature() {
        let device = Default::default();
        let norm = BatchNormConfig::new(3).init::<TestBackend>(&device);
        let x = Tensor::<TestBackend, 3>::ones([1, 3, 1], &device);

        let _ = norm.forward(x, Mode::Train);
    }

    #[test]
    fn inference_mode_uses_running_statistics() {
        let device = Default::default();
        let norm = BatchNormConfig::new(2).init::<TestBackend>(&device);
        let x = input(&device);

        let y = norm.forward(x.clone(), Mode::Inference);

        // fresh running stats are mean 0, variance 1
        let scale = 1.0 / (1.0f32 + 1e-5).sqrt();
        let y = y.into_data().to_vec::<f32>().unwrap();
        let x = x.into_data().to_vec::<f32>().unwrap();
        for (y, x) in y.iter().zip(x) {
            assert!((y - x * scale).abs() < 1e-4);
        }
        let mean = norm.running_mean.value_sync().into_data().to_vec::<f32>().unwrap();
        assert_eq!(mean, vec![0.0, 0.0]);
    }
}
