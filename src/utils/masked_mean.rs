use burn::prelude::*;
use burn::tensor::ElementConversion;

/// Averages `x` over its time axis, weighting each step by `padded`.
///
/// Rows without any valid step are divided by 1 instead of 0, so they pool to
/// the (all-zero) masked sum.
///
/// # Shapes
///   - Input x [batch, sequence, d_model]
///   - Input padded [batch, sequence]
///   - Output [batch, d_model]
pub fn masked_mean<B: Backend>(x: Tensor<B, 3>, padded: Tensor<B, 2>) -> Tensor<B, 2> {
    let [batch, sequence, d_model] = x.dims();
    debug_assert_eq!([batch, sequence], padded.dims());

    let mask = padded.unsqueeze_dim::<3>(2);
    debug_assert_eq!([batch, sequence, 1], mask.dims());
    let sum = (x * mask.clone()).sum_dim(1).reshape([batch, d_model]);

    let counts = mask.sum_dim(1).reshape([batch, 1]);
    let counts = counts.clone().mask_fill(counts.equal_elem(0.0), 1.0);

    sum / counts
}

/// Number of rows in `padded` without a single valid step.
pub fn count_empty_rows<B: Backend>(padded: Tensor<B, 2>) -> usize {
    let counts = padded.sum_dim(1);
    let empty: i64 = counts.equal_elem(0.0).int().sum().into_scalar().elem();
    empty as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn ignores_padded_steps() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 3>::from_floats(
            [[[1.0, 2.0], [3.0, 6.0], [100.0, -7.0], [f32::MAX, 9.0]]],
            &device,
        );
        let padded = Tensor::<TestBackend, 2>::from_floats([[1.0, 1.0, 0.0, 0.0]], &device);

        let y = masked_mean(x, padded);

        assert_eq!([1, 2], y.dims());
        assert_eq!(y.into_data().to_vec::<f32>().unwrap(), vec![2.0, 4.0]);
    }

    #[test]
    fn empty_row_pools_to_zero() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 3>::from_floats(
            [
                [[1.0, 2.0], [3.0, 4.0], [5.0, 6.0], [7.0, 8.0]],
                [[1.0, 2.0], [3.0, 4.0], [5.0, 6.0], [7.0, 8.0]],
            ],
            &device,
        );
        let padded = Tensor::<TestBackend, 2>::from_floats(
            [[0.0, 0.0, 0.0, 0.0], [1.0, 1.0, 1.0, 1.0]],
            &device,
        );

        let y = masked_mean(x, padded.clone()).into_data().to_vec::<f32>().unwrap();

        assert_eq!(y, vec![0.0, 0.0, 4.0, 5.0]);
        assert_eq!(count_empty_rows(padded), 1);
    }
}
