use ndarray::{Array3, ArrayView4, s};

use crate::error::{Result, UtilError};

/// Decomposes a batch of images into fixed-size sliding-window patches.
///
/// A `(kh, kw)` window slides over the two spatial axes with the given
/// stride; only fully-contained windows are emitted, so trailing rows or
/// columns that do not fit a whole window are silently dropped. There is no
/// dilation and no padding.
///
/// Patches are enumerated in a fixed, documented order: batch-major, then
/// channel, then window row, then window column. Patch
/// `((b * C + c) * nh + i) * nw + j` covers the window whose top-left corner
/// is `(i * sh, j * sw)` in image `(b, c)`.
///
/// # Arguments
/// * `x` - The input batch, shaped `(batch, channels, height, width)`.
/// * `kernel_size` - The window height and width `(kh, kw)`.
/// * `stride` - The vertical and horizontal step; defaults to `(1, 1)`.
///
/// # Returns
/// An array of shape `(batch * channels * nh * nw, kh, kw)` where
/// `nh = (height - kh) / sh + 1` and `nw = (width - kw) / sw + 1`.
pub fn extract_image_patches(
    x: ArrayView4<f32>,
    kernel_size: (usize, usize),
    stride: Option<(usize, usize)>,
) -> Result<Array3<f32>> {
    let (b, c, h, w) = x.dim();
    let (kh, kw) = kernel_size;
    let (sh, sw) = stride.unwrap_or((1, 1));

    if kh == 0 || kw == 0 {
        return Err(UtilError::InvalidInput("kernel size must be non-zero"));
    }
    if sh == 0 || sw == 0 {
        return Err(UtilError::InvalidInput("stride must be non-zero"));
    }
    if kh > h || kw > w {
        return Err(UtilError::ShapeMismatch {
            what: "kernel".to_string(),
            got: vec![kh, kw],
            expected: vec![h, w],
        });
    }

    let nh = (h - kh) / sh + 1;
    let nw = (w - kw) / sw + 1;

    let mut patches = Array3::zeros((b * c * nh * nw, kh, kw));
    let mut idx = 0;

    for bi in 0..b {
        for ci in 0..c {
            for i in 0..nh {
                for j in 0..nw {
                    let (hs, ws) = (i * sh, j * sw);
                    patches
                        .slice_mut(s![idx, .., ..])
                        .assign(&x.slice(s![bi, ci, hs..hs + kh, ws..ws + kw]));
                    idx += 1;
                }
            }
        }
    }

    Ok(patches)
}
