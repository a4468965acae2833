use ndarray::Array3;
use plotters::backend::BitMapBackend;
use plotters::coord::Shift;
use plotters::drawing::{DrawingArea, IntoDrawingArea};

use crate::error::{Result, UtilError};

/// An in-memory figure that rasterises to an image tensor.
///
/// The figure owns an RGB pixel buffer; [`Figure::draw`] exposes it as a
/// plotters drawing area, and [`Figure::into_image`] consumes the figure and
/// reads the pixels back as a channel-first array ready to be embedded as an
/// image artifact. Consuming the figure releases the canvas; it cannot be
/// drawn on again.
pub struct Figure {
    width: u32,
    height: u32,
    buffer: Vec<u8>,
}

impl Figure {
    /// Creates a blank (black) figure of the given pixel dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            buffer: vec![0; width as usize * height as usize * 3],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Draws on the figure's canvas.
    ///
    /// The closure receives the root drawing area; plotters errors are
    /// reported back as strings, matching how drawing code usually folds the
    /// backend's error types.
    ///
    /// # Errors
    /// Returns `UtilError::Render` if the closure or the final present fails.
    pub fn draw<'s, F>(&'s mut self, draw_fn: F) -> Result<()>
    where
        F: FnOnce(&DrawingArea<BitMapBackend<'s>, Shift>) -> std::result::Result<(), String>,
    {
        let root = BitMapBackend::with_buffer(&mut self.buffer, (self.width, self.height))
            .into_drawing_area();

        draw_fn(&root).map_err(UtilError::Render)?;
        root.present().map_err(|e| UtilError::Render(e.to_string()))?;

        Ok(())
    }

    /// Rasterises the figure into a `(3, height, width)` array of floats in
    /// `[0, 1]`, channel-first.
    ///
    /// # Errors
    /// Returns a shape mismatch if the pixel buffer does not agree with the
    /// canvas dimensions.
    pub fn into_image(self) -> Result<Array3<f32>> {
        let Self {
            width,
            height,
            buffer,
        } = self;
        let (h, w) = (height as usize, width as usize);
        let len = buffer.len();

        let img = Array3::from_shape_vec((h, w, 3), buffer).map_err(|_| {
            UtilError::ShapeMismatch {
                what: "figure pixel buffer".to_string(),
                got: vec![len],
                expected: vec![h, w, 3],
            }
        })?;

        let img = img.mapv(|px| f32::from(px) / 255.0);
        let img = img.permuted_axes([2, 0, 1]);

        Ok(img.as_standard_layout().to_owned())
    }
}

#[cfg(test)]
mod tests {
    use plotters::prelude::*;

    use super::*;

    #[test]
    fn white_fill_rasterises_to_all_ones() {
        let mut fig = Figure::new(16, 12);
        fig.draw(|root| root.fill(&WHITE).map_err(|e| e.to_string()))
            .unwrap();

        let img = fig.into_image().unwrap();
        assert_eq!(img.dim(), (3, 12, 16));
        assert!(img.iter().all(|&v| v == 1.0));
    }

    #[test]
    fn channels_come_out_channel_first() {
        let mut fig = Figure::new(8, 8);
        fig.draw(|root| root.fill(&RGBColor(255, 0, 0)).map_err(|e| e.to_string()))
            .unwrap();

        let img = fig.into_image().unwrap();
        assert!(img.index_axis(ndarray::Axis(0), 0).iter().all(|&v| v == 1.0));
        assert!(img.index_axis(ndarray::Axis(0), 1).iter().all(|&v| v == 0.0));
        assert!(img.index_axis(ndarray::Axis(0), 2).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn values_are_normalised_to_the_unit_interval() {
        let mut fig = Figure::new(4, 4);
        fig.draw(|root| root.fill(&RGBColor(51, 102, 204)).map_err(|e| e.to_string()))
            .unwrap();

        let img = fig.into_image().unwrap();
        assert!((img[[0, 0, 0]] - 51.0 / 255.0).abs() < 1e-6);
        assert!((img[[1, 2, 3]] - 102.0 / 255.0).abs() < 1e-6);
        assert!((img[[2, 3, 1]] - 204.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn undrawn_figure_rasterises_to_zeros() {
        let img = Figure::new(5, 3).into_image().unwrap();
        assert_eq!(img.dim(), (3, 3, 5));
        assert!(img.iter().all(|&v| v == 0.0));
    }
}
