//! Image preprocessing for the pose network.
//!
//! Images are resized to 455x256, center cropped to 224x224, converted to
//! B, G, R channel order and normalized with the configured constants. The
//! resulting [`ImageTensor`] is laid out row-major, channels last.

use image::imageops::{self, FilterType};
use image::RgbImage;
use std::path::Path;

use super::{EstimatorError, InputNormalization};

pub const RESIZE_WIDTH: u32 = 455;
pub const RESIZE_HEIGHT: u32 = 256;
pub const CROP_SIZE: u32 = 224;

/// Normalized network input, `height x width x 3` in B, G, R order.
#[derive(Debug, Clone)]
pub struct ImageTensor {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f32>,
}

impl ImageTensor {
    /// Value at pixel `(x, y)` for channel `c` (0 = B, 1 = G, 2 = R).
    pub fn at(&self, x: u32, y: u32, c: usize) -> f32 {
        self.data[((y * self.width + x) as usize) * 3 + c]
    }
}

/// Loads an image and turns it into a network input tensor.
///
/// # Arguments
///
/// * `image_path` - Path to the image file
/// * `normalization` - Mean/std constants
///
/// # Returns
///
/// * `Result<ImageTensor, EstimatorError>` - 224x224 normalized tensor
pub fn prepare_image(
    image_path: &Path,
    normalization: &InputNormalization,
) -> Result<ImageTensor, EstimatorError> {
    let img = image::open(image_path).map_err(|e| {
        EstimatorError::ImageError(format!("Failed to load {}: {e}", image_path.display()))
    })?;
    Ok(prepare_rgb_image(&img.to_rgb8(), normalization))
}

/// Same as [`prepare_image`] for an image already in memory.
pub fn prepare_rgb_image(img: &RgbImage, normalization: &InputNormalization) -> ImageTensor {
    let resized = imageops::resize(img, RESIZE_WIDTH, RESIZE_HEIGHT, FilterType::Triangle);

    let x_offset = (RESIZE_WIDTH - CROP_SIZE) / 2;
    let y_offset = (RESIZE_HEIGHT - CROP_SIZE) / 2;
    let cropped = imageops::crop_imm(&resized, x_offset, y_offset, CROP_SIZE, CROP_SIZE).to_image();

    let mut data = Vec::with_capacity((CROP_SIZE * CROP_SIZE * 3) as usize);
    for pixel in cropped.pixels() {
        let [r, g, b] = pixel.0;
        data.push(normalization.apply_pixel(0, b));
        data.push(normalization.apply_pixel(1, g));
        data.push(normalization.apply_pixel(2, r));
    }

    ImageTensor {
        width: CROP_SIZE,
        height: CROP_SIZE,
        data,
    }
}
