//! Image decoding and tensor preparation

use candle_core::{DType, Device, Tensor};
use florascope_core::{Error, Result};
use image::imageops::FilterType;
use image::DynamicImage;

/// Per-channel mean of the ImageNet training set
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// Per-channel standard deviation of the ImageNet training set
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Decode uploaded bytes, sniffing the format from content.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    if bytes.is_empty() {
        return Err(Error::decode("upload is empty"));
    }

    image::load_from_memory(bytes)
        .map_err(|e| Error::decode(format!("could not decode image: {}", e)))
}

/// Resize-to-fill, normalize, and lay out as `(3, size, size)` f32.
pub fn image_to_tensor(image: &DynamicImage, size: usize, device: &Device) -> candle_core::Result<Tensor> {
    let side = size as u32;
    let rgb = image.resize_to_fill(side, side, FilterType::Triangle).to_rgb8();

    let pixels = Tensor::from_vec(rgb.into_raw(), (size, size, 3), device)?.permute((2, 0, 1))?;
    let mean = Tensor::new(&IMAGENET_MEAN, device)?.reshape((3, 1, 1))?;
    let std = Tensor::new(&IMAGENET_STD, device)?.reshape((3, 1, 1))?;

    (pixels.to_dtype(DType::F32)? / 255.)?
        .broadcast_sub(&mean)?
        .broadcast_div(&std)
}
