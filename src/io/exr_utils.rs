/* Copyright 2020 @TwoCookingMice */

use crate::math::bitmap::Bitmap;
use crate::math::constants::Float;

use exr::prelude::*;
use std::path::Path;

/// Writes linear RGB radiance as a 32-bit float OpenEXR image.
pub fn write_exr_to_file<P: AsRef<Path>>(image: &Bitmap, file_path: P) -> std::result::Result<(), Error> {
    let file_path = file_path.as_ref();
    log::info!("Starting writing openexr images: {}.", file_path.display());

    let width = image.width();
    write_rgb_file(file_path, width, image.height(), |x, y| {
        let p = image.pixels()[y * width + x];
        (p.x, p.y, p.z)
    })?;
    log::info!("EXR written to: {}.", file_path.display());
    Ok(())
}

fn linear_to_srgb(v: Float) -> Float {
    let v = v.max(0.0).min(1.0);
    if v <= 0.0031308 {
        12.92 * v
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}

/// Clamped sRGB preview of the image in any format `image` can encode.
pub fn write_ldr_to_file<P: AsRef<Path>>(image: &Bitmap, file_path: P) -> ::image::ImageResult<()> {
    let file_path = file_path.as_ref();
    log::info!("Starting writing preview image: {}.", file_path.display());

    let width = image.width();
    let buffer = ::image::RgbImage::from_fn(width as u32, image.height() as u32, |x, y| {
        let p = image.pixels()[y as usize * width + x as usize];
        let encode = |c: Float| (linear_to_srgb(c) * 255.0 + 0.5) as u8;
        ::image::Rgb([encode(p.x), encode(p.y), encode(p.z)])
    });
    buffer.save(file_path)
}
