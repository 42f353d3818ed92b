// Copyright @yucwang 2026

use crate::math::constants::{Float, Vector2f};
use crate::math::spectrum::{rgb, RGBSpectrum};
use exr::prelude::*;
use image::io::Reader as ImageReader;
use image::GenericImageView;
use std::fmt;
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterMode {
    Bilinear,
    Nearest,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WrapMode {
    Repeat,
    Mirror,
    Clamp,
}

#[derive(Debug)]
pub enum TextureError {
    Io(std::io::Error),
    Image(image::ImageError),
    Exr(exr::error::Error),
    UnsupportedFormat(String),
}

impl From<std::io::Error> for TextureError {
    fn from(err: std::io::Error) -> Self {
        TextureError::Io(err)
    }
}

impl From<image::ImageError> for TextureError {
    fn from(err: image::ImageError) -> Self {
        TextureError::Image(err)
    }
}

impl From<exr::error::Error> for TextureError {
    fn from(err: exr::error::Error) -> Self {
        TextureError::Exr(err)
    }
}

impl fmt::Display for TextureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextureError::Io(err) => write!(f, "io error: {}", err),
            TextureError::Image(err) => write!(f, "image decode error: {}", err),
            TextureError::Exr(err) => write!(f, "exr error: {}", err),
            TextureError::UnsupportedFormat(ext) => write!(f, "unsupported texture format: {}", ext),
        }
    }
}

impl std::error::Error for TextureError {}

/// RGB image addressed by uv in `[0, 1]²`, with v pointing up.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTexture {
    width: usize,
    height: usize,
    data: Vec<RGBSpectrum>,
    filter_mode: FilterMode,
    wrap_mode: WrapMode,
}

fn srgb_to_linear(v: Float) -> Float {
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

impl ImageTexture {
    pub fn from_pixels(width: usize, height: usize, data: Vec<RGBSpectrum>) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let mut data = data;
        data.resize(width * height, RGBSpectrum::zeros());
        Self {
            width,
            height,
            data,
            filter_mode: FilterMode::Bilinear,
            wrap_mode: WrapMode::Repeat,
        }
    }

    pub fn from_rgb(r: Float, g: Float, b: Float) -> Self {
        Self::from_pixels(1, 1, vec![rgb(r, g, b)])
    }

    pub fn from_exr(path: &Path) -> std::result::Result<Self, TextureError> {
        let image = read()
            .no_deep_data()
            .largest_resolution_level()
            .rgba_channels(
                |resolution, _| {
                    let width = resolution.width();
                    let height = resolution.height();
                    ImageTexture::from_pixels(width, height, vec![RGBSpectrum::zeros(); width * height])
                },
                |texture: &mut ImageTexture, position, (r, g, b, _a): (f32, f32, f32, f32)| {
                    let idx = position.x() + texture.width * position.y();
                    texture.data[idx] = rgb(r, g, b);
                },
            )
            .first_valid_layer()
            .all_attributes()
            .from_file(path)?;

        Ok(image.layer_data.channel_data.pixels)
    }

    pub fn from_image(path: &Path, srgb: bool) -> std::result::Result<Self, TextureError> {
        let img = ImageReader::open(path)?.decode()?;
        let (width, height) = img.dimensions();
        let rgb32 = img.to_rgb32f();

        let mut data = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                let p = rgb32.get_pixel(x, y);
                let (mut r, mut g, mut b) = (p[0], p[1], p[2]);
                if srgb {
                    r = srgb_to_linear(r);
                    g = srgb_to_linear(g);
                    b = srgb_to_linear(b);
                }
                data.push(rgb(r, g, b));
            }
        }

        Ok(Self::from_pixels(width as usize, height as usize, data))
    }

    pub fn from_file(path: &Path) -> std::result::Result<Self, TextureError> {
        Self::from_file_with_srgb(path, true)
    }

    pub fn from_file_with_srgb(path: &Path, srgb: bool) -> std::result::Result<Self, TextureError> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        log::info!("Loading texture: {}.", path.display());
        match ext.as_str() {
            "exr" => Self::from_exr(path),
            "jpg" | "jpeg" | "png" | "bmp" | "tga" => Self::from_image(path, srgb),
            _ => Err(TextureError::UnsupportedFormat(ext)),
        }
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn set_filter_mode(&mut self, filter_mode: FilterMode) {
        self.filter_mode = filter_mode;
    }

    pub fn set_wrap_mode(&mut self, wrap_mode: WrapMode) {
        self.wrap_mode = wrap_mode;
    }

    /// Texel in image order (row 0 is the top of the image).
    pub fn texel(&self, x: usize, y: usize) -> RGBSpectrum {
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        self.data[x + self.width * y]
    }

    pub fn eval(&self, uv: Vector2f) -> RGBSpectrum {
        match self.filter_mode {
            FilterMode::Bilinear => self.sample_bilinear(uv),
            FilterMode::Nearest => self.sample_nearest(uv),
        }
    }

    pub fn eval_scalar(&self, uv: Vector2f) -> Float {
        self.eval(uv).x
    }

    fn sample_nearest(&self, uv: Vector2f) -> RGBSpectrum {
        let uv = self.wrap_uv(uv);
        let x = (uv.x * self.width as Float).floor() as isize;
        let y = ((1.0 - uv.y) * self.height as Float).floor() as isize;
        let xi = x.clamp(0, self.width as isize - 1) as usize;
        let yi = y.clamp(0, self.height as isize - 1) as usize;
        self.texel(xi, yi)
    }

    fn sample_bilinear(&self, uv: Vector2f) -> RGBSpectrum {
        let uv = self.wrap_uv(uv);
        let x = uv.x * self.width as Float - 0.5;
        let y = (1.0 - uv.y) * self.height as Float - 0.5;

        let x0 = x.floor() as isize;
        let y0 = y.floor() as isize;
        let tx = x - x0 as Float;
        let ty = y - y0 as Float;

        let x0u = self.wrap_index(x0, self.width);
        let y0u = self.wrap_index(y0, self.height);
        let x1u = self.wrap_index(x0 + 1, self.width);
        let y1u = self.wrap_index(y0 + 1, self.height);

        let top = self.texel(x0u, y0u) * (1.0 - tx) + self.texel(x1u, y0u) * tx;
        let bottom = self.texel(x0u, y1u) * (1.0 - tx) + self.texel(x1u, y1u) * tx;
        top * (1.0 - ty) + bottom * ty
    }

    fn wrap_uv(&self, uv: Vector2f) -> Vector2f {
        Vector2f::new(self.wrap_coord(uv.x), self.wrap_coord(uv.y))
    }

    fn wrap_coord(&self, value: Float) -> Float {
        match self.wrap_mode {
            WrapMode::Repeat => value.rem_euclid(1.0),
            WrapMode::Mirror => {
                let v = value.rem_euclid(2.0);
                if v > 1.0 { 2.0 - v } else { v }
            }
            WrapMode::Clamp => value.clamp(0.0, 1.0),
        }
    }

    fn wrap_index(&self, idx: isize, size: usize) -> usize {
        let n = size as isize;
        match self.wrap_mode {
            WrapMode::Repeat => idx.rem_euclid(n) as usize,
            WrapMode::Clamp => idx.clamp(0, n - 1) as usize,
            WrapMode::Mirror => {
                if n == 1 {
                    return 0;
                }
                let period = 2 * (n - 1);
                let i = idx.rem_euclid(period);
                (if i >= n { period - i } else { i }) as usize
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> ImageTexture {
        // Top row: red, green. Bottom row: blue, white.
        ImageTexture::from_pixels(2, 2, vec![rgb(1.0, 0.0, 0.0), rgb(0.0, 1.0, 0.0),
                                             rgb(0.0, 0.0, 1.0), rgb(1.0, 1.0, 1.0)])
    }

    #[test]
    fn test_nearest_lookup_flips_v() {
        let mut tex = checker();
        tex.set_filter_mode(FilterMode::Nearest);
        assert_eq!(tex.eval(Vector2f::new(0.25, 0.75)), rgb(1.0, 0.0, 0.0));
        assert_eq!(tex.eval(Vector2f::new(0.75, 0.75)), rgb(0.0, 1.0, 0.0));
        assert_eq!(tex.eval(Vector2f::new(0.25, 0.25)), rgb(0.0, 0.0, 1.0));
        assert_eq!(tex.eval(Vector2f::new(1.25, 0.25)), rgb(0.0, 0.0, 1.0));
        assert!((tex.eval_scalar(Vector2f::new(0.75, 0.25)) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_bilinear_at_texel_centre_and_between() {
        let mut tex = checker();
        tex.set_wrap_mode(WrapMode::Clamp);
        let c = tex.eval(Vector2f::new(0.25, 0.75));
        assert!((c - rgb(1.0, 0.0, 0.0)).norm() < 1e-5);
        let mid = tex.eval(Vector2f::new(0.5, 0.75));
        assert!((mid - rgb(0.5, 0.5, 0.0)).norm() < 1e-5);
    }

    #[test]
    fn test_wrap_modes() {
        let mut tex = checker();
        tex.set_filter_mode(FilterMode::Nearest);
        tex.set_wrap_mode(WrapMode::Clamp);
        assert_eq!(tex.eval(Vector2f::new(-3.0, 0.75)), rgb(1.0, 0.0, 0.0));
        tex.set_wrap_mode(WrapMode::Mirror);
        assert_eq!(tex.eval(Vector2f::new(1.25, 0.75)), rgb(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_srgb_conversion() {
        assert!((srgb_to_linear(1.0) - 1.0).abs() < 1e-5);
        assert!(srgb_to_linear(0.5) < 0.5);
        assert_eq!(srgb_to_linear(0.0), 0.0);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = ImageTexture::from_file(Path::new("texture.gif")).unwrap_err();
        assert!(matches!(err, TextureError::UnsupportedFormat(_)));
    }
}
