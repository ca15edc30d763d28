//! Image loading for texture data
//!
//! Decodes PNG and JPEG files and expands every supported layout to RGBA8, the
//! one format the texture uploader accepts.

use std::path::Path;

use image::DynamicImage;

use crate::assets::AssetError;

/// Channel layout of the source image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Single channel, sampled as red
    Red,
    /// Three channels
    Rgb,
    /// Four channels
    Rgba,
}

impl PixelFormat {
    /// Map a channel count to a format
    ///
    /// # Errors
    /// [`AssetError::UnsupportedFormat`] for anything but 1, 3 or 4 channels.
    pub fn from_channels(channels: u8) -> Result<Self, AssetError> {
        match channels {
            1 => Ok(Self::Red),
            3 => Ok(Self::Rgb),
            4 => Ok(Self::Rgba),
            other => Err(AssetError::UnsupportedFormat { channels: other }),
        }
    }

    /// Channels per source pixel
    pub fn channels(self) -> u8 {
        match self {
            Self::Red => 1,
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }
}

/// Decoded image ready for GPU upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    /// RGBA8 pixels, row-major, top row first
    pub data: Vec<u8>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Layout the pixels were decoded from
    pub format: PixelFormat,
}

impl ImageData {
    /// Load an image from a file path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AssetError> {
        let path = path.as_ref();
        log::debug!("Loading image from: {:?}", path);

        let img = image::open(path)
            .map_err(|e| AssetError::LoadFailed(format!("{}: {}", path.display(), e)))?;
        let data = Self::from_dynamic(&img)?;

        log::info!(
            "Loaded image {}x{} ({:?}) from {:?}",
            data.width,
            data.height,
            data.format,
            path
        );
        Ok(data)
    }

    /// Build from raw pixels with `channels` bytes per pixel
    ///
    /// # Errors
    /// Unsupported channel counts, or a buffer whose length is not
    /// `width * height * channels`.
    pub fn from_raw(width: u32, height: u32, channels: u8, pixels: &[u8]) -> Result<Self, AssetError> {
        let format = PixelFormat::from_channels(channels)?;
        let expected = width as usize * height as usize * channels as usize;
        if pixels.len() != expected {
            return Err(AssetError::LoadFailed(format!(
                "{width}x{height}x{channels} image needs {expected} bytes, got {}",
                pixels.len()
            )));
        }

        Ok(Self {
            data: expand_to_rgba(format, pixels),
            width,
            height,
            format,
        })
    }

    /// Single-color RGBA image
    pub fn solid_color(width: u32, height: u32, color: [u8; 4]) -> Self {
        let pixel_count = width as usize * height as usize;
        Self {
            data: color.repeat(pixel_count),
            width,
            height,
            format: PixelFormat::Rgba,
        }
    }

    /// Size of the RGBA data in bytes
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    fn from_dynamic(img: &DynamicImage) -> Result<Self, AssetError> {
        let format = PixelFormat::from_channels(img.color().channel_count())?;
        let (width, height) = (img.width(), img.height());
        let data = match format {
            PixelFormat::Red => expand_to_rgba(format, img.to_luma8().as_raw()),
            PixelFormat::Rgb | PixelFormat::Rgba => img.to_rgba8().into_raw(),
        };

        Ok(Self {
            data,
            width,
            height,
            format,
        })
    }
}

fn expand_to_rgba(format: PixelFormat, pixels: &[u8]) -> Vec<u8> {
    match format {
        PixelFormat::Red => pixels.iter().flat_map(|&r| [r, 0, 0, 255]).collect(),
        PixelFormat::Rgb => pixels
            .chunks_exact(3)
            .flat_map(|rgb| [rgb[0], rgb[1], rgb[2], 255])
            .collect(),
        PixelFormat::Rgba => pixels.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_png(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("orrery_{}_{}.png", name, std::process::id()))
    }

    #[test]
    fn test_solid_color_image() {
        let img = ImageData::solid_color(4, 4, [255, 0, 0, 255]);
        assert_eq!(img.size_bytes(), 4 * 4 * 4);
        assert_eq!(&img.data[0..4], &[255, 0, 0, 255]);
        assert_eq!(img.format, PixelFormat::Rgba);
    }

    #[test]
    fn test_channel_mapping() {
        assert_eq!(PixelFormat::from_channels(1).unwrap(), PixelFormat::Red);
        assert_eq!(PixelFormat::from_channels(3).unwrap(), PixelFormat::Rgb);
        assert_eq!(PixelFormat::from_channels(4).unwrap(), PixelFormat::Rgba);

        for channels in [0, 2, 5] {
            assert!(matches!(
                PixelFormat::from_channels(channels),
                Err(AssetError::UnsupportedFormat { channels: c }) if c == channels
            ));
        }
    }

    #[test]
    fn test_from_raw_expands_to_rgba() {
        let red = ImageData::from_raw(2, 1, 1, &[10, 20]).unwrap();
        assert_eq!(red.data, vec![10, 0, 0, 255, 20, 0, 0, 255]);

        let rgb = ImageData::from_raw(1, 1, 3, &[1, 2, 3]).unwrap();
        assert_eq!(rgb.data, vec![1, 2, 3, 255]);
        assert_eq!(rgb.format, PixelFormat::Rgb);
    }

    #[test]
    fn test_from_raw_rejects_bad_input() {
        assert!(matches!(
            ImageData::from_raw(1, 1, 2, &[0, 0]),
            Err(AssetError::UnsupportedFormat { channels: 2 })
        ));
        assert!(matches!(
            ImageData::from_raw(2, 2, 3, &[0; 5]),
            Err(AssetError::LoadFailed(_))
        ));
    }

    #[test]
    fn test_decode_rgb_png() {
        let path = temp_png("rgb");
        image::RgbImage::from_pixel(3, 2, image::Rgb([7, 8, 9])).save(&path).unwrap();

        let img = ImageData::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!((img.width, img.height), (3, 2));
        assert_eq!(img.format, PixelFormat::Rgb);
        assert_eq!(img.size_bytes(), 3 * 2 * 4);
        assert_eq!(&img.data[0..4], &[7, 8, 9, 255]);
    }

    #[test]
    fn test_decode_gray_png_as_red() {
        let path = temp_png("gray");
        image::GrayImage::from_pixel(2, 2, image::Luma([200])).save(&path).unwrap();

        let img = ImageData::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(img.format, PixelFormat::Red);
        assert_eq!(&img.data[0..4], &[200, 0, 0, 255]);
    }

    #[test]
    fn test_two_channel_png_is_unsupported() {
        let path = temp_png("gray_alpha");
        image::GrayAlphaImage::from_pixel(2, 2, image::LumaA([1, 2])).save(&path).unwrap();

        let result = ImageData::from_file(&path);
        std::fs::remove_file(&path).ok();

        assert!(matches!(result, Err(AssetError::UnsupportedFormat { channels: 2 })));
    }

    #[test]
    fn test_missing_file_is_load_failure() {
        let result = ImageData::from_file("does/not/exist.png");
        assert!(matches!(result, Err(AssetError::LoadFailed(_))));
    }
}
