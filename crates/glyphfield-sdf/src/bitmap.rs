//! Occupancy bitmaps handed to the renderer.

use glyphfield_core::geometry::Size;

use crate::SdfError;
use crate::pass::seed;

/// A borrowed, row-major, single-channel 8-bit occupancy mask.
///
/// Texels at or above 128 are object, the rest background. Construction
/// validates the shape, so a `Bitmap` always has non-zero dimensions and
/// exactly `width * height` bytes.
#[derive(Debug, Clone, Copy)]
pub struct Bitmap<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
}

impl<'a> Bitmap<'a> {
    /// Wrap a tightly packed luminance buffer.
    pub fn new(data: &'a [u8], width: u32, height: u32) -> Result<Self, SdfError> {
        if width == 0 || height == 0 {
            return Err(SdfError::EmptyBitmap { width, height });
        }

        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(SdfError::BitmapSizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Wrap an interleaved buffer, rejecting anything but one channel.
    pub fn with_channels(
        data: &'a [u8],
        width: u32,
        height: u32,
        channels: u32,
    ) -> Result<Self, SdfError> {
        if channels != 1 {
            return Err(SdfError::UnsupportedBitmapFormat(format!(
                "{} channels",
                channels
            )));
        }
        Self::new(data, width, height)
    }

    /// Borrow an `image` grayscale buffer.
    #[cfg(feature = "image")]
    pub fn from_gray_image(image: &'a image::GrayImage) -> Result<Self, SdfError> {
        Self::new(image.as_raw(), image.width(), image.height())
    }

    /// Borrow a dynamic image; only `Luma8` images are accepted.
    #[cfg(feature = "image")]
    pub fn from_dynamic_image(image: &'a image::DynamicImage) -> Result<Self, SdfError> {
        match image {
            image::DynamicImage::ImageLuma8(gray) => Self::from_gray_image(gray),
            other => Err(SdfError::UnsupportedBitmapFormat(format!(
                "{:?}",
                other.color()
            ))),
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn size(&self) -> Size<u32> {
        Size::new(self.width, self.height)
    }

    #[inline]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Raw value at `(x, y)`; panics when out of range.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.data[y as usize * self.width as usize + x as usize]
    }

    /// Whether `(x, y)` is part of the shape.
    #[inline]
    pub fn is_object(&self, x: u32, y: u32) -> bool {
        seed::is_object(self.get(x, y), false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitmap_valid() {
        let data = [0u8, 127, 128, 255, 10, 200];
        let bitmap = Bitmap::new(&data, 3, 2).unwrap();

        assert_eq!(bitmap.size(), Size::new(3, 2));
        assert_eq!(bitmap.get(2, 0), 128);
        assert!(!bitmap.is_object(1, 0));
        assert!(bitmap.is_object(2, 0));
        assert!(bitmap.is_object(0, 1));
        assert!(bitmap.is_object(2, 1));
    }

    #[test]
    fn test_bitmap_empty_dimension() {
        assert_eq!(
            Bitmap::new(&[], 0, 8).unwrap_err(),
            SdfError::EmptyBitmap {
                width: 0,
                height: 8
            }
        );
        assert!(matches!(
            Bitmap::new(&[], 8, 0),
            Err(SdfError::EmptyBitmap { .. })
        ));
    }

    #[test]
    fn test_bitmap_length_mismatch() {
        let data = [0u8; 15];
        assert_eq!(
            Bitmap::new(&data, 4, 4).unwrap_err(),
            SdfError::BitmapSizeMismatch {
                expected: 16,
                actual: 15
            }
        );
    }

    #[test]
    fn test_bitmap_rejects_multichannel() {
        let data = [0u8; 48];
        assert!(matches!(
            Bitmap::with_channels(&data, 4, 4, 3),
            Err(SdfError::UnsupportedBitmapFormat(_))
        ));
        assert!(Bitmap::with_channels(&data[..16], 4, 4, 1).is_ok());
    }
}
