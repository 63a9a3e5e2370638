use std::borrow::Cow;

use crate::error::DecodeError;
use crate::utils::grayscale;

/// Immutable 8-bit luminance image, row-major, 0 = black.
///
/// Usually borrows the caller's buffer; conversions from colour sources own
/// their converted pixels.
#[derive(Debug, Clone)]
pub struct LumaImage<'a> {
    width: usize,
    height: usize,
    pixels: Cow<'a, [u8]>,
}

fn validate(width: usize, height: usize, len: usize) -> Result<(), DecodeError> {
    if width == 0 || height == 0 || width.checked_mul(height) != Some(len) {
        return Err(DecodeError::InvalidImage { width, height, len });
    }
    Ok(())
}

impl<'a> LumaImage<'a> {
    /// Wrap a borrowed luminance buffer
    pub fn new(pixels: &'a [u8], width: usize, height: usize) -> Result<Self, DecodeError> {
        validate(width, height, pixels.len())?;
        Ok(Self {
            width,
            height,
            pixels: Cow::Borrowed(pixels),
        })
    }

    /// Take ownership of a luminance buffer
    pub fn from_vec(pixels: Vec<u8>, width: usize, height: usize) -> Result<Self, DecodeError> {
        validate(width, height, pixels.len())?;
        Ok(Self {
            width,
            height,
            pixels: Cow::Owned(pixels),
        })
    }

    /// Image width
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height
    pub fn height(&self) -> usize {
        self.height
    }

    /// All pixels, row-major
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Pixel at (x, y); callers must stay in bounds
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.pixels[y * self.width + x]
    }

    /// Row `y`
    #[inline]
    pub fn row(&self, y: usize) -> &[u8] {
        &self.pixels[y * self.width..(y + 1) * self.width]
    }

    /// Mutable pixels, copying a borrowed buffer first
    pub(crate) fn pixels_mut(&mut self) -> &mut [u8] {
        self.pixels.to_mut()
    }

    /// Detach from the borrowed buffer
    pub fn into_owned(self) -> LumaImage<'static> {
        LumaImage {
            width: self.width,
            height: self.height,
            pixels: Cow::Owned(self.pixels.into_owned()),
        }
    }
}

impl LumaImage<'static> {
    /// Uniform image; zero dimensions are raised to one
    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        Self {
            width,
            height,
            pixels: Cow::Owned(vec![value; width * height]),
        }
    }

    /// Convert packed RGB (3 bytes per pixel)
    pub fn from_rgb(rgb: &[u8], width: usize, height: usize) -> Result<Self, DecodeError> {
        let expected = width.checked_mul(height).and_then(|n| n.checked_mul(3));
        if width == 0 || height == 0 || expected != Some(rgb.len()) {
            return Err(DecodeError::InvalidImage {
                width,
                height,
                len: rgb.len(),
            });
        }
        Self::from_vec(grayscale::to_luma(rgb, width, height, 3), width, height)
    }

    /// Convert packed RGBA (4 bytes per pixel, alpha ignored)
    pub fn from_rgba(rgba: &[u8], width: usize, height: usize) -> Result<Self, DecodeError> {
        let expected = width.checked_mul(height).and_then(|n| n.checked_mul(4));
        if width == 0 || height == 0 || expected != Some(rgba.len()) {
            return Err(DecodeError::InvalidImage {
                width,
                height,
                len: rgba.len(),
            });
        }
        Self::from_vec(grayscale::to_luma(rgba, width, height, 4), width, height)
    }

    /// Convert any image loaded by the `image` crate
    pub fn from_dynamic(img: &image::DynamicImage) -> Result<Self, DecodeError> {
        let luma = img.to_luma8();
        let (width, height) = luma.dimensions();
        Self::from_vec(luma.into_raw(), width as usize, height as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_dimensions() {
        let pixels = vec![0u8; 12];
        assert!(LumaImage::new(&pixels, 0, 12).is_err());
        assert!(LumaImage::new(&pixels, 5, 2).is_err());
        assert_eq!(
            LumaImage::new(&pixels, 4, 4).unwrap_err(),
            DecodeError::InvalidImage {
                width: 4,
                height: 4,
                len: 12
            }
        );
    }

    #[test]
    fn test_accessors() {
        let pixels: Vec<u8> = (0..12).collect();
        let img = LumaImage::new(&pixels, 4, 3).unwrap();
        assert_eq!(img.get(1, 2), 9);
        assert_eq!(img.row(1), &[4, 5, 6, 7]);
    }

    #[test]
    fn test_from_rgb() {
        let rgb = [255u8, 255, 255, 0, 0, 0];
        let img = LumaImage::from_rgb(&rgb, 2, 1).unwrap();
        assert!(img.get(0, 0) > 250);
        assert_eq!(img.get(1, 0), 0);
        assert!(LumaImage::from_rgb(&rgb, 3, 1).is_err());
    }
}
