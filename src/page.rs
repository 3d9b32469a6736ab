//! Page images and the sub-view capability.
//!
//! A decoded page is stored once behind an [`Arc`] and every crop or split of
//! it is a [`PageImage`] window over that shared storage. Nothing in the
//! pipeline copies pixels until the final encoding step.

use std::fmt;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader, Rgba};

use crate::error::{Error, Result};

/// Axis-aligned, half-open rectangle: columns `[min_x, max_x)`, rows `[min_y, max_y)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl Rect {
    /// Creates a rectangle, swapping coordinates so that `min <= max` always holds.
    pub fn new(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        Self {
            min_x: x0.min(x1),
            min_y: y0.min(y1),
            max_x: x0.max(x1),
            max_y: y0.max(y1),
        }
    }

    /// The rectangle `[0, width) x [0, height)`.
    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn width(&self) -> u32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y
    }

    pub fn is_empty(&self) -> bool {
        self.min_x >= self.max_x || self.min_y >= self.max_y
    }

    /// Shrinks the rectangle by `n` on every side. An axis shorter than `2n`
    /// collapses to its midpoint.
    pub fn inset(&self, n: u32) -> Self {
        let mut r = *self;
        if r.width() < n.saturating_mul(2) {
            r.min_x = (r.min_x + r.max_x) / 2;
            r.max_x = r.min_x;
        } else {
            r.min_x += n;
            r.max_x -= n;
        }
        if r.height() < n.saturating_mul(2) {
            r.min_y = (r.min_y + r.max_y) / 2;
            r.max_y = r.min_y;
        } else {
            r.min_y += n;
            r.max_y -= n;
        }
        r
    }

    /// Smallest rectangle containing both. Empty rectangles do not contribute.
    pub fn union(&self, other: &Rect) -> Self {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Overlap of both rectangles, clamped so that the result is still well-formed.
    pub fn intersect(&self, other: &Rect) -> Self {
        let min_x = self.min_x.max(other.min_x);
        let min_y = self.min_y.max(other.min_y);
        let max_x = self.max_x.min(other.max_x).max(min_x);
        let max_y = self.max_y.min(other.max_y).max(min_y);
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }
}

/// Capability of an image to be scanned and sub-viewed without copying.
pub trait Croppable {
    /// Local bounds, always anchored at the origin.
    fn bounds(&self) -> Rect;

    /// 16-bit grayscale luminance of the pixel at local coordinates.
    fn luma16(&self, x: u32, y: u32) -> u16;

    /// A view over `rect` (local coordinates, clamped to [`Croppable::bounds`])
    /// sharing the same pixel storage.
    fn sub_view(&self, rect: Rect) -> PageImage;
}

/// Rec. 601 luminance on 16-bit channels, 8-bit channels widened by 257.
pub fn luma16(pixel: Rgba<u8>) -> u16 {
    let [r, g, b, _] = pixel.0;
    let (r, g, b) = (r as u64 * 257, g as u64 * 257, b as u64 * 257);
    ((19595 * r + 38470 * g + 7471 * b + (1 << 15)) >> 16) as u16
}

/// A window over a shared decoded image.
#[derive(Clone)]
pub struct PageImage {
    pixels: Arc<DynamicImage>,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

impl PageImage {
    pub fn new(image: DynamicImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            pixels: Arc::new(image),
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Landscape or square pages are treated as two-page spreads.
    pub fn is_spread(&self) -> bool {
        self.width >= self.height
    }

    /// Whether both images are views into the same decoded pixels.
    pub fn shares_pixels_with(&self, other: &PageImage) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels)
    }

    /// Offset of this view inside the decoded image.
    pub fn origin(&self) -> (u32, u32) {
        (self.x, self.y)
    }

    /// Copies the visible window out into an owned image.
    pub fn to_image(&self) -> DynamicImage {
        self.pixels.crop_imm(self.x, self.y, self.width, self.height)
    }

    /// Encodes the visible window as a baseline JPEG.
    pub fn encode_jpeg(&self) -> Result<Vec<u8>> {
        let rgb = DynamicImage::ImageRgb8(self.to_image().to_rgb8());
        let mut bytes = Cursor::new(Vec::new());
        rgb.write_to(&mut bytes, ImageFormat::Jpeg)?;
        Ok(bytes.into_inner())
    }
}

impl Croppable for PageImage {
    fn bounds(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    fn luma16(&self, x: u32, y: u32) -> u16 {
        luma16(self.pixels.get_pixel(self.x + x, self.y + y))
    }

    fn sub_view(&self, rect: Rect) -> PageImage {
        let rect = rect.intersect(&self.bounds());
        PageImage {
            pixels: Arc::clone(&self.pixels),
            x: self.x + rect.min_x,
            y: self.y + rect.min_y,
            width: rect.width(),
            height: rect.height(),
        }
    }
}

impl fmt::Debug for PageImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageImage")
            .field("origin", &(self.x, self.y))
            .field("dimensions", &(self.width, self.height))
            .field("color", &self.pixels.color())
            .finish()
    }
}

/// Outcome of decoding a file.
#[derive(Debug)]
pub enum Decoded {
    /// A raster with addressable pixels.
    Raster(PageImage),
    /// A decoded representation that cannot be sub-viewed.
    Unaddressable { kind: String },
}

impl Decoded {
    /// Unlocks the [`Croppable`] capability, failing with
    /// [`Error::UnsupportedImageKind`] when the representation lacks it.
    pub fn into_croppable(self, path: &Path) -> Result<PageImage> {
        match self {
            Decoded::Raster(image) => Ok(image),
            Decoded::Unaddressable { kind } => Err(Error::UnsupportedImageKind {
                path: path.to_path_buf(),
                kind,
            }),
        }
    }
}

impl From<DynamicImage> for Decoded {
    fn from(image: DynamicImage) -> Self {
        match image {
            DynamicImage::ImageLuma8(_)
            | DynamicImage::ImageLumaA8(_)
            | DynamicImage::ImageRgb8(_)
            | DynamicImage::ImageRgba8(_)
            | DynamicImage::ImageLuma16(_)
            | DynamicImage::ImageLumaA16(_)
            | DynamicImage::ImageRgb16(_)
            | DynamicImage::ImageRgba16(_)
            | DynamicImage::ImageRgb32F(_)
            | DynamicImage::ImageRgba32F(_) => Decoded::Raster(PageImage::new(image)),
            other => Decoded::Unaddressable {
                kind: format!("{:?}", other.color()),
            },
        }
    }
}

/// Turns a file into a [`Decoded`] page.
///
/// Implementations run on blocking threads and may be shared between workers.
pub trait PageDecoder: Send + Sync + 'static {
    /// Decodes `path`. Failures should be reported as [`Error::DecodeFailure`]
    /// so that the pipeline skips the file instead of aborting.
    fn decode(&self, path: &Path) -> Result<Decoded>;
}

/// Default decoder: sniffs the format from the file contents.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileDecoder;

impl PageDecoder for FileDecoder {
    fn decode(&self, path: &Path) -> Result<Decoded> {
        let failure = |reason: String| Error::DecodeFailure {
            path: path.to_path_buf(),
            reason,
        };

        let image = ImageReader::open(path)
            .map_err(|e| failure(e.to_string()))?
            .with_guessed_format()
            .map_err(|e| failure(e.to_string()))?
            .decode()
            .map_err(|e| failure(e.to_string()))?;

        Ok(Decoded::from(image))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_rect_inset_collapses_short_axis() {
        let r = Rect::from_size(10, 100).inset(6);
        assert_eq!(r.min_x, 5);
        assert_eq!(r.max_x, 5);
        assert_eq!((r.min_y, r.max_y), (6, 94));
        assert!(r.is_empty());
    }

    #[test]
    fn test_rect_union_ignores_empty() {
        let a = Rect::new(5, 5, 5, 5);
        let b = Rect::new(1, 2, 3, 4);
        assert_eq!(a.union(&b), b);
        assert_eq!(b.union(&Rect::new(0, 3, 2, 9)), Rect::new(0, 2, 3, 9));
    }

    #[test]
    fn test_luma16_extremes() {
        assert_eq!(luma16(Rgba([0, 0, 0, 255])), 0);
        assert_eq!(luma16(Rgba([255, 255, 255, 255])), 65535);
    }

    #[test]
    fn test_sub_view_shares_storage_and_composes_offsets() {
        let mut img = RgbImage::new(8, 4);
        img.put_pixel(5, 2, Rgb([0, 0, 0]));
        for (x, y, p) in img.enumerate_pixels_mut() {
            if (x, y) != (5, 2) {
                *p = Rgb([255, 255, 255]);
            }
        }
        let page = PageImage::new(DynamicImage::ImageRgb8(img));
        let half = page.sub_view(Rect::new(4, 0, 8, 4));
        let inner = half.sub_view(Rect::new(1, 1, 3, 3));

        assert!(inner.shares_pixels_with(&page));
        assert_eq!(inner.origin(), (5, 1));
        assert_eq!(inner.dimensions(), (2, 2));
        assert_eq!(inner.luma16(0, 1), 0);
    }

    #[test]
    fn test_sub_view_is_clamped() {
        let page = PageImage::new(DynamicImage::new_rgb8(4, 4));
        let view = page.sub_view(Rect::new(2, 2, 10, 10));
        assert_eq!(view.dimensions(), (2, 2));
    }

    #[test]
    fn test_unaddressable_is_rejected() {
        let decoded = Decoded::Unaddressable {
            kind: "Paletted".to_string(),
        };
        let err = decoded.into_croppable(Path::new("a/1.gif")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedImageKind { .. }));
        assert!(err.is_fatal());
    }
}
