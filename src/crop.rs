//! Border detection, margin cropping and double-page splitting.
//!
//! Manga pages are mostly line-art on a uniform background. The border
//! detector scans inwards from each edge until it meets a row or column that
//! holds at least one dark pixel; the cropper then bounds that result by a
//! safety margin so that noisy scans are never cut into.

use crate::page::{Croppable, PageImage, Rect};

/// Pixels at or below this 16-bit luminance count as content.
pub const MAX_GRAY_DARKNESS: u16 = 128;

/// Default fraction of the average page dimension that may be cropped per side.
pub const DEFAULT_MARGIN_FRACTION: f32 = 0.1;

/// Finds the tightest rectangle enclosing every dark pixel.
///
/// The four sides are computed independently. A side whose scan finds no
/// content at all keeps the image edge, so a blank page yields its own bounds.
pub fn detect_content_bounds<C: Croppable + ?Sized>(image: &C) -> Rect {
    let bounds = image.bounds();
    let (width, height) = (bounds.width(), bounds.height());

    let is_dark = |x: u32, y: u32| image.luma16(x, y) <= MAX_GRAY_DARKNESS;
    let column_has_content = |x: u32| (0..height).any(|y| is_dark(x, y));
    let row_has_content = |y: u32| (0..width).any(|x| is_dark(x, y));

    let left = (0..width).find(|&x| column_has_content(x)).unwrap_or(0);
    let right = (0..width)
        .rev()
        .find(|&x| column_has_content(x))
        .map_or(width, |x| x + 1);
    let top = (0..height).find(|&y| row_has_content(y)).unwrap_or(0);
    let bottom = (0..height)
        .rev()
        .find(|&y| row_has_content(y))
        .map_or(height, |y| y + 1);

    Rect::new(left, top, right, bottom)
}

/// The rectangle a crop may actually use: the detected content widened to at
/// least the page inset by `margin_fraction` of its average dimension.
pub fn crop_limits<C: Croppable + ?Sized>(image: &C, margin_fraction: f32) -> Rect {
    let bounds = image.bounds();
    let average = (bounds.width() + bounds.height()) / 2;
    let max_pixels = (average as f32 * margin_fraction) as u32;

    detect_content_bounds(image).union(&bounds.inset(max_pixels))
}

/// Crops uniform margins, never cutting deeper than the safety limit.
pub fn crop_with_limit<C: Croppable + ?Sized>(image: &C, margin_fraction: f32) -> PageImage {
    image.sub_view(crop_limits(image, margin_fraction))
}

/// Splits a page down the middle into `(left, right)`.
///
/// The left half spans columns `[0, width / 2)` and the right half the rest.
/// Reading order is up to the caller.
pub fn split_if_spread<C: Croppable + ?Sized>(image: &C) -> (PageImage, PageImage) {
    let bounds = image.bounds();
    let side = bounds.width() / 2;

    let left = image.sub_view(Rect::new(0, 0, side, bounds.height()));
    let right = image.sub_view(Rect::new(side, 0, bounds.width(), bounds.height()));
    (left, right)
}
