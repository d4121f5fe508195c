// ============================================================================
// ALPHA BOUNDS: tightest rectangle around non-transparent pixels
// ============================================================================

use crate::geometry::Rect;
use crate::surface::PixelBuffer;

/// Find the smallest rectangle inside `region` that encloses every pixel
/// with non-zero alpha.
///
/// Four passes, each restricted by the ones before it: left edge (columns
/// left→right), top edge (rows top→bottom, columns ≥ left), right edge
/// (columns right→left, rows ≥ top), bottom edge (rows bottom→top, columns in
/// [left, right]).  A fully transparent region is returned unchanged.
pub fn find_bounds(buf: &PixelBuffer, region: Rect) -> Rect {
    let region = buf.bounds().intersect(&region);
    if region.is_empty() {
        return region;
    }
    let (l, t, r, b) = (region.left(), region.top(), region.right(), region.bottom());
    let opaque = |x: i32, y: i32| buf.pixel(x, y)[3] != 0;

    let Some(x_min) = (l..r).find(|&x| (t..b).any(|y| opaque(x, y))) else {
        return region;
    };
    // A hit in column x_min guarantees the remaining passes all find a pixel.
    let y_min = (t..b).find(|&y| (x_min..r).any(|x| opaque(x, y))).unwrap_or(t);
    let x_max = (x_min..r).rev().find(|&x| (y_min..b).any(|y| opaque(x, y))).unwrap_or(x_min);
    let y_max = (y_min..b).rev().find(|&y| (x_min..=x_max).any(|x| opaque(x, y))).unwrap_or(y_min);

    Rect::from_ltrb(x_min, y_min, x_max + 1, y_max + 1)
}
