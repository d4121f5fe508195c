// ============================================================================
// ASPECT FIT: grow the trimmed box to the selection's aspect ratio
// ============================================================================

use crate::geometry::{Rect, Size};
use crate::params::OffsetVector;

/// Smallest size at least as large as `size` whose aspect ratio is `ratio`
/// (width / height).  One dimension is kept, the other grows.
pub fn grow_to_ratio(size: Size, ratio: f32) -> Size {
    let (w, h) = (size.width as f32, size.height as f32);
    if w < h * ratio {
        Size::new(((h * ratio).round_ties_even() as u32).max(size.width), size.height)
    } else if w > h * ratio {
        Size::new(size.width, ((w / ratio).round_ties_even() as u32).max(size.height))
    } else {
        size
    }
}

/// Rectangle to sample the fill from.
///
/// The trimmed box is grown to `ratio`; the extra space (slack) is shared
/// between both sides according to `offset`: 0 splits it evenly, +1 puts all
/// of it before the content (content flush with the far edge), -1 puts it all
/// after.  The result may extend outside the source image.
pub fn compute_source_rect(trimmed: Rect, ratio: f32, offset: OffsetVector) -> Rect {
    if trimmed.is_empty() || !ratio.is_finite() || ratio <= 0.0 {
        return trimmed;
    }
    let offset = offset.clamped();
    let size = grow_to_ratio(trimmed.size(), ratio);
    let slack_x = size.width.abs_diff(trimmed.width) as f64;
    let slack_y = size.height.abs_diff(trimmed.height) as f64;

    let shift_x = (slack_x / 2.0 + offset.x * slack_x / 2.0).round_ties_even() as i32;
    let shift_y = (slack_y / 2.0 + offset.y * slack_y / 2.0).round_ties_even() as i32;

    Rect::new(trimmed.x - shift_x, trimmed.y - shift_y, size.width, size.height)
}
