// ============================================================================
// FILTER PARAMETERS: user-facing settings and their config token
// ============================================================================

use serde::{Deserialize, Serialize};
use crate::error::Result;

pub const MIN_BLUR_RADIUS: u32 = 0;
pub const MAX_BLUR_RADIUS: u32 = 200;
pub const MIN_BRIGHTNESS: i32 = -100;
pub const MAX_BRIGHTNESS: i32 = 100;

/// Position bias along X and Y, each in [-1, 1].  0 centres the trimmed
/// content inside the fitted box; ±1 pushes it against one edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OffsetVector {
    pub x: f64,
    pub y: f64,
}

impl OffsetVector {
    pub const CENTERED: OffsetVector = OffsetVector { x: 0.0, y: 0.0 };

    /// Build a clamped offset.  NaN components become 0.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x: clamp_unit(x), y: clamp_unit(y) }
    }

    pub fn clamped(self) -> Self {
        Self::new(self.x, self.y)
    }
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(-1.0, 1.0) }
}

/// Immutable snapshot of the filter settings for one render pass.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterParameters {
    /// Blur radius in pixels, 0..=200.
    pub blur_radius: u32,
    /// Additive brightness, -100..=100.
    pub brightness: i32,
    pub position: OffsetVector,
    /// Composite the original opaque pixels over the fill.
    pub keep_original: bool,
}

impl Default for FilterParameters {
    fn default() -> Self {
        Self {
            blur_radius: 10,
            brightness: 0,
            position: OffsetVector::CENTERED,
            keep_original: true,
        }
    }
}

impl FilterParameters {
    /// Rows/columns outside the selection that receive clamped fill.
    /// Fixed at the maximum blur radius.
    pub const PADDING: u32 = 200;

    /// Copy with every field forced into its valid range.
    pub fn sanitized(&self) -> Self {
        Self {
            blur_radius: self.blur_radius.clamp(MIN_BLUR_RADIUS, MAX_BLUR_RADIUS),
            brightness: self.brightness.clamp(MIN_BRIGHTNESS, MAX_BRIGHTNESS),
            position: self.position.clamped(),
            keep_original: self.keep_original,
        }
    }

    /// Encode as a compact binary config token.
    pub fn to_token(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode a config token produced by [`to_token`](Self::to_token).
    pub fn from_token(bytes: &[u8]) -> Result<Self> {
        let params: FilterParameters = bincode::deserialize(bytes)?;
        Ok(params.sanitized())
    }
}
