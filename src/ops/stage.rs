use crate::geometry::Rect;
use crate::params::FilterParameters;
use crate::surface::PixelBuffer;

/// A pluggable pixel stage that can render any sub-rectangle of its output
/// independently, so tiles may be processed in parallel and in any order.
///
/// `rect` is in canvas coordinates and limits what is written to `dst`.
/// Reads from `src` may reach outside `rect` (spatial stages) but never
/// outside `src`'s own bounds.
pub trait RegionEffect: Send + Sync {
    /// Pick up the settings this stage cares about.
    fn configure(&mut self, params: &FilterParameters);

    fn render_region(&self, dst: &mut PixelBuffer, src: &PixelBuffer, rect: Rect);

    /// Render with `buf` as both input and output.  The default snapshots
    /// `rect` first, which is exact for point operations only.
    fn render_region_in_place(&self, buf: &mut PixelBuffer, rect: Rect) {
        let src = buf.copy_region(rect);
        self.render_region(buf, &src, rect);
    }
}
