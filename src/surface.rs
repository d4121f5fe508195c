// ============================================================================
// PIXEL BUFFER: straight-alpha RGBA image anchored in canvas space
// ============================================================================
//
// Every buffer the pipeline touches is addressed in canvas coordinates.  A
// canvas-sized buffer sits at (0,0); a tile buffer carries the tile's top-left
// corner as its origin, so stages can read and write the same (x, y) whether
// they hold the whole canvas or one 64×64 piece of it.
// ============================================================================

use image::{Rgba, RgbaImage};
use crate::geometry::{Rect, Size};

pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Owned RGBA pixel grid with a canvas-space origin.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelBuffer {
    x: i32,
    y: i32,
    image: RgbaImage,
}

impl PixelBuffer {
    /// Transparent buffer at the canvas origin.
    pub fn new(width: u32, height: u32) -> Self {
        Self { x: 0, y: 0, image: RgbaImage::new(width, height) }
    }

    /// Transparent buffer covering `rect`.
    pub fn new_at(rect: Rect) -> Self {
        Self { x: rect.x, y: rect.y, image: RgbaImage::new(rect.width, rect.height) }
    }

    pub fn from_image(image: RgbaImage) -> Self {
        Self { x: 0, y: 0, image }
    }

    pub fn from_image_at(image: RgbaImage, x: i32, y: i32) -> Self {
        Self { x, y, image }
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    #[inline]
    pub fn width(&self) -> u32 { self.image.width() }
    #[inline]
    pub fn height(&self) -> u32 { self.image.height() }

    pub fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }

    /// Canvas-space rectangle covered by this buffer.
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width(), self.height())
    }

    /// Byte offset of canvas pixel (x, y).  Caller guarantees it is in bounds.
    #[inline]
    fn offset_of(&self, x: i32, y: i32) -> usize {
        let lx = (x - self.x) as usize;
        let ly = (y - self.y) as usize;
        (ly * self.width() as usize + lx) * 4
    }

    /// Pixel at canvas (x, y), or transparent outside the buffer.
    #[inline]
    pub fn pixel(&self, x: i32, y: i32) -> Rgba<u8> {
        if !self.bounds().contains(x, y) {
            return TRANSPARENT;
        }
        let o = self.offset_of(x, y);
        let raw = self.image.as_raw();
        Rgba([raw[o], raw[o + 1], raw[o + 2], raw[o + 3]])
    }

    /// Pixel at canvas (x, y) with the coordinate snapped to the nearest edge.
    #[inline]
    pub fn get_clamped(&self, x: i32, y: i32) -> Rgba<u8> {
        if self.width() == 0 || self.height() == 0 {
            return TRANSPARENT;
        }
        let cx = x.clamp(self.x, self.x + self.width() as i32 - 1);
        let cy = y.clamp(self.y, self.y + self.height() as i32 - 1);
        let o = self.offset_of(cx, cy);
        let raw = self.image.as_raw();
        Rgba([raw[o], raw[o + 1], raw[o + 2], raw[o + 3]])
    }

    /// Write a pixel at canvas (x, y).  Out-of-bounds writes are dropped.
    #[inline]
    pub fn put_pixel(&mut self, x: i32, y: i32, px: Rgba<u8>) {
        if self.bounds().contains(x, y) {
            let o = self.offset_of(x, y);
            let raw: &mut [u8] = &mut self.image;
            raw[o..o + 4].copy_from_slice(&px.0);
        }
    }

    /// Mutable bytes of one canvas row restricted to `[x0, x1)`.
    pub fn row_span_mut(&mut self, y: i32, x0: i32, x1: i32) -> &mut [u8] {
        let start = self.offset_of(x0, y);
        let end = start + (x1 - x0) as usize * 4;
        let raw: &mut [u8] = &mut self.image;
        &mut raw[start..end]
    }

    /// Bytes of one canvas row restricted to `[x0, x1)`.
    pub fn row_span(&self, y: i32, x0: i32, x1: i32) -> &[u8] {
        let start = self.offset_of(x0, y);
        let end = start + (x1 - x0) as usize * 4;
        &self.image.as_raw()[start..end]
    }

    /// Raw interleaved RGBA bytes, row-major.
    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn as_raw_mut(&mut self) -> &mut [u8] {
        &mut self.image
    }

    /// Detached copy of `rect` (clipped to this buffer), keeping canvas origin.
    pub fn copy_region(&self, rect: Rect) -> PixelBuffer {
        let clip = self.bounds().intersect(&rect);
        let mut out = PixelBuffer::new_at(clip);
        out.blit(self);
        out
    }

    /// Copy of `rect` read from `src`; positions outside `src` stay transparent.
    pub fn copy_clipped(src: &PixelBuffer, rect: Rect) -> PixelBuffer {
        let mut out = PixelBuffer::new_at(rect);
        out.blit(src);
        out
    }

    /// Copy every pixel of `src` that overlaps this buffer.
    pub fn blit(&mut self, src: &PixelBuffer) {
        let area = self.bounds().intersect(&src.bounds());
        if area.is_empty() {
            return;
        }
        for y in area.top()..area.bottom() {
            let from = src.row_span(y, area.left(), area.right());
            self.row_span_mut(y, area.left(), area.right()).copy_from_slice(from);
        }
    }

    /// Zero every byte.
    pub fn clear(&mut self) {
        self.image.fill(0);
    }

    /// True when no pixel has non-zero alpha.
    pub fn is_transparent(&self) -> bool {
        self.image.as_raw().chunks_exact(4).all(|p| p[3] == 0)
    }
}
