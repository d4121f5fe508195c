// ============================================================================
// GEOMETRY: integer rectangles and sizes in canvas space
// ============================================================================

use serde::{Deserialize, Serialize};

/// Width/height pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Axis-aligned integer rectangle.  The origin may be negative (fitted
/// source rectangles routinely extend past the image); the size never is.
/// Right and bottom edges are exclusive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle at the origin covering `size`.
    pub const fn from_size(size: Size) -> Self {
        Self { x: 0, y: 0, width: size.width, height: size.height }
    }

    /// Build from edges.  Inverted edges collapse to an empty rect.
    pub fn from_ltrb(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            x: left,
            y: top,
            width: (right - left).max(0) as u32,
            height: (bottom - top).max(0) as u32,
        }
    }

    #[inline]
    pub fn left(&self) -> i32 { self.x }
    #[inline]
    pub fn top(&self) -> i32 { self.y }
    #[inline]
    pub fn right(&self) -> i32 { self.x + self.width as i32 }
    #[inline]
    pub fn bottom(&self) -> i32 { self.y + self.height as i32 }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.left() && x < self.right() && y >= self.top() && y < self.bottom()
    }

    /// True when `other` lies entirely inside `self`.  An empty `other` is
    /// always contained.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.is_empty()
            || (other.left() >= self.left()
                && other.top() >= self.top()
                && other.right() <= self.right()
                && other.bottom() <= self.bottom())
    }

    /// Overlap of two rects, or an empty rect at `self`'s origin.
    pub fn intersect(&self, other: &Rect) -> Rect {
        let l = self.left().max(other.left());
        let t = self.top().max(other.top());
        let r = self.right().min(other.right());
        let b = self.bottom().min(other.bottom());
        if r <= l || b <= t {
            return Rect::new(self.x, self.y, 0, 0);
        }
        Rect::from_ltrb(l, t, r, b)
    }

    /// Grow every edge outward by `amount` pixels.
    pub fn inflate(&self, amount: u32) -> Rect {
        let a = amount as i32;
        Rect::from_ltrb(self.left() - a, self.top() - a, self.right() + a, self.bottom() + a)
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Split into row-major tiles no larger than `tile` × `tile`.
    pub fn tiles(&self, tile: u32) -> Vec<Rect> {
        if self.is_empty() || tile == 0 {
            return Vec::new();
        }
        let step = tile as i32;
        let mut out = Vec::new();
        let mut y = self.top();
        while y < self.bottom() {
            let mut x = self.left();
            let b = (y + step).min(self.bottom());
            while x < self.right() {
                let r = (x + step).min(self.right());
                out.push(Rect::from_ltrb(x, y, r, b));
                x = r;
            }
            y = b;
        }
        out
    }
}
