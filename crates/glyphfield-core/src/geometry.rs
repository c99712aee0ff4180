//! Integer geometry for texture regions.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect<T> {
    pub x: T,
    pub y: T,
    pub width: T,
    pub height: T,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size<T> {
    pub width: T,
    pub height: T,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Pos<T> {
    pub x: T,
    pub y: T,
}

impl<T> Size<T> {
    pub fn new(width: T, height: T) -> Self {
        Size { width, height }
    }

    pub fn cast<U: From<T>>(self) -> Size<U> {
        Size {
            width: U::from(self.width),
            height: U::from(self.height),
        }
    }
}

impl<T> Pos<T> {
    pub fn new(x: T, y: T) -> Self {
        Pos { x, y }
    }
}

impl Size<u32> {
    /// True when either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Number of texels covered.
    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl Rect<u32> {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Rect { x, y, width, height }
    }

    /// Rectangle anchored at `origin` with the given size.
    pub fn from_origin_size(origin: Pos<u32>, size: Size<u32>) -> Self {
        Rect {
            x: origin.x,
            y: origin.y,
            width: size.width,
            height: size.height,
        }
    }

    /// Rectangle covering a whole surface of `size`.
    pub fn full(size: Size<u32>) -> Self {
        Self::from_origin_size(Pos::new(0, 0), size)
    }

    pub fn origin(&self) -> Pos<u32> {
        Pos::new(self.x, self.y)
    }

    pub fn size(&self) -> Size<u32> {
        Size::new(self.width, self.height)
    }

    /// Exclusive right edge, `None` on overflow.
    pub fn right(&self) -> Option<u32> {
        self.x.checked_add(self.width)
    }

    /// Exclusive bottom edge, `None` on overflow.
    pub fn bottom(&self) -> Option<u32> {
        self.y.checked_add(self.height)
    }

    /// Whether this rectangle lies entirely within a surface of `bounds`.
    pub fn fits_within(&self, bounds: Size<u32>) -> bool {
        matches!((self.right(), self.bottom()), (Some(r), Some(b)) if r <= bounds.width && b <= bounds.height)
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x
            && y >= self.y
            && self.right().is_none_or(|r| x < r)
            && self.bottom().is_none_or(|b| y < b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_fits_within() {
        let bounds = Size::new(64, 32);
        assert!(Rect::new(0, 0, 64, 32).fits_within(bounds));
        assert!(Rect::new(60, 30, 4, 2).fits_within(bounds));
        assert!(!Rect::new(60, 30, 5, 2).fits_within(bounds));
        assert!(!Rect::new(u32::MAX, 0, 2, 2).fits_within(bounds));
    }

    #[test]
    fn test_rect_contains() {
        let rect = Rect::new(2, 3, 4, 5);
        assert!(rect.contains(2, 3));
        assert!(rect.contains(5, 7));
        assert!(!rect.contains(6, 3));
        assert!(!rect.contains(2, 8));
        assert!(!rect.contains(1, 3));
    }

    #[test]
    fn test_size_empty() {
        assert!(Size::new(0u32, 4).is_empty());
        assert!(Size::new(4u32, 0).is_empty());
        assert!(!Size::new(1u32, 1).is_empty());
        assert_eq!(Size::new(3u32, 4).area(), 12);
    }
}
