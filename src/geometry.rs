//! Integer screen geometry.
//!
//! Widget placement is persisted in whole pixels, so the core state machine works on
//! `i32` points and sizes and only the egui shell converts to floating point.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// A position on screen or inside a widget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Clamps both dimensions to at least one pixel.
    pub fn at_least_one(self) -> Self {
        Self::new(self.width.max(1), self.height.max(1))
    }
}

/// An axis-aligned rectangle given by its top-left corner and size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Half-open containment: the right and bottom edges are outside.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.y >= self.y
            && point.x < self.x + self.width
            && point.y < self.y + self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_arithmetic() {
        let press = Point::new(130, 145);
        let top_left = Point::new(100, 100);
        let offset = press - top_left;
        assert_eq!(offset, Point::new(30, 45));
        assert_eq!(top_left + offset, press);
    }

    #[test]
    fn test_rect_contains_edges() {
        let rect = Rect::new(140, 140, 10, 10);
        assert!(rect.contains(Point::new(140, 140)));
        assert!(rect.contains(Point::new(149, 149)));
        assert!(!rect.contains(Point::new(150, 149)));
        assert!(!rect.contains(Point::new(139, 145)));
    }

    #[test]
    fn test_size_at_least_one() {
        assert_eq!(Size::new(0, -4).at_least_one(), Size::new(1, 1));
        assert_eq!(Size::new(20, 30).at_least_one(), Size::new(20, 30));
    }
}
