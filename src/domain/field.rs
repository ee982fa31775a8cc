//! Rectangular playing field centered at the origin.

use super::{HasCollision, Point, Shape, Size};

#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Field {
    size: Size,
}

impl Field {
    pub const fn new(size: Size) -> Self {
        Self { size }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn half_extents(&self) -> Point {
        self.size.half_extents()
    }

    /// Uniform world-to-screen mapping which fits the field width into the viewport minus the
    /// margin and centers the field.
    pub fn screen_transform(&self, viewport: Size, margin: f64) -> ScreenTransform {
        ScreenTransform {
            scale: (viewport.width() - margin) / self.size.width(),
            offset: viewport.half_extents(),
        }
    }
}

impl Default for Field {
    fn default() -> Self {
        Field::new(Size::new(2.4, 1.8))
    }
}

impl HasCollision for Field {
    fn shape(&self) -> Shape {
        Shape::Boundary {
            half_extents: self.half_extents(),
        }
    }
}

/// Maps world coordinates (meters, y up) to screen coordinates (pixels, y down, origin in the
/// top left corner) and back.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct ScreenTransform {
    scale: f64,
    offset: Point,
}

impl ScreenTransform {
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn to_screen(&self, position: Point) -> Point {
        Point::new(
            self.offset.x() + position.x() * self.scale,
            self.offset.y() - position.y() * self.scale,
        )
    }

    pub fn to_world(&self, position: Point) -> Point {
        Point::new(
            (position.x() - self.offset.x()) / self.scale,
            (self.offset.y() - position.y()) / self.scale,
        )
    }
}
