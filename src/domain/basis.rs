//! Basic building blocks.

use std::{
    f64::consts::{PI, TAU},
    ops::{Add, Div, Mul, Neg, Sub},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Point {
    x: f64,
    y: f64,
}

impl Point {
    pub const ZERO: Point = Point::new(0.0, 0.0);

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance(&self, point: Self) -> f64 {
        (*self - point).length()
    }

    /// Direction of the vector from the origin to this point. A zero-length vector points along
    /// the positive x-axis.
    pub fn direction(&self) -> Angle {
        if self.x == 0.0 && self.y == 0.0 {
            Angle::default()
        } else {
            Angle::new(self.y.atan2(self.x))
        }
    }

    pub fn to_polar(self) -> PolarVector {
        PolarVector::new(self.length(), self.direction())
    }

    /// Per-axis `>` comparison, used for boundary tests.
    pub fn gt_per_axis(&self, other: Point) -> [bool; 2] {
        [self.x > other.x, self.y > other.y]
    }

    /// Per-axis `<` comparison, used for boundary tests.
    pub fn lt_per_axis(&self, other: Point) -> [bool; 2] {
        [self.x < other.x, self.y < other.y]
    }
}

impl From<Point> for (f32, f32) {
    fn from(value: Point) -> Self {
        (value.x as f32, value.y as f32)
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl Add<f64> for Point {
    type Output = Point;

    fn add(self, rhs: f64) -> Self::Output {
        Self {
            x: self.x + rhs,
            y: self.y + rhs,
        }
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Self) -> Self::Output {
        self + (-rhs)
    }
}

impl Sub<f64> for Point {
    type Output = Point;

    fn sub(self, rhs: f64) -> Self::Output {
        self + (-rhs)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Self::Output {
        Self {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

impl Div<f64> for Point {
    type Output = Point;

    fn div(self, rhs: f64) -> Self::Output {
        Self {
            x: self.x / rhs,
            y: self.y / rhs,
        }
    }
}

impl Neg for Point {
    type Output = Point;

    fn neg(self) -> Self::Output {
        Self {
            x: -self.x,
            y: -self.y,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Size {
    width: f64,
    height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn half_extents(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Angle in radians. Arithmetic keeps the raw value, normalization happens on demand.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Angle(f64);

impl Angle {
    pub const fn new(radians: f64) -> Self {
        Self(radians)
    }

    pub fn from_deg(degree: f64) -> Self {
        Self(degree * PI / 180.0)
    }

    pub fn to_deg(self) -> f64 {
        self.normalize_01().0 * (180.0 / PI)
    }

    pub fn radians(self) -> f64 {
        self.0
    }

    /// Reduces the angle into `[0, 2π)`.
    pub fn normalize_01(self) -> Angle {
        let wrapped = self.0.rem_euclid(TAU);
        // rem_euclid rounds tiny negative inputs up to exactly 2π
        Angle(if wrapped >= TAU { 0.0 } else { wrapped })
    }

    /// Reduces the angle into `(-π, π]`.
    pub fn normalize_signed(self) -> Angle {
        let wrapped = self.normalize_01().0;
        Angle(if wrapped > PI { wrapped - TAU } else { wrapped })
    }

    /// Smallest unsigned separation between two angles, in `[0, π]`.
    pub fn delta(self, other: Angle) -> f64 {
        let difference = (self.normalize_01().0 - other.normalize_01().0).abs();
        if difference < PI {
            difference
        } else {
            TAU - difference
        }
    }

    pub fn unit_vector(self) -> Point {
        let (sin, cos) = self.0.sin_cos();
        Point::new(cos, sin)
    }
}

impl Neg for Angle {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Angle(-self.0)
    }
}

impl Add for Angle {
    type Output = Angle;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Add<f64> for Angle {
    type Output = Angle;

    fn add(self, rhs: f64) -> Self::Output {
        Self(self.0 + rhs)
    }
}

impl Sub for Angle {
    type Output = Angle;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

/// Velocity in polar form. The magnitude is never negative.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct PolarVector {
    magnitude: f64,
    direction: Angle,
}

impl PolarVector {
    pub const ZERO: PolarVector = PolarVector {
        magnitude: 0.0,
        direction: Angle::new(0.0),
    };

    /// A negative magnitude is folded into the opposite direction.
    pub fn new(magnitude: f64, direction: Angle) -> Self {
        if magnitude < 0.0 {
            Self {
                magnitude: -magnitude,
                direction: (direction + PI).normalize_01(),
            }
        } else {
            Self {
                magnitude,
                direction,
            }
        }
    }

    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    pub fn direction(&self) -> Angle {
        self.direction
    }

    pub fn with_magnitude(&self, magnitude: f64) -> Self {
        Self::new(magnitude, self.direction)
    }

    pub fn rotated(&self, angle: Angle) -> Self {
        Self {
            magnitude: self.magnitude,
            direction: (self.direction + angle).normalize_01(),
        }
    }

    pub fn to_point(self) -> Point {
        self.direction.unit_vector() * self.magnitude
    }

    /// Signed projection onto the axis at `angle`. The result points along `angle` or, if the
    /// scalar projection is negative, along `angle + π`.
    pub fn project_onto(&self, angle: Angle) -> PolarVector {
        let size = (angle - self.direction).0.cos() * self.magnitude;
        let direction = if size < 0.0 { angle + PI } else { angle };
        PolarVector {
            magnitude: size.abs(),
            direction: direction.normalize_01(),
        }
    }

    /// Reflection about the line at `angle`.
    pub fn mirror_reflect(&self, angle: Angle) -> PolarVector {
        PolarVector {
            magnitude: self.magnitude,
            direction: (angle + (angle - self.direction)).normalize_01(),
        }
    }
}

impl Add for PolarVector {
    type Output = PolarVector;

    fn add(self, rhs: Self) -> Self::Output {
        (self.to_point() + rhs.to_point()).to_polar()
    }
}

impl Sub for PolarVector {
    type Output = PolarVector;

    fn sub(self, rhs: Self) -> Self::Output {
        (self.to_point() - rhs.to_point()).to_polar()
    }
}

impl Mul<f64> for PolarVector {
    type Output = PolarVector;

    fn mul(self, rhs: f64) -> Self::Output {
        PolarVector::new(self.magnitude * rhs, self.direction)
    }
}

pub fn sign(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}
