//! Free-rolling ball slowed down by linear drag.

use super::{HasCollision, Point, PolarVector, Shape};

#[derive(Clone, Debug, PartialEq, PartialOrd)]
pub struct Ball {
    position: Point,
    velocity: PolarVector,
    radius: f64,
    restitution: f64,
    friction: f64,
}

impl Ball {
    pub fn new(config: &BallConfig) -> Self {
        Self {
            position: config.position,
            velocity: PolarVector::ZERO,
            radius: config.radius,
            restitution: config.restitution,
            friction: config.friction,
        }
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn velocity(&self) -> PolarVector {
        self.velocity
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Share of the speed kept when bouncing, in `[0, 1]`.
    pub fn restitution(&self) -> f64 {
        self.restitution
    }

    pub fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    pub fn set_velocity(&mut self, velocity: PolarVector) {
        self.velocity = velocity;
    }

    /// Moves along the velocity, then lets friction take off speed without changing direction.
    pub fn update(&mut self, dt: f64) {
        self.position = self.position + self.velocity.to_point() * dt;
        self.velocity = self
            .velocity
            .with_magnitude((self.velocity.magnitude() - self.friction * dt).max(0.0));
    }
}

impl HasCollision for Ball {
    fn shape(&self) -> Shape {
        Shape::Circle {
            position: self.position,
            radius: self.radius,
        }
    }
}

/// Radius in meters, friction as deceleration in m/s².
#[derive(Clone, Debug, PartialEq, PartialOrd)]
pub struct BallConfig {
    pub radius: f64,
    pub restitution: f64,
    pub friction: f64,
    pub position: Point,
}

impl BallConfig {
    pub const fn new(radius: f64, restitution: f64, friction: f64, position: Point) -> Self {
        Self {
            radius,
            restitution,
            friction,
            position,
        }
    }
}

impl Default for BallConfig {
    fn default() -> Self {
        BallConfig::new(0.035, 0.4, 0.03, Point::new(0.5, 0.0))
    }
}
