//! Omnidirectional robot with four wheels mounted around a circular body.

use std::{
    f64::consts::{FRAC_PI_2, FRAC_PI_4},
    slice::Iter,
};

use nalgebra::{Matrix2x4, Vector2, Vector4};
use thiserror::Error;

use super::{basis::sign, Angle, HasCollision, Point, PolarVector, Shape, Wheel};

/// Largest per-wheel deviation from the common motion that still transmits to the body.
pub const FRICTION_LIMIT: f64 = 0.05;
pub const MAX_MOVE_SPEED: f64 = 2.0;
pub const HEADING_GAIN: f64 = 5.0;
pub const MAX_HEADING_CORRECTION: f64 = 0.3;

#[derive(Clone, Debug, PartialEq, PartialOrd)]
pub struct Robot {
    position: Point,
    heading: Angle,
    velocity: PolarVector,
    wheels: [Wheel; 4],
    config: RobotConfig,
}

impl Robot {
    pub fn new(config: RobotConfig) -> Result<Self, RobotError> {
        config.validate()?;

        let mount_angles = config.layout.mount_angles();
        Ok(Self {
            position: config.position,
            heading: config.heading,
            velocity: PolarVector::ZERO,
            wheels: mount_angles.map(|angle| Wheel::new(angle, config.max_wheel_acceleration)),
            config,
        })
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn heading(&self) -> Angle {
        self.heading
    }

    /// Velocity in the world frame as of the last integration step.
    pub fn velocity(&self) -> PolarVector {
        self.velocity
    }

    pub fn body_radius(&self) -> f64 {
        self.config.body_radius
    }

    pub fn wheel(&self, wheel_id: WheelID) -> &Wheel {
        &self.wheels[wheel_id as usize]
    }

    pub fn wheels(&self) -> &[Wheel; 4] {
        &self.wheels
    }

    pub fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    pub fn set_heading(&mut self, heading: Angle) {
        self.heading = heading;
    }

    pub fn set_velocity(&mut self, velocity: PolarVector) {
        self.velocity = velocity;
    }

    /// Assigns all four wheel targets at once, ordered as `WheelID::iter()`.
    pub fn set_wheel_targets(&mut self, targets: [f64; 4]) {
        for (wheel, target) in self.wheels.iter_mut().zip(targets) {
            wheel.set(target);
        }
    }

    /// Body angular velocity. Wheel deviations from the mean speed are limited by friction, and
    /// a deviation that would reverse the direction of rotation stops it instead.
    pub fn angular_velocity(&self) -> f64 {
        let mean = self.wheels.iter().map(Wheel::velocity).sum::<f64>() / self.wheels.len() as f64;
        let deviation = self
            .wheels
            .iter()
            .map(|wheel| (wheel.velocity() - mean).clamp(-FRICTION_LIMIT, FRICTION_LIMIT))
            .sum::<f64>();

        if sign(mean + deviation) != sign(mean) {
            0.0
        } else {
            (mean + deviation) / self.config.wheel_mount_radius
        }
    }

    /// Body linear velocity. The part of the wheel speeds that disagrees with a common
    /// translation is subtracted from the naive sum, but only up to the friction limit of all
    /// four wheels.
    pub fn linear_velocity(&self) -> BodyVelocity {
        let axes = Matrix2x4::from_columns(&self.wheels.clone().map(|wheel| {
            let axis = wheel.mount_angle().unit_vector();
            Vector2::new(axis.x(), axis.y())
        }));
        let speeds = Vector4::from_iterator(self.wheels.iter().map(Wheel::velocity));

        let combined = axes * speeds;
        let combined = Point::new(combined.x, combined.y);
        let frictionless = combined.to_polar();

        let residual_speeds = Vector4::from_iterator(self.wheels.iter().map(|wheel| {
            (frictionless.direction() - wheel.mount_angle()).radians().cos()
                * frictionless.magnitude()
                - wheel.velocity()
        }));
        let residual = axes * residual_speeds;
        let residual = Point::new(residual.x, residual.y).to_polar();
        let residual = residual.with_magnitude(residual.magnitude().min(4.0 * FRICTION_LIMIT));

        BodyVelocity((combined - residual.to_point()).to_polar())
    }

    /// Closed-loop steering toward a velocity and heading. The direction is measured from the
    /// body's y-axis, matching the `sin` wheel projection below.
    pub fn move_toward(
        &mut self,
        target_speed: f64,
        target_direction: Angle,
        target_heading: Angle,
    ) {
        let speed = target_speed.clamp(-MAX_MOVE_SPEED, MAX_MOVE_SPEED);

        let mut folded = target_direction.normalize_01().radians();
        while folded >= FRAC_PI_2 {
            folded -= FRAC_PI_2;
        }
        if folded > FRAC_PI_4 {
            folded = FRAC_PI_2 - folded;
        }
        let speed = speed / folded.cos();

        let heading_error = (target_heading - self.heading).normalize_signed().radians();
        let correction =
            (HEADING_GAIN * heading_error).clamp(-MAX_HEADING_CORRECTION, MAX_HEADING_CORRECTION);

        let raw: [f64; 4] = std::array::from_fn(|i| {
            speed
                * (self.wheels[i].mount_angle() + target_direction - self.heading)
                    .radians()
                    .sin()
        });
        let peak = raw.iter().fold(0.0_f64, |peak, value| peak.max(value.abs()));
        let scale = if peak > 0.0 { speed.abs() / peak } else { 0.0 };

        self.set_wheel_targets(raw.map(|value| value * scale + correction));
    }

    /// Integrates the heading and refreshes the world velocity from the wheel speeds.
    pub fn integrate_heading(&mut self, dt: f64) {
        self.heading = (self.heading + self.angular_velocity() * dt).normalize_01();
        self.velocity = self.linear_velocity().to_world(self.heading);
    }

    /// Moves along the current velocity and lets the wheels track their targets.
    pub fn advance(&mut self, dt: f64) {
        self.position = self.position + self.velocity.to_point() * dt;
        for wheel in self.wheels.iter_mut() {
            wheel.update(dt);
        }
    }
}

impl HasCollision for Robot {
    fn shape(&self) -> Shape {
        Shape::Circle {
            position: self.position,
            radius: self.config.body_radius,
        }
    }
}

/// Velocity in the robot's own frame, with the x-axis pointing along the heading.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct BodyVelocity(PolarVector);

impl BodyVelocity {
    pub fn to_world(self, heading: Angle) -> PolarVector {
        self.0.rotated(heading)
    }

    pub fn magnitude(&self) -> f64 {
        self.0.magnitude()
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum RobotError {
    #[error("invalid wheel id {0}")]
    InvalidWheelID(usize),
    #[error("body radius must be positive, got {0}")]
    NonPositiveBodyRadius(f64),
    #[error("wheel mount radius must be positive, got {0}")]
    NonPositiveMountRadius(f64),
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd)]
pub enum WheelLayout {
    /// Wheels at 45°, 135°, 225° and 315°.
    #[default]
    Square,
    /// Like `Square`, with the front right wheel at 310°.
    Skewed,
}

impl WheelLayout {
    pub fn mount_angles(self) -> [Angle; 4] {
        let front_right = match self {
            WheelLayout::Square => 315.0,
            WheelLayout::Skewed => 310.0,
        };
        [45.0, 135.0, 225.0, front_right].map(Angle::from_deg)
    }
}

/// Distances in meters, mass in kilograms. The robot's front faces the positive x-axis of its
/// own frame.
#[derive(Clone, Debug, PartialEq, PartialOrd)]
pub struct RobotConfig {
    pub body_radius: f64,
    pub wheel_mount_radius: f64,
    pub mass: f64,
    pub max_wheel_acceleration: f64,
    pub layout: WheelLayout,
    pub position: Point,
    pub heading: Angle,
}

impl RobotConfig {
    pub const fn new(
        body_radius: f64,
        wheel_mount_radius: f64,
        mass: f64,
        max_wheel_acceleration: f64,
        layout: WheelLayout,
        position: Point,
        heading: Angle,
    ) -> Self {
        RobotConfig {
            body_radius,
            wheel_mount_radius,
            mass,
            max_wheel_acceleration,
            layout,
            position,
            heading,
        }
    }

    pub fn validate(&self) -> Result<(), RobotError> {
        if !(self.body_radius > 0.0) {
            return Err(RobotError::NonPositiveBodyRadius(self.body_radius));
        }
        if !(self.wheel_mount_radius > 0.0) {
            return Err(RobotError::NonPositiveMountRadius(self.wheel_mount_radius));
        }
        Ok(())
    }
}

impl Default for RobotConfig {
    fn default() -> Self {
        RobotConfig::new(
            0.11,
            0.08,
            2.2,
            15.0,
            WheelLayout::Square,
            Point::ZERO,
            Angle::new(0.0),
        )
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum WheelID {
    FrontLeft,
    RearLeft,
    RearRight,
    FrontRight,
}

impl WheelID {
    pub fn iter() -> Iter<'static, WheelID> {
        static WHEELS: [WheelID; 4] = [
            WheelID::FrontLeft,
            WheelID::RearLeft,
            WheelID::RearRight,
            WheelID::FrontRight,
        ];
        WHEELS.iter()
    }
}

impl TryFrom<usize> for WheelID {
    type Error = RobotError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(WheelID::FrontLeft),
            1 => Ok(WheelID::RearLeft),
            2 => Ok(WheelID::RearRight),
            3 => Ok(WheelID::FrontRight),
            _ => Err(RobotError::InvalidWheelID(value)),
        }
    }
}
