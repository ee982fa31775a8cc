//! Velocity-tracking wheel actuator.

use super::{basis::sign, Angle};

/// Upper bound for the wheel speed in m/s.
pub const MAX_VEL: f64 = 3.0;

#[derive(Clone, Debug, PartialEq, PartialOrd)]
pub struct Wheel {
    velocity: f64,
    target: f64,
    max_acceleration: f64,
    mount_angle: Angle,
}

impl Wheel {
    pub fn new(mount_angle: Angle, max_acceleration: f64) -> Self {
        Self {
            velocity: 0.0,
            target: 0.0,
            max_acceleration,
            mount_angle,
        }
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn mount_angle(&self) -> Angle {
        self.mount_angle
    }

    /// Sets the target speed, reached over the following updates.
    pub fn set(&mut self, target: f64) {
        self.target = target;
    }

    /// Moves the speed toward the target by at most `max_acceleration * dt` and keeps it within
    /// `±MAX_VEL`.
    pub fn update(&mut self, dt: f64) {
        let step = self.max_acceleration * dt;
        let gap = self.target - self.velocity;

        if gap.abs() > step {
            self.velocity += step * sign(gap);
        } else {
            self.velocity = self.target;
        }

        self.velocity = self.velocity.clamp(-MAX_VEL, MAX_VEL);
    }
}
