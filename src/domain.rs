//! The domain module encapsulates the physics core. It defines the `Robot`, `Ball` and `Field`
//! entities and the `PhysicsEngine` which owns them and resolves their interactions.
//!
//! The module has no dependency on the rendering or input layers, which only read the engine's
//! state and hand it steering commands.

mod ball;
mod basis;
mod collision;
mod engine;
mod field;
mod robot;
mod wheel;

pub use ball::{Ball, BallConfig};
pub use basis::{Angle, Point, PolarVector, Size};
pub use collision::{HasCollision, Shape};
pub use engine::{EngineConfig, PhysicsEngine};
pub use field::{Field, ScreenTransform};
pub use robot::{Robot, RobotConfig, RobotError, WheelID};
pub use wheel::Wheel;
