//! The resource module encapsulates the physics engine for use with Bevy.

use std::ops::{Deref, DerefMut};

use bevy::ecs::system::Resource;

use crate::domain;

#[derive(Resource)]
pub struct EngineRes(domain::PhysicsEngine);

impl Deref for EngineRes {
    type Target = domain::PhysicsEngine;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for EngineRes {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<domain::PhysicsEngine> for EngineRes {
    fn from(value: domain::PhysicsEngine) -> Self {
        Self(value)
    }
}
