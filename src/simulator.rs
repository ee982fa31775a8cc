//! Simulation of the robots and the ball on the field.
//!
//! The physics engine advances by one tick per frame. It picks its own number of substeps, so the
//! frame rate only decides how often the state handed to the visualizer changes.

use bevy::prelude::*;

use crate::{
    domain::{EngineConfig, PhysicsEngine},
    resource::EngineRes,
};

pub struct Simulator;

impl Plugin for Simulator {
    fn build(&self, app: &mut App) {
        app.insert_resource(create_engine())
            .add_systems(Update, simulate);
    }
}

fn create_engine() -> EngineRes {
    match PhysicsEngine::new(EngineConfig::default()) {
        Ok(engine) => engine.into(),
        Err(error) => panic!("invalid simulation configuration: {error}"),
    }
}

fn simulate(mut engine: ResMut<EngineRes>) {
    engine.update();
}
