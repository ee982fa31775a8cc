//! Controller steering the robot.
//!
//! Holding the left mouse button steers the robot toward the cursor. Space kicks the ball off from
//! the center spot in a random direction, R puts the robot back to the center.

use std::f64::consts::TAU;

use bevy::{prelude::*, window::PrimaryWindow};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{
    domain::{Angle, Point, PolarVector},
    resource::EngineRes,
    visualizer::screen_transform,
};

const RNG_SEED: u64 = 19878367467712;
const KICK_OFF_SPEED: f64 = 1.5;

pub struct Controller;

impl Plugin for Controller {
    fn build(&self, app: &mut App) {
        app.insert_resource(KickOffRng(ChaCha8Rng::seed_from_u64(RNG_SEED)))
            .add_systems(Update, (steer, kick_off, reset_robot));
    }
}

#[derive(Resource)]
struct KickOffRng(ChaCha8Rng);

fn steer(
    buttons: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut engine: ResMut<EngineRes>,
) {
    if !buttons.pressed(MouseButton::Left) {
        return;
    }
    let Ok(window) = windows.get_single() else {
        return;
    };
    let Some(cursor) = window.cursor_position() else {
        return;
    };

    let cursor = Point::new(cursor.x.into(), cursor.y.into());
    let target = screen_transform(window, &engine).to_world(cursor);
    engine.set_robot_target(target);
}

fn kick_off(
    keys: Res<ButtonInput<KeyCode>>,
    mut rng: ResMut<KickOffRng>,
    mut engine: ResMut<EngineRes>,
) {
    if !keys.just_pressed(KeyCode::Space) {
        return;
    }

    let direction = rng.0.random_range(0.0..TAU);
    engine.kick_off(
        Point::ZERO,
        PolarVector::new(KICK_OFF_SPEED, Angle::new(direction)),
    );
}

fn reset_robot(keys: Res<ButtonInput<KeyCode>>, mut engine: ResMut<EngineRes>) {
    if keys.just_pressed(KeyCode::KeyR) {
        engine.place_robot(Point::ZERO, Angle::new(0.0));
    }
}
