use bevy::prelude::*;


mod controller;
mod domain;
mod resource;
mod simulator;
mod visualizer;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins)
        .add_plugins(simulator::Simulator)
        .add_plugins(controller::Controller)
        .add_plugins(visualizer::Visualizer)
        .run();
}
