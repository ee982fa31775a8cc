//! Fixed-substep integration of all bodies on the field.
//!
//! Every tick runs a number of equally sized substeps. The number is derived from an iteration
//! rate which the engine adapts after each tick so that one tick stays within its wall-clock
//! budget.

use std::{
    f64::consts::FRAC_PI_2,
    time::{Duration, Instant},
};

use log::{debug, info, trace, warn};
use thiserror::Error;

use super::{
    Angle, Ball, BallConfig, Field, HasCollision, Point, PolarVector, Robot, RobotConfig,
    RobotError,
};

/// Factor by which the iteration rate changes after each tick.
pub const RATE_FACTOR: f64 = 1.04;

/// Index of the robot that follows steering commands.
const CONTROLLED_ROBOT: usize = 0;

pub struct PhysicsEngine {
    field: Field,
    robots: Vec<Robot>,
    ball: Ball,
    iterations_per_second: f64,
    max_iterations_per_second: f64,
    target_tick_duration: f64,
    simulation_speed: f64,
    steering: SteeringCommand,
    state: EngineState,
}

impl PhysicsEngine {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;

        let robot = Robot::new(config.robot)?;
        let engine = Self {
            field: config.field,
            robots: vec![robot],
            ball: Ball::new(&config.ball),
            iterations_per_second: config
                .iterations_per_second
                .clamp(1.0 / config.target_tick_duration, config.max_iterations_per_second),
            max_iterations_per_second: config.max_iterations_per_second,
            target_tick_duration: config.target_tick_duration,
            simulation_speed: config.simulation_speed,
            steering: SteeringCommand::default(),
            state: EngineState::Idle,
        };

        info!(
            "physics engine ready: field {:?}, tick budget {:.4} s, speed x{}, {} iterations/s",
            engine.field.size(),
            engine.target_tick_duration,
            engine.simulation_speed,
            engine.iterations_per_second
        );

        Ok(engine)
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn robots(&self) -> &[Robot] {
        &self.robots
    }

    pub fn robot(&self, index: usize) -> Result<&Robot, EngineError> {
        self.robots
            .get(index)
            .ok_or(EngineError::MissingRobot(index))
    }

    pub fn ball(&self) -> &Ball {
        &self.ball
    }

    pub fn iterations_per_second(&self) -> f64 {
        self.iterations_per_second
    }

    pub fn substeps_per_tick(&self) -> u32 {
        (self.iterations_per_second * self.target_tick_duration).round() as u32
    }

    pub fn steering(&self) -> SteeringCommand {
        self.steering
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Adds another robot and returns its index.
    pub fn add_robot(&mut self, config: RobotConfig) -> Result<usize, EngineError> {
        self.robots.push(Robot::new(config)?);
        Ok(self.robots.len() - 1)
    }

    /// Steers the controlled robot toward a point in world coordinates. The direction is measured
    /// from the y-axis, the convention `Robot::move_toward` expects.
    pub fn set_robot_target(&mut self, target: Point) {
        let Some(robot) = self.robots.get(CONTROLLED_ROBOT) else {
            return;
        };
        let delta = target - robot.position();
        let direction = if delta.length() == 0.0 {
            Angle::new(0.0)
        } else {
            Angle::new(delta.x().atan2(delta.y()))
        };

        self.steering = SteeringCommand {
            speed: delta.length(),
            direction,
        };
        debug!("steering toward {target:?}: {:?}", self.steering);
    }

    /// Moves the controlled robot to `position` and `heading` and cancels the steering command.
    /// The wheels then spin down with their usual acceleration.
    pub fn place_robot(&mut self, position: Point, heading: Angle) {
        let Some(robot) = self.robots.get_mut(CONTROLLED_ROBOT) else {
            return;
        };
        robot.set_position(position);
        robot.set_heading(heading);
        robot.set_wheel_targets([0.0; 4]);
        self.steering = SteeringCommand::default();
        debug!("robot placed at {position:?} heading {heading:?}");
    }

    /// Puts the ball at `position` with the given velocity.
    pub fn kick_off(&mut self, position: Point, velocity: PolarVector) {
        self.ball.set_position(position);
        self.ball.set_velocity(velocity);
        debug!("kick-off at {position:?} with {velocity:?}");
    }

    /// Advances the simulation by one tick and adapts the iteration rate to the time it took.
    pub fn update(&mut self) {
        let started = Instant::now();
        self.tick();
        self.balance(started.elapsed());
    }

    /// Runs the substeps of one tick, then applies the current steering command.
    pub fn tick(&mut self) {
        self.state = EngineState::Running;

        let dt = self.simulation_speed / self.iterations_per_second;
        for _ in 0..self.substeps_per_tick() {
            self.substep(dt);
        }

        let steering = self.steering;
        if let Some(robot) = self.robots.get_mut(CONTROLLED_ROBOT) {
            robot.move_toward(steering.speed, steering.direction, Angle::new(0.0));
        }
    }

    /// Lowers the iteration rate after a tick that exceeded its budget and raises it otherwise.
    /// The rate never drops below one substep per tick.
    pub fn balance(&mut self, elapsed: Duration) {
        let floor = 1.0 / self.target_tick_duration;

        if elapsed.as_secs_f64() > self.target_tick_duration {
            self.iterations_per_second /= RATE_FACTOR;
        } else {
            self.iterations_per_second *= RATE_FACTOR;
        }

        if self.iterations_per_second < floor {
            if self.iterations_per_second * RATE_FACTOR > floor {
                warn!(
                    "tick took {:?}, running a single substep per tick",
                    elapsed
                );
            }
            self.iterations_per_second = floor;
        }
        self.iterations_per_second = self.iterations_per_second.min(self.max_iterations_per_second);

        trace!(
            "tick took {:?}, now {:.1} iterations/s",
            elapsed,
            self.iterations_per_second
        );
    }

    fn substep(&mut self, dt: f64) {
        for i in 0..self.robots.len() {
            self.robots[i].integrate_heading(dt);

            if let Some(walls) = self.field.touch(&self.robots[i]) {
                trace!("robot {i} touches walls {walls:?}");
                let velocity = slide(self.robots[i].velocity(), &walls);
                self.robots[i].set_velocity(velocity);
            }

            let neighbours = self
                .robots
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .filter_map(|(_, other)| self.robots[i].touch(other))
                .flatten()
                .collect::<Vec<_>>();
            if !neighbours.is_empty() {
                let velocity = slide(self.robots[i].velocity(), &neighbours);
                self.robots[i].set_velocity(velocity);
            }

            let robot = &self.robots[i];
            if let Some(normals) = robot.touch(&self.ball) {
                let normal = normals[0];
                let relative = self.ball.velocity() - robot.velocity();
                if relative.direction().delta(normal) > FRAC_PI_2 {
                    trace!("robot {i} hits the ball");
                    let velocity = relative.mirror_reflect(normal + FRAC_PI_2)
                        * self.ball.restitution()
                        + robot.velocity().project_onto(normal);
                    self.ball.set_velocity(velocity);
                }
            }

            self.robots[i].advance(dt);
        }

        if let Some(walls) = self.field.touch(&self.ball) {
            trace!("ball touches walls {walls:?}");
            let velocity = bounce(self.ball.velocity(), &walls, self.ball.restitution());
            self.ball.set_velocity(velocity);
        }
        self.ball.update(dt);
    }
}

/// Removes the velocity component pointing through any of the given wall normals.
fn slide(velocity: PolarVector, normals: &[Angle]) -> PolarVector {
    normals.iter().fold(velocity, |velocity, normal| {
        if velocity.direction().delta(*normal) < FRAC_PI_2 {
            velocity.project_onto(*normal + FRAC_PI_2)
        } else {
            velocity
        }
    })
}

/// Mirrors the velocity off every wall it is heading into, losing energy on each.
fn bounce(velocity: PolarVector, normals: &[Angle], restitution: f64) -> PolarVector {
    normals.iter().fold(velocity, |velocity, normal| {
        if velocity.direction().delta(*normal) < FRAC_PI_2 {
            velocity.mirror_reflect(*normal + FRAC_PI_2) * restitution
        } else {
            velocity
        }
    })
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum EngineState {
    #[default]
    Idle,
    Running,
}

/// Desired speed and direction of the controlled robot, direction measured from the y-axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct SteeringCommand {
    pub speed: f64,
    pub direction: Angle,
}

#[derive(Error, Debug, PartialEq)]
pub enum EngineError {
    #[error("target tick duration must be positive and finite, got {0}")]
    InvalidTickDuration(f64),
    #[error("simulation speed must be positive and finite, got {0}")]
    InvalidSimulationSpeed(f64),
    #[error("invalid iteration rate {0}")]
    InvalidIterationRate(f64),
    #[error("ball restitution must be within [0, 1], got {0}")]
    InvalidRestitution(f64),
    #[error("ball friction must not be negative, got {0}")]
    NegativeFriction(f64),
    #[error("ball radius must be positive, got {0}")]
    InvalidBallRadius(f64),
    #[error("missing robot {0}")]
    MissingRobot(usize),
    #[error(transparent)]
    Robot(#[from] RobotError),
}

#[derive(Clone, Debug, PartialEq, PartialOrd)]
pub struct EngineConfig {
    /// Wall-clock budget of one tick in seconds.
    pub target_tick_duration: f64,
    pub simulation_speed: f64,
    pub iterations_per_second: f64,
    pub max_iterations_per_second: f64,
    pub field: Field,
    pub robot: RobotConfig,
    pub ball: BallConfig,
}

impl EngineConfig {
    pub fn new(target_tick_duration: f64, simulation_speed: f64) -> Self {
        Self {
            target_tick_duration,
            simulation_speed,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.target_tick_duration > 0.0 && self.target_tick_duration.is_finite()) {
            return Err(EngineError::InvalidTickDuration(self.target_tick_duration));
        }
        if !(self.simulation_speed > 0.0 && self.simulation_speed.is_finite()) {
            return Err(EngineError::InvalidSimulationSpeed(self.simulation_speed));
        }
        if !(self.iterations_per_second > 0.0 && self.iterations_per_second.is_finite()) {
            return Err(EngineError::InvalidIterationRate(self.iterations_per_second));
        }
        if !(self.max_iterations_per_second >= 1.0 / self.target_tick_duration) {
            return Err(EngineError::InvalidIterationRate(
                self.max_iterations_per_second,
            ));
        }
        if !(0.0..=1.0).contains(&self.ball.restitution) {
            return Err(EngineError::InvalidRestitution(self.ball.restitution));
        }
        if !(self.ball.friction >= 0.0) {
            return Err(EngineError::NegativeFriction(self.ball.friction));
        }
        if !(self.ball.radius > 0.0) {
            return Err(EngineError::InvalidBallRadius(self.ball.radius));
        }
        self.robot.validate()?;
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            target_tick_duration: 1.0 / 60.0,
            simulation_speed: 1.0,
            iterations_per_second: 1000.0,
            max_iterations_per_second: 10_000.0,
            field: Field::default(),
            robot: RobotConfig::default(),
            ball: BallConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::tests::{fixed_rate_config, ramp_wheels};

    const EPSILON: f64 = 1e-9;

    /// Speed of a robot driving straight after its wheels reached a target speed of 1.
    fn cruise_speed() -> f64 {
        2.0 * 2.0_f64.sqrt() - 4.0 * crate::domain::robot::FRICTION_LIMIT
    }

    fn engine_with_ball(position: Point, velocity: PolarVector, restitution: f64) -> PhysicsEngine {
        let mut config = fixed_rate_config();
        config.ball = BallConfig::new(0.035, restitution, 0.0, position);
        let mut engine = PhysicsEngine::new(config).unwrap();
        engine.kick_off(position, velocity);
        engine
    }

    #[rstest]
    #[case::zero_speed(         EngineConfig::new(1.0 / 60.0, 0.0),     EngineError::InvalidSimulationSpeed(0.0) )]
    #[case::negative_speed(     EngineConfig::new(1.0 / 60.0, -1.0),    EngineError::InvalidSimulationSpeed(-1.0))]
    #[case::zero_tick(          EngineConfig::new(0.0, 1.0),            EngineError::InvalidTickDuration(0.0)    )]
    #[case::infinite_tick(      EngineConfig::new(f64::INFINITY, 1.0),  EngineError::InvalidTickDuration(f64::INFINITY))]
    fn test_engine_rejects_invalid_config(
        #[case] config: EngineConfig,
        #[case] error: EngineError,
    ) {
        assert_eq!(PhysicsEngine::new(config).err(), Some(error));
    }

    #[test]
    fn test_engine_rejects_invalid_bodies() {
        let mut config = EngineConfig::default();
        config.ball.restitution = 1.5;
        assert_eq!(
            PhysicsEngine::new(config).err(),
            Some(EngineError::InvalidRestitution(1.5))
        );

        let mut config = EngineConfig::default();
        config.robot.body_radius = 0.0;
        let error = PhysicsEngine::new(config).err().unwrap();
        assert_eq!(error, EngineError::Robot(RobotError::NonPositiveBodyRadius(0.0)));
        assert_eq!(error.to_string(), "body radius must be positive, got 0");
    }

    #[test]
    fn test_engine_starts_idle() {
        let mut engine = PhysicsEngine::new(fixed_rate_config()).unwrap();
        assert_eq!(engine.state(), EngineState::Idle);
        assert_eq!(engine.robots().len(), 1);
        engine.tick();
        assert_eq!(engine.state(), EngineState::Running);
    }

    #[test]
    fn test_engine_update_adapts_rate() {
        let mut engine = PhysicsEngine::new(EngineConfig::default()).unwrap();
        let before = engine.iterations_per_second();
        engine.update();
        let after = engine.iterations_per_second();
        assert_eq!(engine.state(), EngineState::Running);
        assert!(
            (after - before * RATE_FACTOR).abs() < EPSILON
                || (after - before / RATE_FACTOR).abs() < EPSILON
        );
    }

    #[rstest]
    #[case(1000.0, 0.001, 1)]
    #[case(1000.0, 1.0 / 60.0, 17)]
    #[case(2500.0, 0.01, 25)]
    fn test_engine_substeps_per_tick(
        #[case] iterations_per_second: f64,
        #[case] target_tick_duration: f64,
        #[case] expected: u32,
    ) {
        let mut config = EngineConfig::new(target_tick_duration, 1.0);
        config.iterations_per_second = iterations_per_second;
        let engine = PhysicsEngine::new(config).unwrap();
        assert_eq!(engine.substeps_per_tick(), expected);
    }

    #[test]
    fn test_engine_slows_down_when_over_budget() {
        let mut engine = PhysicsEngine::new(EngineConfig::default()).unwrap();
        let floor = 1.0 / EngineConfig::default().target_tick_duration;
        let mut rate = engine.iterations_per_second();

        for _ in 0..200 {
            engine.balance(Duration::from_millis(40));
            let next = engine.iterations_per_second();
            assert!(next >= floor - EPSILON);
            if rate > floor * RATE_FACTOR {
                assert_abs_diff_eq!(next, rate / RATE_FACTOR, epsilon = EPSILON);
            }
            assert!(next < rate || next == floor);
            rate = next;
        }
        assert_abs_diff_eq!(rate, floor, epsilon = EPSILON);
        assert_eq!(engine.substeps_per_tick(), 1);
    }

    #[test]
    fn test_engine_speeds_up_within_budget() {
        let mut engine = PhysicsEngine::new(EngineConfig::default()).unwrap();
        engine.balance(Duration::from_millis(1));
        assert_abs_diff_eq!(engine.iterations_per_second(), 1040.0, epsilon = EPSILON);

        for _ in 0..500 {
            engine.balance(Duration::ZERO);
        }
        assert_abs_diff_eq!(engine.iterations_per_second(), 10_000.0);
    }

    #[test]
    fn test_engine_no_drift_without_input() {
        let mut config = fixed_rate_config();
        config.ball.position = Point::new(0.8, 0.5);
        let mut engine = PhysicsEngine::new(config).unwrap();

        for _ in 0..1000 {
            engine.tick();
        }

        let robot = engine.robot(0).unwrap();
        assert_eq!(robot.position(), Point::ZERO);
        assert_eq!(robot.heading(), Angle::new(0.0));
        assert_eq!(engine.ball().position(), Point::new(0.8, 0.5));
    }

    #[test]
    fn test_engine_ball_at_rest_stays() {
        let mut engine = engine_with_ball(Point::new(-0.6, 0.2), PolarVector::ZERO, 0.4);
        for _ in 0..500 {
            engine.tick();
        }
        assert_eq!(engine.ball().position(), Point::new(-0.6, 0.2));
    }

    #[test]
    fn test_engine_ball_bounces_off_wall() {
        let mut engine = engine_with_ball(
            Point::new(1.17, 0.0),
            PolarVector::new(1.0, Angle::new(0.0)),
            0.7,
        );
        engine.tick();
        assert_abs_diff_eq!(
            engine.ball().velocity().to_point(),
            Point::new(-0.7, 0.0),
            epsilon = EPSILON
        );
    }

    #[test]
    fn test_engine_ball_bounce_keeps_tangential_direction() {
        let mut engine = engine_with_ball(
            Point::new(0.0, -0.87),
            Point::new(0.5, -1.0).to_polar(),
            0.7,
        );
        engine.tick();
        assert_abs_diff_eq!(
            engine.ball().velocity().to_point(),
            Point::new(0.35, 0.7),
            epsilon = EPSILON
        );
    }

    #[test]
    fn test_engine_ball_leaving_wall_is_not_reflected() {
        let mut engine = engine_with_ball(
            Point::new(1.17, 0.0),
            PolarVector::new(1.0, Angle::new(PI)),
            0.7,
        );
        engine.tick();
        assert_abs_diff_eq!(
            engine.ball().velocity(),
            PolarVector::new(1.0, Angle::new(PI)),
            epsilon = EPSILON
        );
    }

    #[test]
    fn test_engine_robot_slides_along_wall() {
        let mut engine = PhysicsEngine::new(fixed_rate_config()).unwrap();
        engine.robots[0].set_position(Point::new(1.1, 0.0));
        engine.robots[0].move_toward(1.0, Angle::new(0.25 * PI), Angle::new(0.0));
        ramp_wheels(&mut engine.robots[0]);

        engine.tick();

        let robot = engine.robot(0).unwrap();
        assert_abs_diff_eq!(
            robot.velocity().direction(),
            Angle::new(0.5 * PI),
            epsilon = EPSILON
        );
        assert_abs_diff_eq!(
            robot.velocity().magnitude(),
            cruise_speed() / 2.0_f64.sqrt(),
            epsilon = EPSILON
        );
        assert_abs_diff_eq!(robot.position().x(), 1.1, epsilon = EPSILON);
    }

    #[test]
    fn test_engine_robot_stops_at_wall() {
        let mut engine = PhysicsEngine::new(fixed_rate_config()).unwrap();
        engine.robots[0].set_position(Point::new(1.1, 0.0));
        engine.robots[0].move_toward(1.0, Angle::new(0.5 * PI), Angle::new(0.0));
        ramp_wheels(&mut engine.robots[0]);

        engine.tick();

        let robot = engine.robot(0).unwrap();
        assert_abs_diff_eq!(robot.velocity().magnitude(), 0.0, epsilon = EPSILON);
        assert_abs_diff_eq!(robot.position(), Point::new(1.1, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_engine_robots_do_not_push_through_each_other() {
        let mut engine = PhysicsEngine::new(fixed_rate_config()).unwrap();
        let mut other = RobotConfig::default();
        other.position = Point::new(0.22, 0.0);
        assert_eq!(engine.add_robot(other), Ok(1));

        engine.robots[0].move_toward(1.0, Angle::new(0.5 * PI), Angle::new(0.0));
        ramp_wheels(&mut engine.robots[0]);
        engine.tick();

        assert_abs_diff_eq!(engine.robots()[0].velocity().magnitude(), 0.0, epsilon = EPSILON);
        assert_abs_diff_eq!(engine.robots()[1].position(), Point::new(0.22, 0.0));
    }

    #[test]
    fn test_engine_ball_bounces_off_resting_robot() {
        let mut engine = engine_with_ball(
            Point::new(0.14, 0.0),
            PolarVector::new(1.0, Angle::new(PI)),
            0.4,
        );
        engine.tick();
        assert_abs_diff_eq!(
            engine.ball().velocity(),
            PolarVector::new(0.4, Angle::new(0.0)),
            epsilon = EPSILON
        );
    }

    #[test]
    fn test_engine_ball_leaving_robot_is_not_reflected() {
        let mut engine = engine_with_ball(
            Point::new(0.14, 0.0),
            PolarVector::new(1.0, Angle::new(0.0)),
            0.4,
        );
        engine.tick();
        assert_abs_diff_eq!(
            engine.ball().velocity(),
            PolarVector::new(1.0, Angle::new(0.0)),
            epsilon = EPSILON
        );
        assert_abs_diff_eq!(engine.ball().position(), Point::new(0.141, 0.0), epsilon = EPSILON);
        assert_eq!(engine.robot(0).unwrap().position(), Point::ZERO);
    }

    #[test]
    fn test_engine_robot_pushes_ball() {
        let mut engine = engine_with_ball(Point::new(0.14, 0.0), PolarVector::ZERO, 0.4);
        engine.robots[0].move_toward(1.0, Angle::new(0.5 * PI), Angle::new(0.0));
        ramp_wheels(&mut engine.robots[0]);

        engine.tick();

        assert_abs_diff_eq!(
            engine.ball().velocity(),
            PolarVector::new(1.4 * cruise_speed(), Angle::new(0.0)),
            epsilon = EPSILON
        );
    }

    #[rstest]
    #[case::ahead(    Point::new(0.0, 1.0),  1.0, 0.0      )]
    #[case::right(    Point::new(2.0, 0.0),  2.0, 0.5 * PI )]
    #[case::behind(   Point::new(0.0, -0.5), 0.5, PI       )]
    #[case::on_robot( Point::new(0.0, 0.0),  0.0, 0.0      )]
    fn test_engine_set_robot_target(
        #[case] target: Point,
        #[case] speed: f64,
        #[case] direction: f64,
    ) {
        let mut engine = PhysicsEngine::new(fixed_rate_config()).unwrap();
        engine.set_robot_target(target);
        let steering = engine.steering();
        assert_abs_diff_eq!(steering.speed, speed, epsilon = EPSILON);
        assert_abs_diff_eq!(steering.direction, Angle::new(direction), epsilon = EPSILON);
    }

    #[test]
    fn test_engine_applies_steering_after_substeps() {
        let mut engine = PhysicsEngine::new(fixed_rate_config()).unwrap();
        engine.set_robot_target(Point::new(0.0, 1.0));
        engine.tick();

        let robot = engine.robot(0).unwrap();
        let targets = robot.wheels().clone().map(|wheel| wheel.target());
        for (target, expected) in targets.into_iter().zip([1.0, 1.0, -1.0, -1.0]) {
            assert_abs_diff_eq!(target, expected, epsilon = EPSILON);
        }
        assert_eq!(robot.position(), Point::ZERO);
    }

    #[test]
    fn test_engine_place_robot() {
        let mut engine = PhysicsEngine::new(fixed_rate_config()).unwrap();
        engine.set_robot_target(Point::new(0.5, 0.5));
        engine.tick();
        engine.place_robot(Point::new(-0.4, 0.3), Angle::new(1.0));

        assert_eq!(engine.steering(), SteeringCommand::default());
        let robot = engine.robot(0).unwrap();
        assert_eq!(robot.position(), Point::new(-0.4, 0.3));
        assert_eq!(robot.heading(), Angle::new(1.0));
        for wheel in robot.wheels() {
            assert_eq!(wheel.target(), 0.0);
        }
    }

    #[test]
    fn test_engine_missing_robot() {
        let engine = PhysicsEngine::new(fixed_rate_config()).unwrap();
        assert_eq!(engine.robot(3).err(), Some(EngineError::MissingRobot(3)));
    }
}
