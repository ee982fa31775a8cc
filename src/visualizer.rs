//! 2D visualization of the field, the robots and the ball.

use bevy::{prelude::*, window::PrimaryWindow};

use crate::{
    domain::{Point, Robot, ScreenTransform, Size, WheelID},
    resource::EngineRes,
};

/// Space in pixels kept free around the field.
const MARGIN: f64 = 40.0;

const LINE_COLOR: Color = Color::rgb(0.9, 0.9, 0.9);
const ROBOT_COLOR: Color = Color::rgb(0.15, 0.25, 0.8);
const BALL_COLOR: Color = Color::rgb(1.0, 0.55, 0.0);

pub struct Visualizer;

impl Plugin for Visualizer {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, set_up)
            .add_systems(
                Update,
                (update_text, handle_keyboard_input, draw_field, draw_bodies),
            )
            .insert_resource(ClearColor(Color::rgb(0.13, 0.45, 0.2)))
            .insert_resource(Scene { show_text: true });
    }
}

#[derive(Resource)]
struct Scene {
    show_text: bool,
}

/// Maps the field into the window, using the window's logical size as viewport.
pub fn screen_transform(window: &Window, engine: &EngineRes) -> ScreenTransform {
    engine.field().screen_transform(
        Size::new(window.width().into(), window.height().into()),
        MARGIN,
    )
}

fn set_up(mut commands: Commands) {
    commands.spawn(Camera2dBundle::default());
    create_text(&mut commands);
}

fn create_text(commands: &mut Commands) {
    let text_style = TextStyle {
        font_size: 18.0,
        color: LINE_COLOR,
        ..default()
    };
    commands.spawn(
        TextBundle::from_sections(vec![TextSection::new("", text_style)]).with_style(Style {
            position_type: PositionType::Absolute,
            bottom: Val::Px(8.0),
            left: Val::Px(12.0),
            ..default()
        }),
    );
}

fn draw_field(
    windows: Query<&Window, With<PrimaryWindow>>,
    engine: Res<EngineRes>,
    mut gizmos: Gizmos,
) {
    let Ok(window) = windows.get_single() else {
        return;
    };
    let transform = screen_transform(window, &engine);
    let half_extents = engine.field().half_extents();
    let size = Vec2::new(
        (engine.field().size().width() * transform.scale()) as f32,
        (engine.field().size().height() * transform.scale()) as f32,
    );
    let center = to_bevy_position(window, transform.to_screen(Point::ZERO));

    gizmos.rect_2d(center, 0.0, size, LINE_COLOR);
    gizmos.line_2d(
        to_bevy_position(window, transform.to_screen(Point::new(0.0, half_extents.y()))),
        to_bevy_position(window, transform.to_screen(Point::new(0.0, -half_extents.y()))),
        LINE_COLOR,
    );
    gizmos
        .circle_2d(center, (0.25 * transform.scale()) as f32, LINE_COLOR)
        .segments(48);
}

fn draw_bodies(
    windows: Query<&Window, With<PrimaryWindow>>,
    engine: Res<EngineRes>,
    mut gizmos: Gizmos,
) {
    let Ok(window) = windows.get_single() else {
        return;
    };
    let transform = screen_transform(window, &engine);

    for robot in engine.robots() {
        draw_robot(robot, window, &transform, &mut gizmos);
    }

    let ball = engine.ball();
    gizmos
        .circle_2d(
            to_bevy_position(window, transform.to_screen(ball.position())),
            (ball.radius() * transform.scale()) as f32,
            BALL_COLOR,
        )
        .segments(24);
}

fn draw_robot(robot: &Robot, window: &Window, transform: &ScreenTransform, gizmos: &mut Gizmos) {
    let center = robot.position();
    let radius = robot.body_radius();

    gizmos
        .circle_2d(
            to_bevy_position(window, transform.to_screen(center)),
            (radius * transform.scale()) as f32,
            ROBOT_COLOR,
        )
        .segments(32);
    gizmos.line_2d(
        to_bevy_position(window, transform.to_screen(center)),
        to_bevy_position(
            window,
            transform.to_screen(center + robot.heading().unit_vector() * radius),
        ),
        LINE_COLOR,
    );

    for wheel_id in WheelID::iter() {
        let mount_angle = robot.wheel(*wheel_id).mount_angle();
        let mount = center + (robot.heading() + mount_angle).unit_vector() * radius;
        gizmos.circle_2d(
            to_bevy_position(window, transform.to_screen(mount)),
            3.0,
            LINE_COLOR,
        );
    }
}

fn update_text(mut text: Query<&mut Text>, scene: Res<Scene>, engine: Res<EngineRes>) {
    let mut text = text.single_mut();
    if scene.show_text {
        let Some(robot) = engine.robots().first() else {
            text.sections[0].value = String::new();
            return;
        };
        let heading = robot.heading().to_deg();
        let speed = robot.velocity().magnitude();
        let vel_front_left = robot.wheel(WheelID::FrontLeft).velocity();
        let vel_front_right = robot.wheel(WheelID::FrontRight).velocity();
        let rate = engine.iterations_per_second();
        let steps = engine.substeps_per_tick();
        text.sections[0].value = format!(
            "RATE: {rate:6.0} it/s {steps:3} steps   HDG: {heading:3.0} deg   \
             SPD: {speed:4.2} m/s   VEL: {vel_front_left:5.2} m/s {vel_front_right:5.2} m/s"
        );
    } else {
        text.sections[0].value = String::new();
    }
}

fn handle_keyboard_input(keys: Res<ButtonInput<KeyCode>>, mut scene: ResMut<Scene>) {
    if keys.just_pressed(KeyCode::KeyT) {
        scene.show_text = !scene.show_text;
    }
}

/// Screen positions have their origin in the top left corner with y pointing down, the 2D camera
/// looks at the window center with y pointing up.
fn to_bevy_position(window: &Window, position: Point) -> Vec2 {
    let (x, y): (f32, f32) = position.into();
    Vec2::new(x - window.width() / 2.0, window.height() / 2.0 - y)
}
