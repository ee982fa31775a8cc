//! Collision detection based on basic shapes.

use std::f64::consts::PI;

use super::{Angle, Point};

pub trait HasCollision {
    /// Contact normals between `self` and `other`, `None` if they do not touch.
    fn touch(&self, other: &dyn HasCollision) -> Option<Vec<Angle>> {
        self.shape().contact(&other.shape())
    }

    fn shape(&self) -> Shape;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    Circle {
        position: Point,
        radius: f64,
    },
    /// Axis-aligned rectangle centered at the origin which bodies must stay inside.
    Boundary {
        half_extents: Point,
    },
}

impl Shape {
    /// Circle against circle yields the direction from `self` to `other`. Circle against boundary
    /// yields the outward normals of all penetrated walls, whichever side the boundary is on.
    pub fn contact(&self, other: &Shape) -> Option<Vec<Angle>> {
        match (self, other) {
            (
                Shape::Circle { position, radius },
                Shape::Circle {
                    position: other_position,
                    radius: other_radius,
                },
            ) => (position.distance(*other_position) <= radius + other_radius)
                .then(|| vec![(*other_position - *position).direction()]),
            (Shape::Circle { position, radius }, Shape::Boundary { half_extents })
            | (Shape::Boundary { half_extents }, Shape::Circle { position, radius }) => {
                let [right, top] = (*position + *radius).gt_per_axis(*half_extents);
                let [left, bottom] = (*position - *radius).lt_per_axis(-*half_extents);
                let normals = Wall::ALL
                    .iter()
                    .zip([right, top, left, bottom])
                    .filter_map(|(wall, penetrated)| penetrated.then(|| wall.normal()))
                    .collect::<Vec<_>>();
                (!normals.is_empty()).then_some(normals)
            }
            (Shape::Boundary { .. }, Shape::Boundary { .. }) => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum Wall {
    Right,
    Top,
    Left,
    Bottom,
}

impl Wall {
    pub const ALL: [Wall; 4] = [Wall::Right, Wall::Top, Wall::Left, Wall::Bottom];

    pub fn normal(self) -> Angle {
        Angle::new(match self {
            Wall::Right => 0.0,
            Wall::Top => 0.5 * PI,
            Wall::Left => PI,
            Wall::Bottom => 1.5 * PI,
        })
    }
}
