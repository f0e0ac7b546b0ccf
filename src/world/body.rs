//! Rigid body records and construction specs

use glam::Vec2;

use super::WorldError;

/// Axis-aligned collision shape
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Circle { radius: f32 },
    Rect { half_extents: Vec2 },
}

impl Shape {
    pub fn circle(radius: f32) -> Self {
        Self::Circle { radius }
    }

    pub fn rect(width: f32, height: f32) -> Self {
        Self::Rect {
            half_extents: Vec2::new(width / 2.0, height / 2.0),
        }
    }

    /// Bounding half-extents (a circle's box is radius x radius)
    pub fn half_extents(&self) -> Vec2 {
        match *self {
            Shape::Circle { radius } => Vec2::splat(radius),
            Shape::Rect { half_extents } => half_extents,
        }
    }
}

/// Static bodies never move; dynamic bodies integrate every step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Static,
    Dynamic,
}

/// Construction spec for a body
///
/// Builder-style: `BodySpec::rect(40.0, 60.0).at(pos).restitution(0.1)`.
/// Specs default to dynamic, bounce-free, drag-free, group 0.
#[derive(Debug, Clone)]
pub struct BodySpec {
    pub shape: Shape,
    pub position: Vec2,
    pub kind: BodyKind,
    pub restitution: f32,
    pub friction: f32,
    pub air_drag: f32,
    pub gravity_scale: f32,
    pub group: i32,
}

impl BodySpec {
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            position: Vec2::ZERO,
            kind: BodyKind::Dynamic,
            restitution: 0.0,
            friction: 0.0,
            air_drag: 0.0,
            gravity_scale: 1.0,
            group: 0,
        }
    }

    pub fn circle(radius: f32) -> Self {
        Self::new(Shape::circle(radius))
    }

    pub fn rect(width: f32, height: f32) -> Self {
        Self::new(Shape::rect(width, height))
    }

    pub fn at(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    /// Make the body static (boundaries)
    pub fn fixed(mut self) -> Self {
        self.kind = BodyKind::Static;
        self
    }

    pub fn restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    pub fn friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub fn air_drag(mut self, air_drag: f32) -> Self {
        self.air_drag = air_drag;
        self
    }

    pub fn gravity_scale(mut self, gravity_scale: f32) -> Self {
        self.gravity_scale = gravity_scale;
        self
    }

    pub fn group(mut self, group: i32) -> Self {
        self.group = group;
        self
    }

    /// Reject configurations the simulation cannot step
    pub(crate) fn validate(&self) -> Result<(), WorldError> {
        let extents = self.shape.half_extents();
        if !extents.is_finite() || extents.min_element() <= 0.0 {
            return Err(WorldError::InvalidBody("shape extents must be finite and positive"));
        }
        if !self.position.is_finite() {
            return Err(WorldError::InvalidBody("position must be finite"));
        }
        if !(0.0..=1.0).contains(&self.restitution) {
            return Err(WorldError::InvalidBody("restitution must be within [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.friction) {
            return Err(WorldError::InvalidBody("friction must be within [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.air_drag) {
            return Err(WorldError::InvalidBody("air drag must be within [0, 1]"));
        }
        if !self.gravity_scale.is_finite() {
            return Err(WorldError::InvalidBody("gravity scale must be finite"));
        }
        Ok(())
    }
}

/// A live rigid body
#[derive(Debug, Clone)]
pub struct Body {
    pub shape: Shape,
    pub pos: Vec2,
    pub vel: Vec2,
    pub kind: BodyKind,
    pub restitution: f32,
    pub friction: f32,
    pub air_drag: f32,
    pub gravity_scale: f32,
    pub group: i32,
}

impl Body {
    pub(crate) fn from_spec(spec: BodySpec) -> Self {
        Self {
            shape: spec.shape,
            pos: spec.position,
            vel: Vec2::ZERO,
            kind: spec.kind,
            restitution: spec.restitution,
            friction: spec.friction,
            air_drag: spec.air_drag,
            gravity_scale: spec.gravity_scale,
            group: spec.group,
        }
    }

    pub fn is_dynamic(&self) -> bool {
        self.kind == BodyKind::Dynamic
    }
}

/// Whether two bodies physically resolve against each other.
///
/// Group 0 collides with everything; equal groups collide; distinct nonzero
/// groups are mutually inert.
pub(crate) fn groups_interact(a: i32, b: i32) -> bool {
    a == 0 || b == 0 || a == b
}
