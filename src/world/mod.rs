//! Physics world adapter
//!
//! Owns the rigid-body simulation: the gravity vector, the static boundary
//! bodies, and the dynamic body set. Bodies live in a generational slot arena
//! so handles stay `Copy`-cheap and a stale handle resolves to `None` instead
//! of aliasing a reused slot.
//!
//! `step` is the whole engine: integrate gravity and air drag, advance
//! positions, then resolve contacts with positional correction and a
//! restitution impulse. Shapes are axis-aligned (circle, rectangle); nothing
//! in the game rotates.

mod body;

pub use body::{Body, BodyKind, BodySpec, Shape};

use glam::Vec2;

use body::groups_interact;

/// World gravity: a direction/strength vector plus a units -> px/s^2 scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gravity {
    pub vec: Vec2,
    pub scale: f32,
}

impl Gravity {
    /// Acceleration applied to a unit-gravity-scale body (px/s^2)
    pub fn accel(&self) -> Vec2 {
        self.vec * self.scale
    }
}

/// Handle to a body slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle {
    index: u32,
    generation: u32,
}

/// Errors from body construction; session-fatal, no retries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldError {
    InvalidBody(&'static str),
}

impl std::fmt::Display for WorldError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            WorldError::InvalidBody(reason) => write!(f, "invalid body spec: {}", reason),
        }
    }
}

impl std::error::Error for WorldError {}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    body: Option<Body>,
}

/// The rigid-body world
#[derive(Debug)]
pub struct World {
    gravity: Gravity,
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl World {
    /// Create a world with the given gravity vector and the default
    /// units -> px/s^2 scale
    pub fn new(gravity: Vec2) -> Self {
        Self {
            gravity: Gravity {
                vec: gravity,
                scale: crate::consts::GRAVITY_SCALE,
            },
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub fn gravity(&self) -> Gravity {
        self.gravity
    }

    /// Direct gravity-vector override (sensor path and difficulty ramp)
    pub fn set_gravity(&mut self, vec: Vec2) {
        self.gravity.vec = vec;
    }

    /// Validate and add a body, reusing a free slot when one exists
    pub fn add_body(&mut self, spec: BodySpec) -> Result<BodyHandle, WorldError> {
        spec.validate()?;
        let body = Body::from_spec(spec);
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.body = Some(body);
                Ok(BodyHandle {
                    index,
                    generation: slot.generation,
                })
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    body: Some(body),
                });
                Ok(BodyHandle {
                    index,
                    generation: 0,
                })
            }
        }
    }

    /// Remove a body; returns false for stale or unknown handles
    pub fn remove_body(&mut self, handle: BodyHandle) -> bool {
        match self.slots.get_mut(handle.index as usize) {
            Some(slot) if slot.generation == handle.generation && slot.body.is_some() => {
                slot.body = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(handle.index);
                true
            }
            _ => false,
        }
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&Body> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.body.as_ref())
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.body.as_mut())
    }

    /// Direct position override; no-op on a stale handle
    pub fn set_position(&mut self, handle: BodyHandle, pos: Vec2) {
        if let Some(body) = self.body_mut(handle) {
            body.pos = pos;
        }
    }

    /// Direct velocity override; no-op on a stale handle
    pub fn set_velocity(&mut self, handle: BodyHandle, vel: Vec2) {
        if let Some(body) = self.body_mut(handle) {
            body.vel = vel;
        }
    }

    /// Pairwise geometric overlap test, independent of collision groups
    pub fn collides(&self, a: BodyHandle, b: BodyHandle) -> bool {
        match (self.body(a), self.body(b)) {
            (Some(a), Some(b)) => contact(a, b).is_some(),
            _ => false,
        }
    }

    /// Drop every dynamic body (bulk session teardown); boundaries survive
    pub fn clear_dynamic(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.body.as_ref().is_some_and(Body::is_dynamic) {
                slot.body = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
            }
        }
    }

    pub fn body_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.body.is_some()).count()
    }

    pub fn dynamic_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.body.as_ref().is_some_and(Body::is_dynamic))
            .count()
    }

    /// Advance the simulation by `dt` seconds
    pub fn step(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }

        let accel = self.gravity.accel();
        for slot in &mut self.slots {
            let Some(body) = slot.body.as_mut() else { continue };
            if !body.is_dynamic() {
                continue;
            }
            body.vel += accel * body.gravity_scale * dt;
            if body.air_drag > 0.0 {
                // exponential drag normalized to the 60 Hz reference frame
                body.vel *= (1.0 - body.air_drag).powf(dt * 60.0);
            }
            body.pos += body.vel * dt;
        }

        self.resolve_contacts();
    }

    fn resolve_contacts(&mut self) {
        let mut dynamics: Vec<usize> = Vec::new();
        let mut statics: Vec<usize> = Vec::new();
        for (index, slot) in self.slots.iter().enumerate() {
            match slot.body.as_ref() {
                Some(body) if body.is_dynamic() => dynamics.push(index),
                Some(_) => statics.push(index),
                None => {}
            }
        }

        // dynamic vs static: push out fully, reflect the normal component
        for &d in &dynamics {
            for &s in &statics {
                let Some(boundary) = self.slots[s].body.clone() else { continue };
                let Some(body) = self.slots[d].body.as_mut() else { continue };
                if !groups_interact(body.group, boundary.group) {
                    continue;
                }
                let Some((normal, depth)) = contact(body, &boundary) else { continue };
                body.pos -= normal * depth;
                let along = body.vel.dot(normal);
                if along > 0.0 {
                    let bounce = body.restitution.max(boundary.restitution);
                    let grip = body.friction.max(boundary.friction);
                    let tangent = Vec2::new(-normal.y, normal.x);
                    let slide = body.vel.dot(tangent);
                    body.vel = tangent * slide * (1.0 - grip) - normal * along * bounce;
                }
            }
        }

        // dynamic vs dynamic: split the correction, exchange an equal-mass impulse
        for i in 0..dynamics.len() {
            for j in (i + 1)..dynamics.len() {
                let (first, second) = self.slots.split_at_mut(dynamics[j]);
                let Some(a) = first[dynamics[i]].body.as_mut() else { continue };
                let Some(b) = second[0].body.as_mut() else { continue };
                if !groups_interact(a.group, b.group) {
                    continue;
                }
                let Some((normal, depth)) = contact(a, b) else { continue };
                a.pos -= normal * (depth * 0.5);
                b.pos += normal * (depth * 0.5);
                let closing = (b.vel - a.vel).dot(normal);
                if closing < 0.0 {
                    let bounce = a.restitution.max(b.restitution);
                    let impulse = -(1.0 + bounce) * closing / 2.0;
                    a.vel -= normal * impulse;
                    b.vel += normal * impulse;
                }
            }
        }
    }
}

/// Overlap test: returns the contact normal (pointing from `a` toward `b`)
/// and the penetration depth, or `None` when the bodies are apart
fn contact(a: &Body, b: &Body) -> Option<(Vec2, f32)> {
    match (a.shape, b.shape) {
        (Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) => {
            let delta = b.pos - a.pos;
            let reach = ra + rb;
            let dist_sq = delta.length_squared();
            if dist_sq >= reach * reach {
                return None;
            }
            let dist = dist_sq.sqrt();
            let normal = if dist > 1e-6 { delta / dist } else { Vec2::Y };
            Some((normal, reach - dist))
        }
        (Shape::Rect { .. }, Shape::Rect { .. }) => rect_rect(a, b),
        (Shape::Circle { radius }, Shape::Rect { half_extents }) => {
            circle_rect(a.pos, radius, b.pos, half_extents)
        }
        (Shape::Rect { half_extents }, Shape::Circle { radius }) => {
            circle_rect(b.pos, radius, a.pos, half_extents).map(|(n, d)| (-n, d))
        }
    }
}

fn rect_rect(a: &Body, b: &Body) -> Option<(Vec2, f32)> {
    let delta = b.pos - a.pos;
    let reach = a.shape.half_extents() + b.shape.half_extents();
    let overlap = reach - delta.abs();
    if overlap.x <= 0.0 || overlap.y <= 0.0 {
        return None;
    }
    if overlap.x < overlap.y {
        Some((Vec2::new(delta.x.signum(), 0.0), overlap.x))
    } else {
        Some((Vec2::new(0.0, delta.y.signum()), overlap.y))
    }
}

/// Normal points from the circle toward the rect
fn circle_rect(center: Vec2, radius: f32, rect_pos: Vec2, half: Vec2) -> Option<(Vec2, f32)> {
    let local = center - rect_pos;
    let closest = local.clamp(-half, half);

    if closest != local {
        // circle center outside the rect: point-to-edge distance
        let delta = local - closest;
        let dist_sq = delta.length_squared();
        if dist_sq >= radius * radius {
            return None;
        }
        let dist = dist_sq.sqrt();
        let normal = if dist > 1e-6 { -delta / dist } else { Vec2::Y };
        Some((normal, radius - dist))
    } else {
        // center inside the rect: escape along the shallow axis
        let overlap = half + Vec2::splat(radius) - local.abs();
        if overlap.x < overlap.y {
            Some((Vec2::new(-local.x.signum(), 0.0), overlap.x))
        } else {
            Some((Vec2::new(0.0, -local.y.signum()), overlap.y))
        }
    }
}
