//! Entity store
//!
//! A generational slot arena pairing physics bodies with display metadata.
//! The player keeps a stable handle for the whole session; obstacle churn
//! reuses slots through the free list, and teardown clears in one pass.

use std::fmt;

use crate::world::BodyHandle;

/// What an entity is, for system filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Player,
    Obstacle,
}

/// Visual footprint handed to the renderer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VisualSize {
    Radius(f32),
    Extent { width: f32, height: f32 },
}

impl VisualSize {
    /// Half of the horizontal footprint (clamping width for the player row)
    pub fn half_width(&self) -> f32 {
        match *self {
            VisualSize::Radius(radius) => radius,
            VisualSize::Extent { width, .. } => width / 2.0,
        }
    }
}

/// Color token understood by the host renderer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColorToken {
    Named(&'static str),
    /// Random hue with the fixed obstacle saturation/lightness
    Hue(f32),
}

impl fmt::Display for ColorToken {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ColorToken::Named(name) => write!(f, "{}", name),
            ColorToken::Hue(hue) => write!(f, "hsl({:.0}, 70%, 50%)", hue),
        }
    }
}

/// Which primitive the renderer draws at the body position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderShape {
    Disc,
    RoundedRect,
}

/// One renderable game object bound to a physics body
#[derive(Debug, Clone)]
pub struct Entity {
    pub body: BodyHandle,
    pub size: VisualSize,
    pub color: ColorToken,
    pub shape: RenderShape,
    pub category: Category,
    /// Session clock at spawn (ms); set for obstacles only
    pub spawned_at: Option<f64>,
}

/// Stable generational identifier for an entity slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId {
    index: u32,
    generation: u32,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    entity: Option<Entity>,
}

/// Slot-arena entity store with free-list reuse
#[derive(Debug, Default)]
pub struct EntityArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl EntityArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entity: Entity) -> EntityId {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.entity = Some(entity);
                EntityId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    entity: Some(entity),
                });
                EntityId {
                    index,
                    generation: 0,
                }
            }
        }
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entity.as_ref())
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entity.as_mut())
    }

    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let slot = self
            .slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)?;
        let entity = slot.entity.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        Some(entity)
    }

    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live entities in slot order
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.entity.as_ref().map(|entity| {
                (
                    EntityId {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    entity,
                )
            })
        })
    }

    /// Live entities of one category
    pub fn in_category(&self, category: Category) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.iter().filter(move |(_, entity)| entity.category == category)
    }

    /// Drop everything; stale ids die with the generation bump
    pub fn clear(&mut self) {
        self.free.clear();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.entity.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            self.free.push(index as u32);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{BodySpec, World};
    use glam::Vec2;

    fn entity(world: &mut World, category: Category) -> Entity {
        let body = world
            .add_body(BodySpec::circle(10.0).at(Vec2::ZERO))
            .expect("valid body");
        Entity {
            body,
            size: VisualSize::Radius(10.0),
            color: ColorToken::Named("white"),
            shape: RenderShape::Disc,
            category,
            spawned_at: None,
        }
    }

    #[test]
    fn test_insert_get_remove() {
        let mut world = World::new(Vec2::ZERO);
        let mut arena = EntityArena::new();
        let id = arena.insert(entity(&mut world, Category::Player));
        assert!(arena.get(id).is_some());
        assert_eq!(arena.len(), 1);

        let removed = arena.remove(id).expect("live entity");
        assert_eq!(removed.category, Category::Player);
        assert!(arena.get(id).is_none());
        assert!(arena.is_empty());
    }

    #[test]
    fn test_slot_reuse_invalidates_old_id() {
        let mut world = World::new(Vec2::ZERO);
        let mut arena = EntityArena::new();
        let old = arena.insert(entity(&mut world, Category::Obstacle));
        arena.remove(old);
        let new = arena.insert(entity(&mut world, Category::Obstacle));

        assert!(arena.get(old).is_none());
        assert!(arena.get(new).is_some());
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_category_filter() {
        let mut world = World::new(Vec2::ZERO);
        let mut arena = EntityArena::new();
        arena.insert(entity(&mut world, Category::Player));
        arena.insert(entity(&mut world, Category::Obstacle));
        arena.insert(entity(&mut world, Category::Obstacle));

        assert_eq!(arena.in_category(Category::Obstacle).count(), 2);
        assert_eq!(arena.in_category(Category::Player).count(), 1);
    }

    #[test]
    fn test_clear_invalidates_everything() {
        let mut world = World::new(Vec2::ZERO);
        let mut arena = EntityArena::new();
        let a = arena.insert(entity(&mut world, Category::Obstacle));
        let b = arena.insert(entity(&mut world, Category::Obstacle));
        arena.clear();

        assert!(arena.is_empty());
        assert!(arena.get(a).is_none());
        assert!(arena.get(b).is_none());
        // slots are reusable after the wipe
        let c = arena.insert(entity(&mut world, Category::Player));
        assert!(arena.get(c).is_some());
    }

    #[test]
    fn test_color_token_display() {
        assert_eq!(ColorToken::Named("white").to_string(), "white");
        assert_eq!(ColorToken::Hue(212.4).to_string(), "hsl(212, 70%, 50%)");
    }
}
