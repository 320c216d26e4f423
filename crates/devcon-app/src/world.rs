//! A tiny scene of named entities for the console to poke at.

use devcon_types::color::Color;
use devcon_types::math::Vec3;

/// One object in the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: u64,
    pub name: String,
    pub position: Vec3,
    /// Euler angles in degrees.
    pub rotation: Vec3,
    pub scale: Vec3,
    pub color: Color,
}

impl Entity {
    fn new(id: u64, name: &str, position: Vec3, color: Color) -> Self {
        Self {
            id,
            name: name.to_string(),
            position,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            color,
        }
    }

    /// Rotate about the vertical axis, keeping the angle in `[0, 360)`.
    pub fn rotate_y(&mut self, degrees: f32) {
        self.rotation.y = (self.rotation.y + degrees).rem_euclid(360.0);
    }
}

#[derive(Debug, Default)]
pub struct World {
    entities: Vec<Entity>,
    next_id: u64,
}

impl World {
    /// The demo scene: a cube, a floor and a lamp.
    pub fn demo() -> Self {
        let mut world = Self::default();
        world.add("cube", Vec3::new(0.0, 0.5, 0.0), Color::WHITE);
        world.add("floor", Vec3::ZERO, Color::GRAY);
        world.add("lamp", Vec3::new(2.0, 3.0, -1.0), Color::YELLOW);
        world
    }

    pub fn add(&mut self, name: &str, position: Vec3, color: Color) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entities.push(Entity::new(id, name, position, color));
        id
    }

    /// Exact, case-sensitive name lookup.
    pub fn find(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }

    pub fn get(&self, id: u64) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_scene_has_cube() {
        let world = World::demo();
        assert_eq!(world.len(), 3);
        let cube = world.find("cube").unwrap();
        assert_eq!(cube.scale, Vec3::ONE);
        assert!(world.find("Cube").is_none());
    }

    #[test]
    fn rotation_wraps() {
        let mut world = World::demo();
        let id = world.find("cube").unwrap().id;
        let cube = world.get_mut(id).unwrap();
        cube.rotate_y(350.0);
        cube.rotate_y(20.0);
        assert!((cube.rotation.y - 10.0).abs() < 1e-4);
        cube.rotate_y(-30.0);
        assert!((cube.rotation.y - 340.0).abs() < 1e-4);
    }
}
