//! Console commands exposed by the demo scene.

use std::cell::RefCell;
use std::rc::Rc;

use devcon_terminal::registry::{Call, CommandDescriptor, CommandProvider};
use devcon_terminal::{Console, EntityConverter, EntityRef, ParamType, Transport};
use devcon_types::color::Color;
use devcon_types::error::{ConsoleError, Result};
use devcon_types::math::Vec3;

use crate::world::{Entity, World};

/// Drives the cube in the demo scene.
pub struct CubeController {
    world: Rc<RefCell<World>>,
    cube: u64,
    rng: u64,
}

impl CubeController {
    pub fn new(world: Rc<RefCell<World>>, cube: u64) -> Self {
        let seed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as u64;
        Self {
            world,
            cube,
            rng: seed,
        }
    }

    fn with_cube<R>(&self, f: impl FnOnce(&mut Entity) -> R) -> Result<R> {
        let mut world = self.world.borrow_mut();
        let cube = world
            .get_mut(self.cube)
            .ok_or_else(|| ConsoleError::handler("The cube is gone."))?;
        Ok(f(cube))
    }

    /// Next value in `[0, 1)`.
    fn next_unit(&mut self) -> f32 {
        self.rng = self
            .rng
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1);
        (self.rng >> 40) as f32 / (1u64 << 24) as f32
    }
}

impl CommandProvider for CubeController {
    fn commands() -> Vec<CommandDescriptor> {
        vec![
            CommandDescriptor::builder::<Self>("cube_rotate", "Rotates the cube by the given angle.")
                .param("degrees", ParamType::Float)
                .handler(|c: &mut Self, call: &mut Call<'_>| {
                    let degrees = call.args.float(0)? as f32;
                    c.with_cube(|cube| cube.rotate_y(degrees))
                }),
            CommandDescriptor::builder::<Self>(
                "cube_rotation",
                "Prints the current rotation of the cube.",
            )
            .handler(|c: &mut Self, call: &mut Call<'_>| {
                let rotation = c.with_cube(|cube| cube.rotation)?;
                call.out.next_line();
                call.out.write("Current rotation is: ");
                call.out.write_bold(&rotation.to_string());
                Ok(())
            }),
            CommandDescriptor::builder::<Self>("cube_scaling", "Prints the current scale of the cube.")
                .handler(|c: &mut Self, call: &mut Call<'_>| {
                    let scale = c.with_cube(|cube| cube.scale)?;
                    call.out.next_line();
                    call.out.write("Current scale is: ");
                    call.out.write_bold(&scale.to_string());
                    Ok(())
                }),
            CommandDescriptor::builder::<Self>("cube_scale", "Scales the cube by the given factor.")
                .hinted_param("factor", ParamType::Float, "Factor. 1 is default")
                .handler(|c: &mut Self, call: &mut Call<'_>| {
                    let factor = call.args.float(0)? as f32;
                    c.with_cube(|cube| cube.scale = Vec3::splat(factor))
                }),
            CommandDescriptor::builder::<Self>(
                "cube_random_color",
                "Randomizes the color of the cube.",
            )
            .handler(|c: &mut Self, _call: &mut Call<'_>| {
                let (r, g, b) = (c.next_unit(), c.next_unit(), c.next_unit());
                let color = Color::from_channels(r * 255.0, g * 255.0, b * 255.0, 255.0);
                c.with_cube(|cube| cube.color = color)
            }),
            CommandDescriptor::builder::<Self>("cube_color", "Paints the cube.")
                .hinted_param("color", ParamType::of::<Color>(), "name, #hex or r,g,b[,a]")
                .handler(|c: &mut Self, call: &mut Call<'_>| {
                    let color = *call.args.get::<Color>(0)?;
                    c.with_cube(|cube| cube.color = color)
                }),
            CommandDescriptor::builder::<Self>("cube_move", "Moves the cube to a position.")
                .hinted_param("position", ParamType::of::<Vec3>(), "x,y,z")
                .handler(|c: &mut Self, call: &mut Call<'_>| {
                    let position = *call.args.get::<Vec3>(0)?;
                    c.with_cube(|cube| cube.position = position)
                }),
        ]
    }
}

/// Read-only queries over any entity in the scene.
pub struct Inspector {
    world: Rc<RefCell<World>>,
}

impl Inspector {
    pub fn new(world: Rc<RefCell<World>>) -> Self {
        Self { world }
    }
}

impl CommandProvider for Inspector {
    fn commands() -> Vec<CommandDescriptor> {
        vec![
            CommandDescriptor::builder::<Self>("inspect", "Prints the transform and color of an entity.")
                .param("entity", ParamType::of::<EntityRef>())
                .handler(|i: &mut Self, call: &mut Call<'_>| {
                    let target = call.args.get::<EntityRef>(0)?;
                    let world = i.world.borrow();
                    let entity = world
                        .get(target.id)
                        .ok_or_else(|| ConsoleError::ReferenceNotFound(target.name.clone()))?;
                    call.out.write_line_bold(&entity.name);
                    call.out.write_line(&format!("  id: {}", entity.id));
                    call.out.write_line(&format!("  position: {}", entity.position));
                    call.out.write_line(&format!("  rotation: {}", entity.rotation));
                    call.out.write_line(&format!("  scale: {}", entity.scale));
                    call.out.write("\n  color: ");
                    call.out.open_color(entity.color);
                    call.out.write(&format!("#{}", entity.color.to_hex_rgb()));
                    call.out.close_color();
                    Ok(())
                }),
        ]
    }
}

/// Converter resolving entity names against the scene.
pub fn entity_converter(world: &Rc<RefCell<World>>) -> EntityConverter {
    let world = Rc::clone(world);
    EntityConverter::new(move |name| {
        world.borrow().find(name).map(|e| EntityRef {
            id: e.id,
            name: e.name.clone(),
        })
    })
}

/// Register the demo providers and spawn their instances.
pub fn install<T: Transport>(console: &mut Console<T>, world: &Rc<RefCell<World>>) -> Result<()> {
    console.register_converter(entity_converter(world));
    console.register_provider::<CubeController>();
    console.register_provider::<Inspector>();

    let cube = world
        .borrow()
        .find("cube")
        .map(|e| e.id)
        .ok_or_else(|| ConsoleError::Config("demo scene has no cube".to_string()))?;
    console
        .scene_mut()
        .spawn("GameController", CubeController::new(Rc::clone(world), cube));
    console
        .scene_mut()
        .spawn("Inspector", Inspector::new(Rc::clone(world)));
    log::info!("Installed demo commands for {} entities", world.borrow().len());
    Ok(())
}
