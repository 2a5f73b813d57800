//! # ECS Runtime
//!
//! A minimal entity-component-system kernel for simulations and games.
//!
//! ## Features
//!
//! - **Typed Components**: Per-type stores keyed by the component's concrete type
//! - **Ordered Processors**: Update logic run once per tick in registration order
//! - **Typed Events**: Singleton behaviors published synchronously by processors
//! - **Configuration**: TOML/RON loadable manager settings
//!
//! ## Quick Start
//!
//! ```rust
//! use ecs_runtime::prelude::*;
//!
//! struct Velocity(f32);
//! impl Component for Velocity {}
//!
//! struct Position(f32);
//! impl Component for Position {}
//!
//! struct Integrate;
//!
//! impl EntityLogic for Integrate {
//!     fn update_entity(&mut self, _: &ProcessorContext, dt: f32, entity: &Entity) -> EcsResult<()> {
//!         let velocity = entity.get_component::<Velocity>()?.map_or(0.0, |v| v.borrow().0);
//!         if let Some(position) = entity.get_component::<Position>()? {
//!             position.borrow_mut().0 += velocity * dt;
//!         }
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> Result<(), EcsError> {
//!     let mut manager = Manager::new();
//!     let ship = manager.create_entity();
//!     ship.add_component(Position(0.0))?;
//!     ship.add_component(Velocity(2.0))?;
//!
//!     let needed = ComponentSet::new().with::<Position>().with::<Velocity>();
//!     manager.add_processor(EntityProcessor::with_needed(needed, Integrate));
//!
//!     // Driven by the caller's own loop
//!     manager.update(0.5)?;
//!     assert_eq!(ship.get_component::<Position>()?.unwrap().borrow().0, 1.0);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod foundation;
pub mod ecs;

pub use config::{Config, ConfigError, ManagerConfig};
pub use ecs::{EcsError, EcsResult, Manager};

/// Common imports for runtime users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, ManagerConfig},
        ecs::{
            Component, ComponentSet, ComponentType, EcsError, EcsResult, Entity, EntityId,
            EntityLogic, EntityProcessor, Event, EventStore, FnProcessor, Manager, Processor,
            ProcessorContext, Shared, World,
        },
    };
}
