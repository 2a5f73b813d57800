//! Entity-Component-System implementation
//!
//! A [`Manager`] owns entities and their per-type component stores, runs
//! registered [`Processor`]s once per tick in registration order, and keeps
//! one singleton per [`Event`] type for processors to publish to.

pub mod error;
pub mod component;
pub mod entity;
pub mod query;
pub mod storage;
pub mod event;
pub mod world;
pub mod processor;
pub mod manager;

#[cfg(test)]
mod tests;

pub use error::{EcsError, EcsResult};
pub use component::{Component, ComponentType, Shared};
pub use entity::{Entity, EntityId};
pub use query::ComponentSet;
pub use storage::EventStore;
pub use event::Event;
pub use world::World;
pub use processor::{EntityLogic, EntityProcessor, FnLogic, FnProcessor, Processor, ProcessorContext};
pub use manager::Manager;
