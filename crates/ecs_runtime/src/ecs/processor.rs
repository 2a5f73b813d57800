//! Processor trait and implementations
//!
//! A processor is update logic that a [`Manager`] runs once per tick, in the
//! order processors were registered. [`EntityProcessor`] narrows that to the
//! entities carrying a fixed set of component types and calls its
//! [`EntityLogic`] once per matching entity.

use std::cell::RefCell;
use std::fmt;
use std::rc::Weak;

use super::component::Shared;
use super::entity::Entity;
use super::error::{EcsError, EcsResult};
use super::event::Event;
use super::manager::Manager;
use super::query::ComponentSet;
use super::storage::Registry;
use super::world::World;

/// Back-reference from a processor to the manager it is registered to
///
/// Empty until [`Manager::add_processor`] binds it.
#[derive(Clone, Default)]
pub struct ProcessorContext {
    registry: Option<Weak<RefCell<Registry>>>,
}

impl ProcessorContext {
    /// Create an unbound context
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn bind(&mut self, world: &World) {
        self.registry = Some(world.downgrade());
    }

    /// Whether the owning processor has been registered
    pub fn is_bound(&self) -> bool {
        self.registry.is_some()
    }

    /// Handle to the owning manager's world
    pub fn world(&self) -> EcsResult<World> {
        let registry = self
            .registry
            .as_ref()
            .ok_or(EcsError::UnboundProcessor)?
            .upgrade()
            .ok_or(EcsError::ManagerDropped)?;
        Ok(World::from_registry(registry))
    }

    /// Invoke the registered singleton of `E` with `args`
    pub fn publish<E: Event>(&self, args: E::Args) -> EcsResult<E::Output> {
        self.world()?.publish::<E>(args)
    }
}

impl fmt::Debug for ProcessorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessorContext")
            .field("bound", &self.is_bound())
            .finish()
    }
}

/// Per-tick update logic
///
/// Implementors own a [`ProcessorContext`] and expose it through
/// [`Processor::context`] / [`Processor::context_mut`]. The default
/// [`Processor::update`] fails with [`EcsError::NotImplemented`].
pub trait Processor: 'static {
    /// Binding to the owning manager
    fn context(&self) -> &ProcessorContext;

    /// Mutable binding, set during registration
    fn context_mut(&mut self) -> &mut ProcessorContext;

    /// Run one tick
    fn update(&mut self, delta_time: f32) -> EcsResult<()> {
        let _ = delta_time;
        Err(EcsError::not_implemented::<Self>("update"))
    }

    /// Name used in logs
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Append this processor to `manager`'s schedule
    fn register_to(self, manager: &mut Manager) -> Shared<Self>
    where
        Self: Sized,
    {
        manager.add_processor(self)
    }

    /// Invoke the owning manager's singleton of `E` with `args`
    fn publish<E: Event>(&self, args: E::Args) -> EcsResult<E::Output>
    where
        Self: Sized,
    {
        self.context().publish::<E>(args)
    }
}

/// Per-entity logic driven by an [`EntityProcessor`]
///
/// The unit type is the base logic: its `update_entity` is not implemented.
pub trait EntityLogic: 'static {
    /// Update one matching entity
    fn update_entity(
        &mut self,
        context: &ProcessorContext,
        delta_time: f32,
        entity: &Entity,
    ) -> EcsResult<()> {
        let _ = (context, delta_time, entity);
        Err(EcsError::not_implemented::<Self>("update_entity"))
    }
}

impl EntityLogic for () {}

/// Processor that visits every live entity holding all `needed` types
pub struct EntityProcessor<L = ()> {
    context: ProcessorContext,
    needed: ComponentSet,
    logic: L,
}

impl<L: EntityLogic> EntityProcessor<L> {
    /// Processor matching every live entity
    pub fn new(logic: L) -> Self {
        Self::with_needed(ComponentSet::new(), logic)
    }

    /// Processor matching entities that carry every type in `needed`
    pub fn with_needed(needed: ComponentSet, logic: L) -> Self {
        Self {
            context: ProcessorContext::new(),
            needed,
            logic,
        }
    }

    /// Required component types
    pub fn needed(&self) -> &ComponentSet {
        &self.needed
    }

    /// Entity logic
    pub fn logic(&self) -> &L {
        &self.logic
    }

    /// Mutable entity logic
    pub fn logic_mut(&mut self) -> &mut L {
        &mut self.logic
    }

    /// Run the logic for a single entity
    pub fn update_entity(&mut self, delta_time: f32, entity: &Entity) -> EcsResult<()> {
        self.logic.update_entity(&self.context, delta_time, entity)
    }
}

impl<F> EntityProcessor<FnLogic<F>>
where
    F: FnMut(&ProcessorContext, f32, &Entity) -> EcsResult<()> + 'static,
{
    /// Processor whose per-entity logic is a closure
    pub fn from_fn(needed: ComponentSet, f: F) -> Self {
        Self::with_needed(needed, FnLogic(f))
    }
}

impl<L: EntityLogic + Default> Default for EntityProcessor<L> {
    fn default() -> Self {
        Self::new(L::default())
    }
}

impl<L: EntityLogic> Processor for EntityProcessor<L> {
    fn context(&self) -> &ProcessorContext {
        &self.context
    }

    fn context_mut(&mut self) -> &mut ProcessorContext {
        &mut self.context
    }

    /// Visit live entities, checking `needed` as each one is reached so that
    /// components stripped earlier in the same tick are respected
    fn update(&mut self, delta_time: f32) -> EcsResult<()> {
        let world = self.context.world()?;
        for entity in world.entities() {
            if world.has_components(&entity, &self.needed) {
                self.logic.update_entity(&self.context, delta_time, &entity)?;
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        std::any::type_name::<L>()
    }
}

/// [`EntityLogic`] backed by a closure
pub struct FnLogic<F>(F);

impl<F> EntityLogic for FnLogic<F>
where
    F: FnMut(&ProcessorContext, f32, &Entity) -> EcsResult<()> + 'static,
{
    fn update_entity(
        &mut self,
        context: &ProcessorContext,
        delta_time: f32,
        entity: &Entity,
    ) -> EcsResult<()> {
        (self.0)(context, delta_time, entity)
    }
}

/// A [`Processor`] backed by a function or closure
pub struct FnProcessor<F>
where
    F: FnMut(&ProcessorContext, f32) -> EcsResult<()> + 'static,
{
    context: ProcessorContext,
    name: &'static str,
    f: F,
}

impl<F> FnProcessor<F>
where
    F: FnMut(&ProcessorContext, f32) -> EcsResult<()> + 'static,
{
    /// Create a named function-backed processor
    pub fn new(name: &'static str, f: F) -> Self {
        Self {
            context: ProcessorContext::new(),
            name,
            f,
        }
    }
}

impl<F> Processor for FnProcessor<F>
where
    F: FnMut(&ProcessorContext, f32) -> EcsResult<()> + 'static,
{
    fn context(&self) -> &ProcessorContext {
        &self.context
    }

    fn context_mut(&mut self) -> &mut ProcessorContext {
        &mut self.context
    }

    fn update(&mut self, delta_time: f32) -> EcsResult<()> {
        (self.f)(&self.context, delta_time)
    }

    fn name(&self) -> &'static str {
        self.name
    }
}
