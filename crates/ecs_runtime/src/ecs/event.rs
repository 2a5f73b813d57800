//! Typed broadcast events
//!
//! An event is a singleton behavior registered into a
//! [`Manager`](super::Manager). Processors invoke it with
//! [`Processor::publish`](super::Processor::publish); the call runs
//! synchronously and its result is handed back to the publisher.

use super::component::Shared;
use super::error::{EcsError, EcsResult};
use super::manager::Manager;

/// Event behavior
///
/// Each event type declares the arguments it is published with and the value
/// it hands back. The default [`Event::call`] fails with
/// [`EcsError::NotImplemented`]; concrete events override it.
pub trait Event: 'static {
    /// Arguments passed by the publisher
    type Args;

    /// Value returned to the publisher
    type Output;

    /// Handle one publication
    fn call(&mut self, args: Self::Args) -> EcsResult<Self::Output> {
        let _ = args;
        Err(EcsError::not_implemented::<Self>("call"))
    }

    /// Store this instance as the manager's singleton for its type
    ///
    /// Replaces any earlier instance of the same type.
    fn register_to(self, manager: &mut Manager) -> Shared<Self>
    where
        Self: Sized,
    {
        manager.add_event(self)
    }
}
