//! ECS error types

use thiserror::Error;

use super::entity::EntityId;

/// Result alias used by every fallible ECS operation
pub type EcsResult<T> = Result<T, EcsError>;

/// Errors raised by entities, the manager, processors and events
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// Component operation on an entity that was never bound to a manager
    #[error("Entity {0:?} is not bound to a manager")]
    UnboundEntity(EntityId),

    /// The entity is not live under the manager that was asked about it
    #[error("Entity {0:?} is not tracked by this manager")]
    UnknownEntity(EntityId),

    /// `publish` named an event type that was never added
    #[error("Event `{0}` has not been registered")]
    UnregisteredEvent(&'static str),

    /// A hook without a concrete implementation was invoked
    #[error("`{method}` is not implemented for `{type_name}`")]
    NotImplemented {
        /// Type whose hook was called
        type_name: &'static str,
        /// Name of the hook
        method: &'static str,
    },

    /// Processor used before being registered to a manager
    #[error("Processor is not registered to a manager")]
    UnboundProcessor,

    /// A bound handle outlived the manager that created it
    #[error("Owning manager has been dropped")]
    ManagerDropped,

    /// An event was published again from inside its own `call`
    #[error("Event `{0}` is already being dispatched")]
    EventInProgress(&'static str),
}

impl EcsError {
    /// Build a [`EcsError::NotImplemented`] for hook `method` on `T`
    pub(crate) fn not_implemented<T: ?Sized>(method: &'static str) -> Self {
        Self::NotImplemented {
            type_name: std::any::type_name::<T>(),
            method,
        }
    }
}
