//! Domain module for grant administration.
//!
//! Contains entities, value objects, errors, the lifecycle state machines,
//! the authorization guard and invariants. Nothing here performs I/O.

pub mod authorization;
pub mod entities;
pub mod errors;
pub mod invariants;
pub mod lifecycle;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use value_objects::*;
