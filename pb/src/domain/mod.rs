//! Domain types for Paper Bartender
//!
//! Core domain types: Paper, Milestone, Task and the `Model` arena that owns
//! them. All lookups and mutations go through `Model`, which validates input
//! before touching any arena.

mod error;
mod id;
mod model;
mod priority;
mod record;

pub use error::DomainError;
pub use id::{DomainId, IdResolver, generate_id};
pub use model::{Model, NewMilestone, NewPaper, NewTask, SCHEMA_VERSION};
pub use priority::Priority;
pub use record::{Milestone, Paper, Task, TaskSource};
