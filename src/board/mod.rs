//! Multi-tenant kanban board core for Aalto.
//!
//! Projects own a fixed five-column board (pending, in progress, review,
//! completed, delayed). Tasks live in columns and carry subtasks; flipping a
//! subtask's completion flag drives the parent task across the board through
//! the migration engine, with a review stop and an approval gate before a
//! task counts as done. Every user-visible mutation lands in the project's
//! activity feed and is fanned out to project watchers by mail.
//!
//! The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
