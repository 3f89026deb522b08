//! Aalto: project tracking core.
//!
//! This crate provides the domain model and services behind a multi-tenant
//! kanban project tracker: boards with a fixed column progression, tasks
//! whose position is derived from subtask completion, an approval gate for
//! finished work, and an activity feed with watcher notifications.
//!
//! # Architecture
//!
//! Aalto follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, mail, etc.)
//!
//! # Modules
//!
//! - [`board`]: Projects, boards, tasks, subtasks, and the services that
//!   keep their columns, approvals, and notifications consistent

pub mod board;
