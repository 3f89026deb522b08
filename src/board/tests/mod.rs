//! Unit tests for the board module.
//!
//! Tests are organised by concern: pure status derivation, board layout
//! invariants, the subtask-driven migration engine, watcher notification
//! fan-out, and service orchestration.

mod evaluator_tests;
mod helpers;
mod migration_tests;
mod notification_tests;
mod service_tests;
