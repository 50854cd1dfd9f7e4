//! Application layer: repositories and command/query handlers.

pub mod command_handlers;
pub mod query_handlers;
pub mod repository;
pub mod turn_controller;
