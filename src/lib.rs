pub mod app;
pub mod commands;
pub mod config;
pub mod execution;
pub mod path_guard;
pub mod queue;
pub mod runtime;
pub mod shared;
pub mod world;
