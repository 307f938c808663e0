// ABOUTME: Library root for termgate — re-exports all modules for integration testing.
// ABOUTME: The binary entry point is in main.rs, which uses this crate as a library.

pub mod approval;
pub mod config;
pub mod executor;
pub mod gateway;
pub mod logging;
pub mod protocol;
