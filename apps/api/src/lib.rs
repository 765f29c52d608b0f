//! Crewboard Library
//!
//! This library provides the shared coordination board used by cooperating
//! agents: the domain model, the file-backed stores, the coordination engine
//! and the HTTP and CLI adapters over it.

pub mod api;
pub mod cli;
pub mod config;
pub mod coordination;
pub mod domain;
pub mod infrastructure;
