//! # devmind-core
//!
//! Foundation types for DevMind Live, the real-time update broadcaster.
//!
//! This crate provides the shared vocabulary the other DevMind crates
//! depend on:
//!
//! - **Branded IDs**: [`ids::ConnectionId`], [`ids::ProjectId`],
//!   [`ids::QueryId`], [`ids::IntegrationId`] as newtypes over UUIDs
//! - **Errors**: [`errors::CoreError`] via `thiserror`
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by all other devmind crates.

#![deny(unsafe_code)]

pub mod errors;
pub mod ids;
