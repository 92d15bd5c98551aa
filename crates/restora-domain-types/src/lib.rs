// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Domain types for the Restora backup dashboard
//!
//! This crate contains the operation-history types that are shared across
//! the configuration store, the operation feed, and the terminal UI.
//!
//! These types are transport-agnostic: wire representations live next to
//! the feed implementations and convert into these values at the boundary.

pub mod operation;
pub mod query;

// Re-export commonly used types
pub use operation::*;
pub use query::*;
