// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Strongly-typed configuration structs for Restora.
//!
//! These types are extracted from the merged configuration JSON produced by
//! `config-core`. `UiRoot` is flattened into the root of the schema, while
//! repositories and plans live in the `repo` and `plan` collections.
//!
//! A `ConfigSnapshot` is the unit the configuration store hands out: it is
//! replaced wholesale whenever configuration changes.

pub mod plan;
pub mod repo;
pub mod snapshot;
pub mod ui;

pub use plan::{Plan, RetentionPolicy};
pub use repo::{CheckPolicy, PrunePolicy, Repository};
pub use snapshot::{ConfigError, ConfigSnapshot};
pub use ui::{HistoryTabSetting, UiRoot};
