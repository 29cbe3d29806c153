// SPDX-FileCopyrightText: 2026 Turnos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Turnos integration tests.
//!
//! Provides in-memory collaborators and a test harness for fast,
//! deterministic tests without a database file.
//!
//! # Components
//!
//! - [`MemoryStore`] - In-memory turn store and service point registry
//! - [`FixedClock`] - Settable clock in a fixed zone
//! - [`TestHarness`] - A wired `TurnService` over either backend

pub mod clock;
pub mod harness;
pub mod memory_store;

pub use clock::FixedClock;
pub use harness::{TestHarness, sample_points};
pub use memory_store::MemoryStore;
