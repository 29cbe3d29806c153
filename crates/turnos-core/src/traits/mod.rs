// SPDX-FileCopyrightText: 2026 Turnos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions consumed by the queue engine.
//!
//! Backends extend the [`Adapter`] base trait and use `#[async_trait]`
//! for dynamic dispatch compatibility.

pub mod adapter;
pub mod clock;
pub mod registry;
pub mod store;

pub use adapter::Adapter;
pub use clock::Clock;
pub use registry::ServicePointRegistry;
pub use store::TurnStore;
