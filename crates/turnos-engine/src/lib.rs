// SPDX-FileCopyrightText: 2026 Turnos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turn-numbering and queue-ordering engine.
//!
//! - [`allocator`]: per-scope `max + 1` ticket numbers with a bounded
//!   retry on uniqueness conflicts
//! - [`ordering`]: the 1-priority-to-2-normal dispatch order and the
//!   current/next board
//! - [`state`]: the turn state machine and its permission rules
//! - [`policy`]: request-hour windows and advance booking dates
//! - [`service`]: [`TurnService`], the facade the API layer calls

pub mod allocator;
pub mod clock;
pub mod ordering;
pub mod policy;
pub mod recording;
pub mod service;
pub mod state;

pub use allocator::{Allocator, TurnDraft};
pub use clock::SystemClock;
pub use policy::CreationPolicy;
pub use service::{CreateTurnRequest, TurnService};
