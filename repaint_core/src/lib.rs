// Copyright 2026 the Repaint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Damage aggregation and paint scheduling for off-screen surfaces.
//!
//! `repaint_core` batches damage requests (invalidate a rectangle, invalidate
//! everything, scroll a region) into a single coalesced update, hands that
//! update to a client for rendering into an off-screen surface, and
//! serializes the resulting buffer swaps ("flushes") so that at most one is
//! ever in flight. It is `no_std` compatible (with `alloc`) and performs no
//! I/O of its own: surfaces, task hosts and clients are supplied through the
//! traits in [`backend`].
//!
//! # Architecture
//!
//! ```text
//!   invalidate / invalidate_rect / scroll_rect
//!       │
//!       ▼
//!   UpdateAggregator ◄───────────────┐ re-entrant damage
//!       │                            │
//!       │ wake-up or flush complete  │
//!       ▼                            │
//!   take_pending_update() ──► Surface::scroll() ──► PaintClient::paint()
//!                                                        │
//!                 ┌──────────────────────────────────────┘
//!                 ▼
//!   Surface::flush() ──► Completed | Pending ──► on_flush_complete()
//! ```
//!
//! **[`aggregator`]**: Pending damage: paint rectangles plus at most one
//! scroll, with containment, full-surface and scroll-composition rules.
//!
//! **[`scheduler`]**: The [`PaintScheduler`](scheduler::PaintScheduler)
//! state machine: one wake-up or one flush outstanding at a time, stale
//! callbacks dropped by surface generation.
//!
//! **[`backend`]**: Traits that presentation targets, surfaces, task hosts
//! and clients implement.
//!
//! **[`token`]**: Generation-tagged wake-up and flush tokens.
//!
//! **[`geometry`]**: Rectangle helpers over [`kurbo::Rect`].
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! paint-loop instrumentation, with zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates the per-cycle
//!   paint rectangle event.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod aggregator;
pub mod backend;
pub mod error;
pub mod geometry;
pub mod scheduler;
pub mod token;
pub mod trace;

pub use aggregator::{AggregatorConfig, PaintUpdate, ScrollUpdate, UpdateAggregator};
pub use backend::{FlushStatus, PaintClient, PresentationTarget, Surface, TaskHost};
pub use error::ResizeError;
pub use scheduler::{PaintContext, PaintScheduler};
pub use token::{FlushToken, Generation, WakeupToken};
