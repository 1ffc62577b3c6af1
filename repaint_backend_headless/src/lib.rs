// Copyright 2026 the Repaint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory backend for `repaint_core`.
//!
//! This crate drives a [`PaintScheduler`] without a window system. It
//! provides:
//!
//! - [`MainThread`]: a single-threaded event loop that collects wake-ups and
//!   flush completions in the order a real compositor would deliver them.
//! - [`HeadlessHost`]: a [`TaskHost`](repaint_core::TaskHost) posting
//!   wake-ups into that loop.
//! - [`HeadlessTarget`] and [`HeadlessSurface`]: CPU pixel buffers whose
//!   flushes complete immediately, through the loop, or only when released
//!   by hand (see [`FlushMode`]).
//!
//! [`dispatch_next`] and [`run_until_idle`] pump the loop into the scheduler.
//!
//! ```
//! use kurbo::Size;
//! use repaint_backend_headless::{
//!     FlushMode, HeadlessHost, HeadlessSurface, HeadlessTarget, MainThread, run_until_idle,
//! };
//! use repaint_core::{AggregatorConfig, PaintContext, PaintScheduler};
//!
//! let main = MainThread::new();
//! let mut scheduler = PaintScheduler::new(HeadlessHost::new(&main), AggregatorConfig::DEFAULT);
//! scheduler.bind(
//!     HeadlessTarget::new(&main, FlushMode::Async),
//!     |cx: &mut PaintContext<'_, HeadlessSurface>| {
//!         for rect in cx.rects().to_vec() {
//!             cx.surface_mut().fill_rect(rect, 0xFF33_66CC);
//!         }
//!         true
//!     },
//!     true,
//! );
//! scheduler.resize(Size::new(64.0, 48.0)).unwrap();
//!
//! // One wake-up, then one flush completion.
//! assert_eq!(run_until_idle(&main, &mut scheduler), 2);
//! assert_eq!(scheduler.surface().unwrap().presented(), 1);
//! ```

mod main_thread;
mod queue;
mod surface;

use repaint_core::PaintClient;
use repaint_core::scheduler::PaintScheduler;

pub use main_thread::{HeadlessHost, HostEvent, MainThread};
pub use surface::{FlushMode, HeadlessSurface, HeadlessTarget, SurfaceId, SurfaceOp};

/// A scheduler wired to the headless backend.
pub type HeadlessScheduler<C> = PaintScheduler<HeadlessTarget, C, HeadlessHost>;

/// Delivers the oldest queued event to `scheduler`.
///
/// Flush completions are first applied to the current surface, so the
/// surface is free for the next flush by the time the scheduler sees them.
/// Returns `false` if the queue was empty.
pub fn dispatch_next<C>(main: &MainThread, scheduler: &mut HeadlessScheduler<C>) -> bool
where
    C: PaintClient<HeadlessSurface>,
{
    let Some(event) = main.pop() else {
        return false;
    };
    match event {
        HostEvent::Wakeup(token) => scheduler.on_wakeup(token),
        HostEvent::FlushComplete(token) => {
            if let Some(surface) = scheduler.surface_mut() {
                surface.finish_flush(token);
            }
            scheduler.on_flush_complete(token);
        }
    }
    true
}

/// Dispatches events until the queue is empty.
///
/// Returns the number of events delivered. Flushes in
/// [`FlushMode::Held`] never post on their own, so the loop stops while
/// they are outstanding.
pub fn run_until_idle<C>(main: &MainThread, scheduler: &mut HeadlessScheduler<C>) -> usize
where
    C: PaintClient<HeadlessSurface>,
{
    let mut delivered = 0;
    while dispatch_next(main, scheduler) {
        delivered += 1;
    }
    delivered
}
