// Copyright 2026 the Repaint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the paint loop.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! [`PaintScheduler`](crate::scheduler::PaintScheduler) calls at each stage of
//! the damage → wake-up → paint → flush cycle. All method bodies default to
//! no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`): gates the per-cycle paint rectangle
//!   list and the corresponding `TraceSink` method.

use kurbo::{Rect, Size, Vec2};

use crate::aggregator::ScrollUpdate;
use crate::backend::FlushStatus;
use crate::token::{FlushToken, Generation, WakeupToken};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which damage entry point was called.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DamageKind {
    /// Full-surface invalidation.
    Invalidate,
    /// Invalidation of a single rectangle.
    InvalidateRect,
    /// Scroll of a region.
    Scroll,
}

/// Which kind of callback a [`StaleCallbackEvent`] refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallbackKind {
    /// A manual wake-up scheduled on the host.
    Wakeup,
    /// A flush completion reported by a surface.
    Flush,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted for every damage call that reaches the aggregator.
#[derive(Clone, Copy, Debug)]
pub struct DamageEvent {
    /// Which entry point recorded the damage.
    pub kind: DamageKind,
    /// The damaged (or scrolled) rectangle after clipping to the surface.
    pub rect: Rect,
    /// Scroll offset; zero for invalidations.
    pub delta: Vec2,
    /// Surface generation at the time of the call.
    pub generation: Generation,
}

/// Emitted when the scheduler asks the host for a manual wake-up.
#[derive(Clone, Copy, Debug)]
pub struct WakeupScheduledEvent {
    /// Token the host will hand back.
    pub token: WakeupToken,
}

/// Emitted when a current (non-stale) manual wake-up fires.
#[derive(Clone, Copy, Debug)]
pub struct WakeupEvent {
    /// Token of the wake-up.
    pub token: WakeupToken,
    /// Whether there was damage to paint.
    pub has_update: bool,
}

/// Marks the start of a paint cycle, after the pending update was taken.
#[derive(Clone, Copy, Debug)]
pub struct PaintBeginEvent {
    /// Monotonic paint cycle counter.
    pub cycle: u64,
    /// Surface generation being painted.
    pub generation: Generation,
    /// Number of paint rectangles handed to the client.
    pub rect_count: u32,
    /// Union of the paint rectangles.
    pub bounds: Rect,
    /// Scroll applied before painting, if any.
    pub scroll: Option<ScrollUpdate>,
}

/// Marks the end of a paint cycle's client callback.
#[derive(Clone, Copy, Debug)]
pub struct PaintEndEvent {
    /// Paint cycle counter.
    pub cycle: u64,
    /// Whether the client reported drawing anything.
    pub painted: bool,
}

/// Emitted after a flush was issued to the surface.
#[derive(Clone, Copy, Debug)]
pub struct FlushEvent {
    /// Paint cycle that produced the flush.
    pub cycle: u64,
    /// Token passed to the surface.
    pub token: FlushToken,
    /// What the surface reported.
    pub status: FlushStatus,
}

/// Emitted when a current (non-stale) flush completion arrives.
#[derive(Clone, Copy, Debug)]
pub struct FlushCompleteEvent {
    /// Token of the completed flush.
    pub token: FlushToken,
    /// Whether damage accumulated while the flush was in flight.
    pub has_update: bool,
}

/// Emitted when a callback from a replaced surface arrives and is ignored.
#[derive(Clone, Copy, Debug)]
pub struct StaleCallbackEvent {
    /// Which callback it was.
    pub kind: CallbackKind,
    /// Serial number from the callback's token.
    pub serial: u64,
    /// Generation the callback was issued for.
    pub issued: Generation,
    /// Current surface generation.
    pub current: Generation,
}

/// Emitted when the scheduler replaces its surface.
#[derive(Clone, Copy, Debug)]
pub struct ResizeEvent {
    /// The new surface generation.
    pub generation: Generation,
    /// Requested surface size.
    pub size: Size,
    /// Whether a surface was allocated.
    pub allocated: bool,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the paint loop.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when damage is recorded.
    fn on_damage(&mut self, e: &DamageEvent) {
        _ = e;
    }

    /// Called when a manual wake-up is scheduled.
    fn on_wakeup_scheduled(&mut self, e: &WakeupScheduledEvent) {
        _ = e;
    }

    /// Called when a manual wake-up fires.
    fn on_wakeup(&mut self, e: &WakeupEvent) {
        _ = e;
    }

    /// Called at the start of a paint cycle.
    fn on_paint_begin(&mut self, e: &PaintBeginEvent) {
        _ = e;
    }

    /// Called after the client's paint callback returns.
    fn on_paint_end(&mut self, e: &PaintEndEvent) {
        _ = e;
    }

    /// Called after a flush is issued.
    fn on_flush(&mut self, e: &FlushEvent) {
        _ = e;
    }

    /// Called when a flush completes asynchronously.
    fn on_flush_complete(&mut self, e: &FlushCompleteEvent) {
        _ = e;
    }

    /// Called when a stale callback is dropped.
    fn on_stale_callback(&mut self, e: &StaleCallbackEvent) {
        _ = e;
    }

    /// Called when the surface is replaced.
    fn on_resize(&mut self, e: &ResizeEvent) {
        _ = e;
    }

    /// Called with the rectangles handed to the client (requires `trace-rich`
    /// feature).
    #[cfg(feature = "trace-rich")]
    fn on_paint_rects(&mut self, cycle: u64, rects: &[Rect]) {
        _ = (cycle, rects);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

/// Generates a `Tracer` method forwarding one event to the sink.
macro_rules! emit {
    ($(#[$meta:meta])* $name:ident, $event:ty, $method:ident) => {
        $(#[$meta])*
        #[inline]
        pub fn $name(&mut self, e: &$event) {
            #[cfg(feature = "trace")]
            if let Some(s) = &mut self.sink {
                s.$method(e);
            }
            #[cfg(not(feature = "trace"))]
            {
                _ = e;
            }
        }
    };
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    emit!(
        /// Emits a [`DamageEvent`].
        damage, DamageEvent, on_damage
    );
    emit!(
        /// Emits a [`WakeupScheduledEvent`].
        wakeup_scheduled, WakeupScheduledEvent, on_wakeup_scheduled
    );
    emit!(
        /// Emits a [`WakeupEvent`].
        wakeup, WakeupEvent, on_wakeup
    );
    emit!(
        /// Emits a [`PaintBeginEvent`].
        paint_begin, PaintBeginEvent, on_paint_begin
    );
    emit!(
        /// Emits a [`PaintEndEvent`].
        paint_end, PaintEndEvent, on_paint_end
    );
    emit!(
        /// Emits a [`FlushEvent`].
        flush, FlushEvent, on_flush
    );
    emit!(
        /// Emits a [`FlushCompleteEvent`].
        flush_complete, FlushCompleteEvent, on_flush_complete
    );
    emit!(
        /// Emits a [`StaleCallbackEvent`].
        stale_callback, StaleCallbackEvent, on_stale_callback
    );
    emit!(
        /// Emits a [`ResizeEvent`].
        resize, ResizeEvent, on_resize
    );

    /// Emits the paint rectangles of a cycle (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn paint_rects(&mut self, cycle: u64, rects: &[Rect]) {
        if let Some(s) = &mut self.sink {
            s.on_paint_rects(cycle, rects);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
