// Copyright 2026 the Repaint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fan-out to two sinks.

use kurbo::Rect;
use repaint_core::trace::{
    DamageEvent, FlushCompleteEvent, FlushEvent, PaintBeginEvent, PaintEndEvent, ResizeEvent,
    StaleCallbackEvent, TraceSink, WakeupEvent, WakeupScheduledEvent,
};

/// A [`TraceSink`] that forwards every event to `A`, then to `B`.
///
/// Nest `Tee`s to fan out to more than two sinks.
#[derive(Clone, Debug, Default)]
pub struct Tee<A, B>(pub A, pub B);

impl<A: TraceSink, B: TraceSink> TraceSink for Tee<A, B> {
    fn on_damage(&mut self, e: &DamageEvent) {
        self.0.on_damage(e);
        self.1.on_damage(e);
    }

    fn on_wakeup_scheduled(&mut self, e: &WakeupScheduledEvent) {
        self.0.on_wakeup_scheduled(e);
        self.1.on_wakeup_scheduled(e);
    }

    fn on_wakeup(&mut self, e: &WakeupEvent) {
        self.0.on_wakeup(e);
        self.1.on_wakeup(e);
    }

    fn on_paint_begin(&mut self, e: &PaintBeginEvent) {
        self.0.on_paint_begin(e);
        self.1.on_paint_begin(e);
    }

    fn on_paint_end(&mut self, e: &PaintEndEvent) {
        self.0.on_paint_end(e);
        self.1.on_paint_end(e);
    }

    fn on_flush(&mut self, e: &FlushEvent) {
        self.0.on_flush(e);
        self.1.on_flush(e);
    }

    fn on_flush_complete(&mut self, e: &FlushCompleteEvent) {
        self.0.on_flush_complete(e);
        self.1.on_flush_complete(e);
    }

    fn on_stale_callback(&mut self, e: &StaleCallbackEvent) {
        self.0.on_stale_callback(e);
        self.1.on_stale_callback(e);
    }

    fn on_resize(&mut self, e: &ResizeEvent) {
        self.0.on_resize(e);
        self.1.on_resize(e);
    }

    fn on_paint_rects(&mut self, cycle: u64, rects: &[Rect]) {
        self.0.on_paint_rects(cycle, rects);
        self.1.on_paint_rects(cycle, rects);
    }
}
