// Copyright 2026 the Repaint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Rectangles
//! are printed as `x0,y0 WxH`.

use std::fmt;
use std::io::Write;

use kurbo::{Rect, Vec2};
use repaint_core::trace::{
    CallbackKind, DamageEvent, DamageKind, FlushCompleteEvent, FlushEvent, PaintBeginEvent,
    PaintEndEvent, ResizeEvent, StaleCallbackEvent, TraceSink, WakeupEvent, WakeupScheduledEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns the writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Compact rectangle formatting: `x0,y0 WxH`.
struct R(Rect);

impl fmt::Display for R {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.0;
        write!(f, "{},{} {}x{}", r.x0, r.y0, r.width(), r.height())
    }
}

/// Compact offset formatting: `(dx,dy)`.
struct D(Vec2);

impl fmt::Display for D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.0.x, self.0.y)
    }
}

fn damage_name(kind: DamageKind) -> &'static str {
    match kind {
        DamageKind::Invalidate => "invalidate",
        DamageKind::InvalidateRect => "invalidate-rect",
        DamageKind::Scroll => "scroll",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_damage(&mut self, e: &DamageEvent) {
        let _ = match e.kind {
            DamageKind::Scroll => writeln!(
                self.writer,
                "[damage] {} rect={} delta={} {:?}",
                damage_name(e.kind),
                R(e.rect),
                D(e.delta),
                e.generation,
            ),
            _ => writeln!(
                self.writer,
                "[damage] {} rect={} {:?}",
                damage_name(e.kind),
                R(e.rect),
                e.generation,
            ),
        };
    }

    fn on_wakeup_scheduled(&mut self, e: &WakeupScheduledEvent) {
        let _ = writeln!(self.writer, "[wakeup:schedule] {:?}", e.token);
    }

    fn on_wakeup(&mut self, e: &WakeupEvent) {
        let _ = writeln!(
            self.writer,
            "[wakeup] {:?} update={}",
            e.token, e.has_update,
        );
    }

    fn on_paint_begin(&mut self, e: &PaintBeginEvent) {
        let _ = write!(
            self.writer,
            "[paint:begin] cycle={} {:?} rects={} bounds={}",
            e.cycle,
            e.generation,
            e.rect_count,
            R(e.bounds),
        );
        let _ = match e.scroll {
            Some(s) => writeln!(self.writer, " scroll={} by {}", R(s.rect), D(s.delta)),
            None => writeln!(self.writer),
        };
    }

    fn on_paint_end(&mut self, e: &PaintEndEvent) {
        let _ = writeln!(
            self.writer,
            "[paint:end] cycle={} painted={}",
            e.cycle, e.painted,
        );
    }

    fn on_flush(&mut self, e: &FlushEvent) {
        let _ = writeln!(
            self.writer,
            "[flush] cycle={} {:?} status={:?}",
            e.cycle, e.token, e.status,
        );
    }

    fn on_flush_complete(&mut self, e: &FlushCompleteEvent) {
        let _ = writeln!(
            self.writer,
            "[flush:complete] {:?} update={}",
            e.token, e.has_update,
        );
    }

    fn on_stale_callback(&mut self, e: &StaleCallbackEvent) {
        let kind = match e.kind {
            CallbackKind::Wakeup => "wakeup",
            CallbackKind::Flush => "flush",
        };
        let _ = writeln!(
            self.writer,
            "[stale] {kind} #{} issued={:?} current={:?}",
            e.serial, e.issued, e.current,
        );
    }

    fn on_resize(&mut self, e: &ResizeEvent) {
        let outcome = if e.allocated { "ok" } else { "FAILED" };
        let _ = writeln!(
            self.writer,
            "[resize] {}x{} {:?} {outcome}",
            e.size.width, e.size.height, e.generation,
        );
    }

    fn on_paint_rects(&mut self, cycle: u64, rects: &[Rect]) {
        let _ = write!(self.writer, "[paint:rects] cycle={cycle}");
        for rect in rects {
            let _ = write!(self.writer, " [{}]", R(*rect));
        }
        let _ = writeln!(self.writer);
    }
}
