// Copyright 2026 the Repaint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! byte buffer as little-endian records: a one-byte tag, a nanosecond
//! timestamp, then the event fields. [`decode`] reads them back as an
//! iterator of [`Record`].
//!
//! The buffer is shared with [`RecordingHandle`], so the bytes stay reachable
//! after the sink has been moved into a
//! [`PaintScheduler`](repaint_core::scheduler::PaintScheduler).
//!
//! The rich [`on_paint_rects`](TraceSink::on_paint_rects) event stores only
//! the count.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use kurbo::{Rect, Size, Vec2};
use repaint_core::aggregator::ScrollUpdate;
use repaint_core::backend::FlushStatus;
use repaint_core::token::Generation;
use repaint_core::trace::{
    CallbackKind, DamageEvent, DamageKind, FlushCompleteEvent, FlushEvent, PaintBeginEvent,
    PaintEndEvent, ResizeEvent, StaleCallbackEvent, TraceSink, WakeupEvent, WakeupScheduledEvent,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_DAMAGE: u8 = 1;
const TAG_WAKEUP_SCHEDULED: u8 = 2;
const TAG_WAKEUP: u8 = 3;
const TAG_PAINT_BEGIN: u8 = 4;
const TAG_PAINT_END: u8 = 5;
const TAG_FLUSH: u8 = 6;
const TAG_FLUSH_COMPLETE: u8 = 7;
const TAG_STALE_CALLBACK: u8 = 8;
const TAG_RESIZE: u8 = 9;
const TAG_PAINT_RECTS_COUNT: u8 = 10;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

type Clock = Box<dyn FnMut() -> u64>;

/// A [`TraceSink`] that encodes events into a compact binary buffer.
pub struct RecorderSink {
    buf: Rc<RefCell<Vec<u8>>>,
    clock: Clock,
}

impl std::fmt::Debug for RecorderSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecorderSink")
            .field("len", &self.buf.borrow().len())
            .finish_non_exhaustive()
    }
}

impl Default for RecorderSink {
    fn default() -> Self {
        Self::new()
    }
}

impl RecorderSink {
    /// Creates an empty recorder timestamping events with nanoseconds since
    /// its creation.
    #[must_use]
    pub fn new() -> Self {
        let start = Instant::now();
        Self::with_clock(move || u64::try_from(start.elapsed().as_nanos()).unwrap_or(u64::MAX))
    }

    /// Creates an empty recorder that reads timestamps from `clock`.
    #[must_use]
    pub fn with_clock(clock: impl FnMut() -> u64 + 'static) -> Self {
        Self {
            buf: Rc::new(RefCell::new(Vec::new())),
            clock: Box::new(clock),
        }
    }

    /// Returns a handle to the recorded bytes that outlives the sink.
    #[must_use]
    pub fn handle(&self) -> RecordingHandle {
        RecordingHandle(Rc::clone(&self.buf))
    }

    /// Returns a copy of the recorded bytes.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.buf.borrow().clone()
    }

    // -- encoding helpers --------------------------------------------------

    fn begin(&mut self, tag: u8) {
        let now = (self.clock)();
        self.write_u8(tag);
        self.write_u64(now);
    }

    fn write_u8(&mut self, v: u8) {
        self.buf.borrow_mut().push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.borrow_mut().extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.borrow_mut().extend_from_slice(&v.to_le_bytes());
    }

    fn write_f64(&mut self, v: f64) {
        self.write_u64(v.to_bits());
    }

    fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    fn write_rect(&mut self, r: Rect) {
        self.write_f64(r.x0);
        self.write_f64(r.y0);
        self.write_f64(r.x1);
        self.write_f64(r.y1);
    }

    fn write_vec2(&mut self, v: Vec2) {
        self.write_f64(v.x);
        self.write_f64(v.y);
    }

    fn write_scroll(&mut self, s: Option<ScrollUpdate>) {
        match s {
            Some(s) => {
                self.write_u8(1);
                self.write_rect(s.rect);
                self.write_vec2(s.delta);
            }
            None => {
                self.write_u8(0);
                self.write_rect(Rect::ZERO);
                self.write_vec2(Vec2::ZERO);
            }
        }
    }

    fn write_token(&mut self, serial: u64, generation: Generation) {
        self.write_u64(serial);
        self.write_u32(generation.0);
    }
}

impl TraceSink for RecorderSink {
    fn on_damage(&mut self, e: &DamageEvent) {
        self.begin(TAG_DAMAGE);
        self.write_u8(match e.kind {
            DamageKind::Invalidate => 0,
            DamageKind::InvalidateRect => 1,
            DamageKind::Scroll => 2,
        });
        self.write_rect(e.rect);
        self.write_vec2(e.delta);
        self.write_u32(e.generation.0);
    }

    fn on_wakeup_scheduled(&mut self, e: &WakeupScheduledEvent) {
        self.begin(TAG_WAKEUP_SCHEDULED);
        self.write_token(e.token.serial(), e.token.generation());
    }

    fn on_wakeup(&mut self, e: &WakeupEvent) {
        self.begin(TAG_WAKEUP);
        self.write_token(e.token.serial(), e.token.generation());
        self.write_bool(e.has_update);
    }

    fn on_paint_begin(&mut self, e: &PaintBeginEvent) {
        self.begin(TAG_PAINT_BEGIN);
        self.write_u64(e.cycle);
        self.write_u32(e.generation.0);
        self.write_u32(e.rect_count);
        self.write_rect(e.bounds);
        self.write_scroll(e.scroll);
    }

    fn on_paint_end(&mut self, e: &PaintEndEvent) {
        self.begin(TAG_PAINT_END);
        self.write_u64(e.cycle);
        self.write_bool(e.painted);
    }

    fn on_flush(&mut self, e: &FlushEvent) {
        self.begin(TAG_FLUSH);
        self.write_u64(e.cycle);
        self.write_token(e.token.serial(), e.token.generation());
        self.write_u8(match e.status {
            FlushStatus::Completed => 0,
            FlushStatus::Pending => 1,
            FlushStatus::InProgress => 2,
        });
    }

    fn on_flush_complete(&mut self, e: &FlushCompleteEvent) {
        self.begin(TAG_FLUSH_COMPLETE);
        self.write_token(e.token.serial(), e.token.generation());
        self.write_bool(e.has_update);
    }

    fn on_stale_callback(&mut self, e: &StaleCallbackEvent) {
        self.begin(TAG_STALE_CALLBACK);
        self.write_u8(match e.kind {
            CallbackKind::Wakeup => 0,
            CallbackKind::Flush => 1,
        });
        self.write_token(e.serial, e.issued);
        self.write_u32(e.current.0);
    }

    fn on_resize(&mut self, e: &ResizeEvent) {
        self.begin(TAG_RESIZE);
        self.write_u32(e.generation.0);
        self.write_f64(e.size.width);
        self.write_f64(e.size.height);
        self.write_bool(e.allocated);
    }

    fn on_paint_rects(&mut self, cycle: u64, rects: &[Rect]) {
        self.begin(TAG_PAINT_RECTS_COUNT);
        self.write_u64(cycle);
        self.write_u32(u32::try_from(rects.len()).unwrap_or(u32::MAX));
    }
}

/// Shared view of the bytes written by a [`RecorderSink`].
#[derive(Clone, Debug)]
pub struct RecordingHandle(Rc<RefCell<Vec<u8>>>);

impl RecordingHandle {
    /// Returns a copy of the recorded bytes.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.borrow().clone()
    }

    /// Returns the number of recorded bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
///
/// Token-carrying events are flattened into `serial` and `generation`,
/// since tokens can only be minted by the scheduler.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`DamageEvent`].
    Damage(DamageEvent),
    /// A [`WakeupScheduledEvent`].
    WakeupScheduled {
        /// Token serial.
        serial: u64,
        /// Token generation.
        generation: Generation,
    },
    /// A [`WakeupEvent`].
    Wakeup {
        /// Token serial.
        serial: u64,
        /// Token generation.
        generation: Generation,
        /// Whether there was damage to paint.
        has_update: bool,
    },
    /// A [`PaintBeginEvent`].
    PaintBegin(PaintBeginEvent),
    /// A [`PaintEndEvent`].
    PaintEnd(PaintEndEvent),
    /// A [`FlushEvent`].
    Flush {
        /// Paint cycle that issued the flush.
        cycle: u64,
        /// Token serial.
        serial: u64,
        /// Token generation.
        generation: Generation,
        /// Reported status.
        status: FlushStatus,
    },
    /// A [`FlushCompleteEvent`].
    FlushComplete {
        /// Token serial.
        serial: u64,
        /// Token generation.
        generation: Generation,
        /// Whether damage accumulated during the flush.
        has_update: bool,
    },
    /// A [`StaleCallbackEvent`].
    StaleCallback(StaleCallbackEvent),
    /// A [`ResizeEvent`].
    Resize(ResizeEvent),
    /// Paint-rect count for a cycle.
    PaintRectsCount {
        /// Paint cycle counter.
        cycle: u64,
        /// Number of rectangles.
        count: u32,
    },
}

/// A decoded event with the time it was recorded.
#[derive(Clone, Debug)]
pub struct Record {
    /// Clock reading when the event was recorded, in nanoseconds.
    pub timestamp_ns: u64,
    /// The event.
    pub event: RecordedEvent,
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`Record`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded records.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn read_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?.try_into().ok()?;
        self.pos += N;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        Some(self.read_array::<1>()?[0])
    }

    fn read_u32(&mut self) -> Option<u32> {
        Some(u32::from_le_bytes(self.read_array()?))
    }

    fn read_u64(&mut self) -> Option<u64> {
        Some(u64::from_le_bytes(self.read_array()?))
    }

    fn read_f64(&mut self) -> Option<f64> {
        Some(f64::from_bits(self.read_u64()?))
    }

    fn read_bool(&mut self) -> Option<bool> {
        Some(self.read_u8()? != 0)
    }

    fn read_generation(&mut self) -> Option<Generation> {
        Some(Generation(self.read_u32()?))
    }

    fn read_rect(&mut self) -> Option<Rect> {
        Some(Rect::new(
            self.read_f64()?,
            self.read_f64()?,
            self.read_f64()?,
            self.read_f64()?,
        ))
    }

    fn read_vec2(&mut self) -> Option<Vec2> {
        Some(Vec2::new(self.read_f64()?, self.read_f64()?))
    }

    fn read_scroll(&mut self) -> Option<Option<ScrollUpdate>> {
        let present = self.read_bool()?;
        let rect = self.read_rect()?;
        let delta = self.read_vec2()?;
        Some(present.then_some(ScrollUpdate { rect, delta }))
    }

    fn decode_damage(&mut self) -> Option<RecordedEvent> {
        let kind = match self.read_u8()? {
            0 => DamageKind::Invalidate,
            1 => DamageKind::InvalidateRect,
            _ => DamageKind::Scroll,
        };
        Some(RecordedEvent::Damage(DamageEvent {
            kind,
            rect: self.read_rect()?,
            delta: self.read_vec2()?,
            generation: self.read_generation()?,
        }))
    }

    fn decode_wakeup_scheduled(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::WakeupScheduled {
            serial: self.read_u64()?,
            generation: self.read_generation()?,
        })
    }

    fn decode_wakeup(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Wakeup {
            serial: self.read_u64()?,
            generation: self.read_generation()?,
            has_update: self.read_bool()?,
        })
    }

    fn decode_paint_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PaintBegin(PaintBeginEvent {
            cycle: self.read_u64()?,
            generation: self.read_generation()?,
            rect_count: self.read_u32()?,
            bounds: self.read_rect()?,
            scroll: self.read_scroll()?,
        }))
    }

    fn decode_paint_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PaintEnd(PaintEndEvent {
            cycle: self.read_u64()?,
            painted: self.read_bool()?,
        }))
    }

    fn decode_flush(&mut self) -> Option<RecordedEvent> {
        let cycle = self.read_u64()?;
        let serial = self.read_u64()?;
        let generation = self.read_generation()?;
        let status = match self.read_u8()? {
            0 => FlushStatus::Completed,
            1 => FlushStatus::Pending,
            _ => FlushStatus::InProgress,
        };
        Some(RecordedEvent::Flush {
            cycle,
            serial,
            generation,
            status,
        })
    }

    fn decode_flush_complete(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FlushComplete {
            serial: self.read_u64()?,
            generation: self.read_generation()?,
            has_update: self.read_bool()?,
        })
    }

    fn decode_stale_callback(&mut self) -> Option<RecordedEvent> {
        let kind = match self.read_u8()? {
            0 => CallbackKind::Wakeup,
            _ => CallbackKind::Flush,
        };
        Some(RecordedEvent::StaleCallback(StaleCallbackEvent {
            kind,
            serial: self.read_u64()?,
            issued: self.read_generation()?,
            current: self.read_generation()?,
        }))
    }

    fn decode_resize(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Resize(ResizeEvent {
            generation: self.read_generation()?,
            size: Size::new(self.read_f64()?, self.read_f64()?),
            allocated: self.read_bool()?,
        }))
    }

    fn decode_paint_rects_count(&mut self) -> Option<RecordedEvent> {
        let cycle = self.read_u64()?;
        let count = self.read_u32()?;
        Some(RecordedEvent::PaintRectsCount { cycle, count })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = Record;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        let timestamp_ns = self.read_u64()?;
        let event = match tag {
            TAG_DAMAGE => self.decode_damage(),
            TAG_WAKEUP_SCHEDULED => self.decode_wakeup_scheduled(),
            TAG_WAKEUP => self.decode_wakeup(),
            TAG_PAINT_BEGIN => self.decode_paint_begin(),
            TAG_PAINT_END => self.decode_paint_end(),
            TAG_FLUSH => self.decode_flush(),
            TAG_FLUSH_COMPLETE => self.decode_flush_complete(),
            TAG_STALE_CALLBACK => self.decode_stale_callback(),
            TAG_RESIZE => self.decode_resize(),
            TAG_PAINT_RECTS_COUNT => self.decode_paint_rects_count(),
            _ => None, // unknown tag → stop iteration
        }?;
        Some(Record {
            timestamp_ns,
            event,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    /// A recorder whose clock advances by 1000ns per event.
    fn stepping_recorder() -> RecorderSink {
        let now = Rc::new(Cell::new(0_u64));
        RecorderSink::with_clock(move || {
            now.set(now.get() + 1000);
            now.get()
        })
    }

    fn sample_paint_begin() -> PaintBeginEvent {
        PaintBeginEvent {
            cycle: 4,
            generation: Generation(2),
            rect_count: 3,
            bounds: Rect::new(0.0, 0.0, 64.0, 32.0),
            scroll: Some(ScrollUpdate {
                rect: Rect::new(0.0, 0.0, 64.0, 32.0),
                delta: Vec2::new(0.0, -8.0),
            }),
        }
    }

    #[test]
    fn paint_begin_keeps_geometry() {
        let mut rec = stepping_recorder();
        let orig = sample_paint_begin();
        rec.on_paint_begin(&orig);

        let records: Vec<_> = decode(&rec.to_bytes()).collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].timestamp_ns, 1000);
        match &records[0].event {
            RecordedEvent::PaintBegin(e) => {
                assert_eq!(e.cycle, orig.cycle);
                assert_eq!(e.generation, orig.generation);
                assert_eq!(e.rect_count, orig.rect_count);
                assert_eq!(e.bounds, orig.bounds);
                assert_eq!(e.scroll, orig.scroll);
            }
            other => panic!("expected PaintBegin, got {other:?}"),
        }
    }

    #[test]
    fn damage_and_resize_decode_in_order() {
        let mut rec = stepping_recorder();
        rec.on_resize(&ResizeEvent {
            generation: Generation(1),
            size: Size::new(320.0, 200.0),
            allocated: true,
        });
        rec.on_damage(&DamageEvent {
            kind: DamageKind::Scroll,
            rect: Rect::new(0.0, 0.0, 320.0, 100.0),
            delta: Vec2::new(0.0, 16.0),
            generation: Generation(1),
        });
        rec.on_paint_end(&PaintEndEvent {
            cycle: 1,
            painted: false,
        });

        let records: Vec<_> = decode(&rec.to_bytes()).collect();
        assert_eq!(records.len(), 3);
        assert_eq!(
            records.iter().map(|r| r.timestamp_ns).collect::<Vec<_>>(),
            [1000, 2000, 3000]
        );
        match &records[0].event {
            RecordedEvent::Resize(e) => {
                assert_eq!(e.size, Size::new(320.0, 200.0));
                assert!(e.allocated);
            }
            other => panic!("expected Resize, got {other:?}"),
        }
        match &records[1].event {
            RecordedEvent::Damage(e) => {
                assert_eq!(e.kind, DamageKind::Scroll);
                assert_eq!(e.delta, Vec2::new(0.0, 16.0));
            }
            other => panic!("expected Damage, got {other:?}"),
        }
        assert!(matches!(
            records[2].event,
            RecordedEvent::PaintEnd(PaintEndEvent { painted: false, .. })
        ));
    }

    #[test]
    fn stale_callback_keeps_both_generations() {
        let mut rec = stepping_recorder();
        rec.on_stale_callback(&StaleCallbackEvent {
            kind: CallbackKind::Flush,
            serial: 9,
            issued: Generation(1),
            current: Generation(3),
        });
        let records: Vec<_> = decode(&rec.to_bytes()).collect();
        match &records[0].event {
            RecordedEvent::StaleCallback(e) => {
                assert_eq!(e.kind, CallbackKind::Flush);
                assert_eq!(e.serial, 9);
                assert_eq!(e.issued, Generation(1));
                assert_eq!(e.current, Generation(3));
            }
            other => panic!("expected StaleCallback, got {other:?}"),
        }
    }

    #[test]
    fn handle_sees_bytes_after_sink_moves() {
        let rec = stepping_recorder();
        let handle = rec.handle();
        let mut boxed: Box<dyn TraceSink> = Box::new(rec);
        assert!(handle.is_empty());
        boxed.on_paint_rects(2, &[Rect::ZERO, Rect::ZERO]);
        drop(boxed);

        let records: Vec<_> = decode(&handle.to_bytes()).collect();
        assert!(matches!(
            records[0].event,
            RecordedEvent::PaintRectsCount { cycle: 2, count: 2 }
        ));
    }

    #[test]
    fn truncated_record_stops_iteration() {
        let mut rec = stepping_recorder();
        rec.on_paint_begin(&sample_paint_begin());
        rec.on_paint_begin(&sample_paint_begin());
        let mut bytes = rec.to_bytes();
        bytes.truncate(bytes.len() - 3);
        assert_eq!(decode(&bytes).count(), 1);
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        let records: Vec<_> = decode(&[]).collect();
        assert!(records.is_empty());
    }
}
