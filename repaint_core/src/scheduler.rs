// Copyright 2026 the Repaint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paint scheduling with a single flush in flight.
//!
//! The [`PaintScheduler`] turns damage calls into paint cycles. It owns the
//! surface, the client that renders into it, and one [`UpdateAggregator`].
//!
//! # State machine
//!
//! At any time the scheduler waits on at most one callback:
//!
//! | State          | on damage                 | on flush complete | on wake-up |
//! |----------------|---------------------------|-------------------|------------|
//! | idle           | schedule wake-up          | n/a               | n/a        |
//! | wake-up pending| coalesce                  | n/a               | paint      |
//! | flush pending  | coalesce                  | paint             | n/a        |
//!
//! A paint cycle takes the pending update, applies its scroll to the surface,
//! calls the client, and flushes if the client drew anything. A flush that
//! completes asynchronously parks the scheduler in *flush pending*; its
//! completion doubles as the next wake-up, so damage arriving meanwhile costs
//! no extra round-trip.
//!
//! # Surface generations
//!
//! Every [`resize`](PaintScheduler::resize) replaces the surface and bumps the
//! [`Generation`]. Wake-ups and flush completions issued for an older
//! generation are ignored when they arrive.

use alloc::boxed::Box;
use core::fmt;
use core::time::Duration;

use kurbo::{Rect, Size, Vec2};

use crate::aggregator::{AggregatorConfig, PaintUpdate, ScrollUpdate, UpdateAggregator};
use crate::backend::{FlushStatus, PaintClient, PresentationTarget, Surface, TaskHost};
use crate::error::ResizeError;
use crate::geometry::clip;
use crate::trace::{
    CallbackKind, DamageEvent, DamageKind, FlushCompleteEvent, FlushEvent, PaintBeginEvent,
    PaintEndEvent, ResizeEvent, StaleCallbackEvent, TraceSink, Tracer, WakeupEvent,
    WakeupScheduledEvent,
};
use crate::token::{FlushToken, Generation, WakeupToken};

/// What the client sees during a paint cycle.
///
/// Damage recorded through the context lands in the scheduler's aggregator
/// and is painted in a later cycle.
pub struct PaintContext<'a, S> {
    surface: &'a mut S,
    rects: &'a [Rect],
    bounds: Rect,
    scroll: Option<ScrollUpdate>,
    aggregator: &'a mut UpdateAggregator,
}

impl<S> fmt::Debug for PaintContext<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaintContext")
            .field("rects", &self.rects)
            .field("bounds", &self.bounds)
            .field("scroll", &self.scroll)
            .finish_non_exhaustive()
    }
}

impl<'a, S> PaintContext<'a, S> {
    /// The surface to paint into. Any scroll has already been applied.
    #[must_use]
    pub fn surface(&self) -> &S {
        self.surface
    }

    /// Mutable access to the surface.
    pub fn surface_mut(&mut self) -> &mut S {
        self.surface
    }

    /// The rectangles to repaint.
    #[must_use]
    pub fn rects(&self) -> &[Rect] {
        self.rects
    }

    /// The union of [`rects`](Self::rects).
    #[must_use]
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// The scroll that was applied before this paint, if any.
    #[must_use]
    pub fn scroll(&self) -> Option<ScrollUpdate> {
        self.scroll
    }

    /// Requests another full repaint after this one.
    pub fn invalidate(&mut self) {
        self.aggregator.invalidate_all();
    }

    /// Requests a repaint of `rect` after this one.
    pub fn invalidate_rect(&mut self, rect: Rect) {
        self.aggregator.invalidate_rect(rect);
    }

    /// Requests a scroll after this paint.
    pub fn scroll_rect(&mut self, clip_rect: Rect, delta: Vec2) {
        self.aggregator.scroll_rect(clip_rect, delta);
    }
}

/// The presentation target and client, supplied once by
/// [`PaintScheduler::bind`].
struct Binding<T, C> {
    target: T,
    client: C,
    always_opaque: bool,
}

/// Drives paint cycles for one surface.
///
/// `T` allocates surfaces, `C` paints them, and `H` runs wake-ups. The host
/// delivers callbacks by calling [`on_wakeup`](Self::on_wakeup) and
/// [`on_flush_complete`](Self::on_flush_complete) on the rendering thread.
///
/// # Lifecycle
///
/// 1. [`new`](Self::new) with the task host.
/// 2. [`bind`](Self::bind) the target and client (once).
/// 3. [`resize`](Self::resize) to allocate the first surface. This schedules
///    the first full paint.
/// 4. Record damage; deliver callbacks as they fire.
pub struct PaintScheduler<T: PresentationTarget, C, H> {
    host: H,
    binding: Option<Binding<T, C>>,
    surface: Option<T::Surface>,
    size: Size,
    aggregator: UpdateAggregator,
    generation: Generation,
    wakeup_pending: bool,
    flush_pending: bool,
    next_serial: u64,
    cycle: u64,
    sink: Option<Box<dyn TraceSink>>,
}

impl<T: PresentationTarget, C, H> fmt::Debug for PaintScheduler<T, C, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaintScheduler")
            .field("size", &self.size)
            .field("generation", &self.generation)
            .field("wakeup_pending", &self.wakeup_pending)
            .field("flush_pending", &self.flush_pending)
            .field("cycle", &self.cycle)
            .field("aggregator", &self.aggregator)
            .finish_non_exhaustive()
    }
}

impl<T, C, H> PaintScheduler<T, C, H>
where
    T: PresentationTarget,
    C: PaintClient<T::Surface>,
    H: TaskHost,
{
    /// Creates an unbound scheduler.
    #[must_use]
    pub fn new(host: H, config: AggregatorConfig) -> Self {
        Self {
            host,
            binding: None,
            surface: None,
            size: Size::ZERO,
            aggregator: UpdateAggregator::new(config),
            generation: Generation::default(),
            wakeup_pending: false,
            flush_pending: false,
            next_serial: 0,
            cycle: 0,
            sink: None,
        }
    }

    /// Installs a trace sink.
    ///
    /// Events are only delivered when the `trace` feature is enabled.
    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink>) {
        self.sink = Some(sink);
    }

    /// Removes and returns the trace sink.
    pub fn take_trace_sink(&mut self) -> Option<Box<dyn TraceSink>> {
        self.sink.take()
    }

    /// Supplies the presentation target and the client.
    ///
    /// `always_opaque` is passed to every
    /// [`create_surface`](PresentationTarget::create_surface) call.
    ///
    /// # Panics
    ///
    /// Panics if the scheduler is already bound.
    pub fn bind(&mut self, target: T, client: C, always_opaque: bool) {
        assert!(
            self.binding.is_none(),
            "PaintScheduler::bind called more than once"
        );
        self.binding = Some(Binding {
            target,
            client,
            always_opaque,
        });
    }

    /// Replaces the surface with one of `size` and schedules a full paint.
    ///
    /// A resize to the current size does nothing. Otherwise all pending
    /// damage and callbacks of the old surface are discarded, even if the
    /// new surface cannot be created.
    ///
    /// # Errors
    ///
    /// Returns [`ResizeError`] if `size` has no area or the target fails to
    /// allocate the surface. The scheduler is then left without a surface.
    ///
    /// # Panics
    ///
    /// Panics if called before [`bind`](Self::bind).
    pub fn resize(&mut self, size: Size) -> Result<(), ResizeError> {
        let Some(binding) = self.binding.as_mut() else {
            panic!("PaintScheduler::resize called before bind");
        };
        if size == self.size {
            return Ok(());
        }

        self.generation = self.generation.next();
        self.wakeup_pending = false;
        self.flush_pending = false;
        self.surface = None;
        self.size = Size::ZERO;
        self.aggregator.set_bounds(Size::ZERO);

        let surface = if size.width > 0.0 && size.height > 0.0 {
            binding.target.create_surface(size, binding.always_opaque)
        } else {
            None
        };
        tracer(&mut self.sink).resize(&ResizeEvent {
            generation: self.generation,
            size,
            allocated: surface.is_some(),
        });
        let Some(surface) = surface else {
            let (width, height) = (size.width, size.height);
            return Err(if width > 0.0 && height > 0.0 {
                ResizeError::AllocationFailed { width, height }
            } else {
                ResizeError::EmptySize { width, height }
            });
        };

        binding.target.bind_surface(&surface);
        self.surface = Some(surface);
        self.size = size;
        self.aggregator.set_bounds(size);
        self.invalidate();
        Ok(())
    }

    /// Schedules a repaint of the whole surface.
    ///
    /// # Panics
    ///
    /// Panics if there is no surface.
    pub fn invalidate(&mut self) {
        self.assert_surface("invalidate");
        self.ensure_wakeup();
        self.aggregator.invalidate_all();
        let rect = self.aggregator.bounds();
        self.trace_damage(DamageKind::Invalidate, rect, Vec2::ZERO);
    }

    /// Schedules a repaint of `rect`.
    ///
    /// Rectangles that are empty after clipping to the surface are ignored.
    ///
    /// # Panics
    ///
    /// Panics if there is no surface.
    pub fn invalidate_rect(&mut self, rect: Rect) {
        self.assert_surface("invalidate_rect");
        let Some(rect) = clip(rect, self.aggregator.bounds()) else {
            return;
        };
        self.ensure_wakeup();
        self.aggregator.invalidate_rect(rect);
        self.trace_damage(DamageKind::InvalidateRect, rect, Vec2::ZERO);
    }

    /// Schedules a scroll of the content inside `clip_rect` by `delta`.
    ///
    /// # Panics
    ///
    /// Panics if there is no surface.
    pub fn scroll_rect(&mut self, clip_rect: Rect, delta: Vec2) {
        self.assert_surface("scroll_rect");
        self.ensure_wakeup();
        self.aggregator.scroll_rect(clip_rect, delta);
        let rect = clip_rect.intersect(self.aggregator.bounds());
        self.trace_damage(DamageKind::Scroll, rect, delta);
    }

    /// Handles a manual wake-up scheduled through [`TaskHost::schedule`].
    ///
    /// # Panics
    ///
    /// Panics if `token` is current but no wake-up is pending.
    pub fn on_wakeup(&mut self, token: WakeupToken) {
        if self.is_stale(CallbackKind::Wakeup, token.serial, token.generation) {
            return;
        }
        assert!(
            self.wakeup_pending,
            "wake-up {token:?} delivered but none is pending"
        );
        self.wakeup_pending = false;
        let has_update = self.aggregator.has_pending_update();
        tracer(&mut self.sink).wakeup(&WakeupEvent { token, has_update });
        if has_update && !self.flush_pending {
            self.paint();
        }
    }

    /// Handles completion of an asynchronous flush.
    ///
    /// # Panics
    ///
    /// Panics if `token` is current but no flush is pending.
    pub fn on_flush_complete(&mut self, token: FlushToken) {
        if self.is_stale(CallbackKind::Flush, token.serial, token.generation) {
            return;
        }
        assert!(
            self.flush_pending,
            "flush completion {token:?} delivered but no flush is pending"
        );
        self.flush_pending = false;
        let has_update = self.aggregator.has_pending_update();
        tracer(&mut self.sink).flush_complete(&FlushCompleteEvent { token, has_update });
        if has_update {
            self.paint();
        }
    }

    /// Returns the current surface size, or [`Size::ZERO`] without a surface.
    #[must_use]
    pub fn size(&self) -> Size {
        self.size
    }

    /// Returns the current surface.
    #[must_use]
    pub fn surface(&self) -> Option<&T::Surface> {
        self.surface.as_ref()
    }

    /// Returns the current surface mutably.
    pub fn surface_mut(&mut self) -> Option<&mut T::Surface> {
        self.surface.as_mut()
    }

    /// Returns the presentation target, if bound.
    #[must_use]
    pub fn target(&self) -> Option<&T> {
        self.binding.as_ref().map(|b| &b.target)
    }

    /// Returns the client, if bound.
    #[must_use]
    pub fn client(&self) -> Option<&C> {
        self.binding.as_ref().map(|b| &b.client)
    }

    /// Returns the client mutably, if bound.
    pub fn client_mut(&mut self) -> Option<&mut C> {
        self.binding.as_mut().map(|b| &mut b.client)
    }

    /// Returns the task host.
    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Returns the task host mutably.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Returns the current surface generation.
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Returns `true` while an issued flush has not completed.
    #[must_use]
    pub fn is_flush_pending(&self) -> bool {
        self.flush_pending
    }

    /// Returns `true` while a scheduled wake-up has not fired.
    #[must_use]
    pub fn is_wakeup_pending(&self) -> bool {
        self.wakeup_pending
    }

    /// Returns `true` if damage is waiting for the next paint.
    #[must_use]
    pub fn has_pending_update(&self) -> bool {
        self.aggregator.has_pending_update()
    }

    /// Returns a snapshot of the damage waiting for the next paint.
    #[must_use]
    pub fn pending_update(&self) -> PaintUpdate {
        self.aggregator.get_pending_update()
    }

    fn assert_surface(&self, op: &str) {
        assert!(
            self.surface.is_some(),
            "PaintScheduler::{op} called without a surface"
        );
    }

    fn ensure_wakeup(&mut self) {
        if self.flush_pending || self.wakeup_pending {
            return;
        }
        let token = WakeupToken {
            serial: self.bump_serial(),
            generation: self.generation,
        };
        self.wakeup_pending = true;
        self.host.schedule(token, Duration::ZERO);
        tracer(&mut self.sink).wakeup_scheduled(&WakeupScheduledEvent { token });
    }

    fn bump_serial(&mut self) -> u64 {
        self.next_serial += 1;
        self.next_serial
    }

    fn is_stale(&mut self, kind: CallbackKind, serial: u64, issued: Generation) -> bool {
        if issued == self.generation {
            return false;
        }
        tracer(&mut self.sink).stale_callback(&StaleCallbackEvent {
            kind,
            serial,
            issued,
            current: self.generation,
        });
        true
    }

    fn trace_damage(&mut self, kind: DamageKind, rect: Rect, delta: Vec2) {
        tracer(&mut self.sink).damage(&DamageEvent {
            kind,
            rect,
            delta,
            generation: self.generation,
        });
    }

    /// Runs one paint cycle.
    fn paint(&mut self) {
        assert!(
            self.aggregator.has_pending_update(),
            "paint cycle started with no pending update"
        );
        let (Some(binding), Some(surface)) = (self.binding.as_mut(), self.surface.as_mut()) else {
            panic!("paint cycle started without a surface");
        };

        let update = self.aggregator.take_pending_update();
        self.cycle += 1;
        let cycle = self.cycle;
        tracer(&mut self.sink).paint_begin(&PaintBeginEvent {
            cycle,
            generation: self.generation,
            rect_count: u32::try_from(update.paint_rects.len()).unwrap_or(u32::MAX),
            bounds: update.paint_bounds,
            scroll: update.scroll,
        });
        #[cfg(feature = "trace-rich")]
        tracer(&mut self.sink).paint_rects(cycle, &update.paint_rects);

        if let Some(scroll) = update.scroll {
            surface.scroll(scroll.rect, scroll.delta);
        }
        let mut cx = PaintContext {
            surface: &mut *surface,
            rects: &update.paint_rects,
            bounds: update.paint_bounds,
            scroll: update.scroll,
            aggregator: &mut self.aggregator,
        };
        let painted = binding.client.paint(&mut cx);
        tracer(&mut self.sink).paint_end(&PaintEndEvent { cycle, painted });

        if painted {
            self.next_serial += 1;
            let token = FlushToken {
                serial: self.next_serial,
                generation: self.generation,
            };
            let status = surface.flush(token);
            tracer(&mut self.sink).flush(&FlushEvent {
                cycle,
                token,
                status,
            });
            assert!(
                status != FlushStatus::InProgress,
                "flush {token:?} issued while another flush is in progress"
            );
            self.flush_pending = status == FlushStatus::Pending;
        }

        // Damage raised by the client waits for the flush to complete.
        if self.aggregator.has_pending_update() {
            self.ensure_wakeup();
        }
    }
}

fn tracer(sink: &mut Option<Box<dyn TraceSink>>) -> Tracer<'_> {
    match sink {
        Some(sink) => Tracer::new(&mut **sink),
        None => Tracer::none(),
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    enum Op {
        Scroll(Rect, Vec2),
        Flush(FlushToken),
    }

    #[derive(Debug)]
    struct TestSurface {
        id: u32,
        size: Size,
        opaque: bool,
        status: FlushStatus,
        ops: Vec<Op>,
    }

    impl Surface for TestSurface {
        fn size(&self) -> Size {
            self.size
        }

        fn scroll(&mut self, rect: Rect, delta: Vec2) {
            self.ops.push(Op::Scroll(rect, delta));
        }

        fn flush(&mut self, token: FlushToken) -> FlushStatus {
            self.ops.push(Op::Flush(token));
            self.status
        }
    }

    #[derive(Debug, Default)]
    struct TestTarget {
        status: Option<FlushStatus>,
        fail: bool,
        created: u32,
        bound: Vec<u32>,
    }

    impl PresentationTarget for TestTarget {
        type Surface = TestSurface;

        fn create_surface(&mut self, size: Size, always_opaque: bool) -> Option<TestSurface> {
            if self.fail {
                return None;
            }
            self.created += 1;
            Some(TestSurface {
                id: self.created,
                size,
                opaque: always_opaque,
                status: self.status.unwrap_or(FlushStatus::Pending),
                ops: Vec::new(),
            })
        }

        fn bind_surface(&mut self, surface: &TestSurface) {
            self.bound.push(surface.id);
        }
    }

    #[derive(Debug, Default)]
    struct TestHost {
        scheduled: Vec<(WakeupToken, Duration)>,
    }

    impl TaskHost for TestHost {
        fn schedule(&mut self, token: WakeupToken, delay: Duration) {
            self.scheduled.push((token, delay));
        }
    }

    #[derive(Clone, Debug, PartialEq)]
    struct PaintCall {
        rects: Vec<Rect>,
        bounds: Rect,
        scroll: Option<ScrollUpdate>,
        ops_before: Vec<Op>,
    }

    #[derive(Debug)]
    struct TestClient {
        calls: Vec<PaintCall>,
        paints: bool,
        reentrant: Vec<Rect>,
    }

    impl Default for TestClient {
        fn default() -> Self {
            Self {
                calls: Vec::new(),
                paints: true,
                reentrant: Vec::new(),
            }
        }
    }

    impl PaintClient<TestSurface> for TestClient {
        fn paint(&mut self, cx: &mut PaintContext<'_, TestSurface>) -> bool {
            self.calls.push(PaintCall {
                rects: cx.rects().to_vec(),
                bounds: cx.bounds(),
                scroll: cx.scroll(),
                ops_before: cx.surface().ops.clone(),
            });
            for rect in self.reentrant.drain(..) {
                cx.invalidate_rect(rect);
            }
            self.paints
        }
    }

    type TestScheduler = PaintScheduler<TestTarget, TestClient, TestHost>;

    fn scheduler_with(status: FlushStatus) -> TestScheduler {
        let mut scheduler = PaintScheduler::new(TestHost::default(), AggregatorConfig::DEFAULT);
        let target = TestTarget {
            status: Some(status),
            ..TestTarget::default()
        };
        scheduler.bind(target, TestClient::default(), true);
        scheduler
    }

    fn last_wakeup(scheduler: &TestScheduler) -> WakeupToken {
        scheduler.host().scheduled.last().expect("no wake-up scheduled").0
    }

    fn last_flush(scheduler: &TestScheduler) -> FlushToken {
        let ops = &scheduler.surface().expect("no surface").ops;
        ops.iter()
            .rev()
            .find_map(|op| match op {
                Op::Flush(token) => Some(*token),
                Op::Scroll(..) => None,
            })
            .expect("no flush issued")
    }

    fn calls(scheduler: &TestScheduler) -> &[PaintCall] {
        &scheduler.client().expect("unbound").calls
    }

    /// Resizes to 100x100 and runs the initial full paint to completion.
    fn ready(status: FlushStatus) -> TestScheduler {
        let mut scheduler = scheduler_with(status);
        scheduler.resize(Size::new(100.0, 100.0)).unwrap();
        let token = last_wakeup(&scheduler);
        scheduler.on_wakeup(token);
        if scheduler.is_flush_pending() {
            let flush = last_flush(&scheduler);
            scheduler.on_flush_complete(flush);
        }
        assert!(!scheduler.is_wakeup_pending());
        assert!(!scheduler.is_flush_pending());
        scheduler
    }

    #[test]
    fn resize_schedules_full_paint() {
        let mut scheduler = scheduler_with(FlushStatus::Pending);
        scheduler.resize(Size::new(100.0, 50.0)).unwrap();

        assert_eq!(scheduler.generation(), Generation(1));
        assert_eq!(scheduler.target().unwrap().bound, vec![1]);
        assert!(scheduler.surface().unwrap().opaque);
        assert_eq!(scheduler.host().scheduled.len(), 1);
        assert_eq!(scheduler.host().scheduled[0].1, Duration::ZERO);

        scheduler.on_wakeup(last_wakeup(&scheduler));
        assert_eq!(
            calls(&scheduler),
            &[PaintCall {
                rects: vec![Rect::new(0.0, 0.0, 100.0, 50.0)],
                bounds: Rect::new(0.0, 0.0, 100.0, 50.0),
                scroll: None,
                ops_before: Vec::new(),
            }]
        );
        assert!(scheduler.is_flush_pending());
    }

    #[test]
    fn resize_to_same_size_is_noop() {
        let mut scheduler = ready(FlushStatus::Completed);
        let scheduled = scheduler.host().scheduled.len();
        scheduler.resize(Size::new(100.0, 100.0)).unwrap();
        assert_eq!(scheduler.generation(), Generation(1));
        assert_eq!(scheduler.target().unwrap().created, 1);
        assert_eq!(scheduler.host().scheduled.len(), scheduled);
    }

    #[test]
    fn damage_is_coalesced_into_one_wakeup() {
        let mut scheduler = ready(FlushStatus::Completed);
        let before = scheduler.host().scheduled.len();

        scheduler.invalidate_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        scheduler.invalidate_rect(Rect::new(50.0, 50.0, 60.0, 60.0));
        scheduler.invalidate_rect(Rect::new(0.0, 0.0, 10.0, 10.0));

        assert_eq!(scheduler.host().scheduled.len(), before + 1);
        scheduler.on_wakeup(last_wakeup(&scheduler));

        let last = calls(&scheduler).last().unwrap();
        assert_eq!(
            last.rects,
            vec![
                Rect::new(0.0, 0.0, 10.0, 10.0),
                Rect::new(50.0, 50.0, 60.0, 60.0),
            ]
        );
        assert_eq!(last.bounds, Rect::new(0.0, 0.0, 60.0, 60.0));
        assert_eq!(calls(&scheduler).len(), 2);
    }

    #[test]
    fn offscreen_rect_schedules_nothing() {
        let mut scheduler = ready(FlushStatus::Completed);
        let before = scheduler.host().scheduled.len();
        scheduler.invalidate_rect(Rect::new(200.0, 200.0, 300.0, 300.0));
        scheduler.invalidate_rect(Rect::new(10.0, 10.0, 10.0, 20.0));
        assert_eq!(scheduler.host().scheduled.len(), before);
        assert!(!scheduler.has_pending_update());
    }

    #[test]
    fn at_most_one_flush_in_flight() {
        let mut scheduler = ready(FlushStatus::Pending);
        scheduler.invalidate_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        scheduler.on_wakeup(last_wakeup(&scheduler));
        assert!(scheduler.is_flush_pending());
        let scheduled = scheduler.host().scheduled.len();

        // Damage while the flush is in flight waits for its completion.
        scheduler.invalidate_rect(Rect::new(20.0, 20.0, 30.0, 30.0));
        scheduler.invalidate_rect(Rect::new(40.0, 40.0, 50.0, 50.0));
        assert_eq!(scheduler.host().scheduled.len(), scheduled);
        assert!(!scheduler.is_wakeup_pending());
        assert_eq!(calls(&scheduler).len(), 2);

        let flushes_before = scheduler
            .surface()
            .unwrap()
            .ops
            .iter()
            .filter(|op| matches!(op, Op::Flush(_)))
            .count();
        scheduler.on_flush_complete(last_flush(&scheduler));

        assert_eq!(calls(&scheduler).len(), 3);
        assert_eq!(calls(&scheduler)[2].rects.len(), 2);
        let flushes_after = scheduler
            .surface()
            .unwrap()
            .ops
            .iter()
            .filter(|op| matches!(op, Op::Flush(_)))
            .count();
        assert_eq!(flushes_after, flushes_before + 1);
        assert!(scheduler.is_flush_pending());
        assert_eq!(scheduler.host().scheduled.len(), scheduled);
    }

    #[test]
    fn flush_completion_without_damage_goes_idle() {
        let mut scheduler = ready(FlushStatus::Pending);
        assert!(!scheduler.has_pending_update());
        assert_eq!(calls(&scheduler).len(), 1);
    }

    #[test]
    fn scroll_is_applied_before_paint() {
        let mut scheduler = ready(FlushStatus::Completed);
        scheduler.invalidate_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        scheduler.scroll_rect(Rect::new(0.0, 0.0, 100.0, 100.0), Vec2::new(5.0, 0.0));
        scheduler.on_wakeup(last_wakeup(&scheduler));

        let last = calls(&scheduler).last().unwrap();
        assert_eq!(
            last.ops_before.last(),
            Some(&Op::Scroll(
                Rect::new(0.0, 0.0, 100.0, 100.0),
                Vec2::new(5.0, 0.0)
            ))
        );
        assert!(last.rects.contains(&Rect::new(5.0, 0.0, 15.0, 10.0)));
        assert!(last.rects.contains(&Rect::new(0.0, 0.0, 5.0, 100.0)));
        assert_eq!(
            last.scroll.map(|s| s.delta),
            Some(Vec2::new(5.0, 0.0))
        );
    }

    #[test]
    fn nothing_painted_means_no_flush() {
        let mut scheduler = ready(FlushStatus::Pending);
        scheduler.client_mut().unwrap().paints = false;
        let ops = scheduler.surface().unwrap().ops.len();

        scheduler.invalidate_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        scheduler.on_wakeup(last_wakeup(&scheduler));

        assert_eq!(calls(&scheduler).len(), 2);
        assert_eq!(scheduler.surface().unwrap().ops.len(), ops);
        assert!(!scheduler.is_flush_pending());
        assert!(!scheduler.is_wakeup_pending());
    }

    #[test]
    fn reentrant_damage_waits_for_flush() {
        let mut scheduler = ready(FlushStatus::Pending);
        scheduler
            .client_mut()
            .unwrap()
            .reentrant
            .push(Rect::new(70.0, 70.0, 80.0, 80.0));
        let scheduled = scheduler.host().scheduled.len();

        scheduler.invalidate_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        scheduler.on_wakeup(last_wakeup(&scheduler));

        // The re-entrant rect was not part of the cycle that raised it.
        assert_eq!(
            calls(&scheduler)[1].rects,
            vec![Rect::new(0.0, 0.0, 10.0, 10.0)]
        );
        assert!(scheduler.has_pending_update());
        assert!(scheduler.is_flush_pending());
        assert_eq!(scheduler.host().scheduled.len(), scheduled + 1);

        scheduler.on_flush_complete(last_flush(&scheduler));
        assert_eq!(
            calls(&scheduler)[2].rects,
            vec![Rect::new(70.0, 70.0, 80.0, 80.0)]
        );
    }

    #[test]
    fn reentrant_damage_without_paint_runs_next_cycle_unflushed() {
        let mut scheduler = ready(FlushStatus::Pending);
        let client = scheduler.client_mut().unwrap();
        client.paints = false;
        client.reentrant.push(Rect::new(70.0, 70.0, 80.0, 80.0));
        let ops = scheduler.surface().unwrap().ops.len();

        scheduler.invalidate_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        let first = last_wakeup(&scheduler);
        let scheduled = scheduler.host().scheduled.len();
        scheduler.on_wakeup(first);

        assert_eq!(calls(&scheduler).len(), 2);
        assert!(!scheduler.is_flush_pending());
        assert!(scheduler.is_wakeup_pending());
        assert_eq!(scheduler.host().scheduled.len(), scheduled + 1);

        scheduler.on_wakeup(last_wakeup(&scheduler));
        assert_eq!(calls(&scheduler).len(), 3);
        assert_eq!(
            calls(&scheduler)[2].rects,
            vec![Rect::new(70.0, 70.0, 80.0, 80.0)]
        );
        assert_eq!(scheduler.surface().unwrap().ops.len(), ops);
        assert!(!scheduler.is_wakeup_pending());
        assert!(!scheduler.has_pending_update());
    }

    #[test]
    fn reentrant_damage_after_sync_flush_schedules_wakeup() {
        let mut scheduler = ready(FlushStatus::Completed);
        scheduler
            .client_mut()
            .unwrap()
            .reentrant
            .push(Rect::new(70.0, 70.0, 80.0, 80.0));

        scheduler.invalidate_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        let first = last_wakeup(&scheduler);
        scheduler.on_wakeup(first);

        assert!(!scheduler.is_flush_pending());
        assert!(scheduler.is_wakeup_pending());
        let second = last_wakeup(&scheduler);
        assert_ne!(first, second);

        scheduler.on_wakeup(second);
        assert_eq!(
            calls(&scheduler).last().unwrap().rects,
            vec![Rect::new(70.0, 70.0, 80.0, 80.0)]
        );
        assert!(!scheduler.is_wakeup_pending());
    }

    #[test]
    fn wakeup_with_nothing_to_do_is_noop() {
        let mut scheduler = ready(FlushStatus::Completed);
        scheduler.scroll_rect(Rect::new(0.0, 0.0, 100.0, 100.0), Vec2::ZERO);
        assert!(scheduler.is_wakeup_pending());
        assert!(!scheduler.has_pending_update());

        scheduler.on_wakeup(last_wakeup(&scheduler));
        assert_eq!(calls(&scheduler).len(), 1);
        assert!(!scheduler.is_wakeup_pending());
    }

    #[test]
    fn stale_wakeup_is_ignored() {
        let mut scheduler = scheduler_with(FlushStatus::Completed);
        scheduler.resize(Size::new(100.0, 100.0)).unwrap();
        let stale = last_wakeup(&scheduler);
        scheduler.resize(Size::new(200.0, 100.0)).unwrap();
        let current = last_wakeup(&scheduler);
        assert_ne!(stale.generation(), current.generation());

        scheduler.on_wakeup(stale);
        assert!(calls(&scheduler).is_empty());
        assert!(scheduler.is_wakeup_pending());

        scheduler.on_wakeup(current);
        assert_eq!(
            calls(&scheduler)[0].rects,
            vec![Rect::new(0.0, 0.0, 200.0, 100.0)]
        );
    }

    #[test]
    fn stale_flush_completion_is_ignored() {
        let mut scheduler = ready(FlushStatus::Pending);
        scheduler.invalidate();
        scheduler.on_wakeup(last_wakeup(&scheduler));
        let stale = last_flush(&scheduler);
        assert!(scheduler.is_flush_pending());

        scheduler.resize(Size::new(50.0, 50.0)).unwrap();
        assert!(!scheduler.is_flush_pending());
        assert!(scheduler.is_wakeup_pending());

        scheduler.on_flush_complete(stale);
        assert_eq!(calls(&scheduler).len(), 2);
        assert!(scheduler.has_pending_update());
    }

    #[test]
    fn allocation_failure_drops_surface() {
        let target = TestTarget {
            fail: true,
            ..TestTarget::default()
        };
        let mut scheduler = PaintScheduler::new(TestHost::default(), AggregatorConfig::DEFAULT);
        scheduler.bind(target, TestClient::default(), false);
        assert_eq!(
            scheduler.resize(Size::new(64.0, 32.0)),
            Err(ResizeError::AllocationFailed {
                width: 64.0,
                height: 32.0
            })
        );
        assert!(scheduler.surface().is_none());
        assert_eq!(scheduler.size(), Size::ZERO);
        assert_eq!(scheduler.generation(), Generation(1));
        assert!(scheduler.host().scheduled.is_empty());
        assert!(!scheduler.has_pending_update());
    }

    #[test]
    fn empty_size_is_rejected() {
        let mut scheduler = ready(FlushStatus::Completed);
        scheduler.invalidate_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(
            scheduler.resize(Size::new(0.0, 10.0)),
            Err(ResizeError::EmptySize {
                width: 0.0,
                height: 10.0
            })
        );
        assert!(scheduler.surface().is_none());
        assert!(!scheduler.has_pending_update());
        assert!(!scheduler.is_wakeup_pending());

        // A later resize recovers.
        scheduler.resize(Size::new(10.0, 10.0)).unwrap();
        assert_eq!(scheduler.generation(), Generation(3));
        assert!(scheduler.is_wakeup_pending());
    }

    #[test]
    #[should_panic(expected = "called without a surface")]
    fn damage_without_surface_panics() {
        let mut scheduler = scheduler_with(FlushStatus::Completed);
        scheduler.invalidate_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    #[should_panic(expected = "called more than once")]
    fn double_bind_panics() {
        let mut scheduler = scheduler_with(FlushStatus::Completed);
        scheduler.bind(TestTarget::default(), TestClient::default(), false);
    }

    #[test]
    #[should_panic(expected = "called before bind")]
    fn resize_before_bind_panics() {
        let mut scheduler: TestScheduler =
            PaintScheduler::new(TestHost::default(), AggregatorConfig::DEFAULT);
        let _ = scheduler.resize(Size::new(10.0, 10.0));
    }

    #[test]
    #[should_panic(expected = "while another flush is in progress")]
    fn flush_in_progress_panics() {
        let mut scheduler = scheduler_with(FlushStatus::InProgress);
        scheduler.resize(Size::new(10.0, 10.0)).unwrap();
        scheduler.on_wakeup(last_wakeup(&scheduler));
    }

    #[test]
    #[should_panic(expected = "no flush is pending")]
    fn unexpected_flush_completion_panics() {
        let mut scheduler = ready(FlushStatus::Completed);
        let token = last_flush(&scheduler);
        scheduler.on_flush_complete(token);
    }

    #[test]
    fn closure_clients_are_supported() {
        let mut painted = 0_u32;
        {
            let client = |cx: &mut PaintContext<'_, TestSurface>| {
                painted += 1;
                !cx.rects().is_empty()
            };
            let mut scheduler = PaintScheduler::new(TestHost::default(), AggregatorConfig::DEFAULT);
            scheduler.bind(TestTarget::default(), client, false);
            scheduler.resize(Size::new(10.0, 10.0)).unwrap();
            let token = scheduler.host().scheduled[0].0;
            scheduler.on_wakeup(token);
            assert!(scheduler.is_flush_pending());
        }
        assert_eq!(painted, 1);
    }

    #[cfg(feature = "trace")]
    #[test]
    fn trace_sink_sees_paint_cycle() {
        use alloc::rc::Rc;
        use core::cell::RefCell;

        #[derive(Default)]
        struct Log {
            events: Vec<&'static str>,
        }
        struct Sink(Rc<RefCell<Log>>);
        impl TraceSink for Sink {
            fn on_resize(&mut self, _: &ResizeEvent) {
                self.0.borrow_mut().events.push("resize");
            }
            fn on_damage(&mut self, _: &DamageEvent) {
                self.0.borrow_mut().events.push("damage");
            }
            fn on_wakeup_scheduled(&mut self, _: &WakeupScheduledEvent) {
                self.0.borrow_mut().events.push("schedule");
            }
            fn on_wakeup(&mut self, _: &WakeupEvent) {
                self.0.borrow_mut().events.push("wakeup");
            }
            fn on_paint_begin(&mut self, _: &PaintBeginEvent) {
                self.0.borrow_mut().events.push("paint-begin");
            }
            fn on_paint_end(&mut self, _: &PaintEndEvent) {
                self.0.borrow_mut().events.push("paint-end");
            }
            fn on_flush(&mut self, _: &FlushEvent) {
                self.0.borrow_mut().events.push("flush");
            }
            fn on_stale_callback(&mut self, _: &StaleCallbackEvent) {
                self.0.borrow_mut().events.push("stale");
            }
        }

        let log = Rc::new(RefCell::new(Log::default()));
        let mut scheduler = scheduler_with(FlushStatus::Pending);
        scheduler.set_trace_sink(Box::new(Sink(log.clone())));
        scheduler.resize(Size::new(10.0, 10.0)).unwrap();
        scheduler.on_wakeup(last_wakeup(&scheduler));
        let flush = last_flush(&scheduler);
        scheduler.resize(Size::new(20.0, 20.0)).unwrap();
        scheduler.on_flush_complete(flush);

        assert_eq!(
            log.borrow().events,
            vec![
                "resize",
                "schedule",
                "damage",
                "wakeup",
                "paint-begin",
                "paint-end",
                "flush",
                "resize",
                "schedule",
                "damage",
                "stale",
            ]
        );
    }
}
