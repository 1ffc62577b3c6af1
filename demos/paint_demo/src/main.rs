// Copyright 2026 the Repaint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Headless paint loop that exercises the tracing and diagnostics pipeline.
//!
//! Drives a [`PaintScheduler`] over the headless backend through a short
//! scenario: a first frame, a burst of invalidations, scrolling, damage
//! raised while a flush is held back, and a resize that lands while a flush
//! is still in flight. Every event is printed by a
//! [`PrettyPrintSink`](repaint_debug::pretty::PrettyPrintSink) and captured
//! by a [`RecorderSink`](repaint_debug::recorder::RecorderSink), and the
//! recording is exported as a Chrome trace.

use std::fs::File;
use std::io::BufWriter;

use kurbo::{Rect, Size, Vec2};
use repaint_backend_headless::{
    FlushMode, HeadlessHost, HeadlessScheduler, HeadlessSurface, HeadlessTarget, MainThread,
    dispatch_next, run_until_idle,
};
use repaint_core::{AggregatorConfig, PaintClient, PaintContext, PaintScheduler};
use repaint_debug::pretty::PrettyPrintSink;
use repaint_debug::recorder::RecorderSink;
use repaint_debug::tee::Tee;

const HEADER: Rect = Rect::new(0.0, 0.0, 320.0, 40.0);
const LIST: Rect = Rect::new(0.0, 40.0, 320.0, 240.0);
const ROW_HEIGHT: f64 = 16.0;

/// Fills damage with a color that changes every cycle.
#[derive(Debug, Default)]
struct Canvas {
    cycles: u32,
}

impl PaintClient<HeadlessSurface> for Canvas {
    fn paint(&mut self, cx: &mut PaintContext<'_, HeadlessSurface>) -> bool {
        self.cycles += 1;
        let shade = (self.cycles * 0x11) & 0xFF;
        let color = 0xFF00_0000 | (shade << 16) | (shade << 8) | 0x80;
        for rect in cx.rects().to_vec() {
            cx.surface_mut().fill_rect(rect, color);
        }
        // A blinking caret keeps asking for the next frame.
        if self.cycles == 3 {
            cx.invalidate_rect(Rect::new(8.0, 8.0, 10.0, 32.0));
        }
        true
    }
}

fn section(title: &str) {
    println!("\n== {title}");
}

fn main() {
    // -- sinks -------------------------------------------------------------
    let recorder = RecorderSink::new();
    let recording = recorder.handle();
    let pretty = PrettyPrintSink::new(Box::new(std::io::stdout()));

    // -- scheduler ---------------------------------------------------------
    let main = MainThread::new();
    let mut scheduler: HeadlessScheduler<Canvas> =
        PaintScheduler::new(HeadlessHost::new(&main), AggregatorConfig::DEFAULT);
    scheduler.set_trace_sink(Box::new(Tee(pretty, recorder)));
    scheduler.bind(
        HeadlessTarget::new(&main, FlushMode::Async),
        Canvas::default(),
        true,
    );

    section("first frame");
    scheduler
        .resize(Size::new(320.0, 240.0))
        .expect("failed to allocate the surface");
    run_until_idle(&main, &mut scheduler);

    section("invalidation burst");
    for i in 0..5_u8 {
        let x = f64::from(i) * 40.0;
        scheduler.invalidate_rect(Rect::new(x, 50.0, x + 30.0, 70.0));
    }
    scheduler.invalidate_rect(HEADER);
    run_until_idle(&main, &mut scheduler);

    section("scrolling");
    for _ in 0..3 {
        scheduler.scroll_rect(LIST, Vec2::new(0.0, -ROW_HEIGHT));
    }
    run_until_idle(&main, &mut scheduler);

    section("damage while a flush is held");
    if let Some(surface) = scheduler.surface_mut() {
        surface.set_flush_mode(FlushMode::Held);
    }
    scheduler.invalidate_rect(HEADER);
    run_until_idle(&main, &mut scheduler);
    scheduler.scroll_rect(LIST, Vec2::new(0.0, -ROW_HEIGHT));
    scheduler.invalidate_rect(Rect::new(200.0, 10.0, 300.0, 30.0));
    scheduler.invalidate_rect(Rect::new(210.0, 12.0, 290.0, 28.0));
    if let Some(surface) = scheduler.surface_mut() {
        surface.release_flush();
        surface.set_flush_mode(FlushMode::Async);
    }
    run_until_idle(&main, &mut scheduler);

    section("resize while a flush is in flight");
    scheduler.invalidate();
    // Deliver the wake-up only, leaving the flush completion queued.
    dispatch_next(&main, &mut scheduler);
    scheduler
        .resize(Size::new(640.0, 480.0))
        .expect("failed to allocate the surface");
    run_until_idle(&main, &mut scheduler);

    // -- summary -----------------------------------------------------------
    let cycles = scheduler.client().map_or(0, |canvas| canvas.cycles);
    let presented = scheduler.surface().map_or(0, HeadlessSurface::presented);
    println!(
        "\n{cycles} paint cycles, {presented} frames presented on the final surface, \
         queue high-water {}",
        main.high_water(),
    );

    // -- export Chrome trace -----------------------------------------------
    let path = "trace.json";
    let file = File::create(path).expect("failed to create trace.json");
    let mut writer = BufWriter::new(file);
    repaint_debug::chrome::export(&recording.to_bytes(), &mut writer)
        .expect("failed to write Chrome trace");

    println!("Wrote {path} ({} bytes recorded)", recording.len());
}
