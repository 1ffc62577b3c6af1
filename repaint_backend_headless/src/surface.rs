// Copyright 2026 the Repaint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory surfaces and the target that allocates them.

use kurbo::{Rect, Size, Vec2};
use repaint_core::backend::{FlushStatus, PresentationTarget, Surface};
use repaint_core::token::FlushToken;

use crate::main_thread::{HostEvent, MainThread};

/// Identity of one allocated surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SurfaceId(pub u32);

/// How a [`HeadlessSurface`] completes flushes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FlushMode {
    /// Every flush completes synchronously.
    Immediate,
    /// Every flush completes through the [`MainThread`] queue.
    #[default]
    Async,
    /// Flushes stay in flight until [`HeadlessSurface::release_flush`].
    Held,
}

/// An operation the scheduler performed on a surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SurfaceOp {
    /// [`Surface::scroll`] was called.
    Scroll {
        /// Scrolled region.
        rect: Rect,
        /// Offset.
        delta: Vec2,
    },
    /// [`Surface::flush`] was called.
    Flush(FlushToken),
}

/// A CPU pixel buffer with a one-flush-in-flight presentation model.
///
/// Pixels are `0xAARRGGBB`. Clients draw with
/// [`fill_rect`](Self::fill_rect); coordinates are rounded to whole pixels.
#[derive(Debug)]
pub struct HeadlessSurface {
    id: SurfaceId,
    size: Size,
    width: usize,
    height: usize,
    opaque: bool,
    pixels: Vec<u32>,
    mode: FlushMode,
    in_flight: Option<FlushToken>,
    held: Option<FlushToken>,
    presented: u64,
    ops: Vec<SurfaceOp>,
    main: MainThread,
}

/// Largest pixel buffer a surface may allocate (1 GiB of `u32`s).
const MAX_PIXELS: usize = 1 << 28;

impl HeadlessSurface {
    /// Allocates a cleared buffer, or `None` if `size` exceeds [`MAX_PIXELS`].
    fn new(
        id: SurfaceId,
        size: Size,
        opaque: bool,
        mode: FlushMode,
        main: MainThread,
    ) -> Option<Self> {
        let width = to_pixels(size.width, usize::MAX);
        let height = to_pixels(size.height, usize::MAX);
        let count = width.checked_mul(height).filter(|n| *n <= MAX_PIXELS)?;
        let clear = if opaque { 0xFF00_0000 } else { 0 };
        Some(Self {
            id,
            size,
            width,
            height,
            opaque,
            pixels: vec![clear; count],
            mode,
            in_flight: None,
            held: None,
            presented: 0,
            ops: Vec::new(),
            main,
        })
    }

    /// Returns the surface identity.
    #[must_use]
    pub fn id(&self) -> SurfaceId {
        self.id
    }

    /// Returns `true` if the surface was allocated without an alpha channel.
    #[must_use]
    pub fn is_opaque(&self) -> bool {
        self.opaque
    }

    /// Returns the flush completion mode.
    #[must_use]
    pub fn flush_mode(&self) -> FlushMode {
        self.mode
    }

    /// Changes how later flushes complete.
    pub fn set_flush_mode(&mut self, mode: FlushMode) {
        self.mode = mode;
    }

    /// Returns the flush currently in flight.
    #[must_use]
    pub fn in_flight(&self) -> Option<FlushToken> {
        self.in_flight
    }

    /// Number of flushes that finished presenting.
    #[must_use]
    pub fn presented(&self) -> u64 {
        self.presented
    }

    /// Every scroll and flush performed on this surface, oldest first.
    #[must_use]
    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    /// Returns the pixel at `(x, y)`.
    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[y * self.width + x])
    }

    /// Fills `rect` with `color`, clipped to the surface.
    pub fn fill_rect(&mut self, rect: Rect, color: u32) {
        let (x0, y0, x1, y1) = self.span(rect);
        for y in y0..y1 {
            let row = y * self.width;
            self.pixels[row + x0..row + x1].fill(color);
        }
    }

    /// Queues completion of a [`FlushMode::Held`] flush.
    ///
    /// Returns `false` if no held flush is waiting.
    pub fn release_flush(&mut self) -> bool {
        let Some(token) = self.held.take() else {
            return false;
        };
        self.main.post(HostEvent::FlushComplete(token));
        true
    }

    /// Marks the flush identified by `token` as presented.
    ///
    /// Called by the event pump just before the completion reaches the
    /// scheduler. Tokens that are not in flight on this surface are ignored.
    pub fn finish_flush(&mut self, token: FlushToken) -> bool {
        if self.in_flight != Some(token) {
            return false;
        }
        self.in_flight = None;
        self.presented += 1;
        true
    }

    /// Pixel bounds of `rect`, clipped to the surface.
    fn span(&self, rect: Rect) -> (usize, usize, usize, usize) {
        let x0 = to_pixels(rect.x0, self.width);
        let y0 = to_pixels(rect.y0, self.height);
        let x1 = to_pixels(rect.x1, self.width).max(x0);
        let y1 = to_pixels(rect.y1, self.height).max(y0);
        (x0, y0, x1, y1)
    }
}

impl Surface for HeadlessSurface {
    fn size(&self) -> Size {
        self.size
    }

    fn scroll(&mut self, rect: Rect, delta: Vec2) {
        self.ops.push(SurfaceOp::Scroll { rect, delta });

        let (x0, y0, x1, y1) = self.span(rect);
        let (w, h) = (x1 - x0, y1 - y0);
        if w == 0 || h == 0 {
            return;
        }
        let snapshot: Vec<u32> = (y0..y1)
            .flat_map(|y| self.pixels[y * self.width + x0..y * self.width + x1].iter().copied())
            .collect();
        let dx = to_offset(delta.x);
        let dy = to_offset(delta.y);
        for y in 0..h {
            let Some(sy) = y.checked_add_signed(-dy).filter(|sy| *sy < h) else {
                continue;
            };
            for x in 0..w {
                let Some(sx) = x.checked_add_signed(-dx).filter(|sx| *sx < w) else {
                    continue;
                };
                self.pixels[(y0 + y) * self.width + x0 + x] = snapshot[sy * w + sx];
            }
        }
    }

    fn flush(&mut self, token: FlushToken) -> FlushStatus {
        if self.in_flight.is_some() {
            return FlushStatus::InProgress;
        }
        self.ops.push(SurfaceOp::Flush(token));
        match self.mode {
            FlushMode::Immediate => {
                self.presented += 1;
                FlushStatus::Completed
            }
            FlushMode::Async => {
                self.in_flight = Some(token);
                self.main.post(HostEvent::FlushComplete(token));
                FlushStatus::Pending
            }
            FlushMode::Held => {
                self.in_flight = Some(token);
                self.held = Some(token);
                FlushStatus::Pending
            }
        }
    }
}

/// Allocates [`HeadlessSurface`]s.
#[derive(Debug)]
pub struct HeadlessTarget {
    main: MainThread,
    mode: FlushMode,
    next_id: u32,
    bound: Option<SurfaceId>,
    fail_allocations: bool,
}

impl HeadlessTarget {
    /// Creates a target whose surfaces post completions to `main`.
    #[must_use]
    pub fn new(main: &MainThread, mode: FlushMode) -> Self {
        Self {
            main: main.clone(),
            mode,
            next_id: 0,
            bound: None,
            fail_allocations: false,
        }
    }

    /// Sets the flush mode for surfaces allocated from now on.
    pub fn set_flush_mode(&mut self, mode: FlushMode) {
        self.mode = mode;
    }

    /// Makes every later allocation fail (or succeed again).
    pub fn set_fail_allocations(&mut self, fail: bool) {
        self.fail_allocations = fail;
    }

    /// Returns the surface most recently bound for display.
    #[must_use]
    pub fn bound(&self) -> Option<SurfaceId> {
        self.bound
    }

    /// Number of surfaces allocated so far.
    #[must_use]
    pub fn allocated(&self) -> u32 {
        self.next_id
    }
}

impl PresentationTarget for HeadlessTarget {
    type Surface = HeadlessSurface;

    fn create_surface(&mut self, size: Size, always_opaque: bool) -> Option<HeadlessSurface> {
        if self.fail_allocations {
            return None;
        }
        let surface = HeadlessSurface::new(
            SurfaceId(self.next_id + 1),
            size,
            always_opaque,
            self.mode,
            self.main.clone(),
        )?;
        self.next_id += 1;
        Some(surface)
    }

    fn bind_surface(&mut self, surface: &HeadlessSurface) {
        self.bound = Some(surface.id);
    }
}

/// Rounds a coordinate to a pixel index in `0..=max`.
#[expect(
    clippy::cast_possible_truncation,
    reason = "value is rounded and clamped to the surface before the cast"
)]
fn to_pixels(v: f64, max: usize) -> usize {
    if v.is_nan() || v <= 0.0 {
        return 0;
    }
    let v = v.round();
    if v >= max as f64 {
        max
    } else {
        v as usize
    }
}

/// Rounds a scroll offset to whole pixels.
#[expect(
    clippy::cast_possible_truncation,
    reason = "offsets beyond the surface size behave identically once clamped"
)]
fn to_offset(v: f64) -> isize {
    if v.is_nan() {
        return 0;
    }
    v.round().clamp(-1e15, 1e15) as isize
}
