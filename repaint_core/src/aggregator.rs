// Copyright 2026 the Repaint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Damage aggregation.
//!
//! [`UpdateAggregator`] accumulates invalidate and scroll requests between
//! paints and collapses them into a [`PaintUpdate`]: a short list of paint
//! rectangles plus at most one scroll.
//!
//! # Merge rules
//!
//! - A rectangle already covered by a pending one is dropped.
//! - A rectangle that covers pending ones replaces them.
//! - A rectangle equal to the surface bounds replaces everything, including a
//!   pending scroll (the whole surface is repainted anyway).
//! - A scroll moves pending damage along with the content it scrolls. Damage
//!   that leaves the scroll region is dropped.
//! - Two scrolls compose only when their deltas agree. Otherwise the earlier
//!   scroll's region is turned into paint damage and the later scroll is
//!   recorded on its own.
//!
//! Paint rectangles are in post-scroll coordinates: a consumer applies the
//! scroll first and paints afterwards.

use alloc::vec::Vec;

use kurbo::{Rect, Size, Vec2};

use crate::geometry::{
    clip, contains_rect, is_empty_rect, overlaps, subtract_into, surface_rect, union_all,
};

/// Configuration for the [`UpdateAggregator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AggregatorConfig {
    /// Upper bound on the number of pending paint rectangles.
    ///
    /// When an insertion pushes the list past this bound, the whole list is
    /// collapsed into its bounding box. Zero disables the cap.
    pub max_paint_rects: usize,
}

impl AggregatorConfig {
    /// Default configuration: at most 10 disjoint paint rectangles.
    pub const DEFAULT: Self = Self {
        max_paint_rects: 10,
    };

    /// Configuration that never collapses paint rectangles.
    pub const UNBOUNDED: Self = Self { max_paint_rects: 0 };
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A pending scroll: content inside `rect` moves by `delta`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollUpdate {
    /// The region being scrolled, in surface coordinates.
    pub rect: Rect,
    /// How far the content moves.
    pub delta: Vec2,
}

impl ScrollUpdate {
    /// Returns the part of the scroll region left uncovered by the moved
    /// content.
    ///
    /// This is one strip per scrolled axis, or the entire region when the
    /// delta is at least as large as the region along either axis.
    #[must_use]
    pub fn exposed(&self) -> [Option<Rect>; 2] {
        let Self { rect: r, delta: d } = *self;
        if d.x >= r.width() || -d.x >= r.width() || d.y >= r.height() || -d.y >= r.height() {
            return [Some(r), None];
        }
        let x_strip = if d.x > 0.0 {
            Some(Rect::new(r.x0, r.y0, r.x0 + d.x, r.y1))
        } else if d.x < 0.0 {
            Some(Rect::new(r.x1 + d.x, r.y0, r.x1, r.y1))
        } else {
            None
        };
        let y_strip = if d.y > 0.0 {
            Some(Rect::new(r.x0, r.y0, r.x1, r.y0 + d.y))
        } else if d.y < 0.0 {
            Some(Rect::new(r.x0, r.y1 + d.y, r.x1, r.y1))
        } else {
            None
        };
        [x_strip, y_strip]
    }
}

/// A snapshot of everything that needs to happen in one paint.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PaintUpdate {
    /// Rectangles to repaint, in post-scroll coordinates.
    ///
    /// Includes the area exposed by [`scroll`](Self::scroll), if any.
    pub paint_rects: Vec<Rect>,
    /// Union of [`paint_rects`](Self::paint_rects), or [`Rect::ZERO`] if there
    /// are none.
    pub paint_bounds: Rect,
    /// The scroll to apply before painting.
    pub scroll: Option<ScrollUpdate>,
}

impl PaintUpdate {
    /// Returns `true` if the update carries a scroll.
    #[inline]
    #[must_use]
    pub fn has_scroll(&self) -> bool {
        self.scroll.is_some()
    }

    /// Returns `true` if there is nothing to scroll and nothing to paint.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paint_rects.is_empty() && self.scroll.is_none()
    }
}

/// Accumulates damage between paints.
///
/// The aggregator knows the current surface bounds so it can recognize
/// full-surface invalidations and clip scrolled damage. Anything outside the
/// bounds is discarded on entry.
#[derive(Clone, Debug)]
pub struct UpdateAggregator {
    config: AggregatorConfig,
    bounds: Rect,
    paint_rects: Vec<Rect>,
    paint_bounds: Rect,
    scroll: Option<ScrollUpdate>,
}

impl Default for UpdateAggregator {
    fn default() -> Self {
        Self::new(AggregatorConfig::DEFAULT)
    }
}

impl UpdateAggregator {
    /// Creates an empty aggregator with zero-sized bounds.
    ///
    /// Call [`set_bounds`](Self::set_bounds) before recording damage; with
    /// empty bounds every request is discarded.
    #[must_use]
    pub fn new(config: AggregatorConfig) -> Self {
        Self {
            config,
            bounds: Rect::ZERO,
            paint_rects: Vec::new(),
            paint_bounds: Rect::ZERO,
            scroll: None,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> AggregatorConfig {
        self.config
    }

    /// Returns the surface bounds damage is clipped to.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Sets the surface size and discards all pending damage.
    ///
    /// Damage recorded against the old surface has no meaning for the new
    /// one; callers invalidate the new surface explicitly.
    pub fn set_bounds(&mut self, size: Size) {
        self.bounds = surface_rect(size);
        self.clear_pending_update();
    }

    /// Marks `rect` as needing a repaint.
    pub fn invalidate_rect(&mut self, rect: Rect) {
        let Some(rect) = clip(rect, self.bounds) else {
            return;
        };
        if rect == self.bounds {
            self.invalidate_all();
            return;
        }
        self.add_paint_rect(rect);
        self.paint_bounds = union_all(&self.paint_rects);
    }

    /// Marks the whole surface as needing a repaint.
    pub fn invalidate_all(&mut self) {
        if is_empty_rect(self.bounds) {
            return;
        }
        self.paint_rects.clear();
        self.paint_rects.push(self.bounds);
        self.paint_bounds = self.bounds;
        self.scroll = None;
    }

    /// Scrolls the content inside `clip_rect` by `delta`.
    ///
    /// `clip_rect` is clipped to the surface bounds. An empty region or a zero
    /// delta records nothing.
    pub fn scroll_rect(&mut self, clip_rect: Rect, delta: Vec2) {
        let Some(region) = clip(clip_rect, self.bounds) else {
            return;
        };
        if delta == Vec2::ZERO {
            return;
        }

        if let Some(prev) = self.scroll.take() {
            let combined = prev.rect.intersect(region);
            let composable = prev.delta == delta
                && !is_empty_rect(combined)
                && overlaps(combined + delta, region);
            if !composable {
                // Scrolls that cannot be expressed as one: repaint the old
                // region instead of scrolling it.
                self.add_paint_rect(prev.rect);
            } else {
                self.translate_paint_rects(region, delta);
                let composed = ScrollUpdate {
                    rect: combined,
                    delta: prev.delta + delta,
                };
                if combined != prev.rect || combined != region {
                    // Content outside the shared region moved by only one of
                    // the two scrolls.
                    let mut stale = Vec::new();
                    subtract_into(prev.rect, combined, &mut stale);
                    subtract_into(region, combined, &mut stale);
                    for rect in stale {
                        self.add_paint_rect(rect);
                    }
                }
                self.scroll = Some(composed);
                self.paint_bounds = union_all(&self.paint_rects);
                return;
            }
        }

        self.translate_paint_rects(region, delta);
        self.scroll = Some(ScrollUpdate {
            rect: region,
            delta,
        });
        self.paint_bounds = union_all(&self.paint_rects);
    }

    /// Returns the pending update without modifying it.
    #[must_use]
    pub fn get_pending_update(&self) -> PaintUpdate {
        let mut paint_rects = self.paint_rects.clone();
        self.finish_update(&mut paint_rects)
    }

    /// Takes the pending update, leaving the aggregator empty.
    ///
    /// Damage recorded after this call accumulates into a fresh update.
    #[must_use]
    pub fn take_pending_update(&mut self) -> PaintUpdate {
        let mut paint_rects = core::mem::take(&mut self.paint_rects);
        let update = self.finish_update(&mut paint_rects);
        self.clear_pending_update();
        update
    }

    /// Discards all pending damage.
    pub fn clear_pending_update(&mut self) {
        self.paint_rects.clear();
        self.paint_bounds = Rect::ZERO;
        self.scroll = None;
    }

    /// Returns `true` if there is anything to paint or scroll.
    #[inline]
    #[must_use]
    pub fn has_pending_update(&self) -> bool {
        !self.paint_rects.is_empty() || self.scroll.is_some()
    }

    /// Returns the pending paint rectangles, excluding scroll exposure.
    #[must_use]
    pub fn paint_rects(&self) -> &[Rect] {
        &self.paint_rects
    }

    /// Returns the union of [`paint_rects`](Self::paint_rects).
    #[must_use]
    pub fn paint_bounds(&self) -> Rect {
        self.paint_bounds
    }

    /// Returns the pending scroll, if any.
    #[must_use]
    pub fn pending_scroll(&self) -> Option<ScrollUpdate> {
        self.scroll
    }

    fn finish_update(&self, paint_rects: &mut Vec<Rect>) -> PaintUpdate {
        if let Some(scroll) = self.scroll {
            for exposed in scroll.exposed().into_iter().flatten() {
                insert_rect(paint_rects, exposed);
            }
        }
        PaintUpdate {
            paint_bounds: union_all(paint_rects.iter()),
            paint_rects: core::mem::take(paint_rects),
            scroll: self.scroll,
        }
    }

    /// Inserts an in-bounds rect, honoring containment and the rect cap.
    ///
    /// Does not update `paint_bounds`.
    fn add_paint_rect(&mut self, rect: Rect) {
        if rect == self.bounds {
            self.paint_rects.clear();
            self.paint_rects.push(rect);
            return;
        }
        if !insert_rect(&mut self.paint_rects, rect) {
            return;
        }
        let max = self.config.max_paint_rects;
        if max != 0 && self.paint_rects.len() > max {
            let bounds = union_all(&self.paint_rects);
            self.paint_rects.clear();
            self.paint_rects.push(bounds);
        }
    }

    /// Moves pending damage inside `region` by `delta`.
    ///
    /// The moved part is clipped to `region`; the part of a rect outside
    /// `region` stays where it is.
    fn translate_paint_rects(&mut self, region: Rect, delta: Vec2) {
        let mut kept = Vec::with_capacity(self.paint_rects.len());
        let mut moved = Vec::new();
        for rect in self.paint_rects.drain(..) {
            if !overlaps(rect, region) {
                kept.push(rect);
                continue;
            }
            if let Some(shifted) = clip(rect.intersect(region) + delta, region) {
                moved.push(shifted);
            }
            if !contains_rect(region, rect) {
                subtract_into(rect, region, &mut kept);
            }
        }
        self.paint_rects = kept;
        for rect in moved {
            self.add_paint_rect(rect);
        }
    }
}

/// Inserts `rect` into `rects` unless an existing entry covers it, removing
/// any entries `rect` covers. Returns `true` if `rect` was inserted.
fn insert_rect(rects: &mut Vec<Rect>, rect: Rect) -> bool {
    if rects.iter().any(|existing| contains_rect(*existing, rect)) {
        return false;
    }
    rects.retain(|existing| !contains_rect(rect, *existing));
    rects.push(rect);
    true
}
