// Copyright 2026 the Repaint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rectangle helpers on top of [`kurbo::Rect`].
//!
//! Damage rectangles are pixel-aligned and normalized (`x0 <= x1`,
//! `y0 <= y1`). A rectangle with zero width or height is *empty*: it covers no
//! pixels and never participates in containment or overlap.

use alloc::vec::Vec;

use kurbo::{Rect, Size};

/// Returns `true` if `rect` covers no area.
#[inline]
#[must_use]
pub fn is_empty_rect(rect: Rect) -> bool {
    rect.width() <= 0.0 || rect.height() <= 0.0
}

/// Returns the rectangle covering a surface of the given size.
#[inline]
#[must_use]
pub fn surface_rect(size: Size) -> Rect {
    Rect::from_origin_size((0.0, 0.0), size)
}

/// Returns `true` if `outer` fully covers `inner`.
///
/// Edges may coincide. Empty rectangles are contained by nothing.
#[must_use]
pub fn contains_rect(outer: Rect, inner: Rect) -> bool {
    !is_empty_rect(inner)
        && outer.x0 <= inner.x0
        && outer.y0 <= inner.y0
        && outer.x1 >= inner.x1
        && outer.y1 >= inner.y1
}

/// Returns `true` if `a` and `b` share a region of non-zero area.
///
/// Rectangles that only touch along an edge do not overlap.
#[inline]
#[must_use]
pub fn overlaps(a: Rect, b: Rect) -> bool {
    !is_empty_rect(a.intersect(b))
}

/// Clips `rect` to `bounds`, returning `None` if nothing remains.
#[inline]
#[must_use]
pub fn clip(rect: Rect, bounds: Rect) -> Option<Rect> {
    let clipped = rect.intersect(bounds);
    (!is_empty_rect(clipped)).then_some(clipped)
}

/// Returns the union of all `rects`, or [`Rect::ZERO`] if there are none.
#[must_use]
pub fn union_all<'a>(rects: impl IntoIterator<Item = &'a Rect>) -> Rect {
    let mut it = rects.into_iter().copied();
    let Some(first) = it.next() else {
        return Rect::ZERO;
    };
    it.fold(first, |acc, r| acc.union(r))
}

/// Appends the parts of `rect` not covered by `hole` to `out`.
///
/// Produces at most four bands: full-width strips above and below the hole,
/// then the left and right pieces beside it. If the two do not overlap,
/// `rect` is appended unchanged.
pub fn subtract_into(rect: Rect, hole: Rect, out: &mut Vec<Rect>) {
    if is_empty_rect(rect) {
        return;
    }
    let hole = rect.intersect(hole);
    if is_empty_rect(hole) {
        out.push(rect);
        return;
    }
    let bands = [
        Rect::new(rect.x0, rect.y0, rect.x1, hole.y0),
        Rect::new(rect.x0, hole.y1, rect.x1, rect.y1),
        Rect::new(rect.x0, hole.y0, hole.x0, hole.y1),
        Rect::new(hole.x1, hole.y0, rect.x1, hole.y1),
    ];
    out.extend(bands.into_iter().filter(|band| !is_empty_rect(*band)));
}
