// Copyright 2026 the Repaint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend contract for presentation and host integrations.
//!
//! Repaint splits platform-specific work into *backend* crates. Each backend
//! provides the following pieces:
//!
//! - **Presentation target**: Implements [`PresentationTarget`] to allocate
//!   off-screen surfaces and attach them to whatever displays them (a window,
//!   a compositor layer, a shared-memory buffer handed to another process).
//!
//! - **Surface**: Implements [`Surface`]: the pixel store the client renders
//!   into, plus the two operations the scheduler drives directly: moving
//!   pixels for a scroll and swapping the buffer to the display ("flush").
//!   At most one flush may be in flight per surface.
//!
//! - **Task host**: Implements [`TaskHost`] to run a callback later on the
//!   rendering thread. The scheduler uses it for manual wake-ups.
//!
//! Application code implements [`PaintClient`] to render damaged regions.
//!
//! # Callback delivery
//!
//! [`TaskHost::schedule`] and [`Surface::flush`] return immediately. When the
//! wake-up fires or the flush completes, the host calls
//! [`PaintScheduler::on_wakeup`] or [`PaintScheduler::on_flush_complete`] on
//! the rendering thread with the token it was given. Tokens outlive surface
//! replacement safely: the scheduler ignores tokens from older generations.
//!
//! ```rust,ignore
//! loop {
//!     match main_thread.next_event() {
//!         HostEvent::Wakeup(token) => scheduler.on_wakeup(token),
//!         HostEvent::FlushComplete(token) => scheduler.on_flush_complete(token),
//!     }
//! }
//! ```
//!
//! [`PaintScheduler::on_wakeup`]: crate::scheduler::PaintScheduler::on_wakeup
//! [`PaintScheduler::on_flush_complete`]: crate::scheduler::PaintScheduler::on_flush_complete

use core::time::Duration;

use kurbo::{Rect, Size, Vec2};

use crate::scheduler::PaintContext;
use crate::token::{FlushToken, WakeupToken};

/// Outcome of [`Surface::flush`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlushStatus {
    /// The swap finished synchronously; no completion callback follows.
    Completed,
    /// The swap was queued; the host reports completion later with the
    /// token.
    Pending,
    /// Another flush is still in flight. The scheduler treats this as a
    /// fatal usage error.
    InProgress,
}

/// An off-screen surface the client paints into.
pub trait Surface {
    /// Returns the pixel size of the surface.
    fn size(&self) -> Size;

    /// Moves the pixels inside `rect` by `delta`, clipped to `rect`.
    ///
    /// Pixels that move outside `rect` are discarded; the area the content
    /// moved away from is left for the client to repaint.
    fn scroll(&mut self, rect: Rect, delta: Vec2);

    /// Presents the painted contents.
    fn flush(&mut self, token: FlushToken) -> FlushStatus;
}

/// Allocates surfaces and attaches them to the display.
pub trait PresentationTarget {
    /// The surface type this target produces.
    type Surface: Surface;

    /// Allocates a surface of `size`.
    ///
    /// `always_opaque` promises the client never leaves transparent pixels,
    /// letting the target pick an opaque pixel format. Returns `None` if the
    /// allocation fails.
    fn create_surface(&mut self, size: Size, always_opaque: bool) -> Option<Self::Surface>;

    /// Makes `surface` the one being displayed.
    fn bind_surface(&mut self, surface: &Self::Surface);
}

/// Runs deferred work on the rendering thread.
pub trait TaskHost {
    /// Requests a call to
    /// [`PaintScheduler::on_wakeup`](crate::scheduler::PaintScheduler::on_wakeup)
    /// with `token` once `delay` has passed.
    fn schedule(&mut self, token: WakeupToken, delay: Duration);
}

/// Renders damaged regions of a surface.
pub trait PaintClient<S> {
    /// Paints the rectangles in `cx` and returns `true` if anything was
    /// drawn.
    ///
    /// Returning `false` suppresses the flush. Damage raised through `cx`
    /// is painted in a later cycle.
    fn paint(&mut self, cx: &mut PaintContext<'_, S>) -> bool;
}

impl<S, F> PaintClient<S> for F
where
    F: FnMut(&mut PaintContext<'_, S>) -> bool,
{
    fn paint(&mut self, cx: &mut PaintContext<'_, S>) -> bool {
        self(cx)
    }
}
