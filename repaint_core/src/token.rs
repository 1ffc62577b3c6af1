// Copyright 2026 the Repaint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Callback identity types.
//!
//! Every asynchronous callback the scheduler requests (a manual wake-up from
//! the host, or a flush completion from the surface) is tagged with a token.
//! The host hands the token back when the callback fires. Tokens carry the
//! surface *generation* they were issued for, so callbacks that were in
//! flight when the surface was replaced can be recognized and ignored.

use core::fmt;

/// A surface generation.
///
/// Starts at zero (no surface yet) and increases every time the scheduler
/// replaces its surface.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(pub u32);

impl Generation {
    /// Returns the generation that follows this one.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Debug for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen{}", self.0)
    }
}

/// Handle for a scheduled manual wake-up.
///
/// Passed to [`TaskHost::schedule`](crate::backend::TaskHost::schedule); the
/// host returns it through
/// [`PaintScheduler::on_wakeup`](crate::scheduler::PaintScheduler::on_wakeup).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct WakeupToken {
    pub(crate) serial: u64,
    pub(crate) generation: Generation,
}

impl WakeupToken {
    /// Returns the per-scheduler serial number (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn serial(self) -> u64 {
        self.serial
    }

    /// Returns the surface generation this wake-up was scheduled for.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> Generation {
        self.generation
    }
}

impl fmt::Debug for WakeupToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WakeupToken(#{}@{:?})", self.serial, self.generation)
    }
}

/// Handle for an issued flush.
///
/// Passed to [`Surface::flush`](crate::backend::Surface::flush); a surface
/// that completes asynchronously returns it through
/// [`PaintScheduler::on_flush_complete`](crate::scheduler::PaintScheduler::on_flush_complete).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlushToken {
    pub(crate) serial: u64,
    pub(crate) generation: Generation,
}

impl FlushToken {
    /// Returns the per-scheduler serial number (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn serial(self) -> u64 {
        self.serial
    }

    /// Returns the surface generation this flush was issued against.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> Generation {
        self.generation
    }
}

impl fmt::Debug for FlushToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FlushToken(#{}@{:?})", self.serial, self.generation)
    }
}
