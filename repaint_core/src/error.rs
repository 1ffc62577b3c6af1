// Copyright 2026 the Repaint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recoverable scheduler errors.

use thiserror::Error;

/// Error returned by
/// [`PaintScheduler::resize`](crate::scheduler::PaintScheduler::resize).
///
/// After an error the scheduler holds no surface; damage calls panic until a
/// later resize succeeds.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum ResizeError {
    /// The requested size has no area.
    #[error("cannot create a {width}x{height} surface")]
    EmptySize {
        /// Requested width.
        width: f64,
        /// Requested height.
        height: f64,
    },
    /// The presentation target could not allocate the surface.
    #[error("failed to allocate a {width}x{height} surface")]
    AllocationFailed {
        /// Requested width.
        width: f64,
        /// Requested height.
        height: f64,
    },
}
