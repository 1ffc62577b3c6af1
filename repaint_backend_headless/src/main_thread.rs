// Copyright 2026 the Repaint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Single-threaded event loop and task host.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use repaint_core::backend::TaskHost;
use repaint_core::token::{FlushToken, WakeupToken};

use crate::queue::EventQueue;

/// A callback waiting to be delivered to the scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HostEvent {
    /// A manual wake-up fired.
    Wakeup(WakeupToken),
    /// A surface finished presenting.
    FlushComplete(FlushToken),
}

/// The rendering thread's event queue.
///
/// Cloning produces another handle to the same queue, so the task host and
/// every surface can post into the loop the application drains.
#[derive(Clone, Debug, Default)]
pub struct MainThread {
    queue: Rc<RefCell<EventQueue<HostEvent>>>,
}

impl MainThread {
    /// Creates an empty event loop.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event.
    pub fn post(&self, event: HostEvent) {
        self.queue.borrow_mut().push(event);
    }

    /// Removes the oldest event.
    #[must_use]
    pub fn pop(&self) -> Option<HostEvent> {
        self.queue.borrow_mut().pop()
    }

    /// Returns the number of queued events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Returns `true` when no events are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Deepest backlog seen so far.
    #[must_use]
    pub fn high_water(&self) -> usize {
        self.queue.borrow().high_water()
    }
}

/// A [`TaskHost`] that posts wake-ups to a [`MainThread`].
///
/// Delays are not simulated: every wake-up is due as soon as it is queued.
#[derive(Clone, Debug)]
pub struct HeadlessHost {
    main: MainThread,
    scheduled: u64,
}

impl HeadlessHost {
    /// Creates a host posting into `main`.
    #[must_use]
    pub fn new(main: &MainThread) -> Self {
        Self {
            main: main.clone(),
            scheduled: 0,
        }
    }

    /// Number of wake-ups scheduled so far.
    #[must_use]
    pub fn scheduled(&self) -> u64 {
        self.scheduled
    }
}

impl TaskHost for HeadlessHost {
    fn schedule(&mut self, token: WakeupToken, _delay: Duration) {
        self.scheduled += 1;
        self.main.post(HostEvent::Wakeup(token));
    }
}
