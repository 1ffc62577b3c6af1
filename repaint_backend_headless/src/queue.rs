// Copyright 2026 the Repaint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Internal event queue utilities.

use std::collections::VecDeque;

/// Unbounded FIFO queue that remembers its deepest backlog.
///
/// Events are never dropped: a lost wake-up or flush completion would stall
/// the scheduler forever.
#[derive(Debug, Clone)]
pub(crate) struct EventQueue<T> {
    items: VecDeque<T>,
    high_water: usize,
}

impl<T> Default for EventQueue<T> {
    fn default() -> Self {
        Self {
            items: VecDeque::new(),
            high_water: 0,
        }
    }
}

impl<T> EventQueue<T> {
    pub(crate) fn push(&mut self, item: T) {
        self.items.push_back(item);
        self.high_water = self.high_water.max(self.items.len());
    }

    pub(crate) fn pop(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn high_water(&self) -> usize {
        self.high_water
    }
}

#[cfg(test)]
mod tests {
    use super::EventQueue;

    #[test]
    fn pops_in_push_order() {
        let mut queue = EventQueue::default();
        queue.push(1_u32);
        queue.push(2_u32);
        queue.push(3_u32);

        assert_eq!(queue.pop(), Some(1_u32));
        assert_eq!(queue.pop(), Some(2_u32));
        assert_eq!(queue.pop(), Some(3_u32));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn high_water_survives_draining() {
        let mut queue = EventQueue::default();
        queue.push(1_u32);
        queue.push(2_u32);
        let _ = queue.pop();
        queue.push(3_u32);
        let _ = queue.pop();
        let _ = queue.pop();

        assert_eq!(queue.len(), 0);
        assert_eq!(queue.high_water(), 2);
    }

    #[test]
    fn empty_queue_reports_is_empty() {
        let mut queue = EventQueue::default();
        assert!(queue.is_empty());

        queue.push(1_u32);
        assert!(!queue.is_empty());

        let _ = queue.pop();
        assert!(queue.is_empty());
    }
}
