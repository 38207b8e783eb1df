//! Delayed callbacks driven by the host clock.
//!
//! Nothing here blocks: the host calls `CanvasView::tick(now)` and the
//! callbacks whose deadline has passed fire in deadline order, ties in
//! scheduling order. At most one callback of each kind is pending, so
//! rescheduling a hover replaces the previous one.

use std::mem::discriminant;

use crate::geometry::Point;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Timer {
    /// Scroll toward the edge the pointer rests near during a drag.
    Autoscroll,
    /// Report the object under this view point if the pointer stayed put.
    Hover(Point),
}

#[derive(Debug, Clone, Copy)]
struct Scheduled {
    deadline: u64,
    seq: u64,
    timer: Timer,
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    pending: Vec<Scheduled>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `timer` at `deadline` (ms), replacing a pending timer of
    /// the same kind.
    pub fn schedule(&mut self, timer: Timer, deadline: u64) {
        self.cancel(&timer);
        self.next_seq += 1;
        self.pending.push(Scheduled {
            deadline,
            seq: self.next_seq,
            timer,
        });
    }

    /// Drops the pending timer of the same kind as `timer`.
    pub fn cancel(&mut self, timer: &Timer) -> bool {
        let kind = discriminant(timer);
        let before = self.pending.len();
        self.pending.retain(|s| discriminant(&s.timer) != kind);
        before != self.pending.len()
    }

    pub fn is_pending(&self, timer: &Timer) -> bool {
        let kind = discriminant(timer);
        self.pending.iter().any(|s| discriminant(&s.timer) == kind)
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.pending.iter().map(|s| s.deadline).min()
    }

    /// Removes and returns every timer due at `now`.
    pub fn take_due(&mut self, now: u64) -> Vec<Timer> {
        let (mut due, rest): (Vec<Scheduled>, Vec<Scheduled>) =
            self.pending.drain(..).partition(|s| s.deadline <= now);
        self.pending = rest;
        due.sort_by_key(|s| (s.deadline, s.seq));
        due.into_iter().map(|s| s.timer).collect()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_due_in_deadline_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(Timer::Hover(Point::ORIGIN), 30);
        scheduler.schedule(Timer::Autoscroll, 10);
        assert_eq!(scheduler.next_deadline(), Some(10));
        assert!(scheduler.take_due(5).is_empty());
        assert_eq!(
            scheduler.take_due(40),
            vec![Timer::Autoscroll, Timer::Hover(Point::ORIGIN)]
        );
        assert_eq!(scheduler.next_deadline(), None);
    }

    #[test]
    fn test_ties_fire_in_scheduling_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(Timer::Hover(Point::ORIGIN), 10);
        scheduler.schedule(Timer::Autoscroll, 10);
        assert_eq!(
            scheduler.take_due(10),
            vec![Timer::Hover(Point::ORIGIN), Timer::Autoscroll]
        );
    }

    #[test]
    fn test_hover_replaces_pending_hover() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(Timer::Hover(Point::new(1.0, 1.0)), 100);
        scheduler.schedule(Timer::Hover(Point::new(2.0, 2.0)), 200);
        assert!(scheduler.take_due(150).is_empty());
        assert_eq!(scheduler.take_due(200), vec![Timer::Hover(Point::new(2.0, 2.0))]);
    }
}
