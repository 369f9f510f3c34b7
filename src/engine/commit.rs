//! Commit/cancel buffer
//!
//! Every event that reaches the buffer waits out a grace period before it is
//! delivered. Only the most recently scheduled event can be retracted; older
//! ones keep their own deadline.

use crate::event::LoggedEvent;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Debug)]
struct PendingCommit {
    ticket: u64,
    due: Instant,
    event: LoggedEvent,
}

#[derive(Debug)]
pub struct CommitBuffer {
    delay: Duration,
    pending: VecDeque<PendingCommit>,
    next_ticket: u64,
    last_ticket: Option<u64>,
}

impl CommitBuffer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: VecDeque::new(),
            next_ticket: 0,
            last_ticket: None,
        }
    }

    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    /// Schedules `event` for delivery `delay` after `now`.
    pub fn schedule(&mut self, event: LoggedEvent, now: Instant) -> u64 {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        debug!(
            "Scheduling '{}' ({}) for commit in {:?}",
            event.event_name, event.id, self.delay
        );
        self.pending.push_back(PendingCommit {
            ticket,
            due: now + self.delay,
            event,
        });
        self.last_ticket = Some(ticket);
        ticket
    }

    /// Retracts the most recently scheduled event if it is still pending.
    pub fn cancel_last(&mut self) -> Option<LoggedEvent> {
        let ticket = self.last_ticket.take()?;
        let position = self.pending.iter().position(|p| p.ticket == ticket)?;
        let cancelled = self.pending.remove(position).map(|p| p.event);
        if let Some(event) = &cancelled {
            info!("Cancelled pending '{}' ({})", event.event_name, event.id);
        }
        cancelled
    }

    /// Removes and returns every event whose grace period has elapsed.
    pub fn take_due(&mut self, now: Instant) -> Vec<LoggedEvent> {
        let mut due = Vec::new();
        let mut index = 0;
        while index < self.pending.len() {
            if self.pending[index].due > now {
                index += 1;
                continue;
            }
            if let Some(commit) = self.pending.remove(index) {
                if self.last_ticket == Some(commit.ticket) {
                    self.last_ticket = None;
                }
                due.push(commit.event);
            }
        }
        due
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Name of the event that `cancel_last` would retract.
    pub fn last_pending_name(&self) -> Option<&str> {
        let ticket = self.last_ticket?;
        self.pending
            .iter()
            .find(|p| p.ticket == ticket)
            .map(|p| p.event.event_name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Team;

    fn event(name: &str) -> LoggedEvent {
        LoggedEvent::new(name, Team::Home, "test")
    }

    #[test]
    fn delivers_after_grace_period() {
        let t0 = Instant::now();
        let mut buffer = CommitBuffer::new(Duration::from_millis(600));
        buffer.schedule(event("shot"), t0);

        assert!(buffer.take_due(t0 + Duration::from_millis(599)).is_empty());
        let due = buffer.take_due(t0 + Duration::from_millis(600));
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].event_name, "shot");
        assert!(buffer.is_empty());
    }

    #[test]
    fn cancel_only_hits_the_most_recent_event() {
        let t0 = Instant::now();
        let mut buffer = CommitBuffer::new(Duration::from_millis(600));
        buffer.schedule(event("foul"), t0);
        buffer.schedule(event("shot"), t0 + Duration::from_millis(100));

        assert_eq!(buffer.last_pending_name(), Some("shot"));
        assert_eq!(buffer.cancel_last().map(|e| e.event_name), Some("shot".into()));
        // A second cancel does not reach back to the older event.
        assert!(buffer.cancel_last().is_none());

        let due = buffer.take_due(t0 + Duration::from_millis(1000));
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].event_name, "foul");
    }

    #[test]
    fn cancel_after_delivery_is_a_no_op() {
        let t0 = Instant::now();
        let mut buffer = CommitBuffer::new(Duration::from_millis(600));
        buffer.schedule(event("goal"), t0);
        assert_eq!(buffer.take_due(t0 + Duration::from_millis(700)).len(), 1);
        assert!(buffer.cancel_last().is_none());
    }
}
