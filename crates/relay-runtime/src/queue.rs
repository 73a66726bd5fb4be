//! Per-session event queue.
//!
//! An append-only, growable buffer of [`SessionEvent`]s with a `watch`
//! channel for consumer wakeups. Producers never block on consumers;
//! consumers block (await) between events rather than polling.
//!
//! INVARIANTS, enforced here:
//! - `sequence` is assigned under the queue lock: strictly increasing from
//!   1 with no gaps, equal to production order.
//! - The first terminal event (`final`/`error`) closes the queue; any
//!   later push is rejected. Exactly one terminal event per session.
//!
//! Any number of [`EventCursor`]s may read concurrently; each replays the
//! full history independently and ends after delivering the terminal event.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use relay_core::{EventKind, SessionEvent};
use serde_json::Value;
use tokio::sync::watch;

use crate::errors::RuntimeError;

struct QueueState {
    events: Vec<Arc<SessionEvent>>,
    closed: bool,
}

/// Ordered, per-session producer/consumer buffer of progress events.
pub struct EventQueue {
    session_id: String,
    state: Mutex<QueueState>,
    /// Carries the latest sequence number; receivers wake on change.
    notify: watch::Sender<u64>,
}

impl EventQueue {
    /// Create an empty queue for the given session.
    #[must_use]
    pub fn new(session_id: impl Into<String>) -> Self {
        let (notify, _) = watch::channel(0);
        Self {
            session_id: session_id.into(),
            state: Mutex::new(QueueState {
                events: Vec::new(),
                closed: false,
            }),
            notify,
        }
    }

    /// Append an event, assigning its sequence number.
    ///
    /// Closes the queue when `kind` is terminal. Returns the assigned
    /// sequence, or [`RuntimeError::QueueClosed`] after a terminal event.
    pub fn push(&self, kind: EventKind, payload: Value) -> Result<u64, RuntimeError> {
        let sequence = {
            let mut state = self.state.lock();
            if state.closed {
                return Err(RuntimeError::QueueClosed(self.session_id.clone()));
            }
            let sequence = state.events.len() as u64 + 1;
            state.events.push(Arc::new(SessionEvent::new(sequence, kind, payload)));
            if kind.is_terminal() {
                state.closed = true;
            }
            sequence
        };
        let _ = self.notify.send_replace(sequence);
        Ok(sequence)
    }

    /// Snapshot of events after `after` (exclusive), plus whether the
    /// queue is closed.
    #[must_use]
    pub fn events_after(&self, after: u64) -> (Vec<Arc<SessionEvent>>, bool) {
        let state = self.state.lock();
        let from = (after as usize).min(state.events.len());
        (state.events[from..].to_vec(), state.closed)
    }

    /// Number of events produced so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().events.len()
    }

    /// Whether no events have been produced yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a terminal event has been produced.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// A cursor that replays the full history and then follows live events.
    #[must_use]
    pub fn subscribe(self: &Arc<Self>) -> EventCursor {
        EventCursor {
            queue: Arc::clone(self),
            rx: self.notify.subscribe(),
            cursor: 0,
            done: false,
        }
    }
}

/// One consumer's position in a session's event history.
///
/// `next()` yields events in sequence order, awaiting between events, and
/// returns `None` after the terminal event has been delivered. Cursors are
/// independent: each receives the entire ordered history.
pub struct EventCursor {
    queue: Arc<EventQueue>,
    rx: watch::Receiver<u64>,
    cursor: u64,
    done: bool,
}

impl EventCursor {
    /// Await the next event, or `None` once the stream is finished.
    pub async fn next(&mut self) -> Option<Arc<SessionEvent>> {
        if self.done {
            return None;
        }
        loop {
            // Mark the current sequence as seen BEFORE reading the buffer,
            // so a push landing between the read and the await still wakes us.
            let _ = *self.rx.borrow_and_update();
            let (batch, closed) = self.queue.events_after(self.cursor);
            if let Some(event) = batch.first() {
                self.cursor += 1;
                if event.is_terminal() {
                    self.done = true;
                }
                return Some(Arc::clone(event));
            }
            if closed {
                self.done = true;
                return None;
            }
            if self.rx.changed().await.is_err() {
                // Producer side gone without a terminal event; end the stream.
                self.done = true;
                return None;
            }
        }
    }
}

impl fmt::Debug for EventCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventCursor")
            .field("session_id", &self.queue.session_id)
            .field("cursor", &self.cursor)
            .field("done", &self.done)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use relay_core::events::{final_payload, status_payload};
    use serde_json::json;

    fn queue() -> Arc<EventQueue> {
        Arc::new(EventQueue::new("s1"))
    }

    #[test]
    fn sequences_are_gap_free_from_one() {
        let q = queue();
        assert_eq!(q.push(EventKind::Status, status_payload("a")).unwrap(), 1);
        assert_eq!(q.push(EventKind::Status, status_payload("b")).unwrap(), 2);
        assert_eq!(q.push(EventKind::Final, final_payload("done")).unwrap(), 3);
        let (events, closed) = q.events_after(0);
        assert!(closed);
        let sequences: Vec<u64> = events.iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3]);
    }

    #[test]
    fn terminal_event_closes_the_queue() {
        let q = queue();
        let _ = q.push(EventKind::Final, final_payload("done")).unwrap();
        assert!(q.is_closed());
        assert_matches!(
            q.push(EventKind::Status, status_payload("late")),
            Err(RuntimeError::QueueClosed(_))
        );
        // Still exactly one event recorded.
        assert_eq!(q.len(), 1);
    }

    #[tokio::test]
    async fn cursor_replays_history_then_follows_live() {
        let q = queue();
        let _ = q.push(EventKind::Status, status_payload("first")).unwrap();

        let mut cursor = q.subscribe();
        let first = cursor.next().await.unwrap();
        assert_eq!(first.sequence, 1);

        // Live event after the consumer caught up.
        let producer = Arc::clone(&q);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            let _ = producer.push(EventKind::Final, final_payload("done")).unwrap();
        });
        let second = cursor.next().await.unwrap();
        assert_eq!(second.sequence, 2);
        assert_eq!(second.kind, EventKind::Final);
        assert!(cursor.next().await.is_none());
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn late_cursor_sees_full_history_in_order() {
        let q = queue();
        let _ = q.push(EventKind::Status, status_payload("a")).unwrap();
        let _ = q.push(EventKind::Routing, json!({"tool": null})).unwrap();
        let _ = q.push(EventKind::Final, final_payload("done")).unwrap();

        let mut cursor = q.subscribe();
        let mut kinds = Vec::new();
        while let Some(event) = cursor.next().await {
            kinds.push(event.kind);
        }
        assert_eq!(
            kinds,
            vec![EventKind::Status, EventKind::Routing, EventKind::Final]
        );
    }

    #[tokio::test]
    async fn concurrent_cursors_each_get_everything() {
        let q = queue();
        let mut a = q.subscribe();
        let mut b = q.subscribe();

        let _ = q.push(EventKind::Status, status_payload("x")).unwrap();
        let _ = q.push(EventKind::Final, final_payload("done")).unwrap();

        for cursor in [&mut a, &mut b] {
            let mut sequences = Vec::new();
            while let Some(event) = cursor.next().await {
                sequences.push(event.sequence);
            }
            assert_eq!(sequences, vec![1, 2]);
        }
    }

    #[tokio::test]
    async fn cursor_attached_mid_production_sees_gap_free_sequences() {
        let q = queue();
        let producer = Arc::clone(&q);
        let handle = tokio::spawn(async move {
            for i in 0..50 {
                let _ = producer
                    .push(EventKind::Status, status_payload(format!("step {i}")))
                    .unwrap();
                tokio::task::yield_now().await;
            }
            let _ = producer.push(EventKind::Final, final_payload("done")).unwrap();
        });

        // Attach while production is in flight.
        tokio::task::yield_now().await;
        let mut cursor = q.subscribe();
        let mut sequences = Vec::new();
        let mut terminals = 0;
        while let Some(event) = cursor.next().await {
            sequences.push(event.sequence);
            if event.is_terminal() {
                terminals += 1;
            }
        }
        handle.await.unwrap();

        assert_eq!(sequences, (1..=51).collect::<Vec<u64>>());
        assert_eq!(terminals, 1);
        assert_matches!(
            q.push(EventKind::Status, status_payload("late")),
            Err(RuntimeError::QueueClosed(_))
        );
    }

    #[tokio::test]
    async fn cursor_after_terminal_ends_without_blocking() {
        let q = queue();
        let _ = q.push(EventKind::Final, final_payload("done")).unwrap();
        let mut cursor = q.subscribe();
        assert_eq!(cursor.next().await.unwrap().kind, EventKind::Final);
        assert!(cursor.next().await.is_none());
        assert!(cursor.next().await.is_none());
    }
}
