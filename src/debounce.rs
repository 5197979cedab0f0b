//! Restart-on-trigger timer feeding the session event channel.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

/// Identifies one arming of a [`Debouncer`]. Expiry events carry it back so
/// the owner can drop expiries from superseded or cancelled armings.
pub type Ticket = u64;

/// Trailing-edge debounce timer.
///
/// At most one timer task exists: every `trigger` aborts the previous task
/// and spawns a fresh one. Because an aborted task may already have queued
/// its event, the owner must pass each expiry through [`Debouncer::settle`].
#[derive(Debug)]
pub struct Debouncer<E> {
    delay: Duration,
    events: UnboundedSender<E>,
    task: Option<JoinHandle<()>>,
    ticket: Ticket,
}

impl<E: Send + 'static> Debouncer<E> {
    #[must_use]
    pub fn new(delay: Duration, events: UnboundedSender<E>) -> Self {
        Self {
            delay,
            events,
            task: None,
            ticket: 0,
        }
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// (Re)arms the timer with the default delay.
    pub fn trigger(&mut self, expired: impl FnOnce(Ticket) -> E + Send + 'static) {
        self.trigger_after(self.delay, expired);
    }

    /// (Re)arms the timer with an explicit delay.
    pub fn trigger_after(
        &mut self,
        delay: Duration,
        expired: impl FnOnce(Ticket) -> E + Send + 'static,
    ) {
        self.abort_task();
        self.ticket = self.ticket.wrapping_add(1);
        let ticket = self.ticket;
        let events = self.events.clone();
        self.task = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(expired(ticket));
        }));
    }

    /// Disarms the timer. Expiries already queued become stale.
    pub fn cancel(&mut self) {
        self.abort_task();
        self.ticket = self.ticket.wrapping_add(1);
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.task.is_some()
    }

    /// Accepts an expiry. Returns `true` only for the current arming, which
    /// is then consumed.
    pub fn settle(&mut self, ticket: Ticket) -> bool {
        if ticket != self.ticket || self.task.is_none() {
            return false;
        }

        self.task = None;
        true
    }

    fn abort_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl<E> Drop for Debouncer<E> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;
    use tokio::time::{advance, Duration};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn retrigger_restarts_the_quiet_period() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut debouncer = Debouncer::new(Duration::from_millis(500), tx);

        debouncer.trigger(|ticket| ticket);
        advance(Duration::from_millis(400)).await;
        debouncer.trigger(|ticket| ticket);
        advance(Duration::from_millis(400)).await;
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());

        advance(Duration::from_millis(100)).await;
        let ticket = rx.recv().await.expect("expiry");
        assert!(debouncer.settle(ticket));
        assert!(!debouncer.is_armed());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_expiry_is_never_delivered_or_settled() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut debouncer = Debouncer::new(Duration::from_millis(100), tx);

        debouncer.trigger(|ticket| ticket);
        debouncer.cancel();
        advance(Duration::from_millis(500)).await;
        tokio::task::yield_now().await;

        assert!(rx.try_recv().is_err());
        assert!(!debouncer.settle(1));
    }

    #[tokio::test(start_paused = true)]
    async fn stale_ticket_is_rejected_after_rearm() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut debouncer = Debouncer::new(Duration::from_millis(100), tx);

        debouncer.trigger(|ticket| ticket);
        advance(Duration::from_millis(100)).await;
        let first = rx.recv().await.expect("first expiry");

        debouncer.trigger(|ticket| ticket);
        assert!(!debouncer.settle(first));
        assert!(debouncer.is_armed());
    }
}
