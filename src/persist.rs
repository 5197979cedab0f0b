//! Serialization of draft writes.

/// One write in flight at a time. Requests arriving meanwhile collapse into a
/// single follow-up that writes whatever text is current when it starts.
///
/// `W` is whatever the owner needs to notify when a write covering its
/// request finishes (explicit saves wait on this; debounced saves do not).
#[derive(Debug)]
pub struct PendingWrite<W> {
    in_flight: bool,
    pending: bool,
    current_waiters: Vec<W>,
    next_waiters: Vec<W>,
}

impl<W> Default for PendingWrite<W> {
    fn default() -> Self {
        Self {
            in_flight: false,
            pending: false,
            current_waiters: Vec::new(),
            next_waiters: Vec::new(),
        }
    }
}

impl<W> PendingWrite<W> {
    #[must_use]
    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Returns `true` when the caller should start a write now.
    pub fn request(&mut self, waiter: Option<W>) -> bool {
        if self.in_flight {
            self.pending = true;
            self.next_waiters.extend(waiter);
            return false;
        }

        self.in_flight = true;
        self.current_waiters.extend(waiter);
        true
    }

    /// Finishes the in-flight write. Returns its waiters and whether a
    /// follow-up write must start now.
    pub fn complete(&mut self) -> (Vec<W>, bool) {
        let finished = std::mem::take(&mut self.current_waiters);
        if self.pending {
            self.pending = false;
            self.current_waiters = std::mem::take(&mut self.next_waiters);
            return (finished, true);
        }

        self.in_flight = false;
        (finished, false)
    }
}
