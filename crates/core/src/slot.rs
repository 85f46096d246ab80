use tokio::sync::watch;

/// Single-value slot that always holds the most recent state.
///
/// Writers replace the value wholesale, readers either peek at it or
/// subscribe and wait for the next replacement. Intermediate values may be
/// skipped.
pub struct LatestSlot<T> {
    tx: watch::Sender<T>,
}

impl<T: Clone> LatestSlot<T> {
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub fn set(&self, value: T) {
        self.tx.send_replace(value);
    }

    /// Derive the next value from the current one and store it.
    pub fn update(&self, next: impl FnOnce(&T) -> T) {
        self.tx.send_modify(|value| *value = next(value));
    }

    pub fn latest(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Receiver that sees every replacement made after this call.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }
}
