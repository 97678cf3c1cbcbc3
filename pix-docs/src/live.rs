//! Live-query handles.
//!
//! A subscription delivers full snapshots of the queried slice, not
//! deltas, so a consumer's recomputation is a pure function of the
//! latest value. The store side keeps one sender per subscription and
//! prunes it as soon as the receiver goes away, so dropping the
//! handle is sufficient teardown; `cancel` exists for call sites that
//! want the release to be visible in the code.

use tokio::sync::watch;

/// A cancellable live query yielding snapshots of type `Vec<T>`.
pub struct LiveQuery<T> {
    rx: watch::Receiver<Vec<T>>,
}

impl<T: Clone> LiveQuery<T> {
    pub(crate) fn new(rx: watch::Receiver<Vec<T>>) -> Self {
        Self { rx }
    }

    /// The most recently delivered snapshot.
    pub fn current(&self) -> Vec<T> {
        self.rx.borrow().clone()
    }

    /// Wait for the next snapshot. Returns `None` once the store side
    /// has gone away.
    pub async fn changed(&mut self) -> Option<Vec<T>> {
        match self.rx.changed().await {
            Ok(()) => Some(self.rx.borrow_and_update().clone()),
            Err(_) => None,
        }
    }

    /// Tear the subscription down.
    pub fn cancel(self) {}
}

/// Store-side sender list shared by the memory collections.
pub(crate) struct Publisher<S, T> {
    subscribers: Vec<(S, watch::Sender<Vec<T>>)>,
}

impl<S, T: Clone> Publisher<S, T> {
    pub(crate) fn new() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }

    pub(crate) fn subscribe(&mut self, selector: S, initial: Vec<T>) -> LiveQuery<T> {
        let (tx, rx) = watch::channel(initial);
        self.subscribers.push((selector, tx));
        LiveQuery::new(rx)
    }

    /// Deliver fresh snapshots, dropping subscriptions whose receiver
    /// is gone.
    pub(crate) fn publish<F>(&mut self, mut snapshot: F)
    where
        F: FnMut(&S) -> Vec<T>,
    {
        self.subscribers
            .retain(|(selector, tx)| tx.send(snapshot(selector)).is_ok());
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.subscribers.len()
    }
}
