//! Debounced local-store writer.
//!
//! Guest-cart mutations coalesce into one write: each save resets a short
//! deadline, and when the deadline fires the latest snapshot is written.
//! Clears travel through the same worker so a pending save can never land
//! after (and undo) a clear. A flush forces whatever is pending to disk
//! immediately and acks once it has landed.
//!
//! The worker owns the store; it exits when every sender handle is gone,
//! committing any still-pending write on the way out.

use std::sync::Arc;
use std::time::Duration;

use axle_core::CartLine;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::warn;

use crate::store::LocalStore;

enum Command {
    Save(Vec<CartLine>),
    Clear,
    Flush(oneshot::Sender<()>),
}

enum Pending {
    Save(Vec<CartLine>),
    Clear,
}

/// Handle to the writer task.
#[derive(Clone)]
pub(crate) struct DebouncedWriter {
    tx: mpsc::UnboundedSender<Command>,
}

impl DebouncedWriter {
    /// Spawn the worker task. Must be called within a tokio runtime.
    pub(crate) fn spawn(store: Arc<dyn LocalStore>, delay: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(store, delay, rx));
        Self { tx }
    }

    /// Schedule a write of the given snapshot, resetting the deadline.
    pub(crate) fn save(&self, lines: Vec<CartLine>) {
        let _ = self.tx.send(Command::Save(lines));
    }

    /// Schedule erasure of the persisted cart, resetting the deadline.
    pub(crate) fn clear(&self) {
        let _ = self.tx.send(Command::Clear);
    }

    /// Force the pending write without waiting for it to land.
    pub(crate) fn force_save(&self) {
        let (ack, _) = oneshot::channel();
        let _ = self.tx.send(Command::Flush(ack));
    }

    /// Force the pending write and wait until it has landed.
    pub(crate) async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(Command::Flush(ack)).is_err() {
            return;
        }
        let _ = done.await;
    }
}

async fn run(
    store: Arc<dyn LocalStore>,
    delay: Duration,
    mut rx: mpsc::UnboundedReceiver<Command>,
) {
    let mut pending: Option<Pending> = None;
    let mut due = Instant::now();

    loop {
        tokio::select! {
            cmd = rx.recv() => match cmd {
                Some(Command::Save(lines)) => {
                    pending = Some(Pending::Save(lines));
                    due = Instant::now() + delay;
                }
                Some(Command::Clear) => {
                    pending = Some(Pending::Clear);
                    due = Instant::now() + delay;
                }
                Some(Command::Flush(ack)) => {
                    if let Some(p) = pending.take() {
                        commit(store.as_ref(), p);
                    }
                    let _ = ack.send(());
                }
                None => {
                    // Engine dropped; don't lose the last scheduled write.
                    if let Some(p) = pending.take() {
                        commit(store.as_ref(), p);
                    }
                    return;
                }
            },
            () = tokio::time::sleep_until(due), if pending.is_some() => {
                if let Some(p) = pending.take() {
                    commit(store.as_ref(), p);
                }
            }
        }
    }
}

fn commit(store: &dyn LocalStore, pending: Pending) {
    let result = match pending {
        Pending::Save(lines) => store.save(&lines),
        Pending::Clear => store.clear(),
    };
    if let Err(e) = result {
        warn!(error = %e, "failed to persist local cart");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::store::MemoryStore;

    fn line(product: &str, quantity: u32) -> CartLine {
        CartLine::new(product, product.to_owned(), Decimal::new(10, 0), quantity)
    }

    #[tokio::test]
    async fn test_burst_of_saves_coalesces_into_one_write() {
        let store = Arc::new(MemoryStore::new());
        let writer = DebouncedWriter::spawn(store.clone(), Duration::from_millis(50));

        writer.save(vec![line("a", 1)]);
        writer.save(vec![line("a", 2)]);
        writer.save(vec![line("a", 3)]);

        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(store.save_count(), 1);
        let saved = store.load().unwrap().unwrap();
        assert_eq!(saved[0].quantity, 3);
    }

    #[tokio::test]
    async fn test_flush_writes_pending_immediately() {
        let store = Arc::new(MemoryStore::new());
        let writer = DebouncedWriter::spawn(store.clone(), Duration::from_secs(60));

        writer.save(vec![line("b", 5)]);
        writer.flush().await;

        assert_eq!(store.save_count(), 1);
        assert!(store.load().unwrap().is_some());
    }

    #[tokio::test]
    async fn test_flush_with_nothing_pending_acks() {
        let store = Arc::new(MemoryStore::new());
        let writer = DebouncedWriter::spawn(store.clone(), Duration::from_millis(50));

        writer.flush().await;
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_clear_supersedes_pending_save() {
        let store = Arc::new(MemoryStore::new());
        store.save(&[line("c", 1)]).unwrap();

        let writer = DebouncedWriter::spawn(store.clone(), Duration::from_millis(50));
        writer.save(vec![line("c", 9)]);
        writer.clear();
        writer.flush().await;

        assert!(store.load().unwrap().is_none());
    }
}
