use crate::model::Snapshot;
use std::sync::{
    mpsc::{self, Receiver, SyncSender, TrySendError},
    Arc,
};
use tracing::debug;

/// Consumer of completed snapshots, implemented by the display layer.
///
/// Called on the sampling thread once per tick; implementations must return
/// quickly.
pub trait PresentationAdapter: Send {
    fn on_snapshot(&mut self, snapshot: Arc<Snapshot>);
}

impl<F> PresentationAdapter for F
where
    F: FnMut(Arc<Snapshot>) + Send,
{
    fn on_snapshot(&mut self, snapshot: Arc<Snapshot>) {
        self(snapshot)
    }
}

/// Hands snapshots to another thread through a bounded queue.
///
/// A full queue drops the new snapshot rather than blocking the sampler.
pub struct ChannelAdapter {
    tx: SyncSender<Arc<Snapshot>>,
    dropped: u64,
}

impl ChannelAdapter {
    pub fn new(capacity: usize) -> (Self, Receiver<Arc<Snapshot>>) {
        let (tx, rx) = mpsc::sync_channel(capacity.max(1));
        (Self { tx, dropped: 0 }, rx)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl PresentationAdapter for ChannelAdapter {
    fn on_snapshot(&mut self, snapshot: Arc<Snapshot>) {
        match self.tx.try_send(snapshot) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
                debug!(dropped = self.dropped, "display queue full, snapshot dropped");
            }
            Err(TrySendError::Disconnected(_)) => {
                self.dropped += 1;
                debug!("display queue closed, snapshot dropped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn empty_snapshot() -> Arc<Snapshot> {
        Arc::new(Snapshot::new(2, BTreeMap::new()))
    }

    #[test]
    fn test_channel_adapter_drops_when_full() {
        let (mut adapter, rx) = ChannelAdapter::new(1);
        adapter.on_snapshot(empty_snapshot());
        adapter.on_snapshot(empty_snapshot());
        assert_eq!(adapter.dropped(), 1);
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_channel_adapter_survives_closed_receiver() {
        let (mut adapter, rx) = ChannelAdapter::new(4);
        drop(rx);
        adapter.on_snapshot(empty_snapshot());
        assert_eq!(adapter.dropped(), 1);
    }

    #[test]
    fn test_closure_adapter() {
        let mut seen = 0;
        {
            let mut adapter = |_: Arc<Snapshot>| seen += 1;
            adapter.on_snapshot(empty_snapshot());
            adapter.on_snapshot(empty_snapshot());
        }
        assert_eq!(seen, 2);
    }
}
