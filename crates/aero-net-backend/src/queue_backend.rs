use std::collections::VecDeque;

use crate::NetworkBackend;

/// Upper bound on frames buffered in each direction; the oldest frame is dropped beyond it.
pub const DEFAULT_QUEUE_CAPACITY_FRAMES: usize = 256;

/// Best-effort counters for [`QueueBackend`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueBackendStats {
    /// Guest → host frames accepted by [`NetworkBackend::transmit`].
    pub tx_frames: u64,
    /// Guest → host frames dropped because the TX queue was full.
    pub tx_dropped: u64,
    /// Host → guest frames handed out by [`NetworkBackend::poll_receive`].
    pub rx_frames: u64,
    /// Host → guest frames dropped because the RX queue was full.
    pub rx_dropped: u64,
}

/// In-memory backend: queues transmitted frames for the host and serves host-injected frames.
///
/// Used by host glue that runs its own network stack, and by tests.
#[derive(Debug, Clone)]
pub struct QueueBackend {
    tx: VecDeque<Vec<u8>>,
    rx: VecDeque<Vec<u8>>,
    capacity_frames: usize,
    stats: QueueBackendStats,
}

impl Default for QueueBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl QueueBackend {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY_FRAMES)
    }

    pub fn with_capacity(capacity_frames: usize) -> Self {
        Self {
            tx: VecDeque::new(),
            rx: VecDeque::new(),
            capacity_frames: capacity_frames.max(1),
            stats: QueueBackendStats::default(),
        }
    }

    /// Queue a host → guest frame.
    pub fn push_rx(&mut self, frame: Vec<u8>) {
        if self.rx.len() >= self.capacity_frames {
            self.rx.pop_front();
            self.stats.rx_dropped += 1;
            tracing::debug!(capacity = self.capacity_frames, "rx queue full; dropped oldest frame");
        }
        self.rx.push_back(frame);
    }

    /// Drain all guest → host frames transmitted so far.
    pub fn take_tx(&mut self) -> Vec<Vec<u8>> {
        self.tx.drain(..).collect()
    }

    pub fn pending_rx(&self) -> usize {
        self.rx.len()
    }

    pub fn stats(&self) -> QueueBackendStats {
        self.stats
    }
}

impl NetworkBackend for QueueBackend {
    fn transmit(&mut self, frame: Vec<u8>) {
        if self.tx.len() >= self.capacity_frames {
            self.tx.pop_front();
            self.stats.tx_dropped += 1;
            tracing::debug!(capacity = self.capacity_frames, "tx queue full; dropped oldest frame");
        }
        self.tx.push_back(frame);
        self.stats.tx_frames += 1;
    }

    fn poll_receive(&mut self) -> Option<Vec<u8>> {
        let frame = self.rx.pop_front()?;
        self.stats.rx_frames += 1;
        Some(frame)
    }
}
