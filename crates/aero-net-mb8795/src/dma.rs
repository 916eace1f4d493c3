//! NeXT DMA channel state and the TX/RX transfer engine.
//!
//! Transfers are synchronous: a TX runs to completion inside the CSR write that starts it, and an
//! RX runs to completion inside [`Mb8795Device::receive_frame`]. No in-flight state is ever
//! observable through the registers.

use aero_net_backend::NetworkBackend;
use memory::MemoryBus;

use crate::irq::NetIrq;
use crate::regs::{align_to_burst, DmaCommand, DmaCsr, STAT_IDLE, TX_LIMIT_ADDR_MASK};
use crate::Mb8795Device;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DmaDirection {
    Tx,
    Rx,
}

/// Register state of one DMA channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DmaChannel {
    pub(crate) csr: DmaCsr,
    pub(crate) base: u32,
    pub(crate) limit: u32,
    pub(crate) saved_base: u32,
    pub(crate) saved_limit: u32,
    pub(crate) chain_base: u32,
    pub(crate) chain_limit: u32,
    pub(crate) base_latch: u32,
}

impl Default for DmaChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl DmaChannel {
    pub fn new() -> Self {
        Self {
            csr: DmaCsr::empty(),
            base: 0,
            limit: 0,
            saved_base: 0,
            saved_limit: 0,
            chain_base: 0,
            chain_limit: 0,
            base_latch: 0,
        }
    }

    pub fn csr(&self) -> DmaCsr {
        self.csr
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn saved_base(&self) -> u32 {
        self.saved_base
    }

    pub fn saved_limit(&self) -> u32 {
        self.saved_limit
    }

    pub fn chain_base(&self) -> u32 {
        self.chain_base
    }

    pub fn chain_limit(&self) -> u32 {
        self.chain_limit
    }

    /// Bytes between `base` and the address part of `limit`; zero if `limit` is below `base`.
    pub fn transfer_len(&self) -> usize {
        let limit = self.limit & TX_LIMIT_ADDR_MASK;
        limit.saturating_sub(self.base) as usize
    }

    /// Record a finished receive of `len` bytes and, if a chain update is pending, move on to
    /// the chained buffer.
    fn complete_rx(&mut self, len: u32) {
        self.saved_base = self.base;
        self.saved_limit = self.base.wrapping_add(len);
        if self.csr.contains(DmaCsr::SUPDATE) {
            self.base = self.chain_base;
            self.limit = self.chain_limit;
        }
        self.csr.insert(DmaCsr::COMPLETE);
    }
}

impl Mb8795Device {
    pub fn channel(&self, dir: DmaDirection) -> &DmaChannel {
        match dir {
            DmaDirection::Tx => &self.tx_dma,
            DmaDirection::Rx => &self.rx_dma,
        }
    }

    fn channel_mut(&mut self, dir: DmaDirection) -> &mut DmaChannel {
        match dir {
            DmaDirection::Tx => &mut self.tx_dma,
            DmaDirection::Rx => &mut self.rx_dma,
        }
    }

    /// Apply a CSR write.
    ///
    /// Command bits act in a fixed order: RESET, SETENABLE, SETSUPDATE, CLRCOMPLETE. Unknown bits
    /// are ignored.
    pub(crate) fn write_csr<B: NetworkBackend + ?Sized>(
        &mut self,
        mem: &mut dyn MemoryBus,
        net: &mut B,
        dir: DmaDirection,
        value: u32,
    ) {
        let cmd = DmaCommand::from_bits_truncate(value);
        tracing::trace!(?dir, ?cmd, "mb8795: csr write {value:#010x}");

        if cmd.contains(DmaCommand::RESET) {
            self.channel_mut(dir)
                .csr
                .remove(DmaCsr::COMPLETE | DmaCsr::SUPDATE | DmaCsr::ENABLE);
        }
        if cmd.contains(DmaCommand::SETENABLE) {
            match dir {
                DmaDirection::Tx => self.start_tx(mem, net),
                DmaDirection::Rx => self.rx_dma.csr.insert(DmaCsr::ENABLE),
            }
        }
        if cmd.contains(DmaCommand::SETSUPDATE) {
            self.channel_mut(dir).csr.insert(DmaCsr::SUPDATE);
        }
        if cmd.contains(DmaCommand::CLRCOMPLETE) {
            self.channel_mut(dir).csr.remove(DmaCsr::COMPLETE);
        }
        if dir == DmaDirection::Rx && cmd.contains(DmaCommand::DEV2M) {
            tracing::trace!("mb8795: rx channel set to device-to-memory");
        }
    }

    /// Copy `[base, limit)` out of guest memory and put it on the wire.
    fn start_tx<B: NetworkBackend + ?Sized>(&mut self, mem: &mut dyn MemoryBus, net: &mut B) {
        let base = self.tx_dma.base;
        let len = self.tx_dma.transfer_len();

        if len > self.config.tx_buffer_capacity {
            self.stats.tx_rejected += 1;
            tracing::warn!(
                len,
                capacity = self.config.tx_buffer_capacity,
                "mb8795: tx transfer {base:#x}..{:#x} exceeds buffer capacity; rejected",
                self.tx_dma.limit
            );
            return;
        }

        let frame = mem.read_vec(u64::from(base), len);
        if frame.is_empty() {
            tracing::debug!("mb8795: zero-length tx transfer at {base:#x}");
        } else {
            tracing::debug!(len, "mb8795: tx frame from {base:#x}");
            self.stats.tx_frames += 1;
            self.stats.tx_bytes += len as u64;
            net.transmit(frame);
        }

        self.tx_dma.csr.insert(DmaCsr::COMPLETE | DmaCsr::SUPDATE);
        self.tx.stat = STAT_IDLE;
        self.raise_irq(NetIrq::TxDma);
    }

    /// Receiver accept gate. While this is `false` the host must hold on to its frames.
    pub fn can_receive(&self) -> bool {
        self.rx.accepts_frames()
    }

    /// Deliver a host → guest frame.
    ///
    /// The frame is written at the RX channel's current base, padded with zeros to a whole number
    /// of 32-byte bursts. Returns the number of bytes written, or `None` (with no state touched)
    /// if the receiver is not accepting frames.
    pub fn receive_frame(&mut self, mem: &mut dyn MemoryBus, frame: &[u8]) -> Option<usize> {
        if !self.can_receive() {
            tracing::trace!(len = frame.len(), "mb8795: receiver closed; frame deferred");
            return None;
        }

        let len = align_to_burst(frame.len());
        let base = self.rx_dma.base;
        let window = u64::from(self.rx_dma.limit).saturating_sub(u64::from(base));
        if len as u64 > window {
            tracing::warn!(
                len,
                "mb8795: rx frame overruns receive buffer {base:#x}..{:#x}",
                self.rx_dma.limit
            );
        }

        if len == frame.len() {
            mem.write_physical(u64::from(base), frame);
        } else {
            let mut burst = Vec::with_capacity(len);
            burst.extend_from_slice(frame);
            burst.resize(len, 0);
            mem.write_physical(u64::from(base), &burst);
        }

        self.rx_dma.complete_rx(u32::try_from(len).unwrap_or(u32::MAX));
        self.rx.stat = STAT_IDLE;
        self.stats.rx_frames += 1;
        self.stats.rx_bytes += frame.len() as u64;
        tracing::debug!(
            len = frame.len(),
            written = len,
            "mb8795: rx frame to {base:#x}, next buffer {:#x}",
            self.rx_dma.base
        );

        self.raise_irq(NetIrq::RxDma);
        Some(len)
    }
}
