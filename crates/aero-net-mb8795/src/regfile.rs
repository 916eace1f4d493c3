//! Byte and long register accessors.
//!
//! Byte registers hold the per-direction status/mask/mode bytes and the station address; long
//! registers hold the DMA channel pointers and CSRs. Unmapped offsets read as zero and ignore
//! writes.

use aero_net_backend::NetworkBackend;
use memory::MemoryBus;

use crate::dma::DmaDirection;
use crate::regs::*;
use crate::Mb8795Device;

/// Status, interrupt mask and mode bytes of one direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelStatus {
    pub stat: u8,
    /// Stored for the guest; does not gate interrupt delivery.
    pub mask: u8,
    pub mode: u8,
}

impl ChannelStatus {
    /// `0xFF` acknowledges the status (back to idle); anything else is stored as written.
    pub fn write_stat(&mut self, value: u8) {
        self.stat = if value == STAT_CLEAR { STAT_IDLE } else { value };
    }

    pub(crate) fn accepts_frames(&self) -> bool {
        self.mode & RXMODE_ACCEPT_MASK != 0
    }
}

/// Station address as programmed by the guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceIdentity {
    mac: [u8; 6],
    fallback: [u8; 6],
}

impl DeviceIdentity {
    pub fn new(mac: [u8; 6], fallback: [u8; 6]) -> Self {
        Self { mac, fallback }
    }

    pub fn mac(&self) -> [u8; 6] {
        self.mac
    }

    pub(crate) fn set_byte(&mut self, index: usize, value: u8) {
        self.mac[index] = value;
    }

    /// Replace an all-zero address with the fallback. Returns whether it was applied.
    ///
    /// Runs on every write of the last address byte; once a non-zero address is in place this is
    /// a no-op.
    pub(crate) fn apply_default_if_unset(&mut self) -> bool {
        if self.mac != [0u8; 6] {
            return false;
        }
        self.mac = self.fallback;
        true
    }
}

impl Mb8795Device {
    pub fn read_u8(&mut self, offset: u64) -> u8 {
        let value = match offset {
            NET_TXSTAT => self.tx.stat,
            NET_TXMASK => self.tx.mask,
            NET_RXSTAT => self.rx.stat,
            NET_RXMASK => self.rx.mask,
            NET_TXMODE => self.tx.mode,
            NET_RXMODE => self.rx.mode,
            NET_RSTMODE => self.rst_mode,
            // Station address is write-only.
            NET_MAC0..=NET_MAC5 => 0,
            _ => {
                self.note_unmapped("read", offset, 1, None);
                return 0;
            }
        };
        tracing::trace!("mb8795: readb {offset:#x} -> {value:#04x}");
        value
    }

    pub fn write_u8(&mut self, offset: u64, value: u8) {
        tracing::trace!("mb8795: writeb {offset:#x} <- {value:#04x}");
        match offset {
            NET_TXSTAT => self.tx.write_stat(value),
            NET_TXMASK => self.tx.mask = value,
            NET_RXSTAT => self.rx.write_stat(value),
            NET_RXMASK => self.rx.mask = value,
            NET_TXMODE => self.tx.mode = value,
            NET_RXMODE => self.rx.mode = value,
            NET_RSTMODE => self.rst_mode = value,
            NET_MAC0..=NET_MAC5 => {
                self.identity.set_byte((offset - NET_MAC0) as usize, value);
                if offset == NET_MAC5 {
                    if self.identity.apply_default_if_unset() {
                        tracing::debug!("mb8795: station address unset; using fallback");
                    }
                    let m = self.identity.mac();
                    tracing::debug!(
                        "mb8795: station address {:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
                        m[0],
                        m[1],
                        m[2],
                        m[3],
                        m[4],
                        m[5]
                    );
                }
            }
            NET_IGNORED_START..=NET_IGNORED_END => {}
            _ => self.note_unmapped("write", offset, 1, Some(u32::from(value))),
        }
    }

    pub fn read_u32(&mut self, offset: u64) -> u32 {
        let value = match offset {
            TX_CSR => self.tx_dma.csr.bits(),
            TX_SAVED_BASE => self.tx_dma.saved_base,
            TX_SAVED_LIMIT => self.tx_dma.saved_limit,
            TX_BASE => self.tx_dma.base,
            TX_LIMIT => self.tx_dma.limit,
            TX_BASE_ALIAS => self.tx_dma.base_latch,
            RX_CSR => self.rx_dma.csr.bits(),
            RX_SAVED_BASE => self.rx_dma.saved_base,
            RX_SAVED_LIMIT => self.rx_dma.saved_limit,
            RX_BASE => self.rx_dma.base,
            RX_LIMIT => self.rx_dma.limit,
            RX_CHAIN_BASE => self.rx_dma.chain_base,
            RX_CHAIN_LIMIT => self.rx_dma.chain_limit,
            _ => {
                self.note_unmapped("read", offset, 4, None);
                return 0;
            }
        };
        tracing::trace!("mb8795: readl {offset:#x} -> {value:#010x}");
        value
    }

    /// Long register write. CSR writes may start a TX transfer, which reads guest memory through
    /// `mem` and hands the frame to `net`.
    pub fn write_u32<B: NetworkBackend + ?Sized>(
        &mut self,
        mem: &mut dyn MemoryBus,
        net: &mut B,
        offset: u64,
        value: u32,
    ) {
        match offset {
            TX_CSR => return self.write_csr(mem, net, DmaDirection::Tx, value),
            RX_CSR => return self.write_csr(mem, net, DmaDirection::Rx, value),
            TX_SAVED_BASE => self.tx_dma.saved_base = value,
            TX_SAVED_LIMIT => self.tx_dma.saved_limit = value,
            TX_BASE => self.tx_dma.base = value,
            TX_LIMIT => self.tx_dma.limit = value,
            TX_BASE_ALIAS => {
                self.tx_dma.base = value;
                self.tx_dma.base_latch = value;
            }
            RX_BASE => self.rx_dma.base = value,
            RX_LIMIT => self.rx_dma.limit = value,
            RX_CHAIN_BASE => self.rx_dma.chain_base = value,
            RX_CHAIN_LIMIT => self.rx_dma.chain_limit = value,
            _ => return self.note_unmapped("write", offset, 4, Some(value)),
        }
        tracing::trace!("mb8795: writel {offset:#x} <- {value:#010x}");
    }

    fn note_unmapped(&mut self, op: &'static str, offset: u64, size: usize, value: Option<u32>) {
        self.stats.unmapped_accesses += 1;
        match value {
            Some(value) => {
                tracing::debug!(op, size, "mb8795: unmapped {offset:#x} with {value:#x}")
            }
            None => tracing::debug!(op, size, "mb8795: unmapped {offset:#x}"),
        }
    }
}
