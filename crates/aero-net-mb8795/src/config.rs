use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::mmio::{MmioWindow, REGISTER_SPACE_SIZE};

/// Station address the controller powers up with (NeXT OUI).
pub const DEFAULT_MAC_ADDR: [u8; 6] = [0x00, 0x00, 0x0F, 0x00, 0xF3, 0x02];

/// Address applied when the guest leaves the station address all zeros.
pub const DEFAULT_FALLBACK_MAC_ADDR: [u8; 6] = [0x52, 0x54, 0x00, 0x12, 0x34, 0x56];

/// Local TX transfer buffer size (one maximum-size Ethernet frame plus slack).
pub const DEFAULT_TX_BUFFER_CAPACITY: usize = 1600;

/// Hard ceiling for [`Mb8795Config::tx_buffer_capacity`].
pub const MAX_TX_BUFFER_CAPACITY: usize = 64 * 1024;

/// Window exposing the status/mode/station-address cluster (board address 0x0210_6000).
pub const DEFAULT_CONTROL_WINDOW: MmioWindow = MmioWindow::new(0x6000, 0x1000);

/// Window exposing the DMA CSRs and buffer pointers (board address 0x0200_0110).
pub const DEFAULT_DMA_WINDOW: MmioWindow = MmioWindow::new(0x0110, 0x4400);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Mb8795ConfigError {
    #[error("tx buffer capacity must be non-zero")]
    ZeroTxBufferCapacity,

    #[error("tx buffer capacity {capacity} exceeds maximum {max}")]
    TxBufferTooLarge { capacity: usize, max: usize },

    #[error("mmio window {index} is empty")]
    EmptyWindow { index: usize },

    #[error("mmio window {index} (base=0x{base:x} size=0x{size:x}) exceeds the register space")]
    WindowOutOfRange { index: usize, base: u64, size: u64 },
}

/// Host-side configuration of an MB8795 instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Mb8795Config {
    pub mac_addr: [u8; 6],
    pub fallback_mac_addr: [u8; 6],
    /// TX transfers longer than this are rejected without touching device state.
    pub tx_buffer_capacity: usize,
    /// `[control, dma]` decode windows, see [`crate::mmio::Mb8795Window`].
    pub windows: [MmioWindow; 2],
}

impl Default for Mb8795Config {
    fn default() -> Self {
        Self {
            mac_addr: DEFAULT_MAC_ADDR,
            fallback_mac_addr: DEFAULT_FALLBACK_MAC_ADDR,
            tx_buffer_capacity: DEFAULT_TX_BUFFER_CAPACITY,
            windows: [DEFAULT_CONTROL_WINDOW, DEFAULT_DMA_WINDOW],
        }
    }
}

impl Mb8795Config {
    pub fn validate(&self) -> Result<(), Mb8795ConfigError> {
        if self.tx_buffer_capacity == 0 {
            return Err(Mb8795ConfigError::ZeroTxBufferCapacity);
        }
        if self.tx_buffer_capacity > MAX_TX_BUFFER_CAPACITY {
            return Err(Mb8795ConfigError::TxBufferTooLarge {
                capacity: self.tx_buffer_capacity,
                max: MAX_TX_BUFFER_CAPACITY,
            });
        }
        for (index, window) in self.windows.iter().enumerate() {
            if window.size == 0 {
                return Err(Mb8795ConfigError::EmptyWindow { index });
            }
            let end = window.base.checked_add(window.size);
            if end.map_or(true, |end| end > REGISTER_SPACE_SIZE) {
                return Err(Mb8795ConfigError::WindowOutOfRange {
                    index,
                    base: window.base,
                    size: window.size,
                });
            }
        }
        Ok(())
    }
}
