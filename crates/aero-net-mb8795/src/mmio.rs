//! Physical decode windows and access-width dispatch.
//!
//! The board decodes the controller twice: a 4 KiB window over the status/mode cluster and a
//! 17 KiB window over the DMA registers. Each window adds its own base to the physical offset and
//! wraps into the 64 KiB logical register space, so both land in the single register file.

use aero_net_backend::NetworkBackend;
use memory::MemoryBus;
use serde::{Deserialize, Serialize};

use crate::Mb8795Device;

/// Size of the logical register space windows decode into.
pub const REGISTER_SPACE_SIZE: u64 = 0x1_0000;

/// One physical decode window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MmioWindow {
    /// Added to the physical offset to form the logical register offset.
    pub base: u64,
    /// Length of the physical region the host maps.
    pub size: u64,
}

impl MmioWindow {
    pub const fn new(base: u64, size: u64) -> Self {
        Self { base, size }
    }

    pub fn register_offset(&self, offset: u64) -> u64 {
        offset.wrapping_add(self.base) & (REGISTER_SPACE_SIZE - 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mb8795Window {
    /// Status, mask, mode and station address bytes.
    Control = 0,
    /// DMA CSRs and buffer pointers.
    Dma = 1,
}

impl Mb8795Device {
    pub fn window(&self, window: Mb8795Window) -> MmioWindow {
        self.config.windows[window as usize]
    }

    /// Bus read through `window`. `size` must be 1, 2 or 4.
    ///
    /// Halfword accesses are never issued by NeXT software; they read as zero.
    pub fn mmio_read(&mut self, window: Mb8795Window, offset: u64, size: usize) -> u32 {
        let reg = self.window(window).register_offset(offset);
        match size {
            1 => u32::from(self.read_u8(reg)),
            2 => {
                tracing::debug!("mb8795: halfword read @ {reg:#x} ignored");
                0
            }
            4 => self.read_u32(reg),
            _ => unreachable!("mb8795: unsupported MMIO read size {size}"),
        }
    }

    /// Bus write through `window`. `size` must be 1, 2 or 4.
    pub fn mmio_write<B: NetworkBackend + ?Sized>(
        &mut self,
        mem: &mut dyn MemoryBus,
        net: &mut B,
        window: Mb8795Window,
        offset: u64,
        size: usize,
        value: u32,
    ) {
        let reg = self.window(window).register_offset(offset);
        match size {
            1 => self.write_u8(reg, value as u8),
            2 => {
                tracing::debug!("mb8795: halfword write @ {reg:#x} with {value:#x} ignored");
            }
            4 => self.write_u32(mem, net, reg, value),
            _ => unreachable!("mb8795: unsupported MMIO write size {size}"),
        }
    }
}
