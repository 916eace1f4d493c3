//! Register layout and bit definitions for the MB8795 Ethernet controller and its two NeXT DMA
//! channels.
//!
//! Offsets are *logical* register offsets (after window normalization, see [`crate::mmio`]).

use bitflags::bitflags;

// Byte-wide controller registers.
pub const NET_TXSTAT: u64 = 0x6000;
pub const NET_TXMASK: u64 = 0x6001;
pub const NET_RXSTAT: u64 = 0x6002;
pub const NET_RXMASK: u64 = 0x6003;
pub const NET_TXMODE: u64 = 0x6004;
pub const NET_RXMODE: u64 = 0x6005;
pub const NET_RSTMODE: u64 = 0x6006;
/// First of six write-only station address bytes.
pub const NET_MAC0: u64 = 0x6008;
/// Last station address byte. Writing it also applies the fallback address if still unset.
pub const NET_MAC5: u64 = 0x600D;
/// Bytes the boot ROM pokes during bring-up. Writes are accepted and ignored.
pub const NET_IGNORED_START: u64 = 0x6010;
pub const NET_IGNORED_END: u64 = 0x6014;

// Long-wide DMA channel registers.
pub const TX_CSR: u64 = 0x0110;
pub const RX_CSR: u64 = 0x0150;

pub const TX_SAVED_BASE: u64 = 0x4100;
pub const TX_SAVED_LIMIT: u64 = 0x4104;
pub const TX_BASE: u64 = 0x4110;
pub const TX_LIMIT: u64 = 0x4114;
/// Second encoding of the TX base register; reads return the value latched by the last write.
pub const TX_BASE_ALIAS: u64 = 0x4310;

pub const RX_SAVED_BASE: u64 = 0x4140;
pub const RX_SAVED_LIMIT: u64 = 0x4144;
pub const RX_BASE: u64 = 0x4150;
pub const RX_LIMIT: u64 = 0x4154;
pub const RX_CHAIN_BASE: u64 = 0x4158;
pub const RX_CHAIN_LIMIT: u64 = 0x415C;

/// Guests acknowledge a status byte by writing all ones.
pub const STAT_CLEAR: u8 = 0xFF;
/// Status value reported after acknowledge and after every completed transfer.
pub const STAT_IDLE: u8 = 0x80;

/// RX mode bits that must be non-zero for the receiver to accept frames.
pub const RXMODE_ACCEPT_MASK: u8 = 0x03;

/// Receive DMA writes whole 32-byte bursts.
pub const DMA_BURST_ALIGN: usize = 32;

/// The TX limit register carries control bits above the 28-bit address.
pub const TX_LIMIT_ADDR_MASK: u32 = 0x0FFF_FFFF;

bitflags! {
    /// Readable channel state bits of a DMA CSR.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct DmaCsr: u32 {
        const ENABLE = 0x0100_0000;
        const SUPDATE = 0x0200_0000;
        const DEV2M = 0x0400_0000;
        const COMPLETE = 0x0800_0000;
    }
}

bitflags! {
    /// Write-only command bits decoded from a DMA CSR write.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct DmaCommand: u32 {
        const SETENABLE = 0x0001_0000;
        const SETSUPDATE = 0x0002_0000;
        const CLRCOMPLETE = 0x0008_0000;
        const RESET = 0x0010_0000;
        const INITBUF = 0x0020_0000;
        /// Direction bit as written by drivers; only logged.
        const DEV2M = 0x0400_0000;
    }
}

/// Round `len` up to the next multiple of [`DMA_BURST_ALIGN`].
pub fn align_to_burst(len: usize) -> usize {
    len.div_ceil(DMA_BURST_ALIGN) * DMA_BURST_ALIGN
}
