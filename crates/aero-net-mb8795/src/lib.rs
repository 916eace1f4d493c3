//! NeXT MB8795 Ethernet controller with its pair of NeXT DMA channels.
//!
//! The device is a register-level model: the machine forwards bus accesses through one of two
//! [`Mb8795Window`]s, transmit frames are pushed synchronously to a
//! [`aero_net_backend::NetworkBackend`] when the guest starts a TX transfer, and the host
//! delivers received frames with [`Mb8795Device::receive_frame`] whenever
//! [`Mb8795Device::can_receive`] allows it.

#![forbid(unsafe_code)]

mod config;
mod dma;
mod irq;
mod mmio;
mod regfile;
pub mod regs;

pub use config::{
    Mb8795Config, Mb8795ConfigError, DEFAULT_CONTROL_WINDOW, DEFAULT_DMA_WINDOW,
    DEFAULT_FALLBACK_MAC_ADDR, DEFAULT_MAC_ADDR, DEFAULT_TX_BUFFER_CAPACITY,
    MAX_TX_BUFFER_CAPACITY,
};
pub use dma::{DmaChannel, DmaDirection};
pub use irq::{IrqLine, Mb8795IrqLines, NetIrq, NetIrqSink, NoIrq};
pub use mmio::{Mb8795Window, MmioWindow, REGISTER_SPACE_SIZE};
pub use regfile::{ChannelStatus, DeviceIdentity};

/// Counters kept by the device for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Mb8795Stats {
    pub tx_frames: u64,
    pub tx_bytes: u64,
    /// TX transfers refused because they did not fit the transmit buffer.
    pub tx_rejected: u64,
    pub rx_frames: u64,
    pub rx_bytes: u64,
    pub unmapped_accesses: u64,
}

#[derive(Debug)]
pub struct Mb8795Device {
    config: Mb8795Config,
    irqs: Mb8795IrqLines,
    irq_levels: [bool; 4],

    identity: DeviceIdentity,
    tx: ChannelStatus,
    rx: ChannelStatus,
    rst_mode: u8,

    tx_dma: DmaChannel,
    rx_dma: DmaChannel,

    stats: Mb8795Stats,
}

impl Mb8795Device {
    /// Device with all interrupt lines unconnected.
    pub fn new(config: Mb8795Config) -> Result<Self, Mb8795ConfigError> {
        Self::with_irqs(config, Mb8795IrqLines::default())
    }

    pub fn with_irqs(
        config: Mb8795Config,
        irqs: Mb8795IrqLines,
    ) -> Result<Self, Mb8795ConfigError> {
        config.validate()?;
        let identity = DeviceIdentity::new(config.mac_addr, config.fallback_mac_addr);
        Ok(Self {
            config,
            irqs,
            irq_levels: [false; 4],
            identity,
            tx: ChannelStatus::default(),
            rx: ChannelStatus::default(),
            rst_mode: 0,
            tx_dma: DmaChannel::new(),
            rx_dma: DmaChannel::new(),
            stats: Mb8795Stats::default(),
        })
    }

    /// Machine reset: registers and DMA channels go back to zero and every interrupt line is
    /// lowered. The station address, configuration and counters survive.
    pub fn reset(&mut self) {
        self.tx = ChannelStatus::default();
        self.rx = ChannelStatus::default();
        self.rst_mode = 0;
        self.tx_dma = DmaChannel::new();
        self.rx_dma = DmaChannel::new();
        for line in NetIrq::ALL {
            self.irq_levels[line.index()] = false;
            self.irqs.line(line).set_level(false);
        }
        tracing::debug!("mb8795: reset");
    }

    pub fn config(&self) -> &Mb8795Config {
        &self.config
    }

    pub fn mac_addr(&self) -> [u8; 6] {
        self.identity.mac()
    }

    pub fn tx_channel(&self) -> &DmaChannel {
        &self.tx_dma
    }

    pub fn rx_channel(&self) -> &DmaChannel {
        &self.rx_dma
    }

    pub fn tx_status(&self) -> ChannelStatus {
        self.tx
    }

    pub fn rx_status(&self) -> ChannelStatus {
        self.rx
    }

    pub fn stats(&self) -> Mb8795Stats {
        self.stats
    }

    /// Last level driven on each line, indexed by [`NetIrq::index`].
    pub fn irq_levels(&self) -> [bool; 4] {
        self.irq_levels
    }

    pub fn irq_level(&self, line: NetIrq) -> bool {
        self.irq_levels[line.index()]
    }

    pub(crate) fn raise_irq(&mut self, line: NetIrq) {
        tracing::trace!(?line, "mb8795: irq asserted");
        self.irq_levels[line.index()] = true;
        self.irqs.line(line).set_level(true);
    }
}
