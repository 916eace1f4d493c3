//! Glue logic for pumping Ethernet frames from host backends into an emulated MB8795.
//!
//! Guest → host traffic needs no pumping: the MB8795 hands each frame to the backend
//! synchronously when the guest starts a TX transfer. The host → guest direction is pulled here,
//! once per emulation slice:
//! 1. Stop if the NIC's receiver is closed ([`Mb8795Device::can_receive`]).
//! 2. Otherwise fetch one frame with [`NetworkBackend::poll_receive`] and DMA it into guest memory.
//! 3. Repeat until the backend runs dry or the frame budget is spent.
//!
//! The accept check always happens *before* the backend is polled, so a closed receiver leaves
//! frames queued in the backend instead of dropping them.
#![forbid(unsafe_code)]

use aero_net_backend::NetworkBackend;
use aero_net_mb8795::{Mb8795Device, Mb8795Window};
use memory::MemoryBus;

/// Default frame budget per [`Mb8795Pump::poll`] call.
pub const DEFAULT_MAX_FRAMES_PER_POLL: usize = 256;

/// Outcome of one tick/poll.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PumpCounts {
    /// Host → guest frames fetched from the backend and written into guest memory.
    pub rx_frames: usize,
    /// The tick ended early because the receiver stopped accepting frames.
    pub rx_blocked: bool,
}

/// Configuration-only pump helper for integration layers that *borrow* the NIC and backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mb8795TickPump {
    pub max_rx_frames_per_tick: usize,
}

impl Default for Mb8795TickPump {
    fn default() -> Self {
        Self {
            max_rx_frames_per_tick: DEFAULT_MAX_FRAMES_PER_POLL,
        }
    }
}

impl Mb8795TickPump {
    pub fn new(max_rx_frames_per_tick: usize) -> Self {
        Self {
            max_rx_frames_per_tick,
        }
    }

    pub fn tick<B: NetworkBackend + ?Sized>(
        &mut self,
        nic: &mut Mb8795Device,
        mem: &mut dyn MemoryBus,
        backend: &mut B,
    ) -> PumpCounts {
        tick_mb8795(nic, mem, backend, self.max_rx_frames_per_tick)
    }
}

/// Pump frames from a borrowed [`NetworkBackend`] into a borrowed [`Mb8795Device`].
///
/// Each delivered frame is a complete RX DMA transfer and raises the RX DMA interrupt. Frames are
/// never fetched while the receiver is closed.
pub fn tick_mb8795<B: NetworkBackend + ?Sized>(
    nic: &mut Mb8795Device,
    mem: &mut dyn MemoryBus,
    backend: &mut B,
    max_rx_frames_per_tick: usize,
) -> PumpCounts {
    let mut counts = PumpCounts::default();

    for _ in 0..max_rx_frames_per_tick {
        if !nic.can_receive() {
            counts.rx_blocked = true;
            break;
        }
        let Some(frame) = backend.poll_receive() else {
            break;
        };
        match nic.receive_frame(mem, &frame) {
            Some(_) => counts.rx_frames += 1,
            // `can_receive` was checked above and nothing in between touches the RX mode.
            None => {
                tracing::warn!(len = frame.len(), "mb8795 pump: frame refused after accept check");
                counts.rx_blocked = true;
                break;
            }
        }
    }

    if counts.rx_frames > 0 {
        tracing::trace!(rx_frames = counts.rx_frames, "mb8795 pump: tick");
    }
    counts
}

/// Owns an [`Mb8795Device`] together with the host-side [`NetworkBackend`] it talks to.
///
/// Guest register accesses go through [`Mb8795Pump::mmio_read`]/[`Mb8795Pump::mmio_write`] so TX
/// frames reach the owned backend.
#[derive(Debug)]
pub struct Mb8795Pump<B> {
    nic: Mb8795Device,
    backend: B,

    max_rx_frames_per_poll: usize,
}

impl<B: NetworkBackend> Mb8795Pump<B> {
    pub fn new(nic: Mb8795Device, backend: B) -> Self {
        Self::with_budget(nic, backend, DEFAULT_MAX_FRAMES_PER_POLL)
    }

    pub fn with_budget(nic: Mb8795Device, backend: B, max_rx_frames_per_poll: usize) -> Self {
        Self {
            nic,
            backend,
            max_rx_frames_per_poll,
        }
    }

    /// Run one pump iteration.
    pub fn poll(&mut self, mem: &mut dyn MemoryBus) -> PumpCounts {
        tick_mb8795(
            &mut self.nic,
            mem,
            &mut self.backend,
            self.max_rx_frames_per_poll,
        )
    }

    pub fn mmio_read(&mut self, window: Mb8795Window, offset: u64, size: usize) -> u32 {
        self.nic.mmio_read(window, offset, size)
    }

    pub fn mmio_write(
        &mut self,
        mem: &mut dyn MemoryBus,
        window: Mb8795Window,
        offset: u64,
        size: usize,
        value: u32,
    ) {
        self.nic
            .mmio_write(mem, &mut self.backend, window, offset, size, value);
    }

    pub fn nic(&self) -> &Mb8795Device {
        &self.nic
    }

    pub fn nic_mut(&mut self) -> &mut Mb8795Device {
        &mut self.nic
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_parts(self) -> (Mb8795Device, B) {
        (self.nic, self.backend)
    }

    pub fn max_rx_frames_per_poll(&self) -> usize {
        self.max_rx_frames_per_poll
    }

    pub fn set_max_rx_frames_per_poll(&mut self, value: usize) {
        self.max_rx_frames_per_poll = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use aero_net_backend::QueueBackend;
    use aero_net_mb8795::{regs, Mb8795Config};
    use memory::DenseMemory;

    fn open_receiver(nic: &mut Mb8795Device, mem: &mut DenseMemory, base: u32) {
        nic.write_u32(mem, &mut (), regs::RX_BASE, base);
        nic.write_u32(mem, &mut (), regs::RX_LIMIT, base + 0x800);
        nic.write_u8(regs::NET_RXMODE, 0x01);
    }

    #[test]
    fn closed_receiver_leaves_frames_in_backend() {
        let mut mem = DenseMemory::new(0x10_000).unwrap();
        let mut nic = Mb8795Device::new(Mb8795Config::default()).unwrap();
        let mut backend = QueueBackend::new();
        backend.push_rx(vec![0xAA; 60]);

        let counts = tick_mb8795(&mut nic, &mut mem, &mut backend, 16);

        assert_eq!(
            counts,
            PumpCounts {
                rx_frames: 0,
                rx_blocked: true,
            }
        );
        assert_eq!(backend.pending_rx(), 1);
        assert_eq!(nic.stats().rx_frames, 0);
    }

    #[test]
    fn open_receiver_drains_up_to_budget() {
        let mut mem = DenseMemory::new(0x10_000).unwrap();
        let mut nic = Mb8795Device::new(Mb8795Config::default()).unwrap();
        open_receiver(&mut nic, &mut mem, 0x2000);

        let mut backend = QueueBackend::new();
        for i in 0..3u8 {
            backend.push_rx(vec![i; 20]);
        }

        let counts = Mb8795TickPump::new(2).tick(&mut nic, &mut mem, &mut backend);
        assert_eq!(counts.rx_frames, 2);
        assert!(!counts.rx_blocked);
        assert_eq!(backend.pending_rx(), 1);

        let counts = Mb8795TickPump::new(2).tick(&mut nic, &mut mem, &mut backend);
        assert_eq!(counts.rx_frames, 1);
        assert_eq!(backend.pending_rx(), 0);
        assert_eq!(nic.stats().rx_frames, 3);
    }

    #[test]
    fn zero_budget_never_polls_backend() {
        struct Panicking;

        impl NetworkBackend for Panicking {
            fn transmit(&mut self, _frame: Vec<u8>) {}

            fn poll_receive(&mut self) -> Option<Vec<u8>> {
                panic!("backend polled with zero budget");
            }
        }

        let mut mem = DenseMemory::new(0x10_000).unwrap();
        let mut nic = Mb8795Device::new(Mb8795Config::default()).unwrap();
        open_receiver(&mut nic, &mut mem, 0x2000);

        let counts = tick_mb8795(&mut nic, &mut mem, &mut Panicking, 0);
        assert_eq!(counts, PumpCounts::default());
    }
}
