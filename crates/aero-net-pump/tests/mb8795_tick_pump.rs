use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use aero_net_backend::{NetworkBackend, QueueBackend};
use aero_net_mb8795::regs::{DmaCommand, DmaCsr};
use aero_net_mb8795::{Mb8795Config, Mb8795Device, Mb8795Window};
use aero_net_pump::{tick_mb8795, Mb8795Pump, Mb8795TickPump, PumpCounts};
use memory::MemoryBus;

struct TestDma {
    mem: Vec<u8>,
}

impl TestDma {
    fn new(size: usize) -> Self {
        Self {
            mem: vec![0u8; size],
        }
    }

    fn write(&mut self, addr: u64, bytes: &[u8]) {
        let addr = addr as usize;
        self.mem[addr..addr + bytes.len()].copy_from_slice(bytes);
    }

    fn read_vec(&self, addr: u64, len: usize) -> Vec<u8> {
        let addr = addr as usize;
        self.mem[addr..addr + len].to_vec()
    }
}

impl MemoryBus for TestDma {
    fn read_physical(&mut self, paddr: u64, buf: &mut [u8]) {
        let addr = paddr as usize;
        buf.copy_from_slice(&self.mem[addr..addr + buf.len()]);
    }

    fn write_physical(&mut self, paddr: u64, buf: &[u8]) {
        let addr = paddr as usize;
        self.mem[addr..addr + buf.len()].copy_from_slice(buf);
    }
}

fn build_test_frame(payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(14 + payload.len());
    // Ethernet header (dst/src/ethertype).
    frame.extend_from_slice(&[0x00, 0x00, 0x0F, 0x00, 0xF3, 0x02]);
    frame.extend_from_slice(&[0x02, 0x00, 0x00, 0x00, 0x00, 0x02]);
    frame.extend_from_slice(&0x0800u16.to_be_bytes());
    frame.extend_from_slice(payload);
    frame
}

// Offsets as seen through the default windows.
const CTL_RXMODE: u64 = 0x05;
const DMA_TX_CSR: u64 = 0x0000;
const DMA_RX_CSR: u64 = 0x0040;
const DMA_TX_BASE: u64 = 0x4000;
const DMA_TX_LIMIT: u64 = 0x4004;
const DMA_RX_SAVED_LIMIT: u64 = 0x4034;
const DMA_RX_BASE: u64 = 0x4040;
const DMA_RX_LIMIT: u64 = 0x4044;
const DMA_RX_CHAIN_BASE: u64 = 0x4048;
const DMA_RX_CHAIN_LIMIT: u64 = 0x404C;

fn arm_rx<B: NetworkBackend>(pump: &mut Mb8795Pump<B>, dma: &mut TestDma, base: u32) {
    pump.mmio_write(dma, Mb8795Window::Dma, DMA_RX_BASE, 4, base);
    pump.mmio_write(dma, Mb8795Window::Dma, DMA_RX_LIMIT, 4, base + 0x600);
    pump.mmio_write(
        dma,
        Mb8795Window::Dma,
        DMA_RX_CSR,
        4,
        (DmaCommand::SETENABLE | DmaCommand::DEV2M).bits(),
    );
    pump.mmio_write(dma, Mb8795Window::Control, CTL_RXMODE, 1, 0x01);
}

fn send_tx<B: NetworkBackend>(pump: &mut Mb8795Pump<B>, dma: &mut TestDma, base: u32, len: u32) {
    pump.mmio_write(dma, Mb8795Window::Dma, DMA_TX_BASE, 4, base);
    pump.mmio_write(dma, Mb8795Window::Dma, DMA_TX_LIMIT, 4, base + len);
    pump.mmio_write(
        dma,
        Mb8795Window::Dma,
        DMA_TX_CSR,
        4,
        DmaCommand::SETENABLE.bits(),
    );
}

#[test]
fn guest_tx_through_pump_reaches_owned_backend() {
    let mut dma = TestDma::new(0x10_000);
    let nic = Mb8795Device::new(Mb8795Config::default()).unwrap();
    let mut pump = Mb8795Pump::new(nic, QueueBackend::new());

    let pkt = build_test_frame(b"guest->host");
    dma.write(0x4000, &pkt);
    send_tx(&mut pump, &mut dma, 0x4000, pkt.len() as u32);

    assert_eq!(pump.backend_mut().take_tx(), vec![pkt]);
    let csr = DmaCsr::from_bits_truncate(pump.mmio_read(Mb8795Window::Dma, DMA_TX_CSR, 4));
    assert!(csr.contains(DmaCsr::COMPLETE | DmaCsr::SUPDATE));
}

#[test]
fn host_frames_wait_until_guest_opens_receiver() {
    let mut dma = TestDma::new(0x10_000);
    let nic = Mb8795Device::new(Mb8795Config::default()).unwrap();
    let mut pump = Mb8795Pump::new(nic, QueueBackend::new());

    let pkt = build_test_frame(b"host->guest");
    pump.backend_mut().push_rx(pkt.clone());

    let counts = pump.poll(&mut dma);
    assert!(counts.rx_blocked);
    assert_eq!(pump.backend().pending_rx(), 1);

    arm_rx(&mut pump, &mut dma, 0x3000);
    let counts = pump.poll(&mut dma);
    assert_eq!(
        counts,
        PumpCounts {
            rx_frames: 1,
            rx_blocked: false,
        }
    );
    assert_eq!(dma.read_vec(0x3000, pkt.len()), pkt);
    let written = pump.mmio_read(Mb8795Window::Dma, DMA_RX_SAVED_LIMIT, 4);
    assert_eq!(written, 0x3000 + 32);
}

#[test]
fn chained_buffers_receive_consecutive_frames() {
    let mut dma = TestDma::new(0x10_000);
    let mut nic = Mb8795Device::new(Mb8795Config::default()).unwrap();
    let mut backend = QueueBackend::new();

    nic.mmio_write(&mut dma, &mut (), Mb8795Window::Dma, DMA_RX_BASE, 4, 0x3000);
    nic.mmio_write(&mut dma, &mut (), Mb8795Window::Dma, DMA_RX_LIMIT, 4, 0x3600);
    nic.mmio_write(&mut dma, &mut (), Mb8795Window::Dma, DMA_RX_CHAIN_BASE, 4, 0x5000);
    nic.mmio_write(&mut dma, &mut (), Mb8795Window::Dma, DMA_RX_CHAIN_LIMIT, 4, 0x5600);
    nic.mmio_write(
        &mut dma,
        &mut (),
        Mb8795Window::Dma,
        DMA_RX_CSR,
        4,
        (DmaCommand::SETENABLE | DmaCommand::SETSUPDATE).bits(),
    );
    nic.write_u8(aero_net_mb8795::regs::NET_RXMODE, 0x02);

    let rx0 = build_test_frame(b"rx0");
    let rx1 = build_test_frame(b"rx1");
    backend.push_rx(rx0.clone());
    backend.push_rx(rx1.clone());

    let counts = Mb8795TickPump::new(1).tick(&mut nic, &mut dma, &mut backend);
    assert_eq!(counts.rx_frames, 1);
    assert_eq!(dma.read_vec(0x3000, rx0.len()), rx0);
    assert_eq!(nic.rx_channel().base(), 0x5000);

    let counts = tick_mb8795(&mut nic, &mut dma, &mut backend, 1);
    assert_eq!(counts.rx_frames, 1);
    assert_eq!(dma.read_vec(0x5000, rx1.len()), rx1);
    assert_eq!(nic.rx_channel().saved_base(), 0x5000);
}

#[test]
fn tick_function_supports_trait_object_backend() {
    #[derive(Clone, Default)]
    struct SharedRx {
        rx: Rc<RefCell<VecDeque<Vec<u8>>>>,
    }

    impl NetworkBackend for SharedRx {
        fn transmit(&mut self, _frame: Vec<u8>) {}

        fn poll_receive(&mut self) -> Option<Vec<u8>> {
            self.rx.borrow_mut().pop_front()
        }
    }

    let mut dma = TestDma::new(0x10_000);
    let mut nic = Mb8795Device::new(Mb8795Config::default()).unwrap();
    nic.write_u32(&mut dma, &mut (), aero_net_mb8795::regs::RX_BASE, 0x2000);
    nic.write_u8(aero_net_mb8795::regs::NET_RXMODE, 0x01);

    let shared = SharedRx::default();
    let pkt = build_test_frame(b"boxed");
    shared.rx.borrow_mut().push_back(pkt.clone());
    let mut backend: Box<dyn NetworkBackend> = Box::new(shared.clone());

    let counts = tick_mb8795(&mut nic, &mut dma, backend.as_mut(), 8);

    assert_eq!(counts.rx_frames, 1);
    assert!(shared.rx.borrow().is_empty());
    assert_eq!(dma.read_vec(0x2000, pkt.len()), pkt);
}

#[test]
fn echoed_response_is_delivered_on_next_poll() {
    #[derive(Default)]
    struct EchoBackend {
        tx: Vec<Vec<u8>>,
        rx: VecDeque<Vec<u8>>,
    }

    impl NetworkBackend for EchoBackend {
        fn transmit(&mut self, frame: Vec<u8>) {
            self.tx.push(frame.clone());
            let mut resp = frame;
            if let Some(last) = resp.last_mut() {
                *last ^= 0xFF;
            }
            self.rx.push_back(resp);
        }

        fn poll_receive(&mut self) -> Option<Vec<u8>> {
            self.rx.pop_front()
        }
    }

    let mut dma = TestDma::new(0x10_000);
    let nic = Mb8795Device::new(Mb8795Config::default()).unwrap();
    let mut pump = Mb8795Pump::with_budget(nic, EchoBackend::default(), 1);
    arm_rx(&mut pump, &mut dma, 0x3000);

    let pkt = build_test_frame(b"ping");
    dma.write(0x4000, &pkt);
    send_tx(&mut pump, &mut dma, 0x4000, pkt.len() as u32);
    assert_eq!(pump.backend().tx, vec![pkt.clone()]);

    let _ = pump.poll(&mut dma);

    let mut expected = pkt;
    *expected.last_mut().unwrap() ^= 0xFF;
    assert_eq!(dma.read_vec(0x3000, expected.len()), expected);
    assert!(pump.nic().irq_levels()[1]);
}
