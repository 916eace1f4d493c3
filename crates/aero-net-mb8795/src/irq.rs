//! Interrupt outputs of the controller.
//!
//! The MB8795 exposes four level-triggered lines. Only the two DMA lines are driven by the
//! transfer logic; the plain TX/RX lines are wired up but never asserted.

use std::fmt;
use std::rc::Rc;

/// A single level-triggered interrupt line provided by the platform.
pub trait IrqLine {
    fn set_level(&self, level: bool);
}

/// Line that goes nowhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoIrq;

impl IrqLine for NoIrq {
    fn set_level(&self, _level: bool) {}
}

/// The controller's interrupt outputs, numbered as on the NeXT interrupt controller glue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetIrq {
    TxDma = 0,
    RxDma = 1,
    Tx = 2,
    Rx = 3,
}

impl NetIrq {
    pub const ALL: [NetIrq; 4] = [NetIrq::TxDma, NetIrq::RxDma, NetIrq::Tx, NetIrq::Rx];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Platform-side sink that receives every line change tagged with its [`NetIrq`].
pub trait NetIrqSink {
    fn set_irq(&self, line: NetIrq, level: bool);
}

struct SinkLine {
    sink: Rc<dyn NetIrqSink>,
    line: NetIrq,
}

impl IrqLine for SinkLine {
    fn set_level(&self, level: bool) {
        self.sink.set_irq(self.line, level);
    }
}

/// The four interrupt outputs handed to the device at construction.
pub struct Mb8795IrqLines {
    pub tx_dma: Box<dyn IrqLine>,
    pub rx_dma: Box<dyn IrqLine>,
    pub tx: Box<dyn IrqLine>,
    pub rx: Box<dyn IrqLine>,
}

impl Default for Mb8795IrqLines {
    fn default() -> Self {
        Self {
            tx_dma: Box::new(NoIrq),
            rx_dma: Box::new(NoIrq),
            tx: Box::new(NoIrq),
            rx: Box::new(NoIrq),
        }
    }
}

impl fmt::Debug for Mb8795IrqLines {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mb8795IrqLines").finish_non_exhaustive()
    }
}

impl Mb8795IrqLines {
    /// Route all four lines into one sink, e.g. the board's interrupt status register.
    pub fn from_sink(sink: Rc<dyn NetIrqSink>) -> Self {
        let make = |line: NetIrq| -> Box<dyn IrqLine> {
            Box::new(SinkLine {
                sink: sink.clone(),
                line,
            })
        };
        Self {
            tx_dma: make(NetIrq::TxDma),
            rx_dma: make(NetIrq::RxDma),
            tx: make(NetIrq::Tx),
            rx: make(NetIrq::Rx),
        }
    }

    pub fn line(&self, irq: NetIrq) -> &dyn IrqLine {
        match irq {
            NetIrq::TxDma => &*self.tx_dma,
            NetIrq::RxDma => &*self.rx_dma,
            NetIrq::Tx => &*self.tx,
            NetIrq::Rx => &*self.rx,
        }
    }
}
