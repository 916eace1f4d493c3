//! Host-side network backends for emulated NICs.
//!
//! Backends deal exclusively with raw Ethernet frames (`Vec<u8>`, no FCS). A NIC model hands
//! guest → host frames to [`NetworkBackend::transmit`] as soon as its DMA engine produces them;
//! host → guest frames are pulled with [`NetworkBackend::poll_receive`] by a pump that first checks
//! whether the NIC can accept a frame, so a backend never has to take a frame back.
#![forbid(unsafe_code)]

pub mod queue_backend;

pub use queue_backend::{QueueBackend, QueueBackendStats};

use std::cell::RefCell;
use std::rc::Rc;

/// Network backend bridging frames between an emulated NIC and the host network.
pub trait NetworkBackend {
    /// Transmit a guest → host Ethernet frame.
    fn transmit(&mut self, frame: Vec<u8>);

    /// Poll for a host → guest Ethernet frame.
    ///
    /// Callers only poll when the NIC is ready to take the frame; a returned frame is considered
    /// delivered.
    fn poll_receive(&mut self) -> Option<Vec<u8>> {
        None
    }
}

impl<T: NetworkBackend + ?Sized> NetworkBackend for Box<T> {
    fn transmit(&mut self, frame: Vec<u8>) {
        <T as NetworkBackend>::transmit(&mut **self, frame);
    }

    fn poll_receive(&mut self) -> Option<Vec<u8>> {
        <T as NetworkBackend>::poll_receive(&mut **self)
    }
}

impl<T: NetworkBackend + ?Sized> NetworkBackend for &mut T {
    fn transmit(&mut self, frame: Vec<u8>) {
        <T as NetworkBackend>::transmit(&mut **self, frame);
    }

    fn poll_receive(&mut self) -> Option<Vec<u8>> {
        <T as NetworkBackend>::poll_receive(&mut **self)
    }
}

/// Discards every transmitted frame and never receives.
impl NetworkBackend for () {
    fn transmit(&mut self, frame: Vec<u8>) {
        tracing::trace!(len = frame.len(), "dropping frame: no network backend attached");
    }
}

impl<B: NetworkBackend> NetworkBackend for Option<B> {
    fn transmit(&mut self, frame: Vec<u8>) {
        if let Some(backend) = self.as_mut() {
            backend.transmit(frame);
        }
    }

    fn poll_receive(&mut self) -> Option<Vec<u8>> {
        self.as_mut().and_then(|backend| backend.poll_receive())
    }
}

impl<T: NetworkBackend + ?Sized> NetworkBackend for Rc<RefCell<T>> {
    fn transmit(&mut self, frame: Vec<u8>) {
        self.borrow_mut().transmit(frame);
    }

    fn poll_receive(&mut self) -> Option<Vec<u8>> {
        self.borrow_mut().poll_receive()
    }
}
