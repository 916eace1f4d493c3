/// Abstraction for guest physical memory access performed by device DMA engines.
///
/// Accesses never fail from the device's point of view: implementations decide what an access
/// outside backed memory means (Aero floats unmapped reads high and drops unmapped writes). Reads
/// take `&mut self` so implementations may route some ranges to side-effecting MMIO.
pub trait MemoryBus {
    fn read_physical(&mut self, paddr: u64, buf: &mut [u8]);
    fn write_physical(&mut self, paddr: u64, buf: &[u8]);

    /// Reads `len` bytes starting at `paddr` into a freshly allocated buffer.
    fn read_vec(&mut self, paddr: u64, len: usize) -> Vec<u8> {
        let mut buf = vec![0u8; len];
        self.read_physical(paddr, &mut buf);
        buf
    }

    fn read_u8(&mut self, paddr: u64) -> u8 {
        let mut buf = [0u8; 1];
        self.read_physical(paddr, &mut buf);
        buf[0]
    }

    fn read_u32(&mut self, paddr: u64) -> u32 {
        let mut buf = [0u8; 4];
        self.read_physical(paddr, &mut buf);
        u32::from_le_bytes(buf)
    }

    fn write_u8(&mut self, paddr: u64, val: u8) {
        self.write_physical(paddr, &[val]);
    }

    fn write_u32(&mut self, paddr: u64, val: u32) {
        self.write_physical(paddr, &val.to_le_bytes());
    }
}

impl<T: MemoryBus + ?Sized> MemoryBus for &mut T {
    fn read_physical(&mut self, paddr: u64, buf: &mut [u8]) {
        <T as MemoryBus>::read_physical(&mut **self, paddr, buf);
    }

    fn write_physical(&mut self, paddr: u64, buf: &[u8]) {
        <T as MemoryBus>::write_physical(&mut **self, paddr, buf);
    }
}

impl<T: MemoryBus + ?Sized> MemoryBus for Box<T> {
    fn read_physical(&mut self, paddr: u64, buf: &mut [u8]) {
        <T as MemoryBus>::read_physical(&mut **self, paddr, buf);
    }

    fn write_physical(&mut self, paddr: u64, buf: &[u8]) {
        <T as MemoryBus>::write_physical(&mut **self, paddr, buf);
    }
}
