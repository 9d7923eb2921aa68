//! Device-resident buffers.
//!
//! On the reference execution runtime these are device allocations with
//! asynchronous kernel access and blocking host copies. The host backend
//! realizes the same contract with an owned, fixed-size buffer: allocation
//! size is set once at setup and never changes, and host transfers are
//! explicit method calls rather than implicit sharing, so call sites read
//! the same as they would against a real device.

/// Fixed-size device buffer of `T`.
///
/// Created at setup with its final length; never resized. Host access goes
/// through [`copy_to_host`](DeviceArray::copy_to_host) /
/// [`copy_from_host`](DeviceArray::copy_from_host), which are blocking with
/// respect to prior kernel launches on the reference runtime. Kernel-side
/// access uses the slice views.
#[derive(Clone, Debug)]
pub struct DeviceArray<T> {
    data: Box<[T]>,
}

impl<T: Copy + Default> DeviceArray<T> {
    /// Allocate a zero-initialized buffer of `len` entries.
    pub fn zeros(len: usize) -> Self {
        Self {
            data: vec![T::default(); len].into_boxed_slice(),
        }
    }

    /// Allocate and fill from a host slice.
    pub fn from_host(src: &[T]) -> Self {
        Self {
            data: src.to_vec().into_boxed_slice(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Broadcast-fill the whole buffer.
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    /// Blocking device-to-host copy of `dst.len()` entries starting at
    /// `offset`. Panics if the range is out of bounds, as an out-of-range
    /// device copy would fault.
    pub fn copy_to_host(&self, dst: &mut [T], offset: usize) {
        dst.copy_from_slice(&self.data[offset..offset + dst.len()]);
    }

    /// Blocking host-to-device copy of `src.len()` entries starting at
    /// `offset`.
    pub fn copy_from_host(&mut self, src: &[T], offset: usize) {
        self.data[offset..offset + src.len()].copy_from_slice(src);
    }

    /// Kernel-side read view of the whole buffer.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Kernel-side write view of the whole buffer.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Read view of `[offset, offset + len)`.
    pub fn slice(&self, offset: usize, len: usize) -> &[T] {
        &self.data[offset..offset + len]
    }

    /// Write view of `[offset, offset + len)`.
    pub fn slice_mut(&mut self, offset: usize, len: usize) -> &mut [T] {
        &mut self.data[offset..offset + len]
    }
}
