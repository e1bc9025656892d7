//! Device-resident buffers with explicit host transfers

use bytemuck::Pod;
use qshell_core::{QshellError, Result};
use tracing::error;

/// A typed allocation in device memory
///
/// Host code only reaches the contents through [`DeviceBuffer::upload`]
/// and [`DeviceBuffer::download`], which copy raw bytes and require
/// matching lengths. Kernels borrow the contents through the grid launcher.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceBuffer<T: Pod> {
    data: Vec<T>,
}

impl<T: Pod> DeviceBuffer<T> {
    /// Allocate `len` zeroed elements
    pub fn alloc_zeroed(len: usize) -> Result<Self> {
        let mut data = Vec::new();
        if data.try_reserve_exact(len).is_err() {
            error!(len, bytes = len.saturating_mul(core::mem::size_of::<T>()), "device allocation failed");
            return Err(QshellError::AllocationFailed);
        }
        data.resize(len, T::zeroed());
        Ok(Self { data })
    }

    /// Allocate and fill from a host slice
    pub fn from_host(host: &[T]) -> Result<Self> {
        let mut buffer = Self::alloc_zeroed(host.len())?;
        buffer.upload(host)?;
        Ok(buffer)
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer holds no elements
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Allocation size in bytes
    pub fn size_bytes(&self) -> usize {
        core::mem::size_of_val(self.data.as_slice())
    }

    /// Host-to-device copy
    pub fn upload(&mut self, host: &[T]) -> Result<()> {
        if host.len() != self.data.len() {
            error!(device = self.data.len(), host = host.len(), "upload length mismatch");
            return Err(QshellError::DeviceFailure);
        }
        bytemuck::cast_slice_mut::<T, u8>(&mut self.data).copy_from_slice(bytemuck::cast_slice(host));
        Ok(())
    }

    /// Device-to-host copy
    pub fn download(&self, host: &mut [T]) -> Result<()> {
        if host.len() != self.data.len() {
            error!(device = self.data.len(), host = host.len(), "download length mismatch");
            return Err(QshellError::DeviceFailure);
        }
        bytemuck::cast_slice_mut::<T, u8>(host).copy_from_slice(bytemuck::cast_slice(&self.data));
        Ok(())
    }

    /// Set every element to zero on the device
    pub fn fill_zeroed(&mut self) {
        bytemuck::cast_slice_mut::<T, u8>(&mut self.data).fill(0);
    }

    pub(crate) fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    #[test]
    fn test_transfer_round_trip() {
        let host = [Complex64::new(1.0, -2.0), Complex64::new(0.5, 3.0)];
        let buffer = DeviceBuffer::from_host(&host).unwrap();
        assert_eq!(buffer.size_bytes(), 32);

        let mut back = [Complex64::new(0.0, 0.0); 2];
        buffer.download(&mut back).unwrap();
        assert_eq!(back, host);
    }

    #[test]
    fn test_transfer_length_mismatch() {
        let mut buffer = DeviceBuffer::<u64>::alloc_zeroed(3).unwrap();
        assert_eq!(buffer.upload(&[1, 2]), Err(QshellError::DeviceFailure));
        let mut host = [0u64; 4];
        assert_eq!(buffer.download(&mut host), Err(QshellError::DeviceFailure));

        buffer.upload(&[7, 8, 9]).unwrap();
        buffer.fill_zeroed();
        assert_eq!(buffer.as_slice(), &[0, 0, 0]);
    }
}
