//! Physical memory windows over a memory device
//!
//! The adapter never touches hardware directly; it asks an [`MmioMapper`]
//! for windows onto physical memory and performs volatile 32-bit accesses
//! through [`MmioWindow`]. Production code maps `/dev/mem`; tests inject a
//! byte-array-backed fake.
//!
//! # Safety
//!
//! Mapping physical memory requires root and the caller must know the window
//! only covers MMIO registers it is allowed to touch.

use std::fs::File;
use std::path::Path;

use log::error;

use crate::error::{DmemError, Result};

/// A mapped window of physical memory with volatile word access
///
/// Offsets are relative to the (possibly unaligned) base address the window
/// was requested at.
pub trait MmioWindow {
    /// Volatile 32-bit load
    fn read_u32(&self, offset: usize) -> u32;
    /// Volatile 32-bit store
    fn write_u32(&self, offset: usize, val: u32);
    /// Usable window length in bytes
    fn len(&self) -> usize;
    /// Whether the window is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Capability to map physical windows into the process
pub trait MmioMapper {
    /// Host page size the mapper aligns to
    fn page_size(&self) -> usize;

    /// Map `len` bytes of physical memory at `base` from `device`
    fn map(&self, device: &Path, base: u64, len: usize) -> Result<Box<dyn MmioWindow>>;
}

/// Page-extend `[base, base + len)`: returns the aligned mapping start, the
/// padded mapping length, and the offset of `base` within the mapping.
pub(crate) fn page_span(base: u64, len: usize, page_size: usize) -> (u64, usize, usize) {
    let delta = (base % page_size as u64) as usize;
    let mut map_len = len + delta;
    let tail = map_len % page_size;
    if tail != 0 {
        map_len += page_size - tail;
    }
    (base - delta as u64, map_len, delta)
}

/// Mapper backed by a character memory device, `/dev/mem` by default
pub struct DevMemMapper;

impl MmioMapper for DevMemMapper {
    fn page_size(&self) -> usize {
        // SAFETY: sysconf has no preconditions
        unsafe { libc::sysconf(libc::_SC_PAGESIZE) as usize }
    }

    fn map(&self, device: &Path, base: u64, len: usize) -> Result<Box<dyn MmioWindow>> {
        use std::os::unix::fs::OpenOptionsExt;
        use std::os::unix::io::AsRawFd;

        // O_SYNC for uncached access, required for MMIO
        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open(device)
            .map_err(|e| DmemError::DeviceOpen {
                path: device.display().to_string(),
                reason: e.to_string(),
            })?;

        let (aligned_base, map_len, delta) = page_span(base, len, self.page_size());

        // SAFETY: mapping a shared file-backed window; the pointer is only
        // dereferenced through the volatile accessors below, within map_len
        let ptr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                map_len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                aligned_base as libc::off_t,
            )
        };
        if ptr == libc::MAP_FAILED {
            return Err(DmemError::MapFailed {
                addr: base,
                len,
            });
        }

        Ok(Box::new(DevMemWindow {
            map_base: ptr as *mut u8,
            map_len,
            delta,
            len,
            _file: file,
        }))
    }
}

struct DevMemWindow {
    map_base: *mut u8,
    map_len: usize,
    delta: usize,
    len: usize,
    _file: File,
}

impl MmioWindow for DevMemWindow {
    #[inline]
    fn read_u32(&self, offset: usize) -> u32 {
        debug_assert!(self.delta + offset + 4 <= self.map_len);
        // SAFETY: in-bounds volatile read of the shared mapping
        unsafe {
            core::ptr::read_volatile(self.map_base.add(self.delta + offset) as *const u32)
        }
    }

    #[inline]
    fn write_u32(&self, offset: usize, val: u32) {
        debug_assert!(self.delta + offset + 4 <= self.map_len);
        // SAFETY: in-bounds volatile write of the shared mapping
        unsafe {
            core::ptr::write_volatile(self.map_base.add(self.delta + offset) as *mut u32, val);
        }
    }

    fn len(&self) -> usize {
        self.len
    }
}

impl Drop for DevMemWindow {
    fn drop(&mut self) {
        // SAFETY: unmapping the exact region returned by mmap
        let ret = unsafe { libc::munmap(self.map_base as *mut libc::c_void, self.map_len) };
        if ret == -1 {
            error!("failed to unmap window of {:#x} bytes", self.map_len);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_span_aligned_input() {
        assert_eq!(page_span(0x1000, 0x1000, 0x1000), (0x1000, 0x1000, 0));
    }

    #[test]
    fn page_span_pads_both_ends() {
        // Unaligned start pulls the base down and grows the length
        let (base, len, delta) = page_span(0x1080, 0x200, 0x1000);
        assert_eq!(base, 0x1000);
        assert_eq!(delta, 0x80);
        assert_eq!(len, 0x1000);

        // A window straddling a page boundary needs two pages
        let (base, len, delta) = page_span(0x1f00, 0x200, 0x1000);
        assert_eq!(base, 0x1000);
        assert_eq!(delta, 0xf00);
        assert_eq!(len, 0x2000);
    }

    #[test]
    fn page_span_rounds_length_up() {
        assert_eq!(page_span(0x2000, 0x101, 0x1000), (0x2000, 0x1000, 0));
    }

    #[test]
    #[ignore] // Requires root and /dev/mem access
    fn devmem_map_round_trip() {
        let mapper = DevMemMapper;
        let window = mapper.map(Path::new("/dev/mem"), 0x0, 0x1000).unwrap();
        let _ = window.read_u32(0);
    }
}
