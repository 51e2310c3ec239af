//! Thin, platform-specific wrapper around the OS anonymous virtual-memory
//! mapping facility: `mmap`/`munmap` on unix, `VirtualAlloc`/`VirtualFree` on
//! Windows. Nothing above this module knows which platform it is running
//! on.

use std::{fmt, ptr::NonNull, sync::OnceLock};

/// The OS declined to satisfy a mapping request.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MapError(pub i64);

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OS mapping request failed (code {})", self.0)
    }
}

impl std::error::Error for MapError {}

trait PlatformMemory {
    unsafe fn request_memory(len: usize) -> Result<NonNull<u8>, MapError>;
    unsafe fn return_memory(addr: NonNull<u8>, len: usize);
    fn page_size() -> usize;
}

enum Os {}

static PAGE_SIZE: OnceLock<usize> = OnceLock::new();

/// The system's virtual memory page size, queried once and cached.
#[inline]
pub(crate) fn page_size() -> usize {
    *PAGE_SIZE.get_or_init(Os::page_size)
}

/// Requests an anonymous read/write private mapping of exactly `len` bytes.
/// `len` must already be a multiple of [`page_size`].
///
/// **SAFETY**: `len` must be nonzero.
#[inline]
pub(crate) unsafe fn request_memory(len: usize) -> Result<NonNull<u8>, MapError> {
    unsafe { Os::request_memory(len) }
}

/// Returns a previously mapped `len`-byte region starting at `addr` to the
/// OS.
///
/// **SAFETY**: `addr`/`len` must describe a region previously obtained from
/// [`request_memory`] in its entirety — partial unmaps are undefined.
#[inline]
pub(crate) unsafe fn return_memory(addr: NonNull<u8>, len: usize) {
    unsafe { Os::return_memory(addr, len) }
}

#[cfg(unix)]
mod unix {
    use super::{MapError, Os, PlatformMemory};
    use libc::{off_t, size_t};
    use std::{
        os::raw::{c_int, c_void},
        ptr::NonNull,
    };

    impl PlatformMemory for Os {
        unsafe fn request_memory(len: usize) -> Result<NonNull<u8>, MapError> {
            const ADDR: *mut c_void = std::ptr::null_mut::<c_void>();
            const PROT: c_int = libc::PROT_READ | libc::PROT_WRITE;
            const FLAGS: c_int = libc::MAP_PRIVATE | libc::MAP_ANONYMOUS;
            const FD: c_int = -1;
            const OFFSET: off_t = 0;

            unsafe {
                let addr = libc::mmap(ADDR, len as size_t, PROT, FLAGS, FD, OFFSET);

                if addr == libc::MAP_FAILED {
                    Err(MapError(*libc::__errno_location() as i64))
                } else {
                    Ok(NonNull::new_unchecked(addr).cast::<u8>())
                }
            }
        }

        unsafe fn return_memory(addr: NonNull<u8>, len: usize) {
            unsafe {
                libc::munmap(addr.as_ptr() as *mut c_void, len as size_t);
            }
        }

        fn page_size() -> usize {
            unsafe { libc::sysconf(libc::_SC_PAGE_SIZE) as usize }
        }
    }
}

#[cfg(windows)]
mod windows_backend {
    use super::{MapError, Os, PlatformMemory};
    use std::{mem::MaybeUninit, os::raw::c_void, ptr::NonNull};
    use windows::Win32::System::{Diagnostics::Debug::GetLastError, Memory, SystemInformation};

    impl PlatformMemory for Os {
        unsafe fn request_memory(len: usize) -> Result<NonNull<u8>, MapError> {
            let protection = Memory::PAGE_READWRITE;
            let flags = Memory::MEM_RESERVE | Memory::MEM_COMMIT;

            unsafe {
                let addr = Memory::VirtualAlloc(None, len, flags, protection);

                match NonNull::new(addr.cast()) {
                    Some(addr) => Ok(addr),
                    None => Err(MapError(GetLastError().0 as i64)),
                }
            }
        }

        unsafe fn return_memory(addr: NonNull<u8>, _len: usize) {
            unsafe {
                let _ = Memory::VirtualFree(addr.as_ptr() as *mut c_void, 0, Memory::MEM_RELEASE);
            }
        }

        fn page_size() -> usize {
            unsafe {
                let mut system_info = MaybeUninit::uninit();
                SystemInformation::GetSystemInfo(system_info.as_mut_ptr());

                system_info.assume_init().dwPageSize as usize
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_is_a_sane_power_of_two() {
        let size = page_size();
        assert!(size >= 4096);
        assert!(size.is_power_of_two());
    }

    #[test]
    fn request_and_return_memory_round_trips() {
        let size = page_size();
        unsafe {
            let addr = request_memory(size).expect("mapping should succeed");
            addr.as_ptr().write_bytes(0x11, size);
            return_memory(addr, size);
        }
    }
}
