//! Statistics snapshot publication.
//!
//! An external viewer process reads the per-privilege statistics while the
//! simulation runs. The simulation thread copies the whole [`StatsTable`] into
//! a shared region at a fixed clock interval; the reader takes no lock and may
//! observe a snapshot up to one interval old.
//!
//! [`ShmPublisher`] is the POSIX shared-memory transport. Other transports plug
//! in through [`SnapshotPublisher`].

use std::ffi::CString;
use std::io;
use std::mem::size_of;
use std::ptr::{self, NonNull};

use crate::common::constants::{NUM_PRIV_LEVELS, STATS_SHM_PERMS};
use crate::common::error::{SimError, SimResult};
use crate::stats::{SimStats, StatsTable};

/// Size in bytes of the shared region: one record per privilege level.
pub const SNAPSHOT_BYTES: usize = NUM_PRIV_LEVELS * size_of::<SimStats>();

/// Sink for periodic statistics snapshots.
pub trait SnapshotPublisher {
    /// Makes `stats` visible to the consumer.
    fn publish(&mut self, stats: &StatsTable);
}

/// Publishes snapshots into a POSIX shared-memory object.
#[derive(Debug)]
pub struct ShmPublisher {
    name: String,
    ptr: NonNull<u8>,
}

// SAFETY: the mapping is owned exclusively by this value and only written
// through `&mut self`.
unsafe impl Send for ShmPublisher {}

impl ShmPublisher {
    /// Opens (creating if needed) the object `name`, sizes it to
    /// [`SNAPSHOT_BYTES`], maps it, and zeroes it.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::StatsRegion`] naming the failing step.
    pub fn create(name: &str) -> SimResult<Self> {
        let region_err = |op: &'static str, source: io::Error| SimError::StatsRegion {
            op,
            name: name.to_string(),
            source,
        };

        let c_name = CString::new(name)
            .map_err(|e| region_err("create", io::Error::new(io::ErrorKind::InvalidInput, e)))?;

        // SAFETY: `c_name` is a valid NUL-terminated string.
        let fd = unsafe {
            libc::shm_open(
                c_name.as_ptr(),
                libc::O_RDWR | libc::O_CREAT,
                STATS_SHM_PERMS as libc::c_uint,
            )
        };
        if fd < 0 {
            return Err(region_err("create", io::Error::last_os_error()));
        }

        // SAFETY: `fd` is an open shared-memory descriptor.
        if unsafe { libc::ftruncate(fd, SNAPSHOT_BYTES as libc::off_t) } < 0 {
            let err = io::Error::last_os_error();
            // SAFETY: `fd` is open and not used afterwards.
            let _ = unsafe { libc::close(fd) };
            return Err(region_err("resize", err));
        }

        // SAFETY: mapping a descriptor sized above; the kernel chooses the address.
        let addr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                SNAPSHOT_BYTES,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                fd,
                0,
            )
        };
        let map_err = io::Error::last_os_error();
        // SAFETY: the mapping keeps the object alive; the descriptor is no longer needed.
        let _ = unsafe { libc::close(fd) };
        if addr == libc::MAP_FAILED {
            return Err(region_err("map", map_err));
        }
        let Some(ptr) = NonNull::new(addr.cast::<u8>()) else {
            return Err(region_err("map", map_err));
        };

        // SAFETY: `ptr` points at `SNAPSHOT_BYTES` writable bytes.
        unsafe { ptr::write_bytes(ptr.as_ptr(), 0, SNAPSHOT_BYTES) };

        tracing::debug!(name, bytes = SNAPSHOT_BYTES, "stats-display region mapped");
        Ok(Self {
            name: name.to_string(),
            ptr,
        })
    }

    /// Name of the shared-memory object.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reads the region back as the consumer would see it.
    pub fn read_back(&self) -> [SimStats; NUM_PRIV_LEVELS] {
        // SAFETY: the region holds `SNAPSHOT_BYTES` bytes laid out as
        // `[SimStats; NUM_PRIV_LEVELS]`; every bit pattern is a valid `u64`.
        unsafe { ptr::read_unaligned(self.ptr.as_ptr().cast::<[SimStats; NUM_PRIV_LEVELS]>()) }
    }

    /// Unmaps the region and removes the shared-memory object.
    pub fn remove(self) {
        if let Ok(c_name) = CString::new(self.name.as_str()) {
            // SAFETY: `c_name` is a valid NUL-terminated string.
            let _ = unsafe { libc::shm_unlink(c_name.as_ptr()) };
        }
    }
}

impl SnapshotPublisher for ShmPublisher {
    fn publish(&mut self, stats: &StatsTable) {
        let levels = stats.levels();
        // SAFETY: `levels` is exactly `SNAPSHOT_BYTES` long and `SimStats` is
        // `#[repr(C)]`; the destination mapping has the same size.
        unsafe {
            ptr::copy_nonoverlapping(levels.as_ptr().cast::<u8>(), self.ptr.as_ptr(), SNAPSHOT_BYTES);
        }
    }
}

impl Drop for ShmPublisher {
    fn drop(&mut self) {
        // SAFETY: `ptr` was returned by `mmap` with length `SNAPSHOT_BYTES`.
        let _ = unsafe { libc::munmap(self.ptr.as_ptr().cast::<libc::c_void>(), SNAPSHOT_BYTES) };
    }
}
