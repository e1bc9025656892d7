//! Collective communication between cooperating workers
//!
//! Every worker owns a contiguous row range of each distributed vector.
//! The only collectives the engines need are an all-gather of a vector
//! into a replicated buffer and scalar all-reductions. All methods are
//! collective: every worker of the group must call them in the same order.

use std::sync::{Arc, Barrier, Mutex};

use num_complex::Complex64;
use qshell_core::{QshellError, Result};

/// Collective operations over a fixed group of workers
pub trait Communicator: Sync {
    /// Index of this worker in `0..size()`
    fn rank(&self) -> usize;

    /// Number of workers in the group
    fn size(&self) -> usize;

    /// Concatenate every worker's `local` slice in rank order into `global`
    ///
    /// `global.len()` must equal the sum of all local lengths.
    fn all_gather(&self, local: &[Complex64], global: &mut [Complex64]) -> Result<()>;

    /// Maximum of `value` over all workers
    fn all_reduce_max(&self, value: f64) -> Result<f64>;

    /// Sum of `value` over all workers
    fn all_reduce_sum(&self, value: Complex64) -> Result<Complex64>;

    /// Logical or of `flag` over all workers
    fn all_reduce_or(&self, flag: bool) -> Result<bool> {
        let any = self.all_reduce_max(if flag { 1.0 } else { 0.0 })?;
        Ok(any > 0.5)
    }
}

/// Communicator for a single worker that owns every row
#[derive(Debug, Clone, Copy, Default)]
pub struct SelfComm;

impl Communicator for SelfComm {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn all_gather(&self, local: &[Complex64], global: &mut [Complex64]) -> Result<()> {
        if local.len() != global.len() {
            return Err(QshellError::CommunicationFailed);
        }
        global.copy_from_slice(local);
        Ok(())
    }

    fn all_reduce_max(&self, value: f64) -> Result<f64> {
        Ok(value)
    }

    fn all_reduce_sum(&self, value: Complex64) -> Result<Complex64> {
        Ok(value)
    }
}

struct Shared {
    barrier: Barrier,
    slots: Mutex<Vec<Vec<Complex64>>>,
}

/// One member of a group of workers running on separate threads of this process
///
/// Created in sets by [`ThreadComm::group`]; each member is moved to its own
/// thread. Exchanges go through a shared slot table fenced by a barrier.
pub struct ThreadComm {
    rank: usize,
    size: usize,
    shared: Arc<Shared>,
}

impl ThreadComm {
    /// Create `size` connected communicators, one per worker
    pub fn group(size: usize) -> Vec<ThreadComm> {
        let size = size.max(1);
        let shared = Arc::new(Shared {
            barrier: Barrier::new(size),
            slots: Mutex::new(vec![Vec::new(); size]),
        });
        (0..size)
            .map(|rank| ThreadComm {
                rank,
                size,
                shared: Arc::clone(&shared),
            })
            .collect()
    }

    /// Publish `local`, wait for every worker, and fold over all published slots
    ///
    /// A second barrier keeps any worker from republishing before all
    /// workers have read the current round. Both barriers are reached even
    /// when the slot table is poisoned, so a failure on one worker is
    /// reported on every worker instead of leaving the others blocked.
    fn exchange<T, F>(&self, local: &[Complex64], fold: F) -> Result<T>
    where
        F: FnOnce(&[Vec<Complex64>]) -> T,
    {
        let published = self
            .shared
            .slots
            .lock()
            .map(|mut slots| {
                slots[self.rank].clear();
                slots[self.rank].extend_from_slice(local);
            })
            .map_err(|_| QshellError::CommunicationFailed);
        self.shared.barrier.wait();

        let result = published.and_then(|()| {
            self.shared
                .slots
                .lock()
                .map(|slots| fold(&slots))
                .map_err(|_| QshellError::CommunicationFailed)
        });

        self.shared.barrier.wait();
        result
    }
}

impl Communicator for ThreadComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn all_gather(&self, local: &[Complex64], global: &mut [Complex64]) -> Result<()> {
        self.exchange(local, |slots| {
            let total: usize = slots.iter().map(Vec::len).sum();
            if total != global.len() {
                return Err(QshellError::CommunicationFailed);
            }
            let mut offset = 0;
            for slot in slots {
                global[offset..offset + slot.len()].copy_from_slice(slot);
                offset += slot.len();
            }
            Ok(())
        })?
    }

    fn all_reduce_max(&self, value: f64) -> Result<f64> {
        self.exchange(&[Complex64::new(value, 0.0)], |slots| {
            slots
                .iter()
                .filter_map(|s| s.first())
                .map(|c| c.re)
                .fold(f64::NEG_INFINITY, f64::max)
        })
    }

    fn all_reduce_sum(&self, value: Complex64) -> Result<Complex64> {
        self.exchange(&[value], |slots| {
            slots.iter().filter_map(|s| s.first()).copied().sum()
        })
    }
}
