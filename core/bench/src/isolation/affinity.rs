use super::IsolationError;
use tracing::{debug, warn};

/// Pins the calling thread to a single CPU for as long as the guard lives.
///
/// The affinity set found on entry is put back on drop. A failed restore cannot be reported
/// from `Drop`, it is logged and otherwise ignored.
#[must_use = "the thread is unpinned as soon as the guard is dropped"]
#[derive(Debug)]
pub struct AffinityGuard {
    cpu_id: usize,
    previous: Vec<usize>,
}

impl AffinityGuard {
    pub fn cpu_id(&self) -> usize {
        self.cpu_id
    }

    /// CPUs the thread was allowed to run on before the guard was entered.
    pub fn previous(&self) -> &[usize] {
        &self.previous
    }
}

impl Drop for AffinityGuard {
    fn drop(&mut self) {
        match sys::set_affinity(&self.previous) {
            Ok(()) => debug!(cpus = ?self.previous, "restored cpu affinity"),
            Err(e) => warn!(
                "failed to restore cpu affinity {:?} after pinning to cpu {}: {e}",
                self.previous, self.cpu_id
            ),
        }
    }
}

/// Restrict the calling thread to `{cpu_id}`.
pub fn single_core_affinity(cpu_id: usize) -> Result<AffinityGuard, IsolationError> {
    let previous = sys::get_affinity()?;
    sys::pin(cpu_id)?;
    debug!(cpu_id, "pinned thread");
    Ok(AffinityGuard { cpu_id, previous })
}

/// CPUs the calling thread may currently run on, in ascending order.
pub fn current_affinity() -> Result<Vec<usize>, IsolationError> {
    sys::get_affinity()
}

#[cfg(target_os = "linux")]
mod sys {
    use super::IsolationError;
    use nix::sched::{sched_getaffinity, sched_setaffinity, CpuSet};
    use nix::unistd::Pid;
    use std::io;

    // pid 0 addresses the calling thread
    fn this_thread() -> Pid {
        Pid::from_raw(0)
    }

    pub(super) fn get_affinity() -> Result<Vec<usize>, IsolationError> {
        let set = sched_getaffinity(this_thread())
            .map_err(|e| IsolationError::ReadAffinity(io::Error::from(e)))?;
        Ok((0..CpuSet::count())
            .filter(|&cpu| set.is_set(cpu).unwrap_or(false))
            .collect())
    }

    pub(super) fn pin(cpu_id: usize) -> Result<(), IsolationError> {
        if cpu_id >= CpuSet::count() {
            return Err(IsolationError::CpuOutOfRange {
                cpu_id,
                max: CpuSet::count() - 1,
            });
        }
        set(&[cpu_id]).map_err(|source| IsolationError::SetAffinity { cpu_id, source })
    }

    pub(super) fn set_affinity(cpus: &[usize]) -> Result<(), io::Error> {
        set(cpus)
    }

    fn set(cpus: &[usize]) -> Result<(), io::Error> {
        let mut set = CpuSet::new();
        for &cpu in cpus {
            set.set(cpu)?;
        }
        sched_setaffinity(this_thread(), &set)?;
        Ok(())
    }
}

#[cfg(not(target_os = "linux"))]
mod sys {
    use super::IsolationError;
    use std::io;

    pub(super) fn get_affinity() -> Result<Vec<usize>, IsolationError> {
        Err(IsolationError::AffinityUnsupported)
    }

    pub(super) fn pin(_cpu_id: usize) -> Result<(), IsolationError> {
        Err(IsolationError::AffinityUnsupported)
    }

    pub(super) fn set_affinity(_cpus: &[usize]) -> Result<(), io::Error> {
        Err(io::Error::from(io::ErrorKind::Unsupported))
    }
}
