//! Scoped control over the process state that makes encrypted-circuit timings noisy.
//!
//! Both scopes are RAII guards: whatever way the guarded code exits (return, `?`, panic),
//! the thread-count variables and the affinity mask are put back when the guard drops.

use thiserror::Error;

mod affinity;
mod env;
mod timing;

pub use affinity::{current_affinity, single_core_affinity, AffinityGuard};
pub use env::{single_thread_env, ThreadCapGuard, THREAD_CAP_VARS};
pub use timing::{
    time_multi_core, time_single_core, time_single_core_best_effort, ExecutionMode, Timing,
};

#[derive(Error, Debug)]
pub enum IsolationError {
    #[error("cpu affinity is not supported on this platform")]
    AffinityUnsupported,
    #[error("cpu {cpu_id} is outside the affinity mask (max {max})")]
    CpuOutOfRange { cpu_id: usize, max: usize },
    #[error("failed to read the cpu affinity of the current thread")]
    ReadAffinity(#[source] std::io::Error),
    #[error("failed to pin the current thread to cpu {cpu_id}")]
    SetAffinity {
        cpu_id: usize,
        #[source]
        source: std::io::Error,
    },
}
