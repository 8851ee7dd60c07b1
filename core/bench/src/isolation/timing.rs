use super::{single_core_affinity, single_thread_env, IsolationError};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use strum_macros::Display;
use tracing::warn;

/// Isolation that was actually in force while a call was timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExecutionMode {
    /// Thread caps and pinned to one CPU.
    SingleCore,
    /// Thread caps only, pinning failed.
    SingleThread,
    /// No isolation.
    MultiCore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timing {
    pub elapsed: Duration,
    pub mode: ExecutionMode,
}

/// Run `f` under the thread caps and pinned to `cpu_id`, timing only the call itself.
pub fn time_single_core<T, F>(cpu_id: usize, f: F) -> Result<(T, Duration), IsolationError>
where
    F: FnOnce() -> T,
{
    let _threads = single_thread_env();
    let _affinity = single_core_affinity(cpu_id)?;
    Ok(timed(f))
}

/// Run `f` without any isolation.
pub fn time_multi_core<T, F>(f: F) -> (T, Duration)
where
    F: FnOnce() -> T,
{
    timed(f)
}

/// Like [`time_single_core`] but falls back to the thread caps alone when the thread cannot
/// be pinned.
pub fn time_single_core_best_effort<T, F>(cpu_id: usize, f: F) -> (T, Timing)
where
    F: FnOnce() -> T,
{
    let _threads = single_thread_env();
    let (out, elapsed, mode) = match single_core_affinity(cpu_id) {
        Ok(_affinity) => {
            let (out, elapsed) = timed(f);
            (out, elapsed, ExecutionMode::SingleCore)
        }
        Err(e) => {
            warn!("cannot pin to cpu {cpu_id}, timing single-threaded only: {e}");
            let (out, elapsed) = timed(f);
            (out, elapsed, ExecutionMode::SingleThread)
        }
    };
    (out, Timing { elapsed, mode })
}

fn timed<T>(f: impl FnOnce() -> T) -> (T, Duration) {
    let start = Instant::now();
    let out = f();
    (out, start.elapsed())
}
