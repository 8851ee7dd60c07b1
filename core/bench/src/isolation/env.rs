use std::ffi::OsString;

/// Environment variables read by the thread pools of the usual numeric runtimes.
pub const THREAD_CAP_VARS: [&str; 7] = [
    "RAYON_NUM_THREADS",
    "OMP_NUM_THREADS",
    "OPENBLAS_NUM_THREADS",
    "MKL_NUM_THREADS",
    "NUMEXPR_NUM_THREADS",
    "BLIS_NUM_THREADS",
    "VECLIB_MAXIMUM_THREADS",
];

/// Caps every variable of [`THREAD_CAP_VARS`] to `1` for as long as the guard lives.
///
/// The previous value of each variable, or its absence, is restored on drop. Guards nest:
/// dropping the inner one brings back the values the outer one installed.
///
/// Pools that already started (a global rayon pool for instance) keep their size, so the
/// guard has to be entered before the first parallel call to have an effect on them.
#[must_use = "the thread cap is lifted as soon as the guard is dropped"]
#[derive(Debug)]
pub struct ThreadCapGuard {
    saved: Vec<(&'static str, Option<OsString>)>,
}

impl ThreadCapGuard {
    fn enter() -> Self {
        let saved = THREAD_CAP_VARS
            .iter()
            .map(|&name| {
                let previous = std::env::var_os(name);
                std::env::set_var(name, "1");
                (name, previous)
            })
            .collect();
        Self { saved }
    }
}

impl Drop for ThreadCapGuard {
    fn drop(&mut self) {
        for (name, previous) in self.saved.drain(..) {
            match previous {
                Some(value) => std::env::set_var(name, value),
                None => std::env::remove_var(name),
            }
        }
    }
}

pub fn single_thread_env() -> ThreadCapGuard {
    ThreadCapGuard::enter()
}
