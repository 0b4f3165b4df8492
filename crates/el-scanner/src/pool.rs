//! Fixed-size worker pool shared by the processor and the modifier.

use std::num::NonZeroUsize;
use std::thread;

use camino::{Utf8Path, Utf8PathBuf};
use el_core::Diagnostics;
use rayon::prelude::*;
use tokio_util::sync::CancellationToken;

/// Resolves a requested worker count; `0` means one per available core.
pub(crate) fn resolve_workers(requested: usize) -> usize {
    if requested == 0 {
        thread::available_parallelism().map_or(1, NonZeroUsize::get)
    } else {
        requested
    }
}

/// Runs `work` once per path and returns exactly one result per path.
///
/// The token is checked before each file is dispatched. Once it is cancelled,
/// every remaining path is answered by `cancelled` instead of `work`; a file
/// already being worked on runs to completion. Result order follows `paths`.
pub(crate) fn run<T, W, C>(
    paths: &[Utf8PathBuf],
    workers: usize,
    cancel: &CancellationToken,
    diagnostics: &dyn Diagnostics,
    work: W,
    cancelled: C,
) -> Vec<T>
where
    T: Send,
    W: Fn(&Utf8Path) -> T + Sync,
    C: Fn(&Utf8Path) -> T + Sync,
{
    let dispatch = |path: &Utf8PathBuf| {
        if cancel.is_cancelled() {
            cancelled(path)
        } else {
            work(path)
        }
    };

    let workers = resolve_workers(workers);
    if workers <= 1 || paths.len() <= 1 {
        return paths.iter().map(dispatch).collect();
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("emoji-lint-{i}"))
        .build();

    match pool {
        Ok(pool) => {
            diagnostics.debug(
                &format!("dispatching {} files to {workers} workers", paths.len()),
                None,
            );
            pool.install(|| paths.par_iter().map(dispatch).collect())
        }
        Err(e) => {
            diagnostics.warn(
                &format!("failed to build worker pool, running sequentially: {e}"),
                None,
            );
            paths.iter().map(dispatch).collect()
        }
    }
}
