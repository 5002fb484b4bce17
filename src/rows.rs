//! Row fan-out shared by every per-pixel stage.
//!
//! Rows are written to disjoint destination memory, so they run in parallel
//! when the `parallel` feature is enabled and sequentially otherwise.

use crate::error::Result;

/// Run `f` over each `row_len`-byte row of `data`.
///
/// `f` receives the row index (relative to the start of `data`) and the
/// mutable row. Every row runs to completion even when another one fails;
/// the error of the lowest failing row is returned after all rows settle.
pub(crate) fn for_each_row<F>(data: &mut [u8], row_len: usize, f: F) -> Result<()>
where
    F: Fn(u32, &mut [u8]) -> Result<()> + Send + Sync,
{
    if row_len == 0 || data.is_empty() {
        return Ok(());
    }

    // Row counts come from u32 heights.
    #[allow(clippy::cast_possible_truncation)]
    let run = |(y, row): (usize, &mut [u8])| f(y as u32, row);

    #[cfg(feature = "parallel")]
    let outcomes: Vec<Result<()>> = {
        use rayon::prelude::*;
        data.par_chunks_mut(row_len).enumerate().map(run).collect()
    };

    #[cfg(not(feature = "parallel"))]
    let outcomes: Vec<Result<()>> = data.chunks_mut(row_len).enumerate().map(run).collect();

    outcomes.into_iter().collect()
}

/// Run two independent stages, concurrently when the `parallel` feature is enabled.
pub(crate) fn join<A, B, RA, RB>(a: A, b: B) -> (RA, RB)
where
    A: FnOnce() -> RA + Send,
    B: FnOnce() -> RB + Send,
    RA: Send,
    RB: Send,
{
    #[cfg(feature = "parallel")]
    {
        rayon::join(a, b)
    }

    #[cfg(not(feature = "parallel"))]
    {
        (a(), b())
    }
}
