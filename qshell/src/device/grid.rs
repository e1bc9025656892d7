//! Fixed-shape grid launcher
//!
//! A launch runs `block_num` groups in parallel. Group `b` owns a contiguous
//! slice of output rows and nobody else writes them. For each of its rows,
//! `block_size` lanes sweep the work items with a stride of `block_size`,
//! each accumulating into its own scratch slot, and a tree reduction over
//! the scratch combines the lanes before the row is written.

use core::ops::AddAssign;

use rayon::prelude::*;

/// Launch shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    pub block_num: usize,
    pub block_size: usize,
}

impl Grid {
    /// Create a grid, clamping both dimensions to at least one
    pub fn new(block_num: usize, block_size: usize) -> Self {
        Self {
            block_num: block_num.max(1),
            block_size: block_size.max(1),
        }
    }

    /// Rows owned by each group for `rows` output rows
    pub fn rows_per_block(&self, rows: usize) -> usize {
        rows.div_ceil(self.block_num).max(1)
    }

    /// `out[row] += sum over item in 0..items of work(row, item)`
    pub fn launch_rows<T, F>(&self, out: &mut [T], items: usize, work: F)
    where
        T: Copy + Default + AddAssign + Send,
        F: Fn(usize, usize) -> T + Sync,
    {
        let chunk = self.rows_per_block(out.len());
        let block_size = self.block_size;
        out.par_chunks_mut(chunk)
            .enumerate()
            .for_each(|(block, rows)| {
                let mut scratch = vec![T::default(); block_size];
                for (k, slot) in rows.iter_mut().enumerate() {
                    let row = block * chunk + k;
                    sweep_lanes(&mut scratch, items, |item| work(row, item));
                    *slot += tree_reduce(&mut scratch);
                }
            });
    }

    /// `maxs[block] = max over the group's rows of sum over item of work(row, item)`
    ///
    /// Groups past the last row write zero.
    pub fn launch_block_max<F>(&self, maxs: &mut [f64], rows: usize, items: usize, work: F)
    where
        F: Fn(usize, usize) -> f64 + Sync,
    {
        let chunk = self.rows_per_block(rows);
        let block_size = self.block_size;
        maxs.par_iter_mut().enumerate().for_each(|(block, slot)| {
            let mut scratch = vec![0.0; block_size];
            let start = (block * chunk).min(rows);
            let end = (start + chunk).min(rows);
            *slot = (start..end)
                .map(|row| {
                    sweep_lanes(&mut scratch, items, |item| work(row, item));
                    tree_reduce(&mut scratch)
                })
                .fold(0.0, f64::max);
        });
    }
}

fn sweep_lanes<T, F>(scratch: &mut [T], items: usize, work: F)
where
    T: Copy + Default + AddAssign,
    F: Fn(usize) -> T,
{
    let stride = scratch.len();
    for (lane, acc) in scratch.iter_mut().enumerate() {
        *acc = T::default();
        for item in (lane..items).step_by(stride) {
            *acc += work(item);
        }
    }
}

fn tree_reduce<T: Copy + Default + AddAssign>(scratch: &mut [T]) -> T {
    let mut width = scratch.len();
    while width > 1 {
        let half = width.div_ceil(2);
        for i in 0..width - half {
            let upper = scratch[i + half];
            scratch[i] += upper;
        }
        width = half;
    }
    scratch.first().copied().unwrap_or_default()
}
