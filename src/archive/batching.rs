//! Batch planning: partition an ordered sequence into contiguous groups

use std::ops::Range;

/// Partition `len` items into consecutive groups of at most `batch_size`
///
/// Groups are contiguous, preserve input order, never overlap, and their
/// sizes sum to `len`. The last group holds the remainder. When
/// `batch_size` is `None`, zero, or at least `len`, the plan is a single
/// full-range group (no batching).
pub fn plan_batches(len: usize, batch_size: Option<usize>) -> Vec<Range<usize>> {
    match batch_size {
        Some(size) if size >= 1 && size < len => {
            let mut groups = Vec::with_capacity(len.div_ceil(size));
            let mut start = 0;
            while start < len {
                let end = (start + size).min(len);
                groups.push(start..end);
                start = end;
            }
            groups
        }
        _ => vec![0..len],
    }
}
