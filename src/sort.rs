//! Bulk sorts over large arrays with extracted integer keys.
//!
//! Both sorts order the array by a comparator, using an extracted unsigned
//! key for bucketing; the key must be the primary component of the
//! comparator. When the key bound is known, the elements are distributed into
//! buckets in `O(n + range)` time with `O(range)` auxiliary memory and each
//! bucket is finished with a comparison sort; with an unknown bound
//! ([`usize::MAX`]) the whole range falls back to a comparison sort.
//!
//! The parallel variants partition the key space into contiguous bucket
//! ranges and let every worker fill and sort its own output range, so the
//! distribution phase needs no synchronisation between workers.

use rayon::prelude::*;

use std::cmp::Ordering;
use std::ops::Range;


//-----------------------------------------------------------------------------

// Arrays shorter than this are cheaper to sort directly.
const DIRECT_SORT: usize = 1024;

// Upper limit for the number of buckets.
const MAX_BUCKETS: usize = 1 << 16;

// Maps keys in `0..=bound` to `len` buckets so that the mapping is monotone.
#[derive(Copy, Clone, Debug)]
struct BucketMap {
    divisor: usize,
    len: usize,
}

impl BucketMap {
    fn new(n: usize, key_bound: usize) -> Self {
        let range = key_bound.saturating_add(1);
        let len = range.min(MAX_BUCKETS).min(n.next_power_of_two()).max(1);
        let divisor = range.div_ceil(len).max(1);
        BucketMap {
            divisor: divisor,
            len: len,
        }
    }

    #[inline]
    fn get(&self, key: usize) -> usize {
        (key / self.divisor).min(self.len - 1)
    }
}

//-----------------------------------------------------------------------------

/// Sorts the array in place.
///
/// # Arguments
///
/// * `data`: The array to sort.
/// * `key`: Key extractor for bucketing; the extracted key must be the
///   primary component of `cmp`.
/// * `cmp`: The order to establish.
/// * `key_bound`: Inclusive upper bound for the extracted keys, or
///   [`usize::MAX`] if no useful bound is known.
/// * `threads`: Number of worker threads.
///
/// # Examples
///
/// ```
/// use gcsa::sort::bin_sort_in_place;
///
/// let mut values = vec![(3, 'c'), (1, 'b'), (3, 'a'), (0, 'd')];
/// bin_sort_in_place(&mut values, |v| v.0, |a, b| a.cmp(b), 3, 1);
/// assert_eq!(values, vec![(0, 'd'), (1, 'b'), (3, 'a'), (3, 'c')]);
/// ```
pub fn bin_sort_in_place<T, K, C>(data: &mut [T], key: K, cmp: C, key_bound: usize, threads: usize)
where
    T: Copy + Send + Sync,
    K: Fn(&T) -> usize + Sync,
    C: Fn(&T, &T) -> Ordering + Sync,
{
    if data.len() < DIRECT_SORT || key_bound == usize::MAX {
        comparison_sort(data, &cmp, threads);
        return;
    }

    let map = BucketMap::new(data.len(), key_bound);
    let counts = count_buckets(data, &key, map, threads);
    let starts = bucket_starts(&counts);

    // Permute into bucket order. An element at the head of bucket `b` that
    // belongs to bucket `k > b` is swapped to the next free slot of `k`;
    // every swap finalizes one element, and buckets below `b` are already
    // complete, so the head element can never belong to an earlier bucket.
    let mut heads = starts.clone();
    for b in 0..map.len {
        while heads[b] < starts[b + 1] {
            let k = map.get(key(&data[heads[b]]));
            if k == b {
                heads[b] += 1;
            } else {
                let dest = heads[k];
                data.swap(heads[b], dest);
                heads[k] += 1;
            }
        }
    }

    sort_bucket_slices(data, &starts, &cmp, threads);
}

/// Sorts `src` into `dst`, leaving `src` untouched.
///
/// The two slices must have the same length. See [`bin_sort_in_place`] for
/// the arguments and the sorting contract.
///
/// # Panics
///
/// Panics if `src.len() != dst.len()`.
pub fn bin_sort_copy<T, K, C>(src: &[T], dst: &mut [T], key: K, cmp: C, key_bound: usize, threads: usize)
where
    T: Copy + Send + Sync,
    K: Fn(&T) -> usize + Sync,
    C: Fn(&T, &T) -> Ordering + Sync,
{
    assert_eq!(src.len(), dst.len(), "bin_sort_copy: source and destination lengths differ");
    if src.len() < DIRECT_SORT || key_bound == usize::MAX {
        dst.copy_from_slice(src);
        comparison_sort(dst, &cmp, threads);
        return;
    }

    let map = BucketMap::new(src.len(), key_bound);
    let counts = count_buckets(src, &key, map, threads);
    let starts = bucket_starts(&counts);

    // Every worker owns a contiguous range of buckets and scans the whole
    // source for the elements that fall into them.
    let ranges = partition_buckets(&counts, threads);
    let mut slices: Vec<(Range<usize>, &mut [T])> = Vec::with_capacity(ranges.len());
    let mut rest = dst;
    for range in ranges {
        let len = starts[range.end] - starts[range.start];
        let (slice, tail) = rest.split_at_mut(len);
        slices.push((range, slice));
        rest = tail;
    }

    slices.into_par_iter().for_each(|(range, slice)| {
        let base = starts[range.start];
        let mut cursors: Vec<usize> = starts[range.start..range.end].iter().map(|x| x - base).collect();
        for element in src.iter() {
            let k = map.get(key(element));
            if range.contains(&k) {
                slice[cursors[k - range.start]] = *element;
                cursors[k - range.start] += 1;
            }
        }
        for b in range.clone() {
            slice[(starts[b] - base)..(starts[b + 1] - base)].sort_unstable_by(|x, y| cmp(x, y));
        }
    });
}

//-----------------------------------------------------------------------------

fn comparison_sort<T, C>(data: &mut [T], cmp: &C, threads: usize)
where
    T: Copy + Send + Sync,
    C: Fn(&T, &T) -> Ordering + Sync,
{
    if threads > 1 && data.len() >= DIRECT_SORT {
        data.par_sort_unstable_by(|a, b| cmp(a, b));
    } else {
        data.sort_unstable_by(|a, b| cmp(a, b));
    }
}

fn count_buckets<T, K>(data: &[T], key: &K, map: BucketMap, threads: usize) -> Vec<usize>
where
    T: Copy + Send + Sync,
    K: Fn(&T) -> usize + Sync,
{
    if threads > 1 {
        data.par_chunks(data.len().div_ceil(threads))
            .map(|chunk| {
                let mut counts = vec![0; map.len];
                for element in chunk {
                    counts[map.get(key(element))] += 1;
                }
                counts
            })
            .reduce(
                || vec![0; map.len],
                |mut left, right| {
                    for (l, r) in left.iter_mut().zip(right) {
                        *l += r;
                    }
                    left
                },
            )
    } else {
        let mut counts = vec![0; map.len];
        for element in data {
            counts[map.get(key(element))] += 1;
        }
        counts
    }
}

// Exclusive prefix sums with the total appended.
fn bucket_starts(counts: &[usize]) -> Vec<usize> {
    let mut starts = Vec::with_capacity(counts.len() + 1);
    let mut total = 0;
    for count in counts {
        starts.push(total);
        total += count;
    }
    starts.push(total);
    starts
}

// Splits the buckets into at most `threads` contiguous ranges with roughly
// equal element counts.
fn partition_buckets(counts: &[usize], threads: usize) -> Vec<Range<usize>> {
    let threads = threads.max(1);
    let total: usize = counts.iter().sum();
    let target = total.div_ceil(threads).max(1);

    let mut ranges = Vec::with_capacity(threads);
    let mut start = 0;
    let mut in_range = 0;
    for (b, count) in counts.iter().enumerate() {
        in_range += count;
        if in_range >= target && ranges.len() + 1 < threads {
            ranges.push(start..b + 1);
            start = b + 1;
            in_range = 0;
        }
    }
    ranges.push(start..counts.len());
    ranges
}

fn sort_bucket_slices<T, C>(data: &mut [T], starts: &[usize], cmp: &C, threads: usize)
where
    T: Copy + Send + Sync,
    C: Fn(&T, &T) -> Ordering + Sync,
{
    let mut slices: Vec<&mut [T]> = Vec::with_capacity(starts.len() - 1);
    let mut rest = data;
    for b in 0..starts.len() - 1 {
        let (slice, tail) = rest.split_at_mut(starts[b + 1] - starts[b]);
        slices.push(slice);
        rest = tail;
    }
    if threads > 1 {
        slices.into_par_iter().for_each(|slice| slice.sort_unstable_by(|a, b| cmp(a, b)));
    } else {
        for slice in slices {
            slice.sort_unstable_by(|a, b| cmp(a, b));
        }
    }
}

//-----------------------------------------------------------------------------
