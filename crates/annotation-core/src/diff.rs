//! Content differencing.
//!
//! [`ContentDiffer`] is the seam the maintainer uses to learn what changed between two
//! renderings of a document. [`MyersDiffer`] is the default implementation: a character-level
//! Myers O(ND) diff, split at the middle snake so that memory stays linear. Adjacent
//! delete/insert runs are merged into replacement [`EditDelta`]s expressed in offsets of the
//! previous text.

use crate::delta::EditDelta;
use thiserror::Error;

/// Errors produced while computing a diff.
#[derive(Debug, Error)]
pub enum DiffError {
    #[error("edit distance exceeds the configured limit of {max_cost}")]
    /// The two texts differ by more edits than the differ is allowed to explore.
    TooComplex {
        /// The configured limit.
        max_cost: usize,
    },
}

/// Computes the set of non-overlapping deltas turning `previous` into `current`.
pub trait ContentDiffer {
    /// Diff two texts. Delta offsets are char offsets into `previous`.
    fn diff(&self, previous: &str, current: &str) -> Result<Vec<EditDelta>, DiffError>;
}

impl<T: ContentDiffer + ?Sized> ContentDiffer for &T {
    fn diff(&self, previous: &str, current: &str) -> Result<Vec<EditDelta>, DiffError> {
        (**self).diff(previous, current)
    }
}

/// Character-level Myers diff.
#[derive(Debug, Clone, Default)]
pub struct MyersDiffer {
    max_cost: Option<usize>,
}

impl MyersDiffer {
    /// Create a differ without an edit-distance limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a differ that gives up once more than `max_cost` edits would be needed.
    pub fn with_max_cost(max_cost: usize) -> Self {
        Self {
            max_cost: Some(max_cost),
        }
    }

    /// The configured edit-distance limit, if any.
    pub fn max_cost(&self) -> Option<usize> {
        self.max_cost
    }
}

impl ContentDiffer for MyersDiffer {
    fn diff(&self, previous: &str, current: &str) -> Result<Vec<EditDelta>, DiffError> {
        let a: Vec<char> = previous.chars().collect();
        let b: Vec<char> = current.chars().collect();

        let mut ops = Vec::with_capacity(a.len().max(b.len()));
        diff_chars(&a, &b, self.max_cost, &mut ops)?;
        Ok(group_ops(&ops, 0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Equal,
    Delete(char),
    Insert(char),
}

fn common_prefix(a: &[char], b: &[char]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

fn common_suffix(a: &[char], b: &[char]) -> usize {
    a.iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

/// Append the edit script turning `a` into `b` to `ops`.
///
/// Common affixes are trimmed, then the problem is split at the middle snake and both halves
/// are diffed recursively, so memory stays linear in the input length. `max_cost` only bounds
/// the top-level split: every sub-problem costs less than the whole.
fn diff_chars(
    a: &[char],
    b: &[char],
    max_cost: Option<usize>,
    ops: &mut Vec<Op>,
) -> Result<(), DiffError> {
    let prefix = common_prefix(a, b);
    ops.extend(std::iter::repeat_n(Op::Equal, prefix));
    let (a, b) = (&a[prefix..], &b[prefix..]);
    let suffix = common_suffix(a, b);
    let (a, b) = (&a[..a.len() - suffix], &b[..b.len() - suffix]);

    if a.is_empty() {
        ops.extend(b.iter().map(|&ch| Op::Insert(ch)));
    } else if b.is_empty() {
        ops.extend(a.iter().map(|&ch| Op::Delete(ch)));
    } else {
        match middle_snake(a, b, max_cost)? {
            Some((x, y)) => {
                diff_chars(&a[..x], &b[..y], None, ops)?;
                diff_chars(&a[x..], &b[y..], None, ops)?;
            }
            None => {
                ops.extend(a.iter().map(|&ch| Op::Delete(ch)));
                ops.extend(b.iter().map(|&ch| Op::Insert(ch)));
            }
        }
    }

    ops.extend(std::iter::repeat_n(Op::Equal, suffix));
    Ok(())
}

/// Find the point where a forward and a reverse shortest path meet.
///
/// Both inputs are non-empty and share no common prefix or suffix. Returns the split point
/// `(x, y)` such that diffing `a[..x]`/`b[..y]` and `a[x..]`/`b[y..]` separately yields an
/// optimal script.
fn middle_snake(
    a: &[char],
    b: &[char],
    max_cost: Option<usize>,
) -> Result<Option<(usize, usize)>, DiffError> {
    let n = a.len() as isize;
    let m = b.len() as isize;
    let max_d = (n + m + 1) / 2;
    let v_offset = max_d;
    let v_len = (2 * max_d + 2) as usize;
    let mut v1 = vec![-1isize; v_len];
    let mut v2 = vec![-1isize; v_len];
    v1[(v_offset + 1) as usize] = 0;
    v2[(v_offset + 1) as usize] = 0;

    let delta = n - m;
    // With an odd delta the paths meet on a forward step, otherwise on a reverse step.
    let front = delta % 2 != 0;
    let (mut k1_start, mut k1_end, mut k2_start, mut k2_end) = (0isize, 0isize, 0isize, 0isize);

    for d in 0..max_d {
        // Reaching step `d` means the edit distance is at least `2d - 1`.
        if let Some(limit) = max_cost
            && d > 0
            && (2 * d - 1) as usize > limit
        {
            return Err(DiffError::TooComplex { max_cost: limit });
        }

        let mut k1 = -d + k1_start;
        while k1 <= d - k1_end {
            let k1_offset = v_offset + k1;
            let mut x1 = if k1 == -d
                || (k1 != d && v1[(k1_offset - 1) as usize] < v1[(k1_offset + 1) as usize])
            {
                v1[(k1_offset + 1) as usize]
            } else {
                v1[(k1_offset - 1) as usize] + 1
            };
            let mut y1 = x1 - k1;
            while x1 < n && y1 < m && a[x1 as usize] == b[y1 as usize] {
                x1 += 1;
                y1 += 1;
            }
            v1[k1_offset as usize] = x1;
            if x1 > n {
                k1_end += 2;
            } else if y1 > m {
                k1_start += 2;
            } else if front {
                let k2_offset = v_offset + delta - k1;
                if (0..v_len as isize).contains(&k2_offset) {
                    let x2 = v2[k2_offset as usize];
                    if x2 != -1 && x1 >= n - x2 {
                        return Ok(Some((x1 as usize, y1 as usize)));
                    }
                }
            }
            k1 += 2;
        }

        let mut k2 = -d + k2_start;
        while k2 <= d - k2_end {
            let k2_offset = v_offset + k2;
            let mut x2 = if k2 == -d
                || (k2 != d && v2[(k2_offset - 1) as usize] < v2[(k2_offset + 1) as usize])
            {
                v2[(k2_offset + 1) as usize]
            } else {
                v2[(k2_offset - 1) as usize] + 1
            };
            let mut y2 = x2 - k2;
            while x2 < n
                && y2 < m
                && a[(n - x2 - 1) as usize] == b[(m - y2 - 1) as usize]
            {
                x2 += 1;
                y2 += 1;
            }
            v2[k2_offset as usize] = x2;
            if x2 > n {
                k2_end += 2;
            } else if y2 > m {
                k2_start += 2;
            } else if !front {
                let k1_offset = v_offset + delta - k2;
                if (0..v_len as isize).contains(&k1_offset) {
                    let x1 = v1[k1_offset as usize];
                    if x1 != -1 {
                        let y1 = x1 - (k1_offset - v_offset);
                        if x1 >= n - x2 {
                            return Ok(Some((x1 as usize, y1 as usize)));
                        }
                    }
                }
            }
            k2 += 2;
        }
    }

    Ok(None)
}

fn group_ops(ops: &[Op], base: usize) -> Vec<EditDelta> {
    let mut deltas = Vec::new();
    let mut current: Option<EditDelta> = None;
    let mut pos = base;

    for op in ops {
        match *op {
            Op::Equal => {
                if let Some(delta) = current.take() {
                    deltas.push(delta);
                }
                pos += 1;
            }
            Op::Delete(ch) => {
                current
                    .get_or_insert_with(|| EditDelta::new(pos, "", ""))
                    .original
                    .push(ch);
                pos += 1;
            }
            Op::Insert(ch) => {
                current
                    .get_or_insert_with(|| EditDelta::new(pos, "", ""))
                    .revised
                    .push(ch);
            }
        }
    }
    if let Some(delta) = current {
        deltas.push(delta);
    }
    deltas
}
