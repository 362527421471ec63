//! Binary bookkeeping for the refinement levels of [`crate::simpson_quant_hp`].
//!
//! Pass 0 samples the grid `h, 2h, 3h, ...`. Every later pass halves the step
//! and only evaluates the new midpoints, storing them in a level of their own.
//! At finest depth `n`, outer sample `i` (the point `i * h_n`) therefore lives
//! in the level given by the lowest set bit of `i mod 2^n`, and these
//! routines recover that level and the offset within it.

/// Level that owns outer sample `i` when the finest depth is `n`.
///
/// Reduces `i` modulo `2^n` and scans its bits from position `n` down: an odd
/// multiple of `2^k` was first sampled at level `n - k`. Multiples of `2^n`
/// belong to level 0.
pub fn determine_eval_set(i: u64, n: u32) -> u32 {
    let mut reduced = i % (1u64 << n);
    for e in (0..=n).rev() {
        if reduced & 1 == 1 {
            return e;
        }
        reduced >>= 1;
    }
    0
}

/// Offset of outer sample `i` inside level `j` at finest depth `n`.
///
/// Level 0 is spaced `2^n` outer samples apart; level `j > 0` holds only odd
/// multiples of `2^(n-j)` and so is spaced twice as far.
pub fn inner_index(i: u64, n: u32, j: u32) -> usize {
    let lower_exp = if j == 0 { n - j } else { n - j + 1 };
    let divisor = 1u64 << lower_exp;
    match i.checked_sub(1u64 << (n - j)) {
        Some(offset) if offset % divisor == 0 => (offset / divisor) as usize,
        _ => panic!("outer index {i} is not owned by level {j} at depth {n}"),
    }
}

/// One position of the walk over the finest grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub outer: u64,
    pub level: usize,
    pub inner: usize,
}

/// Lazy walk over outer indices `1..max_iter`; see [`navigate`].
#[derive(Debug, Clone)]
pub struct Navigate {
    depth: u32,
    next: u64,
    end: u64,
}

/// Walk the finest grid of a refinement history holding `levels` levels,
/// yielding for each outer index the owning level and the offset in it.
pub fn navigate(levels: usize, max_iter: u64) -> Navigate {
    assert!(levels > 0, "navigate needs at least one refinement level");
    Navigate {
        depth: (levels - 1) as u32,
        next: 1,
        end: max_iter,
    }
}

impl Iterator for Navigate {
    type Item = Step;

    fn next(&mut self) -> Option<Step> {
        if self.next >= self.end {
            return None;
        }
        let outer = self.next;
        self.next += 1;

        let level = determine_eval_set(outer, self.depth);
        Some(Step {
            outer,
            level: level as usize,
            inner: inner_index(outer, self.depth, level),
        })
    }
}
