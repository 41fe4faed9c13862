//! Lazy round sequencing.
//!
//! Slices a list into consecutive rounds of at most `round_size` items and
//! runs each through a round function only when the caller asks for the
//! next item, so at most one round is ever in flight.

/// Split `items` into consecutive chunks of at most `size` (clamped to 1),
/// preserving order. The last chunk may be shorter.
pub fn split_rounds<T>(items: Vec<T>, size: usize) -> Vec<Vec<T>> {
    let size = size.max(1);
    let mut rounds = Vec::with_capacity(items.len().div_ceil(size));
    let mut current = Vec::with_capacity(size.min(items.len()));
    for item in items {
        current.push(item);
        if current.len() == size {
            rounds.push(std::mem::replace(&mut current, Vec::with_capacity(size)));
        }
    }
    if !current.is_empty() {
        rounds.push(current);
    }
    rounds
}

/// Forward-only iterator over round results. The round function receives
/// the zero-based round index and that round's items.
pub struct Rounds<T, F> {
    pending: std::vec::IntoIter<Vec<T>>,
    next_index: usize,
    run: F,
}

impl<T, F> Rounds<T, F> {
    pub fn new(items: Vec<T>, round_size: usize, run: F) -> Self {
        Self {
            pending: split_rounds(items, round_size).into_iter(),
            next_index: 0,
            run,
        }
    }

    /// Rounds not yet produced.
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl<T, R, F> Iterator for Rounds<T, F>
where
    F: FnMut(usize, Vec<T>) -> R,
{
    type Item = R;

    fn next(&mut self) -> Option<R> {
        let batch = self.pending.next()?;
        let index = self.next_index;
        self.next_index += 1;
        Some((self.run)(index, batch))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.pending.len();
        (n, Some(n))
    }
}

impl<T, R, F> ExactSizeIterator for Rounds<T, F> where F: FnMut(usize, Vec<T>) -> R {}
