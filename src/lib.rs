// Copyright 2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A double-ended priority queue implemented with a min-max heap.
//!
//! A `MinMaxHeap` borrows a vector and keeps a heap over a sub-range `[start, end)` of it.
//! Items removed from the heap are "parked" just past the end of the range instead of being
//! moved elsewhere, which is what lets [`MinMaxHeap::sort`] sort the range in place. Custom
//! comparators are supported through the [`compare`][cmp] crate.
//!
//! Insertion and popping the smallest or greatest item are `O(log n)`. Retrieving the smallest
//! or greatest item is `O(1)`. Building a heap over an existing range is `O(n)`.
//!
//! ```
//! use minmax_heap::MinMaxHeap;
//!
//! let mut store = vec![5, 1, 9, 3, 7];
//! let mut heap = MinMaxHeap::new(&mut store);
//! assert_eq!(heap.peek_min_max(), Ok((&1, &9)));
//!
//! heap.sort();
//! assert_eq!(store, [1, 3, 5, 7, 9]);
//! ```
//!
//! [cmp]: https://docs.rs/compare

use std::fmt::{self, Debug};
use std::ops::Range;
use std::slice;

use compare::{natural, Compare, Natural};
use thiserror::Error;

// A min-max heap is a complete binary tree stored in a slice with the usual
// numbering (children of `i` at `2i + 1` and `2i + 2`) where levels alternate
// between "min levels" and "max levels", starting with a min level at the root:
//
// (1) An item on a min level is less than or equal to every item in its subtree.
// (2) An item on a max level is greater than or equal to every item in its subtree.
//
// So the min item is at the root and the max item is one of the root's children.
//
//            0            min
//          /   \
//         1     2         max
//        / \   / \
//       3   4 5   6       min
//      / \
//     7   8 ...           max
//
// Level `L` spans offsets `2^L - 1 ..= 2^(L + 1) - 2`, so the parity of the level
// of offset `i` is the parity of the bit length of `i + 1`.

/// Errors reported by heap operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// The heap holds no items.
    #[error("heap is empty")]
    Empty,
    /// An insertion that must not grow the store found no slot at the end of the heap.
    #[error("no parked slot at index {index} past the end of the heap")]
    NoParkedSlot { index: usize },
    /// The requested range does not fit the store.
    #[error("range {start}..{end} is invalid for a store of length {len}")]
    InvalidRange { start: usize, end: usize, len: usize },
}

/// Returns `true` if offset `index` of a heap lies on a min level.
///
/// The root (offset 0) is on a min level, its children on a max level, and so on.
///
/// # Examples
///
/// ```
/// use minmax_heap::is_min_level;
///
/// assert!(is_min_level(0));
/// assert!(!is_min_level(1) && !is_min_level(2));
/// assert!(is_min_level(3) && is_min_level(6));
/// assert!(!is_min_level(7));
/// ```
#[inline]
pub fn is_min_level(index: usize) -> bool {
    let rank = index + 1;
    (usize::BITS - rank.leading_zeros()) & 1 == 1
}

/// `true` if `a` belongs closer to the root than `b` on a level of the given polarity.
#[inline]
fn favors<T, C: Compare<T>>(cmp: &C, toward_max: bool, a: &T, b: &T) -> bool {
    if toward_max { cmp.compares_gt(a, b) } else { cmp.compares_lt(a, b) }
}

/// Offset of the greatest item of a valid heap.
fn max_offset<T, C: Compare<T>>(v: &[T], cmp: &C) -> usize {
    match v.len() {
        0 | 1 => 0,
        2 => 1,
        _ => if cmp.compares_lt(&v[1], &v[2]) { 2 } else { 1 },
    }
}

/// The subtree rooted at `i` is a valid min-max heap except possibly for the
/// item at `i` itself. This function restores the heap properties below `i`.
///
/// # Panics
///
/// Panics if `i` is out of bounds.
pub fn sift_down<T, C: Compare<T>>(v: &mut [T], mut i: usize, cmp: &C) {
    assert!(i < v.len(), "sift_down index {} out of bounds for heap of {}", i, v.len());
    let end = v.len();
    let toward_max = !is_min_level(i);
    let mut left = 2 * i + 1;
    while left < end {
        let right = left + 1;
        // Most extreme of the children and grandchildren; ties keep the earliest.
        let mut m = left;
        for c in [right, 2 * left + 1, 2 * left + 2, 2 * right + 1, 2 * right + 2] {
            if c >= end { break; }
            if favors(cmp, toward_max, &v[c], &v[m]) { m = c; }
        }
        if m <= right {
            // A child has no descendants that could be out of place.
            if favors(cmp, toward_max, &v[m], &v[i]) { v.swap(m, i); }
            return;
        }
        if !favors(cmp, toward_max, &v[m], &v[i]) { return; }
        v.swap(m, i);
        let parent = (m - 1) / 2;
        if favors(cmp, toward_max, &v[parent], &v[m]) { v.swap(m, parent); }
        i = m;
        left = 2 * i + 1;
    }
}

/// The items before `i` form a valid min-max heap and the item at `i` may be
/// out of place with respect to its ancestors. This function moves it up to
/// where it belongs.
///
/// # Panics
///
/// Panics if `i` is out of bounds.
pub fn sift_up<T, C: Compare<T>>(v: &mut [T], mut i: usize, cmp: &C) {
    assert!(i < v.len(), "sift_up index {} out of bounds for heap of {}", i, v.len());
    if i == 0 { return; }
    let parent = (i - 1) / 2;
    // The parent sits on a level of the opposite polarity.
    let mut toward_max = is_min_level(i);
    if favors(cmp, toward_max, &v[i], &v[parent]) {
        v.swap(i, parent);
        i = parent;
    } else {
        toward_max = !toward_max;
    }
    // Polarity repeats every two levels, so only grandparents are left to check.
    while i >= 3 {
        let grandparent = (i - 3) / 4;
        if !favors(cmp, toward_max, &v[i], &v[grandparent]) { break; }
        v.swap(i, grandparent);
        i = grandparent;
    }
}

/// Rearranges `v` into a valid min-max heap.
///
/// # Examples
///
/// ```
/// use minmax_heap::heapify;
///
/// let mut v = vec![5, 1, 9, 3, 7, 2, 8];
/// heapify(&mut v, &compare::natural());
/// assert_eq!(v[0], 1);
/// assert_eq!(v[1].max(v[2]), 9);
/// ```
pub fn heapify<T, C: Compare<T>>(v: &mut [T], cmp: &C) {
    for i in (0..v.len() / 2).rev() {
        sift_down(v, i, cmp);
    }
}

/// A double-ended priority queue implemented with a min-max heap over a
/// borrowed vector.
///
/// The heap occupies the range `[start, end)` of the vector. Items before
/// `start` are never touched. Items at `end` and beyond are not part of the
/// heap; extracting from a heap that does not reach the end of the vector
/// leaves the extracted item there, parked, where a later
/// [`insert_in_place`](#method.insert_in_place) or
/// [`restore_parked`](#method.restore_parked) can reuse its slot.
///
/// It is a logic error for an item to be modified in such a way that the
/// item's ordering relative to any other item, as determined by the heap's
/// comparator, changes while it is in the heap. This is normally only
/// possible through `Cell`, `RefCell`, global state, I/O, or unsafe code.
pub struct MinMaxHeap<'a, T: 'a, C: Compare<T> = Natural<T>> {
    store: &'a mut Vec<T>,
    start: usize,
    end: usize,
    cmp: C,
}

fn check_range(range: &Range<usize>, len: usize) -> Result<(), Error> {
    if range.start <= range.end && range.end <= len {
        Ok(())
    } else {
        Err(Error::InvalidRange { start: range.start, end: range.end, len })
    }
}

impl<'a, T: Ord> MinMaxHeap<'a, T> {
    /// Returns a heap over all of `store`, ordered according to the natural
    /// order of its items.
    ///
    /// # Examples
    ///
    /// ```
    /// use minmax_heap::MinMaxHeap;
    ///
    /// let mut store = vec![5, 1, 6, 4];
    /// let heap = MinMaxHeap::new(&mut store);
    /// assert_eq!(heap.len(), 4);
    /// assert_eq!(heap.peek_min_max(), Ok((&1, &6)));
    /// ```
    pub fn new(store: &'a mut Vec<T>) -> MinMaxHeap<'a, T> {
        Self::with_comparator(store, natural())
    }

    /// Returns a heap over `store[range]`, ordered according to the natural
    /// order of its items.
    ///
    /// # Examples
    ///
    /// ```
    /// use minmax_heap::MinMaxHeap;
    ///
    /// let mut store = vec![0, 8, 3, 5, 0];
    /// let heap = MinMaxHeap::with_range(&mut store, 1..4).unwrap();
    /// assert_eq!(heap.peek_min_max(), Ok((&3, &8)));
    /// ```
    pub fn with_range(store: &'a mut Vec<T>, range: Range<usize>) -> Result<MinMaxHeap<'a, T>, Error> {
        Self::with_range_and_comparator(store, range, natural())
    }
}

impl<'a, T, C: Compare<T>> MinMaxHeap<'a, T, C> {
    /// Returns a heap over all of `store`, ordered according to the given comparator.
    ///
    /// # Examples
    ///
    /// ```
    /// use minmax_heap::MinMaxHeap;
    ///
    /// let mut store = vec!["bb", "a", "cccc"];
    /// let heap = MinMaxHeap::with_comparator(&mut store, |a: &&str, b: &&str| a.len().cmp(&b.len()));
    /// assert_eq!(heap.peek_max(), Ok(&"cccc"));
    /// ```
    pub fn with_comparator(store: &'a mut Vec<T>, cmp: C) -> MinMaxHeap<'a, T, C> {
        let end = store.len();
        let mut heap = MinMaxHeap { store, start: 0, end, cmp };
        heap.rebuild();
        heap
    }

    /// Returns a heap over `store[range]`, ordered according to the given comparator.
    ///
    /// Fails with `Error::InvalidRange` unless `range.start <= range.end <= store.len()`.
    pub fn with_range_and_comparator(store: &'a mut Vec<T>, range: Range<usize>, cmp: C)
                                     -> Result<MinMaxHeap<'a, T, C>, Error> {
        check_range(&range, store.len())?;
        let mut heap = MinMaxHeap { store, start: range.start, end: range.end, cmp };
        heap.rebuild();
        Ok(heap)
    }

    fn rebuild(&mut self) {
        if self.len() > 1 {
            heapify(&mut self.store[self.start..self.end], &self.cmp);
        }
    }

    /// Points the heap at `store[range]` and rebuilds it, optionally with a
    /// new comparator.
    ///
    /// The heap is rebuilt even if neither the range nor the comparator changed.
    pub fn reset(&mut self, range: Range<usize>, cmp: Option<C>) -> Result<(), Error> {
        check_range(&range, self.store.len())?;
        log::trace!("resetting heap to {}..{} of {}", range.start, range.end, self.store.len());
        self.start = range.start;
        self.end = range.end;
        if let Some(cmp) = cmp {
            self.cmp = cmp;
        }
        self.rebuild();
        Ok(())
    }

    /// Returns the number of items in the heap.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns `true` if the heap contains no items.
    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    /// Returns the range of the store the heap currently occupies.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Returns the items of the heap in heap order.
    pub fn as_slice(&self) -> &[T] {
        &self.store[self.start..self.end]
    }

    /// Returns the whole backing store, including items outside of the heap.
    pub fn store(&self) -> &[T] {
        &self.store[..]
    }

    /// Returns an iterator visiting all items in the heap in arbitrary order.
    pub fn iter(&self) -> slice::Iter<T> {
        self.as_slice().iter()
    }

    /// Returns a reference to the smallest item in the heap.
    ///
    /// Fails with `Error::Empty` if the heap is empty.
    pub fn peek_min(&self) -> Result<&T, Error> {
        self.as_slice().first().ok_or(Error::Empty)
    }

    /// Returns a reference to the greatest item in the heap.
    ///
    /// Fails with `Error::Empty` if the heap is empty.
    pub fn peek_max(&self) -> Result<&T, Error> {
        let v = self.as_slice();
        if v.is_empty() {
            return Err(Error::Empty);
        }
        Ok(&v[max_offset(v, &self.cmp)])
    }

    /// Returns references to the smallest and greatest items in the heap.
    ///
    /// Fails with `Error::Empty` if the heap is empty.
    pub fn peek_min_max(&self) -> Result<(&T, &T), Error> {
        Ok((self.peek_min()?, self.peek_max()?))
    }

    /// Moves the smallest item to the slot just past the heap, which shrinks
    /// by one.
    ///
    /// Fails with `Error::Empty` if the heap is empty.
    pub fn store_min(&mut self) -> Result<(), Error> {
        if self.is_empty() {
            return Err(Error::Empty);
        }
        self.end -= 1;
        let v = &mut self.store[self.start..=self.end];
        let last = v.len() - 1;
        v.swap(0, last);
        if last > 1 {
            sift_down(&mut v[..last], 0, &self.cmp);
        }
        Ok(())
    }

    /// Moves the greatest item to the slot just past the heap, which shrinks
    /// by one.
    ///
    /// Fails with `Error::Empty` if the heap is empty.
    pub fn store_max(&mut self) -> Result<(), Error> {
        if self.is_empty() {
            return Err(Error::Empty);
        }
        self.shrink_max();
        Ok(())
    }

    fn shrink_max(&mut self) {
        debug_assert!(!self.is_empty());
        self.end -= 1;
        let v = &mut self.store[self.start..=self.end];
        let last = v.len() - 1;
        if last == 0 {
            return;
        }
        let imax = max_offset(v, &self.cmp);
        v.swap(imax, last);
        if imax < last {
            sift_down(&mut v[..last], imax, &self.cmp);
        }
    }

    /// Takes the item that the last `store_*` call moved to `end`.
    fn take_stored(&mut self) -> T where T: Clone {
        if self.end + 1 == self.store.len() {
            if let Some(item) = self.store.pop() {
                return item;
            }
        }
        self.store[self.end].clone()
    }

    /// Removes the smallest item from the heap and returns it.
    ///
    /// If the heap reaches the end of the store the item is popped off the
    /// store. Otherwise it stays parked just past the heap and a clone is
    /// returned.
    ///
    /// Fails with `Error::Empty` if the heap is empty.
    pub fn extract_min(&mut self) -> Result<T, Error> where T: Clone {
        self.store_min()?;
        Ok(self.take_stored())
    }

    /// Removes the greatest item from the heap and returns it.
    ///
    /// If the heap reaches the end of the store the item is popped off the
    /// store. Otherwise it stays parked just past the heap and a clone is
    /// returned.
    ///
    /// Fails with `Error::Empty` if the heap is empty.
    pub fn extract_max(&mut self) -> Result<T, Error> where T: Clone {
        self.store_max()?;
        Ok(self.take_stored())
    }

    fn admit_next(&mut self) {
        debug_assert!(self.end < self.store.len());
        self.end += 1;
        let v = &mut self.store[self.start..self.end];
        let last = v.len() - 1;
        sift_up(v, last, &self.cmp);
    }

    /// Pushes an item onto the heap.
    ///
    /// The item goes into the slot just past the heap, overwriting whatever is
    /// parked there, or onto the end of the store if the heap reaches it.
    pub fn insert(&mut self, item: T) {
        if self.end == self.store.len() {
            self.store.push(item);
        } else {
            self.store[self.end] = item;
        }
        self.admit_next();
    }

    /// Pushes an item onto the heap without growing the store.
    ///
    /// Fails with `Error::NoParkedSlot` if the heap already reaches the end of
    /// the store. The item is dropped in that case.
    pub fn insert_in_place(&mut self, item: T) -> Result<(), Error> {
        if self.end == self.store.len() {
            return Err(Error::NoParkedSlot { index: self.end });
        }
        self.store[self.end] = item;
        self.admit_next();
        Ok(())
    }

    /// Grows the heap by one over the item parked just past it.
    ///
    /// Fails with `Error::NoParkedSlot` if the heap already reaches the end of
    /// the store.
    pub fn restore_parked(&mut self) -> Result<(), Error> {
        if self.end == self.store.len() {
            return Err(Error::NoParkedSlot { index: self.end });
        }
        self.admit_next();
        Ok(())
    }

    /// Sorts the heap's range of the store in ascending order, leaving the
    /// heap empty.
    ///
    /// Returns the whole store if the heap covered all of it, `None` if only a
    /// part of the store was sorted.
    ///
    /// # Examples
    ///
    /// ```
    /// use minmax_heap::MinMaxHeap;
    ///
    /// let mut store = vec![9, 4, 1, 3, 0];
    /// let mut heap = MinMaxHeap::with_range(&mut store, 1..4).unwrap();
    /// assert_eq!(heap.sort(), None);
    /// assert!(heap.is_empty());
    /// assert_eq!(store, [9, 1, 3, 4, 0]);
    /// ```
    pub fn sort(&mut self) -> Option<&[T]> {
        let whole = self.start == 0 && self.end == self.store.len();
        while !self.is_empty() {
            self.shrink_max();
        }
        if whole { Some(&self.store[..]) } else { None }
    }

    /// Checks if the heap is valid, logging every ancestor/descendant pair
    /// that violates the min-max heap properties.
    ///
    /// Walks every subtree, so this is only meant for tests.
    #[cfg(any(test, feature = "diagnostics"))]
    pub fn check_invariant(&self) -> bool where T: Debug {
        let v = self.as_slice();
        let mut ok = true;
        let mut pending = Vec::new();
        for p in 0..v.len() {
            let toward_max = !is_min_level(p);
            let relation = if toward_max { ">=" } else { "<=" };
            pending.extend_from_slice(&[2 * p + 1, 2 * p + 2]);
            while let Some(d) = pending.pop() {
                if d >= v.len() { continue; }
                if favors(&self.cmp, toward_max, &v[d], &v[p]) {
                    log::warn!("failed a[{}]={:?} {} a[{}]={:?}",
                               self.start + p, v[p], relation, self.start + d, v[d]);
                    ok = false;
                }
                pending.extend_from_slice(&[2 * d + 1, 2 * d + 2]);
            }
        }
        ok
    }
}

impl<'a, T: Debug, C: Compare<T>> Debug for MinMaxHeap<'a, T, C> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self).finish()
    }
}

impl<'a, T, C: Compare<T>> Extend<T> for MinMaxHeap<'a, T, C> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        if self.end == self.store.len() {
            self.store.reserve(lower);
        }
        for item in iter {
            self.insert(item);
        }
    }
}

impl<'a, 'b, T, C: Compare<T>> IntoIterator for &'b MinMaxHeap<'a, T, C> {
    type Item = &'b T;
    type IntoIter = slice::Iter<'b, T>;
    fn into_iter(self) -> slice::Iter<'b, T> { self.iter() }
}
