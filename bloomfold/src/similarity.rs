// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Jaccard similarity estimators.
//!
//! [`overlap`] is the bitwise estimator shared by [`BloomFilter`] and
//! [`FoldedBloomFilter`]. [`exact_jaccard`] is the ground truth it is judged
//! against.
//!
//! Both return `None` for the degenerate case where the union is empty
//! (two empty sets, or two all-zero bit vectors). Callers choose how to
//! treat it; the ranking in [`crate::collection`] scores it as `0.0`.
//!
//! [`BloomFilter`]: crate::bloom::BloomFilter
//! [`FoldedBloomFilter`]: crate::bloom::FoldedBloomFilter

use std::collections::HashSet;
use std::hash::Hash;

use crate::error::Error;

/// Estimates the Jaccard index of two equal-length bit vectors as
/// `popcount(a & b) / popcount(a | b)`.
///
/// # Errors
///
/// Returns [`ErrorKind::SizeMismatch`](crate::error::ErrorKind::SizeMismatch)
/// if the vectors differ in length. Nothing is truncated or padded.
///
/// # Examples
///
/// ```
/// use bloomfold::similarity::overlap;
///
/// let a = [0b1110_u64];
/// let b = [0b0111_u64];
/// assert_eq!(overlap(&a, &b).unwrap(), Some(0.5));
/// assert_eq!(overlap(&[0], &[0]).unwrap(), None);
/// assert!(overlap(&[0, 0], &[0]).is_err());
/// ```
pub fn overlap(a: &[u64], b: &[u64]) -> Result<Option<f64>, Error> {
    if a.len() != b.len() {
        return Err(Error::size_mismatch("bit vector words", a.len(), b.len()));
    }

    let (mut numer, mut denom) = (0u64, 0u64);
    for (x, y) in a.iter().zip(b) {
        numer += u64::from((x & y).count_ones());
        denom += u64::from((x | y).count_ones());
    }

    if denom == 0 {
        return Ok(None);
    }
    Ok(Some(numer as f64 / denom as f64))
}

/// Computes the exact Jaccard index `|A ∩ B| / |A ∪ B|` of two item lists.
///
/// Duplicates within either list are ignored.
///
/// # Examples
///
/// ```
/// use bloomfold::similarity::exact_jaccard;
///
/// let a = ["a", "b", "c"];
/// let b = ["b", "c", "d"];
/// assert_eq!(exact_jaccard(&a, &b), Some(0.5));
/// ```
pub fn exact_jaccard<T: Eq + Hash>(a: &[T], b: &[T]) -> Option<f64> {
    let set: HashSet<&T> = a.iter().collect();
    jaccard_against(&set, b, &mut HashSet::with_capacity(b.len()))
}

/// Exact Jaccard index of a prebuilt set `a` and the items of `b`.
///
/// `seen` is scratch space for deduplicating `b`; it is cleared first so one
/// buffer can serve many comparisons against the same `a`.
pub(crate) fn jaccard_against<'a, T: Eq + Hash + ?Sized>(
    a: &HashSet<&'a T>,
    b: impl IntoIterator<Item = &'a T>,
    seen: &mut HashSet<&'a T>,
) -> Option<f64> {
    seen.clear();
    let mut intersection = 0usize;
    let mut union = a.len();
    for item in b {
        if !seen.insert(item) {
            continue;
        }
        if a.contains(item) {
            intersection += 1;
        } else {
            union += 1;
        }
    }

    if union == 0 {
        return None;
    }
    Some(intersection as f64 / union as f64)
}
