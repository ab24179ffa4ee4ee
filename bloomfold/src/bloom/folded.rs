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

use crate::bloom::BloomFilter;
use crate::error::Error;
use crate::hash::bit_index;
use crate::hash::hash_item;
use crate::similarity::overlap;

/// A Bloom filter compressed by OR-folding the words of a larger one.
///
/// Source word `j` lands in folded word `j % num_words`, so a bit set
/// anywhere in a stripe stays set after folding. Membership queries keep the
/// no-false-negative guarantee; the false positive rate rises as the fold
/// gets smaller.
///
/// Folded filters are derived with [`BloomFilter::fold`] or
/// [`BloomFilter::fold_to_fit`] and are never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldedBloomFilter {
    seed: u32,
    num_hashes: u16,
    /// Capacity of the filter this one was folded from
    source_capacity_bits: u64,
    bit_array: Vec<u64>,
}

impl FoldedBloomFilter {
    pub(super) fn from_filter(source: &BloomFilter, target_bits: u64) -> Result<Self, Error> {
        if target_bits == 0 {
            return Err(Error::config_invalid("fold target must be greater than 0 bits"));
        }
        if target_bits > source.capacity() {
            return Err(
                Error::config_invalid("fold target exceeds the source filter capacity")
                    .with_context("target_bits", target_bits)
                    .with_context("capacity_bits", source.capacity()),
            );
        }

        let num_words = 1 + target_bits / 64;
        let mut bit_array = vec![0u64; num_words as usize];
        for (j, &word) in source.as_words().iter().enumerate() {
            bit_array[(j as u64 % num_words) as usize] |= word;
        }

        Ok(FoldedBloomFilter {
            seed: source.seed(),
            num_hashes: source.num_hashes(),
            source_capacity_bits: source.capacity(),
            bit_array,
        })
    }

    /// Tests whether an item is possibly in the source filter.
    ///
    /// Every bit the source filter would check is looked up in the stripe it
    /// was folded into.
    pub fn contains<T: AsRef<[u8]> + ?Sized>(&self, item: &T) -> bool {
        let num_words = self.bit_array.len() as u64;
        let (h1, h2) = hash_item(item.as_ref(), self.seed);
        (0..self.num_hashes).all(|i| {
            let bit = bit_index(h1, h2, i, self.source_capacity_bits);
            let word = self.bit_array[((bit / 64) % num_words) as usize];
            word & (1u64 << (bit % 64)) != 0
        })
    }

    /// Estimates the Jaccard index between two folded filters.
    ///
    /// Returns `Ok(None)` when both are all zero.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::SizeMismatch`](crate::error::ErrorKind::SizeMismatch)
    /// if the filters were folded to different word counts.
    pub fn similarity(&self, other: &FoldedBloomFilter) -> Result<Option<f64>, Error> {
        overlap(&self.bit_array, &other.bit_array)
    }

    /// Returns the number of 64-bit words after folding.
    pub fn num_words(&self) -> usize {
        self.bit_array.len()
    }

    /// Returns the number of bits set to 1.
    pub fn bits_used(&self) -> u64 {
        self.bit_array.iter().map(|w| u64::from(w.count_ones())).sum()
    }

    /// Returns the raw folded words.
    pub fn as_words(&self) -> &[u64] {
        &self.bit_array
    }
}
