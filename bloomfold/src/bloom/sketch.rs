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

use crate::bloom::BloomFilterBuilder;
use crate::bloom::FoldedBloomFilter;
use crate::error::Error;
use crate::hash::bit_index;
use crate::hash::hash_item;
use crate::similarity::overlap;

/// A Bloom filter for probabilistic set membership testing and set similarity.
///
/// Provides fast membership queries with:
/// - No false negatives (inserted items always return `true`)
/// - Tunable false positive rate
/// - Constant space usage
///
/// Two filters with the same capacity can be compared with
/// [`similarity()`](Self::similarity), which approximates the Jaccard index
/// of the inserted item sets.
///
/// Use [`BloomFilterBuilder`] to construct instances.
#[derive(Debug, Clone, PartialEq)]
pub struct BloomFilter {
    /// Hash seed for all hash functions
    seed: u32,
    /// Number of hash functions to use (k)
    num_hashes: u16,
    /// Total number of bits in the filter (m)
    capacity_bits: u64,
    /// Designed capacity (n), 0 if sized manually
    expected_items: u64,
    /// Number of insert calls so far
    num_inserted: u64,
    /// Count of bits set to 1
    num_bits_set: u64,
    /// Bit array packed into u64 words
    /// Length = ceil(capacity_bits / 64)
    bit_array: Vec<u64>,
}

impl BloomFilter {
    /// Returns a builder for creating a Bloom filter.
    ///
    /// # Examples
    ///
    /// ```
    /// use bloomfold::bloom::BloomFilter;
    ///
    /// let filter = BloomFilter::builder()
    ///     .expected_items(1000)
    ///     .error_rate(0.01)
    ///     .build()
    ///     .unwrap();
    /// assert!(filter.is_empty());
    /// ```
    pub fn builder() -> BloomFilterBuilder {
        BloomFilterBuilder::default()
    }

    pub(super) fn from_parts(
        seed: u32,
        num_hashes: u16,
        capacity_bits: u64,
        expected_items: u64,
    ) -> Self {
        let num_words = capacity_bits.div_ceil(64) as usize;
        BloomFilter {
            seed,
            num_hashes,
            capacity_bits,
            expected_items,
            num_inserted: 0,
            num_bits_set: 0,
            bit_array: vec![0u64; num_words],
        }
    }

    // ========================================================================
    // Query Operations
    // ========================================================================

    /// Tests whether an item is possibly in the set.
    ///
    /// Returns:
    /// - `true`: Item was **possibly** inserted (or false positive)
    /// - `false`: Item was **definitely not** inserted
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomfold::bloom::BloomFilterBuilder;
    /// let mut filter = BloomFilterBuilder::with_accuracy(100, 0.01).build().unwrap();
    /// filter.insert("apple");
    ///
    /// assert!(filter.contains("apple"));
    /// assert!(!filter.contains("grape")); // never inserted (probably)
    /// ```
    pub fn contains<T: AsRef<[u8]> + ?Sized>(&self, item: &T) -> bool {
        if self.is_empty() {
            return false;
        }

        let (h1, h2) = hash_item(item.as_ref(), self.seed);
        (0..self.num_hashes).all(|i| self.get_bit(bit_index(h1, h2, i, self.capacity_bits)))
    }

    /// Estimates the Jaccard index between the item sets of two filters.
    ///
    /// Computes `popcount(self & other) / popcount(self | other)`. Returns
    /// `Ok(None)` when both filters are empty, since the ratio is undefined.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::SizeMismatch`](crate::error::ErrorKind::SizeMismatch)
    /// if the filters have different capacities.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomfold::bloom::BloomFilterBuilder;
    /// let mut a = BloomFilterBuilder::with_accuracy(100, 0.01).build().unwrap();
    /// let mut b = BloomFilterBuilder::with_accuracy(100, 0.01).build().unwrap();
    /// a.insert("x");
    /// b.insert("x");
    /// assert_eq!(a.similarity(&b).unwrap(), Some(1.0));
    /// ```
    pub fn similarity(&self, other: &BloomFilter) -> Result<Option<f64>, Error> {
        if self.capacity_bits != other.capacity_bits {
            return Err(Error::size_mismatch(
                "capacity bits",
                self.capacity_bits as usize,
                other.capacity_bits as usize,
            ));
        }
        overlap(&self.bit_array, &other.bit_array)
    }

    // ========================================================================
    // Update Operations
    // ========================================================================

    /// Inserts an item into the filter.
    ///
    /// Sets `k` bit positions derived from a single 128-bit hash of the item.
    /// After insertion, `contains(item)` will always return `true`.
    /// Inserting an item twice sets no new bits, but still counts towards
    /// [`num_inserted()`](Self::num_inserted).
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomfold::bloom::BloomFilterBuilder;
    /// let mut filter = BloomFilterBuilder::with_accuracy(100, 0.01).build().unwrap();
    ///
    /// filter.insert("apple");
    /// filter.insert(&String::from("banana"));
    /// filter.insert(&[1u8, 2, 3]);
    ///
    /// assert!(filter.contains("apple"));
    /// assert_eq!(filter.num_inserted(), 3);
    /// ```
    pub fn insert<T: AsRef<[u8]> + ?Sized>(&mut self, item: &T) {
        self.num_inserted += 1;
        let (h1, h2) = hash_item(item.as_ref(), self.seed);
        for i in 0..self.num_hashes {
            self.set_bit(bit_index(h1, h2, i, self.capacity_bits));
        }
    }

    // ========================================================================
    // Folding
    // ========================================================================

    /// Folds the filter down to roughly `target_bits` bits.
    ///
    /// The result has `1 + target_bits / 64` words; word `i` is the OR of
    /// every source word `j` with `j % num_words == i`. Smaller targets save
    /// memory at the cost of a higher false positive rate.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ConfigInvalid`](crate::error::ErrorKind::ConfigInvalid)
    /// if `target_bits` is 0 or larger than [`capacity()`](Self::capacity).
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomfold::bloom::BloomFilterBuilder;
    /// let mut filter = BloomFilterBuilder::with_accuracy(1000, 0.01).build().unwrap();
    /// filter.insert("apple");
    ///
    /// let folded = filter.fold(256).unwrap();
    /// assert_eq!(folded.num_words(), 5);
    /// assert!(folded.contains("apple"));
    /// ```
    pub fn fold(&self, target_bits: u64) -> Result<FoldedBloomFilter, Error> {
        FoldedBloomFilter::from_filter(self, target_bits)
    }

    /// Folds the filter to a size fitted to the items actually inserted.
    ///
    /// Keeps the designed bits-per-item ratio `m / n` but applies it to
    /// [`num_inserted()`](Self::num_inserted), rounded up to a power of two.
    /// A filter filled well below its designed capacity folds much smaller;
    /// an overfilled one folds to its full capacity.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ConfigInvalid`](crate::error::ErrorKind::ConfigInvalid)
    /// if the filter was sized manually without
    /// [`expected_items()`](BloomFilterBuilder::expected_items).
    pub fn fold_to_fit(&self) -> Result<FoldedBloomFilter, Error> {
        if self.expected_items == 0 {
            return Err(Error::config_invalid(
                "fold_to_fit requires a filter sized with expected_items",
            ));
        }
        let bits_per_item = self.capacity_bits as f64 / self.expected_items as f64;
        let wanted = (bits_per_item * self.num_inserted as f64).ceil() as u64;
        let target = wanted.max(1).checked_next_power_of_two().unwrap_or(u64::MAX);
        self.fold(target.min(self.capacity_bits))
    }

    // ========================================================================
    // Statistics and Properties
    // ========================================================================

    /// Returns whether the filter is empty (no bits set).
    pub fn is_empty(&self) -> bool {
        self.num_bits_set == 0
    }

    /// Returns the number of bits set to 1.
    pub fn bits_used(&self) -> u64 {
        self.num_bits_set
    }

    /// Returns the total number of bits in the filter (capacity).
    pub fn capacity(&self) -> u64 {
        self.capacity_bits
    }

    /// Returns the designed item capacity, or 0 for manually sized filters.
    pub fn expected_items(&self) -> u64 {
        self.expected_items
    }

    /// Returns how many times [`insert()`](Self::insert) was called.
    pub fn num_inserted(&self) -> u64 {
        self.num_inserted
    }

    /// Returns the number of hash functions used.
    pub fn num_hashes(&self) -> u16 {
        self.num_hashes
    }

    /// Returns the hash seed.
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Returns the raw bit words.
    pub fn as_words(&self) -> &[u64] {
        &self.bit_array
    }

    /// Returns the current load factor (fraction of bits set).
    ///
    /// Values above 0.5 indicate degraded false positive rates.
    pub fn load_factor(&self) -> f64 {
        self.num_bits_set as f64 / self.capacity_bits as f64
    }

    /// Estimates the current false positive probability.
    ///
    /// A query hits only if all `k` probed bits are set, so this is
    /// `load_factor^k`, assuming uniform bit distribution.
    pub fn estimated_fpp(&self) -> f64 {
        self.load_factor().powi(i32::from(self.num_hashes))
    }

    // ========================================================================
    // Internal Helpers
    // ========================================================================

    fn get_bit(&self, bit_index: u64) -> bool {
        let word_index = (bit_index / 64) as usize;
        let mask = 1u64 << (bit_index % 64);
        (self.bit_array[word_index] & mask) != 0
    }

    /// Sets a single bit and updates the count if it wasn't already set.
    fn set_bit(&mut self, bit_index: u64) {
        let word_index = (bit_index / 64) as usize;
        let mask = 1u64 << (bit_index % 64);

        if (self.bit_array[word_index] & mask) == 0 {
            self.bit_array[word_index] |= mask;
            self.num_bits_set += 1;
        }
    }
}
