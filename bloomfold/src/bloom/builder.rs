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
use crate::hash::DEFAULT_UPDATE_SEED;

const MAX_NUM_BITS: u64 = (1u64 << 35) - 64; // ~4 GiB of bits
const MAX_NUM_HASHES: u16 = 100;

/// Builder for creating [`BloomFilter`] instances.
///
/// Provides two construction modes:
/// - [`expected_items()`](Self::expected_items) together with
///   [`error_rate()`](Self::error_rate): size the filter for a target false
///   positive rate (recommended). The two calls may come in either order.
/// - [`with_size()`](Self::with_size): specify exact bit count and hash functions.
///
/// The builder is consumed by [`build()`](Self::build), so a filter's sizing can
/// never change once items have been inserted.
#[derive(Debug, Clone)]
pub struct BloomFilterBuilder {
    expected_items: Option<u64>,
    fpp: Option<f64>,
    num_bits: Option<u64>,
    num_hashes: Option<u16>,
    seed: u32,
}

impl Default for BloomFilterBuilder {
    fn default() -> Self {
        BloomFilterBuilder {
            expected_items: None,
            fpp: None,
            num_bits: None,
            num_hashes: None,
            seed: DEFAULT_UPDATE_SEED,
        }
    }
}

impl BloomFilterBuilder {
    /// Creates a builder sized for `max_items` at false positive rate `fpp`.
    ///
    /// Shorthand for `default().expected_items(max_items).error_rate(fpp)`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomfold::bloom::BloomFilterBuilder;
    /// let filter = BloomFilterBuilder::with_accuracy(10_000, 0.01)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(filter.num_hashes(), 7);
    /// ```
    pub fn with_accuracy(max_items: u64, fpp: f64) -> Self {
        Self::default().expected_items(max_items).error_rate(fpp)
    }

    /// Creates a builder with manual size specification.
    ///
    /// Filters built this way have no designed capacity unless
    /// [`expected_items()`](Self::expected_items) is also called, which
    /// [`fold_to_fit()`](BloomFilter::fold_to_fit) needs.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomfold::bloom::BloomFilterBuilder;
    /// let filter = BloomFilterBuilder::with_size(1024, 5).build().unwrap();
    /// assert_eq!(filter.capacity(), 1024);
    /// ```
    pub fn with_size(num_bits: u64, num_hashes: u16) -> Self {
        BloomFilterBuilder {
            num_bits: Some(num_bits),
            num_hashes: Some(num_hashes),
            ..Self::default()
        }
    }

    /// Records the designed capacity `n` used to size the filter.
    pub fn expected_items(mut self, n: u64) -> Self {
        self.expected_items = Some(n);
        self
    }

    /// Records the target false positive probability `p`, in `(0, 1)`.
    pub fn error_rate(mut self, p: f64) -> Self {
        self.fpp = Some(p);
        self
    }

    /// Sets a custom hash seed (default: 9001).
    ///
    /// Filters with different seeds set different bits for the same item, so
    /// comparing them is meaningless.
    pub fn seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }

    /// Builds the Bloom filter.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ConfigInvalid`](crate::error::ErrorKind::ConfigInvalid) if:
    /// - neither [`with_size()`](Self::with_size) nor both
    ///   [`expected_items()`](Self::expected_items) and
    ///   [`error_rate()`](Self::error_rate) were given,
    /// - `expected_items` is 0 or the error rate is outside `(0, 1)`,
    /// - a manual size is out of bounds, or is combined with an error rate.
    pub fn build(self) -> Result<BloomFilter, Error> {
        let (num_bits, num_hashes, expected_items) = match (self.num_bits, self.num_hashes) {
            (Some(num_bits), Some(num_hashes)) => {
                if self.fpp.is_some() {
                    return Err(Error::config_invalid(
                        "error_rate cannot be combined with with_size",
                    ));
                }
                Self::validate_params(num_bits, num_hashes)?;
                (num_bits, num_hashes, self.expected_items.unwrap_or(0))
            }
            _ => {
                let n = self.expected_items.ok_or_else(|| {
                    Error::config_invalid("expected_items must be set before build")
                })?;
                let p = self
                    .fpp
                    .ok_or_else(|| Error::config_invalid("error_rate must be set before build"))?;
                if n == 0 {
                    return Err(Error::config_invalid("expected_items must be greater than 0"));
                }
                if !(p > 0.0 && p < 1.0) {
                    return Err(Error::config_invalid(
                        "error_rate must be between 0.0 and 1.0 (exclusive)",
                    )
                    .with_context("error_rate", p));
                }
                let num_bits = Self::suggest_num_bits(n, p);
                Self::validate_params(num_bits, 1)?;
                (num_bits, Self::suggest_num_hashes(n, num_bits), n)
            }
        };

        Ok(BloomFilter::from_parts(
            self.seed,
            num_hashes,
            num_bits,
            expected_items,
        ))
    }

    /// Suggests the number of bits given expected items and target FPP.
    ///
    /// Formula: `m = ceil(-n * ln(p) / (ln(2)^2))`
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomfold::bloom::BloomFilterBuilder;
    /// let bits = BloomFilterBuilder::suggest_num_bits(1000, 0.01);
    /// assert_eq!(bits, 9586);
    /// ```
    pub fn suggest_num_bits(expected_items: u64, fpp: f64) -> u64 {
        let n = expected_items as f64;
        let ln2_squared = std::f64::consts::LN_2 * std::f64::consts::LN_2;
        (-n * fpp.ln() / ln2_squared).ceil() as u64
    }

    /// Suggests the number of hash functions given expected items and bit count.
    ///
    /// Formula: `k = round((m/n) * ln(2))`, at least 1.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomfold::bloom::BloomFilterBuilder;
    /// let hashes = BloomFilterBuilder::suggest_num_hashes(1000, 10000);
    /// assert_eq!(hashes, 7); // k ≈ 6.93
    /// ```
    pub fn suggest_num_hashes(expected_items: u64, num_bits: u64) -> u16 {
        let m = num_bits as f64;
        let n = expected_items as f64;
        let k = (m / n * std::f64::consts::LN_2).round();
        (k as u16).clamp(1, MAX_NUM_HASHES)
    }

    fn validate_params(num_bits: u64, num_hashes: u16) -> Result<(), Error> {
        if num_bits == 0 || num_bits > MAX_NUM_BITS {
            return Err(
                Error::config_invalid(format!("num_bits must be in [1, {MAX_NUM_BITS}]"))
                    .with_context("num_bits", num_bits),
            );
        }
        if num_hashes == 0 || num_hashes > MAX_NUM_HASHES {
            return Err(Error::config_invalid(format!(
                "num_hashes must be in [1, {MAX_NUM_HASHES}]"
            ))
            .with_context("num_hashes", num_hashes));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_sizing_formula() {
        let filter = BloomFilterBuilder::with_accuracy(1000, 0.01).build().unwrap();
        assert_eq!(filter.capacity(), 9586);
        assert_eq!(filter.num_hashes(), 7);
        assert_eq!(filter.expected_items(), 1000);
        assert!(filter.is_empty());
    }

    #[test]
    fn test_configuration_order_is_irrelevant() {
        let a = BloomFilterBuilder::default()
            .expected_items(500)
            .error_rate(0.05)
            .build()
            .unwrap();
        let b = BloomFilterBuilder::default()
            .error_rate(0.05)
            .expected_items(500)
            .build()
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_missing_error_rate() {
        let err = BloomFilterBuilder::default()
            .expected_items(100)
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert_eq!(err.message(), "error_rate must be set before build");
    }

    #[test]
    fn test_missing_expected_items() {
        let err = BloomFilterBuilder::default()
            .error_rate(0.01)
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }

    #[test]
    fn test_invalid_parameters() {
        for (n, p) in [(0, 0.01), (100, 0.0), (100, 1.0), (100, 1.5), (100, f64::NAN)] {
            let err = BloomFilterBuilder::with_accuracy(n, p).build().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ConfigInvalid, "n={n}, p={p}");
        }
    }

    #[test]
    fn test_with_size_bounds() {
        assert!(BloomFilterBuilder::with_size(0, 3).build().is_err());
        assert!(BloomFilterBuilder::with_size(64, 0).build().is_err());
        assert!(BloomFilterBuilder::with_size(64, 101).build().is_err());
        assert!(
            BloomFilterBuilder::with_size(64, 3)
                .error_rate(0.01)
                .build()
                .is_err()
        );
        let filter = BloomFilterBuilder::with_size(100, 3).build().unwrap();
        assert_eq!(filter.capacity(), 100);
        assert_eq!(filter.expected_items(), 0);
    }

    #[test]
    fn test_at_least_one_hash() {
        assert_eq!(BloomFilterBuilder::suggest_num_hashes(1000, 10), 1);
    }
}
