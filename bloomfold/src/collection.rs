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

//! A keyed collection of uniformly configured Bloom filters.
//!
//! Every member of a [`BloomSet`] is sized from the same capacity hint and
//! error rate, so any two members can be compared. Queries take `&self`; once
//! a set is populated and folded it can be shared across threads for read-only
//! ranking without locks.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::collections::HashSet;
use std::time::Instant;

use crate::bloom::BloomFilter;
use crate::bloom::BloomFilterBuilder;
use crate::bloom::FoldedBloomFilter;
use crate::dataset::Dataset;
use crate::error::Error;
use crate::similarity::jaccard_against;

/// Scores at or above this value count towards [`Matches::num_above_threshold`].
pub const MATCH_THRESHOLD: f64 = 0.95;

/// False positive rate used by [`BloomSet::new`].
pub const DEFAULT_ERROR_RATE: f64 = 0.01;

/// A scored key.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub key: String,
    pub score: f64,
}

/// Result of a best-match query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Matches {
    /// Top keys by descending score. Ties come out in no particular order.
    pub ranked: Vec<Match>,
    /// How many candidates scored at or above [`MATCH_THRESHOLD`].
    pub num_above_threshold: usize,
}

impl Matches {
    fn rank<'a>(scores: impl Iterator<Item = (&'a str, Option<f64>)>, top_n: usize) -> Self {
        let mut num_above_threshold = 0;
        let mut ranked: Vec<Match> = scores
            .map(|(key, score)| {
                // An empty union scores 0 and never counts as a match.
                let score = score.unwrap_or(0.0);
                if score >= MATCH_THRESHOLD {
                    num_above_threshold += 1;
                }
                Match {
                    key: key.to_string(),
                    score,
                }
            })
            .collect();

        ranked.sort_unstable_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        ranked.truncate(top_n);

        Matches {
            ranked,
            num_above_threshold,
        }
    }

    /// Returns the ranked keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.ranked.iter().map(|m| m.key.as_str())
    }
}

/// One Bloom filter per dataset key, plus an optional folded copy of each.
#[derive(Debug, Clone)]
pub struct BloomSet {
    capacity_hint: u64,
    fpp: f64,
    sketches: HashMap<String, BloomFilter>,
    fold_bits: Option<u64>,
    folds: HashMap<String, FoldedBloomFilter>,
}

impl BloomSet {
    /// Creates an empty set whose members are sized for `capacity_hint` items
    /// at [`DEFAULT_ERROR_RATE`].
    pub fn new(capacity_hint: u64) -> Self {
        Self::with_error_rate(capacity_hint, DEFAULT_ERROR_RATE)
    }

    /// Creates an empty set with a custom false positive rate.
    ///
    /// Invalid parameters surface on the first [`add()`](Self::add).
    pub fn with_error_rate(capacity_hint: u64, fpp: f64) -> Self {
        BloomSet {
            capacity_hint,
            fpp,
            sketches: HashMap::new(),
            fold_bits: None,
            folds: HashMap::new(),
        }
    }

    /// Builds a set from every entry of `dataset`.
    ///
    /// # Errors
    ///
    /// Fails if the shared configuration is invalid.
    pub fn from_dataset(capacity_hint: u64, dataset: &Dataset) -> Result<Self, Error> {
        let mut set = Self::new(capacity_hint);
        for (key, items) in dataset {
            set.add(key.clone(), items)?;
        }
        Ok(set)
    }

    fn new_filter<T: AsRef<[u8]>>(&self, items: &[T]) -> Result<BloomFilter, Error> {
        let mut filter = BloomFilterBuilder::with_accuracy(self.capacity_hint, self.fpp).build()?;
        for item in items {
            filter.insert(item);
        }
        Ok(filter)
    }

    /// Builds a filter from `items` and stores it under `key`, replacing any
    /// previous filter for that key.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ConfigInvalid`](crate::error::ErrorKind::ConfigInvalid)
    /// if the capacity hint or error rate is invalid.
    pub fn add<T: AsRef<[u8]>>(
        &mut self,
        key: impl Into<String>,
        items: &[T],
    ) -> Result<(), Error> {
        let filter = self.new_filter(items)?;
        self.sketches.insert(key.into(), filter);
        Ok(())
    }

    /// Folds every member to `target_bits` and replaces the folded map.
    ///
    /// Either every member is folded or, on error, the previous folded map is
    /// left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ConfigInvalid`](crate::error::ErrorKind::ConfigInvalid)
    /// if `target_bits` is 0 or larger than the members' capacity.
    pub fn fold_all(&mut self, target_bits: u64) -> Result<(), Error> {
        let start = Instant::now();
        let folds = self
            .sketches
            .iter()
            .map(|(key, filter)| filter.fold(target_bits).map(|folded| (key.clone(), folded)))
            .collect::<Result<HashMap<_, _>, Error>>()?;

        self.folds = folds;
        self.fold_bits = Some(target_bits);
        tracing::info!(
            target_bits,
            members = self.folds.len(),
            elapsed = ?start.elapsed(),
            "folded bloom set"
        );
        Ok(())
    }

    /// Ranks every member against a query built from `items`.
    ///
    /// # Errors
    ///
    /// Fails if the shared configuration is invalid.
    pub fn best_matches<T: AsRef<[u8]>>(
        &self,
        items: &[T],
        top_n: usize,
    ) -> Result<Matches, Error> {
        let query = self.new_filter(items)?;
        let mut scores = Vec::with_capacity(self.sketches.len());
        for (key, filter) in &self.sketches {
            scores.push((key.as_str(), filter.similarity(&query)?));
        }
        Ok(Matches::rank(scores.into_iter(), top_n))
    }

    /// Ranks every folded member against a query built from `items` and folded
    /// to the same size.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ConfigInvalid`](crate::error::ErrorKind::ConfigInvalid)
    /// if [`fold_all()`](Self::fold_all) has not been called.
    pub fn folded_best_matches<T: AsRef<[u8]>>(
        &self,
        items: &[T],
        top_n: usize,
    ) -> Result<Matches, Error> {
        let fold_bits = self
            .fold_bits
            .ok_or_else(|| Error::config_invalid("fold_all must be called before folded queries"))?;
        let query = self.new_filter(items)?.fold(fold_bits)?;
        let mut scores = Vec::with_capacity(self.folds.len());
        for (key, folded) in &self.folds {
            scores.push((key.as_str(), folded.similarity(&query)?));
        }
        Ok(Matches::rank(scores.into_iter(), top_n))
    }

    /// Returns the filter stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::KeyNotFound`](crate::error::ErrorKind::KeyNotFound)
    /// if `key` was never added.
    pub fn get(&self, key: &str) -> Result<&BloomFilter, Error> {
        self.sketches.get(key).ok_or_else(|| Error::key_not_found(key))
    }

    /// Returns the folded filter stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::KeyNotFound`](crate::error::ErrorKind::KeyNotFound)
    /// if `key` has no folded filter.
    pub fn get_folded(&self, key: &str) -> Result<&FoldedBloomFilter, Error> {
        self.folds.get(key).ok_or_else(|| Error::key_not_found(key))
    }

    /// Returns the capacity hint shared by all members.
    pub fn capacity_hint(&self) -> u64 {
        self.capacity_hint
    }

    /// Returns the bit target of the last successful fold.
    pub fn fold_bits(&self) -> Option<u64> {
        self.fold_bits
    }

    /// Returns the number of members.
    pub fn len(&self) -> usize {
        self.sketches.len()
    }

    /// Returns whether no key has been added.
    pub fn is_empty(&self) -> bool {
        self.sketches.is_empty()
    }
}

/// Ranks every entry of `dataset` against `items` by exact Jaccard index.
///
/// This is the ground truth the Bloom and folded rankings approximate.
pub fn exact_best_matches<T: AsRef<str>>(dataset: &Dataset, items: &[T], top_n: usize) -> Matches {
    let query: HashSet<&str> = items.iter().map(|item| item.as_ref()).collect();
    let mut seen = HashSet::new();
    let scores = dataset.iter().map(|(key, other)| {
        let score = jaccard_against(&query, other.iter().map(String::as_str), &mut seen);
        (key.as_str(), score)
    });
    Matches::rank(scores, top_n)
}
