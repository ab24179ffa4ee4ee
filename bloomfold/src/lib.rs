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

//! Set similarity estimation with Bloom filters and folded Bloom filters.
//!
//! This crate compares three ways of scoring how similar labeled item-sets
//! are:
//! - exact Jaccard index over the raw items ([`similarity::exact_jaccard`]),
//! - bitwise overlap of fixed-size Bloom filters ([`bloom::BloomFilter`]),
//! - the same overlap over filters folded down to fewer bits
//!   ([`bloom::FoldedBloomFilter`]).
//!
//! A [`collection::BloomSet`] holds one filter per key and ranks them against
//! a query, and [`harness::Harness`] runs such queries for every key of a
//! [`dataset::Dataset`] on a worker pool, aggregating timings by input size.
//!
//! ```rust
//! use bloomfold::collection::BloomSet;
//!
//! let mut set = BloomSet::new(1000);
//! set.add("x", &["GO:1", "GO:2", "GO:3"]).unwrap();
//! set.add("y", &["GO:1", "GO:2", "GO:3"]).unwrap();
//! set.add("z", &["GO:7", "GO:8"]).unwrap();
//! set.fold_all(256).unwrap();
//!
//! let matches = set.folded_best_matches(&["GO:1", "GO:2", "GO:3"], 2).unwrap();
//! assert_eq!(matches.num_above_threshold, 2);
//! ```

pub mod bloom;
pub mod collection;
pub mod dataset;
pub mod error;
pub mod harness;
pub mod similarity;

mod hash;

pub use self::hash::DEFAULT_UPDATE_SEED;
