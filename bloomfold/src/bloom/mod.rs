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

//! Bloom filter implementation for probabilistic set membership and similarity.
//!
//! A [`BloomFilter`] is a bit array of `m` bits where each inserted item sets
//! `k` hashed positions. Two filters with the same `m` can be compared
//! bitwise to estimate the Jaccard index of the sets they hold, and a filter
//! can be folded into a smaller [`FoldedBloomFilter`] to trade accuracy for
//! memory.
//!
//! # Usage
//!
//! ```rust
//! use bloomfold::bloom::BloomFilterBuilder;
//!
//! let mut a = BloomFilterBuilder::with_accuracy(1000, 0.01).build().unwrap();
//! let mut b = BloomFilterBuilder::with_accuracy(1000, 0.01).build().unwrap();
//! for item in ["GO:1", "GO:2", "GO:3"] {
//!     a.insert(item);
//! }
//! for item in ["GO:2", "GO:3", "GO:4"] {
//!     b.insert(item);
//! }
//!
//! let sim = a.similarity(&b).unwrap().unwrap();
//! assert!(sim > 0.3 && sim < 0.7);
//!
//! let fa = a.fold(512).unwrap();
//! let fb = b.fold(512).unwrap();
//! let folded_sim = fa.similarity(&fb).unwrap().unwrap();
//! assert!(folded_sim > 0.0);
//! ```
//!
//! # Sizing
//!
//! Given `n` expected items and a target false positive rate `p`:
//! - `m = ceil(-n ln(p) / ln(2)^2)`
//! - `k = round((m / n) ln(2))`, at least 1
//!
//! Inserting far more than `n` items raises the false positive rate, which
//! inflates the OR term of the similarity estimate.

mod builder;
mod folded;
mod sketch;

pub use self::builder::BloomFilterBuilder;
pub use self::folded::FoldedBloomFilter;
pub use self::sketch::BloomFilter;
