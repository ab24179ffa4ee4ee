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

use bloomfold::bloom::BloomFilter;
use bloomfold::bloom::BloomFilterBuilder;
use bloomfold::error::ErrorKind;
use googletest::assert_that;
use googletest::prelude::eq;
use googletest::prelude::ge;
use googletest::prelude::near;

fn filter_of(prefix: &str, count: usize) -> BloomFilter {
    let mut filter = BloomFilterBuilder::with_accuracy(2000, 0.01).build().unwrap();
    for i in 0..count {
        filter.insert(&format!("{prefix}{i}"));
    }
    filter
}

#[test]
fn test_fold_twice_is_identical() {
    let filter = filter_of("t", 300);
    let a = filter.fold(1000).unwrap();
    let b = filter.fold(1000).unwrap();
    assert_eq!(a.as_words(), b.as_words());
}

#[test]
fn test_folded_popcount_bounds() {
    let filter = filter_of("t", 300);
    let folded = filter.fold(2048).unwrap();
    assert_that!(filter.bits_used(), ge(folded.bits_used()));
    assert_that!(folded.num_words(), eq(33));
}

#[test]
fn test_folded_self_similarity() {
    let folded = filter_of("t", 40).fold(512).unwrap();
    assert_eq!(folded.similarity(&folded).unwrap(), Some(1.0));
}

#[test]
fn test_folded_similarity_is_symmetric() {
    let a = filter_of("t", 40).fold(512).unwrap();
    let b = filter_of("u", 40).fold(512).unwrap();
    assert_eq!(a.similarity(&b).unwrap(), b.similarity(&a).unwrap());
}

#[test]
fn test_smaller_folds_overestimate_disjoint_sets() {
    let a = filter_of("t", 50);
    let b = filter_of("u", 50);

    let wide = a.fold(8192).unwrap().similarity(&b.fold(8192).unwrap()).unwrap().unwrap();
    let narrow = a.fold(128).unwrap().similarity(&b.fold(128).unwrap()).unwrap().unwrap();
    assert_that!(wide, near(0.0, 0.05));
    assert!(narrow > wide, "narrow={narrow}, wide={wide}");
}

#[test]
fn test_mixed_fold_sizes_do_not_compare() {
    let filter = filter_of("t", 10);
    let err = filter
        .fold(128)
        .unwrap()
        .similarity(&filter.fold(4096).unwrap())
        .unwrap_err();
    assert_that!(err.kind(), eq(ErrorKind::SizeMismatch));
}

#[test]
fn test_fold_to_fit_keeps_members() {
    let filter = filter_of("t", 100);
    let folded = filter.fold_to_fit().unwrap();
    // 19171 bits / 2000 items * 100 items ~= 959 bits, rounded up to 1024.
    assert_that!(folded.num_words(), eq(17));
    for i in 0..100 {
        assert!(folded.contains(&format!("t{i}")));
    }
}
