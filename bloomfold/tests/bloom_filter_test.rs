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
use bloomfold::similarity::exact_jaccard;
use googletest::assert_that;
use googletest::prelude::contains_substring;
use googletest::prelude::eq;
use googletest::prelude::le;
use googletest::prelude::near;

fn terms(range: std::ops::Range<u32>) -> Vec<String> {
    range.map(|i| format!("GO:{i:07}")).collect()
}

fn filter_of(items: &[String]) -> BloomFilter {
    let mut filter = BloomFilterBuilder::with_accuracy(1000, 0.01).build().unwrap();
    for item in items {
        filter.insert(item);
    }
    filter
}

#[test]
fn test_no_false_negatives() {
    let items = terms(0..1000);
    let filter = filter_of(&items);
    for item in &items {
        assert!(filter.contains(item), "missing {item}");
    }
}

#[test]
fn test_false_positive_rate_near_target() {
    let filter = filter_of(&terms(0..1000));
    let absent = terms(1_000_000..1_010_000);
    let false_positives = absent.iter().filter(|p| filter.contains(*p)).count();
    let rate = false_positives as f64 / absent.len() as f64;
    assert_that!(rate, le(0.03));
    assert_that!(filter.estimated_fpp(), near(0.01, 0.01));
}

#[test]
fn test_similarity_is_symmetric() {
    let a = filter_of(&terms(0..60));
    let b = filter_of(&terms(30..120));
    assert_eq!(a.similarity(&b).unwrap(), b.similarity(&a).unwrap());
}

#[test]
fn test_self_similarity_is_one() {
    let a = filter_of(&terms(0..200));
    assert_eq!(a.similarity(&a).unwrap(), Some(1.0));
}

#[test]
fn test_similarity_tracks_exact_jaccard() {
    let a_items = terms(0..100);
    let b_items = terms(50..150);
    let exact = exact_jaccard(&a_items, &b_items).unwrap();
    assert_that!(exact, near(1.0 / 3.0, 1e-12));

    let estimate = filter_of(&a_items)
        .similarity(&filter_of(&b_items))
        .unwrap()
        .unwrap();
    assert_that!(estimate, near(exact, 0.05));
}

#[test]
fn test_size_mismatch() {
    let a = BloomFilterBuilder::with_size(1024, 4).build().unwrap();
    let b = BloomFilterBuilder::with_size(2048, 4).build().unwrap();

    let err = a.similarity(&b).unwrap_err();
    assert_that!(err.kind(), eq(ErrorKind::SizeMismatch));
    assert_that!(err.message(), contains_substring("1024 vs 2048"));
}

#[test]
fn test_overfilled_filter_inflates_union() {
    // Inserting 10x the designed capacity saturates the filter, so disjoint
    // sets start to look similar.
    let sparse_a = filter_of(&terms(0..100));
    let sparse_b = filter_of(&terms(100..200));
    let dense_a = filter_of(&terms(0..10_000));
    let dense_b = filter_of(&terms(10_000..20_000));

    let sparse = sparse_a.similarity(&sparse_b).unwrap().unwrap();
    let dense = dense_a.similarity(&dense_b).unwrap().unwrap();
    assert!(dense > sparse, "dense={dense}, sparse={sparse}");
    assert!(dense_a.load_factor() > 0.9);
}
