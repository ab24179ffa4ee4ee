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

use std::time::Duration;

use bloomfold::collection::BloomSet;
use bloomfold::collection::exact_best_matches;
use bloomfold::dataset::Dataset;
use bloomfold::error::Error;
use bloomfold::error::ErrorKind;
use bloomfold::harness::Harness;
use bloomfold::harness::HarnessConfig;
use bloomfold::harness::RunReport;
use googletest::assert_that;
use googletest::prelude::contains_substring;
use googletest::prelude::eq;

fn dataset_of_sizes(sizes: &[usize]) -> Dataset {
    sizes
        .iter()
        .map(|&n| {
            let items = (0..n).map(|i| format!("item{i}")).collect();
            (format!("key{n}"), items)
        })
        .collect()
}

fn harness(workers: usize) -> Harness {
    Harness::try_new(HarnessConfig {
        workers,
        queue_capacity: 2,
        bucket_width: 50,
        bucket_splits: 3,
    })
    .unwrap()
}

#[test]
fn test_each_key_lands_in_overall_and_one_bucket() {
    let dataset = dataset_of_sizes(&[10, 60, 160]);
    let report = harness(4)
        .run(&dataset, |_, items| Ok(items.len() / 10))
        .unwrap();
    let totals = &report.totals;

    assert_that!(totals.overall().units, eq(3));
    assert_that!(totals.overall().results, eq(1 + 6 + 16));
    assert_that!(totals.get(1).unwrap().results, eq(1));
    assert_that!(totals.get(2).unwrap().results, eq(6));
    assert_that!(totals.get(3).unwrap().results, eq(16));
    for bucket in 1..=3 {
        assert_that!(totals.get(bucket).unwrap().units, eq(1));
    }

    let per_key: u64 = report.records.iter().map(|r| r.result_count as u64).sum();
    assert_that!(totals.overall().results, eq(per_key));
    let size_buckets: Duration = totals.buckets()[1..].iter().map(|b| b.elapsed).sum();
    assert_eq!(totals.overall().elapsed, size_buckets);
}

#[test]
fn test_every_key_is_processed_once() {
    let sizes: Vec<usize> = (0..200).collect();
    let dataset = dataset_of_sizes(&sizes);
    let report = harness(8).run(&dataset, |_, _| Ok(1)).unwrap();

    assert_eq!(report.records.len(), 200);
    let mut keys: Vec<&str> = report.records.iter().map(|r| r.key.as_str()).collect();
    keys.sort_unstable();
    keys.dedup();
    assert_eq!(keys.len(), 200);
    assert_that!(report.totals.overall().results, eq(200));
}

#[test]
fn test_single_worker() {
    let dataset = dataset_of_sizes(&[1, 2, 3, 70]);
    let report = harness(1).run(&dataset, |_, items| Ok(items.len())).unwrap();
    assert_that!(report.totals.overall().results, eq(76));
    assert_that!(report.totals.get(1).unwrap().units, eq(3));
}

#[test]
fn test_failing_unit_fails_run() {
    let dataset = dataset_of_sizes(&[5, 10, 15]);
    let err = harness(2)
        .run(&dataset, |key, _| {
            if key == "key10" {
                Err(Error::new(ErrorKind::KeyNotFound, "boom"))
            } else {
                Ok(1)
            }
        })
        .unwrap_err();
    assert_that!(err.kind(), eq(ErrorKind::KeyNotFound));
    assert_that!(err.message(), contains_substring("boom"));
}

#[test]
fn test_panicking_unit_fails_run() {
    let dataset = dataset_of_sizes(&[5, 10, 15, 20]);
    let err = harness(2)
        .run(&dataset, |key, _| {
            assert_ne!(key, "key15", "unit panicked on purpose");
            Ok(1)
        })
        .unwrap_err();
    assert_that!(err.kind(), eq(ErrorKind::WorkerPanicked));
}

#[test]
fn test_shared_bloom_set_across_workers() {
    let mut dataset = dataset_of_sizes(&[10, 20, 30]);
    dataset.insert("copy".to_string(), dataset["key20"].clone());
    let mut set = BloomSet::from_dataset(500, &dataset).unwrap();
    set.fold_all(1024).unwrap();

    let bloom = harness(3)
        .run(&dataset, |_, items| Ok(set.best_matches(items, 10)?.num_above_threshold))
        .unwrap();
    let folded = harness(3)
        .run(&dataset, |_, items| {
            Ok(set.folded_best_matches(items, 10)?.num_above_threshold)
        })
        .unwrap();

    // key20 and copy match each other, everything matches itself.
    assert_that!(bloom.totals.overall().results, eq(6));
    assert!(folded.totals.overall().results >= bloom.totals.overall().results);

    let ratios = folded.totals.compare(&bloom.totals).unwrap();
    assert_that!(ratios.len(), eq(4));
    assert_eq!(ratios[0].label, "all");
    assert!(ratios[0].result_ratio.unwrap() >= 1.0);
}

#[test]
fn test_bloom_stage_compared_against_exact_stage() {
    let mut dataset = dataset_of_sizes(&[10, 20, 30]);
    dataset.insert("copy".to_string(), dataset["key20"].clone());
    let set = BloomSet::from_dataset(500, &dataset).unwrap();

    let exact = harness(2)
        .run(&dataset, |_, items| {
            Ok(exact_best_matches(&dataset, items, 10).num_above_threshold)
        })
        .unwrap();
    let bloom = harness(2)
        .run(&dataset, |_, items| Ok(set.best_matches(items, 10)?.num_above_threshold))
        .unwrap();

    assert_that!(exact.totals.overall().results, eq(6));
    let ratios = bloom.totals.compare(&exact.totals).unwrap();
    assert_eq!(ratios[0].label, "all");
    assert_eq!(ratios[0].result_ratio, Some(1.0));

    let copy_count = |report: &RunReport| {
        report.records.iter().find(|r| r.key == "copy").map(|r| r.result_count)
    };
    assert_eq!(copy_count(&exact), Some(2));
    assert_eq!(copy_count(&bloom), Some(2));
}
