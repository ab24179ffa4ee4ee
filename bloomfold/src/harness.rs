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

//! Concurrent benchmark harness.
//!
//! [`Harness::run`] calls a similarity function once per dataset key on a
//! fixed pool of worker threads, times every call, and aggregates the results
//! into size-bucketed totals.
//!
//! A run moves through four phases:
//! - *idle*: queues are created and the worker pool is about to start,
//! - *dispatching*: the calling thread pushes one unit per key into a bounded
//!   work queue shared by all workers,
//! - *draining*: the work queue is closed, workers finish, and a single
//!   aggregator thread consumes their records from the results queue,
//! - *done*: all threads are joined and the report is returned.
//!
//! Workers only borrow the dataset and whatever the function captures, so a
//! populated [`BloomSet`](crate::collection::BloomSet) can be queried from
//! every worker without locks.
//!
//! # Usage
//!
//! ```rust
//! use bloomfold::collection::BloomSet;
//! use bloomfold::dataset::load_tsv;
//! use bloomfold::harness::Harness;
//!
//! let dataset = load_tsv("a\tx\ty\nb\tx\ty\nc\tz\n".as_bytes()).unwrap();
//! let set = BloomSet::from_dataset(100, &dataset).unwrap();
//!
//! let report = Harness::default()
//!     .run(&dataset, |_key, items| {
//!         Ok(set.best_matches(items, 10)?.num_above_threshold)
//!     })
//!     .unwrap();
//!
//! assert_eq!(report.totals.overall().units, 3);
//! assert_eq!(report.totals.overall().results, 5);
//! ```

use std::fmt;
use std::num::NonZeroUsize;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use crossbeam_channel::Receiver;

use crate::dataset::Dataset;
use crate::error::Error;
use crate::error::ErrorKind;

/// Harness configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Number of worker threads.
    pub workers: usize,
    /// Capacity of the work and results queues.
    pub queue_capacity: usize,
    /// Item-count width of each size bucket.
    pub bucket_width: usize,
    /// Number of size buckets; the last one catches all larger inputs.
    pub bucket_splits: usize,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        let workers = thread::available_parallelism().map_or(1, NonZeroUsize::get);
        Self {
            workers,
            queue_capacity: 2 * workers,
            bucket_width: 50,
            bucket_splits: 3,
        }
    }
}

/// Outcome of one unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitRecord {
    pub key: String,
    pub item_count: usize,
    pub result_count: usize,
    pub elapsed: Duration,
}

/// Running totals for one bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bucket {
    /// Number of records added.
    pub units: u64,
    /// Sum of result counts.
    pub results: u64,
    /// Sum of per-unit elapsed time.
    pub elapsed: Duration,
}

impl Bucket {
    fn add(&mut self, record: &UnitRecord) {
        self.units += 1;
        self.results += record.result_count as u64;
        self.elapsed += record.elapsed;
    }
}

/// Per-bucket ratios of two runs, see [`BucketTotals::compare`].
#[derive(Debug, Clone, PartialEq)]
pub struct BucketRatio {
    pub label: String,
    /// Elapsed time relative to the baseline; `None` if the baseline took no time.
    pub time_ratio: Option<f64>,
    /// Result count relative to the baseline; `None` if the baseline found nothing.
    pub result_ratio: Option<f64>,
}

/// Totals for the overall bucket (index 0) and `splits` size buckets.
///
/// A record with `n` items lands in bucket 0 and in bucket
/// `min(1 + n / width, splits)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketTotals {
    width: usize,
    splits: usize,
    buckets: Vec<Bucket>,
}

impl BucketTotals {
    /// Creates empty totals. `width` and `splits` are validated by
    /// [`Harness::try_new`].
    pub(crate) fn new(width: usize, splits: usize) -> Self {
        debug_assert!(width > 0 && splits > 0);
        Self {
            width,
            splits,
            buckets: vec![Bucket::default(); splits + 1],
        }
    }

    /// Returns the size bucket for an input of `item_count` items.
    pub fn bucket_of(&self, item_count: usize) -> usize {
        (1 + item_count / self.width).min(self.splits)
    }

    /// Adds a record to the overall bucket and its size bucket.
    pub fn add(&mut self, record: &UnitRecord) {
        let bucket = self.bucket_of(record.item_count);
        self.buckets[0].add(record);
        self.buckets[bucket].add(record);
    }

    /// Returns the overall bucket.
    pub fn overall(&self) -> &Bucket {
        &self.buckets[0]
    }

    /// Returns bucket `index`, 0 being the overall bucket.
    pub fn get(&self, index: usize) -> Option<&Bucket> {
        self.buckets.get(index)
    }

    /// Returns all buckets, overall first.
    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    /// Returns a display label such as `all`, `0-49` or `>=100`, or `None`
    /// if `index` is past the last size bucket.
    pub fn label(&self, index: usize) -> Option<String> {
        let lo = index.saturating_sub(1) * self.width;
        let label = match index {
            0 => "all".to_string(),
            i if i > self.splits => return None,
            i if i == self.splits => format!(">={lo}"),
            _ => format!("{lo}-{}", lo + self.width - 1),
        };
        Some(label)
    }

    /// Divides every bucket of `self` by the matching bucket of `baseline`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::SizeMismatch`] if the two totals use different
    /// bucket layouts.
    pub fn compare(&self, baseline: &BucketTotals) -> Result<Vec<BucketRatio>, Error> {
        if self.width != baseline.width || self.splits != baseline.splits {
            return Err(
                Error::size_mismatch("bucket layouts", self.splits, baseline.splits)
                    .with_context("width", self.width)
                    .with_context("baseline_width", baseline.width),
            );
        }

        let ratio = |a: f64, b: f64| (b != 0.0).then(|| a / b);
        Ok(self
            .buckets
            .iter()
            .zip(&baseline.buckets)
            .enumerate()
            .map(|(i, (ours, base))| BucketRatio {
                label: self.label(i).unwrap_or_default(),
                time_ratio: ratio(ours.elapsed.as_secs_f64(), base.elapsed.as_secs_f64()),
                result_ratio: ratio(ours.results as f64, base.results as f64),
            })
            .collect())
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub totals: BucketTotals,
    /// One record per key, in completion order.
    pub records: Vec<UnitRecord>,
    /// Wall-clock time of the whole run.
    pub wall_time: Duration,
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Idle,
    Dispatching,
    Draining,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Dispatching => "dispatching",
            Phase::Draining => "draining",
            Phase::Done => "done",
        };
        f.write_str(name)
    }
}

/// Fixed-size worker pool feeding a single aggregator.
#[derive(Debug, Clone, Default)]
pub struct Harness {
    config: HarnessConfig,
}

impl Harness {
    /// Creates a harness from explicit config.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ConfigInvalid`] when any config value is zero.
    pub fn try_new(config: HarnessConfig) -> Result<Self, Error> {
        let fields = [
            ("workers", config.workers),
            ("queue_capacity", config.queue_capacity),
            ("bucket_width", config.bucket_width),
            ("bucket_splits", config.bucket_splits),
        ];
        if let Some((name, _)) = fields.iter().find(|(_, value)| *value == 0) {
            return Err(
                Error::config_invalid("harness config values must be greater than zero")
                    .with_context("field", name),
            );
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Runs `f` once for every key of `dataset` and aggregates the results.
    ///
    /// `f` receives the key and its items and returns a result count (for
    /// example the number of matches above a threshold). Every unit runs to
    /// completion; there is no cancellation.
    ///
    /// # Errors
    ///
    /// The run is all-or-nothing:
    /// - the first error returned by `f` is returned,
    /// - a panicking worker fails the run with [`ErrorKind::WorkerPanicked`].
    pub fn run<F>(&self, dataset: &Dataset, f: F) -> Result<RunReport, Error>
    where
        F: Fn(&str, &[String]) -> Result<usize, Error> + Sync,
    {
        let config = self.config;
        let start = Instant::now();
        tracing::debug!(phase = %Phase::Idle, ?config);
        let (work_tx, work_rx) =
            crossbeam_channel::bounded::<(&str, &[String])>(config.queue_capacity);
        let (result_tx, result_rx) =
            crossbeam_channel::bounded::<Result<UnitRecord, Error>>(config.queue_capacity);
        let f = &f;

        let (aggregated, panicked) = thread::scope(|scope| {
            let aggregator = scope.spawn(move || {
                aggregate(
                    result_rx,
                    BucketTotals::new(config.bucket_width, config.bucket_splits),
                )
            });

            let workers: Vec<_> = (0..config.workers)
                .map(|_| {
                    let work_rx = work_rx.clone();
                    let result_tx = result_tx.clone();
                    scope.spawn(move || {
                        for (key, items) in work_rx {
                            let unit_start = Instant::now();
                            let outcome = f(key, items).map(|result_count| UnitRecord {
                                key: key.to_string(),
                                item_count: items.len(),
                                result_count,
                                elapsed: unit_start.elapsed(),
                            });
                            if result_tx.send(outcome).is_err() {
                                break;
                            }
                        }
                    })
                })
                .collect();
            drop(work_rx);
            drop(result_tx);

            tracing::debug!(
                phase = %Phase::Dispatching,
                workers = config.workers,
                units = dataset.len()
            );
            for (key, items) in dataset {
                // Fails only once every worker is gone.
                if work_tx.send((key.as_str(), items.as_slice())).is_err() {
                    break;
                }
            }
            drop(work_tx);

            tracing::debug!(phase = %Phase::Draining);
            let panicked = workers
                .into_iter()
                .map(thread::ScopedJoinHandle::join)
                .filter(Result::is_err)
                .count();
            (aggregator.join(), panicked)
        });

        let (totals, records) = match aggregated {
            Ok(aggregated) => aggregated?,
            Err(_) => return Err(Error::new(ErrorKind::WorkerPanicked, "aggregator panicked")),
        };
        if panicked > 0 {
            return Err(
                Error::new(ErrorKind::WorkerPanicked, "benchmark worker panicked")
                    .with_context("panicked", panicked),
            );
        }
        debug_assert_eq!(records.len(), dataset.len());

        let wall_time = start.elapsed();
        tracing::info!(
            phase = %Phase::Done,
            units = records.len(),
            results = totals.overall().results,
            ?wall_time,
            "harness run complete"
        );
        Ok(RunReport {
            totals,
            records,
            wall_time,
        })
    }
}

/// Drains the results queue until every worker has hung up.
///
/// Keeps draining after the first error so no worker blocks on a full queue.
fn aggregate(
    results: Receiver<Result<UnitRecord, Error>>,
    mut totals: BucketTotals,
) -> Result<(BucketTotals, Vec<UnitRecord>), Error> {
    let mut records = Vec::new();
    let mut first_error = None;
    for outcome in results {
        match outcome {
            Ok(record) => {
                totals.add(&record);
                records.push(record);
            }
            Err(err) => {
                tracing::warn!(error = %err, "benchmark unit failed");
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
    }
    match first_error {
        Some(err) => Err(err),
        None => Ok((totals, records)),
    }
}
