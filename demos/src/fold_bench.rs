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

//! Benchmarks Bloom and folded Bloom similarity search over a TSV dataset.
//!
//! Each line of the input is `key<TAB>item<TAB>item...`. Every key is used
//! once as a query against the whole dataset, and the per-bucket time and
//! match-count ratios of the folded stage against the full Bloom stage are
//! printed as `<bucket> <speedup> <errdiff>`.
//!
//! With `--exact` the exact Jaccard stage runs first and both Bloom stages
//! are also reported against it. `--per-key` adds one
//! `<key> <exact> <bloom> <folded>` line of match counts per key.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;

use bloomfold::collection::BloomSet;
use bloomfold::collection::exact_best_matches;
use bloomfold::dataset::estimate_population;
use bloomfold::dataset::load_tsv_file;
use bloomfold::harness::Harness;
use bloomfold::harness::HarnessConfig;
use bloomfold::harness::RunReport;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(about = "Compare exact, Bloom and folded Bloom set similarity")]
struct Args {
    /// Tab-delimited dataset, one `key<TAB>items...` record per line.
    input: PathBuf,

    /// Size of the sampled population; estimated from the input when 0.
    #[arg(short = 'n', long, default_value_t = 0)]
    population: u64,

    /// Folding size in bits.
    #[arg(short = 'f', long, default_value_t = 1024)]
    fold_bits: u64,

    /// Number of best matches kept per query.
    #[arg(short = 't', long, default_value_t = 10)]
    top_n: usize,

    /// Worker threads; defaults to the available parallelism.
    #[arg(short = 'w', long)]
    workers: Option<usize>,

    /// Also run the exact Jaccard stage.
    #[arg(long)]
    exact: bool,

    /// Print match counts of every stage for each key.
    #[arg(long)]
    per_key: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let start = Instant::now();
    let dataset = load_tsv_file(&args.input)?;
    let population = match args.population {
        0 => {
            let population = estimate_population(&dataset) as u64;
            tracing::info!(population, "measured population; pass -n {population} to skip");
            population
        }
        n => n,
    };
    let mut set = BloomSet::from_dataset(population, &dataset)?;
    tracing::info!(keys = dataset.len(), elapsed = ?start.elapsed(), "loading complete");

    let mut config = HarnessConfig::default();
    if let Some(workers) = args.workers {
        config.workers = workers;
        config.queue_capacity = 2 * workers;
    }
    let harness = Harness::try_new(config)?;
    let top_n = args.top_n;

    let exact = if args.exact {
        let exact = harness.run(&dataset, |_, items| {
            Ok(exact_best_matches(&dataset, items, top_n).num_above_threshold)
        })?;
        log_stage("direct", &exact);
        Some(exact)
    } else {
        None
    };

    let bloom = harness.run(&dataset, |_, items| {
        Ok(set.best_matches(items, top_n)?.num_above_threshold)
    })?;
    log_stage("bloom", &bloom);

    set.fold_all(args.fold_bits)?;

    let folded = harness.run(&dataset, |_, items| {
        Ok(set.folded_best_matches(items, top_n)?.num_above_threshold)
    })?;
    log_stage("folded", &folded);

    print_comparison("folded vs bloom", &folded, &bloom)?;
    if let Some(exact) = &exact {
        print_comparison("bloom vs direct", &bloom, exact)?;
        print_comparison("folded vs direct", &folded, exact)?;
    }
    if args.per_key {
        print_per_key(exact.as_ref(), &bloom, &folded);
    }
    Ok(())
}

fn print_comparison(title: &str, ours: &RunReport, baseline: &RunReport) -> anyhow::Result<()> {
    println!("# {title}");
    for ratio in ours.totals.compare(&baseline.totals)? {
        println!(
            "{} {} {}",
            ratio.label,
            fmt_ratio(ratio.time_ratio),
            fmt_ratio(ratio.result_ratio)
        );
    }
    Ok(())
}

fn print_per_key(exact: Option<&RunReport>, bloom: &RunReport, folded: &RunReport) {
    let exact = exact.map(result_counts);
    let folded = result_counts(folded);

    println!("# key direct bloom folded");
    for record in &bloom.records {
        let key = record.key.as_str();
        let direct = exact
            .as_ref()
            .and_then(|counts| counts.get(key))
            .map_or_else(|| "-".to_string(), ToString::to_string);
        let folded_count = folded.get(key).map_or_else(|| "-".to_string(), ToString::to_string);
        println!("{key} {direct} {} {folded_count}", record.result_count);
    }
}

fn result_counts(report: &RunReport) -> HashMap<&str, usize> {
    report
        .records
        .iter()
        .map(|r| (r.key.as_str(), r.result_count))
        .collect()
}

fn log_stage(stage: &str, report: &RunReport) {
    tracing::info!(
        stage,
        wall_time = ?report.wall_time,
        matches = report.totals.overall().results,
        "search completed"
    );
}

fn fmt_ratio(ratio: Option<f64>) -> String {
    ratio.map_or_else(|| "n/a".to_string(), |r| format!("{r:.4}"))
}
