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

//! Loading labeled item-sets from tab-delimited text.
//!
//! Each line is `key<TAB>item<TAB>item...`. A later line with the same key
//! replaces the earlier one.

use std::collections::HashMap;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::path::Path;

use crate::error::Error;

/// Item lists keyed by set label.
pub type Dataset = HashMap<String, Vec<String>>;

/// Parses a dataset from tab-delimited lines.
///
/// Blank lines are skipped. A line holding only a key yields an empty item
/// list.
///
/// # Errors
///
/// Returns [`ErrorKind::InvalidData`](crate::error::ErrorKind::InvalidData)
/// if reading fails, including on invalid UTF-8.
///
/// # Examples
///
/// ```
/// use bloomfold::dataset::load_tsv;
///
/// let input = "geneA\tGO:1\tGO:2\ngeneB\tGO:2\n";
/// let dataset = load_tsv(input.as_bytes()).unwrap();
/// assert_eq!(dataset["geneA"], ["GO:1", "GO:2"]);
/// ```
pub fn load_tsv<R: BufRead>(reader: R) -> Result<Dataset, Error> {
    let mut dataset = Dataset::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line.map_err(|err| {
            Error::invalid_data("failed to read dataset line")
                .with_context("line", lineno + 1)
                .set_source(err)
        })?;
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }

        let mut fields = line.split('\t');
        let key = fields.next().unwrap_or_default().to_string();
        let items = fields.map(str::to_string).collect();
        dataset.insert(key, items);
    }
    Ok(dataset)
}

/// Opens `path` and parses it with [`load_tsv`].
///
/// # Errors
///
/// Returns [`ErrorKind::InvalidData`](crate::error::ErrorKind::InvalidData)
/// if the file cannot be opened or read.
pub fn load_tsv_file(path: impl AsRef<Path>) -> Result<Dataset, Error> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|err| {
        Error::invalid_data("failed to open dataset")
            .with_context("path", path.display())
            .set_source(err)
    })?;
    let dataset = load_tsv(BufReader::new(file))?;
    tracing::debug!(path = %path.display(), keys = dataset.len(), "loaded dataset");
    Ok(dataset)
}

/// Counts the distinct items across every entry of `dataset`.
///
/// Suitable as the capacity hint for a [`BloomSet`](crate::collection::BloomSet)
/// when no better estimate is known.
pub fn estimate_population(dataset: &Dataset) -> usize {
    dataset
        .values()
        .flatten()
        .map(String::as_str)
        .collect::<HashSet<_>>()
        .len()
}
