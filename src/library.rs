// Copyright 2023-2026 Mikael Lund
//
// Licensed under the Apache license, version 2.0 (the "license");
// you may not use this file except in compliance with the license.
// You may obtain a copy of the license at
//
//     http://www.apache.org/licenses/license-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the license is distributed on an "as is" basis,
// without warranties or conditions of any kind, either express or implied.
// See the license for the specific language governing permissions and
// limitations under the license.

//! # Record library
//!
//! Records are stored as `<library>/<potential>/<symbols>/<family>/<calculation>/<uuid>.json`.
//! A candidate record is new unless a record in its directory matches it on every match
//! field. Directories are scanned linearly, in lexical file name order.
//!
//! Only JSON records are read. XML records in a library are never matched, so a
//! candidate that duplicates one is created again.

use crate::document::{Tolerance, Value};
use crate::error::{FsContext, Result};
use std::path::{Path, PathBuf};

/// Record directory of a calculation.
pub fn record_dir(
    library: impl AsRef<Path>,
    potential_id: &str,
    symbols: &[String],
    family: &str,
    calculation: &str,
) -> PathBuf {
    library
        .as_ref()
        .join(potential_id)
        .join(symbols.join("-"))
        .join(family)
        .join(calculation)
}

/// Compares candidate records with the records of a library directory.
#[derive(Debug, Clone)]
pub struct Matcher {
    fields: Vec<Vec<&'static str>>,
    tolerance: Tolerance,
}

impl Matcher {
    /// Match on the given field paths, each starting at the document root.
    pub fn new(fields: Vec<Vec<&'static str>>, tolerance: Tolerance) -> Self {
        Self { fields, tolerance }
    }

    /// True if two records agree on all match fields.
    pub fn is_match(&self, candidate: &Value, existing: &Value) -> bool {
        self.fields.iter().all(|path| {
            self.tolerance
                .matches(candidate.get_path(path), existing.get_path(path))
        })
    }

    /// Path of the first record in `directory` matching the candidate.
    ///
    /// A missing directory holds no records. Only `.json` files are read; `.xml` records
    /// are skipped with a warning and other files are ignored.
    pub fn find_match(&self, directory: &Path, candidate: &Value) -> Result<Option<PathBuf>> {
        if !directory.is_dir() {
            return Ok(None);
        }
        let mut files = Vec::new();
        for entry in std::fs::read_dir(directory).fs_context("list", directory)? {
            files.push(entry.fs_context("list", directory)?.path());
        }
        files.sort();

        for path in files {
            match path.extension().and_then(|ext| ext.to_str()) {
                Some("json") => {
                    let existing = Value::from_file(&path)?;
                    if self.is_match(candidate, &existing) {
                        return Ok(Some(path));
                    }
                }
                Some("xml") => log::warn!("skipping unsupported XML record {}", path.display()),
                _ => log::trace!("ignoring {}", path.display()),
            }
        }
        Ok(None)
    }

    /// True if no record in `directory` matches; a missing directory is created.
    pub fn is_new_record(&self, directory: &Path, candidate: &Value) -> Result<bool> {
        if !directory.is_dir() {
            std::fs::create_dir_all(directory).fs_context("create", directory)?;
            return Ok(true);
        }
        match self.find_match(directory, candidate)? {
            Some(existing) => {
                log::debug!("duplicate of {}", existing.display());
                Ok(false)
            }
            None => Ok(true),
        }
    }
}
