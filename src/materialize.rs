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

//! # Run directories
//!
//! A new record gets a run directory `<run_directory>/<uuid>` holding the rendered script,
//! the auxiliary calculation files and, optionally, copies of the potential and load files.
//! Nothing is cleaned up if a step fails.

use crate::calculation::{Calculation, CalculationFiles};
use crate::document::Value;
use crate::error::{input_error, FsContext, Result};
use crate::load::split_load_term;
use crate::template::Template;
use crate::variables::CalculationVariables;
use rand::Rng;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Random seeds are drawn from this range.
pub const RANDOM_SEED_RANGE: std::ops::RangeInclusive<i64> = 1..=900_000_000;

/// Creates run directories and persists records.
#[derive(Debug)]
pub struct Materializer<'a> {
    calculation: &'a dyn Calculation,
    files: &'a CalculationFiles,
    template: &'a Template,
}

impl<'a> Materializer<'a> {
    pub fn new(
        calculation: &'a dyn Calculation,
        files: &'a CalculationFiles,
        template: &'a Template,
    ) -> Self {
        Self {
            calculation,
            files,
            template,
        }
    }

    /// Create a run for a new record and save the record in `record_dir`.
    ///
    /// Returns the UUID shared by the run directory and the record.
    pub fn materialize(
        &self,
        variables: &CalculationVariables,
        copy_files: bool,
        mut record: Value,
        record_dir: &Path,
    ) -> Result<String> {
        let uuid = Uuid::new_v4().to_string();
        let run_root = PathBuf::from(variables.get_or_empty("run_directory"));
        let run_dir = run_root.join(&uuid);
        std::fs::create_dir_all(&run_root).fs_context("create", &run_root)?;
        std::fs::create_dir(&run_dir).fs_context("create", &run_dir)?;

        for file in self.files.auxiliary() {
            copy_into(file, &run_dir)?;
        }

        let mut variables = variables.clone();
        if copy_files {
            self.copy_dependencies(&mut variables, &run_dir)?;
        }
        if variables.get_or_empty("random_seed").is_empty() {
            let seed = rand::thread_rng().gen_range(RANDOM_SEED_RANGE);
            variables.set("random_seed", seed.to_string());
        }

        let script = run_dir.join(format!("{}.in", self.calculation.script()));
        let text = self.template.render(&variables)?;
        std::fs::write(&script, text).fs_context("write", &script)?;

        record.set_path(&[self.calculation.record_root(), "key"], uuid.as_str());
        let record_file = record_dir.join(format!("{uuid}.json"));
        record.to_file(&record_file)?;

        log::info!("new run {} in {}", uuid, run_root.display());
        Ok(uuid)
    }

    /// Copy potential and load files into the run directory and refer to them by name.
    fn copy_dependencies(&self, variables: &mut CalculationVariables, run_dir: &Path) -> Result<()> {
        let potential_file = PathBuf::from(variables.get_or_empty("potential_file"));
        copy_into(&potential_file, run_dir)?;
        variables.set("potential_file", file_name(&potential_file)?.to_string_lossy());

        let potential_dir = PathBuf::from(variables.get_or_empty("potential_dir"));
        if !potential_dir.as_os_str().is_empty() {
            let name = file_name(&potential_dir)?;
            copy_dir(&potential_dir, &run_dir.join(name))?;
            variables.set("potential_dir", name.to_string_lossy());
        }

        let (style, load_file) = split_load_term(variables.get_or_empty("load"))?;
        copy_into(&load_file, run_dir)?;
        variables.set(
            "load",
            format!("{} {}", style, file_name(&load_file)?.to_string_lossy()),
        );
        Ok(())
    }
}

fn file_name(path: &Path) -> Result<&OsStr> {
    path.file_name()
        .ok_or_else(|| input_error!("'{}' does not name a file", path.display()))
}

/// Copy a file into a directory, keeping its name.
fn copy_into(file: &Path, directory: &Path) -> Result<()> {
    let target = directory.join(file_name(file)?);
    std::fs::copy(file, &target).fs_context("copy", file)?;
    Ok(())
}

/// Copy a directory tree into a new directory `target`.
fn copy_dir(source: &Path, target: &Path) -> Result<()> {
    std::fs::create_dir(target).fs_context("create", target)?;
    for entry in std::fs::read_dir(source).fs_context("list", source)? {
        let path = entry.fs_context("list", source)?.path();
        if path.is_dir() {
            copy_dir(&path, &target.join(file_name(&path)?))?;
        } else {
            copy_into(&path, target)?;
        }
    }
    Ok(())
}
