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

//! # Prepare
//!
//! Resolve keywords, enumerate all parameter combinations and symbol assignments, and
//! create a run for every record not already in the library.

use crate::calculation::{Calculation, CalculationFiles};
use crate::document::{Tolerance, Value};
use crate::error::{input_error, Result};
use crate::input::CalculationInput;
use crate::library::{record_dir, Matcher};
use crate::materialize::Materializer;
use crate::symbols::{element_slots, SymbolAssignments};
use crate::template::Template;
use crate::variables::{Setup, Terms};
use indicatif::ProgressBar;
use serde::Serialize;
use std::path::PathBuf;

/// Outcome of a prepare run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    /// Calculation type
    pub calculation: String,
    /// Number of parameter combinations
    pub combinations: usize,
    /// Number of records built, i.e. combinations times symbol assignments
    pub candidates: usize,
    /// UUIDs of the new runs
    pub created: Vec<String>,
    /// Candidates already in the library
    pub duplicates: usize,
    /// New candidates not created because of a dry run
    pub pending: usize,
}

/// Prepares calculations of one style.
pub struct Preparer<'a> {
    calculation: &'a dyn Calculation,
    files: &'a CalculationFiles,
    matcher: Matcher,
    dry_run: bool,
    progress: ProgressBar,
}

impl<'a> Preparer<'a> {
    pub fn new(
        calculation: &'a dyn Calculation,
        files: &'a CalculationFiles,
        tolerance: Tolerance,
    ) -> Self {
        Self {
            calculation,
            files,
            matcher: Matcher::new(calculation.match_paths(), tolerance),
            dry_run: false,
            progress: ProgressBar::hidden(),
        }
    }

    /// Enumerate and match, but write nothing.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Report each finished combination to a progress bar.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Run with the given inline terms and global variables.
    pub fn run(&self, inline: &Terms, global: &Terms) -> Result<Summary> {
        let setup = Setup::resolve(self.calculation, inline, global)?;
        let template = Template::angle_brackets(self.files.template())?;
        let materializer = Materializer::new(self.calculation, self.files, &template);

        let combinations = setup
            .combinations
            .len()
            .ok_or_else(|| input_error!("too many parameter combinations"))?;
        let mut summary = Summary {
            calculation: self.calculation.name().to_string(),
            combinations,
            ..Default::default()
        };
        // Records a dry run would have created
        let mut pending: Vec<(PathBuf, Value)> = Vec::new();
        log::info!(
            "{} parameter combination(s) for {}",
            summary.combinations,
            summary.calculation
        );
        self.progress.set_length(summary.combinations as u64);

        for combination in setup.combinations.iter() {
            let mut variables = setup.variables.clone();
            combination.assign_to(&mut variables);
            variables.set("symbols", "");

            let mut input = CalculationInput::read(&template.render(&variables)?)?;
            let slots = element_slots(variables.get_or_empty("load_elements"), &input.load)?;
            let assignments = SymbolAssignments::new(&input.potential, &slots);
            if assignments.is_empty() {
                log::debug!(
                    "no symbols of {} fit {}",
                    input.potential,
                    input.load.file().display()
                );
            }

            for symbols in assignments.iter() {
                summary.candidates += 1;
                let directory = record_dir(
                    variables.get_or_empty("lib_directory"),
                    input.potential.id(),
                    &symbols,
                    input.system_family(),
                    self.calculation.name(),
                );
                input.symbols = symbols;
                let record = self.calculation.data_model(&input)?;

                if self.dry_run {
                    let is_pending = pending.iter().any(|(other_dir, other)| {
                        *other_dir == directory && self.matcher.is_match(&record, other)
                    });
                    if is_pending || self.matcher.find_match(&directory, &record)?.is_some() {
                        summary.duplicates += 1;
                    } else {
                        summary.pending += 1;
                        pending.push((directory, record));
                    }
                } else if self.matcher.is_new_record(&directory, &record)? {
                    let mut run_variables = variables.clone();
                    run_variables.set("symbols", input.symbols.join(" "));
                    let uuid = materializer.materialize(
                        &run_variables,
                        setup.copy_files,
                        record,
                        &directory,
                    )?;
                    summary.created.push(uuid);
                } else {
                    summary.duplicates += 1;
                }
            }
            self.progress.inc(1);
        }
        self.progress.finish_and_clear();

        log::info!(
            "{}: {} new, {} duplicate(s), {} pending",
            summary.calculation,
            summary.created.len(),
            summary.duplicates,
            summary.pending
        );
        Ok(summary)
    }
}
