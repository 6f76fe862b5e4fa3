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

//! # Calculation styles
//!
//! A [`Calculation`] describes which keywords a calculation style accepts, how they are
//! enumerated, and how a parsed input is turned into a record. The files needed to run a
//! calculation (template and auxiliary files) are collected in [`CalculationFiles`].

use crate::document::Value;
use crate::error::{ConfigError, FsContext, Result};
use crate::input::CalculationInput;
use derive_getters::Getters;
use std::ffi::OsStr;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

mod equilibrium;

pub use equilibrium::Equilibrium;

/// Interface for calculation styles.
pub trait Calculation: Debug {
    /// Calculation type, e.g. `equilibrium`.
    fn name(&self) -> &'static str;

    /// One-line description.
    fn description(&self) -> &'static str;

    /// Keywords read from inline terms and global variables.
    fn keywords(&self) -> &'static [&'static str];

    /// Keywords that must have a single value, with an optional default.
    fn singular_keywords(&self) -> &'static [(&'static str, Option<&'static str>)];

    /// Template keywords that are always blank.
    fn unused_keywords(&self) -> &'static [&'static str] {
        &[]
    }

    /// Value used when an iterated keyword has no values.
    fn iterated_defaults(&self) -> &'static [(&'static str, &'static str)];

    /// Groups of co-varying keywords, outermost loop first.
    fn axes(&self) -> &'static [&'static [&'static str]];

    /// Root element of records produced by this calculation.
    fn record_root(&self) -> &'static str;

    /// Fields, below the record root, that must match for two records to be duplicates.
    fn match_fields(&self) -> &'static [&'static [&'static str]];

    /// Script name without extension, e.g. `calc_equilibrium`.
    fn script(&self) -> String {
        format!("calc_{}", self.name())
    }

    /// Build a record from a parsed input. The record key is left unset.
    fn data_model(&self, input: &CalculationInput) -> Result<Value>;

    /// Full paths, from the document root, of all match fields.
    fn match_paths(&self) -> Vec<Vec<&'static str>> {
        self.match_fields()
            .iter()
            .map(|field| {
                std::iter::once(self.record_root())
                    .chain(field.iter().copied())
                    .collect()
            })
            .collect()
    }
}

/// Available calculation styles.
pub fn calculations() -> Vec<Box<dyn Calculation>> {
    vec![Box::new(Equilibrium)]
}

/// Look up a calculation style by name.
pub fn calculation_by_name(name: &str) -> std::result::Result<Box<dyn Calculation>, ConfigError> {
    calculations()
        .into_iter()
        .find(|calculation| calculation.name() == name)
        .ok_or_else(|| ConfigError::UnknownCalculation(name.to_string()))
}

/// Template and auxiliary files of a calculation.
#[derive(Debug, Clone, Getters)]
pub struct CalculationFiles {
    directory: PathBuf,
    /// Template text
    template: String,
    /// Auxiliary files, sorted by name
    auxiliary: Vec<PathBuf>,
}

impl CalculationFiles {
    /// Read `calc_<name>.template` from a directory; all other regular files are auxiliary.
    pub fn from_dir(directory: impl AsRef<Path>, calculation: &dyn Calculation) -> Result<Self> {
        let directory = directory.as_ref();
        let template_name = format!("{}.template", calculation.script());
        let template_path = directory.join(&template_name);
        let template = std::fs::read_to_string(&template_path).fs_context("read", &template_path)?;

        let mut auxiliary = Vec::new();
        for entry in std::fs::read_dir(directory).fs_context("list", directory)? {
            let path = entry.fs_context("list", directory)?.path();
            if path.is_file() && path.file_name() != Some(OsStr::new(&template_name)) {
                auxiliary.push(path);
            }
        }
        auxiliary.sort();
        log::debug!(
            "{} auxiliary file(s) for {} in {}",
            auxiliary.len(),
            calculation.name(),
            directory.display()
        );

        Ok(Self {
            directory: directory.to_path_buf(),
            template,
            auxiliary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_name() {
        assert_eq!(calculation_by_name("equilibrium").unwrap().name(), "equilibrium");
        assert!(matches!(
            calculation_by_name("E_vs_r_scan"),
            Err(ConfigError::UnknownCalculation(_))
        ));
    }

    #[test]
    fn match_paths_start_at_root() {
        let paths = Equilibrium.match_paths();
        assert_eq!(paths.len(), 10);
        assert!(paths
            .iter()
            .all(|path| path[0] == "calculation-system-equilibrium"));
        assert_eq!(paths[5], ["calculation-system-equilibrium", "potential", "id"]);
    }

    #[test]
    fn read_calculation_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("calc_equilibrium.template"), "T <temperature>").unwrap();
        std::fs::write(dir.path().join("b.py"), "").unwrap();
        std::fs::write(dir.path().join("a.txt"), "").unwrap();
        std::fs::create_dir(dir.path().join("subdir")).unwrap();

        let files = CalculationFiles::from_dir(dir.path(), &Equilibrium).unwrap();
        assert_eq!(files.template(), "T <temperature>");
        let names: Vec<_> = files
            .auxiliary()
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, ["a.txt", "b.py"]);
    }

    #[test]
    fn missing_template() {
        let dir = tempfile::tempdir().unwrap();
        let err = CalculationFiles::from_dir(dir.path(), &Equilibrium).unwrap_err();
        assert!(err.to_string().contains("calc_equilibrium.template"));
    }
}
