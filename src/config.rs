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

//! # YAML input files
//!
//! ~~~ yaml
//! variables:
//!   potentials: [pots/A.json, pots/B.json]
//! tolerance:
//!   relative: 1.0e-9
//!   absolute: 1.0e-9
//! prepare:
//!   - calculation: equilibrium
//!     terms:
//!       potential_file: potentials
//!       temperature: [100, 300]
//! ~~~
//!
//! Scalars become single values and lists become multiple values; numbers and booleans
//! are converted to strings and a missing value is a single blank value.

use crate::document::Tolerance;
use crate::error::ConfigError;
use crate::variables::Terms;
use anyhow::Context;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_yaml::Value as YamlValue;
use std::path::{Path, PathBuf};

/// Contents of an input file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputFile {
    /// Global variables available to all prepare blocks
    #[serde(default)]
    variables: IndexMap<String, YamlValue>,
    /// Tolerance for matching numbers in records
    #[serde(default)]
    pub tolerance: Tolerance,
    /// Prepare blocks, run in order
    pub prepare: Vec<PrepareBlock>,
    /// Directory of the input file
    #[serde(skip)]
    base_dir: PathBuf,
}

/// One calculation style and its inline terms.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrepareBlock {
    pub calculation: String,
    /// Directory with the template and auxiliary files
    #[serde(default)]
    calc_files: Option<PathBuf>,
    #[serde(default)]
    terms: IndexMap<String, YamlValue>,
}

impl InputFile {
    /// Read and validate an input file.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("Could not open input file {}", path.display()))?;
        let mut input: Self = serde_yaml::from_reader(file)
            .with_context(|| format!("Could not parse input file {}", path.display()))?;
        input.tolerance.check()?;
        input.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(input)
    }

    /// Parse from a string; relative paths are resolved against `base_dir`.
    pub fn from_yaml(yaml: &str, base_dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let mut input: Self = serde_yaml::from_str(yaml)?;
        input.tolerance.check()?;
        input.base_dir = base_dir.into();
        Ok(input)
    }

    /// Global variables as lists of strings.
    pub fn global_terms(&self) -> Result<Terms, ConfigError> {
        to_terms(&self.variables)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

impl PrepareBlock {
    /// Inline terms as lists of strings.
    pub fn terms(&self) -> Result<Terms, ConfigError> {
        to_terms(&self.terms)
    }

    /// Calculation file directory, by default `calc_files/<calculation>`.
    pub fn calc_files(&self, base_dir: &Path) -> PathBuf {
        match &self.calc_files {
            Some(dir) => base_dir.join(dir),
            None => base_dir.join("calc_files").join(&self.calculation),
        }
    }
}

fn to_terms(map: &IndexMap<String, YamlValue>) -> Result<Terms, ConfigError> {
    map.iter()
        .map(|(keyword, value)| Ok((keyword.clone(), to_strings(keyword, value)?)))
        .collect()
}

/// Flatten a scalar or a list of scalars.
fn to_strings(keyword: &str, value: &YamlValue) -> Result<Vec<String>, ConfigError> {
    match value {
        YamlValue::Null => Ok(vec![String::new()]),
        YamlValue::Sequence(items) => items
            .iter()
            .map(|item| {
                scalar_to_string(item).ok_or_else(|| ConfigError::InvalidValue {
                    keyword: keyword.to_string(),
                    reason: "lists may only hold scalars".to_string(),
                })
            })
            .collect(),
        other => scalar_to_string(other)
            .map(|s| vec![s])
            .ok_or_else(|| ConfigError::InvalidValue {
                keyword: keyword.to_string(),
                reason: "expected a scalar or a list".to_string(),
            }),
    }
}

fn scalar_to_string(value: &YamlValue) -> Option<String> {
    match value {
        YamlValue::Null => Some(String::new()),
        YamlValue::Bool(b) => Some(b.to_string()),
        YamlValue::Number(n) => Some(n.to_string()),
        YamlValue::String(s) => Some(s.clone()),
        _ => None,
    }
}
