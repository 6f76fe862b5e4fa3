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

//! # Keyword resolution
//!
//! Inline terms and global variables are merged into a [`ParameterSet`] holding a list of
//! values per keyword. Keywords that must be singular are moved into the
//! [`CalculationVariables`] that are later filled in for every combination.

use crate::calculation::Calculation;
use crate::enumerate::CrossProduct;
use crate::error::ConfigError;
use indexmap::IndexMap;

/// Keyword values given inline or as global variables.
pub type Terms = IndexMap<String, Vec<String>>;

/// Ordered list of values for each keyword.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet(IndexMap<String, Vec<String>>);

impl ParameterSet {
    /// Collect values for the given keywords.
    ///
    /// An inline value that names a global variable expands to all values of that variable;
    /// any other inline value is taken literally. Keywords missing from the inline terms fall
    /// back to a global variable of the same name.
    pub fn extract(inline: &Terms, global: &Terms, keywords: &[&str]) -> Self {
        let mut parameters = Self::default();
        for &keyword in keywords {
            let values: Vec<String> = match inline.get(keyword) {
                Some(values) => values
                    .iter()
                    .flat_map(|value| match global.get(value) {
                        Some(expanded) => expanded.clone(),
                        None => vec![value.clone()],
                    })
                    .collect(),
                None => global.get(keyword).cloned().unwrap_or_default(),
            };
            parameters.insert(keyword, values);
        }
        parameters
    }

    /// Values of a keyword; empty if the keyword is unknown.
    pub fn values(&self, keyword: &str) -> &[String] {
        self.0.get(keyword).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn insert(&mut self, keyword: impl Into<String>, values: Vec<String>) {
        self.0.insert(keyword.into(), values);
    }

    /// The single value of a keyword, or `default` if there is none.
    pub fn single_value(
        &self,
        keyword: &str,
        default: Option<&str>,
    ) -> Result<String, ConfigError> {
        match self.values(keyword) {
            [] => default
                .map(str::to_string)
                .ok_or_else(|| ConfigError::Missing(keyword.to_string())),
            [value] => Ok(value.clone()),
            values => Err(ConfigError::NotSingular {
                keyword: keyword.to_string(),
                count: values.len(),
            }),
        }
    }
}

/// Flat keyword to value mapping used to fill in a template.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalculationVariables(IndexMap<String, String>);

impl CalculationVariables {
    pub fn get(&self, keyword: &str) -> Option<&str> {
        self.0.get(keyword).map(String::as_str)
    }

    pub fn set(&mut self, keyword: impl Into<String>, value: impl Into<String>) {
        self.0.insert(keyword.into(), value.into());
    }

    /// Value of a keyword, or an empty string if it is not set.
    pub fn get_or_empty(&self, keyword: &str) -> &str {
        self.get(keyword).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CalculationVariables {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Parse a boolean keyword, case-insensitively.
pub fn parse_bool(keyword: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            keyword: keyword.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Everything resolved before the first combination is enumerated.
#[derive(Debug, Clone)]
pub struct Setup {
    /// Iterated keywords and their values.
    pub parameters: ParameterSet,
    /// Singular and blanked keywords; iterated keywords are filled in per combination.
    pub variables: CalculationVariables,
    /// Copy potential and load files into each run directory.
    pub copy_files: bool,
    /// Combinations of the iterated keywords.
    pub combinations: CrossProduct,
    /// Global variables the calculation blanks, each reported with a warning.
    pub ignored: Vec<String>,
}

impl Setup {
    /// Resolve keywords for a calculation.
    pub fn resolve(
        calculation: &dyn Calculation,
        inline: &Terms,
        global: &Terms,
    ) -> Result<Self, ConfigError> {
        let mut parameters = ParameterSet::extract(inline, global, calculation.keywords());
        let mut variables = CalculationVariables::default();
        let mut ignored = Vec::new();

        for &(keyword, default) in calculation.singular_keywords() {
            variables.set(keyword, parameters.single_value(keyword, default)?);
        }

        for &keyword in calculation.unused_keywords() {
            variables.set(keyword, "");
            if global.contains_key(keyword) {
                log::warn!(
                    "{} calculations ignore the global variable '{}'",
                    calculation.name(),
                    keyword
                );
                ignored.push(keyword.to_string());
            }
        }

        let copy_files = parse_bool("copy_files", variables.get_or_empty("copy_files"))?;
        variables.set("copy_files", copy_files.to_string());

        // run "no such parameter" as a single empty pass
        for &(keyword, default) in calculation.iterated_defaults() {
            if parameters.values(keyword).is_empty() {
                parameters.insert(keyword, vec![default.to_string()]);
            }
        }

        let combinations = CrossProduct::from_parameters(&parameters, calculation.axes())?;

        Ok(Self {
            parameters,
            variables,
            copy_files,
            combinations,
            ignored,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::Equilibrium;

    fn terms(pairs: &[(&str, Vec<&str>)]) -> Terms {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
            .collect()
    }

    fn required() -> Vec<(&'static str, Vec<&'static str>)> {
        vec![
            ("run_directory", vec!["runs"]),
            ("lib_directory", vec!["library"]),
            ("lammps_command", vec!["lmp_serial"]),
            ("potential_file", vec!["pot.json"]),
            ("potential_dir", vec!["pot"]),
            ("load", vec!["system_model fcc.json"]),
            ("load_options", vec![""]),
            ("load_elements", vec![""]),
            ("box_parameters", vec![""]),
        ]
    }

    #[test]
    fn inline_value_expands_global_variable() {
        let inline = terms(&[("potential_file", vec!["potentials", "extra.json"])]);
        let global = terms(&[("potentials", vec!["a.json", "b.json"])]);
        let parameters = ParameterSet::extract(&inline, &global, &["potential_file"]);
        assert_eq!(
            parameters.values("potential_file"),
            ["a.json", "b.json", "extra.json"]
        );
    }

    #[test]
    fn global_fallback_by_keyword_name() {
        let global = terms(&[("temperature", vec!["100", "200"]), ("unrelated", vec!["x"])]);
        let parameters =
            ParameterSet::extract(&Terms::new(), &global, &["temperature", "pressure"]);
        assert_eq!(parameters.values("temperature"), ["100", "200"]);
        assert!(parameters.values("pressure").is_empty());
        assert!(parameters.values("unrelated").is_empty());
    }

    #[test]
    fn single_value_rules() {
        let mut parameters = ParameterSet::default();
        parameters.insert("a", vec!["1".into()]);
        parameters.insert("b", vec!["1".into(), "2".into()]);
        assert_eq!(parameters.single_value("a", None).unwrap(), "1");
        assert_eq!(parameters.single_value("c", Some("x")).unwrap(), "x");
        assert!(matches!(
            parameters.single_value("c", None),
            Err(ConfigError::Missing(_))
        ));
        assert!(matches!(
            parameters.single_value("b", Some("x")),
            Err(ConfigError::NotSingular { count: 2, .. })
        ));
    }

    #[test]
    fn bool_parsing() {
        assert!(parse_bool("copy_files", "TRUE").unwrap());
        assert!(!parse_bool("copy_files", "False").unwrap());
        assert!(matches!(
            parse_bool("copy_files", "yes"),
            Err(ConfigError::InvalidBool { .. })
        ));
    }

    #[test]
    fn resolve_defaults() {
        let setup = Setup::resolve(&Equilibrium, &terms(&required()), &Terms::new()).unwrap();
        assert!(setup.copy_files);
        assert_eq!(setup.variables.get("mpi_command"), Some(""));
        assert_eq!(setup.variables.get("x-axis"), Some(""));
        assert_eq!(setup.variables.get("shift"), Some(""));
        assert_eq!(setup.parameters.values("size_mults"), ["1 1 1"]);
        assert_eq!(setup.parameters.values("temperature"), [""]);
        assert_eq!(setup.parameters.values("random_seed"), [""]);
        assert_eq!(setup.combinations.len(), Some(1));
    }

    #[test]
    fn resolve_rejects_bad_copy_files() {
        let mut inline = terms(&required());
        inline.insert("copy_files".into(), vec!["yes".into()]);
        let err = Setup::resolve(&Equilibrium, &inline, &Terms::new()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBool { .. }));
    }

    #[test]
    fn resolve_rejects_multiple_run_directories() {
        let mut inline = terms(&required());
        inline.insert("run_directory".into(), vec!["a".into(), "b".into()]);
        let err = Setup::resolve(&Equilibrium, &inline, &Terms::new()).unwrap_err();
        assert!(matches!(err, ConfigError::NotSingular { .. }));
    }

    #[test]
    fn resolve_requires_lammps_command() {
        let mut inline = terms(&required());
        inline.shift_remove("lammps_command");
        let err = Setup::resolve(&Equilibrium, &inline, &Terms::new()).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(ref k) if k == "lammps_command"));
    }

    #[test]
    fn resolve_rejects_length_mismatch() {
        let mut inline = terms(&required());
        inline.insert("thermo_steps".into(), vec!["100".into(), "200".into()]);
        inline.insert("dump_every".into(), vec!["1000".into()]);
        let err = Setup::resolve(&Equilibrium, &inline, &Terms::new()).unwrap_err();
        let ConfigError::LengthMismatch { first, second, .. } = err else {
            panic!("expected a length mismatch");
        };
        assert_eq!((first.as_str(), second.as_str()), ("thermo_steps", "dump_every"));
    }

    #[test]
    fn global_unused_keyword_is_blanked() {
        let global = terms(&[("x-axis", vec!["1 0 0"])]);
        let setup = Setup::resolve(&Equilibrium, &terms(&required()), &global).unwrap();
        assert_eq!(setup.variables.get("x-axis"), Some(""));
        assert_eq!(setup.ignored, ["x-axis"]);

        let setup = Setup::resolve(&Equilibrium, &terms(&required()), &Terms::new()).unwrap();
        assert!(setup.ignored.is_empty());
    }

    #[test]
    fn inline_unused_keyword_is_blanked_silently() {
        let mut inline = terms(&required());
        inline.insert("shift".into(), vec!["0.5 0 0".into()]);
        let setup = Setup::resolve(&Equilibrium, &inline, &Terms::new()).unwrap();
        assert_eq!(setup.variables.get("shift"), Some(""));
        assert!(setup.ignored.is_empty());
    }
}
