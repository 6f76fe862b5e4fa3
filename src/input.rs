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

//! # Rendered calculation scripts
//!
//! A script consists of `key value` lines where `#` starts a comment. Blank values are
//! treated as absent so that defaults apply.

use crate::error::{input_error, Result};
use crate::load::Load;
use crate::potential::Potential;
use indexmap::IndexMap;
use std::str::FromStr;

/// Key and value pairs of a script, in order of appearance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputDict(IndexMap<String, String>);

impl InputDict {
    /// Parse script text.
    ///
    /// A token starting with `#` begins a comment; a `#` inside a token is kept.
    /// The value is the remaining whitespace-separated tokens joined by one space, so
    /// runs of whitespace inside a value collapse. Duplicate keys are an error.
    pub fn parse(text: &str) -> Result<Self> {
        let mut terms = IndexMap::new();
        for line in text.lines() {
            let mut tokens = line
                .split_whitespace()
                .take_while(|token| !token.starts_with('#'));
            let Some(key) = tokens.next() else {
                continue;
            };
            let value = tokens.collect::<Vec<_>>().join(" ");
            if terms.insert(key.to_string(), value).is_some() {
                return Err(input_error!("multiple values for '{}'", key));
            }
        }
        Ok(Self(terms))
    }

    /// Non-blank value of a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Value of a required key.
    pub fn require(&self, key: &str) -> Result<&str> {
        self.get(key)
            .ok_or_else(|| input_error!("'{}' must be given", key))
    }

    /// Parse a value, or return `default` if it is absent.
    pub fn parse_or<T: FromStr>(&self, key: &str, default: T) -> Result<T> {
        self.parse_value(key).map(|value| value.unwrap_or(default))
    }

    /// Parse a value if present.
    pub fn parse_value<T: FromStr>(&self, key: &str) -> Result<Option<T>> {
        self.get(key)
            .map(|value| {
                value
                    .parse()
                    .map_err(|_| input_error!("invalid value '{}' for '{}'", value, key))
            })
            .transpose()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A parsed script together with the files it refers to.
#[derive(Debug, Clone)]
pub struct CalculationInput {
    /// All script terms
    pub terms: InputDict,
    /// Interatomic potential from `potential_file`
    pub potential: Potential,
    /// System from `load` and `load_options`
    pub load: Load,
    /// Model symbols, one per atom type
    pub symbols: Vec<String>,
}

impl CalculationInput {
    /// Parse a rendered script and read the potential and load files it names.
    pub fn read(text: &str) -> Result<Self> {
        let terms = InputDict::parse(text)?;
        let potential = Potential::from_file(terms.require("potential_file")?)?;
        let load = Load::from_term(
            terms.require("load")?,
            terms.get("load_options").unwrap_or_default(),
        )?;
        let symbols = terms
            .get("symbols")
            .unwrap_or_default()
            .split_whitespace()
            .map(str::to_string)
            .collect();
        Ok(Self {
            terms,
            potential,
            load,
            symbols,
        })
    }

    /// System family used to organize the record library.
    pub fn system_family(&self) -> &str {
        self.load.family()
    }
}
