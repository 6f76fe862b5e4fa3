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

//! # Atomic system files
//!
//! The `load` keyword has the form `<style> <file>`. Only what is needed to organize and
//! enumerate calculations is read from the file: the system family and the element of each
//! atom type, where known.

use crate::document::Value;
use crate::error::{input_error, FsContext, Result};
use derive_getters::Getters;
use regex::Regex;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Format of a load file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStyle {
    /// JSON system model with family and atom type symbols
    SystemModel,
    /// VASP POSCAR
    Poscar,
    /// LAMMPS data file
    AtomData,
}

impl FromStr for LoadStyle {
    type Err = crate::error::PrepareError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "system_model" => Ok(Self::SystemModel),
            "poscar" => Ok(Self::Poscar),
            "atom_data" => Ok(Self::AtomData),
            _ => Err(input_error!("unsupported load style '{}'", s)),
        }
    }
}

impl fmt::Display for LoadStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let style = match self {
            Self::SystemModel => "system_model",
            Self::Poscar => "poscar",
            Self::AtomData => "atom_data",
        };
        write!(f, "{}", style)
    }
}

/// Split a `load` term into its style and file.
pub fn split_load_term(load: &str) -> Result<(LoadStyle, PathBuf)> {
    let mut tokens = load.split_whitespace();
    let style = tokens
        .next()
        .ok_or_else(|| input_error!("empty load term"))?
        .parse()?;
    let file = tokens.collect::<Vec<_>>().join(" ");
    if file.is_empty() {
        return Err(input_error!("load term '{}' names no file", load));
    }
    Ok((style, PathBuf::from(file)))
}

/// A system to load, with its atom types.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct Load {
    style: LoadStyle,
    /// File as given in the load term
    file: PathBuf,
    options: String,
    /// System family, defaulting to the file stem
    family: String,
    /// Element of each atom type; `None` when the file does not say
    elements: Vec<Option<String>>,
}

impl Load {
    /// Read the file named by a `load` term.
    pub fn from_term(load: &str, options: &str) -> Result<Self> {
        let (style, file) = split_load_term(load)?;
        let text = std::fs::read_to_string(&file).fs_context("read", &file)?;
        let stem = file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let (family, elements) = match style {
            LoadStyle::SystemModel => {
                let document: Value = serde_json::from_str(&text).map_err(|source| {
                    crate::error::PrepareError::Record {
                        path: file.clone(),
                        source,
                    }
                })?;
                system_model_types(&document, stem)
            }
            LoadStyle::Poscar => (stem, poscar_types(&text)?),
            LoadStyle::AtomData => (stem, atom_data_types(&text)?),
        };
        log::trace!("loaded {} '{}' of family {}", style, file.display(), family);

        Ok(Self {
            style,
            file,
            options: options.to_string(),
            family,
            elements,
        })
    }
}

/// Family and atom types from a system model. The first key is the root element.
fn system_model_types(document: &Value, stem: String) -> (String, Vec<Option<String>>) {
    let Some(root) = document.as_map().and_then(|map| map.values().next()) else {
        return (stem, vec![]);
    };
    let family = root
        .get_path(&["system-family"])
        .and_then(Value::as_str)
        .map_or(stem, str::to_string);
    let elements = root
        .get_path(&["atomic-system", "atom-type-symbol"])
        .map(Value::as_slice)
        .unwrap_or_default()
        .iter()
        .map(|symbol| symbol.as_str().map(str::to_string))
        .collect();
    (family, elements)
}

/// Atom types of a POSCAR file: element names on line 6 if present, otherwise the counts.
fn poscar_types(text: &str) -> Result<Vec<Option<String>>> {
    let line = text
        .lines()
        .nth(5)
        .ok_or_else(|| input_error!("POSCAR file is too short"))?;
    let tokens: Vec<_> = line.split_whitespace().collect();
    if tokens.iter().all(|t| t.parse::<usize>().is_ok()) {
        Ok(vec![None; tokens.len()])
    } else {
        Ok(tokens.iter().map(|t| Some(t.to_string())).collect())
    }
}

/// Atom types of a LAMMPS data file, from the `N atom types` header line.
fn atom_data_types(text: &str) -> Result<Vec<Option<String>>> {
    let pattern = Regex::new(r"^\s*(\d+)\s+atom\s+types").map_err(|e| input_error!("{}", e))?;
    text.lines()
        .find_map(|line| pattern.captures(line))
        .and_then(|caps| caps[1].parse::<usize>().ok())
        .map(|n| vec![None; n])
        .ok_or_else(|| input_error!("no 'atom types' line in atom_data file"))
}
