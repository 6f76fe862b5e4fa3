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

//! Interatomic potential definitions for LAMMPS.

use crate::document::Value;
use crate::error::{input_error, Result};
use derive_getters::Getters;
use std::fmt;
use std::path::Path;

/// Root element of a LAMMPS potential data model.
const ROOT: &str = "potential-LAMMPS";

/// Atom type defined by a potential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PotentialAtom {
    /// Chemical element
    pub element: Option<String>,
    /// Model symbol; several symbols may share an element
    pub symbol: String,
}

/// Identity and atom types of a potential.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct Potential {
    id: String,
    atoms: Vec<PotentialAtom>,
}

impl Potential {
    pub fn new(id: impl Into<String>, atoms: Vec<PotentialAtom>) -> Self {
        Self {
            id: id.into(),
            atoms,
        }
    }

    /// Load from a JSON potential data model.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let document = Value::from_file(path)?;
        Self::from_document(&document)
            .map_err(|err| input_error!("potential '{}': {}", path.display(), err))
    }

    /// Interpret a potential data model.
    ///
    /// Each entry of `atom` needs an `element` or a `symbol`; a missing symbol is the element.
    pub fn from_document(document: &Value) -> Result<Self> {
        let root = document
            .get_path(&[ROOT])
            .ok_or_else(|| input_error!("missing root element '{}'", ROOT))?;
        let id = root
            .get_path(&["id"])
            .and_then(Value::as_str)
            .ok_or_else(|| input_error!("missing potential id"))?;

        let atoms = root
            .get_path(&["atom"])
            .map(Value::as_slice)
            .unwrap_or_default()
            .iter()
            .map(|atom| {
                let element = atom.get_path(&["element"]).and_then(Value::as_str);
                let symbol = atom.get_path(&["symbol"]).and_then(Value::as_str);
                match (element, symbol) {
                    (_, Some(symbol)) => Ok(PotentialAtom {
                        element: element.map(str::to_string),
                        symbol: symbol.to_string(),
                    }),
                    (Some(element), None) => Ok(PotentialAtom {
                        element: Some(element.to_string()),
                        symbol: element.to_string(),
                    }),
                    (None, None) => Err(input_error!("atom without element or symbol")),
                }
            })
            .collect::<Result<Vec<_>>>()?;

        if atoms.is_empty() {
            return Err(input_error!("potential '{}' defines no atoms", id));
        }
        Ok(Self::new(id, atoms))
    }

    /// All symbols, in definition order.
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.atoms.iter().map(|atom| atom.symbol.as_str())
    }

    /// Symbols that model the given element.
    pub fn symbols_of(&self, element: &str) -> impl Iterator<Item = &str> + '_ {
        let element = element.to_string();
        self.atoms
            .iter()
            .filter(move |atom| atom.element.as_deref() == Some(element.as_str()))
            .map(|atom| atom.symbol.as_str())
    }

    /// Element of a symbol, if known.
    pub fn element_of(&self, symbol: &str) -> Option<&str> {
        self.atoms
            .iter()
            .find(|atom| atom.symbol == symbol)
            .and_then(|atom| atom.element.as_deref())
    }
}

impl fmt::Display for Potential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<Potential> {
        Potential::from_document(&serde_json::from_str(json).unwrap())
    }

    #[test]
    fn read_atoms() {
        let potential = parse(
            r#"{"potential-LAMMPS": {"id": "2004--Mishin-Y--Ni-Al", "atom": [
                {"element": "Ni"}, {"element": "Al", "symbol": "Al1"}, {"element": "Al", "symbol": "Al2"}
            ]}}"#,
        )
        .unwrap();
        assert_eq!(potential.id(), "2004--Mishin-Y--Ni-Al");
        assert_eq!(potential.to_string(), "2004--Mishin-Y--Ni-Al");
        assert_eq!(potential.symbols().collect::<Vec<_>>(), ["Ni", "Al1", "Al2"]);
        assert_eq!(potential.symbols_of("Al").collect::<Vec<_>>(), ["Al1", "Al2"]);
        assert_eq!(potential.symbols_of("Cu").count(), 0);
        assert_eq!(potential.element_of("Al2"), Some("Al"));
    }

    #[test]
    fn single_atom_not_in_list() {
        let potential =
            parse(r#"{"potential-LAMMPS": {"id": "Al", "atom": {"element": "Al"}}}"#).unwrap();
        assert_eq!(potential.atoms().len(), 1);
    }

    #[test]
    fn missing_fields() {
        assert!(parse(r#"{"potential": {"id": "x"}}"#).is_err());
        assert!(parse(r#"{"potential-LAMMPS": {"atom": {"element": "Al"}}}"#).is_err());
        assert!(parse(r#"{"potential-LAMMPS": {"id": "x"}}"#).is_err());
        assert!(parse(r#"{"potential-LAMMPS": {"id": "x", "atom": {"mass": 1.0}}}"#).is_err());
    }
}
