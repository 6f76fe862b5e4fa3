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

//! Assignment of potential symbols to the atom types of a loaded system.

use crate::error::{input_error, Result};
use crate::load::Load;
use crate::potential::Potential;
use derive_getters::Getters;
use itertools::Itertools;

/// Element of each atom type, from `load_elements` or else from the load file.
///
/// `load_elements` is whitespace-separated and `*` stands for any element.
pub fn element_slots(load_elements: &str, load: &Load) -> Result<Vec<Option<String>>> {
    let slots: Vec<Option<String>> = if load_elements.trim().is_empty() {
        load.elements().to_vec()
    } else {
        load_elements
            .split_whitespace()
            .map(|element| (element != "*").then(|| element.to_string()))
            .collect()
    };
    if slots.is_empty() {
        return Err(input_error!(
            "no atom types found for '{}'",
            load.file().display()
        ));
    }
    Ok(slots)
}

/// Candidate symbols for every atom type of a system.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct SymbolAssignments {
    /// Candidate symbols per atom type
    candidates: Vec<Vec<String>>,
}

impl SymbolAssignments {
    /// Symbols of the potential whose element matches each slot. A slot with unknown
    /// element accepts every symbol.
    pub fn new(potential: &Potential, slots: &[Option<String>]) -> Self {
        let candidates = slots
            .iter()
            .map(|slot| match slot {
                Some(element) => potential.symbols_of(element).map(str::to_string).collect(),
                None => potential.symbols().map(str::to_string).collect(),
            })
            .collect();
        Self { candidates }
    }

    /// Number of assignments; `None` if it does not fit in `usize`.
    pub fn len(&self) -> Option<usize> {
        if self.is_empty() {
            return Some(0);
        }
        self.candidates
            .iter()
            .try_fold(1_usize, |total, symbols| total.checked_mul(symbols.len()))
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty() || self.candidates.iter().any(Vec::is_empty)
    }

    /// Lazily generate all assignments; the last atom type varies fastest.
    pub fn iter(&self) -> impl Iterator<Item = Vec<String>> + '_ {
        let empty = self.is_empty();
        self.candidates
            .iter()
            .map(|symbols| symbols.iter().cloned())
            .multi_cartesian_product()
            .filter(move |_| !empty)
    }
}
