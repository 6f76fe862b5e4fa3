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

//! # Cross product of parameter axes
//!
//! An [`Axis`] is a group of keywords whose values co-vary, i.e. the n'th value of each
//! keyword belongs together. The [`CrossProduct`] iterates over all axes like nested loops,
//! with the first axis as the outermost loop.
//!
//! ~~~
//! use iprpy::enumerate::{Axis, CrossProduct};
//! let temperature = Axis::new(&["temperature"], vec![vec!["100".into()], vec!["200".into()]]);
//! let seed = Axis::new(&["random_seed"], vec![vec!["1".into()], vec!["2".into()], vec!["3".into()]]);
//! let product = CrossProduct::new(vec![temperature, seed]);
//! assert_eq!(product.len(), Some(6));
//! let first = product.iter().next().unwrap();
//! assert_eq!(first.get("temperature"), Some("100"));
//! assert_eq!(first.get("random_seed"), Some("1"));
//! ~~~

use crate::error::ConfigError;
use crate::variables::{CalculationVariables, ParameterSet};
use derive_getters::Getters;
use itertools::Itertools;

/// Keywords that are iterated together, and their rows of values.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct Axis {
    keywords: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Axis {
    /// New axis; every row must hold one value per keyword.
    pub fn new(keywords: &[&str], rows: Vec<Vec<String>>) -> Self {
        debug_assert!(rows.iter().all(|row| row.len() == keywords.len()));
        Self {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            rows,
        }
    }

    /// Zip the values of co-varying keywords into rows.
    ///
    /// All keywords must have the same number of values.
    pub fn from_parameters(
        parameters: &ParameterSet,
        keywords: &[&str],
    ) -> Result<Self, ConfigError> {
        let Some((&first, rest)) = keywords.split_first() else {
            return Ok(Self::new(&[], vec![]));
        };
        let len = parameters.values(first).len();
        for &other in rest {
            let other_len = parameters.values(other).len();
            if other_len != len {
                return Err(ConfigError::LengthMismatch {
                    first: first.to_string(),
                    second: other.to_string(),
                    first_len: len,
                    second_len: other_len,
                });
            }
        }
        let rows = (0..len)
            .map(|i| {
                keywords
                    .iter()
                    .map(|k| parameters.values(k)[i].clone())
                    .collect()
            })
            .collect();
        Ok(Self::new(keywords, rows))
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Nested iteration over a list of axes.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct CrossProduct {
    axes: Vec<Axis>,
}

impl CrossProduct {
    pub fn new(axes: Vec<Axis>) -> Self {
        Self { axes }
    }

    /// Build axes from a parameter set, in the given order.
    pub fn from_parameters(
        parameters: &ParameterSet,
        axes: &[&[&str]],
    ) -> Result<Self, ConfigError> {
        axes.iter()
            .map(|keywords| Axis::from_parameters(parameters, keywords))
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }

    /// Total number of combinations; `None` if it does not fit in `usize`.
    pub fn len(&self) -> Option<usize> {
        if self.is_empty() {
            return Some(0);
        }
        self.axes
            .iter()
            .try_fold(1_usize, |total, axis| total.checked_mul(axis.len()))
    }

    pub fn is_empty(&self) -> bool {
        self.axes.is_empty() || self.axes.iter().any(Axis::is_empty)
    }

    /// Iterate over all combinations; the last axis varies fastest.
    pub fn iter(&self) -> impl Iterator<Item = Combination<'_>> + '_ {
        let empty = self.is_empty();
        self.axes
            .iter()
            .map(|axis| 0..axis.len())
            .multi_cartesian_product()
            .filter(move |_| !empty)
            .map(move |indices| Combination {
                product: self,
                indices,
            })
    }
}

/// One row from every axis.
#[derive(Debug, Clone)]
pub struct Combination<'a> {
    product: &'a CrossProduct,
    indices: Vec<usize>,
}

impl<'a> Combination<'a> {
    /// All keyword and value pairs, in axis order.
    pub fn pairs(&self) -> impl Iterator<Item = (&'a str, &'a str)> + '_ {
        self.product
            .axes
            .iter()
            .zip(&self.indices)
            .flat_map(|(axis, &i)| {
                axis.keywords
                    .iter()
                    .zip(&axis.rows[i])
                    .map(|(k, v)| (k.as_str(), v.as_str()))
            })
    }

    /// Value of a keyword in this combination.
    pub fn get(&self, keyword: &str) -> Option<&'a str> {
        self.pairs().find(|(k, _)| *k == keyword).map(|(_, v)| v)
    }

    /// Row index within each axis.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Copy all values into the calculation variables.
    pub fn assign_to(&self, variables: &mut CalculationVariables) {
        for (keyword, value) in self.pairs() {
            variables.set(keyword, value);
        }
    }
}
