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

//! # iprpy
//!
//! Prepares batches of atomistic calculations by expanding parameter lists into every
//! combination, building a record for each, and creating run directories only for records
//! not already present in a record library.

pub mod calculation;
pub mod cli;
pub mod config;
pub mod document;
pub mod enumerate;
pub mod error;
pub mod input;
pub mod library;
pub mod load;
pub mod materialize;
pub mod potential;
pub mod prepare;
pub mod symbols;
pub mod template;
pub mod variables;

pub use calculation::{calculation_by_name, Calculation, CalculationFiles};
pub use document::{Tolerance, Value};
pub use error::{ConfigError, PrepareError, Result, TemplateError};
pub use prepare::{Preparer, Summary};
pub use variables::Terms;
