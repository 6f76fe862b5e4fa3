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

//! Error types for preparing calculations.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors in resolving keywords before any combination is enumerated.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("keyword '{0}' is required")]
    Missing(String),

    #[error("keyword '{keyword}' must have a single value, found {count}")]
    NotSingular { keyword: String, count: usize },

    #[error("{keyword} must be either true or false, found '{value}'")]
    InvalidBool { keyword: String, value: String },

    #[error("{first} and {second} must be of the same length ({first_len} != {second_len})")]
    LengthMismatch {
        first: String,
        second: String,
        first_len: usize,
        second_len: usize,
    },

    #[error("invalid value for '{keyword}': {reason}")]
    InvalidValue { keyword: String, reason: String },

    #[error("unknown calculation '{0}'")]
    UnknownCalculation(String),

    #[error("invalid match tolerance: {0}")]
    InvalidTolerance(String),
}

/// Errors in filling a template.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("template variable '{0}' is not defined")]
    Undefined(String),

    #[error("invalid template delimiters '{open}' and '{close}'")]
    Delimiters { open: String, close: String },
}

/// Any error that aborts a prepare run.
#[derive(Error, Debug)]
pub enum PrepareError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("cannot {action} '{}': {source}", .path.display())]
    Filesystem {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid input: {0}")]
    Input(String),

    #[error("cannot read record '{}': {source}", .path.display())]
    Record {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for prepare operations
pub type Result<T> = std::result::Result<T, PrepareError>;

/// Attach the failing action and path to an I/O error.
pub(crate) trait FsContext<T> {
    fn fs_context(self, action: &'static str, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> FsContext<T> for io::Result<T> {
    fn fs_context(self, action: &'static str, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|source| PrepareError::Filesystem {
            action,
            path: path.as_ref().to_path_buf(),
            source,
        })
    }
}

/// Shorthand for an input error with a formatted message.
macro_rules! input_error {
    ($($arg:tt)*) => {
        $crate::error::PrepareError::Input(format!($($arg)*))
    };
}
pub(crate) use input_error;
