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

//! Fill in `<keyword>` placeholders in calculation templates.

use crate::error::TemplateError;
use crate::variables::CalculationVariables;
use regex::{Captures, Regex};

/// Text with delimited placeholders.
///
/// Placeholder names consist of letters, digits, `_` and `-`. Any other text between
/// delimiters is left untouched.
#[derive(Debug, Clone)]
pub struct Template {
    text: String,
    placeholder: Regex,
}

impl Template {
    pub fn new(text: impl Into<String>, open: &str, close: &str) -> Result<Self, TemplateError> {
        if open.is_empty() || close.is_empty() {
            return Err(TemplateError::Delimiters {
                open: open.to_string(),
                close: close.to_string(),
            });
        }
        let pattern = format!(
            "{}([A-Za-z0-9_-]+){}",
            regex::escape(open),
            regex::escape(close)
        );
        let placeholder = Regex::new(&pattern).map_err(|_| TemplateError::Delimiters {
            open: open.to_string(),
            close: close.to_string(),
        })?;
        Ok(Self {
            text: text.into(),
            placeholder,
        })
    }

    /// Template using `<` and `>` as delimiters.
    pub fn angle_brackets(text: impl Into<String>) -> Result<Self, TemplateError> {
        Self::new(text, "<", ">")
    }

    /// Names of all placeholders, in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.placeholder
            .captures_iter(&self.text)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str())
    }

    /// Replace every placeholder by its value.
    pub fn render(&self, variables: &CalculationVariables) -> Result<String, TemplateError> {
        if let Some(undefined) = self.placeholders().find(|name| variables.get(name).is_none()) {
            return Err(TemplateError::Undefined(undefined.to_string()));
        }
        Ok(self
            .placeholder
            .replace_all(&self.text, |caps: &Captures| {
                variables.get_or_empty(&caps[1]).to_string()
            })
            .into_owned())
    }
}

/// Fill in a template in one go.
pub fn fill_template(
    text: &str,
    variables: &CalculationVariables,
    open: &str,
    close: &str,
) -> Result<String, TemplateError> {
    Template::new(text, open, close)?.render(variables)
}
