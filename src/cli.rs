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

use crate::{
    calculation::{calculation_by_name, calculations, Calculation, CalculationFiles},
    config::InputFile,
    prepare::{Preparer, Summary},
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::ProgressBar;
use pretty_env_logger::env_logger::DEFAULT_FILTER_ENV;
use std::{
    io::Write,
    path::{Path, PathBuf},
};

#[derive(Debug, Subcommand)]
enum Commands {
    /// Prepare calculations listed in an input file
    #[clap(arg_required_else_help = true)]
    Prepare {
        /// Input file in YAML format
        #[clap(long, short = 'i')]
        input: PathBuf,
        /// Enumerate and match against the library without writing anything
        #[clap(long, action)]
        dry_run: bool,
    },
    /// Describe a calculation style, or list all styles
    Describe {
        /// Calculation style, e.g. "equilibrium"
        calculation: Option<String>,
    },
}

#[derive(Parser)]
#[clap(version, about, long_about = None)]
struct Args {
    #[clap(subcommand)]
    pub command: Commands,

    /// Verbose output. See more with e.g. RUST_LOG=Trace
    #[clap(long, short = 'v', action)]
    pub verbose: bool,
    /// Summary output file in YAML format
    #[clap(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub fn do_main() -> Result<()> {
    let args = Args::parse();
    if std::env::var(DEFAULT_FILTER_ENV).is_err() {
        std::env::set_var(
            DEFAULT_FILTER_ENV,
            if args.verbose { "Debug" } else { "Info" },
        );
    }
    pretty_env_logger::init();

    match args.command {
        Commands::Prepare { input, dry_run } => {
            let summaries = prepare(&input, dry_run)?;
            if let Some(output) = args.output {
                let mut yaml_output = std::fs::File::create(&output)
                    .with_context(|| format!("Could not create {}", output.display()))?;
                write_yaml(&summaries, &mut yaml_output, "prepare")?;
            }
        }
        Commands::Describe { calculation } => match calculation {
            Some(name) => describe(calculation_by_name(&name)?.as_ref()),
            None => calculations()
                .iter()
                .for_each(|c| println!("{:<16}{}", c.name(), c.description())),
        },
    }
    Ok(())
}

/// Serialize data under a top-level key to an existing YAML file
fn write_yaml<T: serde::Serialize>(data: &T, output: &mut std::fs::File, key: &str) -> Result<()> {
    let mut wrapper = std::collections::BTreeMap::new();
    wrapper.insert(key, data);
    let yaml = serde_yaml::to_string(&wrapper)?;
    output.write_all(yaml.as_bytes())?;
    Ok(())
}

/// Run all prepare blocks of an input file in order.
pub fn prepare(input: &Path, dry_run: bool) -> Result<Vec<Summary>> {
    let input = InputFile::from_file(input)?;
    let global = input.global_terms()?;
    if dry_run {
        log::info!("Dry run: nothing will be written");
    }

    let mut summaries = Vec::with_capacity(input.prepare.len());
    for block in &input.prepare {
        let calculation = calculation_by_name(&block.calculation)?;
        let files =
            CalculationFiles::from_dir(block.calc_files(input.base_dir()), calculation.as_ref())?;
        let summary = Preparer::new(calculation.as_ref(), &files, input.tolerance)
            .dry_run(dry_run)
            .with_progress(ProgressBar::new(0))
            .run(&block.terms()?, &global)
            .with_context(|| format!("Failed to prepare {} calculations", block.calculation))?;
        summaries.push(summary);
    }
    Ok(summaries)
}

fn describe(calculation: &dyn Calculation) {
    println!("{}: {}", calculation.name(), calculation.description());
    println!("\nKeywords:");
    for keyword in calculation.keywords() {
        let default = calculation
            .singular_keywords()
            .iter()
            .find(|(k, _)| k == keyword)
            .map(|(_, default)| match default {
                Some(value) => format!("single value, default '{}'", value),
                None => "single value, required".to_string(),
            });
        match default {
            Some(default) => println!("  {:<16}{}", keyword, default),
            None => println!("  {}", keyword),
        }
    }
    println!("\nAlways blank: {}", calculation.unused_keywords().join(", "));
}
