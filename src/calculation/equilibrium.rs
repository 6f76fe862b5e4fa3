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

//! Dynamic equilibration of a bulk system at given temperature and pressure.

use super::Calculation;
use crate::document::Value;
use crate::error::{input_error, Result};
use crate::input::CalculationInput;

const KEYWORDS: &[&str] = &[
    "run_directory",
    "lib_directory",
    "copy_files",
    "lammps_command",
    "mpi_command",
    "potential_file",
    "potential_dir",
    "load",
    "load_options",
    "load_elements",
    "box_parameters",
    "size_mults",
    "length_unit",
    "pressure_unit",
    "energy_unit",
    "force_unit",
    "temperature",
    "pressure",
    "integration",
    "thermo_steps",
    "dump_every",
    "run_steps",
    "random_seed",
];

const SINGULAR_KEYWORDS: &[(&str, Option<&str>)] = &[
    ("run_directory", None),
    ("lib_directory", None),
    ("copy_files", Some("true")),
    ("lammps_command", None),
    ("mpi_command", Some("")),
    ("length_unit", Some("")),
    ("pressure_unit", Some("")),
    ("energy_unit", Some("")),
    ("force_unit", Some("")),
];

const UNUSED_KEYWORDS: &[&str] = &["x-axis", "y-axis", "z-axis", "shift"];

const ITERATED_DEFAULTS: &[(&str, &str)] = &[
    ("size_mults", "1 1 1"),
    ("temperature", ""),
    ("pressure", ""),
    ("thermo_steps", ""),
    ("dump_every", ""),
    ("run_steps", ""),
    ("integration", ""),
    ("random_seed", ""),
];

const AXES: &[&[&str]] = &[
    &["potential_file", "potential_dir"],
    &["load", "load_options", "load_elements", "box_parameters"],
    &["size_mults"],
    &["thermo_steps", "dump_every", "run_steps"],
    &["pressure"],
    &["integration"],
    &["temperature"],
    &["random_seed"],
];

const MATCH_FIELDS: &[&[&str]] = &[
    &["calculation", "script"],
    &["calculation", "run-parameter", "size-multipliers"],
    &["calculation", "run-parameter", "thermo_steps"],
    &["calculation", "run-parameter", "run_steps"],
    &["calculation", "run-parameter", "random_seed"],
    &["potential", "id"],
    &["system-info", "artifact"],
    &["system-info", "symbols"],
    &["phase-state", "temperature", "value"],
    &["phase-state", "pressure", "value"],
];

/// Integration styles understood by the LAMMPS script.
const INTEGRATION_STYLES: &[&str] = &["npt", "nvt", "nph", "nve", "nve+l", "nph+l"];

/// Equilibrium calculation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Equilibrium;

impl Calculation for Equilibrium {
    fn name(&self) -> &'static str {
        "equilibrium"
    }

    fn description(&self) -> &'static str {
        "Integrates a system in time and evaluates bulk properties at a given temperature and pressure."
    }

    fn keywords(&self) -> &'static [&'static str] {
        KEYWORDS
    }

    fn singular_keywords(&self) -> &'static [(&'static str, Option<&'static str>)] {
        SINGULAR_KEYWORDS
    }

    fn unused_keywords(&self) -> &'static [&'static str] {
        UNUSED_KEYWORDS
    }

    fn iterated_defaults(&self) -> &'static [(&'static str, &'static str)] {
        ITERATED_DEFAULTS
    }

    fn axes(&self) -> &'static [&'static [&'static str]] {
        AXES
    }

    fn record_root(&self) -> &'static str {
        "calculation-system-equilibrium"
    }

    fn match_fields(&self) -> &'static [&'static [&'static str]] {
        MATCH_FIELDS
    }

    fn data_model(&self, input: &CalculationInput) -> Result<Value> {
        let terms = &input.terms;
        let temperature: f64 = terms.parse_or("temperature", 0.0)?;
        let pressure: f64 = terms.parse_or("pressure", 0.0)?;
        let integration = match terms.get("integration") {
            Some(style) if INTEGRATION_STYLES.contains(&style) => style,
            Some(style) => return Err(input_error!("unknown integration style '{}'", style)),
            None if temperature > 0.0 => "npt",
            None => "nph",
        };
        let thermo_steps: i64 = terms.parse_or("thermo_steps", 100)?;
        let dump_every: i64 = terms.parse_or("dump_every", 100000)?;
        let run_steps: i64 = terms.parse_or("run_steps", 100000)?;
        let random_seed: Option<i64> = terms.parse_value("random_seed")?;
        if let Some(seed) = random_seed.filter(|&seed| seed <= 0) {
            return Err(input_error!("random_seed must be positive, found {}", seed));
        }
        if temperature < 0.0 {
            return Err(input_error!("temperature must be non-negative"));
        }
        let size_mults = size_multipliers(terms.get("size_mults").unwrap_or("1 1 1"))?;

        let mut record = Value::map();
        record.set_path(&["key"], Value::Null);

        let mut multipliers = Value::map();
        for (axis, [low, high]) in ["a", "b", "c"].into_iter().zip(size_mults) {
            multipliers.set_path(&[axis], vec![low, high]);
        }
        let mut run = Value::map();
        run.set_path(&["size-multipliers"], multipliers);
        run.set_path(&["thermo_steps"], thermo_steps);
        run.set_path(&["dump_every"], dump_every);
        run.set_path(&["run_steps"], run_steps);
        if let Some(seed) = random_seed {
            run.set_path(&["random_seed"], seed);
        }
        run.set_path(&["integration"], integration);
        record.set_path(&["calculation", "script"], self.script());
        record.set_path(&["calculation", "run-parameter"], run);

        record.set_path(&["potential", "id"], input.potential.id().as_str());

        let load = &input.load;
        let mut artifact = Value::map();
        artifact.set_path(&["file"], load.file().to_string_lossy().into_owned());
        artifact.set_path(&["format"], load.style().to_string());
        if !load.options().is_empty() {
            artifact.set_path(&["load_options"], load.options().as_str());
        }
        record.set_path(&["system-info", "artifact"], artifact);
        record.set_path(&["system-info", "symbols"], input.symbols.clone());

        record.set_path(&["phase-state", "temperature", "value"], temperature);
        record.set_path(&["phase-state", "temperature", "unit"], "K");
        record.set_path(&["phase-state", "pressure", "value"], pressure);
        record.set_path(
            &["phase-state", "pressure", "unit"],
            terms.get("pressure_unit").unwrap_or("GPa"),
        );

        let mut document = Value::map();
        document.set_path(&[self.record_root()], record);
        Ok(document)
    }
}

/// Parse `size_mults`: three integers `n` meaning `[0, n]` (or `[n, 0]` when negative),
/// or six integers giving the bounds of each axis.
fn size_multipliers(value: &str) -> Result<[[i64; 2]; 3]> {
    let numbers = value
        .split_whitespace()
        .map(|token| {
            token
                .parse::<i64>()
                .map_err(|_| input_error!("invalid size_mults '{}'", value))
        })
        .collect::<Result<Vec<_>>>()?;

    let bounds: Vec<[i64; 2]> = match numbers.as_slice() {
        [_, _, _] => numbers
            .iter()
            .map(|&n| if n < 0 { [n, 0] } else { [0, n] })
            .collect(),
        [_, _, _, _, _, _] => numbers.chunks(2).map(|pair| [pair[0], pair[1]]).collect(),
        _ => {
            return Err(input_error!(
                "size_mults must have 3 or 6 values, found '{}'",
                value
            ))
        }
    };
    if bounds.iter().any(|[low, high]| low >= high) {
        return Err(input_error!("size_mults '{}' spans an empty range", value));
    }
    Ok([bounds[0], bounds[1], bounds[2]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{CalculationInput, InputDict};
    use crate::load::Load;
    use crate::potential::{Potential, PotentialAtom};
    use float_cmp::assert_approx_eq;

    fn input(script: &str) -> CalculationInput {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("fcc.dat");
        std::fs::write(&file, "1 atom types\n").unwrap();
        CalculationInput {
            terms: InputDict::parse(script).unwrap(),
            potential: Potential::new(
                "EAM--Al",
                vec![PotentialAtom {
                    element: Some("Al".into()),
                    symbol: "Al".into(),
                }],
            ),
            load: Load::from_term(&format!("atom_data {}", file.display()), "").unwrap(),
            symbols: vec!["Al".into()],
        }
    }

    #[test]
    fn defaults() {
        let record = Equilibrium.data_model(&input("")).unwrap();
        let root = record.get_path(&["calculation-system-equilibrium"]).unwrap();
        let run = root.get_path(&["calculation", "run-parameter"]).unwrap();
        assert_eq!(
            root.get_path(&["calculation", "script"]).and_then(Value::as_str),
            Some("calc_equilibrium")
        );
        assert_eq!(run.get_path(&["thermo_steps"]), Some(&Value::Integer(100)));
        assert_eq!(run.get_path(&["run_steps"]), Some(&Value::Integer(100000)));
        assert!(run.get_path(&["random_seed"]).is_none());
        assert_eq!(run.get_path(&["integration"]).and_then(Value::as_str), Some("nph"));
        assert_eq!(
            run.get_path(&["size-multipliers", "b"]),
            Some(&Value::from(vec![0_i64, 1]))
        );
        assert_eq!(
            root.get_path(&["phase-state", "pressure", "unit"]).and_then(Value::as_str),
            Some("GPa")
        );
        assert_eq!(
            root.get_path(&["system-info", "artifact", "format"]).and_then(Value::as_str),
            Some("atom_data")
        );
        assert!(root.get_path(&["key"]).is_some());
    }

    #[test]
    fn given_values() {
        let script = "temperature 300\npressure 1.5\nrandom_seed 42\nsize_mults -2 3 0 4 1 5\n";
        let record = Equilibrium.data_model(&input(script)).unwrap();
        let root = record.get_path(&["calculation-system-equilibrium"]).unwrap();
        let temperature = root
            .get_path(&["phase-state", "temperature", "value"])
            .and_then(Value::as_f64)
            .unwrap();
        assert_approx_eq!(f64, temperature, 300.0);
        let pressure = root
            .get_path(&["phase-state", "pressure", "value"])
            .and_then(Value::as_f64)
            .unwrap();
        approx::assert_relative_eq!(pressure, 1.5);
        let run = root.get_path(&["calculation", "run-parameter"]).unwrap();
        assert_eq!(run.get_path(&["integration"]).and_then(Value::as_str), Some("npt"));
        assert_eq!(run.get_path(&["random_seed"]), Some(&Value::Integer(42)));
        assert_eq!(
            run.get_path(&["size-multipliers", "a"]),
            Some(&Value::from(vec![-2_i64, 3]))
        );
    }

    #[test]
    fn size_mults_forms() {
        assert_eq!(size_multipliers("3 3 3").unwrap(), [[0, 3]; 3]);
        assert_eq!(size_multipliers("-1 2 3").unwrap(), [[-1, 0], [0, 2], [0, 3]]);
        assert!(size_multipliers("1 1").is_err());
        assert!(size_multipliers("0 1 1").is_err());
        assert!(size_multipliers("1 1 x").is_err());
        assert!(size_multipliers("2 1 0 1 0 1").is_err());
    }

    #[test]
    fn axis_order() {
        let axes: Vec<Vec<&str>> = Equilibrium.axes().iter().map(|a| a.to_vec()).collect();
        assert_eq!(
            axes,
            [
                vec!["potential_file", "potential_dir"],
                vec!["load", "load_options", "load_elements", "box_parameters"],
                vec!["size_mults"],
                vec!["thermo_steps", "dump_every", "run_steps"],
                vec!["pressure"],
                vec!["integration"],
                vec!["temperature"],
                vec!["random_seed"],
            ]
        );
        // every iterated keyword has an axis
        for (keyword, _) in Equilibrium.iterated_defaults() {
            assert!(axes.iter().any(|axis| axis.contains(keyword)));
        }
    }

    #[test]
    fn invalid_values() {
        assert!(Equilibrium.data_model(&input("integration npx")).is_err());
        assert!(Equilibrium.data_model(&input("random_seed 0")).is_err());
        assert!(Equilibrium.data_model(&input("temperature hot")).is_err());
    }
}
