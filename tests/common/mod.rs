//! Shared utilities for integration tests.
//!
//! Builds a scratch project with two single-element potentials that each define two
//! symbols, a LAMMPS data file with one atom type, and the equilibrium calculation files.
//! Also provides helpers for running the `iprpy` CLI binary.

#![allow(dead_code)]

use iprpy::calculation::{CalculationFiles, Equilibrium};
use iprpy::variables::Terms;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Path to the compiled `iprpy` binary.
pub fn iprpy_binary() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_BIN_EXE_iprpy"));
    if !path.exists() {
        path = PathBuf::from("target/debug/iprpy");
    }
    path
}

/// Run iprpy with the given arguments and assert success.
pub fn run_iprpy(args: &[&str]) {
    let status = Command::new(iprpy_binary())
        .args(args)
        .status()
        .expect("failed to execute iprpy binary");
    assert!(status.success(), "iprpy exited with status: {status}");
}

/// Scratch project directory, removed when dropped.
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let project = Self { dir };
        project.write_potential("A", "1999--Mishin-Y--Al");
        project.write_potential("B", "2004--Zhou-X-W--Al");
        project.write("fcc.dat", "LAMMPS data file\n\n4 atoms\n1 atom types\n");

        let template = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("calc_files/equilibrium/calc_equilibrium.template");
        let calc_files = project.path("calc_files/equilibrium");
        std::fs::create_dir_all(&calc_files).unwrap();
        std::fs::copy(template, calc_files.join("calc_equilibrium.template"))
            .expect("failed to copy template");
        project.write("calc_files/equilibrium/in.equilibrium", "run ${run_steps}\n");
        project
    }

    fn write_potential(&self, name: &str, id: &str) {
        let json = format!(
            r#"{{"potential-LAMMPS": {{"id": "{id}", "atom": [
                {{"element": "Al", "symbol": "Al1"}},
                {{"element": "Al", "symbol": "Al2"}}
            ]}}}}"#
        );
        self.write(&format!("pots/{name}.json"), &json);
        self.write(&format!("pots/{name}/{name}.eam.alloy"), "eam");
        self.write(&format!("pots/{name}/README"), "");
        self.write(&format!("pots/{name}/tables/{name}.rho"), "rho");
    }

    /// Write a file relative to the project root, creating parent directories.
    pub fn write(&self, relative: &str, text: &str) {
        let path = self.path(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, text).unwrap();
    }

    /// Absolute path of a project file.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    fn path_str(&self, relative: &str) -> String {
        self.path(relative).display().to_string()
    }

    /// Inline terms for both potentials and one of everything else.
    pub fn terms(&self) -> Terms {
        let mut terms = Terms::new();
        let mut set = |keyword: &str, values: Vec<String>| {
            terms.insert(keyword.to_string(), values);
        };
        set("run_directory", vec![self.path_str("runs")]);
        set("lib_directory", vec![self.path_str("library")]);
        set("lammps_command", vec!["lmp_serial".into()]);
        set(
            "potential_file",
            vec![self.path_str("pots/A.json"), self.path_str("pots/B.json")],
        );
        set(
            "potential_dir",
            vec![self.path_str("pots/A"), self.path_str("pots/B")],
        );
        set("load", vec![format!("atom_data {}", self.path_str("fcc.dat"))]);
        set("load_options", vec![String::new()]);
        set("load_elements", vec![String::new()]);
        set("box_parameters", vec![String::new()]);
        terms
    }

    pub fn files(&self) -> CalculationFiles {
        CalculationFiles::from_dir(self.path("calc_files/equilibrium"), &Equilibrium).unwrap()
    }

    /// Names of all run directories.
    pub fn runs(&self) -> Vec<String> {
        list_dir(&self.path("runs"))
            .into_iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    /// All records in the library.
    pub fn records(&self) -> Vec<PathBuf> {
        let mut records = Vec::new();
        collect_json(&self.path("library"), &mut records);
        records.sort();
        records
    }
}

/// Sorted directory entries; empty if the directory does not exist.
pub fn list_dir(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return vec![];
    };
    let mut paths: Vec<_> = entries.map(|e| e.unwrap().path()).collect();
    paths.sort();
    paths
}

fn collect_json(dir: &Path, records: &mut Vec<PathBuf>) {
    for path in list_dir(dir) {
        if path.is_dir() {
            collect_json(&path, records);
        } else if path.extension().is_some_and(|ext| ext == "json") {
            records.push(path);
        }
    }
}
