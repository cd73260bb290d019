#![allow(dead_code)]
use std::fs;
use std::path::{Path, PathBuf};

use bigtheta::ast::Program;
use bigtheta::parse_program;

/// `(label, program path)` for every fixture flagged for benchmarking.
pub fn workloads(tag: Option<&str>) -> Vec<(String, PathBuf)> {
    test_support::bench_cases(Path::new("tests/programs"), tag)
        .unwrap_or_else(|err| panic!("load bench cases: {err:#}"))
        .into_iter()
        .map(|case| (case.name, case.program_path))
        .collect()
}

pub fn load_source(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|err| panic!("read {}: {err}", path.display()))
}

pub fn load_program(path: &Path) -> Program {
    let source = load_source(path);
    parse_program(&source).unwrap_or_else(|err| panic!("parse {}: {err}", path.display()))
}
