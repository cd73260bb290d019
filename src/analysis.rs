//! Entry points that run the whole pipeline on source text.

use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use crate::ast::Program;
use crate::builder::{self, BuildError};
use crate::config::AnalyzerConfig;
use crate::engine::{ComplexityResult, infer};
use crate::parser::{self, SyntaxError};
use crate::patterns::extract_with;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum AnalysisError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error("Procedure '{name}' not found (available: {})", available.join(", "))]
    ProcedureNotFound { name: String, available: Vec<String> },
    #[error("Program declares no procedures")]
    EmptyProgram,
}

/// Classification of one procedure of a program.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcedureAnalysis {
    pub procedure: String,
    #[serde(flatten)]
    pub result: ComplexityResult,
}

pub fn parse_program(source: &str) -> Result<Program, AnalysisError> {
    let tree = parser::parse(source)?;
    Ok(builder::lower(&tree)?)
}

/// Analyzes `procedure`, or the first declared procedure when no name is given.
pub fn analyze(source: &str, procedure: Option<&str>) -> Result<ComplexityResult, AnalysisError> {
    analyze_with(source, procedure, &AnalyzerConfig::default())
}

#[instrument(level = "debug", skip(source, config), fields(bytes = source.len()))]
pub fn analyze_with(
    source: &str,
    procedure: Option<&str>,
    config: &AnalyzerConfig,
) -> Result<ComplexityResult, AnalysisError> {
    let program = parse_program(source)?;
    let target = match procedure {
        Some(name) => program
            .procedure(name)
            .ok_or_else(|| AnalysisError::ProcedureNotFound {
                name: name.to_string(),
                available: program.procedure_names(),
            })?,
        None => program
            .procedures
            .first()
            .ok_or(AnalysisError::EmptyProgram)?,
    };
    Ok(infer(&extract_with(target, config)))
}

/// Analyzes every procedure in parallel; results keep declaration order.
#[instrument(level = "debug", skip_all, fields(procedures = program.procedures.len()))]
pub fn analyze_program(program: &Program, config: &AnalyzerConfig) -> Vec<ProcedureAnalysis> {
    program
        .procedures
        .par_iter()
        .map(|procedure| ProcedureAnalysis {
            procedure: procedure.name.clone(),
            result: infer(&extract_with(procedure, config)),
        })
        .collect()
}
