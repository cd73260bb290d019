use anyhow::{Context, Result, bail, ensure};
use std::path::Path;

use bigtheta::{AnalysisError, ComplexityResult, analyze};
use test_support::{Case, CaseClass, load_cases};

fn check_field(case: &Case, field: &str, expected: Option<&str>, actual: &str) -> Result<()> {
    if let Some(expected) = expected {
        ensure!(
            actual == expected,
            "Case {}: expected {field} {expected}, got {actual}",
            case.name
        );
    }
    Ok(())
}

fn check_analyzed(case: &Case, result: &ComplexityResult) -> Result<()> {
    let expected = &case.spec.expected;
    check_field(case, "worst case", expected.worst.as_deref(), &result.worst_case.to_string())?;
    check_field(case, "best case", expected.best.as_deref(), &result.best_case.to_string())?;
    check_field(
        case,
        "average case",
        expected.average.as_deref(),
        &result.average_case.to_string(),
    )?;
    if let Some(recurrence) = &expected.recurrence {
        ensure!(
            result.recurrence.as_deref() == Some(recurrence.as_str()),
            "Case {}: expected recurrence {recurrence}, got {:?}",
            case.name,
            result.recurrence
        );
    }
    for needle in &expected.reasoning_contains {
        ensure!(
            result.reasoning.iter().any(|line| line.contains(needle.as_str())),
            "Case {}: no reasoning line contains '{needle}' in {:#?}",
            case.name,
            result.reasoning
        );
    }
    Ok(())
}

fn check_error(case: &Case, error: &AnalysisError) -> Result<()> {
    let matches_class = match case.spec.class {
        CaseClass::SyntaxError => matches!(error, AnalysisError::Syntax(_)),
        CaseClass::BuildError => matches!(error, AnalysisError::Build(_)),
        CaseClass::ProcedureNotFound => matches!(error, AnalysisError::ProcedureNotFound { .. }),
        CaseClass::Analyzed => false,
    };
    ensure!(
        matches_class,
        "Case {}: expected {:?}, got '{error}'",
        case.name,
        case.spec.class
    );
    if let Some(needle) = &case.spec.expected.error_contains {
        let message = error.to_string();
        ensure!(
            message.contains(needle.as_str()),
            "Case {}: expected error containing '{needle}', got '{message}'",
            case.name
        );
    }
    Ok(())
}

fn run_case(case: &Case) -> Result<()> {
    let source = case.read_program()?;
    let outcome = analyze(&source, case.spec.procedure.as_deref());
    match (case.spec.class, outcome) {
        (CaseClass::Analyzed, Ok(result)) => check_analyzed(case, &result),
        (CaseClass::Analyzed, Err(error)) => {
            Err(error).with_context(|| format!("Analyzing {}", case.name))
        }
        (_, Err(error)) => check_error(case, &error),
        (class, Ok(result)) => bail!(
            "Case {}: expected {class:?}, but analysis succeeded with {}",
            case.name,
            result.worst_case
        ),
    }
}

#[test]
fn classifies_fixture_programs() -> Result<()> {
    let cases = load_cases(Path::new("tests/programs"))?;
    for case in &cases {
        run_case(case)?;
    }
    Ok(())
}

#[test]
fn fixture_corpus_covers_every_case_class() -> Result<()> {
    let cases = load_cases(Path::new("tests/programs"))?;
    for class in [
        CaseClass::Analyzed,
        CaseClass::SyntaxError,
        CaseClass::BuildError,
        CaseClass::ProcedureNotFound,
    ] {
        ensure!(
            cases.iter().any(|case| case.spec.class == class),
            "No fixture of class {class:?}"
        );
    }
    Ok(())
}

#[test]
fn bench_cases_are_tagged() -> Result<()> {
    for case in load_cases(Path::new("tests/programs"))? {
        if case.spec.bench.enabled {
            ensure!(
                !case.spec.bench.tags.is_empty(),
                "Case {} has bench enabled but no tags",
                case.name
            );
            ensure!(
                case.spec.class == CaseClass::Analyzed,
                "Case {} is benchmarked but does not analyze",
                case.name
            );
        }
    }
    Ok(())
}
