use std::fmt::{self, Write};

use crate::analysis::ProcedureAnalysis;
use crate::ast::Program;

/// Human-readable report, one section per procedure.
pub fn format_text(analyses: &[ProcedureAnalysis]) -> String {
    TextReport(analyses).to_string()
}

/// Text layout of a batch of analyses, separated by blank lines.
pub struct TextReport<'a>(pub &'a [ProcedureAnalysis]);

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, analysis) in self.0.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write_section(f, analysis)?;
        }
        Ok(())
    }
}

fn write_section(out: &mut impl Write, analysis: &ProcedureAnalysis) -> fmt::Result {
    let result = &analysis.result;
    let title = format!("Procedure: {}", analysis.procedure);
    writeln!(out, "{title}")?;
    writeln!(out, "{}", "-".repeat(title.chars().count()))?;
    writeln!(out, "Worst case   : {}", result.worst_case)?;
    writeln!(out, "Best case    : {}", result.best_case)?;
    writeln!(out, "Average case : {}", result.average_case)?;
    if let Some(recurrence) = &result.recurrence {
        writeln!(out, "Recurrence   : {recurrence}")?;
    }
    writeln!(out, "Bounds       : {}", result.bound_certificate)?;
    writeln!(out, "Reasoning:")?;
    for step in &result.reasoning {
        writeln!(out, "  - {step}")?;
    }
    Ok(())
}

pub fn to_json(analyses: &[ProcedureAnalysis]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(analyses)
}

pub fn to_yaml(analyses: &[ProcedureAnalysis]) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(analyses)
}

pub fn program_json(program: &Program) -> serde_json::Result<String> {
    serde_json::to_string_pretty(program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{analyze_program, parse_program};
    use crate::config::AnalyzerConfig;
    use indoc::indoc;

    fn analyses() -> Vec<ProcedureAnalysis> {
        let program = parse_program(indoc! {"
            PROCEDURE Fib(n)
            BEGIN
                IF n <= 1 THEN
                    RETURN n;
                END
                RETURN Fib(n - 1) + Fib(n - 2);
            END
        "})
        .expect("parse");
        analyze_program(&program, &AnalyzerConfig::default())
    }

    #[test]
    fn text_report_lists_cases_and_reasoning() {
        let text = format_text(&analyses());
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Procedure: Fib"));
        assert_eq!(lines.next(), Some("--------------"));
        assert!(text.contains("Worst case   : Θ(φⁿ)"));
        assert!(text.contains("Best case    : Ω(1)"));
        assert!(text.contains("Recurrence   : T(n) = T(n-1) + T(n-2) + O(1)"));
        assert!(text.contains("  - homogeneous linear recurrence of order 2"));
    }

    #[test]
    fn sections_are_separated_by_a_blank_line() {
        let mut both = analyses();
        both.extend(analyses());
        let text = format_text(&both);
        assert_eq!(text.matches("Procedure: Fib").count(), 2);
        assert!(text.contains("\n\nProcedure: Fib\n"));
        assert_eq!(text, TextReport(&both).to_string());
    }

    #[test]
    fn json_report_uses_canonical_strings() {
        let json = to_json(&analyses()).expect("json");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(value[0]["procedure"], "Fib");
        assert_eq!(value[0]["worst_case"], "Θ(φⁿ)");
        assert_eq!(value[0]["average_case"], "Θ(φⁿ)");
        assert!(value[0]["reasoning"].is_array());
    }

    #[test]
    fn yaml_report_round_trips_through_serde_yaml() {
        let yaml = to_yaml(&analyses()).expect("yaml");
        let value: serde_yaml::Value = serde_yaml::from_str(&yaml).expect("valid yaml");
        assert_eq!(value[0]["best_case"].as_str(), Some("Ω(1)"));
    }

    #[test]
    fn program_dump_is_tagged() {
        let program = parse_program("PROCEDURE P(n) BEGIN RETURN n; END").expect("parse");
        let json = program_json(&program).expect("json");
        assert!(json.contains("\"type\": \"Return\""));
        assert!(json.contains("\"type\": \"Identifier\""));
    }
}
