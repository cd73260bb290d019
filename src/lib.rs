pub mod analysis;
pub mod ast;
pub mod builder;
pub mod config;
pub mod engine;
pub mod lexer;
pub mod parser;
pub mod patterns;
pub mod report;
pub mod token;

pub use analysis::{
    AnalysisError, ProcedureAnalysis, analyze, analyze_program, analyze_with, parse_program,
};
pub use config::AnalyzerConfig;
pub use engine::{Bound, ComplexityResult, Growth, Notation, infer};
pub use patterns::{PatternProfile, extract, extract_with};
