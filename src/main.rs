use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow, bail};
use bigtheta::{AnalysisError, AnalyzerConfig, analyze_program, parse_program, report};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Text,
    Json,
    Yaml,
}

struct Options {
    procedure: Option<String>,
    format: Format,
    config: Option<PathBuf>,
    dump_ast: bool,
    inputs: Vec<String>,
}

fn parse_args() -> Result<Options> {
    let mut args = std::env::args().skip(1);
    let mut options = Options {
        procedure: None,
        format: Format::Text,
        config: None,
        dump_ast: false,
        inputs: Vec::new(),
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--procedure" | "-p" => {
                options.procedure = Some(
                    args.next()
                        .ok_or_else(|| anyhow!("Missing procedure name after {arg}"))?,
                );
            }
            "--format" | "-f" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow!("Missing format after {arg}"))?;
                options.format = match value.as_str() {
                    "text" => Format::Text,
                    "json" => Format::Json,
                    "yaml" => Format::Yaml,
                    other => bail!("Unknown format '{other}' (expected text, json or yaml)"),
                };
            }
            "--config" | "-c" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow!("Missing config path after {arg}"))?;
                options.config = Some(PathBuf::from(path));
            }
            "--ast" => options.dump_ast = true,
            flag if flag.starts_with('-') && flag != "-" => bail!("Unknown option '{flag}'"),
            _ => options.inputs.push(arg),
        }
    }
    Ok(options)
}

fn read_source(input: &str) -> Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Reading stdin")?;
        Ok(buffer)
    } else {
        fs::read_to_string(input).with_context(|| format!("Reading {input}"))
    }
}

fn render(source: &str, options: &Options, config: &AnalyzerConfig) -> Result<String> {
    let program = parse_program(source)?;
    if options.dump_ast {
        return Ok(report::program_json(&program)?);
    }

    let mut analyses = analyze_program(&program, config);
    if let Some(name) = &options.procedure {
        analyses.retain(|analysis| &analysis.procedure == name);
        if analyses.is_empty() {
            return Err(AnalysisError::ProcedureNotFound {
                name: name.clone(),
                available: program.procedure_names(),
            }
            .into());
        }
    } else if analyses.is_empty() {
        return Err(AnalysisError::EmptyProgram.into());
    }

    let output = match options.format {
        Format::Text => report::format_text(&analyses),
        Format::Json => report::to_json(&analyses)?,
        Format::Yaml => report::to_yaml(&analyses)?,
    };
    Ok(output)
}

fn run() -> Result<bool> {
    let mut options = parse_args()?;
    let config = match &options.config {
        Some(path) => AnalyzerConfig::load(path)?,
        None => AnalyzerConfig::default(),
    };
    debug!(?config, "configuration");
    if options.inputs.is_empty() {
        options.inputs.push("-".to_string());
    }

    let mut all_ok = true;
    for input in &options.inputs {
        let outcome = read_source(input).and_then(|source| render(&source, &options, &config));
        match outcome {
            Ok(output) => {
                if options.inputs.len() > 1 && options.format == Format::Text {
                    println!("== {input} ==");
                }
                print!("{output}");
                if !output.ends_with('\n') {
                    println!();
                }
            }
            Err(err) => {
                eprintln!("{input}: {err:#}");
                all_ok = false;
            }
        }
    }
    Ok(all_ok)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("BIGTHETA_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}
