//! Ambit CLI
//!
//! Command-line front end for analyzing requests against a grammar.

use ambit::analysis::{Analyzer, AnalyzerConfig};
use ambit_tools::cli::{
    Cli, Commands, OutputFormat, Request, byte_span_error, describe_grammar, load_grammar,
    load_request, render,
};
use anyhow::Context;
use clap::Parser;
use std::fs;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter = EnvFilter::try_from_env("AMBIT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<ExitCode> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Parse {
            grammar,
            tokens,
            text,
            format,
            max_derivations,
            prune,
            output,
        } => {
            let grammar = load_grammar(&grammar)?;
            let request = match (tokens, text) {
                (Some(path), _) => load_request(&path)?,
                (None, Some(text)) => Request::from_text(&text),
                (None, None) => anyhow::bail!("either --tokens or --text is required"),
            };

            let mut config = AnalyzerConfig::default().with_prune(prune);
            if let Some(limit) = max_derivations {
                config.chart = config.chart.with_max_derivations(limit);
            }
            let analysis = Analyzer::new(&grammar, config).analyze(&request.tokens);
            tracing::info!(
                grammar = %grammar.key(),
                tokens = request.tokens.len(),
                derivations = analysis.derivations.len(),
                "analyzed request"
            );

            if let Some(error) = &analysis.error
                && format != OutputFormat::Json
            {
                let report = miette::Report::new(byte_span_error(error, &request.source))
                    .with_source_code(request.source.clone());
                eprintln!("{report:?}");
            }

            let content = render(&analysis, &grammar, &request, format)?;
            if let Some(output_path) = output {
                fs::write(&output_path, content)
                    .with_context(|| format!("cannot write {}", output_path.display()))?;
                eprintln!("Wrote {} to {}", format_name(format), output_path.display());
            } else {
                print!("{content}");
            }

            Ok(if analysis.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Check { grammar: path } => match load_grammar(&path) {
            Ok(grammar) => {
                print!("{}", describe_grammar(&grammar));
                Ok(ExitCode::SUCCESS)
            }
            Err(error) => {
                eprintln!("{error:?}");
                Ok(ExitCode::FAILURE)
            }
        },
    }
}

const fn format_name(format: OutputFormat) -> &'static str {
    match format {
        OutputFormat::Text => "report",
        OutputFormat::Dot => "forest graph",
        OutputFormat::Json => "snapshot",
        OutputFormat::Chart => "chart dump",
        OutputFormat::Trace => "derivation traces",
    }
}
