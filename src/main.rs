use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

use flowlint::{analyzer, file_handler, file_handler::FileHandler};

#[derive(Parser)]
#[command(name = "flowlint")]
#[command(version)]
#[command(
    about = "A dependency-aware statement and class member ordering linter for TypeScript",
    long_about = None
)]
struct Cli {
    #[arg(help = "Files, directories, or glob patterns to analyze")]
    paths: Vec<PathBuf>,

    #[arg(short, long, help = "Report ordering violations without modifying files")]
    check: bool,

    #[arg(long, help = "Print fixed output to stdout instead of writing to file")]
    stdout: bool,

    #[arg(long, help = "Skip creating backups of original files")]
    no_backup: bool,

    #[arg(long, default_value_t = 10, help = "Maximum fix passes per file")]
    max_passes: usize,
}

struct FileReport {
    changed: bool,
    findings: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.paths.is_empty() {
        eprintln!("{}", "Error: No files or directories specified".red());
        std::process::exit(1);
    }

    let file_handler = FileHandler::new(!cli.no_backup);
    let files = file_handler::find_typescript_files(&cli.paths)?;

    if files.is_empty() {
        println!("{}", "No TypeScript files found".yellow());
        return Ok(());
    }

    println!("{} {} files", "Analyzing".green(), files.len());

    let results: Vec<_> = files
        .par_iter()
        .map(|file| process_file(&file_handler, file, &cli))
        .collect();

    let mut had_violations = false;
    let mut had_errors = false;

    for (file, result) in files.iter().zip(results.iter()) {
        match result {
            Ok(report) => {
                if report.changed {
                    had_violations = true;
                    let marker = if cli.check { "✗".red() } else { "✓".green() };
                    println!("{} {}", marker, file.display());
                    for finding in &report.findings {
                        println!("    {finding}");
                    }
                } else {
                    println!("{} {} (ordered)", "✓".green(), file.display());
                }
            }
            Err(e) => {
                had_errors = true;
                eprintln!("{} {}: {}", "✗".red(), file.display(), e);
            }
        }
    }

    if cli.check && had_violations {
        eprintln!("\n{}", "Some files have ordering violations".red());
        std::process::exit(1);
    }

    if had_errors {
        eprintln!("\n{}", "Some files had errors".red());
        std::process::exit(1);
    }

    let summary = if cli.check {
        "All files read top to bottom"
    } else {
        "All files processed"
    };
    println!("\n{}", summary.green());
    Ok(())
}

fn process_file(file_handler: &FileHandler, path: &Path, cli: &Cli) -> Result<FileReport> {
    let content = file_handler.read_file(path)?;
    let filename = path.to_str().unwrap_or("unknown.ts");

    if cli.check {
        let violations = analyzer::analyze_source(&content, filename)?;
        let findings = violations
            .iter()
            .map(|violation| {
                format!(
                    "{}: [{}] {}",
                    line_of(&content, violation.span.0),
                    violation.kind,
                    violation.message
                )
            })
            .collect::<Vec<_>>();
        return Ok(FileReport {
            changed: !findings.is_empty(),
            findings,
        });
    }

    let outcome = analyzer::fix_source(&content, filename, cli.max_passes)?;
    if outcome.code == content {
        return Ok(FileReport {
            changed: false,
            findings: Vec::new(),
        });
    }

    if cli.stdout {
        println!("{}", outcome.code);
    } else {
        file_handler.write_file(path, &outcome.code)?;
    }

    let findings = outcome
        .violations
        .iter()
        .map(|violation| format!("[{}] {}", violation.kind, violation.message))
        .collect();
    Ok(FileReport {
        changed: true,
        findings,
    })
}

fn line_of(source: &str, offset: usize) -> usize {
    source[..offset.min(source.len())]
        .bytes()
        .filter(|byte| *byte == b'\n')
        .count()
        + 1
}
