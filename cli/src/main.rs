mod test_runner;

use std::path::Path;
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};

use logscan::{Conventions, LogSource, Patterns, ScanWarning, Scanner};
use reconciler::DiagnosticError;

const SUBCOMMANDS: &[&str] = &["parse", "test", "help"];

#[derive(Parser)]
#[command(name = "harness-log", version, about = "Extract test results from harness logs")]
struct Cli {
    /// Disable colored diagnostics
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a harness log and print its result records as JSON
    Parse(ParseArgs),

    /// Run .case.log fixture files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct ParseArgs {
    /// Harness log to parse
    file: String,

    /// TOML file overriding the harness conventions
    #[arg(long)]
    conventions: Option<String>,

    /// Don't report skipped markers
    #[arg(short, long)]
    quiet: bool,

    /// Print the summary markers and exit
    #[arg(long)]
    list_markers: bool,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .case.log file or a directory containing them
    path: String,

    /// Run only fixtures in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    let mut args: Vec<String> = std::env::args().collect();

    // No arguments: usage is reported as a JSON payload and the exit status
    // stays 0.
    if args.len() < 2 {
        println!(
            "{}",
            serde_json::json!({ "error": "Usage: harness-log <logfile>" })
        );
        return;
    }

    // `harness-log app.log` is shorthand for `harness-log parse app.log`.
    if let Some(pos) = args.iter().skip(1).position(|a| !a.starts_with('-')) {
        let pos = pos + 1;
        if !SUBCOMMANDS.contains(&args[pos].as_str()) {
            args.insert(pos, "parse".to_string());
        }
    }

    let cli = Cli::parse_from(&args);

    match cli.command {
        Command::Parse(parse_args) => do_parse(parse_args, cli.no_color),
        Command::Test(test_args) => {
            let path = Path::new(&test_args.path);
            if test_args.list_categories {
                test_runner::list_categories(path);
                return;
            }
            let exit_code = test_runner::run_tests(path, cli.no_color, &test_args.category);
            process::exit(exit_code);
        }
    }
}

fn do_parse(args: ParseArgs, no_color: bool) {
    let color_choice = if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    let patterns = match load_patterns(args.conventions.as_deref()) {
        Ok(p) => p,
        Err(msg) => {
            eprintln!("error: {}", msg);
            process::exit(1);
        }
    };

    let text = match std::fs::read_to_string(&args.file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", args.file, e);
            process::exit(1);
        }
    };

    let mut files = SimpleFiles::new();
    let file_id = files.add(args.file.clone(), text.clone());
    let source = LogSource::new(text);

    let writer = StandardStream::stderr(color_choice);
    let config = term::Config::default();

    if args.list_markers {
        match Scanner::new(&source, file_id, &patterns).markers() {
            Ok((_, markers)) => {
                for marker in markers {
                    println!("{} {} {}", marker.name, marker.timestamp, marker.line);
                }
            }
            Err(error) => {
                emit(&writer, &config, &files, &error.to_diagnostic());
                process::exit(1);
            }
        }
        return;
    }

    match reconciler::parse_log(&source, file_id, &patterns) {
        Ok(report) => {
            if !args.quiet {
                emit_warnings(&writer, &config, &files, &report.warnings);
            }
            match serde_json::to_string_pretty(&report.records) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("error: cannot serialize results: {}", e);
                    process::exit(1);
                }
            }
        }
        Err(error) => {
            emit_diagnostic_error(&writer, &config, &files, &error);
            process::exit(1);
        }
    }
}

fn load_patterns(path: Option<&str>) -> Result<Patterns, String> {
    let conventions = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read '{}': {}", path, e))?;
            Conventions::from_toml_str(&text).map_err(|e| e.to_string())?
        }
        None => Conventions::default(),
    };
    conventions.compile().map_err(|e| e.to_string())
}

fn emit(
    writer: &StandardStream,
    config: &term::Config,
    files: &SimpleFiles<String, String>,
    diagnostic: &Diagnostic<usize>,
) {
    let _ = term::emit_to_write_style(&mut writer.lock(), config, files, diagnostic);
}

fn emit_diagnostic_error(
    writer: &StandardStream,
    config: &term::Config,
    files: &SimpleFiles<String, String>,
    error: &DiagnosticError,
) {
    match &error.span {
        Some(span) => {
            let diagnostic = Diagnostic::error()
                .with_message(error.to_string())
                .with_labels(vec![Label::primary(error.source_id, span.clone())]);
            emit(writer, config, files, &diagnostic);
        }
        None => eprintln!("error: {}", error),
    }
}

fn emit_warnings(
    writer: &StandardStream,
    config: &term::Config,
    files: &SimpleFiles<String, String>,
    warnings: &[ScanWarning],
) {
    for warning in warnings {
        emit(writer, config, files, &warning.to_diagnostic());
    }
}
