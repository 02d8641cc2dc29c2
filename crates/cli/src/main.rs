mod instrument;

use std::fs;
use std::io::Read;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use scpi_toolkit_core::dump::to_pretty_json;
use scpi_toolkit_core::{ErrorReport, ScpiParser, explain};
use scpi_toolkit_diagnostics::ErrorCode;

// ── CLI definition ──────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "scpi",
    version,
    about = "SCPI toolkit — run SCPI command streams against a demo instrument"
)]
struct Cli {
    /// Machine-readable JSON output instead of plain text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Feed SCPI messages from a file (`-` for stdin) to the demo instrument.
    ///
    /// Responses go to stdout; queued errors are drained after the stream
    /// and reported on stderr (or in the JSON envelope). Exits 1 when any
    /// error was queued.
    Run { file: String },

    /// Print the demo instrument's registered command tree as JSON.
    Tree,

    /// Explain an error code (name or SCPI number, e.g. timeout or -113).
    Explain {
        #[arg(allow_hyphen_values = true)]
        code: String,
    },
}

// ── Main ────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.cmd {
        Cmd::Run { file } => cmd_run(&file, cli.json)?,
        Cmd::Tree => cmd_tree()?,
        Cmd::Explain { code } => cmd_explain(&code, cli.json)?,
    }

    Ok(())
}

// ── Commands ────────────────────────────────────────────────────────────

fn cmd_run(file: &str, json: bool) -> Result<()> {
    let mut input = read_input(file)?;
    if !input.is_empty() && !input.ends_with('\n') {
        // Treat end of input as the terminator of the final message.
        input.push('\n');
    }
    let mut parser = instrument::demo_parser().context("register demo command set")?;

    let mut responses = Vec::new();
    parser.process_input(input.as_bytes(), &mut responses);

    let errors = drain_errors(&mut parser);

    if json {
        let lines: Vec<&str> = std::str::from_utf8(&responses)
            .context("instrument responses are UTF-8")?
            .lines()
            .collect();
        let out = serde_json::json!({
            "ok": errors.is_empty(),
            "responses": lines,
            "errors": errors,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print!("{}", String::from_utf8_lossy(&responses));
        for error in &errors {
            eprintln!("error: {error}");
        }
    }

    if !errors.is_empty() {
        process::exit(1);
    }
    Ok(())
}

fn cmd_tree() -> Result<()> {
    let parser = instrument::demo_parser().context("register demo command set")?;
    println!("{}", to_pretty_json(&parser.debug_dump()));
    Ok(())
}

fn cmd_explain(code: &str, json: bool) -> Result<()> {
    let parsed: Option<ErrorCode> = code.parse().ok();

    if json {
        let out = match parsed {
            Some(code) => serde_json::json!({
                "code": code,
                "number": code.number(),
                "message": code.message(),
                "explanation": explain(code),
            }),
            None => serde_json::json!({
                "code": code,
                "explanation": null,
            }),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        match parsed {
            Some(code) => println!("{code}\n{}", explain(code)),
            None => println!("{code}: (no such error code)"),
        }
    }
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────────────

/// Read the whole input stream: a file path, or stdin for `-`.
fn read_input(file: &str) -> Result<String> {
    if file == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("read stdin")?;
        Ok(buf)
    } else {
        fs::read_to_string(file).with_context(|| format!("read input file '{file}'"))
    }
}

/// Drain the parser's error queue, oldest first.
fn drain_errors(parser: &mut ScpiParser) -> Vec<ErrorReport> {
    let mut out = Vec::new();
    loop {
        let report = parser.get_message();
        if report.is_no_error() {
            return out;
        }
        out.push(report);
    }
}
