//! normconv - convert raw speech-language assessment scores into norm-based
//! results from the command line.
//!
//! State (child info, selected tools, entered scores and results) is kept
//! between invocations, so a session is built up one command at a time:
//! `child set`, `select`, `score`, `submit`, `report`.

mod app;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use normconv_core::models::{Gender, ToolId};
use normconv_core::storage::dates::parse_date;

use app::App;

/// Speech-language norm conversion client
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Verify an API key and store it in the OS keychain
    Login {
        /// API key; prompted for when omitted
        #[arg(long, env = "NORMCONV_API_KEY", hide_env_values = true)]
        key: Option<String>,
    },
    /// Forget the stored API key
    Logout,
    /// Child information
    Child {
        #[command(subcommand)]
        action: ChildAction,
    },
    /// List assessment tools and whether they apply to the current child
    Tools,
    /// Select one or more assessment tools
    Select {
        #[arg(required = true)]
        tools: Vec<ToolId>,
    },
    /// Remove a tool from the selection and drop its scores
    Deselect { tool: ToolId },
    /// Enter a raw score and/or item lists for one subtest
    Score {
        tool: ToolId,
        /// Subtest key, e.g. receptive; use "total" for single-score tools
        subtest: String,
        /// Raw score; "-" clears it
        #[arg(allow_hyphen_values = true)]
        raw: Option<String>,
        /// Correct item numbers, e.g. "1-5, 8"
        #[arg(long)]
        correct: Option<String>,
        /// Wrong item numbers
        #[arg(long)]
        wrong: Option<String>,
        /// Example item numbers
        #[arg(long)]
        example: Option<String>,
    },
    /// Show the current session
    Status,
    /// Send all selected tools to the scoring service
    Submit,
    /// Print the copy-ready result report
    Report {
        /// Only this tool's section
        #[arg(long)]
        tool: Option<ToolId>,
        /// Write to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Clear scores and selection to pick different tools
    ChangeTools,
    /// Start over: clear child info, selection and scores
    Reset,
}

#[derive(Subcommand, Debug)]
enum ChildAction {
    /// Set the child being assessed
    Set {
        #[arg(long)]
        name: String,
        /// male | female (남 | 여)
        #[arg(long)]
        gender: Gender,
        /// Birth date, YYYY-MM-DD
        #[arg(long, value_parser = parse_date_arg)]
        birth: NaiveDate,
        /// Test date, YYYY-MM-DD; defaults to today
        #[arg(long, value_parser = parse_date_arg)]
        test: Option<NaiveDate>,
    },
    /// Show the child and computed age
    Show,
    /// Remove the child information
    Clear,
}

fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    parse_date(s).ok_or_else(|| format!("invalid date '{}', expected YYYY-MM-DD", s))
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut app = App::new()?;
    info!("normconv starting");

    match cli.command {
        Command::Login { key } => app.login(key).await,
        Command::Logout => app.logout(),
        Command::Child { action } => match action {
            ChildAction::Set {
                name,
                gender,
                birth,
                test,
            } => app.set_child(&name, gender, birth, test),
            ChildAction::Show => app.show_child(),
            ChildAction::Clear => app.clear_child(),
        },
        Command::Tools => {
            app.list_tools();
            Ok(())
        }
        Command::Select { tools } => app.select(&tools),
        Command::Deselect { tool } => app.deselect(tool),
        Command::Score {
            tool,
            subtest,
            raw,
            correct,
            wrong,
            example,
        } => app.score(tool, &subtest, raw.as_deref(), correct, wrong, example),
        Command::Status => {
            app.status();
            Ok(())
        }
        Command::Submit => app.submit().await,
        Command::Report { tool, output } => app.report(tool, output.as_deref()),
        Command::ChangeTools => app.change_tools(),
        Command::Reset => app.reset(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_score_command() {
        let cli = Cli::try_parse_from([
            "normconv", "score", "cplc", "discourse_management", "21", "--correct", "1-11",
        ])
        .unwrap();
        match cli.command {
            Command::Score {
                tool,
                subtest,
                raw,
                correct,
                ..
            } => {
                assert_eq!(tool, ToolId::Cplc);
                assert_eq!(subtest, "discourse_management");
                assert_eq!(raw.as_deref(), Some("21"));
                assert_eq!(correct.as_deref(), Some("1-11"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_parse_child_set() {
        let cli = Cli::try_parse_from([
            "normconv", "child", "set", "--name", "김하늘", "--gender", "여", "--birth",
            "2021-01-10", "--test", "2023-03-28",
        ])
        .unwrap();
        match cli.command {
            Command::Child {
                action: ChildAction::Set { gender, birth, test, .. },
            } => {
                assert_eq!(gender, Gender::Female);
                assert_eq!(birth, NaiveDate::from_ymd_opt(2021, 1, 10).unwrap());
                assert_eq!(test, NaiveDate::from_ymd_opt(2023, 3, 28));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_tool_rejected() {
        assert!(Cli::try_parse_from(["normconv", "select", "wisc"]).is_err());
        assert!(Cli::try_parse_from([
            "normconv", "child", "set", "--name", "a", "--gender", "m", "--birth", "2020-13-01",
        ])
        .is_err());
    }
}
