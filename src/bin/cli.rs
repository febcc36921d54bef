//! Binary entry point for the shardpulse replay CLI.
#![forbid(unsafe_code)]

use std::error::Error;
use std::fs;
use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use shardpulse::cli::{
    render_json, render_text, run_replay, InputFormat, ReplayOptions, ViewKind,
};
use shardpulse::{logging, Config};

#[derive(Parser, Debug)]
#[command(
    name = "shardpulse",
    version,
    about = "Replay and inspect shard-request event logs",
    disable_help_subcommand = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        env = "SHARDPULSE_LOG",
        default_value = "warn",
        help = "Tracing filter directive"
    )]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay an event log and print the views each window published.
    Replay(ReplayCmd),
    /// Generate shell completions.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
struct ReplayCmd {
    #[arg(value_name = "FILE", help = "Event log (CSV or JSON lines)")]
    file: PathBuf,

    #[arg(
        long,
        value_enum,
        default_value_t = InputArg::Auto,
        help = "Input layout override"
    )]
    input: InputArg,

    #[arg(
        long,
        value_enum,
        default_value_t = FormatArg::Text,
        help = "Output format (JSON always carries every view)"
    )]
    format: FormatArg,

    #[arg(
        long,
        value_enum,
        default_value_t = ViewArg::All,
        help = "View to print in text output"
    )]
    view: ViewArg,

    #[arg(long, value_name = "FILE", help = "Engine configuration (TOML)")]
    config: Option<PathBuf>,

    #[arg(long, help = "Disable colored output")]
    no_color: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum InputArg {
    Auto,
    Csv,
    Jsonl,
}

impl From<InputArg> for InputFormat {
    fn from(arg: InputArg) -> Self {
        match arg {
            InputArg::Auto => InputFormat::Auto,
            InputArg::Csv => InputFormat::Csv,
            InputArg::Jsonl => InputFormat::JsonLines,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Text,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ViewArg {
    All,
    Latency,
    LatencyByOp,
    Utilization,
    Inflight,
}

impl From<ViewArg> for ViewKind {
    fn from(arg: ViewArg) -> Self {
        match arg {
            ViewArg::All => ViewKind::All,
            ViewArg::Latency => ViewKind::Latency,
            ViewArg::LatencyByOp => ViewKind::LatencyByOp,
            ViewArg::Utilization => ViewKind::Utilization,
            ViewArg::Inflight => ViewKind::Inflight,
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level)?;
    match cli.command {
        Command::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "shardpulse", &mut io::stdout());
            Ok(())
        }
        Command::Replay(cmd) => replay(cmd),
    }
}

fn replay(cmd: ReplayCmd) -> Result<(), Box<dyn Error>> {
    let config = match &cmd.config {
        Some(path) => Config::from_toml_str(&fs::read_to_string(path)?)?,
        None => Config::default(),
    };
    let report = run_replay(&ReplayOptions {
        path: cmd.file.clone(),
        input: cmd.input.into(),
        config,
    })?;
    let mut stdout = io::stdout().lock();
    match cmd.format {
        FormatArg::Json => render_json(&report, &mut stdout)?,
        FormatArg::Text => {
            let color = !cmd.no_color && io::stdout().is_terminal();
            render_text(&report, cmd.view.into(), color, &mut stdout)?;
        }
    }
    Ok(())
}
