//! Kiln CLI: command-line front end for the incremental builder.
//!
//! Provides `kiln build` for one-shot builds of configured containers,
//! `kiln serve` for a long-lived JSON-lines session that keeps index state in
//! memory between requests, and `kiln install-debug-info` for attaching source
//! line information to compiled artifacts.

#![warn(missing_docs)]

mod build;
mod install;
mod pipeline;
mod serve;

use std::io::IsTerminal;
use std::process;
use std::sync::Once;

use clap::{Parser, Subcommand, ValueEnum};

/// Kiln, an incremental multi-container build engine.
#[derive(Parser, Debug)]
#[command(name = "kiln", version, about = "Kiln incremental builder")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a custom `kiln.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build one or every configured container.
    Build(BuildArgs),
    /// Serve build requests from stdin, one JSON object per line.
    Serve,
    /// Build a container, then install debug information into its artifacts.
    InstallDebugInfo(InstallArgs),
}

/// Arguments for the `kiln build` subcommand.
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Container to build. Builds every configured container if omitted.
    #[arg(short, long)]
    pub container: Option<String>,

    /// Changed source files. Without `--dirty` or `--deleted`, every source
    /// file of the container is treated as dirty.
    #[arg(long, num_args = 1..)]
    pub dirty: Vec<String>,

    /// Removed source files.
    #[arg(long, num_args = 1..)]
    pub deleted: Vec<String>,

    /// Output format for the build report.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Arguments for the `kiln install-debug-info` subcommand.
#[derive(Parser, Debug)]
pub struct InstallArgs {
    /// Container whose generated files are processed.
    #[arg(short, long)]
    pub container: String,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Build report output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

/// Exit code for a build that recorded errors.
pub const EXIT_FAILED: i32 = 1;
/// Exit code for a fatal fault: bad configuration or an unusable environment.
pub const EXIT_FATAL: i32 = 2;

static TRACING_INIT: Once = Once::new();

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over `-q`/`-v`. Safe to call more than once.
fn init_tracing(global: &GlobalArgs) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let default = if global.quiet {
            "error"
        } else if global.verbose {
            "debug"
        } else {
            "warn"
        };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(global.verbose)
                    .with_ansi(global.color),
            )
            .with(filter)
            .init();
    });
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::io::stderr().is_terminal(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
    };
    init_tracing(&global);

    let result = match cli.command {
        Command::Build(ref args) => build::run(args, &global),
        Command::Serve => serve::run(&global),
        Command::InstallDebugInfo(ref args) => install::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(EXIT_FATAL);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_build_default() {
        let cli = Cli::parse_from(["kiln", "build"]);
        match cli.command {
            Command::Build(ref args) => {
                assert!(args.container.is_none());
                assert!(args.dirty.is_empty());
                assert!(args.deleted.is_empty());
                assert_eq!(args.format, ReportFormat::Text);
            }
            _ => panic!("expected Build command"),
        }
    }

    #[test]
    fn parse_build_with_args() {
        let cli = Cli::parse_from([
            "kiln",
            "build",
            "--container",
            "app",
            "--dirty",
            "src/A.lang",
            "src/B.lang",
            "--deleted",
            "src/C.lang",
            "--format",
            "json",
        ]);
        match cli.command {
            Command::Build(ref args) => {
                assert_eq!(args.container.as_deref(), Some("app"));
                assert_eq!(args.dirty, vec!["src/A.lang", "src/B.lang"]);
                assert_eq!(args.deleted, vec!["src/C.lang"]);
                assert_eq!(args.format, ReportFormat::Json);
            }
            _ => panic!("expected Build command"),
        }
    }

    #[test]
    fn parse_serve() {
        let cli = Cli::parse_from(["kiln", "serve"]);
        assert!(matches!(cli.command, Command::Serve));
    }

    #[test]
    fn parse_install_debug_info() {
        let cli = Cli::parse_from(["kiln", "install-debug-info", "-c", "app"]);
        match cli.command {
            Command::InstallDebugInfo(ref args) => assert_eq!(args.container, "app"),
            _ => panic!("expected InstallDebugInfo command"),
        }
    }

    #[test]
    fn install_requires_container() {
        assert!(Cli::try_parse_from(["kiln", "install-debug-info"]).is_err());
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from(["kiln", "--quiet", "--color", "never", "build"]);
        assert!(cli.quiet);
        assert!(!cli.verbose);
        assert_eq!(cli.color, ColorChoice::Never);
    }

    #[test]
    fn parse_config_path() {
        let cli = Cli::parse_from(["kiln", "serve", "--config", "/ws/kiln.toml", "-v"]);
        assert_eq!(cli.config.as_deref(), Some("/ws/kiln.toml"));
        assert!(cli.verbose);
    }
}
