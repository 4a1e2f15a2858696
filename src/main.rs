//! ncli entry point.

use clap::Parser;
use ncli::cli::commands;
use ncli::cli::{
    AudibleCommands, Cli, Commands, KindleCommands, NotionCommands, YoutubeCommands,
};
use ncli::config::{resolve_config_path, Config};
use ncli::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    init_tracing(cli.verbose, cli.quiet);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if !cli.quiet {
                if let Some(hint) = e.hint() {
                    eprintln!("Error: {e}\n  Hint: {hint}");
                } else {
                    eprintln!("Error: {e}");
                }
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    if quiet {
        return;
    }

    // Honor RUST_LOG if set, otherwise use verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug,html5ever=info,selectors=info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn load_config(cli: &Cli) -> Result<Config, Error> {
    let path = resolve_config_path(cli.config.as_deref());

    // A missing default config just means defaults, but an explicitly
    // requested file must exist.
    if cli.config.is_some() && !path.exists() {
        return Err(Error::ConfigNotFound { path });
    }

    Config::load(&path)
}

fn run(cli: &Cli) -> Result<(), Error> {
    match &cli.command {
        Commands::Audible { command } => match command {
            AudibleCommands::Export { target, force } => {
                let config = load_config(cli)?;
                commands::audible::execute(&config, target, *force, cli.quiet)
            }
        },

        Commands::Kindle { command } => match command {
            KindleCommands::Export { target, force } => {
                let config = load_config(cli)?;
                commands::kindle::execute(&config, target, *force, cli.quiet)
            }
        },

        Commands::Notion { command } => match command {
            NotionCommands::Export {
                source,
                target,
                force,
                clean,
            } => commands::notion::execute(source, target, *force, *clean, cli.quiet),
        },

        Commands::Youtube { command } => match command {
            YoutubeCommands::Export {
                url,
                target,
                transcript,
                summarize,
            } => {
                let config = load_config(cli)?;
                commands::youtube::execute(&config, url, target.as_ref(), *transcript, *summarize)
            }
        },

        Commands::Version => commands::version::execute(),

        Commands::Completions { shell } => commands::completions::execute(shell),
    }
}
