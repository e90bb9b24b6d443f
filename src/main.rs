//! Terminal client for a grid simulation service.
//!
//! Examples:
//!   lifeview                          interactive shell against http://localhost:8000/grid
//!   lifeview --url http://host:8000   same, other service
//!   lifeview fetch                    one initial load, printed as JSON
//!   lifeview fetch --input grids.json one generation-advance of the grids in the file
//!
//! Config is read from the OS config dir (`lifeview/config.json`) unless
//! `--config <file>` is given; `--url` overrides the configured base URL.

mod render;
mod shell;

use std::path::PathBuf;
use std::sync::Arc;

use lifeview::config::{AppPaths, ClientConfig};
use lifeview::runtime;
use lifeview::{normalize, GridService, HttpGridService};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use shell::ShellCommand;

enum Command {
    Shell,
    Fetch { input: Option<PathBuf> },
}

struct Args {
    config: Option<PathBuf>,
    url: Option<String>,
    command: Command,
}

fn usage() -> ! {
    eprintln!("lifeview (grid simulation client, talks to http://localhost:8000/grid by default)");
    eprintln!("Usage: lifeview [--config <file>] [--url <base>] [fetch [--input <file.json>]]\n");
    eprintln!("Without a command an interactive shell starts.");
    eprintln!("{}", shell::HELP);
    std::process::exit(1);
}

fn parse_args() -> Args {
    let mut args = std::env::args().skip(1);
    let mut parsed = Args {
        config: None,
        url: None,
        command: Command::Shell,
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => parsed.config = Some(args.next().unwrap_or_else(|| usage()).into()),
            "--url" => parsed.url = Some(args.next().unwrap_or_else(|| usage())),
            "fetch" => parsed.command = Command::Fetch { input: None },
            "--input" => match &mut parsed.command {
                Command::Fetch { input } => *input = Some(args.next().unwrap_or_else(|| usage()).into()),
                Command::Shell => usage(),
            },
            "-h" | "--help" | "help" => usage(),
            other => {
                eprintln!("Unknown argument: {other}");
                usage();
            }
        }
    }
    parsed
}

fn load_config(args: &Args) -> Result<ClientConfig, Box<dyn std::error::Error>> {
    let mut cfg = match &args.config {
        Some(path) => ClientConfig::load(path)?,
        None => match AppPaths::new() {
            Ok(paths) => ClientConfig::load_or_default(&paths.config_file())?,
            Err(e) => {
                warn!("{e}; using default config");
                ClientConfig::default()
            }
        },
    };
    if let Some(url) = &args.url {
        cfg.base_url = url.clone();
    }
    Ok(cfg)
}

async fn run_fetch(
    service: HttpGridService,
    input: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let current = match input {
        Some(path) => {
            let text = std::fs::read_to_string(&path)?;
            Some(normalize(Some(serde_json::from_str(&text)?)))
        }
        None => None,
    };
    let grids = service.fetch_next(current).await?;
    println!("{}", serde_json::to_string_pretty(&grids)?);
    Ok(())
}

async fn run_shell(
    service: HttpGridService,
    cfg: &ClientConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let (handle, task) = runtime::spawn(Arc::new(service), cfg.controller_options());
    let mut state = handle.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", shell::HELP);
    handle.initialize().await?;

    loop {
        tokio::select! {
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = state.borrow_and_update().clone();
                print!("\n{}", render::frame(&snapshot));
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match ShellCommand::parse(&line) {
                    Ok(ShellCommand::Quit) => break,
                    Ok(ShellCommand::Help) => println!("{}", shell::HELP),
                    Ok(cmd) => {
                        if let Some(intent) = cmd.intent() {
                            handle.send(intent).await?;
                        }
                    }
                    Err(msg) => eprintln!("{msg} (h for help)"),
                }
            }
        }
    }

    handle.shutdown().await.ok();
    task.await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr; stdout is the display.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = parse_args();
    let cfg = load_config(&args)?;
    let service = HttpGridService::from_config(&cfg)?;
    info!("Grid service endpoint: {}", service.endpoint());

    match args.command {
        Command::Fetch { input } => run_fetch(service, input).await,
        Command::Shell => run_shell(service, &cfg).await,
    }
}
