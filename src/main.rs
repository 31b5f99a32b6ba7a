// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use anyhow::{bail, Context, Result};
use liveprune::config::EditorConfig;
use liveprune::document::serializer;
use liveprune::tracks::{outline, render_tree, IndexBuilder};
use liveprune::ui::App;
use liveprune::Session;
use std::env;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{info, Level};

fn print_usage() {
    println!("liveprune - Remove tracks from Ableton Live sets");
    println!();
    println!("Usage: liveprune [OPTIONS] [FILE]");
    println!();
    println!("Arguments:");
    println!("  FILE                   Live set (.als) to open on start");
    println!();
    println!("Options:");
    println!("  --config <FILE>        Load editor settings from a YAML file");
    println!("  --log <FILE>           Write debug log to FILE");
    println!("  --list                 Print the track hierarchy of FILE and exit");
    println!("  --write-config <FILE>  Write the active settings as YAML and exit");
    println!("  --help                 Show this help message");
}

/// Parsed command line
#[derive(Debug, Default)]
struct Options {
    config: Option<PathBuf>,
    log: Option<PathBuf>,
    write_config: Option<PathBuf>,
    list: bool,
    file: Option<PathBuf>,
}

fn parse_args(args: &[String]) -> Result<Option<Options>> {
    let mut options = Options::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let value = iter.next().context("--config requires a file path")?;
                options.config = Some(PathBuf::from(value));
            }
            "--log" => {
                let value = iter.next().context("--log requires a file path")?;
                options.log = Some(PathBuf::from(value));
            }
            "--write-config" => {
                let value = iter.next().context("--write-config requires a file path")?;
                options.write_config = Some(PathBuf::from(value));
            }
            "--list" => options.list = true,
            "--help" | "-h" => return Ok(None),
            other if other.starts_with('-') => bail!("Unknown option: {}", other),
            other => {
                if options.file.is_some() {
                    bail!("Only one live set can be opened, got extra argument: {}", other);
                }
                options.file = Some(PathBuf::from(other));
            }
        }
    }

    Ok(Some(options))
}

fn init_logging(options: &Options) -> Result<()> {
    if let Some(path) = &options.log {
        // The terminal UI owns stdout
        let file = File::create(path)
            .with_context(|| format!("Failed to create log file: {:?}", path))?;
        tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else if options.list {
        tracing_subscriber::fmt()
            .with_max_level(Level::WARN)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

fn list_tracks(config: &EditorConfig, file: Option<&PathBuf>) -> Result<()> {
    let Some(path) = file else {
        bail!("--list requires a live set to read");
    };
    let document = serializer::load(path)?;
    let index = IndexBuilder::new()
        .with_unnamed_label(config.unnamed_track.clone())
        .build(&document)?;

    for line in outline(&render_tree(&index)) {
        println!("{}", line);
    }
    Ok(())
}

fn run_ui(config: EditorConfig, file: Option<PathBuf>) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let session = Session::new(config);

    let mut app = App::new(session, runtime.handle().clone())
        .context("Failed to initialize terminal")?;
    if let Some(path) = file {
        app.open(path);
    }
    app.run().context("Terminal UI failed")?;

    info!("exiting");
    Ok(())
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();

    let options = match parse_args(&args) {
        Ok(Some(options)) => options,
        Ok(None) => {
            print_usage();
            return Ok(());
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            print_usage();
            std::process::exit(1);
        }
    };

    init_logging(&options)?;

    let config = match &options.config {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::default(),
    };

    if let Some(path) = &options.write_config {
        config.save(path)?;
        println!("Settings written to {}", path.display());
        return Ok(());
    }
    if options.list {
        return list_tracks(&config, options.file.as_ref());
    }
    run_ui(config, options.file)
}
