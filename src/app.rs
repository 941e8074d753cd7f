use crate::cli::{Cli, Commands};
use paneldash::{config, engine, logging, ui};
use std::path::PathBuf;
use std::process;

fn resolve_config_path(cli: &Cli) -> PathBuf {
    match &cli.config {
        Some(path) => path.clone(),
        None => config::Config::config_path().unwrap_or_else(|e| {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }),
    }
}

pub fn run(cli: Cli) {
    let config_path = resolve_config_path(&cli);

    // Handle subcommands first
    if let Some(command) = &cli.command {
        match command {
            Commands::CheckConfig { json } => handle_check_config(&config_path, *json),
            Commands::InitConfig => handle_init_config(&config_path),
        }
        return;
    }

    // First launch without --config gets a working default dashboard
    if cli.config.is_none() {
        match config::Config::ensure_default(&config_path) {
            Ok(true) => eprintln!("Created default config at {}", config_path.display()),
            Ok(false) => {}
            Err(e) => eprintln!("Warning: Could not create default config file: {:#}", e),
        }
    }

    let level = config::Config::load_from(&config_path)
        .map(|c| c.app.log_level)
        .unwrap_or_else(|_| "info".to_string());
    let log_path = cli
        .log_file
        .clone()
        .unwrap_or_else(|| logging::default_log_path(&config_path));
    if let Err(e) = logging::init(&log_path, &level) {
        eprintln!("Warning: logging disabled: {:#}", e);
    }

    tracing::info!(config = %config_path.display(), "starting dashboard");

    if let Err(e) = ui::run_ui(&config_path) {
        tracing::error!("dashboard failed: {:#}", e);
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn handle_check_config(path: &std::path::Path, json: bool) {
    let config = match config::Config::load_from(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    };

    match engine::Generation::from_config(0, &config) {
        Ok(generation) => {
            println!(
                "{}: OK ({} widgets on a {}x{} grid)",
                path.display(),
                generation.widgets().len(),
                generation.grid().columns,
                generation.grid().rows
            );
        }
        Err(e) if json && !e.validation_errors().is_empty() => {
            match serde_json::to_string_pretty(e.validation_errors()) {
                Ok(report) => println!("{}", report),
                Err(err) => eprintln!("Error: {}", err),
            }
            process::exit(1);
        }
        Err(e) => {
            eprintln!("{}: {}", path.display(), e);
            process::exit(1);
        }
    }
}

fn handle_init_config(path: &std::path::Path) {
    match config::Config::ensure_default(path) {
        Ok(true) => println!("Default config saved to {}", path.display()),
        Ok(false) => match config::Config::load_from(path) {
            Ok(cfg) => {
                println!("Config loaded successfully from {}", path.display());
                println!("{:#?}", cfg);
            }
            Err(e) => {
                println!("Config at {} is invalid: {:#}", path.display(), e);
                process::exit(1);
            }
        },
        Err(e) => {
            eprintln!("Failed to save default config: {:#}", e);
            process::exit(1);
        }
    }
}
