mod app;
mod audio;
mod config;
mod constants;
mod controller;
mod error;
mod estimator;
mod playback;
mod status;
mod ui;

use app::ExitCode;
use clap::Parser;
use dialoguer::{Select, theme::ColorfulTheme};
use tracing_subscriber::EnvFilter;

fn list_devices() -> Result<(), Box<dyn std::error::Error>> {
    let device_list = audio::list_input_devices()?;

    if device_list.is_empty() {
        println!("No audio input devices found.");
        return Ok(());
    }

    // Interactive selection
    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Select an audio input device")
        .items(&device_list)
        .default(0)
        .interact()?;

    println!("{}", device_list[selection]);

    Ok(())
}

fn init_logging() {
    // Logs go to stderr so they never interleave with the status line on stdout
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    use config::{Args, Commands};

    init_logging();
    let args = Args::parse();

    match args.command {
        Commands::Run(run_args) => {
            let config = match config::Config::from_run_args(run_args) {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("Configuration error: {}", e);
                    std::process::exit(ExitCode::Config as i32);
                }
            };
            tracing::debug!(?config, "configuration loaded");

            match app::App::new(config).run().await {
                Ok(code) => std::process::exit(code as i32),
                Err(e) => {
                    eprintln!("\nError: {}", e);
                    std::process::exit(ExitCode::Error as i32);
                }
            }
        }
        Commands::List(_) => {
            if let Err(e) = list_devices() {
                eprintln!("Error listing devices: {}", e);
                std::process::exit(ExitCode::Error as i32);
            }
        }
    }
}
