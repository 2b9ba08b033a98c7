//! klip-panel: command line panel for a Klipper printer

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use klip_client::link::DEFAULT_SUBSCRIBED_OBJECTS;
use klip_client::{FileApi, LinkEvent, PrinterService};
use klip_panel::{AuthStore, PanelConfig, PrinterStore, logger};
use shared::gcode::{self, Axis, DEFAULT_SPEED};
use shared::temperature::{self, TEMPERATURE_PRESETS, format_temperature};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "klip-panel")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Panel API base URL
    #[arg(long, global = true, env = "KLIP_API_URL")]
    api_url: Option<String>,

    /// Printer host base URL
    #[arg(long, global = true, env = "KLIP_PRINTER_URL")]
    printer_url: Option<String>,

    /// Printer websocket URL
    #[arg(long, global = true, env = "KLIP_WS_URL")]
    ws_url: Option<String>,

    /// Log level when RUST_LOG is unset
    #[arg(long, global = true, env = "KLIP_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show printer host info
    Info,

    /// Query printer objects (default: the subscribed set)
    Status { objects: Vec<String> },

    /// Run a G-code script
    Gcode { script: String },

    /// Home the given axes, all when none are given
    Home { axes: Vec<Axis> },

    /// Move one axis relative to its current position
    Jog {
        axis: Axis,

        #[arg(allow_negative_numbers = true)]
        distance: f64,

        /// Feed rate in mm/min
        #[arg(short, long, default_value_t = DEFAULT_SPEED)]
        speed: u32,
    },

    /// Show heater limits, or heat to a material preset
    Temps { preset: Option<String> },

    /// Log in to the panel API
    Login { username: String, password: String },

    /// Drop the stored session token
    Logout,

    /// List files on the panel API
    Files,

    /// Check whether a webcam stream answers
    Webcam { url: String },

    /// Keep the printer link open and print every message until Ctrl-C
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    logger::init_logger_with_level(Some(&cli.log_level), cli.json_logs);

    let config = PanelConfig::from_env().with_overrides(cli.api_url, cli.printer_url, cli.ws_url);
    let client_config = config.client_config();

    let request_client = client_config.build_request_client()?;
    let printer_api = Arc::new(client_config.build_printer_api()?);
    let printer = PrinterStore::new(printer_api.clone(), client_config.build_link());
    let auth = Arc::new(AuthStore::new(request_client.clone()));
    let _session_events = auth.spawn_event_listener();

    match cli.command {
        Commands::Info => {
            let info = printer
                .fetch_printer_info()
                .await
                .context("Failed to fetch printer info")?;
            println!("state:    {}", printer.printer_status());
            if !info.state_message.is_empty() {
                println!("message:  {}", info.state_message);
            }
            println!("hostname: {}", info.hostname);
            println!("version:  {}", info.software_version);
        }

        Commands::Status { objects } => {
            let objects = if objects.is_empty() {
                DEFAULT_SUBSCRIBED_OBJECTS.iter().map(|s| s.to_string()).collect()
            } else {
                objects
            };
            let query = printer_api.query_objects(&objects).await?;
            println!("{}", serde_json::to_string_pretty(&query.status)?);
        }

        Commands::Gcode { script } => {
            let response = printer.send_gcode(&script).await?;
            println!("{}", response);
        }

        Commands::Home { axes } => {
            printer.send_gcode(&gcode::home(&axes)).await?;
        }

        Commands::Jog {
            axis,
            distance,
            speed,
        } => {
            printer.send_gcode(&gcode::jog(axis, distance, speed)).await?;
        }

        Commands::Temps { preset: None } => {
            let limits = printer.temperature_limits().await?;
            println!(
                "extruder:   {} - {}",
                format_temperature(limits.extruder.min_temp),
                format_temperature(limits.extruder.max_temp)
            );
            println!(
                "heater_bed: {} - {}",
                format_temperature(limits.heater_bed.min_temp),
                format_temperature(limits.heater_bed.max_temp)
            );
            for p in TEMPERATURE_PRESETS {
                let fits = temperature::is_temperature_in_range(p.hotend, &limits.extruder)
                    && temperature::is_temperature_in_range(p.bed, &limits.heater_bed);
                let note = if fits { "" } else { " (clamped)" };
                println!(
                    "{:<5} {}/{}{}  {}",
                    p.name,
                    format_temperature(p.hotend),
                    format_temperature(p.bed),
                    note,
                    p.description
                );
            }
        }

        Commands::Temps { preset: Some(name) } => {
            let Some(preset) = temperature::preset(&name) else {
                bail!("Unknown preset '{}'", name);
            };
            let target = printer.apply_preset(preset).await?;
            println!(
                "{}: hotend {} bed {}",
                preset.name,
                format_temperature(target.hotend),
                format_temperature(target.bed)
            );
        }

        Commands::Login { username, password } => {
            if config.token_file.is_none() {
                tracing::warn!("KLIP_TOKEN_FILE is unset, the token is kept for this run only");
            }
            if !auth.login(&username, &password).await {
                bail!("Login failed");
            }
            println!("Logged in as {}", username);
        }

        Commands::Logout => {
            auth.logout();
        }

        Commands::Files => {
            if !auth.is_authenticated() {
                tracing::warn!("No session token, the API may reject the request");
            }
            let list = FileApi::new(request_client).list().await?;
            for file in list.files {
                println!("{:>10}  {}  {}", file.size, file.modified, file.filename);
            }
        }

        Commands::Webcam { url } => {
            let available = printer_api.webcam_available(&url).await;
            println!("{}", if available { "available" } else { "unavailable" });
        }

        Commands::Watch => {
            let mut events = printer.link().events();
            printer.init_websocket();

            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    event = events.recv() => match event {
                        Ok(LinkEvent::Message(message)) => println!("{}", message),
                        Ok(LinkEvent::GaveUp) => break,
                        Ok(other) => tracing::debug!(?other, "Link event"),
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {}
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    },
                }
            }

            printer.disconnect();
            tracing::info!("Stopped watching");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn env_of(id: &str) -> Option<String> {
        Cli::command()
            .get_arguments()
            .find(|arg| arg.get_id() == id)
            .and_then(|arg| arg.get_env())
            .map(|env| env.to_string_lossy().into_owned())
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_url_flags_read_environment() {
        assert_eq!(env_of("api_url").as_deref(), Some("KLIP_API_URL"));
        assert_eq!(env_of("printer_url").as_deref(), Some("KLIP_PRINTER_URL"));
        assert_eq!(env_of("ws_url").as_deref(), Some("KLIP_WS_URL"));
        assert_eq!(env_of("log_level").as_deref(), Some("KLIP_LOG_LEVEL"));
    }

    #[test]
    fn test_flags_parse() {
        let cli = Cli::try_parse_from([
            "klip-panel",
            "jog",
            "z",
            "-0.5",
            "--printer-url",
            "http://voron.local:7125",
        ])
        .unwrap();
        assert_eq!(cli.printer_url.as_deref(), Some("http://voron.local:7125"));
        assert!(matches!(
            cli.command,
            Commands::Jog { axis: Axis::Z, distance, speed: DEFAULT_SPEED } if distance == -0.5
        ));
    }
}
