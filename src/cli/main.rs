use clap::{Parser, Subcommand};
use reqwest::Client;
use serde_json::{Map, Value};
use std::error::Error;

#[derive(Parser)]
#[command(name = "isp-monitor-cli")]
#[command(about = "ISP monitor admin CLI", long_about = None)]
struct Cli {
    #[arg(short, long, env = "ISP_MONITOR_ENDPOINT", default_value = "http://localhost:8085")]
    endpoint: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check server health
    Health,

    /// Show live timers of every monitoring job
    Status,

    /// Show pending settings next to the running configuration
    Settings,

    /// Save settings and restart the monitoring jobs
    Set {
        /// KEY=VALUE pairs; values are parsed as JSON when possible
        #[arg(value_name = "KEY=VALUE", required = true)]
        pairs: Vec<String>,
    },

    /// Restart all jobs, or a single one
    Restart {
        /// signalWarning, signalRecap or offlineCheck
        #[arg(value_name = "KIND")]
        kind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let client = Client::new();

    let response = match cli.command {
        Commands::Health => client.get(format!("{}/health", cli.endpoint)).send().await?,

        Commands::Status => {
            client
                .get(format!("{}/api/monitoring/status", cli.endpoint))
                .send()
                .await?
        }

        Commands::Settings => {
            client
                .get(format!("{}/api/monitoring/settings", cli.endpoint))
                .send()
                .await?
        }

        Commands::Set { pairs } => {
            let patch = parse_pairs(&pairs)?;
            client
                .put(format!("{}/api/monitoring/settings", cli.endpoint))
                .json(&patch)
                .send()
                .await?
        }

        Commands::Restart { kind } => {
            let url = match kind {
                Some(kind) => format!("{}/api/monitoring/restart/{}", cli.endpoint, kind),
                None => format!("{}/api/monitoring/restart", cli.endpoint),
            };
            client.post(url).send().await?
        }
    };

    let status = response.status();
    let body: Value = response.json().await?;
    println!("{}", serde_json::to_string_pretty(&body)?);

    if !status.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

fn parse_pairs(pairs: &[String]) -> Result<Map<String, Value>, String> {
    let mut patch = Map::new();
    for pair in pairs {
        let (key, raw) = pair
            .split_once('=')
            .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", pair))?;
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        patch.insert(key.trim().to_string(), value);
    }
    Ok(patch)
}
