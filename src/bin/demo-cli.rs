use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;

use telemetry_demo::config::schema::LoadProfile;

#[derive(Parser)]
#[command(name = "demo-cli")]
#[command(about = "Client for the telemetry demo service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8088")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Call an endpoint once, e.g. `call "/calc?x=3&y=4"`
    Call { path: String },
    /// Check service liveness
    Health,
    /// Print the job table of a load profile
    Profile {
        #[arg(value_enum)]
        name: ProfileName,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ProfileName {
    Comprehensive,
    Minimal,
}

impl From<ProfileName> for LoadProfile {
    fn from(name: ProfileName) -> Self {
        match name {
            ProfileName::Comprehensive => LoadProfile::Comprehensive,
            ProfileName::Minimal => LoadProfile::Minimal,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Call { path } => {
            let path = if path.starts_with('/') { path } else { format!("/{}", path) };
            let res = reqwest::get(format!("{}{}", base, path)).await?;
            print_response(res).await?;
        }
        Commands::Health => {
            let res = reqwest::get(format!("{}/actuator/health", base)).await?;
            print_response(res).await?;
        }
        Commands::Profile { name } => {
            let profile = LoadProfile::from(name);
            let table = serde_json::json!({
                "profile": profile,
                "defaults": {
                    "workers": profile.defaults().workers,
                    "connect_timeout_secs": profile.defaults().connect_timeout.as_secs(),
                    "read_timeout_secs": profile.defaults().read_timeout.as_secs(),
                },
                "jobs": profile.jobs(),
            });
            println!("{}", serde_json::to_string_pretty(&table)?);
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let request_id = res
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let text = res.text().await?;

    eprintln!("{} (request id {})", status, request_id);
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }

    if !status.is_success() {
        return Err(format!("service returned {}", status).into());
    }
    Ok(())
}
