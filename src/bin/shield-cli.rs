use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "shield-cli")]
#[command(about = "Admin CLI for request-shield", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[arg(short, long, env = "SHIELD_ADMIN_KEY", default_value = "CHANGE_ME_IN_PRODUCTION")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show module status, queue depth and counters
    Status,
    /// Inspect or replace the blocklist
    Blocklist {
        #[command(subcommand)]
        action: BlocklistAction,
    },
    /// Show tracked session counts
    Sessions,
}

#[derive(Subcommand)]
enum BlocklistAction {
    /// Print the current entries
    Show,
    /// Replace the blocklist with the given addresses
    Set { entries: Vec<String> },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let res = match cli.command {
        Commands::Status => {
            client
                .get(format!("{}/admin/status", cli.url))
                .headers(headers)
                .send()
                .await?
        }
        Commands::Sessions => {
            client
                .get(format!("{}/admin/sessions", cli.url))
                .headers(headers)
                .send()
                .await?
        }
        Commands::Blocklist { action: BlocklistAction::Show } => {
            client
                .get(format!("{}/admin/blocklist", cli.url))
                .headers(headers)
                .send()
                .await?
        }
        Commands::Blocklist { action: BlocklistAction::Set { entries } } => {
            client
                .put(format!("{}/admin/blocklist", cli.url))
                .headers(headers)
                .json(&json!({ "entries": entries }))
                .send()
                .await?
        }
    };
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
