use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "roster-cli")]
#[command(about = "Operator CLI for the roster fetch service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[arg(short, long, env = "ROSTER_ADMIN_KEY", default_value = "CHANGE_ME_IN_PRODUCTION")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check service status
    Status,
    /// Fetch the roster of a partition
    Members {
        partition: String,
        /// Only members holding this role
        #[arg(short, long)]
        filter: Option<String>,
        /// Bypass the bounded partial fetch
        #[arg(long)]
        force_refresh: bool,
    },
    /// Show fetch metrics
    Metrics {
        /// Reset counters after printing
        #[arg(long)]
        reset: bool,
    },
    /// Show circuit breaker state per partition
    Breakers,
    /// List partitions being warmed
    Warming,
    /// Start warming a partition
    Warm {
        partition: String,
        /// Role filters to warm alongside the full roster
        #[arg(short, long)]
        filter: Vec<String>,
    },
    /// Stop warming a partition
    Unwarm { partition: String },
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

    let base = cli.url.trim_end_matches('/');
    let request = |method: Method, path: String| {
        client
            .request(method, format!("{base}{path}"))
            .headers(headers.clone())
    };

    match cli.command {
        Commands::Status => {
            print_response(request(Method::GET, "/admin/status".into()).send().await?).await?;
        }
        Commands::Members {
            partition,
            filter,
            force_refresh,
        } => {
            let mut query = vec![("force_refresh", force_refresh.to_string())];
            if let Some(filter) = filter {
                query.push(("filter", filter));
            }
            let res = request(Method::GET, format!("/admin/members/{partition}"))
                .query(&query)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Metrics { reset } => {
            print_response(request(Method::GET, "/admin/metrics".into()).send().await?).await?;
            if reset {
                print_response(
                    request(Method::POST, "/admin/metrics/reset".into())
                        .send()
                        .await?,
                )
                .await?;
            }
        }
        Commands::Breakers => {
            print_response(request(Method::GET, "/admin/breakers".into()).send().await?).await?;
        }
        Commands::Warming => {
            print_response(request(Method::GET, "/admin/warming".into()).send().await?).await?;
        }
        Commands::Warm { partition, filter } => {
            let res = request(Method::POST, format!("/admin/warming/{partition}"))
                .json(&serde_json::json!({ "filters": filter }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Unwarm { partition } => {
            let res = request(Method::DELETE, format!("/admin/warming/{partition}"))
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
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

    let text = res.text().await?;
    if text.is_empty() {
        println!("{}", status);
        return Ok(());
    }

    let json: Value = serde_json::from_str(&text)?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
