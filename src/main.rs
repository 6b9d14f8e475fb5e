use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;
use swc_client::http::ClientOptions;
use swc_client::{ApiCaller, BackoffPolicy, CallerConfig, Endpoint};

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// swc-client - fantasy football API client
///
/// Calls one endpoint, retrying transient failures, and prints the status
/// code followed by the response body.
///
/// Examples:
///   swc-client health
///   swc-client players -p skip=0 -p limit=10
#[derive(Parser, Debug)]
#[command(author, version = env!("SWC_CLIENT_VERSION"), about)]
struct Cli {
    /// Endpoint to call
    #[arg(value_enum, value_name = "ENDPOINT")]
    endpoint: Endpoint,

    /// API base URL (also via SWC_API_BASE_URL)
    #[arg(
        long = "base-url",
        short = 'b',
        env = "SWC_API_BASE_URL",
        value_name = "URL",
        default_value = DEFAULT_BASE_URL
    )]
    base_url: String,

    /// Query parameter, may be repeated
    #[arg(long = "param", short = 'p', value_name = "KEY=VALUE", value_parser = parse_param)]
    params: Vec<(String, String)>,

    /// Total retry budget in milliseconds (defaults to 5000)
    #[arg(long = "max-elapsed-ms", value_name = "MS")]
    max_elapsed_ms: Option<u64>,

    /// Per-request timeout in seconds (defaults to 5)
    #[arg(long = "timeout-secs", value_name = "SECS")]
    timeout_secs: Option<u64>,
}

impl Cli {
    fn caller_config(&self) -> CallerConfig {
        let mut backoff = BackoffPolicy::default();
        if let Some(ms) = self.max_elapsed_ms {
            backoff = backoff.with_max_elapsed(Duration::from_millis(ms));
        }

        let mut client = ClientOptions::default();
        if let Some(secs) = self.timeout_secs {
            client.timeout = Duration::from_secs(secs);
        }

        CallerConfig { client, backoff }
    }
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no `=` found in `{}`", s))?;
    if key.is_empty() {
        return Err(format!("invalid KEY=VALUE: empty key in `{}`", s));
    }
    Ok((key.to_string(), value.to_string()))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let caller = ApiCaller::with_config(cli.caller_config());
    let params: Vec<(&str, &str)> = cli
        .params
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();

    let response = caller
        .call_endpoint(&cli.base_url, cli.endpoint, &params)
        .await;

    println!("{}", response.status_code());
    println!("{}", response.text());

    if response.status_code() >= 400 {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
