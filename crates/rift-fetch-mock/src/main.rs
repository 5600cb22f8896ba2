//! Rift Fetch Mock CLI
//!
//! Validates route files and probes them with single calls, without writing
//! a test.
//!
//! Usage:
//!   rift-fetch-mock check routes.yaml
//!   rift-fetch-mock probe routes.yaml http://api.example.com/users/1 -X GET -H accept:application/json

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rift_fetch_mock::{FetchMock, RequestInit, RouteFile};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// ANSI color codes
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

/// Rift Fetch Mock - check and probe declarative route files
#[derive(Parser, Debug)]
#[command(name = "rift-fetch-mock")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load and compile every route in a route file
    Check {
        /// Path to a YAML or JSON route file
        file: PathBuf,
    },
    /// Dispatch one call against a route file and print the response
    Probe {
        /// Path to a YAML or JSON route file
        file: PathBuf,

        /// URL to call
        url: String,

        /// HTTP method
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,

        /// Request header as name:value (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// Request body
        #[arg(short, long)]
        body: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rift_fetch_mock=info".into()),
        )
        .with((!args.log_json).then(tracing_subscriber::fmt::layer))
        .with(args.log_json.then(|| tracing_subscriber::fmt::layer().json()))
        .init();

    match args.command {
        Command::Check { file } => check(file),
        Command::Probe {
            file,
            url,
            method,
            headers,
            body,
        } => probe(file, url, method, headers, body).await,
    }
}

fn check(path: PathBuf) -> Result<()> {
    println!("{BOLD}{CYAN}Checking{RESET} {}", path.display());
    let file = RouteFile::load(&path).with_context(|| format!("loading {}", path.display()))?;

    match FetchMock::from_route_file(&path) {
        Ok(mock) => {
            for route in mock.routes() {
                let method = route.method.as_deref().unwrap_or("*").to_uppercase();
                let repeat = route
                    .repeat
                    .map(|n| format!(" {DIM}(repeat {n}){RESET}"))
                    .unwrap_or_default();
                println!("  {GREEN}✓{RESET} {method:<7} {}{repeat}", route.identifier);
            }
            if file.fallback.is_some() {
                println!("  {GREEN}✓{RESET} fallback");
            }
            println!("{GREEN}{} routes OK{RESET}", mock.routes().len());
            Ok(())
        }
        Err(e) => {
            println!("  {RED}✗{RESET} {e}");
            bail!("{} is invalid", path.display())
        }
    }
}

async fn probe(
    path: PathBuf,
    url: String,
    method: String,
    headers: Vec<String>,
    body: Option<String>,
) -> Result<()> {
    let mock = FetchMock::from_route_file(&path)
        .with_context(|| format!("loading {}", path.display()))?;

    let mut init = RequestInit::new().method(method.as_str());
    for header in &headers {
        let Some((name, value)) = header.split_once(':') else {
            bail!("invalid header '{header}', expected name:value");
        };
        init = init.header(name.trim(), value.trim());
    }
    if let Some(body) = body {
        init = init.body(body);
    }

    println!("{BOLD}{CYAN}{}{RESET} {}", method.to_uppercase(), url);
    let response = mock.fetch(url.as_str(), Some(init))?.await?;

    let route = mock
        .last_call(rift_fetch_mock::CallFilter::All, None)
        .and_then(|call| call.route.clone())
        .unwrap_or_else(|| "fallback".to_string());
    println!("{DIM}matched:{RESET} {route}");
    println!(
        "{BOLD}{} {}{RESET}",
        response.status(),
        response.status_text()
    );
    for (name, value) in response.headers() {
        println!("{DIM}{}:{RESET} {}", name, value.to_str().unwrap_or("<binary>"));
    }
    let text = response.text().await?;
    if !text.is_empty() {
        println!();
        println!("{text}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_json_is_global() {
        let args = Args::try_parse_from(["rift-fetch-mock", "check", "routes.yaml", "--log-json"])
            .unwrap();
        assert!(args.log_json);
        assert!(matches!(args.command, Command::Check { .. }));

        let args = Args::try_parse_from(["rift-fetch-mock", "check", "routes.yaml"]).unwrap();
        assert!(!args.log_json);
    }
}
