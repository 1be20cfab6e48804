//! chunkline: command-line client for the chunk-framed index protocol.
//!
//! One subcommand per server route:
//! - search: query the inverted index
//! - add-file / remove-file: manage indexed files
//! - download: fetch a file's content
//!
//! `--persistent` reuses one connection for all requests of the run;
//! the default opens a fresh connection per request.

use chunkline::config::{ClientConfig, ConnectionArgs};
use chunkline::envelope::Response;
use chunkline::routes::{self, FileContent, SearchResult, StatusMessage};
use chunkline::{OneShotClient, PersistentClient, Request};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "chunkline")]
#[command(version = "0.1.0")]
#[command(about = "TCP client for the chunk-framed index protocol", long_about = None)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Reuse one connection for all requests instead of opening one per
    /// request
    #[arg(long)]
    persistent: bool,

    /// Number of times to issue the request
    #[arg(long, default_value_t = 1)]
    repeat: u32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search the index
    Search {
        /// Query terms
        query: String,
    },
    /// Add a file to the index
    AddFile {
        /// Server-side file path
        path: String,
    },
    /// Remove a file from the index
    RemoveFile {
        /// Server-side file path
        path: String,
    },
    /// Fetch a file's content
    Download {
        /// Server-side file path
        path: String,
    },
}

impl Command {
    fn request(&self) -> Request {
        match self {
            Command::Search { query } => routes::search(query),
            Command::AddFile { path } => routes::add_file(path),
            Command::RemoveFile { path } => routes::remove_file(path),
            Command::Download { path } => routes::download(path),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = ClientConfig::resolve(&cli.connection)?;

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!(
        address = %config.address(),
        chunk_size = config.chunk_size,
        persistent = cli.persistent,
        repeat = cli.repeat,
        "Starting chunkline client"
    );

    let request = cli.command.request();

    if cli.persistent {
        let mut client = PersistentClient::new(config);
        client.connect()?;
        for _ in 0..cli.repeat {
            let response = client.fetch_open_conn(&request)?;
            render(&cli.command, &response);
        }
        client.close();
    } else {
        let client = OneShotClient::new(config);
        for _ in 0..cli.repeat {
            let response = client.fetch(&request)?;
            render(&cli.command, &response);
        }
    }

    Ok(())
}

/// Print a response, decoding the route's body shape when the server
/// reported success and falling back to raw JSON otherwise.
fn render(command: &Command, response: &Response) {
    if !response.status.is_ok() {
        match response.parse_body::<StatusMessage>() {
            Ok(outcome) => println!("{}: {}", response.status, outcome.message),
            Err(_) => println!("{}: {}", response.status, response.body),
        }
        return;
    }

    match command {
        Command::Search { query } => match response.parse_body::<SearchResult>() {
            Ok(result) => {
                println!("{} file(s) match \"{}\":", result.files.len(), query);
                for file in &result.files {
                    println!("  {}", file);
                }
            }
            Err(e) => fallback(response, e),
        },
        Command::Download { .. } => match response.parse_body::<FileContent>() {
            Ok(content) => println!("{}", content.file_content),
            Err(e) => fallback(response, e),
        },
        Command::AddFile { .. } | Command::RemoveFile { .. } => {
            match response.parse_body::<StatusMessage>() {
                Ok(outcome) => println!("{}: {}", response.status, outcome.message),
                Err(_) => println!("{}", response.status),
            }
        }
    }
}

/// Raw JSON fallback for bodies that don't match the expected shape.
fn fallback(response: &Response, why: serde_json::Error) {
    debug!(error = %why, "response body did not match the route shape");
    match serde_json::to_string_pretty(&response.body) {
        Ok(pretty) => println!("{}", pretty),
        Err(_) => println!("{:?}", response.body),
    }
}
