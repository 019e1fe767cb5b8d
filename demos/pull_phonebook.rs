//! Pull a phone-book object from an OBEX peer reachable over TCP.
//!
//! ```text
//! cargo run --example pull_phonebook -- <host:port> [folder] [--sim] [--config client.json]
//! ```
//!
//! `folder` is one of `pb ich och mch cch spd fav` (default `pb`). Set
//! `RUST_LOG=obex_pbap=debug` to see each round trip.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use obex_pbap::{ClientConfig, Folder, PhonebookClient, PhonebookObject, Repository};
use tokio::net::TcpStream;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pull_phonebook", about = "Pull a phone-book object over OBEX")]
struct Cli {
    /// Peer address, e.g. 127.0.0.1:6500.
    addr: String,
    /// Folder to pull.
    #[arg(default_value = "pb", value_parser = parse_folder)]
    folder: Folder,
    /// Pull from the SIM card instead of the phone memory.
    #[arg(long)]
    sim: bool,
    /// Client configuration as JSON.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn parse_folder(name: &str) -> Result<Folder, String> {
    Folder::from_name(name).ok_or_else(|| format!("unknown folder {:?}", name))
}

impl Cli {
    fn object(&self) -> PhonebookObject {
        let repository = if self.sim {
            Repository::Sim1
        } else {
            Repository::Phone
        };
        PhonebookObject::new(repository, self.folder)
    }

    fn client_config(&self) -> Result<ClientConfig, Box<dyn std::error::Error>> {
        match &self.config {
            Some(path) => Ok(ClientConfig::from_json(&std::fs::read_to_string(path)?)?),
            None => Ok(ClientConfig {
                pull_timeout: Some(Duration::from_secs(60)),
                ..ClientConfig::default()
            }),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("obex_pbap=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let cli = Cli::parse();
    let object = cli.object();
    let config = cli.client_config()?;

    let stream = TcpStream::connect(&cli.addr).await?;
    tracing::info!("Connected to {}", cli.addr);

    let mut client = PhonebookClient::builder().config(config).build(stream);
    let response = client.connect().await?;
    tracing::info!(
        "OBEX session open, server max packet {}",
        response.max_packet_size
    );

    let result = client.pull_phonebook(&object).await;
    if client.is_connected() && !client.session().is_pull_in_progress() {
        if let Err(err) = client.disconnect().await {
            tracing::warn!("Disconnect failed: {}", err);
        }
    }

    let vcards = result?;
    tracing::info!("Pulled {} ({} bytes)", object, vcards.len());
    print!("{}", vcards);
    Ok(())
}
