//! Operator CLI for inspecting and bootstrapping a node's federation configuration.
//!
//! This binary never runs the HTTP server itself — that is the embedding application's job (§1
//! treats the routing framework as an external collaborator). It only covers the one-shot admin
//! tasks the core library can perform standalone: generating an actor keypair, validating and
//! printing the layered configuration, and computing a `Digest` header for a payload so it can be
//! compared against what a peer produced while debugging a federation issue.

use activitypub_node::config::FederationConfig;
use activitypub_node::keys::{digest_header, generate_local_keypair};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::io::Read;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fedctl", about = "Operator CLI for the ActivityPub federation engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a fresh 2048-bit RSA keypair for a local actor and print it as PEM.
    Keygen,
    /// Mint a new local actor's full row (keypair, IRIs) as JSON, replacing the cron-like
    /// "create default user on bootstrap" step the reference implementation ran inline at
    /// startup. Emits to stdout for the operator's own store to ingest; this crate doesn't ship a
    /// durable store of its own.
    ActorCreate {
        /// The actor's `preferredUsername`, e.g. `alice`.
        username: String,
        /// Instance base URL, e.g. `https://example.test`.
        #[arg(long)]
        base_url: String,
    },
    /// Load and validate configuration the way the node would at startup, then print it redacted.
    Config {
        /// Optional TOML file to layer under environment variables.
        #[arg(long)]
        file: Option<String>,
    },
    /// Compute the `Digest` header value for a file's exact bytes.
    Digest {
        /// Path to the file whose bytes should be digested; reads stdin when omitted.
        path: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Keygen => run_keygen(),
        Command::ActorCreate { username, base_url } => run_actor_create(&username, &base_url),
        Command::Config { file } => run_config(file.as_deref()),
        Command::Digest { path } => run_digest(path),
    }
}

fn run_keygen() -> anyhow::Result<()> {
    let keypair = generate_local_keypair()?;
    println!("{}", keypair.public_key_pem);
    println!("{}", keypair.private_key_pem());
    Ok(())
}

fn run_actor_create(username: &str, base_url: &str) -> anyhow::Result<()> {
    let base_url = base_url.trim_end_matches('/');
    let keypair = generate_local_keypair()?;
    let iri = format!("{base_url}/actors/{username}");

    let actor = json!({
        "iri": iri,
        "preferredUsername": username,
        "isLocal": true,
        "inboxIri": format!("{iri}/inbox"),
        "outboxIri": format!("{iri}/outbox"),
        "followersIri": format!("{iri}/followers"),
        "followingIri": format!("{iri}/following"),
        "likedIri": format!("{iri}/liked"),
        "sharedInboxIri": format!("{base_url}/inbox"),
        "publicKeyPem": keypair.public_key_pem,
        "privateKeyPem": keypair.private_key_pem(),
    });

    println!("{}", serde_json::to_string_pretty(&actor)?);
    Ok(())
}

fn run_config(file: Option<&str>) -> anyhow::Result<()> {
    let config = FederationConfig::from_env(file)?;
    println!("{}", config.redacted());
    Ok(())
}

fn run_digest(path: Option<PathBuf>) -> anyhow::Result<()> {
    let mut body = Vec::new();
    match path {
        Some(path) => {
            body = std::fs::read(path)?;
        }
        None => {
            std::io::stdin().read_to_end(&mut body)?;
        }
    }
    println!("{}", digest_header(&body));
    Ok(())
}
