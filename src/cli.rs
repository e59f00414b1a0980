use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use crate::api::MessagingApi;
use crate::config::Config;
use crate::dispatcher::Dispatcher;
use crate::media::MediaStore;
use crate::server::{self, AppState};

#[derive(Parser)]
#[command(name = "linecrab")]
#[command(about = "LINE Messaging API webhook bot", version)]
pub struct Cli {
    /// Port to listen on
    #[arg(short, long, default_value_t = 8000)]
    pub port: u16,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,

    /// Root of the static tree; downloaded media is published to `<dir>/tmp`
    #[arg(long, default_value = "static")]
    pub static_dir: PathBuf,
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    // Credentials are required up front; fail before binding the port.
    let config = Config::from_env()?;

    let media = MediaStore::open(cli.static_dir.join("tmp"))?;
    let api = MessagingApi::new(config.channel_access_token);
    let dispatcher = Dispatcher::new(api, media);
    let state = AppState::new(config.channel_secret, Arc::new(dispatcher));

    info!("linecrab {} starting", crate::VERSION);
    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
    server::serve(addr, state, cli.static_dir).await
}

fn init_tracing(debug: bool) {
    let default_filter = if debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.parse().unwrap());
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
