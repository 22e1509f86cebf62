//! Basic end-to-end check of a CARTA scripting connection.
//!
//! Opens (or appends) an image in an existing frontend session, switches it to
//! the viridis colormap and reports its shape.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use carta_scripting::{ClientConfig, Colormap, Session};

#[derive(Parser)]
#[command(author, version, about = "A basic test of the CARTA scripting client.", long_about = None)]
struct Args {
    /// Backend host [env: CARTA_HOST]
    #[arg(long)]
    host: Option<String>,

    /// Backend gRPC port [env: CARTA_GRPC_PORT]
    #[arg(long)]
    port: Option<u16>,

    /// Frontend session id [env: CARTA_SESSION_ID]
    #[arg(long)]
    session: Option<u32>,

    /// Image path, absolute or relative to the session's current directory
    #[arg(long)]
    image: String,

    /// Append the image instead of replacing the open images
    #[arg(long)]
    append: bool,

    /// Log every request and response
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.debug { "carta_scripting=debug" } else { "carta_scripting=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();

    let config = ClientConfig::from_env()?;
    let host = args.host.unwrap_or(config.host);
    let port = args.port.unwrap_or(config.port);
    let session_id = args
        .session
        .or(config.session_id)
        .context("a session id is required (--session or CARTA_SESSION_ID)")?;

    let session = Session::connect(&host, port, session_id);
    info!("Connected to {}", session);

    let image = if args.append {
        session.append_image(&args.image, None).await?
    } else {
        session.open_image(&args.image, None).await?
    };
    image.set_colormap(Colormap::Viridis, false).await?;

    info!("Image shape is {:?}", image.shape().await?);
    info!("Image name is {}", image.file_name());

    Ok(())
}
