use std::path::PathBuf;

use clap::Parser;
use log::info;
use tower_lsp::{LspService, Server};

use starlark_language_server::backend::Backend;

/// Language server for the Starlark configuration language.
#[derive(Parser, Debug)]
#[command(name = "starlark-language-server", version)]
struct Cli {
    /// Serve over stdio (the default transport).
    #[arg(long)]
    stdio: bool,

    /// Serve over TCP at the given `host:port` instead of stdio.
    #[arg(long, value_name = "HOST:PORT")]
    address: Option<String>,

    /// Additional stub directory or file to load as builtins. May be
    /// repeated.
    #[arg(long = "builtin", value_name = "PATH")]
    builtins: Vec<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(long)]
    debug: bool,

    /// Enable verbose (trace-level) logging.
    #[arg(long)]
    verbose: bool,
}

fn init_logging(cli: &Cli) {
    let level = if cli.verbose {
        "trace"
    } else if cli.debug {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    if let Some(address) = &cli.address {
        serve_tcp(address, cli.builtins).await;
    } else {
        serve_stdio(cli.builtins).await;
    }
}

async fn serve_stdio(builtins: Vec<PathBuf>) {
    info!("starting starlark-language-server over stdio");
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::build(|client| Backend::new(client, builtins)).finish();
    Server::new(stdin, stdout, socket).serve(service).await;
}

async fn serve_tcp(address: &str, builtins: Vec<PathBuf>) {
    info!("starting starlark-language-server on {address}");
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {address}: {e}"));
    let (stream, peer) = listener
        .accept()
        .await
        .unwrap_or_else(|e| panic!("failed to accept connection: {e}"));
    info!("accepted connection from {peer}");

    let (read, write) = tokio::io::split(stream);
    let (service, socket) = LspService::build(|client| Backend::new(client, builtins)).finish();
    Server::new(read, write, socket).serve(service).await;
}
