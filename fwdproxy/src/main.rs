use clap::{Parser, error::ErrorKind};
use fwdproxy_config::ProxyConfig;
use fwdproxy_core::Master;
use tracing::info;
use utils::init_tracing;

/// Caching forward proxy for HTTP/1.0 GET requests.
#[derive(Debug, Parser)]
#[command(name = "fwdproxy", version)]
struct Cli {
    /// TCP port to listen on.
    port: u16,

    /// INI file with optional [global], [http] and [cache] sections.
    #[arg(long, default_value = "fwdproxy.conf")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            let prog = std::env::args().next().unwrap_or_else(|| "fwdproxy".into());
            eprintln!("{e}");
            eprintln!("usage: {prog} <port>");
            std::process::exit(1);
        }
    };

    init_tracing();

    let cfg = ProxyConfig::from_file_or_default(&cli.config).with_port(cli.port);
    info!(target: "fwdproxy::master", config = %cli.config, port = cli.port, "Configuration loaded");

    Master::new(cfg).run().await
}
