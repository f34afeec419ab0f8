pub mod config;
pub mod palette;
pub mod serve;

use crate::bridge::session;
use crate::cli::Cli;
use crate::config::Config;

/// Port of the running bridge: `--port`, then the port file the bridge
/// wrote, then the configured default.
pub(crate) async fn resolve_port(cli: &Cli, config: &Config) -> u16 {
    if let Some(port) = cli.port {
        return port;
    }
    session::read_port_file()
        .await
        .unwrap_or(config.bridge.port)
}
