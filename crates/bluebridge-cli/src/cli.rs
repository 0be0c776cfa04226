//! Command-line interface definition.

use clap::Parser;

use bluebridge_config::{ProtocolProfile, SocketEndpoint};

/// Sends one command line to the bluebridge daemon and prints the reply.
#[derive(Debug, Parser)]
#[command(
    name = "bluebridge",
    about = "Send a command to the bluebridge daemon",
    version
)]
pub struct Cli {
    /// Daemon endpoint, e.g. `unix:///run/user/1000/bluebridge/bluebridge.bluetooth.sock`
    /// or `tcp://127.0.0.1:9742`. Defaults to the well-known socket.
    #[arg(long, value_name = "URL")]
    pub socket: Option<SocketEndpoint>,

    /// Protocol profile the daemon speaks.
    #[arg(long, default_value_t = ProtocolProfile::Line)]
    pub profile: ProtocolProfile,

    /// Command verb and arguments, sent as a single line.
    #[arg(required = true, trailing_var_arg = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_socket_and_command() {
        let cli = Cli::parse_from([
            "bluebridge",
            "--socket",
            "tcp://127.0.0.1:9742",
            "SEND",
            "AA:BB:CC:DD:EE:FF",
            "hello",
            "world",
        ]);
        assert!(matches!(cli.socket, Some(SocketEndpoint::Tcp { .. })));
        assert_eq!(cli.profile, ProtocolProfile::Line);
        assert_eq!(cli.command, ["SEND", "AA:BB:CC:DD:EE:FF", "hello", "world"]);
    }

    #[test]
    fn profile_flag_selects_byte_replies() {
        let cli = Cli::parse_from(["bluebridge", "--profile", "byte", "enable"]);
        assert_eq!(cli.profile, ProtocolProfile::Byte);
    }
}
