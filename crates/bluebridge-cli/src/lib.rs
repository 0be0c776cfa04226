//! Thin client for the bluebridge daemon.
//!
//! Joins its positional arguments into one command line, sends it as a
//! single frame, and prints the reply: framed status lines for the `line`
//! profile (enumerations print every line until the empty-frame sentinel),
//! or `true`/`false` for the `byte` profile's boolean replies.

mod cli;
mod errors;
mod transport;

pub use cli::Cli;
pub use errors::AppError;

use std::io::Write;

use bluebridge_config::{ProtocolProfile, default_socket_endpoint};
use bluebridge_wire::{read_bool, read_frame, write_frame};

use transport::connect;

/// Exit code used when the daemon's reply reports a failure.
const EXIT_COMMAND_FAILED: i32 = 1;

/// Sends the command and prints the reply; returns the process exit code.
///
/// # Errors
///
/// Returns an [`AppError`] for connection, protocol, or output failures.
/// Error *replies* are not errors here: they print like any reply and map
/// to a non-zero exit code.
pub fn run(cli: &Cli, out: &mut dyn Write) -> Result<i32, AppError> {
    let endpoint = cli.socket.clone().unwrap_or_else(default_socket_endpoint);
    let line = cli.command.join(" ");

    let mut connection = connect(&endpoint)?;
    write_frame(&mut connection, &line)?;

    match cli.profile {
        ProtocolProfile::Byte => {
            let value = read_bool(&mut connection)?.ok_or(AppError::NoReply)?;
            writeln!(out, "{value}").map_err(AppError::Output)?;
            Ok(if value { 0 } else { EXIT_COMMAND_FAILED })
        }
        ProtocolProfile::Line => {
            let first = read_frame(&mut connection)?.ok_or(AppError::NoReply)?;
            if is_enumerating(&line) {
                let mut current = first;
                while !current.is_empty() {
                    writeln!(out, "{current}").map_err(AppError::Output)?;
                    current = read_frame(&mut connection)?.ok_or(AppError::NoReply)?;
                }
                Ok(0)
            } else {
                writeln!(out, "{first}").map_err(AppError::Output)?;
                Ok(reply_exit_code(&first))
            }
        }
    }
}

/// Enumerating verbs reply with lines until an empty-frame sentinel.
fn is_enumerating(line: &str) -> bool {
    line.split_whitespace().next() == Some("LIST")
}

fn reply_exit_code(reply: &str) -> i32 {
    if reply.starts_with("ERROR ") || reply.starts_with("UNKNOWN_COMMAND:") {
        EXIT_COMMAND_FAILED
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::thread;

    use bluebridge_config::SocketEndpoint;
    use bluebridge_wire::{read_frame as wire_read, write_frame as wire_write};
    use clap::Parser;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("ENABLED", 0)]
    #[case("CONNECTED AA:BB:CC:DD:EE:FF", 0)]
    #[case("ERROR Not connected", 1)]
    #[case("UNKNOWN_COMMAND: FOOBAR", 1)]
    fn reply_exit_codes(#[case] reply: &str, #[case] expected: i32) {
        assert_eq!(reply_exit_code(reply), expected);
    }

    #[test]
    fn only_list_enumerates() {
        assert!(is_enumerating("LIST"));
        assert!(!is_enumerating("RECV AA:BB:CC:DD:EE:FF"));
    }

    /// Fake daemon speaking one scripted exchange on an ephemeral port.
    fn fake_daemon(replies: Vec<String>) -> SocketEndpoint {
        let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind fake daemon");
        let port = listener.local_addr().expect("addr").port();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let _request = wire_read(&mut stream).expect("read request");
            for reply in replies {
                wire_write(&mut stream, &reply).expect("write reply");
            }
        });
        SocketEndpoint::tcp("127.0.0.1", port)
    }

    #[test]
    fn prints_single_status_reply() {
        let endpoint = fake_daemon(vec!["ENABLED".to_owned()]).to_string();
        let cli = Cli::parse_from(["bluebridge", "--socket", endpoint.as_str(), "ENABLE"]);

        let mut out = Vec::new();
        let code = run(&cli, &mut out).expect("run succeeds");
        assert_eq!(code, 0);
        assert_eq!(String::from_utf8(out).expect("utf8"), "ENABLED\n");
    }

    #[test]
    fn prints_listing_until_sentinel() {
        let endpoint = fake_daemon(vec![
            "Headset [11:22:33:44:55:66]".to_owned(),
            "Keyboard [66:55:44:33:22:11]".to_owned(),
            String::new(),
        ])
        .to_string();
        let cli = Cli::parse_from(["bluebridge", "--socket", endpoint.as_str(), "LIST"]);

        let mut out = Vec::new();
        let code = run(&cli, &mut out).expect("run succeeds");
        assert_eq!(code, 0);
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "Headset [11:22:33:44:55:66]\nKeyboard [66:55:44:33:22:11]\n"
        );
    }

    #[test]
    fn error_reply_maps_to_failure_exit_code() {
        let endpoint = fake_daemon(vec!["ERROR Not connected".to_owned()]).to_string();
        let cli = Cli::parse_from([
            "bluebridge",
            "--socket",
            endpoint.as_str(),
            "RECV",
            "AA:BB:CC:DD:EE:FF",
        ]);

        let mut out = Vec::new();
        let code = run(&cli, &mut out).expect("run succeeds");
        assert_eq!(code, 1);
    }
}
