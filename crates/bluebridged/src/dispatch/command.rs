//! Command-line parsing for both protocol profiles.

use bluebridge_config::ProtocolProfile;
use thiserror::Error;

/// One parsed client command.
///
/// Produced fresh per input line and never mutated. The variant set is the
/// union of both profiles' verb tables; each profile's parser only produces
/// the variants its table routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Enable,
    Disable,
    IsEnabled,
    List,
    ScanStart,
    ScanStop,
    Exit,
    Pair {
        address: String,
    },
    Connect {
        address: String,
        service: String,
    },
    Send {
        address: String,
        payload: String,
    },
    Recv {
        address: String,
    },
    Disconnect {
        address: String,
    },
    GattConnect {
        address: String,
    },
    GattRead {
        address: String,
        characteristic: String,
    },
    GattWrite {
        address: String,
        characteristic: String,
        value: Vec<u8>,
    },
}

/// Parse failures. Display text is client-facing: the dispatcher renders it
/// into `ERROR <reason>` replies (unknown verbs get their own reply shape).
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required device address argument is absent.
    #[error("Missing MAC")]
    MissingAddress,

    /// Arguments do not match the verb's usage.
    #[error("{usage}")]
    Usage { usage: &'static str },

    /// GATT write payload is not valid hex (odd length or non-hex digit).
    #[error("Invalid hex payload")]
    InvalidHex(#[source] hex::FromHexError),

    /// Verb not present in the active profile's table.
    #[error("unknown command: {verb}")]
    UnknownVerb { verb: String },
}

impl Command {
    /// Parses one input line under the given profile's verb table.
    ///
    /// # Errors
    ///
    /// Returns a [`CommandError`] describing the malformed input; the caller
    /// turns it into an error reply and keeps the session loop running.
    pub fn parse(line: &str, profile: ProtocolProfile) -> Result<Self, CommandError> {
        match profile {
            ProtocolProfile::Line => parse_line_profile(line),
            ProtocolProfile::Byte => parse_byte_profile(line),
        }
    }
}

fn parse_line_profile(line: &str) -> Result<Command, CommandError> {
    let mut tokens = line.split_whitespace();
    let verb = tokens.next().unwrap_or_default();
    match verb {
        "ENABLE" => Ok(Command::Enable),
        "DISABLE" => Ok(Command::Disable),
        "LIST" => Ok(Command::List),
        "EXIT" => Ok(Command::Exit),
        "PAIR" => Ok(Command::Pair {
            address: address_token(tokens.next())?,
        }),
        "CONNECT" => match (tokens.next(), tokens.next()) {
            (Some(address), Some(service)) => Ok(Command::Connect {
                address: address.to_owned(),
                service: service.to_owned(),
            }),
            _ => Err(CommandError::Usage {
                usage: "CONNECT <MAC> <UUID>",
            }),
        },
        "SEND" => parse_send(line),
        "RECV" => match tokens.next() {
            Some(address) => Ok(Command::Recv {
                address: address.to_owned(),
            }),
            None => Err(CommandError::Usage {
                usage: "RECV <MAC>",
            }),
        },
        "DISCONNECT" => match tokens.next() {
            Some(address) => Ok(Command::Disconnect {
                address: address.to_owned(),
            }),
            None => Err(CommandError::Usage {
                usage: "DISCONNECT <MAC>",
            }),
        },
        "GATT_CONNECT" => Ok(Command::GattConnect {
            address: address_token(tokens.next())?,
        }),
        "GATT_READ" => match (tokens.next(), tokens.next()) {
            (Some(address), Some(characteristic)) => Ok(Command::GattRead {
                address: address.to_owned(),
                characteristic: characteristic.to_owned(),
            }),
            _ => Err(CommandError::Usage {
                usage: "GATT_READ <MAC> <UUID>",
            }),
        },
        "GATT_WRITE" => match (tokens.next(), tokens.next(), tokens.next()) {
            (Some(address), Some(characteristic), Some(payload)) => {
                let value = hex::decode(payload).map_err(CommandError::InvalidHex)?;
                Ok(Command::GattWrite {
                    address: address.to_owned(),
                    characteristic: characteristic.to_owned(),
                    value,
                })
            }
            _ => Err(CommandError::Usage {
                usage: "GATT_WRITE <MAC> <UUID> <HEX>",
            }),
        },
        other => Err(CommandError::UnknownVerb {
            verb: other.to_owned(),
        }),
    }
}

/// SEND keeps the raw remainder of the line after the address, embedded
/// spaces included, so tokenizing must not run past the second field.
fn parse_send(line: &str) -> Result<Command, CommandError> {
    let mut split = line.splitn(3, ' ');
    let _verb = split.next();
    let address = split.next().filter(|token| !token.is_empty());
    let payload = split.next();
    match (address, payload) {
        (Some(address), Some(payload)) => Ok(Command::Send {
            address: address.to_owned(),
            payload: payload.to_owned(),
        }),
        _ => Err(CommandError::Usage {
            usage: "SEND <MAC> <DATA>",
        }),
    }
}

fn parse_byte_profile(line: &str) -> Result<Command, CommandError> {
    let mut tokens = line.split_whitespace();
    let verb = tokens.next().unwrap_or_default();
    match verb {
        "enable" => Ok(Command::Enable),
        "is_enabled" => Ok(Command::IsEnabled),
        "list_paired" => Ok(Command::List),
        "ble_scan" => Ok(Command::ScanStart),
        "ble_stop" => Ok(Command::ScanStop),
        "gatt_connect" => Ok(Command::GattConnect {
            address: address_token(tokens.next())?,
        }),
        other => Err(CommandError::UnknownVerb {
            verb: other.to_owned(),
        }),
    }
}

fn address_token(token: Option<&str>) -> Result<String, CommandError> {
    token.map(str::to_owned).ok_or(CommandError::MissingAddress)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    const ADDR: &str = "AA:BB:CC:DD:EE:FF";

    fn parse_line(line: &str) -> Result<Command, CommandError> {
        Command::parse(line, ProtocolProfile::Line)
    }

    #[test]
    fn parses_bare_verbs() {
        assert_eq!(parse_line("ENABLE").unwrap(), Command::Enable);
        assert_eq!(parse_line("DISABLE").unwrap(), Command::Disable);
        assert_eq!(parse_line("LIST").unwrap(), Command::List);
        assert_eq!(parse_line("EXIT").unwrap(), Command::Exit);
    }

    #[test]
    fn verbs_are_case_sensitive() {
        assert!(matches!(
            parse_line("enable"),
            Err(CommandError::UnknownVerb { .. })
        ));
    }

    #[test]
    fn send_preserves_embedded_spaces() {
        let command = parse_line(&format!("SEND {ADDR} hello world  twice")).unwrap();
        assert_eq!(
            command,
            Command::Send {
                address: ADDR.to_owned(),
                payload: "hello world  twice".to_owned(),
            }
        );
    }

    #[test]
    fn send_without_payload_is_usage_error() {
        let error = parse_line(&format!("SEND {ADDR}")).unwrap_err();
        assert!(matches!(error, CommandError::Usage { .. }));
        assert_eq!(error.to_string(), "SEND <MAC> <DATA>");
    }

    #[test]
    fn pair_without_address_is_missing_mac() {
        let error = parse_line("PAIR").unwrap_err();
        assert_eq!(error.to_string(), "Missing MAC");
    }

    #[test]
    fn connect_requires_both_arguments() {
        let error = parse_line(&format!("CONNECT {ADDR}")).unwrap_err();
        assert_eq!(error.to_string(), "CONNECT <MAC> <UUID>");
    }

    #[test]
    fn gatt_write_decodes_hex_payload() {
        let command = parse_line(&format!("GATT_WRITE {ADDR} 2a00 0aff")).unwrap();
        assert_eq!(
            command,
            Command::GattWrite {
                address: ADDR.to_owned(),
                characteristic: "2a00".to_owned(),
                value: vec![0x0a, 0xff],
            }
        );
    }

    #[rstest]
    #[case("abc")]
    #[case("0g")]
    fn gatt_write_rejects_malformed_hex(#[case] payload: &str) {
        let error = parse_line(&format!("GATT_WRITE {ADDR} 2a00 {payload}")).unwrap_err();
        assert!(matches!(error, CommandError::InvalidHex(_)));
        assert_eq!(error.to_string(), "Invalid hex payload");
    }

    #[test]
    fn unknown_verb_carries_the_verb_back() {
        let error = parse_line("FOOBAR now what").unwrap_err();
        assert!(matches!(
            error,
            CommandError::UnknownVerb { ref verb } if verb == "FOOBAR"
        ));
    }

    #[test]
    fn byte_profile_speaks_lowercase_table() {
        let parse = |line: &str| Command::parse(line, ProtocolProfile::Byte);
        assert_eq!(parse("enable").unwrap(), Command::Enable);
        assert_eq!(parse("is_enabled").unwrap(), Command::IsEnabled);
        assert_eq!(parse("list_paired").unwrap(), Command::List);
        assert_eq!(parse("ble_scan").unwrap(), Command::ScanStart);
        assert_eq!(parse("ble_stop").unwrap(), Command::ScanStop);
        assert_eq!(
            parse(&format!("gatt_connect {ADDR}")).unwrap(),
            Command::GattConnect {
                address: ADDR.to_owned()
            }
        );
        assert!(matches!(
            parse("ENABLE"),
            Err(CommandError::UnknownVerb { .. })
        ));
        assert!(matches!(parse("EXIT"), Err(CommandError::UnknownVerb { .. })));
    }
}
