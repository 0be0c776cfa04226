use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Wire conventions spoken by bridge clients.
///
/// Both profiles share the same dispatcher; they differ in the verb table
/// they accept and in how replies are encoded. The `line` profile answers
/// every command with framed status text. The `byte` profile answers with a
/// single boolean byte and routes scan results and connection-state changes
/// to the notification sink instead of the requesting client.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ProtocolProfile {
    /// Framed status-line replies (`ENABLED`, `ERROR <reason>`, ...).
    #[default]
    Line,
    /// Single-byte boolean replies with out-of-band notifications.
    Byte,
}

/// Errors encountered while parsing a [`ProtocolProfile`] from text.
pub type ProtocolProfileParseError = strum::ParseError;
