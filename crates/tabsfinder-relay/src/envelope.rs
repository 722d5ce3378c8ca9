use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What a host writes to the browser: the parsed message under a single
/// `msg` key.
///
/// An envelope only ever exists for payloads that parsed as JSON; malformed
/// payloads are logged and dropped, never forwarded as raw text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope {
    pub msg: Value,
}

impl Envelope {
    /// Parse a raw pipe payload into an envelope.
    ///
    /// Fails exactly when the payload is not valid JSON.
    pub fn parse(raw: &str) -> serde_json::Result<Self> {
        let msg: Value = serde_json::from_str(raw)?;
        Ok(Self { msg })
    }

    /// Serialized envelope bytes, ready for framing.
    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// Coerce client input into a parseable pipe payload.
///
/// Argv words joined with spaces are usually not valid JSON on their own;
/// anything that fails to parse is wrapped as a JSON string literal so the
/// host always receives a parseable document.
pub fn coerce_message(raw: &str) -> String {
    if serde_json::from_str::<Value>(raw).is_ok() {
        raw.to_string()
    } else {
        Value::String(raw.to_string()).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_wraps_parsed_value() {
        let env = Envelope::parse("\"getAllTabs\"").unwrap();
        assert_eq!(env.msg, Value::String("getAllTabs".into()));

        let bytes = env.to_bytes().unwrap();
        assert_eq!(bytes, br#"{"msg":"getAllTabs"}"#);
    }

    #[test]
    fn envelope_accepts_any_json_shape() {
        for raw in ["42", "null", "true", "[1,2]", r#"{"url":"*gmail.com*"}"#] {
            let env = Envelope::parse(raw).expect("valid JSON should parse");
            let round: Value = serde_json::from_slice(&env.to_bytes().unwrap()).unwrap();
            assert_eq!(round["msg"], serde_json::from_str::<Value>(raw).unwrap());
        }
    }

    #[test]
    fn envelope_rejects_malformed_payload() {
        assert!(Envelope::parse("not json at all").is_err());
        assert!(Envelope::parse("{\"unterminated\":").is_err());
    }

    #[test]
    fn coerce_passes_valid_json_through() {
        assert_eq!(coerce_message(r#"{"url":"*gmail.com*"}"#), r#"{"url":"*gmail.com*"}"#);
        assert_eq!(coerce_message("\"already a string\""), "\"already a string\"");
        assert_eq!(coerce_message("17"), "17");
    }

    #[test]
    fn coerce_wraps_plain_text_as_string_literal() {
        assert_eq!(coerce_message("focus"), "\"focus\"");
        assert_eq!(coerce_message(""), "\"\"");
        assert_eq!(
            coerce_message(r#"focus {"url":"*gmail.com*"}"#),
            r#""focus {\"url\":\"*gmail.com*\"}""#
        );
    }
}
