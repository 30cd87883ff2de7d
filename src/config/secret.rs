//! Secure credential handling using the secrecy crate
//!
//! Event Hubs connection strings embed a shared access key. They are held as
//! [`SecretString`] so they are zeroed on drop and never appear in `Debug`
//! output; [`redact_connection_string`] produces a printable form.
//!
//! ```rust
//! use vitalstream::config::{secret_string, redact_connection_string};
//! use secrecy::ExposeSecret;
//!
//! let conn = secret_string("Endpoint=sb://ns/;SharedAccessKey=abc;EntityPath=hub".to_string());
//! assert_eq!(
//!     redact_connection_string(conn.expose_secret().as_ref()),
//!     "Endpoint=sb://ns/;SharedAccessKey=***;EntityPath=hub"
//! );
//! ```

use secrecy::{CloneableSecret, DebugSecret, Secret, SerializableSecret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

/// Newtype wrapper for String that implements the required traits for Secret
#[derive(Clone, Debug, Zeroize)]
#[zeroize(drop)]
pub struct SecretValue(String);

impl CloneableSecret for SecretValue {}
impl DebugSecret for SecretValue {}
impl SerializableSecret for SecretValue {}

impl From<String> for SecretValue {
    fn from(s: String) -> Self {
        SecretValue(s)
    }
}

impl AsRef<str> for SecretValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for SecretValue {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl SecretValue {
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl Serialize for SecretValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SecretValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretValue)
    }
}

/// A string that is zeroed on drop and redacted in `Debug`
pub type SecretString = Secret<SecretValue>;

/// Wrap a String as a [`SecretString`]
#[inline]
pub fn secret_string(value: String) -> SecretString {
    Secret::new(SecretValue::from(value))
}

/// Replace `SharedAccessKey` and `SharedAccessSignature` values with `***`
pub fn redact_connection_string(connection_string: &str) -> String {
    connection_string
        .split(';')
        .map(|pair| match pair.split_once('=') {
            Some((key, _))
                if key.trim().eq_ignore_ascii_case("SharedAccessKey")
                    || key.trim().eq_ignore_ascii_case("SharedAccessSignature") =>
            {
                format!("{key}=***")
            }
            _ => pair.to_string(),
        })
        .collect::<Vec<_>>()
        .join(";")
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_secret_string_creation() {
        let secret = secret_string("Endpoint=sb://ns/".to_string());
        assert_eq!(secret.expose_secret(), "Endpoint=sb://ns/");
    }

    #[test]
    fn test_secret_debug_redacted() {
        let secret = secret_string("SharedAccessKey=sensitive".to_string());
        let debug_output = format!("{secret:?}");

        assert!(!debug_output.contains("sensitive"));
    }

    #[test]
    fn test_secret_serde() {
        #[derive(Serialize, Deserialize)]
        struct TestConfig {
            connection_string: SecretString,
        }

        let parsed: TestConfig = toml::from_str("connection_string = \"abc\"").unwrap();
        assert_eq!(parsed.connection_string.expose_secret(), "abc");
    }

    #[test]
    fn test_redact_signature_and_key() {
        let redacted = redact_connection_string(
            "Endpoint=sb://ns/;SharedAccessKeyName=listen;SharedAccessKey=abc=;SharedAccessSignature=sig",
        );
        assert_eq!(
            redacted,
            "Endpoint=sb://ns/;SharedAccessKeyName=listen;SharedAccessKey=***;SharedAccessSignature=***"
        );
    }
}
