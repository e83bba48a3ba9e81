//! Request parameter signing
//!
//! Parameters are sorted by key, joined as `key=value` pairs, suffixed with
//! the shared secret and hashed with MD5. Both sides of a call compute the
//! same string, so the signature proves the caller knows the secret and
//! that the parameters were not altered.

use crate::config::SigningConfig;
use crate::models::Row;
use serde_json::Value;

/// Parameter carrying the signature itself; excluded from the signed string
pub const SIGN_PARAM: &str = "sign";

/// Lowercase hex MD5 of `data`
pub fn md5_hex(data: impl AsRef<[u8]>) -> String {
    format!("{:x}", md5::compute(data))
}

/// Signs and verifies parameter maps with a shared secret
#[derive(Clone)]
pub struct ParamSigner {
    secret: String,
}

impl ParamSigner {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn from_config(config: &SigningConfig) -> Self {
        Self::new(config.param_secret.clone())
    }

    /// Uppercase hex MD5 of the canonical parameter string.
    ///
    /// Values render as JSON text, except that strings are unquoted and null
    /// becomes `<nil>`. Floats keep their fraction (`1.0`) and arrays render
    /// as `[1,2]`, so signatures from clients that format values with Go's
    /// `%v` (`1`, `[1 2]`) only agree on strings, integers and booleans.
    pub fn sign(&self, params: &Row) -> String {
        md5_hex(self.signing_string(params, None)).to_uppercase()
    }

    /// Check `signature` against `params`, ignoring any `sign` entry.
    /// Hex case does not matter.
    pub fn verify(&self, params: &Row, signature: &str) -> bool {
        let expected = md5_hex(self.signing_string(params, Some(SIGN_PARAM)));
        let matches = expected.eq_ignore_ascii_case(signature.trim());
        if !matches {
            tracing::debug!("Parameter signature mismatch");
        }
        matches
    }

    fn signing_string(&self, params: &Row, skip: Option<&str>) -> String {
        let mut keys: Vec<&String> = params
            .keys()
            .filter(|k| Some(k.as_str()) != skip)
            .collect();
        keys.sort();

        let joined = keys
            .iter()
            .map(|k| format!("{}={}", k, render_value(&params[k.as_str()])))
            .collect::<Vec<_>>()
            .join("&");

        format!("{}&paramsSecret={}", joined, self.secret)
    }
}

impl std::fmt::Debug for ParamSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParamSigner")
            .field("secret", &"<redacted>")
            .finish()
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "<nil>".to_string(),
        other => other.to_string(),
    }
}
