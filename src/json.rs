// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Pretty JSON rendering.

use serde::Serialize;
use serde_json::Value;

/// Render serializable structure as pretty JSON.
///
/// # Errors
///
/// - Return [`JsonError::Serialize`] if structure cannot be serialized.
pub fn pretty<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(JsonError::Serialize)
}

/// Re-render JSON text as pretty JSON.
///
/// # Errors
///
/// - Return [`JsonError::Parse`] if text is not valid JSON.
pub fn pretty_text(text: impl AsRef<str>) -> Result<String> {
    let value: Value = serde_json::from_str(text.as_ref()).map_err(JsonError::Parse)?;
    pretty(&value)
}

/// JSON rendering error types.
#[derive(Debug, thiserror::Error)]
pub enum JsonError {
    /// Text is not valid JSON.
    #[error("cannot parse JSON text: {0}")]
    Parse(#[source] serde_json::Error),

    /// Structure cannot be represented as JSON.
    #[error("cannot serialize into JSON: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Friendly result alias :3
pub type Result<T, E = JsonError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    #[test]
    fn pretty_text_reformats_json() -> anyhow::Result<()> {
        let result = pretty_text(r#"{"a":[1,2],"b":{"c":null}}"#)?;
        let expect = indoc! {r#"
            {
              "a": [
                1,
                2
              ],
              "b": {
                "c": null
              }
            }"#};
        assert_eq!(result, expect);

        Ok(())
    }

    #[test]
    fn pretty_text_rejects_invalid_json() {
        assert!(matches!(pretty_text("{not json"), Err(JsonError::Parse(_))));
    }

    #[test]
    fn pretty_structure() -> anyhow::Result<()> {
        let structure = BTreeMap::from([("key", vec!["value"])]);
        assert_eq!(pretty(&structure)?, "{\n  \"key\": [\n    \"value\"\n  ]\n}");

        Ok(())
    }
}
