//! Parsing helpers for command-line task inputs.

use crate::error::CoreError;

/// Split an `owner/model` argument into its two slugs.
pub fn parse_model_arg(arg: &str) -> Result<(String, String), CoreError> {
    let arg = arg.trim();
    match arg.split_once('/') {
        Some((owner, model))
            if !owner.trim().is_empty() && !model.trim().is_empty() && !model.contains('/') =>
        {
            Ok((owner.trim().to_string(), model.trim().to_string()))
        }
        _ => Err(CoreError::Validation(format!(
            "model must be in owner/model format, got {arg:?}"
        ))),
    }
}

/// Parse a `key=value` pair. The value may itself contain `=`.
pub fn parse_key_value(pair: &str) -> Result<(String, String), CoreError> {
    match pair.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(CoreError::Validation(format!(
            "expected key=value, got {pair:?}"
        ))),
    }
}

/// Whether a task identifier is a numeric id rather than a socket token.
pub fn looks_like_numeric(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_arg_splits_owner_and_slug() {
        let (owner, model) = parse_model_arg("wiro/flux-dev").unwrap();
        assert_eq!(owner, "wiro");
        assert_eq!(model, "flux-dev");
    }

    #[test]
    fn model_arg_rejects_missing_parts() {
        assert!(parse_model_arg("flux-dev").is_err());
        assert!(parse_model_arg("/flux-dev").is_err());
        assert!(parse_model_arg("wiro/").is_err());
        assert!(parse_model_arg("a/b/c").is_err());
    }

    #[test]
    fn key_value_keeps_equals_in_value() {
        let (k, v) = parse_key_value("prompt=a=b").unwrap();
        assert_eq!(k, "prompt");
        assert_eq!(v, "a=b");
    }

    #[test]
    fn key_value_allows_empty_value() {
        let (k, v) = parse_key_value("seed=").unwrap();
        assert_eq!(k, "seed");
        assert_eq!(v, "");
    }

    #[test]
    fn key_value_rejects_missing_key() {
        assert!(parse_key_value("=value").is_err());
        assert!(parse_key_value("novalue").is_err());
    }

    #[test]
    fn numeric_detection() {
        assert!(looks_like_numeric("534574"));
        assert!(!looks_like_numeric(""));
        assert!(!looks_like_numeric("eDcCm5yy"));
        assert!(!looks_like_numeric("12a"));
    }
}
