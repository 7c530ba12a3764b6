//! Legacy destination translation
//!
//! Docker-style contexts describe their endpoint as
//! `host=tcp://myserver:2376,ca=~/ca-file,cert=~/cert-file,key=~/key-file`.
//! Only the `host` value is understood here; anything else is rejected
//! rather than silently dropped.

use crate::error::ConnectionError;

/// Convert a compatibility `host=...` string into a canonical destination.
///
/// Strings without a `=` are assumed to already be destinations and are
/// returned as-is. An empty input yields an empty destination.
pub fn translate(raw: &str) -> Result<String, ConnectionError> {
    if raw.is_empty() {
        return Ok(String::new());
    }

    let Some((key, value)) = raw.split_once('=') else {
        return Ok(raw.to_string());
    };

    if key != "host" {
        return Err(ConnectionError::InvalidOption(format!(
            "key other than host supplied: {:?}",
            key
        )));
    }

    let mut segments = value.split(',');
    let destination = segments.next().unwrap_or_default();
    let rest: Vec<&str> = segments.collect();
    if !rest.is_empty() {
        return Err(ConnectionError::UnsupportedOption(format!(
            "additional options {:?} not supported",
            rest.join(",")
        )));
    }

    Ok(destination.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(translate("").unwrap(), "");
    }

    #[test]
    fn test_bare_destination_passes_through() {
        assert_eq!(translate("root@server").unwrap(), "root@server");
        assert_eq!(translate("tcp://h:1").unwrap(), "tcp://h:1");
    }

    #[test]
    fn test_host_key() {
        assert_eq!(translate("host=tcp://h:1").unwrap(), "tcp://h:1");
        assert_eq!(translate("host=").unwrap(), "");
    }

    #[test]
    fn test_extra_segments_rejected() {
        let err = translate("host=tcp://h:1,ca=x").unwrap_err();
        assert!(matches!(err, ConnectionError::UnsupportedOption(_)));
        assert!(err.to_string().contains("ca=x"));

        let err = translate("host=tcp://h:1,ca=~/ca,cert=~/cert").unwrap_err();
        assert!(err.to_string().contains("ca=~/ca,cert=~/cert"));
    }

    #[test]
    fn test_other_key_rejected() {
        let err = translate("user=foo").unwrap_err();
        assert!(matches!(err, ConnectionError::InvalidOption(_)));
    }

    #[test]
    fn test_only_first_equals_splits() {
        // The value may itself contain '='
        assert_eq!(
            translate("host=ssh://h/path?x=1").unwrap(),
            "ssh://h/path?x=1"
        );
    }
}
