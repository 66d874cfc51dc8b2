use crate::error::{Error, Result};

/// The `Signature` request header, parsed into its named fields.
pub struct ParsedSignature {
    pub key_id: String,
    pub algorithm: String,
    pub headers: Vec<String>,
    pub signature: String,
}

impl ParsedSignature {
    /// Parse a `Signature` header value of the form
    /// `keyId="...",algorithm="...",headers="...",signature="..."`.
    pub fn parse(value: &str) -> Result<Self> {
        let mut key_id = None;
        let mut algorithm = None;
        let mut headers = None;
        let mut signature = None;

        for part in split_fields(value) {
            let Some((name, raw_value)) = part.split_once('=') else {
                continue;
            };
            let unquoted = raw_value.trim_matches('"');
            match name.trim() {
                "keyId" => key_id = Some(unquoted.to_string()),
                "algorithm" => algorithm = Some(unquoted.to_string()),
                "headers" => headers = Some(unquoted.to_string()),
                "signature" => signature = Some(unquoted.to_string()),
                _ => {}
            }
        }

        let key_id = key_id.ok_or_else(|| Error::Unauthorized("Signature missing keyId".to_string()))?;
        let signature =
            signature.ok_or_else(|| Error::Unauthorized("Signature missing signature".to_string()))?;
        let algorithm = algorithm.unwrap_or_else(|| "hs2019".to_string());
        let headers = headers
            .map(|h| h.split_whitespace().map(String::from).collect())
            .unwrap_or_default();

        Ok(ParsedSignature {
            key_id,
            algorithm,
            headers,
            signature,
        })
    }
}

/// Split on commas that are not inside a quoted value.
fn split_fields(value: &str) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (i, c) in value.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(value[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    fields.push(value[start..].trim());
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_header() {
        let header = r#"keyId="https://e.com/u/a#main-key",algorithm="rsa-sha256",headers="(request-target) host date digest",signature="Zm9v""#;
        let parsed = ParsedSignature::parse(header).unwrap();
        assert_eq!(parsed.key_id, "https://e.com/u/a#main-key");
        assert_eq!(parsed.algorithm, "rsa-sha256");
        assert_eq!(
            parsed.headers,
            vec!["(request-target)", "host", "date", "digest"]
        );
        assert_eq!(parsed.signature, "Zm9v");
    }

    #[test]
    fn missing_key_id_is_rejected() {
        let header = r#"algorithm="rsa-sha256",signature="Zm9v""#;
        assert!(ParsedSignature::parse(header).is_err());
    }
}
