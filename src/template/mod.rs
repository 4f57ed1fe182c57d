//! Response template engine.
//!
//! Turns a provider response into the final result string. The first pattern
//! of `RegexList` is matched against the body, then each `$...$` token in the
//! `URL` template is replaced by a capture group (`$1$`) or by a value found by
//! walking the JSON body (`$json:data,link$`). Without a `URL` template the
//! raw body is the result.

pub mod tokenizer;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use crate::provider::Provider;
use tokenizer::{TokenRef, classify, tokenize};

/// Errors raised while extracting a result from a response.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Invalid response pattern '{pattern}': {reason}")]
    InvalidRegex { pattern: String, reason: String },

    #[error("Template references capture group {0} but the provider has no RegexList")]
    NoRegex(usize),

    #[error("Response did not match pattern '{pattern}'")]
    NoMatch { pattern: String },

    #[error("Capture group {index} does not exist (pattern has {available})")]
    GroupOutOfRange { index: usize, available: usize },

    #[error("Response is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Key path '{0}' not found in JSON response")]
    MissingJsonKey(String),
}

/// Outcome of matching the provider's pattern against a response body.
#[derive(Debug, Clone)]
pub struct MatchContext {
    pattern: String,
    /// Whole match at index 0, then each group; `None` for groups that did not participate.
    groups: Option<Vec<Option<String>>>,
}

impl MatchContext {
    pub fn new(pattern: &str, body: &str) -> Result<Self, ExtractionError> {
        let regex = Regex::new(pattern).map_err(|e| ExtractionError::InvalidRegex {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        let groups = regex.captures(body).map(|caps| {
            caps.iter()
                .map(|group| group.map(|m| m.as_str().to_string()))
                .collect::<Vec<_>>()
        });
        if groups.is_none() {
            log::debug!("Pattern '{}' did not match the response", pattern);
        }
        Ok(Self {
            pattern: pattern.to_string(),
            groups,
        })
    }

    pub fn is_match(&self) -> bool {
        self.groups.is_some()
    }

    /// Text of capture group `index`; a group that did not participate is empty.
    pub fn group(&self, index: usize) -> Result<&str, ExtractionError> {
        let groups = self
            .groups
            .as_ref()
            .ok_or_else(|| ExtractionError::NoMatch {
                pattern: self.pattern.clone(),
            })?;
        groups
            .get(index)
            .map(|group| group.as_deref().unwrap_or_default())
            .ok_or(ExtractionError::GroupOutOfRange {
                index,
                available: groups.len().saturating_sub(1),
            })
    }
}

/// Produces the final result string for `provider` from a response body.
pub fn extract_result(provider: &Provider, body: &str) -> Result<String, ExtractionError> {
    let matched = provider
        .regex_list
        .first()
        .map(|pattern| MatchContext::new(pattern, body))
        .transpose()?;

    match &provider.url {
        Some(template) => render(template, body, matched.as_ref()),
        None => Ok(body.to_string()),
    }
}

/// Substitutes every token of `template`.
///
/// Tokens are resolved against the original body and match, and the output is
/// assembled from the token spans, so substituted text is never re-scanned.
pub fn render(
    template: &str,
    body: &str,
    matched: Option<&MatchContext>,
) -> Result<String, ExtractionError> {
    let tokens: Vec<_> = tokenize(template)
        .into_iter()
        .map(|token| {
            let reference = classify(token.inner);
            (token, reference)
        })
        .collect();

    let json = if tokens
        .iter()
        .any(|(_, reference)| matches!(reference, TokenRef::Json(_)))
    {
        serde_json::from_str(body)?
    } else {
        Value::Null
    };

    let mut output = String::with_capacity(template.len());
    let mut last = 0;
    for (token, reference) in &tokens {
        let replacement = match reference {
            TokenRef::Group(index) => matched
                .ok_or(ExtractionError::NoRegex(*index))?
                .group(*index)?
                .to_string(),
            TokenRef::Json(keys) => lookup_json(&json, keys)?,
            TokenRef::Literal => continue,
        };
        output.push_str(&template[last..token.span.start]);
        output.push_str(&replacement);
        last = token.span.end;
    }
    output.push_str(&template[last..]);
    Ok(output)
}

/// Walks `root` by object keys (or array indices) and renders the value found.
fn lookup_json(root: &Value, keys: &[&str]) -> Result<String, ExtractionError> {
    let mut current = root;
    for (depth, key) in keys.iter().enumerate() {
        let next = match current {
            Value::Object(map) => map.get(*key),
            Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        current = next.ok_or_else(|| ExtractionError::MissingJsonKey(keys[..=depth].join(",")))?;
    }
    Ok(match current {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{OrderedMap, RequestType};

    fn provider(regex: Option<&str>, url: Option<&str>) -> Provider {
        Provider {
            name: "Test".into(),
            request_type: RequestType::Post,
            request_url: "https://x.test".into(),
            file_form_name: None,
            data_only: false,
            multiline: false,
            arguments: OrderedMap::new(),
            headers: OrderedMap::new(),
            regex_list: regex.into_iter().map(str::to_string).collect(),
            url: url.map(str::to_string),
            source: None,
        }
    }

    #[test]
    fn group_reference_builds_url() {
        let p = provider(Some(r#""id":"(\w+)""#), Some("https://x.test/$1$"));
        assert_eq!(
            extract_result(&p, r#"{"id":"abc123"}"#).unwrap(),
            "https://x.test/abc123"
        );
    }

    #[test]
    fn json_path_traversal() {
        let p = provider(None, Some("$json:data,link$"));
        assert_eq!(
            extract_result(&p, r#"{"data":{"link":"https://y.test/z"}}"#).unwrap(),
            "https://y.test/z"
        );
    }

    #[test]
    fn no_template_returns_raw_body() {
        let p = provider(Some("never matches (x)"), None);
        assert_eq!(extract_result(&p, "raw body\n").unwrap(), "raw body\n");
    }

    #[test]
    fn tokens_resolve_against_original_response() {
        // Group 1 contains "$2$"; substituting it must not trigger another lookup.
        let p = provider(Some(r"a=(\S+) b=(\S+)"), Some("$1$/$2$/$1$"));
        assert_eq!(extract_result(&p, "a=$2$ b=two").unwrap(), "$2$/two/$2$");
    }

    #[test]
    fn mixes_groups_json_and_literal_tokens() {
        let p = provider(
            Some(r#""id":\s*(\d+)"#),
            Some("https://s.test/$0$?v=$json:meta,version$&keep=$name$"),
        );
        let body = r#"{"id": 42, "meta": {"version": 3}}"#;
        assert_eq!(
            extract_result(&p, body).unwrap(),
            r#"https://s.test/"id": 42?v=3&keep=$name$"#
        );
    }

    #[test]
    fn no_match_is_an_error_when_groups_are_needed() {
        let p = provider(Some(r#""id":"(\w+)""#), Some("https://x.test/$1$"));
        assert!(matches!(
            extract_result(&p, "{}"),
            Err(ExtractionError::NoMatch { .. })
        ));

        let json_only = provider(Some(r#""id":"(\w+)""#), Some("$json:ok$"));
        assert_eq!(extract_result(&json_only, r#"{"ok":true}"#).unwrap(), "true");
    }

    #[test]
    fn group_errors_are_explicit() {
        let out_of_range = provider(Some("(a)"), Some("$3$"));
        assert!(matches!(
            extract_result(&out_of_range, "a"),
            Err(ExtractionError::GroupOutOfRange { index: 3, available: 1 })
        ));

        let no_regex = provider(None, Some("$1$"));
        assert!(matches!(
            extract_result(&no_regex, "a"),
            Err(ExtractionError::NoRegex(1))
        ));

        let optional = provider(Some("(a)|(b)"), Some("[$2$]"));
        assert_eq!(extract_result(&optional, "a").unwrap(), "[]");

        let invalid = provider(Some("(unclosed"), Some("$1$"));
        assert!(matches!(
            extract_result(&invalid, "a"),
            Err(ExtractionError::InvalidRegex { .. })
        ));
    }

    #[test]
    fn json_errors_are_explicit() {
        let p = provider(None, Some("$json:data,missing$"));
        match extract_result(&p, r#"{"data":{}}"#) {
            Err(ExtractionError::MissingJsonKey(path)) => assert_eq!(path, "data,missing"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            extract_result(&p, "<html>"),
            Err(ExtractionError::InvalidJson(_))
        ));
    }

    #[test]
    fn json_renders_non_strings_and_indexes_arrays() {
        let body = r#"{"files":[{"url":"https://f.test/1","size":12}],"obj":{"a":1}}"#;
        let p = provider(None, Some("$json:files,0,url$ $json:files,0,size$ $json:obj$"));
        assert_eq!(
            extract_result(&p, body).unwrap(),
            r#"https://f.test/1 12 {"a":1}"#
        );
    }

    #[test]
    fn json_without_keys_is_left_verbatim() {
        let p = provider(None, Some("id=$json$ raw=$json:$"));
        assert_eq!(
            extract_result(&p, "<html>not json</html>").unwrap(),
            "id=$json$ raw=$json:$"
        );
    }
}
