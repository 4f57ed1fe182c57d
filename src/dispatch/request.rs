//! Building the wire form of a provider request.
//!
//! Everything here is pure so request framing can be pinned down in tests
//! without a network.

use crate::provider::{OrderedMap, Provider, RequestType};

/// Multipart boundary shared by every provider. Fixed for compatibility with
/// existing provider definitions.
pub const BOUNDARY: &str = "---------------------------14737809831466499882746641449";

/// A fully resolved request, ready to hand to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    pub method: RequestType,
    pub url: String,
    pub headers: OrderedMap,
    pub body: Option<Vec<u8>>,
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}

/// Builds the request for `provider` from already resolved arguments and headers.
///
/// `payload` is only attached for POST providers with a `FileFormName`.
pub fn prepare(
    provider: &Provider,
    arguments: &OrderedMap,
    headers: &OrderedMap,
    payload: Option<&[u8]>,
) -> PreparedRequest {
    match provider.request_type {
        RequestType::Get => PreparedRequest {
            method: RequestType::Get,
            url: query_url(&provider.request_url, arguments),
            headers: headers.clone(),
            body: None,
        },
        RequestType::Post => {
            let body = match (&provider.file_form_name, payload) {
                (Some(_), Some(bytes)) if provider.data_only => bytes.to_vec(),
                (Some(field), Some(bytes)) => upload_body(field, bytes, arguments),
                _ => form_body(arguments),
            };
            // No parts means no multipart envelope to describe.
            let headers = if body.is_empty() && payload.is_none() {
                headers.clone()
            } else {
                post_headers(headers)
            };
            PreparedRequest {
                method: RequestType::Post,
                url: provider.request_url.clone(),
                headers,
                body: Some(body),
            }
        }
    }
}

/// `base?k1=v1&k2=v2` with percent-encoded keys and values; no `?` without arguments.
pub fn query_url(base: &str, arguments: &OrderedMap) -> String {
    if arguments.is_empty() {
        return base.to_string();
    }
    let query = arguments
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            )
        })
        .collect::<Vec<_>>()
        .join("&");
    format!("{base}?{query}")
}

/// Implicit multipart Content-Type first, then provider headers; a provider
/// header with the same name replaces it.
fn post_headers(headers: &OrderedMap) -> OrderedMap {
    let mut merged = OrderedMap::new();
    merged.insert("Content-Type", multipart_content_type());
    for (key, value) in headers.iter() {
        merged.insert_ignore_case(key, value);
    }
    merged
}

/// One part per argument, closed once after the last part.
pub fn form_body(arguments: &OrderedMap) -> Vec<u8> {
    let mut body = Vec::new();
    append_argument_parts(&mut body, arguments);
    if !body.is_empty() {
        append_closing(&mut body);
    }
    body
}

/// The screenshot as a file part, followed by the argument parts.
pub fn upload_body(file_form_name: &str, payload: &[u8], arguments: &OrderedMap) -> Vec<u8> {
    let mut body = Vec::with_capacity(payload.len() + 256);
    body.extend_from_slice(
        format!(
            "\r\n--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{file_form_name}\"; filename=\"{file_form_name}.png\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(payload);
    append_argument_parts(&mut body, arguments);
    append_closing(&mut body);
    body
}

fn append_argument_parts(body: &mut Vec<u8>, arguments: &OrderedMap) {
    for (key, value) in arguments.iter() {
        body.extend_from_slice(
            format!("\r\n--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{key}\"\r\n\r\n")
                .as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
    }
}

fn append_closing(body: &mut Vec<u8>) {
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(request_type: RequestType, file_form_name: Option<&str>, data_only: bool) -> Provider {
        Provider {
            name: "Test".into(),
            request_type,
            request_url: "https://x.test/api".into(),
            file_form_name: file_form_name.map(str::to_string),
            data_only,
            multiline: false,
            arguments: OrderedMap::new(),
            headers: OrderedMap::new(),
            regex_list: Vec::new(),
            url: None,
            source: None,
        }
    }

    fn map(pairs: &[(&str, &str)]) -> OrderedMap {
        pairs.iter().copied().collect()
    }

    #[test]
    fn get_encodes_query_and_has_no_body() {
        let request = prepare(
            &provider(RequestType::Get, None, false),
            &map(&[("q", "a b"), ("lang", "en&fr")]),
            &map(&[("Accept", "application/json")]),
            None,
        );
        assert_eq!(request.url, "https://x.test/api?q=a%20b&lang=en%26fr");
        assert!(request.body.is_none());
        assert_eq!(request.headers, map(&[("Accept", "application/json")]));
    }

    #[test]
    fn get_without_arguments_has_no_question_mark() {
        let request = prepare(
            &provider(RequestType::Get, None, false),
            &OrderedMap::new(),
            &OrderedMap::new(),
            None,
        );
        assert_eq!(request.url, "https://x.test/api");
        assert!(request.headers.is_empty());
    }

    #[test]
    fn form_post_closes_boundary_once() {
        let request = prepare(
            &provider(RequestType::Post, None, false),
            &map(&[("a", "1"), ("b", "2")]),
            &OrderedMap::new(),
            None,
        );
        let body = String::from_utf8(request.body.unwrap()).unwrap();
        let expected = format!(
            "\r\n--{b}\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\n1\
             \r\n--{b}\r\nContent-Disposition: form-data; name=\"b\"\r\n\r\n2\
             \r\n--{b}--\r\n",
            b = BOUNDARY
        );
        assert_eq!(body, expected);
        assert_eq!(body.matches(&format!("--{BOUNDARY}--")).count(), 1);
        assert_eq!(
            request.headers.get("Content-Type"),
            Some(multipart_content_type().as_str())
        );
    }

    #[test]
    fn form_post_without_arguments_is_empty_and_not_multipart() {
        let request = prepare(
            &provider(RequestType::Post, None, false),
            &OrderedMap::new(),
            &map(&[("X-Token", "t")]),
            None,
        );
        assert_eq!(request.body, Some(Vec::new()));
        assert_eq!(request.headers.get("Content-Type"), None);
        assert_eq!(request.headers, map(&[("X-Token", "t")]));
    }

    #[test]
    fn upload_wraps_payload_then_arguments() {
        let request = prepare(
            &provider(RequestType::Post, Some("image"), false),
            &map(&[("key", "k1")]),
            &OrderedMap::new(),
            Some(b"PNGDATA"),
        );
        let body = String::from_utf8(request.body.unwrap()).unwrap();
        let expected = format!(
            "\r\n--{b}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"image.png\"\r\n\
             Content-Type: application/octet-stream\r\n\r\nPNGDATA\
             \r\n--{b}\r\nContent-Disposition: form-data; name=\"key\"\r\n\r\nk1\
             \r\n--{b}--\r\n",
            b = BOUNDARY
        );
        assert_eq!(body, expected);
    }

    #[test]
    fn data_only_upload_is_raw_payload() {
        let payload = vec![0u8, 159, 146, 150, 13, 10];
        let request = prepare(
            &provider(RequestType::Post, Some("file"), true),
            &map(&[("ignored", "x")]),
            &OrderedMap::new(),
            Some(&payload),
        );
        assert_eq!(request.body, Some(payload));
    }

    #[test]
    fn provider_header_overrides_content_type() {
        let request = prepare(
            &provider(RequestType::Post, Some("file"), true),
            &OrderedMap::new(),
            &map(&[("content-type", "image/png"), ("Authorization", "Bearer t")]),
            Some(b"x"),
        );
        let headers: Vec<_> = request.headers.iter().collect();
        assert_eq!(
            headers,
            vec![("content-type", "image/png"), ("Authorization", "Bearer t")]
        );
    }
}
