//! Provider definition schema and validation.

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::PathBuf;
use thiserror::Error;

/// HTTP method used by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestType {
    Get,
    Post,
}

impl RequestType {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestType::Get => "GET",
            RequestType::Post => "POST",
        }
    }
}

/// Menu a provider is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuGroup {
    /// Screenshot uploaders (full, region and window menus).
    Upload,
    /// Tools dispatched with a GET request.
    GetTool,
    /// Tools dispatched with a form POST.
    PostTool,
}

/// Insertion-ordered string map with unique keys.
///
/// Provider files rely on declaration order for multipart part ordering and
/// header assembly, so a hash map is not an option here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedMap {
    entries: Vec<(String, String)>,
}

impl OrderedMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `value` under `key`. An existing key keeps its position and has
    /// its value replaced; the previous value is returned.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Like [`OrderedMap::insert`] but compares keys ignoring ASCII case, which is
    /// how HTTP header names behave. The stored key takes the new spelling.
    pub fn insert_ignore_case(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Option<String> {
        let key = key.into();
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&key))
        {
            Some(entry) => {
                let (_, previous) = std::mem::replace(entry, (key, value));
                Some(previous)
            }
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for OrderedMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = OrderedMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

/// A validated provider definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Provider {
    pub name: String,
    pub request_type: RequestType,
    pub request_url: String,
    pub file_form_name: Option<String>,
    pub data_only: bool,
    pub multiline: bool,
    pub arguments: OrderedMap,
    pub headers: OrderedMap,
    pub regex_list: Vec<String>,
    pub url: Option<String>,
    /// File the definition was read from, when loaded from disk.
    pub source: Option<PathBuf>,
}

impl Provider {
    /// Upload providers POST the screenshot under `file_form_name`. A GET
    /// provider has no body to carry it, so it stays a tool.
    pub fn is_upload(&self) -> bool {
        self.file_form_name.is_some() && self.request_type == RequestType::Post
    }

    pub fn menu_group(&self) -> MenuGroup {
        if self.is_upload() {
            MenuGroup::Upload
        } else {
            match self.request_type {
                RequestType::Get => MenuGroup::GetTool,
                RequestType::Post => MenuGroup::PostTool,
            }
        }
    }
}

/// Errors raised while loading a provider definition.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Failed to read provider file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid provider JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Provider is missing required key '{0}'")]
    MissingField(&'static str),

    #[error("Unsupported RequestType '{0}' (expected GET or POST)")]
    InvalidRequestType(String),

    #[error("Provider key '{field}' must be {expected}")]
    InvalidField {
        field: String,
        expected: &'static str,
    },
}

/// On-disk provider format.
///
/// `Name`, `RequestType` and `RequestURL` are required; everything else is optional.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ProviderFile {
    /// Label shown in menus and prompts (required).
    #[serde(rename = "Name")]
    pub name: Option<String>,

    /// "GET" or "POST" (required).
    #[serde(rename = "RequestType")]
    pub request_type: Option<String>,

    /// Endpoint to call (required).
    #[serde(rename = "RequestURL")]
    pub request_url: Option<String>,

    /// Form field the screenshot is attached under. Marks an upload provider.
    #[serde(rename = "FileFormName", default)]
    pub file_form_name: Option<String>,

    /// Send the screenshot as the raw request body without a multipart envelope.
    #[serde(rename = "DataOnly", default)]
    pub data_only: Option<bool>,

    /// Use a multi-line input prompt for `$input$` arguments.
    #[serde(rename = "Multiline", default)]
    pub multiline: Option<bool>,

    /// Request arguments; values may contain `$input$` or `$random$`.
    #[serde(rename = "Arguments", default)]
    pub arguments: Option<Map<String, Value>>,

    /// Extra request headers; values may contain `$input$` or `$random$`.
    #[serde(rename = "Headers", default)]
    pub headers: Option<Map<String, Value>>,

    /// Patterns applied to the response body. Only the first one is used.
    #[serde(rename = "RegexList", default)]
    pub regex_list: Option<Vec<String>>,

    /// Result template with `$n$` and `$json:key,...$` tokens.
    #[serde(rename = "URL", default)]
    pub url: Option<String>,
}

/// Parses and validates a provider definition.
pub fn parse_provider(raw: &str) -> Result<Provider, ProviderError> {
    let file: ProviderFile = serde_json::from_str(raw)?;
    Provider::try_from(file)
}

impl TryFrom<ProviderFile> for Provider {
    type Error = ProviderError;

    fn try_from(file: ProviderFile) -> Result<Self, Self::Error> {
        let name = file.name.ok_or(ProviderError::MissingField("Name"))?;
        let request_type = match file
            .request_type
            .ok_or(ProviderError::MissingField("RequestType"))?
            .as_str()
        {
            "GET" => RequestType::Get,
            "POST" => RequestType::Post,
            other => return Err(ProviderError::InvalidRequestType(other.to_string())),
        };
        let request_url = file
            .request_url
            .ok_or(ProviderError::MissingField("RequestURL"))?;
        if request_type == RequestType::Get && file.file_form_name.is_some() {
            log::warn!(
                "Provider '{}' uses GET; FileFormName is ignored and it is listed as a tool",
                name
            );
        }

        Ok(Provider {
            name,
            request_type,
            request_url,
            file_form_name: file.file_form_name,
            data_only: file.data_only.unwrap_or(false),
            multiline: file.multiline.unwrap_or(false),
            arguments: string_map("Arguments", file.arguments)?,
            headers: string_map("Headers", file.headers)?,
            regex_list: file.regex_list.unwrap_or_default(),
            url: file.url,
            source: None,
        })
    }
}

fn string_map(field: &str, raw: Option<Map<String, Value>>) -> Result<OrderedMap, ProviderError> {
    let mut map = OrderedMap::new();
    for (key, value) in raw.unwrap_or_default() {
        let text = match value {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null => String::new(),
            Value::Array(_) | Value::Object(_) => {
                return Err(ProviderError::InvalidField {
                    field: format!("{field}.{key}"),
                    expected: "a string",
                });
            }
        };
        map.insert(key, text);
    }
    Ok(map)
}
