//! Request-side placeholder resolution (`$input$`, `$random$`).

use rand::{Rng, distributions::Alphanumeric};

use super::model::{OrderedMap, Provider};

pub const INPUT_TOKEN: &str = "$input$";
pub const RANDOM_TOKEN: &str = "$random$";
pub const RANDOM_LENGTH: usize = 8;

/// Modal text input shown when a value needs `$input$`.
pub trait InputPrompt: Send + Sync {
    /// Ask the user for text. Returns `None` when the prompt was cancelled.
    fn prompt(&self, label: &str, seed: &str, multiline: bool) -> Option<String>;
}

/// Resolves a single argument or header value.
///
/// `$input$` takes precedence over `$random$`; a value never gets both
/// substituted. `seed` is only evaluated when a prompt is actually shown.
pub fn resolve(
    value: &str,
    argument_key: &str,
    provider_name: &str,
    multiline: bool,
    prompt: &dyn InputPrompt,
    seed: &dyn Fn() -> String,
) -> String {
    if value.contains(INPUT_TOKEN) {
        let label = prompt_label(argument_key, provider_name);
        let input = prompt
            .prompt(&label, &seed(), multiline)
            .unwrap_or_else(|| {
                log::info!("Input for '{}' cancelled, substituting empty value", argument_key);
                String::new()
            });
        value.replace(INPUT_TOKEN, &input)
    } else if value.contains(RANDOM_TOKEN) {
        value.replace(RANDOM_TOKEN, &random_string(RANDOM_LENGTH))
    } else {
        value.to_string()
    }
}

/// Resolves every entry of `map`, preserving order.
pub fn resolve_all(
    map: &OrderedMap,
    provider_name: &str,
    multiline: bool,
    prompt: &dyn InputPrompt,
    seed: &dyn Fn() -> String,
) -> OrderedMap {
    map.iter()
        .map(|(key, value)| {
            let resolved = resolve(value, key, provider_name, multiline, prompt, seed);
            (key.to_string(), resolved)
        })
        .collect()
}

/// Resolves arguments then headers. Headers always get a single-line prompt.
pub fn resolve_request(
    provider: &Provider,
    prompt: &dyn InputPrompt,
    seed: &dyn Fn() -> String,
) -> (OrderedMap, OrderedMap) {
    let arguments = resolve_all(
        &provider.arguments,
        &provider.name,
        provider.multiline,
        prompt,
        seed,
    );
    let headers = resolve_all(&provider.headers, &provider.name, false, prompt, seed);
    (arguments, headers)
}

/// "<Key> is required by <provider>", with the key's first letter upper-cased.
pub fn prompt_label(argument_key: &str, provider_name: &str) -> String {
    let mut chars = argument_key.chars();
    let titled: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    format!("{titled} is required by {provider_name}")
}

pub fn random_string(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}
