//! URL path-parameter substitution

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::{Map, Value};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^}]+)\}").expect("PLACEHOLDER should compile - this is a bug"));

/// Replace every `{name}` in `url` with `params[name]`.
///
/// Missing parameters (or no parameters at all) substitute the empty string.
/// Strings are inserted verbatim, `null` as nothing, other values in their
/// JSON form.
pub fn fill_params(url: &str, params: Option<&Map<String, Value>>) -> String {
    PLACEHOLDER
        .replace_all(url, |caps: &Captures<'_>| {
            params.and_then(|params| params.get(&caps[1])).map(render).unwrap_or_default()
        })
        .into_owned()
}

fn render(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
