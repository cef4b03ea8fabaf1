//! Static recovery of default expressions from declaration text.
//!
//! Defaults are never evaluated. The text of each default is cut out of the parameter
//! list and classified against the known sentinel spellings and simple literal forms.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use siphon_types::{ConfigValue, Sentinel};

use crate::error::ConfigError;

static CONFIG_SENTINEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[A-Za-z_]\w*\.)*config\.value$").expect("config sentinel regex should compile"));
static SECRET_SENTINEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[A-Za-z_]\w*\.)*secrets\.value$").expect("secret sentinel regex should compile"));

/// Classification of a default expression's text.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultLiteral {
    /// `None`.
    Null,
    Sentinel(Sentinel),
    Value(ConfigValue),
    /// Valid text that is neither a sentinel nor a simple literal, e.g. a call expression.
    Unknown,
}

/// Classifies the text of a default expression.
///
/// `dlt.config.value` and `config.value` read as the config sentinel, `dlt.secrets.value` and
/// `secrets.value` as the secret sentinel. Quoted strings, integers, floats, booleans and
/// JSON-shaped lists or maps are literals.
pub fn classify_default_text(text: &str) -> DefaultLiteral {
    let text = text.trim();
    if text == "None" || text == "null" {
        return DefaultLiteral::Null;
    }
    if CONFIG_SENTINEL.is_match(text) {
        return DefaultLiteral::Sentinel(Sentinel::Config);
    }
    if SECRET_SENTINEL.is_match(text) {
        return DefaultLiteral::Sentinel(Sentinel::Secret);
    }

    match text {
        "True" | "true" => return DefaultLiteral::Value(ConfigValue::Bool(true)),
        "False" | "false" => return DefaultLiteral::Value(ConfigValue::Bool(false)),
        _ => {}
    }

    if let Some(inner) = unquote(text) {
        return DefaultLiteral::Value(ConfigValue::Str(inner));
    }

    let numeric = text.replace('_', "");
    if let Ok(integer) = numeric.parse::<i64>() {
        return DefaultLiteral::Value(ConfigValue::Int(integer));
    }
    if numeric.chars().any(|character| character.is_ascii_digit())
        && let Ok(float) = numeric.parse::<f64>()
    {
        return DefaultLiteral::Value(ConfigValue::Float(float));
    }

    if (text.starts_with('[') || text.starts_with('{'))
        && let Ok(json) = serde_json::from_str::<serde_json::Value>(text)
    {
        return DefaultLiteral::Value(ConfigValue::from_json(json));
    }

    DefaultLiteral::Unknown
}

fn unquote(text: &str) -> Option<String> {
    if text.len() < 2 {
        return None;
    }
    let quote = text.chars().next().filter(|character| *character == '\'' || *character == '"')?;
    let inner = text.strip_prefix(quote)?.strip_suffix(quote)?;
    let mut unquoted = String::with_capacity(inner.len());
    let mut characters = inner.chars();
    while let Some(character) = characters.next() {
        match character {
            '\\' => match characters.next() {
                Some(escaped) if escaped == quote || escaped == '\\' => unquoted.push(escaped),
                Some(other) => {
                    unquoted.push('\\');
                    unquoted.push(other);
                }
                None => return None,
            },
            // An unescaped quote inside means an expression such as `'a' + 'b'`.
            character if character == quote => return None,
            character => unquoted.push(character),
        }
    }
    Some(unquoted)
}

/// Returns the parameter list between the outermost parentheses of `declaration`.
pub(crate) fn parameter_list(declaration: &str) -> Result<&str, ConfigError> {
    let open = declaration
        .find('(')
        .ok_or_else(|| ConfigError::declaration(format!("'{declaration}' has no parameter list")))?;
    let close = find_top_level(&declaration[open + 1..], ')')
        .ok_or_else(|| ConfigError::declaration(format!("'{declaration}' has an unterminated parameter list")))?;
    Ok(&declaration[open + 1..open + 1 + close])
}

/// Splits a parameter list at top-level commas, ignoring commas inside brackets and quotes.
pub(crate) fn split_parameters(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = list;
    while let Some(index) = find_top_level(rest, ',') {
        parts.push(rest[..index].trim());
        rest = &rest[index + 1..];
    }
    parts.push(rest.trim());
    parts.retain(|part| !part.is_empty());
    parts
}

/// Splits one parameter into its head (`name: annotation`) and default text.
pub(crate) fn split_default(parameter: &str) -> (&str, Option<&str>) {
    match find_top_level(parameter, '=') {
        Some(index) => (parameter[..index].trim(), Some(parameter[index + 1..].trim())),
        None => (parameter.trim(), None),
    }
}

/// Position of the first `target` outside quotes and brackets.
fn find_top_level(text: &str, target: char) -> Option<usize> {
    let mut in_single_quote = false;
    let mut in_double_quote = false;
    let mut escaped = false;
    let mut depth = 0i32;

    for (index, character) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if !in_single_quote && !in_double_quote && depth == 0 && character == target {
            return Some(index);
        }
        match character {
            '\\' if in_single_quote || in_double_quote => escaped = true,
            '\'' if !in_double_quote => in_single_quote = !in_single_quote,
            '"' if !in_single_quote => in_double_quote = !in_double_quote,
            '(' | '[' | '{' if !in_single_quote && !in_double_quote => depth += 1,
            ')' | ']' | '}' if !in_single_quote && !in_double_quote => depth -= 1,
            _ => {}
        }
    }
    None
}

/// Maps each parameter that has a default to the unevaluated text of that default.
///
/// Variadic collectors and the bare `*` and `/` markers never carry defaults and are skipped.
pub fn extract_literal_defaults(declaration: &str) -> Result<IndexMap<String, String>, ConfigError> {
    let mut defaults = IndexMap::new();
    for parameter in split_parameters(parameter_list(declaration)?) {
        let (head, default) = split_default(parameter);
        let Some(default) = default else { continue };
        let name = head.split(':').next().unwrap_or(head).trim();
        if name.starts_with('*') || name == "/" {
            continue;
        }
        if default.is_empty() {
            return Err(ConfigError::declaration(format!("parameter '{name}' has an empty default")));
        }
        defaults.insert(name.to_string(), default.to_string());
    }
    Ok(defaults)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_default_text_without_evaluating() {
        let defaults = extract_literal_defaults(
            "def github(api_key: secret = dlt.secrets.value, org: str = 'dlt-hub', labels = {\"a\": 1}, page_size=100, *args, **kwargs)",
        )
        .unwrap();
        assert_eq!(defaults.get("api_key").map(String::as_str), Some("dlt.secrets.value"));
        assert_eq!(defaults.get("org").map(String::as_str), Some("'dlt-hub'"));
        assert_eq!(defaults.get("labels").map(String::as_str), Some("{\"a\": 1}"));
        assert_eq!(defaults.get("page_size").map(String::as_str), Some("100"));
        assert_eq!(defaults.len(), 4);
    }

    #[test]
    fn classifies_sentinels() {
        assert_eq!(classify_default_text("dlt.config.value"), DefaultLiteral::Sentinel(Sentinel::Config));
        assert_eq!(classify_default_text("config.value"), DefaultLiteral::Sentinel(Sentinel::Config));
        assert_eq!(classify_default_text("dlt.secrets.value"), DefaultLiteral::Sentinel(Sentinel::Secret));
        assert_eq!(classify_default_text("secrets.value"), DefaultLiteral::Sentinel(Sentinel::Secret));
        assert_eq!(classify_default_text("my_config.value"), DefaultLiteral::Unknown);
    }

    #[test]
    fn classifies_literals() {
        assert_eq!(classify_default_text("None"), DefaultLiteral::Null);
        assert_eq!(classify_default_text("'x'"), DefaultLiteral::Value(ConfigValue::from("x")));
        assert_eq!(classify_default_text("\"it's\""), DefaultLiteral::Value(ConfigValue::from("it's")));
        assert_eq!(classify_default_text("1_000"), DefaultLiteral::Value(ConfigValue::Int(1000)));
        assert_eq!(classify_default_text("2.5"), DefaultLiteral::Value(ConfigValue::Float(2.5)));
        assert_eq!(classify_default_text("True"), DefaultLiteral::Value(ConfigValue::Bool(true)));
        assert_eq!(classify_default_text("[1, 2]"), DefaultLiteral::Value(ConfigValue::List(vec![ConfigValue::Int(1), ConfigValue::Int(2)])));
        assert_eq!(classify_default_text("build_client()"), DefaultLiteral::Unknown);
        assert_eq!(classify_default_text("inf"), DefaultLiteral::Unknown);
    }

    #[test]
    fn splits_respecting_brackets_and_quotes() {
        assert_eq!(split_parameters("a: Optional[Dict[str, int]] = None, b = 'x,y', c"), vec![
            "a: Optional[Dict[str, int]] = None",
            "b = 'x,y'",
            "c"
        ]);
    }

    #[test]
    fn escaped_quotes_stay_inside_their_string() {
        assert_eq!(split_parameters(r"a = 'it\'s, here', b = 1"), vec![r"a = 'it\'s, here'", "b = 1"]);
        assert_eq!(split_parameters(r#"a = "say \"hi, there\"", b"#), vec![r#"a = "say \"hi, there\"""#, "b"]);

        let defaults = extract_literal_defaults(r"q(a = 'it\'s, here', b = 1)").unwrap();
        assert_eq!(defaults.get("a").map(String::as_str), Some(r"'it\'s, here'"));
        assert_eq!(classify_default_text(&defaults["a"]), DefaultLiteral::Value(ConfigValue::from("it's, here")));
        assert_eq!(classify_default_text(&defaults["b"]), DefaultLiteral::Value(ConfigValue::Int(1)));
    }

    #[test]
    fn concatenated_strings_are_not_literals() {
        assert_eq!(classify_default_text("'a' + 'b'"), DefaultLiteral::Unknown);
    }

    #[test]
    fn missing_parameter_list_is_a_declaration_error() {
        assert!(matches!(extract_literal_defaults("github"), Err(ConfigError::Declaration { .. })));
    }
}
