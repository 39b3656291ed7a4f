use std::sync::OnceLock;

use regex::{Captures, Regex};

fn placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // `{{ env.NAME }}` or `{{ env.NAME | default("value") }}`
    RE.get_or_init(|| {
        Regex::new(r#"\{\{\s*([A-Za-z0-9_.]+)\s*(?:\|\s*default\("([^"]*)"\)\s*)?\}\}"#).expect("must be valid regex")
    })
}

/// Substitute `{{ env.NAME }}` placeholders in raw config text
///
/// A `| default("value")` suffix supplies the text used when the variable
/// is unset. Comment lines are copied verbatim so disabled settings never
/// require their variables.
pub fn expand_env(input: &str) -> Result<String, String> {
    let mut expanded = Vec::new();

    for line in input.split('\n') {
        if line.trim_start().starts_with('#') {
            expanded.push(line.to_string());
        } else {
            expanded.push(expand_line(line)?);
        }
    }

    Ok(expanded.join("\n"))
}

fn expand_line(line: &str) -> Result<String, String> {
    let mut failure = None;

    let replaced = placeholder().replace_all(line, |caps: &Captures<'_>| {
        let key = &caps[1];
        let fallback = caps.get(2).map(|m| m.as_str());

        match resolve(key, fallback) {
            Ok(value) => value,
            Err(message) => {
                failure.get_or_insert(message);
                String::new()
            }
        }
    });

    match failure {
        Some(message) => Err(message),
        None => Ok(replaced.into_owned()),
    }
}

fn resolve(key: &str, fallback: Option<&str>) -> Result<String, String> {
    let Some(name) = key.strip_prefix("env.").filter(|name| !name.contains('.')) else {
        return Err(format!("only `env.` placeholders are supported: `{key}`"));
    };

    std::env::var(name).or_else(|_| {
        fallback
            .map(str::to_string)
            .ok_or_else(|| format!("environment variable not set: `{name}`"))
    })
}
