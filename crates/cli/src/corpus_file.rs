use anyhow::{bail, Context as AnyhowContext, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;
use thaifood_corpus::{Corpus, RawRow, SearchTextPolicy};

/// Reads a JSON array of objects and builds the corpus from it.
pub fn load_corpus(path: &Path, policy: &SearchTextPolicy) -> Result<Corpus> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read corpus file {}", path.display()))?;
    let rows = parse_rows(&raw).with_context(|| format!("Invalid corpus file {}", path.display()))?;
    Corpus::load(rows, policy).with_context(|| format!("Failed to load corpus {}", path.display()))
}

/// Strings pass through, numbers and booleans are stringified, `null` is a
/// missing field.
pub fn parse_rows(raw: &str) -> Result<Vec<RawRow>> {
    let value: Value = serde_json::from_str(raw).context("Corpus is not valid JSON")?;
    let Value::Array(items) = value else {
        bail!("Corpus must be a JSON array of objects");
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(fields) => Ok(fields
                .into_iter()
                .filter_map(|(name, value)| cell_text(value).map(|text| (name, text)))
                .collect::<RawRow>()),
            other => bail!("Corpus row {index} is not an object: {other}"),
        })
        .collect()
}

fn cell_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        nested @ (Value::Array(_) | Value::Object(_)) => Some(nested.to_string()),
    }
}
