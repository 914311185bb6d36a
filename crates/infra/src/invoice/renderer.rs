//! JSON and text renderers
//!
//! Both renderers share the value map built by [`ValueFormatter`]. The
//! locale is the configured language unless the template overrides it.

use kimai_core::{InvoiceRenderer, RenderedInvoice};
use kimai_domain::{InvoiceDocument, InvoiceModel, KimaiError, LocaleConfig, Result};
use serde_json::{Map, Value};

use super::values::{ValueFormatter, Values};

const ENTRY_BEGIN_BLOCK: &str = "${entry.begin_block}";
const ENTRY_END_BLOCK: &str = "${entry.end_block}";

fn formatter(locale: &LocaleConfig) -> ValueFormatter {
    ValueFormatter::new(&locale.language, &locale.duration_pattern)
}

/* -------------------------------------------------------------------------- */
/* JSON */
/* -------------------------------------------------------------------------- */

/// Dumps the model as one flat JSON object with an `entries` array.
///
/// A non-empty document is read as a JSON array of key names; only those
/// keys are written. An empty document (or `[]`) writes every key.
pub struct JsonRenderer {
    formatter: ValueFormatter,
}

impl JsonRenderer {
    pub fn new(locale: &LocaleConfig) -> Self {
        Self { formatter: formatter(locale) }
    }
}

impl InvoiceRenderer for JsonRenderer {
    fn id(&self) -> &'static str {
        "json"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["json"]
    }

    fn render(
        &self,
        document: &InvoiceDocument,
        source: &str,
        model: &InvoiceModel,
    ) -> Result<RenderedInvoice> {
        let keys = selected_keys(source).map_err(|err| {
            KimaiError::InvalidInput(format!("Invalid invoice document {}: {err}", document.name))
        })?;
        let keep = |key: &str| keys.as_ref().map_or(true, |keys| keys.iter().any(|k| k == key));

        let mut root = to_object(self.formatter.global_values(model), &keep);
        let entries: Vec<Value> = model
            .items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                Value::Object(to_object(self.formatter.entry_values(model, index, item), &keep))
            })
            .collect();
        root.insert("entries".to_string(), Value::Array(entries));

        let content = serde_json::to_vec_pretty(&Value::Object(root))
            .map_err(|err| KimaiError::Internal(format!("Failed to encode invoice: {err}")))?;

        Ok(RenderedInvoice {
            content,
            extension: "json".to_string(),
            content_type: "application/json".to_string(),
        })
    }
}

fn selected_keys(source: &str) -> std::result::Result<Option<Vec<String>>, serde_json::Error> {
    if source.trim().is_empty() {
        return Ok(None);
    }
    let keys: Vec<String> = serde_json::from_str(source)?;
    Ok(if keys.is_empty() { None } else { Some(keys) })
}

fn to_object(values: Values, keep: &dyn Fn(&str) -> bool) -> Map<String, Value> {
    values.into_iter().filter(|(key, _)| keep(key)).map(|(k, v)| (k, Value::String(v))).collect()
}

/* -------------------------------------------------------------------------- */
/* Text */
/* -------------------------------------------------------------------------- */

/// Fills `${key}` placeholders of a plain text or markdown document.
pub struct TextRenderer {
    formatter: ValueFormatter,
}

impl TextRenderer {
    pub fn new(locale: &LocaleConfig) -> Self {
        Self { formatter: formatter(locale) }
    }
}

impl InvoiceRenderer for TextRenderer {
    fn id(&self) -> &'static str {
        "text"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["txt", "md"]
    }

    fn render(
        &self,
        document: &InvoiceDocument,
        source: &str,
        model: &InvoiceModel,
    ) -> Result<RenderedInvoice> {
        let globals = self.formatter.global_values(model);
        let mut output = String::with_capacity(source.len() * 2);
        let mut block: Option<Vec<&str>> = None;

        for line in source.lines() {
            let trimmed = line.trim();
            match block.as_mut() {
                None if trimmed == ENTRY_BEGIN_BLOCK => block = Some(Vec::new()),
                None => {
                    output.push_str(&substitute(line, &globals, None));
                    output.push('\n');
                }
                Some(lines) if trimmed == ENTRY_END_BLOCK => {
                    for (index, item) in model.items.iter().enumerate() {
                        let entry = self.formatter.entry_values(model, index, item);
                        for block_line in lines.iter() {
                            output.push_str(&substitute(block_line, &globals, Some(&entry)));
                            output.push('\n');
                        }
                    }
                    block = None;
                }
                Some(lines) => lines.push(line),
            }
        }

        if block.is_some() {
            return Err(KimaiError::InvalidInput(format!(
                "Invoice document {} misses {ENTRY_END_BLOCK}",
                document.name
            )));
        }

        let extension = document.extension().unwrap_or("txt").to_ascii_lowercase();
        let content_type =
            if extension == "md" { "text/markdown" } else { "text/plain" }.to_string();

        Ok(RenderedInvoice { content: output.into_bytes(), extension, content_type })
    }
}

/// Replace every `${key}`; unknown keys become empty strings.
fn substitute(line: &str, globals: &Values, entry: Option<&Values>) -> String {
    let mut result = String::with_capacity(line.len());
    let mut rest = line;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let key = &after[..end];
                let value = entry.and_then(|e| e.get(key)).or_else(|| globals.get(key));
                if let Some(value) = value {
                    result.push_str(value);
                }
                rest = &after[end + 1..];
            }
            None => {
                result.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    result.push_str(rest);
    result
}
