//! Lenient parsing of model answers
//!
//! Models wrap JSON in code fences, add prose around it, quote numbers and
//! prefix currency symbols. Everything here degrades to empty data instead of
//! failing.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde_json::Value;

use super::{PriceSuggestion, ProductDraft, ProductEnrichment};

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d[\d,]*(?:\.\d+)?").expect("valid regex"))
}

fn list_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(?:[-*•]|\d+[.)])\s+").expect("valid regex"))
}

/// Drop ``` fences and surrounding whitespace
pub fn strip_fences(text: &str) -> &str {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix("```") {
        // Language tag runs to the end of the first line
        text = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    }
    text.trim_end().trim_end_matches("```").trim()
}

/// Plain-text answer with fences and wrapping quotes removed
pub fn clean_text(text: &str) -> String {
    let text = strip_fences(text);
    let text = text
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text);
    text.trim().to_string()
}

/// First JSON value found in the answer
pub fn extract_json(text: &str) -> Option<Value> {
    let text = strip_fences(text);
    if let Ok(value) = serde_json::from_str(text) {
        return Some(value);
    }

    for (open, close) in [('{', '}'), ('[', ']')] {
        if let (Some(start), Some(end)) = (text.find(open), text.rfind(close)) {
            if start < end {
                if let Ok(value) = serde_json::from_str(&text[start..=end]) {
                    return Some(value);
                }
            }
        }
    }
    None
}

/// First number in a string, ignoring currency symbols and thousands separators
pub fn first_number(text: &str) -> Option<Decimal> {
    let found = number_re().find(text)?;
    Decimal::from_str(&found.as_str().replace(',', "")).ok()
}

fn decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .ok(),
        Value::String(s) => first_number(s),
        _ => None,
    }
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn tags(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(text).collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    }
}

/// Price suggestion from JSON, else the first number anywhere in the answer
pub fn price_suggestion(answer: &str) -> PriceSuggestion {
    if let Some(Value::Object(fields)) = extract_json(answer) {
        let get = |key: &str| fields.get(key).and_then(decimal);
        let suggestion = PriceSuggestion {
            suggested_price: get("suggestedPrice").or_else(|| get("price")),
            min_price: get("minPrice"),
            max_price: get("maxPrice"),
            reasoning: fields.get("reasoning").and_then(text),
        };
        if suggestion.suggested_price.is_some() {
            return suggestion;
        }
    }

    PriceSuggestion {
        suggested_price: first_number(answer),
        ..Default::default()
    }
}

/// Auto-fill data; empty when the answer holds no JSON object
pub fn enrichment(answer: &str) -> ProductEnrichment {
    let Some(Value::Object(fields)) = extract_json(answer) else {
        return ProductEnrichment::default();
    };

    let attributes: BTreeMap<String, String> = match fields.get("attributes") {
        Some(Value::Object(map)) => map
            .iter()
            .filter_map(|(k, v)| text(v).map(|v| (k.clone(), v)))
            .collect(),
        _ => BTreeMap::new(),
    };

    ProductEnrichment {
        category: fields.get("category").and_then(text),
        description: fields.get("description").and_then(text),
        tags: fields.get("tags").map(tags).unwrap_or_default(),
        suggested_price: fields
            .get("suggestedPrice")
            .or_else(|| fields.get("price"))
            .and_then(decimal),
        unit: fields.get("unit").and_then(text),
        attributes,
    }
}

fn non_empty(cell: Option<&&str>) -> Option<String> {
    cell.map(|c| c.trim().trim_matches('"').trim())
        .filter(|c| !c.is_empty())
        .map(String::from)
}

fn row(line: &str) -> Option<ProductDraft> {
    let line = list_marker_re().replace(line, "");
    let line = line.trim();
    if line.is_empty() || line.starts_with("```") {
        return None;
    }

    let separator = [',', '\t', '|']
        .into_iter()
        .find(|sep| line.contains(*sep))
        .unwrap_or(',');
    let cells: Vec<&str> = line
        .trim_matches('|')
        .split(separator)
        .collect();

    let name = non_empty(cells.first())?;
    if name.eq_ignore_ascii_case("name") || name.chars().all(|c| c == '-' || c == ' ') {
        return None;
    }

    Some(ProductDraft {
        name,
        sku: non_empty(cells.get(1)),
        category: non_empty(cells.get(2)),
        price: non_empty(cells.get(3)).and_then(|p| first_number(&p)),
        stock: non_empty(cells.get(4))
            .and_then(|s| first_number(&s))
            .and_then(|d| d.trunc().to_string().parse().ok()),
    })
}

/// Product rows from a CSV-like answer. A JSON array of rows is accepted too.
pub fn product_rows(answer: &str) -> Vec<ProductDraft> {
    if let Some(Value::Array(items)) = extract_json(answer) {
        let drafts: Vec<ProductDraft> = items
            .iter()
            .filter_map(|item| {
                let name = item.get("name").and_then(text)?;
                Some(ProductDraft {
                    name,
                    sku: item.get("sku").and_then(text),
                    category: item.get("category").and_then(text),
                    price: item.get("price").and_then(decimal),
                    stock: item.get("stock").and_then(decimal).and_then(|d| d.trunc().to_string().parse().ok()),
                })
            })
            .collect();
        if !drafts.is_empty() {
            return drafts;
        }
    }

    strip_fences(answer).lines().filter_map(row).collect()
}
