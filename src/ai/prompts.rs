//! Prompt construction

use super::{ProductContext, Prompt};

const SYSTEM: &str = "You are a retail assistant helping small shop owners manage their inventory. \
Be accurate and concise. Never invent brand claims or certifications.";

/// Longest inventory text forwarded to the model
pub const MAX_IMPORT_CHARS: usize = 8_000;

fn describe(product: &ProductContext) -> String {
    let mut lines = vec![format!("Product name: {}", product.name)];
    if let Some(category) = product.category.as_deref().filter(|c| !c.is_empty()) {
        lines.push(format!("Category: {}", category));
    }
    if let Some(description) = product.description.as_deref().filter(|d| !d.is_empty()) {
        lines.push(format!("Current description: {}", description));
    }
    for (key, value) in &product.attributes {
        lines.push(format!("{}: {}", key, value));
    }
    lines.join("\n")
}

pub fn description(product: &ProductContext) -> Prompt {
    Prompt {
        system: SYSTEM.to_string(),
        user: format!(
            "Write a compelling product description of 2-3 sentences (under 80 words) \
for the product below. Reply with the description text only, no headings or quotes.\n\n{}",
            describe(product)
        ),
        json: false,
        max_tokens: 256,
        temperature: 0.7,
    }
}

pub fn price(product: &ProductContext, currency: &str) -> Prompt {
    Prompt {
        system: SYSTEM.to_string(),
        user: format!(
            "Suggest a typical retail selling price in {currency} for the product below.\n\
Respond with JSON only: {{\"suggestedPrice\": number, \"minPrice\": number, \
\"maxPrice\": number, \"reasoning\": string}}\n\n{}",
            describe(product)
        ),
        json: true,
        max_tokens: 256,
        temperature: 0.2,
    }
}

pub fn auto_fill(product: &ProductContext, fields: &[String]) -> Prompt {
    let wanted = if fields.is_empty() {
        String::from("none")
    } else {
        fields.join(", ")
    };
    Prompt {
        system: SYSTEM.to_string(),
        user: format!(
            "Fill in catalogue details for the product below.\n\
Respond with JSON only, using this shape: {{\"category\": string, \"description\": string, \
\"tags\": [string], \"suggestedPrice\": number, \"unit\": string, \
\"attributes\": {{string: string}}}}.\n\
Put values for these seller-specific fields into \"attributes\": {wanted}.\n\
Use null for anything you cannot infer.\n\n{}",
            describe(product)
        ),
        json: true,
        max_tokens: 768,
        temperature: 0.4,
    }
}

pub fn extract_products(text: &str) -> Prompt {
    let text: String = text.chars().take(MAX_IMPORT_CHARS).collect();
    Prompt {
        system: SYSTEM.to_string(),
        user: format!(
            "Convert the inventory text below into CSV with the columns \
name,sku,category,price,stock. One product per line, no header, no commentary. \
Leave a column empty when unknown and never use commas inside a value.\n\n{}",
            text
        ),
        json: false,
        max_tokens: 2048,
        temperature: 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_fill_lists_requested_fields() {
        let prompt = auto_fill(
            &ProductContext {
                name: "Cotton Kurta".into(),
                ..Default::default()
            },
            &["fabric".to_string(), "size".to_string()],
        );
        assert!(prompt.json);
        assert!(prompt.user.contains("fabric, size"));
        assert!(prompt.user.contains("Cotton Kurta"));
    }

    #[test]
    fn test_import_text_is_truncated() {
        let long = "x".repeat(MAX_IMPORT_CHARS * 2);
        let prompt = extract_products(&long);
        assert!(prompt.user.len() < MAX_IMPORT_CHARS + 400);
    }
}
