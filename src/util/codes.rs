//! Human-facing identifiers: SKUs and invoice numbers

use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;

/// SKU from the first three letters or digits of the name plus four random digits,
/// e.g. `MAS-0427` for "Masala Chai"
pub fn generate_sku(name: &str) -> String {
    let mut prefix: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(3)
        .map(|c| c.to_ascii_uppercase())
        .collect();
    while prefix.len() < 3 {
        prefix.push('X');
    }
    let suffix: u16 = rand::thread_rng().gen_range(0..10_000);
    format!("{}-{:04}", prefix, suffix)
}

/// `{prefix}-{YYYYMMDD}-{4 random alphanumerics}`
pub fn invoice_number(prefix: &str, date: DateTime<Utc>) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(4)
        .map(|b| char::from(b).to_ascii_uppercase())
        .collect();
    let prefix = prefix.trim();
    let prefix = if prefix.is_empty() { "INV" } else { prefix };
    format!("{}-{}-{}", prefix, date.format("%Y%m%d"), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sku_shape() {
        let sku = generate_sku("Masala Chai");
        assert!(sku.starts_with("MAS-"));
        assert_eq!(sku.len(), 8);

        assert!(generate_sku("é!").starts_with("XXX-"));
        assert!(generate_sku("5g").starts_with("5GX-"));
    }

    #[test]
    fn test_invoice_number_shape() {
        let date = Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap();
        let number = invoice_number("RS", date);
        assert!(number.starts_with("RS-20240309-"));
        let suffix = number.rsplit('-').next().unwrap();
        assert_eq!(suffix.len(), 4);
        assert!(suffix.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));

        assert!(invoice_number("  ", date).starts_with("INV-"));
    }
}
