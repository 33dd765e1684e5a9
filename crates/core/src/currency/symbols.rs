//! Static currency symbol table.

/// ISO 4217 code to display symbol.
const SYMBOLS: &[(&str, &str)] = &[
    ("USD", "$"),
    ("EUR", "€"),
    ("GBP", "£"),
    ("ILS", "₪"),
    ("JPY", "¥"),
    ("CAD", "CA$"),
    ("AUD", "A$"),
    ("INR", "₹"),
    ("CHF", "CHF "),
    ("CNY", "CN¥"),
    ("KRW", "₩"),
    ("RUB", "₽"),
    ("BRL", "R$"),
    ("MXN", "MX$"),
    ("SEK", "kr "),
    ("NOK", "kr "),
    ("DKK", "kr. "),
    ("PLN", "zł "),
    ("TRY", "₺"),
    ("ZAR", "R "),
];

/// Returns the display prefix for a currency code.
///
/// Unknown codes fall back to the uppercase code followed by a space.
#[must_use]
pub fn currency_symbol(code: &str) -> String {
    let code = code.trim().to_ascii_uppercase();
    SYMBOLS
        .iter()
        .find(|(c, _)| *c == code)
        .map_or_else(|| format!("{code} "), |(_, symbol)| (*symbol).to_string())
}

/// Returns true if the code has an entry in the symbol table.
#[must_use]
pub fn is_known_currency(code: &str) -> bool {
    let code = code.trim().to_ascii_uppercase();
    SYMBOLS.iter().any(|(c, _)| *c == code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("USD", "$")]
    #[case("eur", "€")]
    #[case("GBP", "£")]
    #[case("ILS", "₪")]
    #[case("JPY", "¥")]
    #[case("CHF", "CHF ")]
    fn test_known_symbols(#[case] code: &str, #[case] symbol: &str) {
        assert_eq!(currency_symbol(code), symbol);
        assert!(is_known_currency(code));
    }

    #[test]
    fn test_unknown_code_falls_back_to_code() {
        assert_eq!(currency_symbol("xyz"), "XYZ ");
        assert!(!is_known_currency("XYZ"));
    }
}
