//! Amount formatting for lists, totals and chart labels.

use rust_decimal::{Decimal, RoundingStrategy};

use super::symbols::currency_symbol;

/// Formats an amount as `-$1,234.56`.
///
/// Rounds half away from zero to whole units when `show_rounded` is set,
/// otherwise to two decimals.
#[must_use]
pub fn format_amount(amount: Decimal, currency_code: &str, show_rounded: bool) -> String {
    let decimals = if show_rounded { 0 } else { 2 };
    let rounded = amount.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    render(rounded, decimals, &currency_symbol(currency_code), "")
}

/// Formats an amount for compact chart labels.
///
/// Absolute values of 1000 and above are shown in thousands with one decimal
/// and a `K` suffix (`$1.5K`, `$12K`); smaller values are whole units.
#[must_use]
pub fn format_compact(amount: Decimal, currency_code: &str) -> String {
    let symbol = currency_symbol(currency_code);
    let thousand = Decimal::ONE_THOUSAND;

    if amount.abs() >= thousand {
        let scaled = (amount / thousand)
            .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
            .normalize();
        let decimals = scaled.scale();
        render(scaled, decimals, &symbol, "K")
    } else {
        let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        render(rounded, 0, &symbol, "")
    }
}

fn render(value: Decimal, decimals: u32, symbol: &str, suffix: &str) -> String {
    let negative = value.is_sign_negative() && !value.is_zero();
    let mut abs = value.abs();
    abs.rescale(decimals);
    let text = abs.to_string();

    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };

    let mut out = String::with_capacity(text.len() + symbol.len() + 8);
    if negative {
        out.push('-');
    }
    out.push_str(symbol);
    out.push_str(&group_thousands(int_part));
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out.push_str(suffix);
    out
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
