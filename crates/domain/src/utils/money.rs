//! Locale-aware money formatting

/// Display symbol for an ISO 4217 currency code; unknown codes are returned as-is.
pub fn currency_symbol(code: &str) -> String {
    match code.to_uppercase().as_str() {
        "EUR" => "€".to_string(),
        "USD" => "$".to_string(),
        "GBP" => "£".to_string(),
        "JPY" => "¥".to_string(),
        "CHF" => "CHF".to_string(),
        other => other.to_string(),
    }
}

/// Number of minor-unit digits used when rounding an amount.
pub fn fraction_digits(code: &str) -> usize {
    match code.to_uppercase().as_str() {
        "JPY" | "KRW" | "HUF" | "ISK" => 0,
        _ => 2,
    }
}

/// Separators used by a locale: (grouping, decimal, symbol_after_amount)
fn locale_style(locale: &str) -> (char, char, bool) {
    let language = locale.split(['_', '-']).next().unwrap_or(locale).to_lowercase();
    match language.as_str() {
        "de" | "es" | "it" | "nl" | "pt" | "da" | "tr" | "id" => ('.', ',', true),
        "fr" | "pl" | "ru" | "cs" | "sv" | "fi" | "nb" | "sk" | "uk" => ('\u{a0}', ',', true),
        _ => (',', '.', false),
    }
}

/// Format `amount` in `currency` for `locale`.
///
/// `None` is formatted as zero.
pub fn format_money(amount: Option<f64>, currency: &str, locale: &str) -> String {
    let digits = fraction_digits(currency);
    let (grouping, decimal, suffix) = locale_style(locale);

    let value = amount.unwrap_or(0.0);
    let rounded = format!("{:.*}", digits, value.abs());
    let (integer, fraction) = match rounded.split_once('.') {
        Some((integer, fraction)) => (integer.to_string(), Some(fraction.to_string())),
        None => (rounded, None),
    };

    let mut number = group_digits(&integer, grouping);
    if let Some(fraction) = fraction {
        number.push(decimal);
        number.push_str(&fraction);
    }
    let sign = if value < 0.0 && number.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };

    let symbol = currency_symbol(currency);
    if suffix {
        format!("{sign}{number} {symbol}")
    } else {
        format!("{sign}{symbol}{number}")
    }
}

/// Format a plain number with the locale's separators and two decimals.
pub fn format_number(value: f64, locale: &str) -> String {
    let (grouping, decimal, _) = locale_style(locale);
    let rounded = format!("{:.2}", value.abs());
    let (integer, fraction) = rounded.split_once('.').unwrap_or((rounded.as_str(), "00"));
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{}{decimal}{fraction}", group_digits(integer, grouping))
}

fn group_digits(integer: &str, separator: char) -> String {
    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (index, digit) in integer.chars().enumerate() {
        if index > 0 && (integer.len() - index) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(digit);
    }
    grouped
}
