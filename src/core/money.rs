use serde::{Deserialize, Serialize};

/// How minor currency units are rendered for display.
///
/// A deployment picks exactly one policy; the two styles never blend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "style", rename_all = "snake_case")]
pub enum MoneyFormat {
    /// `$1,234.56`: divide by 100, two decimals, symbol in front.
    Prefixed {
        #[serde(default = "default_symbol")]
        symbol: String,
        #[serde(default = "default_thousands_separator")]
        thousands_separator: String,
        #[serde(default = "default_decimal_separator")]
        decimal_separator: String,
    },
    /// `1 234,56 kr`: locale grouping, configurable decimals, currency after the amount.
    GroupedSuffix {
        suffix: String,
        #[serde(default = "default_group_separator")]
        group_separator: String,
        #[serde(default = "default_suffix_decimal_separator")]
        decimal_separator: String,
        #[serde(default = "default_decimals")]
        decimals: u8,
    },
}

fn default_symbol() -> String {
    "$".to_string()
}

fn default_thousands_separator() -> String {
    ",".to_string()
}

fn default_decimal_separator() -> String {
    ".".to_string()
}

fn default_group_separator() -> String {
    " ".to_string()
}

fn default_suffix_decimal_separator() -> String {
    ",".to_string()
}

fn default_decimals() -> u8 {
    2
}

impl Default for MoneyFormat {
    fn default() -> Self {
        MoneyFormat::Prefixed {
            symbol: default_symbol(),
            thousands_separator: default_thousands_separator(),
            decimal_separator: default_decimal_separator(),
        }
    }
}

impl MoneyFormat {
    pub fn format(&self, minor_units: i64) -> String {
        match self {
            MoneyFormat::Prefixed {
                symbol,
                thousands_separator,
                decimal_separator,
            } => {
                let (whole, fraction) = split_minor_units(minor_units, 2);
                format!(
                    "{}{}{}{}{:02}",
                    sign(minor_units),
                    symbol,
                    group_digits(whole, thousands_separator),
                    decimal_separator,
                    fraction
                )
            }
            MoneyFormat::GroupedSuffix {
                suffix,
                group_separator,
                decimal_separator,
                decimals,
            } => {
                let decimals = (*decimals).min(2);
                let (whole, fraction) = split_minor_units(minor_units, decimals);
                let mut out = format!("{}{}", sign(minor_units), group_digits(whole, group_separator));
                if decimals > 0 {
                    out.push_str(decimal_separator);
                    out.push_str(&format!("{:0width$}", fraction, width = decimals as usize));
                }
                out.push(' ');
                out.push_str(suffix);
                out
            }
        }
    }
}

fn sign(minor_units: i64) -> &'static str {
    if minor_units < 0 {
        "-"
    } else {
        ""
    }
}

/// Splits an absolute amount into whole and fractional parts, rounding half away from zero
/// when fewer than two decimals are shown.
fn split_minor_units(minor_units: i64, decimals: u8) -> (u64, u64) {
    let abs = minor_units.unsigned_abs();
    let scale = 10u64.pow(u32::from(2 - decimals));
    let rounded = (abs + scale / 2) / scale;
    let unit = 10u64.pow(u32::from(decimals));
    (rounded / unit, rounded % unit)
}

fn group_digits(value: u64, separator: &str) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 * separator.len());
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push_str(separator);
        }
        out.push(ch);
    }
    out
}

/// Converts a decimal price string such as `"19.99"` into minor units.
pub fn parse_decimal_price(value: &str) -> Option<i64> {
    let value = value.trim();
    let (negative, digits) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value),
    };
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let cents: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().ok()? * 10,
        _ => fraction[..2].parse().ok()?,
    };
    let total = whole.checked_mul(100)?.checked_add(cents)?;
    Some(if negative { -total } else { total })
}
