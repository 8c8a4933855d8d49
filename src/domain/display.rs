//! Display formatting for result tables: Korean won magnitudes, signed deltas and prices.

const JO: f64 = 1.0e12;
const EOK: f64 = 1.0e8;
const MAN: f64 = 1.0e4;

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Amount with the largest fitting magnitude suffix: 조 (10^12), 억 (10^8), 만 (10^4).
pub fn format_krw(amount: f64) -> String {
    let abs = amount.abs();
    if abs >= JO {
        format!("{:.2}조", amount / JO)
    } else if abs >= EOK {
        format!("{}억", group_thousands((amount / EOK).round() as i64))
    } else if abs >= MAN {
        format!("{}만", group_thousands((amount / MAN).round() as i64))
    } else {
        group_thousands(amount.round() as i64)
    }
}

/// Signed percentage with two decimals, e.g. `+3.25%`.
pub fn format_pct(pct: f64) -> String {
    // + 0.0 folds -0.0 into 0.0
    format!("{:+.2}%", round2(pct) + 0.0)
}

pub fn format_price(price: f64) -> String {
    format!("{:.2}", round2(price))
}

/// Terminal column width: Hangul and other CJK characters take two cells.
pub fn display_width(text: &str) -> usize {
    text.chars()
        .map(|c| match c as u32 {
            0x1100..=0x115F | 0x2E80..=0x9FFF | 0xAC00..=0xD7A3 | 0xF900..=0xFAFF
            | 0xFF00..=0xFF60 => 2,
            _ => 1,
        })
        .sum()
}

/// Left-align `text` to `width` terminal columns.
pub fn pad_to(text: &str, width: usize) -> String {
    let pad = width.saturating_sub(display_width(text));
    format!("{}{}", text, " ".repeat(pad))
}

fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
