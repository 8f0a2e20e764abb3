//! Locale-ambiguous numeric parsing (PT-BR and EN-US lab values).

use exam_timeline_core::RawValue;

/// Parse a metric value into a number. `None` means "not a number".
///
/// Numbers pass through unchanged. Text holding both `.` and `,` is read as
/// PT-BR (`1.234,56`), text holding only `,` uses it as the decimal mark, and
/// anything else is read as a plain decimal. Trailing text after the leading
/// numeral (units, flags) is ignored.
pub fn parse_metric_value(value: Option<&RawValue>) -> Option<f64> {
    match value? {
        RawValue::Number(number) => number.is_finite().then_some(*number),
        RawValue::Text(text) => parse_decimal_text(text),
    }
}

/// Text half of [`parse_metric_value`].
pub fn parse_decimal_text(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let normalized = match (trimmed.contains('.'), trimmed.contains(',')) {
        (true, true) => trimmed.replace('.', "").replace(',', "."),
        (false, true) => trimmed.replace(',', "."),
        _ => trimmed.to_string(),
    };

    leading_decimal(&normalized)
}

/// Read the longest decimal numeral at the start of `text`.
fn leading_decimal(text: &str) -> Option<f64> {
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }

    let integer_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut digits = end - integer_start;

    if bytes.get(end) == Some(&b'.') {
        let fraction_start = end + 1;
        let mut cursor = fraction_start;
        while bytes.get(cursor).is_some_and(u8::is_ascii_digit) {
            cursor += 1;
        }
        if cursor > fraction_start {
            digits += cursor - fraction_start;
            end = cursor;
        }
    }

    if digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut cursor = end + 1;
        if matches!(bytes.get(cursor), Some(b'+' | b'-')) {
            cursor += 1;
        }
        let exponent_start = cursor;
        while bytes.get(cursor).is_some_and(u8::is_ascii_digit) {
            cursor += 1;
        }
        if cursor > exponent_start {
            end = cursor;
        }
    }

    text[..end]
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
}
