/// Comma-grouped number with `decimals` fixed decimal places, as used for
/// chart value labels and dataset sizes. `NaN` prints as `"nan"`.
///
/// # Examples
///
/// ```
/// use clickstream_core::formatting::format_number;
///
/// assert_eq!(format_number(3.14159, 3), "3.142");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }

    // Nudge by half an ULP at the target precision so exact decimal
    // midpoints round up.
    let factor = 10_f64.powi(decimals as i32);
    let magnitude = value.abs();
    let rounded = (magnitude * factor + f64::EPSILON * magnitude * factor).round() / factor;

    let text = format!("{:.*}", decimals as usize, rounded);
    let (digits, fraction) = match text.split_once('.') {
        Some((digits, fraction)) => (digits, Some(fraction)),
        None => (text.as_str(), None),
    };

    let mut out = String::with_capacity(text.len() + digits.len() / 3 + 1);
    if value < 0.0 && rounded != 0.0 {
        out.push('-');
    }
    out.push_str(&group_thousands(digits));
    if let Some(fraction) = fraction {
        out.push('.');
        out.push_str(fraction);
    }
    out
}

/// Format a duration given in seconds as `"D days HH:MM:SS"`.
///
/// Seconds are rounded to the nearest whole second. `NaN` (the mean of an
/// empty sample) is rendered as `"NaT"`.
///
/// # Examples
///
/// ```
/// use clickstream_core::formatting::format_elapsed;
///
/// assert_eq!(format_elapsed(205.4), "0 days 00:03:25");
/// assert_eq!(format_elapsed(90_061.0), "1 days 01:01:01");
/// assert_eq!(format_elapsed(f64::NAN), "NaT");
/// ```
pub fn format_elapsed(seconds: f64) -> String {
    if !seconds.is_finite() {
        return "NaT".to_string();
    }
    let total = seconds.round() as i64;
    let sign = if total < 0 { "-" } else { "" };
    let total = total.abs();

    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let secs = total % 60;
    format!("{}{} days {:02}:{:02}:{:02}", sign, days, hours, minutes, secs)
}

/// The `"{label} | "` prefix put in front of every console line.
/// Empty when there is no label.
pub fn label_prefix(label: &str) -> String {
    if label.is_empty() {
        String::new()
    } else {
        format!("{} | ", label)
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// `"1234567"` -> `"1,234,567"`.
fn group_thousands(digits: &str) -> String {
    let lead = match digits.len() % 3 {
        0 => 3,
        n => n,
    };
    let mut out = String::from(&digits[..lead.min(digits.len())]);
    for chunk in digits.as_bytes()[lead.min(digits.len())..].chunks(3) {
        out.push(',');
        out.extend(chunk.iter().map(|&b| b as char));
    }
    out
}

// ── Tests ──────────────────────────────────────────────────────────────────────
