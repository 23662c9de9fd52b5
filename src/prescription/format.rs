//! Formatting helpers shared by the layout planner and list views.

use chrono::{Datelike, NaiveDate};

const SIZE_UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

/// Human-readable file size via repeated division by 1024.
/// `0 → "0 Bytes"`, `1024 → "1 KB"`, `1536 → "1.5 KB"`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    // Two decimals, trailing zeros stripped
    let rounded = (value * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{} {}", rounded as u64, SIZE_UNITS[unit])
    } else {
        let mut s = format!("{rounded:.2}");
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
        format!("{} {}", s, SIZE_UNITS[unit])
    }
}

const MONTHS_ES: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// Fixed Spanish long-date format: "26 de agosto de 2026".
pub fn format_date_es(date: NaiveDate) -> String {
    let month = MONTHS_ES[(date.month0()) as usize];
    format!("{} de {} de {}", date.day(), month, date.year())
}

/// Simple word-wrap for fixed-width text layout. Words longer than
/// `max_chars` are hard-split so no line ever exceeds the width. Always
/// returns at least one (possibly empty) line.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    let pieces = text.split_whitespace().flat_map(|word| {
        let chars: Vec<char> = word.chars().collect();
        chars
            .chunks(max_chars)
            .map(|chunk| chunk.iter().collect::<String>())
            .collect::<Vec<_>>()
    });

    for word in pieces {
        if current.chars().count() + word.chars().count() + 1 > max_chars && !current.is_empty() {
            lines.push(current.clone());
            current.clear();
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
