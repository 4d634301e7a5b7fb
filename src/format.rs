/// Display form of the free-text salary field.
///
/// Keeps only digits and decimal points, then groups thousands. Text that
/// does not yield a non-zero number is shown as-is behind the currency sign.
pub fn format_salary(salary: &str) -> String {
    if salary.is_empty() {
        return String::new();
    }
    let digits: String = salary
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    match digits.parse::<f64>() {
        Ok(num) if num.is_finite() && num != 0.0 => format!("${}", group_thousands(num)),
        _ => format!("${}", salary),
    }
}

// en-US grouping, at most three fraction digits.
fn group_thousands(num: f64) -> String {
    let fixed = format!("{:.3}", num);
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if frac_part.is_empty() {
        grouped
    } else {
        format!("{}.{}", grouped, frac_part)
    }
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Placeholder for empty company/role in listings.
pub fn or_dash(s: &str) -> &str {
    if s.is_empty() { "—" } else { s }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_plain_numbers() {
        assert_eq!(format_salary("65000"), "$65,000");
        assert_eq!(format_salary("1234567"), "$1,234,567");
        assert_eq!(format_salary("999"), "$999");
    }

    #[test]
    fn strips_noise_before_parsing() {
        assert_eq!(format_salary("$120,000/yr"), "$120,000");
        assert_eq!(format_salary("65k"), "$65");
        assert_eq!(format_salary("65000.5"), "$65,000.5");
        assert_eq!(format_salary("1000.12345"), "$1,000.123");
    }

    #[test]
    fn falls_back_to_raw_text() {
        assert_eq!(format_salary(""), "");
        assert_eq!(format_salary("competitive"), "$competitive");
        assert_eq!(format_salary("0"), "$0");
        assert_eq!(format_salary("1.2.3"), "$1.2.3");
    }

    #[test]
    fn truncate_is_char_safe() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Zürich Zürich Zürich", 10), "Zürich ...");
    }
}
