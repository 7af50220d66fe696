fn group_thousands(int_part: &str) -> String {
    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    with_commas.chars().rev().collect()
}

/// Format a float as a dollar amount with thousands separators: $1,234.56
pub fn money(val: f64) -> String {
    let negative = val < 0.0;
    let cents = format!("{:.2}", val.abs());
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));
    let with_commas = group_thousands(int_part);

    if negative {
        format!("-${with_commas}.{dec_part}")
    } else {
        format!("${with_commas}.{dec_part}")
    }
}

/// Whole units with separators; fractional quantities keep one decimal.
pub fn number(val: f64) -> String {
    let negative = val < 0.0;
    let abs = val.abs();
    let body = if (abs - abs.round()).abs() < 1e-9 {
        group_thousands(&format!("{:.0}", abs))
    } else {
        let s = format!("{:.1}", abs);
        let (int_part, dec_part) = s.split_once('.').unwrap_or((s.as_str(), "0"));
        format!("{}.{dec_part}", group_thousands(int_part))
    };
    if negative {
        format!("-{body}")
    } else {
        body
    }
}

/// Signed percentage with one decimal: +5.0%, -12.3%
pub fn percent(val: f64) -> String {
    format!("{val:+.1}%")
}
