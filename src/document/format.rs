//! String formatting rules the SRI schema fixes down to the byte.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

/// Format a monetary amount with exactly 2 decimal places.
pub fn money(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.2}")
}

/// `DD/MM/YYYY`, the only date shape the annex accepts.
pub fn date(value: NaiveDate) -> String {
    value.format("%d/%m/%Y").to_string()
}

/// Left-pad an establishment or emission-point code to 3 digits.
pub fn pad3(code: &str) -> String {
    format!("{code:0>3}")
}

/// Render a stored zero-padded sequential as a plain integer.
///
/// Unparseable sequentials degrade to "0"; the schema tolerates it and the
/// run must not abort over one malformed identifier.
pub fn unpad_sequential(sequential: &str) -> String {
    match sequential.trim().parse::<u64>() {
        Ok(n) => n.to_string(),
        Err(_) => "0".to_string(),
    }
}

/// Pass an authorization number through, rescuing values that reached
/// storage in scientific notation.
///
/// A 49-digit authorization imported through a float column can surface as
/// "1.04857301e+48"; the annex rejects any exponent marker, so such values
/// are reparsed and rendered with zero decimals. Everything else is returned
/// untouched, digits intact.
pub fn authorization(stored: &str) -> String {
    if stored.contains(['e', 'E']) {
        match stored.trim().parse::<f64>() {
            Ok(n) => format!("{n:.0}"),
            Err(_) => String::new(),
        }
    } else {
        stored.to_string()
    }
}

/// Normalize a legal name to the schema's `razonSocial` constraints.
///
/// Drops every character that is neither alphanumeric nor whitespace,
/// collapses whitespace runs, trims, pads on the right to the 5-character
/// minimum and truncates to the 500-character maximum.
pub fn clean_legal_name(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    let mut out = kept.split_whitespace().collect::<Vec<_>>().join(" ");
    while out.chars().count() < 5 {
        out.push(' ');
    }
    if out.chars().count() > 500 {
        out = out.chars().take(500).collect();
    }
    out
}

/// `tipoIdInformante` from the identifier's length: 13 digits are a RUC,
/// 10 a national ID, anything else a passport.
pub fn informant_id_type(tax_id: &str) -> &'static str {
    match tax_id.chars().count() {
        13 => "R",
        10 => "C",
        _ => "P",
    }
}

/// `numEstabRuc`: "0" when the period has no sales, otherwise the distinct
/// establishment count zero-padded to 3 digits.
pub fn establishment_count(count: usize) -> String {
    if count == 0 {
        "0".to_string()
    } else {
        format!("{count:0>3}")
    }
}

/// `parteRel` flag rendering.
pub fn related_party(flag: bool) -> &'static str {
    if flag { "SI" } else { "NO" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn money_always_two_decimals() {
        assert_eq!(money(dec!(100)), "100.00");
        assert_eq!(money(dec!(115.5)), "115.50");
        assert_eq!(money(dec!(0.005)), "0.01");
        assert_eq!(money(dec!(1833.48)), "1833.48");
        assert_eq!(money(dec!(-2.5)), "-2.50");
    }

    #[test]
    fn date_renders_day_first() {
        let d = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        assert_eq!(date(d), "03/06/2024");
    }

    #[test]
    fn pad3_and_unpad_are_inverse_for_codes() {
        assert_eq!(pad3("1"), "001");
        assert_eq!(pad3("001"), "001");
        assert_eq!(unpad_sequential("000000038"), "38");
        assert_eq!(unpad_sequential("000000000"), "0");
        assert_eq!(unpad_sequential("no-digits"), "0");
    }

    #[test]
    fn authorization_passes_plain_digits_through() {
        let auth49 = "1".repeat(49);
        assert_eq!(authorization(&auth49), auth49);
        assert_eq!(authorization("1104857301"), "1104857301");
    }

    #[test]
    fn authorization_rescues_scientific_notation() {
        let out = authorization("1.04857301e+48");
        assert!(!out.contains(['e', 'E']));
        assert!(out.starts_with("104857301"));
        assert_eq!(out.chars().count(), 49);
    }

    #[test]
    fn legal_name_strips_collapses_and_pads() {
        assert_eq!(clean_legal_name("  ACME,  S.A.  "), "ACME SA");
        assert_eq!(clean_legal_name("AB"), "AB   ");
        assert_eq!(clean_legal_name("ÑANDÚ & CÍA"), "ÑANDÚ CÍA");
        let long = "X".repeat(600);
        assert_eq!(clean_legal_name(&long).chars().count(), 500);
    }

    #[test]
    fn informant_type_by_length() {
        assert_eq!(informant_id_type("1790012345001"), "R");
        assert_eq!(informant_id_type("1790012345"), "C");
        assert_eq!(informant_id_type("X123"), "P");
    }

    #[test]
    fn establishment_count_zero_or_padded() {
        assert_eq!(establishment_count(0), "0");
        assert_eq!(establishment_count(2), "002");
        assert_eq!(establishment_count(12), "012");
    }
}
