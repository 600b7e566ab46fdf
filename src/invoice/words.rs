//! Spanish spelling of monetary amounts for payment receipts.
//!
//! Handles the irregular teens and twenties, "cien" vs "ciento", the
//! irregular hundreds, and "mil"/"millón"/"millones" with the apocopated
//! "un" ("un millón", never "uno millón"). Cents are rounded to two digits
//! and rendered as a fraction.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

const UNITS: [&str; 30] = [
    "cero",
    "uno",
    "dos",
    "tres",
    "cuatro",
    "cinco",
    "seis",
    "siete",
    "ocho",
    "nueve",
    "diez",
    "once",
    "doce",
    "trece",
    "catorce",
    "quince",
    "dieciséis",
    "diecisiete",
    "dieciocho",
    "diecinueve",
    "veinte",
    "veintiuno",
    "veintidós",
    "veintitrés",
    "veinticuatro",
    "veinticinco",
    "veintiséis",
    "veintisiete",
    "veintiocho",
    "veintinueve",
];

const TENS: [&str; 10] = [
    "", "diez", "veinte", "treinta", "cuarenta", "cincuenta", "sesenta", "setenta", "ochenta",
    "noventa",
];

const HUNDREDS: [&str; 10] = [
    "",
    "ciento",
    "doscientos",
    "trescientos",
    "cuatrocientos",
    "quinientos",
    "seiscientos",
    "setecientos",
    "ochocientos",
    "novecientos",
];

/// 0..=99. `apocope` shortens a trailing "uno" to "un" (before "mil" /
/// "millón").
fn under_hundred(n: u64, apocope: bool) -> String {
    debug_assert!(n < 100);
    if n < 30 {
        let word = UNITS[n as usize];
        return match (n, apocope) {
            (1, true) => "un".to_string(),
            (21, true) => "veintiún".to_string(),
            _ => word.to_string(),
        };
    }
    let tens = TENS[(n / 10) as usize];
    match n % 10 {
        0 => tens.to_string(),
        unit => format!("{tens} y {}", under_hundred(unit, apocope)),
    }
}

/// 0..=999. Exactly 100 is "cien"; 101..=199 use "ciento".
fn under_thousand(n: u64, apocope: bool) -> String {
    debug_assert!(n < 1000);
    if n == 100 {
        return "cien".to_string();
    }
    if n < 100 {
        return under_hundred(n, apocope);
    }
    let hundreds = HUNDREDS[(n / 100) as usize];
    match n % 100 {
        0 => hundreds.to_string(),
        rest => format!("{hundreds} {}", under_hundred(rest, apocope)),
    }
}

/// 0..=999_999, used for the multiplier in front of "millones".
fn under_million(n: u64, apocope: bool) -> String {
    debug_assert!(n < 1_000_000);
    let thousands = n / 1000;
    let rest = n % 1000;

    let mut parts: Vec<String> = Vec::new();
    match thousands {
        0 => {}
        1 => parts.push("mil".to_string()),
        t => parts.push(format!("{} mil", under_thousand(t, true))),
    }
    if rest > 0 || parts.is_empty() {
        parts.push(under_thousand(rest, apocope));
    }
    parts.join(" ")
}

/// Spells a non-negative integer in Spanish.
pub fn number_to_words(n: u64) -> String {
    let millions = n / 1_000_000;
    let rest = n % 1_000_000;

    let mut parts: Vec<String> = Vec::new();
    match millions {
        0 => {}
        1 => parts.push("un millón".to_string()),
        m => parts.push(format!("{} millones", under_million(m, true))),
    }
    if rest > 0 || parts.is_empty() {
        parts.push(under_million(rest, false));
    }
    parts.join(" ")
}

/// Spells a monetary amount: integer part in words, cents (rounded to two
/// digits, away from zero on the midpoint) as a fraction.
pub fn amount_in_words(amount: Decimal) -> String {
    let rounded = amount
        .abs()
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let integer = rounded.trunc().to_u64().unwrap_or(0);
    let cents = ((rounded - rounded.trunc()) * Decimal::from(100))
        .round()
        .to_u64()
        .unwrap_or(0);
    format!("{} con {:02}/100", number_to_words(integer), cents)
}
