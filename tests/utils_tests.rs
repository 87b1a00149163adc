// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::Connection;
use rust_decimal::Decimal;
use splitpay::db;
use splitpay::utils::{
    fmt_brl, fmt_percentage, get_window_months, parse_amount, parse_brl, parse_month,
};

fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

#[test]
fn brl_format_groups_thousands_with_dots() {
    assert_eq!(fmt_brl(&d("1234.56")), "R$1.234,56");
    assert_eq!(fmt_brl(&d("1234567.8")), "R$1.234.567,80");
    assert_eq!(fmt_brl(&d("0")), "R$0,00");
    assert_eq!(fmt_brl(&d("999.999")), "R$1.000,00");
    assert_eq!(fmt_brl(&d("-50.5")), "R$-50,50");
}

#[test]
fn brl_parse_accepts_common_inputs() {
    assert_eq!(parse_brl("R$ 1.234,56").unwrap(), d("1234.56"));
    assert_eq!(parse_brl("1234,5").unwrap(), d("1234.5"));
    assert_eq!(parse_brl("R$12").unwrap(), d("12"));
    assert!(parse_brl("1,234.56").is_err());
    assert!(parse_brl("R$ abc").is_err());
}

#[test]
fn amounts_fall_back_to_plain_decimals() {
    assert_eq!(parse_amount("99.90").unwrap(), d("99.90"));
    assert_eq!(parse_amount("99,90").unwrap(), d("99.90"));
    assert!(parse_amount("ninety").is_err());
}

#[test]
fn percentage_renders_na_without_total() {
    assert_eq!(fmt_percentage(Some(d("33.3333"))), "33.33%");
    assert_eq!(fmt_percentage(None), "n/a");
}

#[test]
fn month_parses_to_first_day() {
    let m = parse_month("2024-07").unwrap();
    assert_eq!(m.to_string(), "2024-07-01");
    assert!(parse_month("2024-13").is_err());
}

#[test]
fn window_defaults_then_follows_setting() {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    assert_eq!(get_window_months(&conn).unwrap(), 12);
    splitpay::commands::settings::set(&conn, "window_months", "6").unwrap();
    assert_eq!(get_window_months(&conn).unwrap(), 6);
    assert!(splitpay::commands::settings::set(&conn, "window_months", "0").is_err());
    assert!(splitpay::commands::settings::set(&conn, "base_currency", "USD").is_err());
}
