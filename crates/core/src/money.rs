//! Money and GST arithmetic.
//!
//! All amounts are `i64` in the smallest currency unit (e.g. paise).
//! GST rates are integer percentages applied multiplicatively to a base
//! amount to obtain a gross amount. Intermediate products are widened to
//! `i128` so large carts cannot overflow.

/// GST portion of a base amount, rounded half-up to the nearest unit.
pub fn gst_component(base: i64, gst_percent: u32) -> i64 {
    debug_assert!(base >= 0, "gst over a negative base");
    ((base as i128 * gst_percent as i128 + 50) / 100) as i64
}

/// Base amount plus its GST component.
pub fn gross(base: i64, gst_percent: u32) -> i64 {
    base + gst_component(base, gst_percent)
}

/// Gross total for a quantity of units at a captured unit price and GST rate.
pub fn line_gross(qty: i64, unit_price: i64, gst_percent: u32) -> i64 {
    let base = (qty as i128 * unit_price as i128) as i64;
    gross(base, gst_percent)
}
