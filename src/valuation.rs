// src/valuation.rs
//! Fixed-price valuation. There is no market feed; every kind carries one unit price.

use crate::models::AssetKind;
use rust_decimal::Decimal;

pub fn unit_price(kind: AssetKind) -> Decimal {
    match kind {
        AssetKind::Stock => Decimal::from(150),
        AssetKind::RealEstate => Decimal::from(250_000),
        AssetKind::Crypto => Decimal::from(50_000),
        AssetKind::Gold => Decimal::from(1_800),
    }
}

pub fn value(kind: AssetKind, quantity: Decimal) -> Decimal {
    quantity * unit_price(kind)
}

/// `None` when the value does not fit in a `Decimal`.
pub fn checked_value(kind: AssetKind, quantity: Decimal) -> Option<Decimal> {
    quantity.checked_mul(unit_price(kind))
}
