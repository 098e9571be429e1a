// src/zakat.rs
use crate::models::{AssetKind, Holding};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

/// 2.5% of total portfolio value.
pub const ZAKAT_RATE: Decimal = dec!(0.025);

pub fn zakat_due(total_value: Decimal) -> Decimal {
    total_value * ZAKAT_RATE
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZakatLine {
    pub kind: AssetKind,
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZakatReport {
    pub lines: Vec<ZakatLine>,
    pub total_value: Decimal,
    pub zakat_due: Decimal,
}

impl ZakatReport {
    /// Returns `None` for an empty portfolio: there is nothing to calculate.
    pub fn from_holdings(holdings: &[Holding]) -> Option<Self> {
        if holdings.is_empty() {
            return None;
        }
        let lines: Vec<ZakatLine> = holdings
            .iter()
            .map(|h| ZakatLine {
                kind: h.asset.kind(),
                value: h.value,
            })
            .collect();
        let total_value = lines.iter().map(|line| line.value).sum();
        Some(ZakatReport {
            lines,
            total_value,
            zakat_due: zakat_due(total_value),
        })
    }
}
