// src/models.rs
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetKind {
    Stock,
    RealEstate,
    Crypto,
    Gold,
}

impl AssetKind {
    pub const ALL: [AssetKind; 4] = [
        AssetKind::Stock,
        AssetKind::RealEstate,
        AssetKind::Crypto,
        AssetKind::Gold,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Stock => "STOCK",
            AssetKind::RealEstate => "REAL_ESTATE",
            AssetKind::Crypto => "CRYPTO",
            AssetKind::Gold => "GOLD",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_uppercase();
        AssetKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| {
                AppError::validation(
                    "asset type",
                    "choose from STOCK, REAL_ESTATE, CRYPTO, GOLD",
                )
            })
    }
}

/// A single holding. The quantity is strictly positive for the whole life of the value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    kind: AssetKind,
    quantity: Decimal,
}

impl Asset {
    pub fn new(kind: AssetKind, quantity: Decimal) -> Result<Self> {
        ensure_positive(quantity)?;
        Ok(Asset { kind, quantity })
    }

    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn set_quantity(&mut self, quantity: Decimal) -> Result<()> {
        ensure_positive(quantity)?;
        self.quantity = quantity;
        Ok(())
    }

    pub fn value(&self) -> Decimal {
        crate::valuation::value(self.kind, self.quantity)
    }
}

pub(crate) fn ensure_positive(quantity: Decimal) -> Result<()> {
    if quantity > Decimal::ZERO {
        Ok(())
    } else {
        Err(AppError::validation("quantity", "value must be positive"))
    }
}

/// One row of a portfolio listing. `index` is the position used to edit or remove the asset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Holding {
    pub index: usize,
    pub asset: Asset,
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub email: String,
    pub username: String,
    pub credential: crate::auth::Credential,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankAccount {
    pub bank_name: String,
    pub obfuscated_card: String,
    pub linked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    pub token: String,
}
