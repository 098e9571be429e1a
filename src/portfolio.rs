// src/portfolio.rs
use crate::error::{AppError, Result};
use crate::models::{ensure_positive, Asset, AssetKind, Holding};
use crate::valuation;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Portfolios keyed by username. Each portfolio keeps insertion order, and the
/// position of an asset is its only address, so indices shift after a removal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortfolioStore {
    portfolios: BTreeMap<String, Vec<Asset>>,
}

impl PortfolioStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects a quantity whose value, or the resulting portfolio total, would not
    /// fit in a `Decimal`, so listing and totals never overflow later.
    pub fn add(&mut self, username: &str, kind: AssetKind, quantity: Decimal) -> Result<()> {
        let asset = Asset::new(kind, quantity)?;
        let value = valuation::checked_value(kind, quantity).ok_or_else(too_large)?;
        self.total_value(username)
            .checked_add(value)
            .ok_or_else(too_large)?;
        self.portfolios
            .entry(username.to_string())
            .or_default()
            .push(asset);
        Ok(())
    }

    pub fn list(&self, username: &str) -> Vec<Holding> {
        self.assets(username)
            .iter()
            .enumerate()
            .map(|(index, asset)| Holding {
                index,
                asset: asset.clone(),
                value: asset.value(),
            })
            .collect()
    }

    pub fn total_value(&self, username: &str) -> Decimal {
        self.assets(username).iter().map(Asset::value).sum()
    }

    pub fn len(&self, username: &str) -> usize {
        self.assets(username).len()
    }

    pub fn is_empty(&self, username: &str) -> bool {
        self.assets(username).is_empty()
    }

    pub fn edit(&mut self, username: &str, index: usize, quantity: Decimal) -> Result<()> {
        ensure_positive(quantity)?;
        let len = self.len(username);
        let current = self
            .assets(username)
            .get(index)
            .ok_or(AppError::IndexOutOfRange { index, len })?;
        let value = valuation::checked_value(current.kind(), quantity).ok_or_else(too_large)?;
        (self.total_value(username) - current.value())
            .checked_add(value)
            .ok_or_else(too_large)?;

        let asset = self
            .portfolios
            .get_mut(username)
            .and_then(|assets| assets.get_mut(index))
            .ok_or(AppError::IndexOutOfRange { index, len })?;
        asset.set_quantity(quantity)
    }

    pub fn remove(&mut self, username: &str, index: usize) -> Result<Asset> {
        let len = self.len(username);
        if index >= len {
            return Err(AppError::IndexOutOfRange { index, len });
        }
        let assets = self
            .portfolios
            .get_mut(username)
            .ok_or(AppError::IndexOutOfRange { index, len })?;
        Ok(assets.remove(index))
    }

    fn assets(&self, username: &str) -> &[Asset] {
        self.portfolios
            .get(username)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

fn too_large() -> AppError {
    AppError::validation("quantity", "value is too large to track")
}
