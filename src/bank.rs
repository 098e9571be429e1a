// src/bank.rs
//! Simulated bank-account linking.
//!
//! Card numbers are stored in an obfuscated form: `ENC-` followed by the
//! reversed digits. The transformation is trivially reversible and is NOT
//! encryption. It only keeps the literal digits out of the snapshot file.

use crate::error::{AppError, Result};
use crate::models::BankAccount;
use chrono::Utc;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use tokio::time::{self, Duration};

const OBFUSCATION_PREFIX: &str = "ENC-";

pub fn obfuscate_card_number(card_number: &str) -> String {
    format!(
        "{}{}",
        OBFUSCATION_PREFIX,
        card_number.chars().rev().collect::<String>()
    )
}

pub fn reveal_card_number(obfuscated: &str) -> Option<String> {
    obfuscated
        .strip_prefix(OBFUSCATION_PREFIX)
        .map(|reversed| reversed.chars().rev().collect())
}

impl BankAccount {
    pub fn new(bank_name: &str, card_number: &str) -> Self {
        BankAccount {
            bank_name: bank_name.to_string(),
            obfuscated_card: obfuscate_card_number(card_number),
            linked_at: Utc::now(),
        }
    }

    /// `---` plus the last four characters of the obfuscated form.
    pub fn masked_card_number(&self) -> String {
        let chars: Vec<char> = self.obfuscated_card.chars().collect();
        if chars.len() < 8 {
            return String::new();
        }
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("---{}", tail)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BankLinks {
    accounts: BTreeMap<String, BankAccount>,
}

impl BankLinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last write wins: any earlier link for the user is replaced.
    pub fn link(&mut self, username: &str, bank_name: &str, card_number: &str) -> BankAccount {
        let account = BankAccount::new(bank_name, card_number);
        if let Some(previous) = self.accounts.insert(username.to_string(), account.clone()) {
            info!(
                "Replaced bank link for {} (was {})",
                username, previous.bank_name
            );
        }
        account
    }

    pub fn get(&self, username: &str) -> Option<&BankAccount> {
        self.accounts.get(username)
    }
}

/// Stand-in for the round trip to the bank during OTP verification.
#[derive(Debug, Clone, Copy)]
pub struct LinkDelay {
    duration: Duration,
}

impl LinkDelay {
    pub fn new(duration: Duration) -> Self {
        LinkDelay { duration }
    }

    /// Waits for the configured duration unless `cancel` resolves first.
    pub async fn wait<F>(&self, cancel: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        if self.duration.is_zero() {
            return Ok(());
        }
        tokio::select! {
            _ = time::sleep(self.duration) => Ok(()),
            _ = cancel => {
                warn!("Bank verification interrupted");
                Err(AppError::Cancelled)
            }
        }
    }
}
