// src/lib.rs
pub mod accounts;
pub mod api;
pub mod auth;
pub mod bank;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod portfolio;
pub mod validation;
pub mod valuation;
pub mod zakat;
