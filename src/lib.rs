//! Wallet Auth Server Library
//!
//! This library exports the core modules for the wallet authentication server:
//! challenge issuance, signature recovery, identity resolution and token minting.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
