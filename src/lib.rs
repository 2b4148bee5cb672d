pub mod address;
pub mod amount;
pub mod cli;
pub mod client;
pub mod config;
pub mod crypto;
pub mod error;
pub mod keystore;
pub mod receive; // unreceived-queue reconciliation
pub mod signer;
pub mod tx;
