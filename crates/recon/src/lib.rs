//! `interbranch-recon`: inter-branch clearing account reconciliation engine.
//!
//! Pure engine crate: receives decoded ledger or trial-balance rows, returns
//! pair and day-level differences plus the unmatched entries behind them.
//! No CLI or filesystem dependencies.

pub mod branch;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod model;
pub mod period;
pub mod report;
pub mod resolver;
pub mod trial_balance;
pub mod unmatched;

pub use config::ReconConfig;
pub use engine::{
    load_ledger_rows, load_trial_balance_rows, run_ledger, run_trial_balance, LedgerInput,
    TrialBalanceInput,
};
pub use error::ReconError;
pub use model::{LedgerRow, LedgerSheet, TrialBalanceRow};
pub use period::Period;
pub use report::{LedgerReport, TrialBalanceReport};
