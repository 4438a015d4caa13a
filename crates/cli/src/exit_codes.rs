//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; month-end scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success, every pair or day agrees        |
//! | 1       | Universal        | Differences found                        |
//! | 2       | Universal        | CLI usage error (bad args, bad period)   |
//! | 60-69   | recon            | Config, runtime and input failures       |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into `CliError::recon` or the relevant command

use interbranch_recon::ReconError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - the run completed and nothing disagrees.
pub const EXIT_SUCCESS: u8 = 0;

/// Differences found. Like `diff(1)`, exit 1 means "the sides differ."
pub const EXIT_DIFFS: u8 = 1;

/// Usage error - bad arguments, malformed period, same branch twice.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Recon (60-69)
// =============================================================================

/// Config cannot be parsed or validated, a mapped column is missing, or a
/// pair needs more breakdown columns than allowed.
pub const EXIT_RECON_INVALID_CONFIG: u8 = 60;

/// File could not be read or written.
pub const EXIT_RECON_RUNTIME: u8 = 61;

/// Input export could not be decoded (bad or overflowing amount, malformed CSV).
pub const EXIT_RECON_INPUT: u8 = 62;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        e if e.is_configuration() => EXIT_RECON_INVALID_CONFIG,
        ReconError::InvalidPeriod(_) | ReconError::InvalidInput(_) => EXIT_USAGE,
        ReconError::AmountParse { .. } | ReconError::AmountOverflow(_) => EXIT_RECON_INPUT,
        ReconError::Io(_) => EXIT_RECON_INPUT,
        _ => EXIT_RECON_RUNTIME,
    }
}
