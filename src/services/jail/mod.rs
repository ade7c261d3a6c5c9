//! Jail lifecycle: records, audit trail, role snapshots and the expiry runner.

mod error;
mod manager;
mod platform;
mod roles;
mod runner;
mod store;
mod transition;

#[cfg(test)]
pub(crate) mod testing;

pub use error::JailError;
pub use manager::{JailService, UnjailOutcome};
pub use platform::{JailReport, MemberDirectory, Notifier};
pub use roles::RoleLayout;
pub use runner::SweepSummary;
pub use store::{Actor, AuditLogEntry, JailRecord, JailStore};
pub use transition::{JailRequest, UNJAIL_REASON};

pub const MAX_REASON_LEN: usize = 100;

/// Reasons must be 1 to 100 characters once surrounding whitespace is ignored.
pub fn validate_reason(reason: &str) -> Result<(), JailError> {
    let len = reason.trim().chars().count();
    if len == 0 || len > MAX_REASON_LEN {
        return Err(JailError::InvalidReason);
    }
    Ok(())
}
