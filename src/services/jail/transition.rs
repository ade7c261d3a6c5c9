//! Pure planning of jail and unjail transitions.
//!
//! Each plan is an ordered list of effects. The manager applies them in
//! order; the record write (or delete) always comes before the audit append,
//! so after a crash the `jails` table is the source of truth.

use super::platform::JailReport;
use super::roles::RoleLayout;
use super::store::{Actor, AuditLogEntry, JailRecord};
use crate::db::entities::jail_logs::JailAction;
use chrono::{DateTime, Duration, Utc};
use poise::serenity_prelude as serenity;

/// Reason recorded for unjails, which never carry one.
pub const UNJAIL_REASON: &str = "N/A";

const UNJAIL_AUDIT_REASON: &str = "Jail expired or removed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JailRequest {
    pub user_id: serenity::UserId,
    pub moderator: serenity::UserId,
    pub reason: String,
    pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    WriteRecord(JailRecord),
    DeleteRecord(serenity::UserId),
    SetRoles {
        user_id: serenity::UserId,
        roles: Vec<serenity::RoleId>,
        audit_reason: String,
    },
    AppendLog {
        user_id: serenity::UserId,
        entry: AuditLogEntry,
    },
    /// Best effort; failures are logged and dropped.
    NotifyMember {
        user_id: serenity::UserId,
        report: JailReport,
    },
    Broadcast(JailReport),
}

/// The record to write and the effects for jailing a member who currently
/// holds `current_roles`.
///
/// A member who is already jailed keeps the snapshot taken the first time;
/// the rest of the record is replaced.
pub fn plan_jail(
    layout: &RoleLayout,
    existing: Option<&JailRecord>,
    current_roles: &[serenity::RoleId],
    request: &JailRequest,
    now: DateTime<Utc>,
) -> (JailRecord, Vec<Effect>) {
    let mut preserved_roles = existing
        .map(|record| record.preserved_roles.clone())
        .unwrap_or_default();
    preserved_roles.extend(layout.snapshot(current_roles));

    let record = JailRecord {
        user_id: request.user_id,
        preserved_roles,
        reason: request.reason.clone(),
        expires_at: now + request.duration,
        issued_by: request.moderator,
        created_at: now,
    };

    let report = JailReport::Jailed {
        user_id: request.user_id,
        reason: request.reason.clone(),
        expires_at: record.expires_at,
        issued_by: request.moderator,
    };

    let effects = vec![
        Effect::WriteRecord(record.clone()),
        Effect::SetRoles {
            user_id: request.user_id,
            roles: layout.jailed_roles(),
            audit_reason: request.reason.clone(),
        },
        Effect::AppendLog {
            user_id: request.user_id,
            entry: AuditLogEntry {
                action: JailAction::Jailed,
                reason: request.reason.clone(),
                by: Actor::Moderator(request.moderator),
                timestamp: now,
            },
        },
        Effect::NotifyMember {
            user_id: request.user_id,
            report: report.clone(),
        },
        Effect::Broadcast(report),
    ];

    (record, effects)
}

/// Effects for lifting `record`. A member who has left the guild gets no
/// role change or direct message, but the record and audit trail still move.
pub fn plan_unjail(
    layout: &RoleLayout,
    record: &JailRecord,
    member_present: bool,
    by: Actor,
    now: DateTime<Utc>,
) -> Vec<Effect> {
    let user_id = record.user_id;
    let report = JailReport::Unjailed { user_id, by, at: now };

    let mut effects = Vec::with_capacity(5);
    if member_present {
        effects.push(Effect::SetRoles {
            user_id,
            roles: layout.restored_roles(&record.preserved_roles),
            audit_reason: UNJAIL_AUDIT_REASON.to_string(),
        });
    }
    effects.push(Effect::DeleteRecord(user_id));
    effects.push(Effect::AppendLog {
        user_id,
        entry: AuditLogEntry {
            action: JailAction::Unjailed,
            reason: UNJAIL_REASON.to_string(),
            by,
            timestamp: now,
        },
    });
    if member_present {
        effects.push(Effect::NotifyMember {
            user_id,
            report: report.clone(),
        });
    }
    effects.push(Effect::Broadcast(report));
    effects
}
