use super::error::JailError;
use super::platform::{MemberDirectory, Notifier};
use super::roles::RoleLayout;
use super::store::{Actor, AuditLogEntry, JailRecord, JailStore};
use super::transition::{Effect, JailRequest, plan_jail, plan_unjail};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{error, info, warn};

/// Result of an unjail request. Unjailing a free member is not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnjailOutcome {
    Unjailed(JailRecord),
    NotJailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LiftWhen {
    Always,
    /// Only if the record is still expired once the subject lock is held.
    Expired,
}

/// Holds the per-member lock for the duration of one transition.
struct SubjectLock<'a> {
    locks: &'a DashMap<serenity::UserId, Arc<Mutex<()>>>,
    user_id: serenity::UserId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for SubjectLock<'_> {
    fn drop(&mut self) {
        self.guard.take();
        self.locks
            .remove_if(&self.user_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

pub struct JailService {
    pub(crate) store: JailStore,
    layout: RoleLayout,
    members: Arc<dyn MemberDirectory>,
    notifier: Arc<dyn Notifier>,
    locks: DashMap<serenity::UserId, Arc<Mutex<()>>>,
}

impl JailService {
    pub fn new(
        store: JailStore,
        layout: RoleLayout,
        members: Arc<dyn MemberDirectory>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            layout,
            members,
            notifier,
            locks: DashMap::new(),
        }
    }

    /// Jail a member, replacing their roles with the jail role.
    pub async fn jail_user(&self, request: JailRequest) -> Result<JailRecord, JailError> {
        self.jail_user_at(request, Utc::now()).await
    }

    pub(crate) async fn jail_user_at(
        &self,
        mut request: JailRequest,
        now: DateTime<Utc>,
    ) -> Result<JailRecord, JailError> {
        super::validate_reason(&request.reason)?;
        request.reason = request.reason.trim().to_string();
        if request.duration <= Duration::zero() {
            return Err(JailError::InvalidDuration(
                "duration must be greater than zero".to_string(),
            ));
        }

        let _lock = self.lock_subject(request.user_id).await;

        let current_roles = self
            .members
            .member_roles(request.user_id)
            .await?
            .ok_or(JailError::SubjectNotFound(request.user_id))?;
        let existing = self.store.find_record(request.user_id).await?;

        let (record, effects) = plan_jail(
            &self.layout,
            existing.as_ref(),
            &current_roles,
            &request,
            now,
        );
        self.apply_jail(&request, existing.as_ref(), &current_roles, effects)
            .await?;

        info!(
            "Jailed user {} until {} (by {}, {} role(s) preserved)",
            record.user_id,
            record.expires_at,
            record.issued_by,
            record.preserved_roles.len()
        );

        Ok(record)
    }

    /// Lift a jail and restore the preserved roles. A no-op for free members.
    pub async fn unjail_user(
        &self,
        user_id: serenity::UserId,
        by: Actor,
    ) -> Result<UnjailOutcome, JailError> {
        self.lift(user_id, by, Utc::now(), LiftWhen::Always).await
    }

    /// Unjail on behalf of the expiry runner, re-checking the deadline under
    /// the member's lock so a fresh re-jail is never cut short.
    pub(crate) async fn unjail_expired(
        &self,
        user_id: serenity::UserId,
        now: DateTime<Utc>,
    ) -> Result<UnjailOutcome, JailError> {
        self.lift(user_id, Actor::Automated, now, LiftWhen::Expired)
            .await
    }

    pub async fn find_jail(
        &self,
        user_id: serenity::UserId,
    ) -> Result<Option<JailRecord>, JailError> {
        Ok(self.store.find_record(user_id).await?)
    }

    pub async fn logs_for(
        &self,
        user_id: serenity::UserId,
    ) -> Result<Vec<AuditLogEntry>, JailError> {
        Ok(self.store.logs_for(user_id).await?)
    }

    async fn lift(
        &self,
        user_id: serenity::UserId,
        by: Actor,
        now: DateTime<Utc>,
        when: LiftWhen,
    ) -> Result<UnjailOutcome, JailError> {
        let _lock = self.lock_subject(user_id).await;

        let record = match self.store.find_record(user_id).await? {
            Some(record) => record,
            None => return Ok(UnjailOutcome::NotJailed),
        };
        if when == LiftWhen::Expired && !record.is_expired(now) {
            return Ok(UnjailOutcome::NotJailed);
        }

        let member_present = self.members.member_roles(user_id).await?.is_some();
        if !member_present {
            warn!(
                "User {} left the guild while jailed; clearing the record only",
                user_id
            );
        }

        let effects = plan_unjail(&self.layout, &record, member_present, by, now);
        self.apply(effects).await?;

        info!("Unjailed user {} ({:?})", user_id, by);

        Ok(UnjailOutcome::Unjailed(record))
    }

    async fn lock_subject(&self, user_id: serenity::UserId) -> SubjectLock<'_> {
        let lock = self.locks.entry(user_id).or_default().clone();
        let guard = lock.lock_owned().await;
        SubjectLock {
            locks: &self.locks,
            user_id,
            guard: Some(guard),
        }
    }

    /// Applies a jail plan. A failure before the audit entry is written
    /// rolls the record and roles back, so a record never outlives a jail
    /// that did not take effect.
    async fn apply_jail(
        &self,
        request: &JailRequest,
        existing: Option<&JailRecord>,
        current_roles: &[serenity::RoleId],
        effects: Vec<Effect>,
    ) -> Result<(), JailError> {
        let mut roles_set = false;
        let mut committed = false;
        for effect in effects {
            let sets_roles = matches!(effect, Effect::SetRoles { .. });
            let appends_log = matches!(effect, Effect::AppendLog { .. });

            if let Err(e) = self.apply_one(effect).await {
                if !committed {
                    self.roll_back_jail(request.user_id, existing, current_roles, roles_set)
                        .await;
                }
                return Err(e);
            }

            roles_set |= sets_roles;
            committed |= appends_log;
        }
        Ok(())
    }

    /// Best effort: puts back the previous record (or none) and, if they were
    /// already swapped, the member's roles.
    async fn roll_back_jail(
        &self,
        user_id: serenity::UserId,
        existing: Option<&JailRecord>,
        current_roles: &[serenity::RoleId],
        roles_set: bool,
    ) {
        warn!("Jail of user {} failed, rolling back", user_id);

        let restored = match existing {
            Some(previous) => self.store.upsert_record(previous).await,
            None => self.store.delete_record(user_id).await.map(|_| ()),
        };
        if let Err(e) = restored {
            error!("Failed to roll back jail record of user {}: {:?}", user_id, e);
        }

        // A re-jail keeps the jail role; only a fresh jail hands roles back
        if roles_set && existing.is_none() {
            if let Err(e) = self
                .members
                .set_roles(user_id, current_roles, "Jail rolled back")
                .await
            {
                error!("Failed to restore roles of user {}: {:?}", user_id, e);
            }
        }
    }

    async fn apply(&self, effects: Vec<Effect>) -> Result<(), JailError> {
        for effect in effects {
            self.apply_one(effect).await?;
        }
        Ok(())
    }

    async fn apply_one(&self, effect: Effect) -> Result<(), JailError> {
        match effect {
            Effect::WriteRecord(record) => self.store.upsert_record(&record).await?,
            Effect::DeleteRecord(user_id) => {
                self.store.delete_record(user_id).await?;
            }
            Effect::SetRoles {
                user_id,
                roles,
                audit_reason,
            } => {
                self.members
                    .set_roles(user_id, &roles, &audit_reason)
                    .await?
            }
            Effect::AppendLog { user_id, entry } => {
                self.store.append_log(user_id, &entry).await?
            }
            Effect::NotifyMember { user_id, report } => {
                if let Err(e) = self.notifier.notify_member(user_id, &report).await {
                    warn!("Could not send DM to user {}: {:?}", user_id, e);
                }
            }
            Effect::Broadcast(report) => self.notifier.broadcast(&report).await?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::entities::jail_logs::JailAction;
    use crate::services::jail::platform::JailReport;
    use crate::services::jail::testing::{FakeDirectory, FakeNotifier, roles, service};

    fn request(user: u64, minutes: i64) -> JailRequest {
        JailRequest {
            user_id: serenity::UserId::new(user),
            moderator: serenity::UserId::new(900),
            reason: "spam".to_string(),
            duration: Duration::minutes(minutes),
        }
    }

    #[tokio::test]
    async fn jail_then_unjail_restores_the_original_roles() {
        let directory = FakeDirectory::with_member(1, &[3, 4, 100]);
        let (svc, notifier) = service(directory.clone()).await;
        let subject = serenity::UserId::new(1);

        let record = svc.jail_user(request(1, 10)).await.unwrap();
        assert_eq!(directory.roles_of(1), Some(roles(&[7])));
        assert_eq!(record.preserved_roles, roles(&[3, 4]).into_iter().collect());
        assert_eq!(svc.store.all_records().await.unwrap().len(), 1);

        let outcome = svc
            .unjail_user(subject, Actor::Moderator(serenity::UserId::new(900)))
            .await
            .unwrap();
        assert!(matches!(outcome, UnjailOutcome::Unjailed(_)));
        assert_eq!(directory.roles_of(1), Some(roles(&[3, 4])));
        assert!(svc.store.all_records().await.unwrap().is_empty());

        let actions: Vec<JailAction> = svc
            .logs_for(subject)
            .await
            .unwrap()
            .into_iter()
            .map(|entry| entry.action)
            .collect();
        assert_eq!(actions, vec![JailAction::Jailed, JailAction::Unjailed]);
        assert_eq!(notifier.broadcasts().len(), 2);
        assert_eq!(notifier.direct_messages().len(), 2);
    }

    #[tokio::test]
    async fn member_without_roles_is_restored_to_the_base_role() {
        let directory = FakeDirectory::with_member(1, &[]);
        let (svc, _) = service(directory.clone()).await;

        svc.jail_user(request(1, 10)).await.unwrap();
        svc.unjail_user(serenity::UserId::new(1), Actor::Automated)
            .await
            .unwrap();

        assert_eq!(directory.roles_of(1), Some(roles(&[100])));
    }

    #[tokio::test]
    async fn jailing_an_unknown_member_writes_nothing() {
        let (svc, notifier) = service(FakeDirectory::default()).await;

        let err = svc.jail_user(request(1, 10)).await.unwrap_err();
        assert!(matches!(err, JailError::SubjectNotFound(id) if id.get() == 1));
        assert!(svc.store.all_records().await.unwrap().is_empty());
        assert!(svc.logs_for(serenity::UserId::new(1)).await.unwrap().is_empty());
        assert!(notifier.broadcasts().is_empty());
    }

    #[tokio::test]
    async fn invalid_requests_are_rejected_before_any_lookup() {
        let directory = FakeDirectory::with_member(1, &[3]);
        let (svc, _) = service(directory.clone()).await;

        let err = svc.jail_user(request(1, 0)).await.unwrap_err();
        assert!(matches!(err, JailError::InvalidDuration(_)));

        let mut blank = request(1, 10);
        blank.reason = "   ".to_string();
        assert!(matches!(
            svc.jail_user(blank).await.unwrap_err(),
            JailError::InvalidReason
        ));

        let mut long = request(1, 10);
        long.reason = "x".repeat(101);
        assert!(matches!(
            svc.jail_user(long).await.unwrap_err(),
            JailError::InvalidReason
        ));

        assert_eq!(directory.roles_of(1), Some(roles(&[3])));
        assert!(svc.store.all_records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unjail_twice_is_a_silent_no_op() {
        let (svc, _) = service(FakeDirectory::with_member(1, &[3])).await;
        let subject = serenity::UserId::new(1);

        svc.jail_user(request(1, 10)).await.unwrap();
        svc.unjail_user(subject, Actor::Automated).await.unwrap();
        let second = svc.unjail_user(subject, Actor::Automated).await.unwrap();

        assert_eq!(second, UnjailOutcome::NotJailed);
        assert_eq!(svc.logs_for(subject).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn concurrent_unjails_append_a_single_entry() {
        let (svc, _) = service(FakeDirectory::with_member(1, &[3])).await;
        let subject = serenity::UserId::new(1);
        svc.jail_user(request(1, 10)).await.unwrap();

        let (manual, automatic) = tokio::join!(
            svc.unjail_user(subject, Actor::Moderator(serenity::UserId::new(900))),
            svc.unjail_user(subject, Actor::Automated),
        );

        let outcomes = [manual.unwrap(), automatic.unwrap()];
        assert_eq!(
            outcomes
                .iter()
                .filter(|o| matches!(o, UnjailOutcome::Unjailed(_)))
                .count(),
            1
        );
        assert_eq!(svc.logs_for(subject).await.unwrap().len(), 2);
        assert!(svc.locks.is_empty());
    }

    #[tokio::test]
    async fn rejail_keeps_the_first_snapshot() {
        let directory = FakeDirectory::with_member(1, &[3, 4]);
        let (svc, _) = service(directory.clone()).await;

        svc.jail_user(request(1, 10)).await.unwrap();
        let mut again = request(1, 60);
        again.reason = "again".to_string();
        let record = svc.jail_user(again).await.unwrap();

        assert_eq!(record.reason, "again");
        assert_eq!(record.preserved_roles, roles(&[3, 4]).into_iter().collect());

        svc.unjail_user(serenity::UserId::new(1), Actor::Automated)
            .await
            .unwrap();
        assert_eq!(directory.roles_of(1), Some(roles(&[3, 4])));
    }

    #[tokio::test]
    async fn failed_role_change_leaves_no_record_or_log() {
        let directory = FakeDirectory::with_member(1, &[3]);
        let (svc, notifier) = service(directory.clone()).await;
        directory.break_member(1);

        let err = svc.jail_user(request(1, 10)).await.unwrap_err();
        assert!(matches!(err, JailError::Platform(_)));

        assert!(svc.find_jail(serenity::UserId::new(1)).await.unwrap().is_none());
        assert!(svc.logs_for(serenity::UserId::new(1)).await.unwrap().is_empty());
        assert_eq!(directory.roles_of(1), Some(roles(&[3])));
        assert!(notifier.broadcasts().is_empty());
    }

    #[tokio::test]
    async fn failed_rejail_keeps_the_previous_record() {
        let directory = FakeDirectory::with_member(1, &[3]);
        let (svc, _) = service(directory.clone()).await;
        let subject = serenity::UserId::new(1);
        let first = svc.jail_user(request(1, 10)).await.unwrap();
        directory.break_member(1);

        let mut again = request(1, 60);
        again.reason = "again".to_string();
        assert!(svc.jail_user(again).await.is_err());

        let record = svc.find_jail(subject).await.unwrap().unwrap();
        assert_eq!(record.reason, "spam");
        assert_eq!(record.expires_at.timestamp(), first.expires_at.timestamp());
        assert_eq!(svc.logs_for(subject).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reasons_are_stored_without_surrounding_whitespace() {
        let (svc, _) = service(FakeDirectory::with_member(1, &[3])).await;
        let subject = serenity::UserId::new(1);

        let mut padded = request(1, 10);
        padded.reason = format!(" {}", "a".repeat(100));
        let record = svc.jail_user(padded).await.unwrap();
        assert_eq!(record.reason, "a".repeat(100));

        let mut spaced = request(1, 10);
        spaced.reason = "  spam \n".to_string();
        svc.jail_user(spaced).await.unwrap();

        let logs = svc.logs_for(subject).await.unwrap();
        assert_eq!(logs[0].reason.chars().count(), 100);
        assert_eq!(logs[1].reason, "spam");
        assert_eq!(svc.find_jail(subject).await.unwrap().unwrap().reason, "spam");
    }

    #[tokio::test]
    async fn failed_direct_message_does_not_abort_the_jail() {
        let (svc, notifier) = service(FakeDirectory::with_member(1, &[3])).await;
        notifier.fail_direct_messages();

        svc.jail_user(request(1, 10)).await.unwrap();

        assert!(svc.find_jail(serenity::UserId::new(1)).await.unwrap().is_some());
        assert!(matches!(
            notifier.broadcasts().as_slice(),
            [JailReport::Jailed { .. }]
        ));
    }

    #[tokio::test]
    async fn failed_broadcast_is_surfaced_after_state_is_committed() {
        let (svc, notifier) = service(FakeDirectory::with_member(1, &[3])).await;
        notifier.fail_broadcasts();

        let err = svc.jail_user(request(1, 10)).await.unwrap_err();
        assert!(matches!(err, JailError::Platform(_)));
        assert!(svc.find_jail(serenity::UserId::new(1)).await.unwrap().is_some());
        assert_eq!(svc.logs_for(serenity::UserId::new(1)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn departed_member_is_still_cleared_and_logged() {
        let directory = FakeDirectory::with_member(1, &[3]);
        let (svc, notifier) = service(directory.clone()).await;
        let subject = serenity::UserId::new(1);

        svc.jail_user(request(1, 10)).await.unwrap();
        directory.remove_member(1);

        let outcome = svc.unjail_user(subject, Actor::Automated).await.unwrap();
        assert!(matches!(outcome, UnjailOutcome::Unjailed(_)));
        assert!(svc.find_jail(subject).await.unwrap().is_none());
        assert_eq!(svc.logs_for(subject).await.unwrap().len(), 2);
        // Only the jail notice reached the member
        assert_eq!(notifier.direct_messages().len(), 1);
    }
}
