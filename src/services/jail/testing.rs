//! In-memory collaborators for jail tests.

use super::manager::JailService;
use super::platform::{JailReport, MemberDirectory, Notifier};
use super::roles::RoleLayout;
use super::store::JailStore;
use crate::Error;
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub(crate) const GUILD_ID: u64 = 100;
pub(crate) const JAIL_ROLE_ID: u64 = 7;

pub(crate) fn roles(ids: &[u64]) -> Vec<serenity::RoleId> {
    ids.iter().copied().map(serenity::RoleId::new).collect()
}

#[derive(Clone, Default)]
pub(crate) struct FakeDirectory {
    members: Arc<Mutex<HashMap<u64, Vec<serenity::RoleId>>>>,
    broken: Arc<Mutex<HashSet<u64>>>,
}

impl FakeDirectory {
    pub(crate) fn with_member(user: u64, role_ids: &[u64]) -> Self {
        let directory = Self::default();
        directory.add_member(user, role_ids);
        directory
    }

    pub(crate) fn add_member(&self, user: u64, role_ids: &[u64]) {
        self.members.lock().unwrap().insert(user, roles(role_ids));
    }

    pub(crate) fn remove_member(&self, user: u64) {
        self.members.lock().unwrap().remove(&user);
    }

    pub(crate) fn roles_of(&self, user: u64) -> Option<Vec<serenity::RoleId>> {
        self.members.lock().unwrap().get(&user).cloned()
    }

    /// Role changes for `user` fail from now on.
    pub(crate) fn break_member(&self, user: u64) {
        self.broken.lock().unwrap().insert(user);
    }
}

#[async_trait]
impl MemberDirectory for FakeDirectory {
    async fn member_roles(
        &self,
        user_id: serenity::UserId,
    ) -> Result<Option<Vec<serenity::RoleId>>, Error> {
        Ok(self.roles_of(user_id.get()))
    }

    async fn set_roles(
        &self,
        user_id: serenity::UserId,
        roles: &[serenity::RoleId],
        _audit_reason: &str,
    ) -> Result<(), Error> {
        if self.broken.lock().unwrap().contains(&user_id.get()) {
            anyhow::bail!("missing permissions to edit member {}", user_id);
        }
        match self.members.lock().unwrap().get_mut(&user_id.get()) {
            Some(current) => {
                *current = roles.to_vec();
                Ok(())
            }
            None => anyhow::bail!("unknown member {}", user_id),
        }
    }
}

#[derive(Default)]
pub(crate) struct FakeNotifier {
    direct: Mutex<Vec<(serenity::UserId, JailReport)>>,
    broadcasts: Mutex<Vec<JailReport>>,
    fail_direct: AtomicBool,
    fail_broadcast: AtomicBool,
}

impl FakeNotifier {
    pub(crate) fn fail_direct_messages(&self) {
        self.fail_direct.store(true, Ordering::SeqCst);
    }

    pub(crate) fn fail_broadcasts(&self) {
        self.fail_broadcast.store(true, Ordering::SeqCst);
    }

    pub(crate) fn direct_messages(&self) -> Vec<(serenity::UserId, JailReport)> {
        self.direct.lock().unwrap().clone()
    }

    pub(crate) fn broadcasts(&self) -> Vec<JailReport> {
        self.broadcasts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn notify_member(
        &self,
        user_id: serenity::UserId,
        report: &JailReport,
    ) -> Result<(), Error> {
        if self.fail_direct.load(Ordering::SeqCst) {
            anyhow::bail!("cannot send messages to this user");
        }
        self.direct.lock().unwrap().push((user_id, report.clone()));
        Ok(())
    }

    async fn broadcast(&self, report: &JailReport) -> Result<(), Error> {
        if self.fail_broadcast.load(Ordering::SeqCst) {
            anyhow::bail!("report channel unavailable");
        }
        self.broadcasts.lock().unwrap().push(report.clone());
        Ok(())
    }
}

/// A jail service over a fresh in-memory database.
pub(crate) async fn service(directory: FakeDirectory) -> (JailService, Arc<FakeNotifier>) {
    let notifier = Arc::new(FakeNotifier::default());
    let svc = JailService::new(
        JailStore::new(crate::db::test_connection().await),
        RoleLayout::for_guild(
            serenity::GuildId::new(GUILD_ID),
            serenity::RoleId::new(JAIL_ROLE_ID),
        ),
        Arc::new(directory),
        notifier.clone(),
    );
    (svc, notifier)
}
