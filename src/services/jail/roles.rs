use poise::serenity_prelude as serenity;
use std::collections::BTreeSet;

/// Role identifiers the snapshot and restore steps must treat specially.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleLayout {
    pub jail_role: serenity::RoleId,
    /// The implicit base role every member holds (`@everyone`).
    pub everyone_role: serenity::RoleId,
}

impl RoleLayout {
    pub fn for_guild(guild_id: serenity::GuildId, jail_role: serenity::RoleId) -> Self {
        Self {
            jail_role,
            everyone_role: serenity::RoleId::new(guild_id.get()),
        }
    }

    /// Roles to keep aside while the member is jailed.
    pub fn snapshot(&self, current: &[serenity::RoleId]) -> BTreeSet<serenity::RoleId> {
        current
            .iter()
            .copied()
            .filter(|role| *role != self.everyone_role && *role != self.jail_role)
            .collect()
    }

    /// The complete role set a jailed member holds.
    pub fn jailed_roles(&self) -> Vec<serenity::RoleId> {
        vec![self.jail_role]
    }

    /// The complete role set to apply when a jail ends. Never empty.
    pub fn restored_roles(&self, preserved: &BTreeSet<serenity::RoleId>) -> Vec<serenity::RoleId> {
        if preserved.is_empty() {
            vec![self.everyone_role]
        } else {
            preserved.iter().copied().collect()
        }
    }
}
