use crate::db::entities::jail_logs::{self, JailAction};
use crate::db::entities::jails;
use chrono::{DateTime, Utc};
use poise::serenity_prelude as serenity;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use serde_json::json;
use std::collections::BTreeSet;

/// Who performed a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Actor {
    Moderator(serenity::UserId),
    /// The expiry runner.
    Automated,
}

impl Actor {
    fn to_column(self) -> Option<i64> {
        match self {
            Actor::Moderator(id) => Some(id.get() as i64),
            Actor::Automated => None,
        }
    }

    fn from_column(raw: Option<i64>) -> Result<Self, DbErr> {
        match raw {
            Some(id) => Ok(Actor::Moderator(user_id(id)?)),
            None => Ok(Actor::Automated),
        }
    }
}

/// An active jail. At most one exists per member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JailRecord {
    pub user_id: serenity::UserId,
    pub preserved_roles: BTreeSet<serenity::RoleId>,
    pub reason: String,
    pub expires_at: DateTime<Utc>,
    pub issued_by: serenity::UserId,
    pub created_at: DateTime<Utc>,
}

impl JailRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditLogEntry {
    pub action: JailAction,
    pub reason: String,
    pub by: Actor,
    pub timestamp: DateTime<Utc>,
}

fn user_id(raw: i64) -> Result<serenity::UserId, DbErr> {
    match raw {
        id if id > 0 => Ok(serenity::UserId::new(id as u64)),
        id => Err(DbErr::Custom(format!("invalid user id {id} in jail tables"))),
    }
}

impl TryFrom<jails::Model> for JailRecord {
    type Error = DbErr;

    fn try_from(model: jails::Model) -> Result<Self, Self::Error> {
        let role_ids: Vec<u64> =
            serde_json::from_value(model.preserved_roles).map_err(|e| DbErr::Json(e.to_string()))?;

        Ok(Self {
            user_id: user_id(model.user_id)?,
            preserved_roles: role_ids
                .into_iter()
                .filter(|id| *id != 0)
                .map(serenity::RoleId::new)
                .collect(),
            reason: model.reason,
            expires_at: model.expires_at.with_timezone(&Utc),
            issued_by: user_id(model.issued_by)?,
            created_at: model.created_at.with_timezone(&Utc),
        })
    }
}

impl TryFrom<jail_logs::Model> for AuditLogEntry {
    type Error = DbErr;

    fn try_from(model: jail_logs::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            action: model.action,
            reason: model.reason,
            by: Actor::from_column(model.actor_id)?,
            timestamp: model.created_at.with_timezone(&Utc),
        })
    }
}

/// Persistence for the `jails` and `jail_logs` tables.
#[derive(Clone)]
pub struct JailStore {
    db: DatabaseConnection,
}

impl JailStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Insert the record, replacing any existing row for the same member.
    pub async fn upsert_record(&self, record: &JailRecord) -> Result<(), DbErr> {
        let role_ids: Vec<u64> = record.preserved_roles.iter().map(|r| r.get()).collect();

        let model = jails::ActiveModel {
            user_id: Set(record.user_id.get() as i64),
            preserved_roles: Set(json!(role_ids)),
            reason: Set(record.reason.clone()),
            expires_at: Set(record.expires_at.into()),
            issued_by: Set(record.issued_by.get() as i64),
            created_at: Set(record.created_at.into()),
        };

        jails::Entity::insert(model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(jails::Column::UserId)
                    .update_columns([
                        jails::Column::PreservedRoles,
                        jails::Column::Reason,
                        jails::Column::ExpiresAt,
                        jails::Column::IssuedBy,
                        jails::Column::CreatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;

        Ok(())
    }

    pub async fn find_record(
        &self,
        user_id: serenity::UserId,
    ) -> Result<Option<JailRecord>, DbErr> {
        jails::Entity::find_by_id(user_id.get() as i64)
            .one(&self.db)
            .await?
            .map(JailRecord::try_from)
            .transpose()
    }

    /// Returns `false` when there was nothing to delete.
    pub async fn delete_record(&self, user_id: serenity::UserId) -> Result<bool, DbErr> {
        let result = jails::Entity::delete_by_id(user_id.get() as i64)
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Records whose expiry is at or before `now`, served from the expiry index.
    pub async fn expired_records(&self, now: DateTime<Utc>) -> Result<Vec<JailRecord>, DbErr> {
        let now: DateTimeWithTimeZone = now.into();
        jails::Entity::find()
            .filter(jails::Column::ExpiresAt.lte(now))
            .order_by_asc(jails::Column::ExpiresAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(JailRecord::try_from)
            .collect()
    }

    pub async fn all_records(&self) -> Result<Vec<JailRecord>, DbErr> {
        jails::Entity::find()
            .all(&self.db)
            .await?
            .into_iter()
            .map(JailRecord::try_from)
            .collect()
    }

    pub async fn append_log(
        &self,
        user_id: serenity::UserId,
        entry: &AuditLogEntry,
    ) -> Result<(), DbErr> {
        jail_logs::ActiveModel {
            user_id: Set(user_id.get() as i64),
            action: Set(entry.action),
            reason: Set(entry.reason.clone()),
            actor_id: Set(entry.by.to_column()),
            created_at: Set(entry.timestamp.into()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        Ok(())
    }

    /// Full audit history for a member, oldest first.
    pub async fn logs_for(&self, user_id: serenity::UserId) -> Result<Vec<AuditLogEntry>, DbErr> {
        jail_logs::Entity::find()
            .filter(jail_logs::Column::UserId.eq(user_id.get() as i64))
            .order_by_asc(jail_logs::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(AuditLogEntry::try_from)
            .collect()
    }
}
