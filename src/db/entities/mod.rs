pub mod jail_logs;
pub mod jails;
