//! Removal of everything a user owns.
//!
//! Users live in an external identity provider, so the database cannot
//! cascade their deletion. Callers invoke [`purge_user_data`] when the
//! provider reports a deleted user.

use super::common::{ensure_connection_ready, CATEGORY_TABLE, RECORD_TABLE, TARGET_TABLE};
use super::error::RepoResult;
use crate::model::user::UserRef;
use log::info;
use rusqlite::Connection;

/// Rows removed by [`purge_user_data`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserPurge {
    pub records: u64,
    pub targets: u64,
}

/// Deletes all records and targets of `user` in one transaction.
///
/// Purging a user without data is not an error.
pub fn purge_user_data(conn: &Connection, user: &UserRef) -> RepoResult<UserPurge> {
    ensure_connection_ready(conn, &[CATEGORY_TABLE, RECORD_TABLE, TARGET_TABLE])?;

    let tx = conn.unchecked_transaction()?;
    let records = tx.execute(
        "DELETE FROM biomarker_records WHERE user_ref = ?1;",
        [user.as_str()],
    )?;
    let targets = tx.execute(
        "DELETE FROM user_biomarker_targets WHERE user_ref = ?1;",
        [user.as_str()],
    )?;
    tx.commit()?;

    info!("event=user_purge module=repo status=ok records={records} targets={targets}");
    Ok(UserPurge {
        records: records as u64,
        targets: targets as u64,
    })
}
