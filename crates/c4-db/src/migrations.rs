//! # Schema
//!
//! `migrations/sqlite/*.sql` is compiled into the binary and applied while
//! [`Database::new`](crate::Database::new) opens the store. Applied files
//! are tracked by checksum in `_sqlx_migrations`; editing one that already
//! shipped makes startup fail, so schema changes go in a new numbered file.
//!
//! The store, not the code, owns the uniqueness rules reconciliation
//! depends on:
//!
//! | Index                        | Guarantees                              |
//! |------------------------------|-----------------------------------------|
//! | `services.name`              | seeding is an upsert                    |
//! | `users.email`                | one user per (lower-cased) address      |
//! | `payments.gateway_reference` | one payment per gateway capture         |
//! | `transactions.tran_id`       | one audit row per delivered callback    |
//! | `counters.name`              | order sequence increments atomically    |

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies any migration the store has not seen yet.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    MIGRATOR.run(pool).await?;
    info!(migrations = MIGRATOR.migrations.len(), "Schema up to date");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_reconciliation_keys_are_unique() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        for (table, column) in [
            ("services", "name"),
            ("users", "email"),
            ("payments", "gateway_reference"),
            ("transactions", "tran_id"),
        ] {
            let unique: i64 = sqlx::query_scalar(
                r#"
                SELECT COUNT(*) FROM pragma_index_list(?1) AS il
                JOIN pragma_index_info(il.name) AS ii
                WHERE il."unique" = 1 AND ii.name = ?2
                "#,
            )
            .bind(table)
            .bind(column)
            .fetch_one(db.pool())
            .await
            .unwrap();
            assert_eq!(unique, 1, "{table}.{column}");
        }
    }

    #[tokio::test]
    async fn test_reopen_applies_nothing_new() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        run_migrations(db.pool()).await.unwrap();

        let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(applied as usize, MIGRATOR.migrations.len());
    }
}
