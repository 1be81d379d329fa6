//! # Report Repository
//!
//! Support tickets. Independent of the order and payment ledgers.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use c4_core::validation::validate_title;
use c4_core::{NewReport, Report};

const REPORT_COLUMNS: &str =
    "id, user_id, title, category, summary, status, created_at, updated_at, resolved_at";

/// Status given to a report that arrives without one.
pub const STATUS_OPEN: &str = "open";

/// Status applied by [`ReportRepository::resolve`] when none is given.
pub const STATUS_RESOLVED: &str = "resolved";

/// Repository for support reports.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Files a report.
    ///
    /// ## Errors
    /// - `DbError::Validation` for a blank or overlong title
    /// - `DbError::ForeignKeyViolation` if `user_id` does not exist
    pub async fn create(&self, report: &NewReport) -> DbResult<Report> {
        let title = validate_title(Some(&report.title))?;
        let status = match report.status.trim() {
            "" => STATUS_OPEN.to_string(),
            s => s.to_lowercase(),
        };

        debug!(title = %title, user_id = ?report.user_id, "Filing report");

        let now = Utc::now();
        let created = sqlx::query_as::<_, Report>(&format!(
            r#"
            INSERT INTO reports (
                user_id, title, category, summary, status,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            RETURNING {REPORT_COLUMNS}
            "#
        ))
        .bind(report.user_id)
        .bind(&title)
        .bind(&report.category)
        .bind(&report.summary)
        .bind(&status)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Closes a report, stamping `resolved_at`.
    ///
    /// `status` defaults to `resolved`.
    pub async fn resolve(&self, id: i64, status: Option<&str>) -> DbResult<Report> {
        let status = status
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
            .unwrap_or_else(|| STATUS_RESOLVED.to_string());

        debug!(id, status = %status, "Resolving report");

        let now = Utc::now();
        sqlx::query_as::<_, Report>(&format!(
            r#"
            UPDATE reports SET
                status = ?2,
                resolved_at = ?3,
                updated_at = ?3
            WHERE id = ?1
            RETURNING {REPORT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&status)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Report", id))
    }

    /// Gets a report by id.
    pub async fn get(&self, id: i64) -> DbResult<Report> {
        sqlx::query_as::<_, Report>(&format!("SELECT {REPORT_COLUMNS} FROM reports WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Report", id))
    }

    /// All reports, newest first.
    pub async fn list(&self) -> DbResult<Vec<Report>> {
        let reports = sqlx::query_as::<_, Report>(&format!(
            "SELECT {REPORT_COLUMNS} FROM reports ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(reports)
    }
}
