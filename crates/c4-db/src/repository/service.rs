//! # Service Repository
//!
//! The catalog of sellable services. Read by the order ledger on every
//! order; written by the default-catalog seeding and administrative
//! correction.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use c4_core::validation::validate_price;
use c4_core::{Money, NewService, Service};

const SERVICE_COLUMNS: &str =
    "id, name, price, image, description, long_description, created_at, updated_at";

/// Default catalog: (name, price in cents, image, description, long description).
const DEFAULT_SERVICES: &[(&str, i64, &str, &str, Option<&str>)] = &[
    (
        "Auto Delete Comment - 1 Month Plan",
        999,
        "C4-Auto-Delete-Comment.png",
        "Kick-off automation with full feature access for 30 days.",
        Some("Entry plan for teams validating their workflow. Includes all standard modules and support."),
    ),
    (
        "Facebook Station",
        2999,
        "C4-FB-Station.png",
        "Quarterly bundle with bonus days and premium feature unlocks.",
        Some("Our most popular option. Extend coverage, unlock additional rotations, and receive priority support."),
    ),
    (
        "Report Facebook",
        11999,
        "C4-Report-Facebook.png",
        "Annual coverage with native verification and custom feature access.",
        Some("Full-year automation license with concierge onboarding, compliance review, and tailored feature drops."),
    ),
    (
        "Telegram Station",
        8999,
        "C4-TG-Station.png",
        "Immersive audio with hybrid ANC for open offices.",
        None,
    ),
    (
        "Smart Desk Organizer",
        5999,
        "txt.jpg",
        "Wireless charging, pen storage, and cable routing combined.",
        None,
    ),
];

/// [`DEFAULT_SERVICES`] as insertable rows.
fn default_services() -> Vec<NewService> {
    DEFAULT_SERVICES
        .iter()
        .map(|(name, cents, image, description, long_description)| NewService {
            name: name.to_string(),
            price: Money::from_cents(*cents),
            image: Some(image.to_string()),
            description: Some(description.to_string()),
            long_description: long_description.map(str::to_string),
        })
        .collect()
}

/// Deployed static asset names, keyed by their lower-cased form.
const CANONICAL_IMAGES: &[(&str, &str)] = &[
    ("c4_auto_delete_comment.png", "C4_Auto_Delete_Comment.png"),
    ("c4_fb_station.png", "C4_FB_Station.png"),
    ("c4_report_facebook.png", "C4_Report_Facebook.png"),
    ("c4_tg_station.png", "C4_TG_Station.png"),
    ("logo_c4_hub.png", "logo_C4_HUB.png"),
    ("logo_c4_tech_hub.png", "logo_C4_TECH_HUB.png"),
    ("txt.jpg", "txt.jpg"),
];

/// Normalizes an image file name to match the deployed asset set.
///
/// Trims, replaces spaces with underscores, then maps known names to their
/// canonical casing. Blank names become `None`.
pub fn normalize_image_name(name: Option<&str>) -> Option<String> {
    let sanitized = name?.trim().replace(' ', "_");
    if sanitized.is_empty() {
        return None;
    }

    let lowered = sanitized.to_lowercase();
    let canonical = CANONICAL_IMAGES
        .iter()
        .find(|(key, _)| *key == lowered)
        .map(|(_, canonical)| canonical.to_string());

    Some(canonical.unwrap_or(sanitized))
}

/// Repository for the service catalog.
#[derive(Debug, Clone)]
pub struct ServiceRepository {
    pool: SqlitePool,
}

impl ServiceRepository {
    /// Creates a new ServiceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ServiceRepository { pool }
    }

    /// All services, ordered by id.
    pub async fn list(&self) -> DbResult<Vec<Service>> {
        let services = sqlx::query_as::<_, Service>(&format!(
            "SELECT {SERVICE_COLUMNS} FROM services ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(services)
    }

    /// Looks a service up by id, returning `None` if absent.
    pub async fn find(&self, id: i64) -> DbResult<Option<Service>> {
        let service = sqlx::query_as::<_, Service>(&format!(
            "SELECT {SERVICE_COLUMNS} FROM services WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(service)
    }

    /// Gets a service by id.
    ///
    /// ## Errors
    /// `DbError::NotFound` if the id does not resolve.
    pub async fn get(&self, id: i64) -> DbResult<Service> {
        self.find(id)
            .await?
            .ok_or_else(|| DbError::not_found("Service", id))
    }

    /// Inserts a new service.
    ///
    /// ## Errors
    /// - `DbError::Validation` for a negative price
    /// - `DbError::UniqueViolation` if the name is taken
    pub async fn insert(&self, service: &NewService) -> DbResult<Service> {
        validate_price(service.price)?;
        debug!(name = %service.name, price = %service.price, "Inserting service");

        let now = Utc::now();
        let inserted = sqlx::query_as::<_, Service>(&format!(
            r#"
            INSERT INTO services (
                name, price, image, description, long_description,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            RETURNING {SERVICE_COLUMNS}
            "#
        ))
        .bind(&service.name)
        .bind(service.price)
        .bind(normalize_image_name(service.image.as_deref()))
        .bind(&service.description)
        .bind(&service.long_description)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(inserted)
    }

    /// Inserts a service, or corrects the existing one with the same name.
    ///
    /// Price always takes the new value. Image and descriptions are only
    /// overwritten when the new value is present.
    pub async fn upsert_by_name(&self, service: &NewService) -> DbResult<Service> {
        validate_price(service.price)?;
        debug!(name = %service.name, "Upserting service by name");

        let now = Utc::now();
        let upserted = sqlx::query_as::<_, Service>(&format!(
            r#"
            INSERT INTO services (
                name, price, image, description, long_description,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            ON CONFLICT(name) DO UPDATE SET
                price = excluded.price,
                image = COALESCE(excluded.image, services.image),
                description = COALESCE(excluded.description, services.description),
                long_description = COALESCE(excluded.long_description, services.long_description),
                updated_at = excluded.updated_at
            RETURNING {SERVICE_COLUMNS}
            "#
        ))
        .bind(&service.name)
        .bind(service.price)
        .bind(normalize_image_name(service.image.as_deref()))
        .bind(&service.description)
        .bind(&service.long_description)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(upserted)
    }

    /// Writes every default service, matched by name.
    ///
    /// Missing defaults are inserted and existing ones corrected, so calling
    /// it again is harmless. Returns the catalog afterwards.
    pub async fn seed_defaults(&self) -> DbResult<Vec<Service>> {
        for service in default_services() {
            self.upsert_by_name(&service).await?;
        }
        info!(defaults = DEFAULT_SERVICES.len(), "Default catalog seeded");
        self.list().await
    }

    /// The catalog, seeding the defaults first when it is empty.
    pub async fn list_or_seed(&self) -> DbResult<Vec<Service>> {
        let services = self.list().await?;
        if !services.is_empty() {
            return Ok(services);
        }
        self.seed_defaults().await
    }

    /// Looks a service up; on a miss the defaults are seeded and the lookup
    /// retried, so ids of default services resolve on a fresh store.
    pub async fn find_or_seed(&self, id: i64) -> DbResult<Option<Service>> {
        if let Some(service) = self.find(id).await? {
            return Ok(Some(service));
        }
        self.seed_defaults().await?;
        self.find(id).await
    }

    /// Counts catalog entries (for diagnostics and the seed report).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM services")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{insert_service, test_db};

    fn new_service(name: &str, cents: i64) -> NewService {
        NewService {
            name: name.to_string(),
            price: Money::from_cents(cents),
            image: Some(" c4 fb station.png ".to_string()),
            description: Some("desc".to_string()),
            long_description: None,
        }
    }

    #[test]
    fn test_normalize_image_name() {
        assert_eq!(
            normalize_image_name(Some(" c4 fb station.png ")).as_deref(),
            Some("C4_FB_Station.png")
        );
        assert_eq!(
            normalize_image_name(Some("My Image.PNG")).as_deref(),
            Some("My_Image.PNG")
        );
        assert_eq!(normalize_image_name(Some("   ")), None);
        assert_eq!(normalize_image_name(None), None);
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let inserted = db.services().insert(&new_service("Telegram Station", 8999)).await.unwrap();

        let fetched = db.services().get(inserted.id).await.unwrap();
        assert_eq!(fetched.name, "Telegram Station");
        assert_eq!(fetched.price, Money::from_cents(8999));
        assert_eq!(fetched.image.as_deref(), Some("C4_FB_Station.png"));
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let db = test_db().await;
        let err = db.services().get(404).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let db = test_db().await;
        insert_service(&db, "Plan", 999).await;
        let err = db.services().insert(&new_service("Plan", 100)).await.unwrap_err();
        assert!(err.is_unique_violation_on("services.name"));
    }

    #[tokio::test]
    async fn test_negative_price_rejected() {
        let db = test_db().await;
        let err = db.services().insert(&new_service("Bad", -1)).await.unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }

    #[tokio::test]
    async fn test_upsert_corrects_existing() {
        let db = test_db().await;
        let original = insert_service(&db, "Plan", 999).await;

        let mut correction = new_service("Plan", 1299);
        correction.description = None;
        let updated = db.services().upsert_by_name(&correction).await.unwrap();

        assert_eq!(updated.id, original.id);
        assert_eq!(updated.price, Money::from_cents(1299));
        assert_eq!(updated.description.as_deref(), Some("test plan"));
        assert_eq!(db.services().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_empty_catalog_seeds_defaults() {
        let db = test_db().await;

        let services = db.services().list_or_seed().await.unwrap();
        assert_eq!(services.len(), DEFAULT_SERVICES.len());
        assert_eq!(services[0].name, "Auto Delete Comment - 1 Month Plan");
        assert_eq!(services[0].price, Money::from_cents(999));

        // Second call finds rows and writes nothing
        let again = db.services().list_or_seed().await.unwrap();
        assert_eq!(again.len(), DEFAULT_SERVICES.len());
    }

    #[tokio::test]
    async fn test_populated_catalog_is_not_seeded() {
        let db = test_db().await;
        insert_service(&db, "Custom", 100).await;

        let services = db.services().list_or_seed().await.unwrap();
        assert_eq!(services.len(), 1);
    }

    #[tokio::test]
    async fn test_find_or_seed() {
        let db = test_db().await;

        let first = db.services().find_or_seed(1).await.unwrap().unwrap();
        assert_eq!(first.name, "Auto Delete Comment - 1 Month Plan");

        assert!(db.services().find_or_seed(99).await.unwrap().is_none());
        assert_eq!(db.services().count().await.unwrap(), DEFAULT_SERVICES.len() as i64);
    }

    #[tokio::test]
    async fn test_seed_defaults_corrects_prices() {
        let db = test_db().await;
        insert_service(&db, "Telegram Station", 1).await;

        db.services().seed_defaults().await.unwrap();
        let services = db.services().list().await.unwrap();
        assert_eq!(services.len(), DEFAULT_SERVICES.len());
        assert_eq!(services[0].name, "Telegram Station");
        assert_eq!(services[0].price, Money::from_cents(8999));
    }

    #[tokio::test]
    async fn test_list_ordered_by_id() {
        let db = test_db().await;
        insert_service(&db, "B", 1).await;
        insert_service(&db, "A", 2).await;

        let names: Vec<_> = db.services().list().await.unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["B", "A"]);
    }
}
