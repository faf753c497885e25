use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::DatabaseConfig;
use crate::store::error::StoreError;
use crate::store::models::{AuthenticatedUser, LoginCredentials, LoyaltyTier, SystemSetting};
use crate::store::LoyaltyStore;

// Numeric and date columns are cast to text so they serialize exactly as
// the database prints them.
const USER_BY_ID: &str = r#"
SELECT u.id::int8 AS id, u.email, u.first_name, u.last_name,
       COALESCE(r.name, 'customer') AS role, u.phone,
       c.points::int8 AS points, c.total_spent::text AS total_spent,
       c.visit_count::int8 AS visit_count, c.customer_tier AS tier,
       c.member_status, c.enrollment_date::text AS enrollment_date
FROM users u
LEFT JOIN roles r ON u.role_id = r.id
LEFT JOIN customers c ON u.id = c.user_id
WHERE u.id = $1 AND u.is_active = true
"#;

const LOGIN_CREDENTIALS: &str = r#"
SELECT u.id::int8 AS id, u.email, u.password_hash, u.is_active, r.name AS role
FROM users u
LEFT JOIN roles r ON u.role_id = r.id
WHERE u.email = $1
"#;

const ACTIVE_TIERS: &str = r#"
SELECT id::int8 AS id, tier_name, tier_level::int8 AS tier_level,
       min_spending::text AS min_spending, min_visits::int8 AS min_visits,
       min_points::int8 AS min_points, points_multiplier::text AS points_multiplier,
       to_jsonb(benefits) AS benefits, tier_color, tier_icon, is_active
FROM loyalty_tiers
WHERE is_active = true
ORDER BY tier_level ASC
"#;

const ALL_SETTINGS: &str = r#"
SELECT setting_key AS key, setting_value AS value, description, category, setting_type
FROM system_settings
WHERE is_active = true
ORDER BY category, setting_key
"#;

const SETTINGS_BY_CATEGORY: &str = r#"
SELECT setting_key AS key, setting_value AS value, description,
       NULL::text AS category, NULL::text AS setting_type
FROM system_settings
WHERE category = $1 AND is_active = true
ORDER BY setting_key
"#;

/// Store backed by the loyalty PostgreSQL database.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Build the pool. Connections are opened lazily on first query.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(10))
            .connect_lazy(&config.url)?;
        Ok(Self { pool })
    }

    /// Round-trip a trivial query.
    pub async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl LoyaltyStore for PostgresStore {
    async fn user_by_id(&self, id: i64) -> Result<Option<AuthenticatedUser>, StoreError> {
        let user = sqlx::query_as::<_, AuthenticatedUser>(USER_BY_ID)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn login_credentials(&self, email: &str) -> Result<Option<LoginCredentials>, StoreError> {
        let credentials = sqlx::query_as::<_, LoginCredentials>(LOGIN_CREDENTIALS)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(credentials)
    }

    async fn record_login(&self, user_id: i64) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn user_count(&self) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn active_tiers(&self) -> Result<Vec<LoyaltyTier>, StoreError> {
        let tiers = sqlx::query_as::<_, LoyaltyTier>(ACTIVE_TIERS)
            .fetch_all(&self.pool)
            .await?;
        Ok(tiers)
    }

    async fn system_settings(&self) -> Result<Vec<SystemSetting>, StoreError> {
        let settings = sqlx::query_as::<_, SystemSetting>(ALL_SETTINGS)
            .fetch_all(&self.pool)
            .await?;
        Ok(settings)
    }

    async fn system_settings_by_category(&self, category: &str) -> Result<Vec<SystemSetting>, StoreError> {
        let settings = sqlx::query_as::<_, SystemSetting>(SETTINGS_BY_CATEGORY)
            .bind(category)
            .fetch_all(&self.pool)
            .await?;
        Ok(settings)
    }

    async fn system_setting(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value: Option<String> = sqlx::query_scalar("SELECT get_system_setting($1) AS value")
            .bind(key)
            .fetch_one(&self.pool)
            .await?;
        Ok(value.filter(|v| !v.is_empty()))
    }

    async fn log_activity(
        &self,
        user_id: i64,
        activity_type: &str,
        description: &str,
        ip_address: &str,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO user_activity_log (user_id, activity_type, description, ip_address) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(user_id)
        .bind(activity_type)
        .bind(description)
        .bind(ip_address)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
