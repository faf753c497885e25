//! Loyalty database access.
//!
//! Route handlers and context providers read customer, tier and settings
//! data through [`LoyaltyStore`]. Postgres is the production backing; the
//! in-memory store backs tests.

pub mod error;
pub mod memory;
pub mod models;
pub mod postgres;

use async_trait::async_trait;

pub use error::StoreError;
pub use memory::InMemoryStore;
pub use models::{AuthenticatedUser, LoginCredentials, LoyaltyTier, SettingType, SystemSetting};
pub use postgres::PostgresStore;

#[async_trait]
pub trait LoyaltyStore: Send + Sync + 'static {
    /// Active user with role and customer loyalty columns.
    async fn user_by_id(&self, id: i64) -> Result<Option<AuthenticatedUser>, StoreError>;

    /// Any user with this email, active or not.
    async fn login_credentials(&self, email: &str) -> Result<Option<LoginCredentials>, StoreError>;

    async fn record_login(&self, user_id: i64) -> Result<(), StoreError>;

    async fn user_count(&self) -> Result<i64, StoreError>;

    /// Active tiers, lowest level first.
    async fn active_tiers(&self) -> Result<Vec<LoyaltyTier>, StoreError>;

    /// Every active setting, ordered by category then key.
    async fn system_settings(&self) -> Result<Vec<SystemSetting>, StoreError>;

    async fn system_settings_by_category(&self, category: &str) -> Result<Vec<SystemSetting>, StoreError>;

    async fn system_setting(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn log_activity(
        &self,
        user_id: i64,
        activity_type: &str,
        description: &str,
        ip_address: &str,
    ) -> Result<(), StoreError>;
}
