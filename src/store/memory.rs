use std::sync::Mutex;

use async_trait::async_trait;

use crate::store::error::StoreError;
use crate::store::models::{AuthenticatedUser, LoginCredentials, LoyaltyTier, SystemSetting};
use crate::store::LoyaltyStore;

/// A logged activity row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityEntry {
    pub user_id: i64,
    pub activity_type: String,
    pub description: String,
    pub ip_address: String,
}

#[derive(Default)]
struct Inner {
    users: Vec<AuthenticatedUser>,
    credentials: Vec<LoginCredentials>,
    tiers: Vec<LoyaltyTier>,
    settings: Vec<SystemSetting>,
    activity: Vec<ActivityEntry>,
    logins: Vec<i64>,
    fail: bool,
    fail_settings: bool,
}

/// In-process store used by tests and local experiments.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, user: AuthenticatedUser) -> Self {
        self.lock_mut(|inner| inner.users.push(user));
        self
    }

    pub fn with_credentials(self, credentials: LoginCredentials) -> Self {
        self.lock_mut(|inner| inner.credentials.push(credentials));
        self
    }

    pub fn with_tier(self, tier: LoyaltyTier) -> Self {
        self.lock_mut(|inner| inner.tiers.push(tier));
        self
    }

    pub fn with_setting(self, key: &str, value: &str, category: &str) -> Self {
        self.lock_mut(|inner| {
            inner.settings.push(SystemSetting {
                key: key.to_string(),
                value: Some(value.to_string()),
                description: None,
                category: Some(category.to_string()),
                setting_type: Some("string".to_string()),
            })
        });
        self
    }

    /// Make every subsequent call fail, as an unreachable database would.
    pub fn failing(self) -> Self {
        self.lock_mut(|inner| inner.fail = true);
        self
    }

    /// Fail only the settings list reads.
    pub fn failing_settings(self) -> Self {
        self.lock_mut(|inner| inner.fail_settings = true);
        self
    }

    pub fn activity(&self) -> Vec<ActivityEntry> {
        self.lock().map(|inner| inner.activity.clone()).unwrap_or_default()
    }

    /// Users whose last login was recorded, in order.
    pub fn logins(&self) -> Vec<i64> {
        self.lock().map(|inner| inner.logins.clone()).unwrap_or_default()
    }

    fn settings_lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>, StoreError> {
        let inner = self.lock()?;
        if inner.fail_settings {
            return Err(StoreError::Internal("settings unavailable".into()));
        }
        Ok(inner)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>, StoreError> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| StoreError::Internal("lock poisoned".into()))?;
        if inner.fail {
            return Err(StoreError::Internal("store unavailable".into()));
        }
        Ok(inner)
    }

    fn lock_mut(&self, f: impl FnOnce(&mut Inner)) {
        if let Ok(mut inner) = self.inner.lock() {
            f(&mut inner);
        }
    }
}

#[async_trait]
impl LoyaltyStore for InMemoryStore {
    async fn user_by_id(&self, id: i64) -> Result<Option<AuthenticatedUser>, StoreError> {
        Ok(self.lock()?.users.iter().find(|u| u.id == id).cloned())
    }

    async fn login_credentials(&self, email: &str) -> Result<Option<LoginCredentials>, StoreError> {
        Ok(self.lock()?.credentials.iter().find(|c| c.email == email).cloned())
    }

    async fn record_login(&self, user_id: i64) -> Result<(), StoreError> {
        self.lock()?.logins.push(user_id);
        Ok(())
    }

    async fn user_count(&self) -> Result<i64, StoreError> {
        Ok(self.lock()?.users.len() as i64)
    }

    async fn active_tiers(&self) -> Result<Vec<LoyaltyTier>, StoreError> {
        let mut tiers: Vec<_> = self.lock()?.tiers.iter().filter(|t| t.is_active).cloned().collect();
        tiers.sort_by_key(|t| t.tier_level);
        Ok(tiers)
    }

    async fn system_settings(&self) -> Result<Vec<SystemSetting>, StoreError> {
        let mut settings = self.settings_lock()?.settings.clone();
        settings.sort_by(|a, b| (&a.category, &a.key).cmp(&(&b.category, &b.key)));
        Ok(settings)
    }

    async fn system_settings_by_category(&self, category: &str) -> Result<Vec<SystemSetting>, StoreError> {
        let mut settings: Vec<_> = self
            .settings_lock()?
            .settings
            .iter()
            .filter(|s| s.category.as_deref() == Some(category))
            .map(|s| SystemSetting {
                category: None,
                setting_type: None,
                ..s.clone()
            })
            .collect();
        settings.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(settings)
    }

    async fn system_setting(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .lock()?
            .settings
            .iter()
            .find(|s| s.key == key)
            .and_then(|s| s.value.clone())
            .filter(|v| !v.is_empty()))
    }

    async fn log_activity(
        &self,
        user_id: i64,
        activity_type: &str,
        description: &str,
        ip_address: &str,
    ) -> Result<(), StoreError> {
        self.lock()?.activity.push(ActivityEntry {
            user_id,
            activity_type: activity_type.to_string(),
            description: description.to_string(),
            ip_address: ip_address.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tier(id: i64, level: i64, active: bool) -> LoyaltyTier {
        LoyaltyTier {
            id,
            tier_name: format!("Tier {level}"),
            tier_level: level,
            min_spending: None,
            min_visits: None,
            min_points: None,
            points_multiplier: Some("1.00".into()),
            benefits: None,
            tier_color: None,
            tier_icon: None,
            is_active: active,
        }
    }

    #[tokio::test]
    async fn tiers_are_active_and_ordered() {
        let store = InMemoryStore::new()
            .with_tier(tier(1, 3, true))
            .with_tier(tier(2, 1, true))
            .with_tier(tier(3, 2, false));
        let tiers = store.active_tiers().await.unwrap();
        assert_eq!(tiers.iter().map(|t| t.id).collect::<Vec<_>>(), vec![2, 1]);
    }

    #[tokio::test]
    async fn settings_by_category_drop_category_columns() {
        let store = InMemoryStore::new()
            .with_setting("chat_enabled", "false", "chat")
            .with_setting("company_name", "Acme", "general");
        let chat = store.system_settings_by_category("chat").await.unwrap();
        assert_eq!(chat.len(), 1);
        assert_eq!(chat[0].key, "chat_enabled");
        assert!(chat[0].category.is_none());
    }

    #[tokio::test]
    async fn failing_store_errors() {
        let store = InMemoryStore::new().failing();
        assert!(store.user_count().await.is_err());
    }

    #[tokio::test]
    async fn failing_settings_leave_other_reads_alone() {
        let store = InMemoryStore::new()
            .with_setting("chat_enabled", "false", "chat")
            .failing_settings();
        assert!(store.system_settings().await.is_err());
        assert!(store.system_settings_by_category("chat").await.is_err());
        assert_eq!(store.system_setting("chat_enabled").await.unwrap().as_deref(), Some("false"));
        assert_eq!(store.user_count().await.unwrap(), 0);
    }
}
