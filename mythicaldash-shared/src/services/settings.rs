/// Settings access gate
///
/// Updating a setting goes through five steps, in this order:
///
/// 1. Validate the form (`key` and `value` present and non-blank)
/// 2. Check the caller holds [`Capability::ManageSettings`]
/// 3. Upsert the pair
/// 4. Notify every registered [`SettingsObserver`]
/// 5. Write an audit entry (failures are logged, not returned)
///
/// Validation comes before authorization, so a malformed request is reported
/// as such whatever the caller's role. A failed upsert stops the pipeline:
/// observers are not called and nothing is audited.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use validator::Validate;

use crate::auth::authorization::{require_capability, AuthzError, Capability};
use crate::error::StoreError;
use crate::models::activity::{self, ActivityStore, NewActivity};
use crate::models::setting::SettingsStore;
use crate::models::user::User;

/// Error type for settings operations
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Unauthorized(#[from] AuthzError),

    #[error("Settings store unavailable: {0}")]
    Unavailable(#[from] StoreError),
}

/// Validated settings form
#[derive(Debug, Clone, Validate)]
pub struct SettingUpdate {
    #[validate(length(min = 1, max = 255, message = "Key must be 1-255 characters"))]
    pub key: String,

    #[validate(length(min = 1, message = "Value must not be empty"))]
    pub value: String,
}

impl SettingUpdate {
    /// Builds an update from raw form fields; blanks count as missing
    pub fn from_form(key: Option<&str>, value: Option<&str>) -> Result<Self, SettingsError> {
        let update = Self {
            key: key.unwrap_or_default().trim().to_string(),
            value: value.unwrap_or_default().trim().to_string(),
        };

        update
            .validate()
            .map_err(|e| SettingsError::InvalidRequest(e.to_string()))?;

        Ok(update)
    }
}

/// Event passed to observers after a setting was persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingsUpdated {
    pub key: String,
    pub value: String,
}

/// Receives committed setting changes
pub trait SettingsObserver: Send + Sync {
    fn on_settings_updated(&self, event: &SettingsUpdated);
}

/// Observer that writes every change to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl SettingsObserver for LoggingObserver {
    fn on_settings_updated(&self, event: &SettingsUpdated) {
        tracing::info!(key = %event.key, "Setting updated");
    }
}

/// Settings operations with their collaborators
#[derive(Clone)]
pub struct SettingsService {
    settings: Arc<dyn SettingsStore>,
    activity: Arc<dyn ActivityStore>,
    observers: Vec<Arc<dyn SettingsObserver>>,
}

impl SettingsService {
    pub fn new(settings: Arc<dyn SettingsStore>, activity: Arc<dyn ActivityStore>) -> Self {
        Self {
            settings,
            activity,
            observers: Vec::new(),
        }
    }

    /// Registers an observer, notified in registration order
    pub fn with_observer(mut self, observer: Arc<dyn SettingsObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Validates, authorizes and applies a settings change
    pub async fn update(
        &self,
        actor: &User,
        ip: &str,
        key: Option<&str>,
        value: Option<&str>,
    ) -> Result<SettingsUpdated, SettingsError> {
        let update = SettingUpdate::from_form(key, value)?;
        require_capability(actor, Capability::ManageSettings)?;

        if let Err(e) = self.settings.set(&update.key, &update.value).await {
            tracing::error!(key = %update.key, error = %e, "Failed to persist setting");
            return Err(SettingsError::Unavailable(e));
        }

        let event = SettingsUpdated {
            key: update.key,
            value: update.value,
        };

        for observer in &self.observers {
            observer.on_settings_updated(&event);
        }

        let audit = NewActivity {
            user_uuid: actor.uuid,
            action: activity::SETTINGS_UPDATE.to_string(),
            ip: ip.to_string(),
            context: format!("Updated setting {}", event.key),
        };
        if let Err(e) = self.activity.record(audit).await {
            tracing::warn!(key = %event.key, error = %e, "Failed to record settings audit entry");
        }

        Ok(event)
    }

    /// Returns every setting to an admin
    pub async fn all(&self, actor: &User) -> Result<BTreeMap<String, String>, SettingsError> {
        require_capability(actor, Capability::AdminUiAccess)?;
        Ok(self.settings.all().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::authorization::Role;
    use crate::db::memory::MemoryStore;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<SettingsUpdated>>);

    impl SettingsObserver for Recorder {
        fn on_settings_updated(&self, event: &SettingsUpdated) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    fn service(store: &Arc<MemoryStore>, recorder: &Arc<Recorder>) -> SettingsService {
        SettingsService::new(store.clone(), store.clone())
            .with_observer(Arc::new(LoggingObserver))
            .with_observer(recorder.clone())
    }

    #[tokio::test]
    async fn test_admin_update_is_persisted_notified_and_audited() {
        let store = Arc::new(MemoryStore::new());
        let recorder = Arc::new(Recorder::default());
        let admin = User::new("root", Role::Owner);

        let event = service(&store, &recorder)
            .update(&admin, "198.51.100.4", Some("app_name"), Some("My Dash"))
            .await
            .unwrap();

        assert_eq!(event.key, "app_name");
        assert_eq!(store.get("app_name").await.unwrap().as_deref(), Some("My Dash"));
        assert_eq!(recorder.0.lock().unwrap().as_slice(), &[event]);

        let audit = store.recent_for_user(admin.uuid, 10).await.unwrap();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].action, "settings_update");
        assert_eq!(audit[0].ip, "198.51.100.4");
        assert_eq!(audit[0].context, "Updated setting app_name");
    }

    #[tokio::test]
    async fn test_blank_fields_are_invalid_for_every_role() {
        let store = Arc::new(MemoryStore::new());
        let recorder = Arc::new(Recorder::default());
        let svc = service(&store, &recorder);

        for role in [Role::Default, Role::Support, Role::Owner] {
            let user = User::new("someone", role);
            for (key, value) in [(None, Some("v")), (Some("k"), None), (Some("  "), Some("v")), (Some("k"), Some(""))] {
                let err = svc.update(&user, "0.0.0.0", key, value).await.unwrap_err();
                assert!(matches!(err, SettingsError::InvalidRequest(_)), "{role:?} {key:?} {value:?}");
            }
        }
        assert!(store.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_admin_is_rejected_without_mutation() {
        let store = Arc::new(MemoryStore::new());
        let recorder = Arc::new(Recorder::default());
        let svc = service(&store, &recorder);

        for role in [Role::Default, Role::Vip, Role::SupportLvl4] {
            let user = User::new("member", role);
            let err = svc.update(&user, "0.0.0.0", Some("k"), Some("v")).await.unwrap_err();
            assert!(matches!(err, SettingsError::Unauthorized(_)));
            assert!(matches!(svc.all(&user).await, Err(SettingsError::Unauthorized(_))));
        }

        assert!(store.all().await.unwrap().is_empty());
        assert!(recorder.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_persist_failure_skips_observers_and_audit() {
        let store = Arc::new(MemoryStore::new());
        let recorder = Arc::new(Recorder::default());
        let admin = User::new("root", Role::Admin);

        store.fail_writes(true);
        let err = service(&store, &recorder)
            .update(&admin, "0.0.0.0", Some("k"), Some("v"))
            .await
            .unwrap_err();
        store.fail_writes(false);

        assert!(matches!(err, SettingsError::Unavailable(_)));
        assert!(recorder.0.lock().unwrap().is_empty());
        assert!(store.recent_for_user(admin.uuid, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_visible_in_following_get() {
        let store = Arc::new(MemoryStore::new());
        let recorder = Arc::new(Recorder::default());
        let svc = service(&store, &recorder);
        let admin = User::new("root", Role::Administrator);

        svc.update(&admin, "0.0.0.0", Some("leaderboard_limit"), Some(" 25 "))
            .await
            .unwrap();

        let all = svc.all(&admin).await.unwrap();
        assert_eq!(all.get("leaderboard_limit").map(String::as_str), Some("25"));
    }
}
