//! User preferences and application settings
//!
//! Two small fixed-key stores built on the same typed JSON layer as named
//! collections. Every field carries a serde default, so documents written
//! by older versions load with the gaps filled in rather than failing.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::store::JsonStore;

/// Storage key for user preferences
pub const PREFERENCES_KEY: &str = "settings.preferences";

/// Storage key for application settings
pub const APP_SETTINGS_KEY: &str = "settings.app";

/// Color scheme preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Dark,
    Light,
}

/// Per-user behavior toggles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    /// Color scheme
    #[serde(default = "default_theme")]
    pub theme: Theme,

    /// Persist edit sessions automatically
    #[serde(default = "default_true")]
    pub auto_save: bool,

    /// Vibrate on destructive actions
    #[serde(default = "default_true")]
    pub haptic_feedback: bool,

    /// Show completion notifications
    #[serde(default = "default_true")]
    pub notifications: bool,
}

fn default_theme() -> Theme {
    Theme::Dark
}

fn default_true() -> bool {
    true
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            auto_save: true,
            haptic_feedback: true,
            notifications: true,
        }
    }
}

/// Application-level bookkeeping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    /// Settings document version
    #[serde(default = "default_version")]
    pub version: String,

    /// When the application last started (epoch milliseconds)
    #[serde(default = "default_last_opened")]
    pub last_opened: i64,

    /// Whether the first-run experience is still owed
    #[serde(default = "default_true")]
    pub first_time_user: bool,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

fn default_last_opened() -> i64 {
    Utc::now().timestamp_millis()
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            version: default_version(),
            last_opened: default_last_opened(),
            first_time_user: true,
        }
    }
}

/// Store for [`UserPreferences`] under a fixed key
#[derive(Debug, Clone)]
pub struct PreferencesStore {
    store: JsonStore,
}

impl PreferencesStore {
    pub fn new(store: JsonStore) -> Self {
        Self { store }
    }

    /// Load preferences, falling back to the defaults when never saved
    ///
    /// # Errors
    ///
    /// Returns `MixtapeError::CorruptData` if a stored value exists but
    /// does not parse.
    pub async fn load(&self) -> Result<UserPreferences> {
        Ok(self
            .store
            .get_json(PREFERENCES_KEY)
            .await?
            .unwrap_or_default())
    }

    /// Overwrite stored preferences
    pub async fn save(&self, preferences: &UserPreferences) -> Result<()> {
        self.store.set_json(PREFERENCES_KEY, preferences).await
    }

    /// Read-modify-write update
    ///
    /// # Returns
    ///
    /// The preferences after the change was applied and saved.
    pub async fn update<F>(&self, apply: F) -> Result<UserPreferences>
    where
        F: FnOnce(&mut UserPreferences),
    {
        let mut preferences = self.load().await?;
        apply(&mut preferences);
        self.save(&preferences).await?;
        Ok(preferences)
    }

    /// Restore the documented defaults
    pub async fn reset(&self) -> Result<()> {
        self.save(&UserPreferences::default()).await
    }
}

/// Store for [`AppSettings`] under a fixed key
#[derive(Debug, Clone)]
pub struct AppSettingsStore {
    store: JsonStore,
}

impl AppSettingsStore {
    pub fn new(store: JsonStore) -> Self {
        Self { store }
    }

    /// Load settings, falling back to the defaults when never saved
    pub async fn load(&self) -> Result<AppSettings> {
        Ok(self
            .store
            .get_json(APP_SETTINGS_KEY)
            .await?
            .unwrap_or_default())
    }

    /// Overwrite stored settings
    pub async fn save(&self, settings: &AppSettings) -> Result<()> {
        self.store.set_json(APP_SETTINGS_KEY, settings).await
    }

    /// Record that the application was opened now
    pub async fn touch_last_opened(&self) -> Result<AppSettings> {
        let mut settings = self.load().await?;
        settings.last_opened = Utc::now().timestamp_millis();
        self.save(&settings).await?;
        Ok(settings)
    }

    /// Mark the first-run experience as done
    pub async fn mark_first_run_complete(&self) -> Result<()> {
        let mut settings = self.load().await?;
        settings.first_time_user = false;
        self.save(&settings).await
    }

    /// Whether the first-run experience is still owed
    pub async fn is_first_run(&self) -> Result<bool> {
        Ok(self.load().await?.first_time_user)
    }
}
