//! Provider settings, the external store contract, and the cached resolver.
//!
//! Settings live in an external [`SettingsStore`] under [`SETTINGS_KEY`]. The core
//! never touches the filesystem itself; the CLI ships a JSON file store and tests
//! use [`MemoryStore`].
//!
//! [`ConfigResolver`] caches the resolved settings behind an `Arc`. Readers get a
//! value snapshot; a refresh swaps the whole `Arc` rather than mutating in place.

use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::provider_policy::{ProviderPolicy, API_KEY, BASE_URL};
use crate::{ProviderId, StoreError};

/// Store key holding the search settings document.
pub const SETTINGS_KEY: &str = "search";

/// Credentials for one provider. Empty strings mean "not set".
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCredentials {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub base_url: String,
}

impl ProviderCredentials {
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: String::new(),
        }
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            api_key: String::new(),
            base_url: base_url.into(),
        }
    }

    /// Looks up a credential field by its stored name.
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            API_KEY => Some(self.api_key.as_str()),
            BASE_URL => Some(self.base_url.as_str()),
            _ => None,
        }
    }

    /// True when every field the policy requires is present and non-blank.
    pub fn satisfies(&self, policy: &ProviderPolicy) -> bool {
        policy.required_fields.iter().all(|name| {
            self.field(name)
                .is_some_and(|value| !value.trim().is_empty())
        })
    }

    /// Fills blank fields from `existing` so partial updates never wipe a secret.
    pub fn merged_over(mut self, existing: &Self) -> Self {
        if self.api_key.is_empty() {
            self.api_key.clone_from(&existing.api_key);
        }
        if self.base_url.is_empty() {
            self.base_url.clone_from(&existing.base_url);
        }
        self
    }
}

impl Debug for ProviderCredentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Masks a secret for display, keeping only its last four characters.
pub fn redact(secret: &str) -> String {
    if secret.is_empty() {
        return String::new();
    }
    let chars = secret.chars().collect::<Vec<_>>();
    if chars.len() <= 4 {
        return String::from("****");
    }
    let tail = chars[chars.len() - 4..].iter().collect::<String>();
    format!("****{tail}")
}

/// Primary/fallback selection plus per-provider credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub primary: Option<ProviderId>,
    #[serde(default)]
    pub fallback: Option<ProviderId>,
    #[serde(default)]
    pub providers: BTreeMap<ProviderId, ProviderCredentials>,
}

impl Settings {
    pub fn credentials(&self, provider: ProviderId) -> Option<&ProviderCredentials> {
        self.providers.get(&provider)
    }

    pub fn with_credentials(
        mut self,
        provider: ProviderId,
        credentials: ProviderCredentials,
    ) -> Self {
        self.providers.insert(provider, credentials);
        self
    }

    pub fn with_primary(mut self, provider: ProviderId) -> Self {
        self.primary = Some(provider);
        self
    }

    pub fn with_fallback(mut self, provider: ProviderId) -> Self {
        self.fallback = Some(provider);
        self
    }

    /// Credential check against an explicit policy row.
    pub fn satisfies(&self, policy: &ProviderPolicy) -> bool {
        self.credentials(policy.provider_id)
            .is_some_and(|credentials| credentials.satisfies(policy))
    }

    /// Credential check against the provider's default policy.
    pub fn has_valid_credentials(&self, provider: ProviderId) -> bool {
        self.satisfies(&ProviderPolicy::default_for(provider))
    }

    /// Providers with valid credentials, in [`ProviderId::ALL`] order.
    pub fn configured_providers(&self) -> Vec<ProviderId> {
        ProviderId::ALL
            .into_iter()
            .filter(|provider| self.has_valid_credentials(*provider))
            .collect()
    }

    /// Picks primary (and fallback, if unset) when no primary is selected.
    fn auto_select(&mut self) {
        if self.primary.is_some() {
            return;
        }

        let mut configured = self.configured_providers().into_iter();
        self.primary = configured.next();
        if self.fallback.is_none() {
            self.fallback = configured.next();
        }
    }
}

/// External keyed store for settings documents.
pub trait SettingsStore: Send + Sync {
    fn exists(&self, key: &str) -> Result<bool, StoreError>;

    fn load(&self, key: &str) -> Result<Option<Value>, StoreError>;

    fn save(&self, key: &str, value: Value) -> Result<(), StoreError>;
}

/// In-process store backed by a map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a settings document.
    pub fn with_settings(settings: &Settings) -> Result<Self, StoreError> {
        let store = Self::new();
        store.save(SETTINGS_KEY, serde_json::to_value(settings)?)?;
        Ok(store)
    }
}

impl SettingsStore for MemoryStore {
    fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.contains_key(key))
    }

    fn load(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn save(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_owned(), value);
        Ok(())
    }
}

/// Loads, caches, and persists [`Settings`].
pub struct ConfigResolver {
    store: Arc<dyn SettingsStore>,
    cache: RwLock<Option<Arc<Settings>>>,
}

impl Debug for ConfigResolver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigResolver").finish_non_exhaustive()
    }
}

impl ConfigResolver {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self {
            store,
            cache: RwLock::new(None),
        }
    }

    /// Returns the cached settings, reading the store on a cache miss.
    ///
    /// Store failures never propagate: the resolver logs them and falls back to
    /// default settings, which still go through primary/fallback auto-selection.
    pub fn load(&self) -> Arc<Settings> {
        if let Some(cached) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Arc::clone(cached);
        }

        let mut settings = self.read_store().unwrap_or_else(|error| {
            warn!(error = %error, "failed to read settings, using defaults");
            Settings::default()
        });
        settings.auto_select();
        debug!(
            primary = ?settings.primary,
            fallback = ?settings.fallback,
            "resolved search settings"
        );

        let settings = Arc::new(settings);
        self.replace_cache(Some(Arc::clone(&settings)));
        settings
    }

    /// Drops the cached copy; the next [`load`](Self::load) re-reads the store.
    pub fn invalidate_cache(&self) {
        self.replace_cache(None);
    }

    /// Persists `incoming`, keeping stored credential fields the update leaves blank.
    pub fn save(&self, incoming: Settings) -> Result<Arc<Settings>, StoreError> {
        let existing = match self.read_store() {
            Ok(existing) => existing,
            Err(error) => {
                warn!(error = %error, "existing settings unreadable, saving without merge");
                Settings::default()
            }
        };

        let mut merged = incoming;
        for (provider, credentials) in &mut merged.providers {
            if let Some(previous) = existing.providers.get(provider) {
                *credentials = std::mem::take(credentials).merged_over(previous);
            }
        }
        for (provider, previous) in existing.providers {
            merged.providers.entry(provider).or_insert(previous);
        }

        self.store
            .save(SETTINGS_KEY, serde_json::to_value(&merged)?)?;
        debug!("persisted search settings");

        merged.auto_select();
        let merged = Arc::new(merged);
        self.replace_cache(Some(Arc::clone(&merged)));
        Ok(merged)
    }

    /// Settings exactly as stored, without auto-selection.
    pub fn stored(&self) -> Result<Settings, StoreError> {
        self.read_store()
    }

    fn read_store(&self) -> Result<Settings, StoreError> {
        if !self.store.exists(SETTINGS_KEY)? {
            return Ok(Settings::default());
        }
        match self.store.load(SETTINGS_KEY)? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(Settings::default()),
        }
    }

    fn replace_cache(&self, settings: Option<Arc<Settings>>) {
        *self.cache.write().unwrap_or_else(PoisonError::into_inner) = settings;
    }
}
