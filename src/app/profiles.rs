//! Credential profiles for the AWS CLI.
//!
//! The dashboard runs against either the host's own credentials (`system`)
//! or a custom access key pair entered in the UI. Custom profiles are kept in
//! a small JSON store next to the server so they survive restarts.
//!
//! # Security
//!
//! Secrets are only ever handed to the CLI through its environment. They are
//! never logged, never returned over HTTP ([`PublicProfile`] is the redacted
//! view), and the store file is created owner read/write only.

use crate::app::resource_explorer::cli_executor::{cli_args, AwsCliExecutor, CliEnvironment};
use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Id of the host credentials pseudo-profile
pub const SYSTEM_PROFILE_ID: &str = "system";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileSource {
    System,
    #[default]
    Custom,
}

/// A stored credential profile.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub access_key_id: String,
    #[serde(default)]
    pub secret_access_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default)]
    pub source: ProfileSource,
}

impl fmt::Debug for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Profile")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("region", &self.region)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl Profile {
    fn public(&self) -> PublicProfile {
        PublicProfile {
            id: self.id.clone(),
            name: self.name.clone(),
            source: self.source,
        }
    }
}

/// Redacted profile sent to the browser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicProfile {
    pub id: String,
    pub name: String,
    pub source: ProfileSource,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStatus {
    pub system_available: bool,
    /// Empty when nothing is selected and no system credentials exist
    pub active_id: String,
    pub profiles: Vec<PublicProfile>,
}

/// Body of `POST /api/profiles`
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewProfile {
    pub name: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub region: String,
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile name is required")]
    NameRequired,

    #[error("access key id and secret access key are required")]
    KeysRequired,

    #[error("unable to validate credentials with AWS (sts get-caller-identity failed)")]
    ValidationFailed,

    #[error("system AWS credentials are not available")]
    SystemUnavailable,

    #[error("profile \"{0}\" not found")]
    NotFound(String),
}

/// Checks whether a set of credentials can talk to AWS.
#[async_trait]
pub trait CredentialValidator: Send + Sync {
    /// `None` checks the host's own credentials; `Some` overlays the given
    /// variables on the process environment.
    async fn validate(&self, env: Option<&[(String, String)]>) -> bool;
}

/// Validates credentials with `aws sts get-caller-identity`.
pub struct StsCredentialValidator {
    executor: AwsCliExecutor,
}

impl StsCredentialValidator {
    pub fn new(executor: AwsCliExecutor) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl CredentialValidator for StsCredentialValidator {
    async fn validate(&self, env: Option<&[(String, String)]>) -> bool {
        let args = cli_args(&["sts", "get-caller-identity"]);
        let cancel = CancellationToken::new();

        match self
            .executor
            .run_json_with_env(&args, env.unwrap_or_default(), &cancel)
            .await
        {
            // Guard against a CLI that exits 0 with something other than JSON
            Ok(out) => serde_json::from_slice::<serde_json::Value>(&out).is_ok(),
            Err(e) => {
                // Only the classification; the message can echo key ids
                debug!("Credential validation failed ({})", e.short_label());
                false
            }
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileStore {
    #[serde(default)]
    next_id: u64,
    #[serde(default)]
    active_id: String,
    #[serde(default)]
    profiles: Vec<Profile>,
}

struct ProfileState {
    profiles: HashMap<String, Profile>,
    active_id: Option<String>,
    next_id: u64,
}

/// Tracks custom profiles and which credentials the CLI should use.
pub struct ProfileManager {
    state: RwLock<ProfileState>,
    system_available: bool,
    store_path: Option<PathBuf>,
    validator: Arc<dyn CredentialValidator>,
}

impl ProfileManager {
    /// Probe the host credentials, then restore any saved profiles.
    pub async fn initialize(
        store_path: Option<PathBuf>,
        validator: Arc<dyn CredentialValidator>,
    ) -> Self {
        let system_available = validator.validate(None).await;
        if system_available {
            info!("System AWS credentials available");
        } else {
            info!("No usable system AWS credentials; a custom profile is required");
        }

        let manager = Self {
            state: RwLock::new(ProfileState {
                profiles: HashMap::new(),
                active_id: system_available.then(|| SYSTEM_PROFILE_ID.to_string()),
                next_id: 1,
            }),
            system_available,
            store_path,
            validator,
        };

        if let Some(path) = &manager.store_path {
            if let Err(e) = manager.load(path) {
                warn!("Failed to load profile store {}: {:#}", path.display(), e);
            }
        }

        manager
    }

    pub fn system_available(&self) -> bool {
        self.system_available
    }

    pub fn status(&self) -> ProfileStatus {
        let state = self.read();

        let mut profiles: Vec<&Profile> = state.profiles.values().collect();
        profiles.sort_by_key(|p| (p.id.parse::<u64>().unwrap_or(u64::MAX), p.id.clone()));

        ProfileStatus {
            system_available: self.system_available,
            active_id: self.resolve_active(&state).unwrap_or_default(),
            profiles: profiles.into_iter().map(Profile::public).collect(),
        }
    }

    /// `system` when nothing is selected but host credentials exist
    pub fn active_id(&self) -> Option<String> {
        self.resolve_active(&self.read())
    }

    fn resolve_active(&self, state: &ProfileState) -> Option<String> {
        match &state.active_id {
            Some(id) => Some(id.clone()),
            None if self.system_available => Some(SYSTEM_PROFILE_ID.to_string()),
            None => None,
        }
    }

    /// Validate new credentials, store them as a profile and make it active.
    pub async fn add_and_activate(&self, new: NewProfile) -> Result<PublicProfile, ProfileError> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(ProfileError::NameRequired);
        }
        if new.access_key_id.is_empty() || new.secret_access_key.is_empty() {
            return Err(ProfileError::KeysRequired);
        }

        let session_token = non_empty(&new.session_token);
        let region = non_empty(&new.region);
        let env = credential_env(
            &new.access_key_id,
            &new.secret_access_key,
            session_token.as_deref(),
            region.as_deref(),
        );

        if !self.validator.validate(Some(&env)).await {
            return Err(ProfileError::ValidationFailed);
        }

        let mut state = self.write();
        let id = state.next_id.to_string();
        state.next_id += 1;

        let profile = Profile {
            id: id.clone(),
            name: name.to_string(),
            access_key_id: new.access_key_id,
            secret_access_key: new.secret_access_key,
            session_token,
            region,
            source: ProfileSource::Custom,
        };
        let public = profile.public();

        state.profiles.insert(id.clone(), profile);
        state.active_id = Some(id.clone());
        self.persist(&state);

        info!("Added and activated profile '{}' ({})", public.name, id);
        Ok(public)
    }

    /// Switch the active profile. Selecting `system` is not persisted.
    pub fn set_active(&self, id: &str) -> Result<(), ProfileError> {
        let mut state = self.write();

        if id == SYSTEM_PROFILE_ID {
            if !self.system_available {
                return Err(ProfileError::SystemUnavailable);
            }
            state.active_id = Some(SYSTEM_PROFILE_ID.to_string());
            info!("Active profile set to system credentials");
            return Ok(());
        }

        if !state.profiles.contains_key(id) {
            return Err(ProfileError::NotFound(id.to_string()));
        }
        state.active_id = Some(id.to_string());
        self.persist(&state);
        trace_info!("Active profile set to {}", id);
        Ok(())
    }

    fn load(&self, path: &Path) -> anyhow::Result<()> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", path.display()));
            }
        };

        let store: ProfileStore = serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;

        let mut state = self.write();
        if store.next_id > 0 {
            state.next_id = store.next_id;
        }

        state.profiles = store
            .profiles
            .into_iter()
            // Entries without keys cannot be used
            .filter(|p| !p.access_key_id.is_empty() && !p.secret_access_key.is_empty())
            .map(|p| (p.id.clone(), p))
            .collect();

        if !store.active_id.is_empty() {
            let known = store.active_id == SYSTEM_PROFILE_ID
                || state.profiles.contains_key(&store.active_id);
            if known {
                state.active_id = Some(store.active_id);
            } else {
                warn!("Saved active profile {} no longer exists", store.active_id);
            }
        }

        info!(
            "Loaded {} profiles from {}",
            state.profiles.len(),
            path.display()
        );
        Ok(())
    }

    /// Best-effort write of the store; failures are logged, not returned.
    fn persist(&self, state: &ProfileState) {
        let Some(path) = &self.store_path else {
            return;
        };
        if let Err(e) = write_store(path, state) {
            warn!("Failed to save profile store {}: {:#}", path.display(), e);
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, ProfileState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, ProfileState> {
        self.state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CliEnvironment for ProfileManager {
    fn active_env(&self) -> Vec<(String, String)> {
        let state = self.read();
        let Some(profile) = state
            .active_id
            .as_ref()
            .filter(|id| id.as_str() != SYSTEM_PROFILE_ID)
            .and_then(|id| state.profiles.get(id))
        else {
            return Vec::new();
        };

        credential_env(
            &profile.access_key_id,
            &profile.secret_access_key,
            profile.session_token.as_deref(),
            profile.region.as_deref(),
        )
    }

    fn active_profile(&self) -> Option<String> {
        self.active_id()
    }
}

/// Environment handed to the CLI for explicit credentials. Instance
/// metadata lookups are disabled since they only add latency here.
pub fn credential_env(
    access_key_id: &str,
    secret_access_key: &str,
    session_token: Option<&str>,
    region: Option<&str>,
) -> Vec<(String, String)> {
    let mut env = vec![
        ("AWS_ACCESS_KEY_ID".to_string(), access_key_id.to_string()),
        ("AWS_SECRET_ACCESS_KEY".to_string(), secret_access_key.to_string()),
    ];
    if let Some(token) = session_token.filter(|t| !t.is_empty()) {
        env.push(("AWS_SESSION_TOKEN".to_string(), token.to_string()));
    }
    if let Some(region) = region.filter(|r| !r.is_empty()) {
        env.push(("AWS_DEFAULT_REGION".to_string(), region.to_string()));
    }
    env.push(("AWS_EC2_METADATA_DISABLED".to_string(), "true".to_string()));
    env
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn write_store(path: &Path, state: &ProfileState) -> anyhow::Result<()> {
    let mut profiles: Vec<Profile> = state.profiles.values().cloned().collect();
    profiles.sort_by(|a, b| a.id.cmp(&b.id));

    let store = ProfileStore {
        next_id: state.next_id,
        active_id: state.active_id.clone().unwrap_or_default(),
        profiles,
    };
    let json = serde_json::to_string_pretty(&store)?;

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options
        .open(path)
        .with_context(|| format!("opening {}", path.display()))?;

    // mode() only applies on creation; tighten a pre-existing file too
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .with_context(|| format!("restricting permissions on {}", path.display()))?;
    }

    use std::io::Write;
    file.write_all(json.as_bytes())
        .with_context(|| format!("writing {}", path.display()))?;
    debug!("Profile store saved to {}", path.display());
    Ok(())
}
