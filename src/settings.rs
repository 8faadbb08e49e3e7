use config::builder::{ConfigBuilder, DefaultState};
use config::{Config, ConfigError, Environment, File, Map};
use serde::Deserialize;

const CONFIG_FILE: &str = "kb_seeder";
const DEFAULT_DATABASE_ID: &str = "(default)";

/// Firebase / Firestore connection settings.
///
/// Read from an optional `kb_seeder.toml`, then overridden by
/// `FIREBASE_*` (api_key, access_token), `GCP_*` (project_id) and
/// `FIRESTORE_*` (emulator_host, database_id) environment variables.
/// Other web-config keys such as `FIREBASE_APP_ID` are ignored.
#[derive(Clone, Default, Deserialize)]
pub struct Settings {
    pub api_key: Option<String>,
    pub project_id: Option<String>,
    pub access_token: Option<String>,
    pub database_id: Option<String>,
    pub emulator_host: Option<String>,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let base = Config::builder().add_source(File::with_name(CONFIG_FILE).required(false));
        Self::from_sources(base, None)
    }

    /// `env` replaces the process environment when set.
    fn from_sources(
        base: ConfigBuilder<DefaultState>,
        env: Option<Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        base.add_source(Environment::with_prefix("FIREBASE").source(env.clone()))
            .add_source(Environment::with_prefix("GCP").source(env.clone()))
            .add_source(Environment::with_prefix("FIRESTORE").source(env))
            .build()?
            .try_deserialize()
    }

    pub fn database_id(&self) -> &str {
        self.database_id
            .as_deref()
            .filter(|d| !d.is_empty())
            .unwrap_or(DEFAULT_DATABASE_ID)
    }
}

// Credentials stay out of logs.
impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("project_id", &self.project_id)
            .field("database_id", &self.database_id())
            .field("emulator_host", &self.emulator_host)
            .field("api_key", &self.api_key.as_ref().map(|_| "<set>"))
            .field("access_token", &self.access_token.as_ref().map(|_| "<set>"))
            .finish()
    }
}
