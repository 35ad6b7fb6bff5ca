use {crate::domain::error::AuditError, std::env, std::time::Duration};

pub const DEFAULT_USER_ID_KEY: &str = "user._id";
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_millis(2000);
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

/// Knobs shared by every capture hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditSettings {
    /// Dotted path of the actor id inside the request credentials.
    pub user_id_key: String,
    /// How long a hook waits on the store before detaching the write.
    pub write_timeout: Duration,
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            user_id_key: DEFAULT_USER_ID_KEY.to_string(),
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }
}

impl AuditSettings {
    /// Read `AUDIT_*` variables from the process environment.
    pub fn from_env() -> Result<Self, AuditError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, AuditError> {
        let defaults = Self::default();

        let user_id_key = get("AUDIT_USER_ID_KEY")
            .filter(|k| !k.trim().is_empty())
            .unwrap_or(defaults.user_id_key);

        let write_timeout = match get("AUDIT_WRITE_TIMEOUT_MS") {
            Some(raw) => Duration::from_millis(parse_number("AUDIT_WRITE_TIMEOUT_MS", &raw)?),
            None => defaults.write_timeout,
        };

        Ok(Self {
            user_id_key,
            write_timeout,
        })
    }
}

/// Listener and request pipeline settings for the binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub bind_addr: String,
    /// Router-wide `DefaultBodyLimit`; audited routes buffer under the same limit.
    pub max_body_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ServerSettings {
    pub fn from_env() -> Result<Self, AuditError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, AuditError> {
        let defaults = Self::default();

        let bind_addr = get("BIND_ADDR")
            .filter(|a| !a.trim().is_empty())
            .unwrap_or(defaults.bind_addr);

        let max_body_bytes = match get("MAX_BODY_BYTES") {
            Some(raw) => parse_number("MAX_BODY_BYTES", &raw)?,
            None => defaults.max_body_bytes,
        };

        Ok(Self {
            bind_addr,
            max_body_bytes,
        })
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, AuditError> {
    raw.trim()
        .parse()
        .map_err(|_| AuditError::Config(format!("{key} must be a non-negative integer, got: {raw}")))
}
