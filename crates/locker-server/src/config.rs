//! Server configuration loaded from environment variables.
//!
//! All settings have defaults so the server can start with zero
//! configuration for local development: without `MONGO_URI` it runs on the
//! in-memory store, and without relay credentials every OTP delivery fails.

use std::fmt;
use std::net::SocketAddr;

/// Account used to authenticate against the mail relay.
#[derive(Clone)]
pub struct MailCredentials {
    pub user: String,
    pub password: String,
}

impl fmt::Debug for MailCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailCredentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP API.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// MongoDB connection string.
    /// Env: `MONGO_URI`
    /// Default: unset (in-memory store).
    pub mongo_uri: Option<String>,

    /// Logical database holding every collection.
    /// Env: `MONGO_DB`
    /// Default: `HealthLocker`
    pub mongo_db: String,

    /// Relay account.
    /// Env: `EMAIL_USER`, `EMAIL_PASS`
    /// Default: unset (delivery disabled).
    pub mail: Option<MailCredentials>,

    /// Relay host, reached with STARTTLS.
    /// Env: `SMTP_HOST`
    /// Default: `smtp.gmail.com`
    pub smtp_host: String,

    /// Env: `SMTP_PORT`
    /// Default: `587`
    pub smtp_port: u16,

    /// Product name shown in the OTP email subject.
    /// Env: `APP_NAME`
    /// Default: `HealthLocker`
    pub app_name: String,

    /// Largest accepted request body in bytes.  Records carry base64 images.
    /// Env: `MAX_BODY_BYTES`
    /// Default: 16 MiB
    pub max_body_bytes: usize,
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("http_addr", &self.http_addr)
            .field("mongo_uri", &self.mongo_uri.as_ref().map(|_| "<set>"))
            .field("mongo_db", &self.mongo_db)
            .field("mail", &self.mail)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("app_name", &self.app_name)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], 8080).into(),
            mongo_uri: None,
            mongo_db: "HealthLocker".to_string(),
            mail: None,
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            app_name: "HealthLocker".to_string(),
            max_body_bytes: 16 * 1024 * 1024, // 16 MiB
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = get("HTTP_ADDR") {
            match addr.parse::<SocketAddr>() {
                Ok(parsed) => config.http_addr = parsed,
                Err(_) => tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default"),
            }
        }

        config.mongo_uri = get("MONGO_URI").filter(|uri| !uri.is_empty());

        if let Some(db) = get("MONGO_DB").filter(|db| !db.is_empty()) {
            config.mongo_db = db;
        }

        config.mail = match (get("EMAIL_USER"), get("EMAIL_PASS")) {
            (Some(user), Some(password)) if !user.is_empty() && !password.is_empty() => {
                Some(MailCredentials { user, password })
            }
            _ => None,
        };

        if let Some(host) = get("SMTP_HOST").filter(|h| !h.is_empty()) {
            config.smtp_host = host;
        }

        if let Some(port) = get("SMTP_PORT") {
            match port.parse::<u16>() {
                Ok(p) => config.smtp_port = p,
                Err(_) => tracing::warn!(value = %port, "Invalid SMTP_PORT, using default"),
            }
        }

        if let Some(name) = get("APP_NAME").filter(|n| !n.is_empty()) {
            config.app_name = name;
        }

        if let Some(val) = get("MAX_BODY_BYTES") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.max_body_bytes = n,
                _ => tracing::warn!(value = %val, "Invalid MAX_BODY_BYTES, using default"),
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::from_lookup(lookup(&[]));
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 8080).into());
        assert!(config.mongo_uri.is_none());
        assert!(config.mail.is_none());
        assert_eq!(config.smtp_port, 587);
        assert_eq!(config.mongo_db, "HealthLocker");
    }

    #[test]
    fn test_reads_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("HTTP_ADDR", "127.0.0.1:9000"),
            ("MONGO_URI", "mongodb://localhost:27017"),
            ("MONGO_DB", "InOfficeMessaging"),
            ("EMAIL_USER", "bot@example.com"),
            ("EMAIL_PASS", "secret"),
            ("SMTP_PORT", "2525"),
        ]));
        assert_eq!(config.http_addr, ([127, 0, 0, 1], 9000).into());
        assert_eq!(config.mongo_uri.as_deref(), Some("mongodb://localhost:27017"));
        assert_eq!(config.mongo_db, "InOfficeMessaging");
        assert_eq!(config.mail.as_ref().unwrap().user, "bot@example.com");
        assert_eq!(config.smtp_port, 2525);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("HTTP_ADDR", "not-an-addr"),
            ("SMTP_PORT", "99999"),
            ("EMAIL_USER", "bot@example.com"),
        ]));
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 8080).into());
        assert_eq!(config.smtp_port, 587);
        // A user without a password is not a usable account.
        assert!(config.mail.is_none());
    }

    #[test]
    fn test_debug_redacts_password() {
        let creds = MailCredentials {
            user: "bot@example.com".into(),
            password: "hunter2".into(),
        };
        assert!(!format!("{creds:?}").contains("hunter2"));
    }
}
