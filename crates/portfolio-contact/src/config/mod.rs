use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub storage: StorageConfig,
    pub mail: MailSettings,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let contacts_path = non_empty_var("CONTACTS_PATH").map(PathBuf::from);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            storage: StorageConfig { contacts_path },
            mail: MailSettings::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where submitted contacts are kept. `None` keeps them in process memory.
#[derive(Debug, Clone, Default)]
pub struct StorageConfig {
    pub contacts_path: Option<PathBuf>,
}

/// How much of the submission lifecycle the tracing observer reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailLevel {
    Quiet,
    #[default]
    Summary,
    Verbose,
}

impl DetailLevel {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "quiet" | "off" => Ok(Self::Quiet),
            "summary" | "" => Ok(Self::Summary),
            "verbose" | "debug" => Ok(Self::Verbose),
            other => Err(ConfigError::InvalidDetailLevel(other.to_string())),
        }
    }
}

const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_SIGNATURE: &str = "Portfolio Owner";

/// Mail relay settings handed to the notification dispatcher.
///
/// `username` and `password` are the owner account credentials; the dispatcher only
/// talks to the relay when both are present.
#[derive(Clone)]
pub struct MailSettings {
    pub username: Option<String>,
    pub password: Option<String>,
    pub owner_address: Option<String>,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub signature: String,
    pub detail: DetailLevel,
}

impl MailSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let smtp_port = match non_empty_var("EMAIL_SMTP_PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidSmtpPort)?,
            None => DEFAULT_SMTP_PORT,
        };

        let detail = match non_empty_var("EMAIL_LOG_DETAIL") {
            Some(raw) => DetailLevel::parse(&raw)?,
            None => DetailLevel::default(),
        };

        Ok(Self {
            username: non_empty_var("EMAIL_USER"),
            password: non_empty_var("EMAIL_PASS"),
            owner_address: non_empty_var("EMAIL_TO"),
            smtp_host: non_empty_var("EMAIL_SMTP_HOST")
                .unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
            smtp_port,
            signature: non_empty_var("EMAIL_SIGNATURE")
                .unwrap_or_else(|| DEFAULT_SIGNATURE.to_string()),
            detail,
        })
    }

    /// Settings with no credentials, which keeps the dispatcher in offline mode.
    pub fn unconfigured() -> Self {
        Self {
            username: None,
            password: None,
            owner_address: None,
            smtp_host: DEFAULT_SMTP_HOST.to_string(),
            smtp_port: DEFAULT_SMTP_PORT,
            signature: DEFAULT_SIGNATURE.to_string(),
            detail: DetailLevel::default(),
        }
    }

    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.username = Some(username.to_string());
        self.password = Some(password.to_string());
        self
    }

    /// Returns the sender identity and secret when both are configured.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => {
                Some((user, pass))
            }
            _ => None,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.credentials().is_some()
    }

    /// Recipient for owner alerts; falls back to the sender identity.
    pub fn owner_recipient(&self) -> Option<&str> {
        self.owner_address.as_deref().or(self.username.as_deref())
    }
}

impl fmt::Debug for MailSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailSettings")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("owner_address", &self.owner_address)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("signature", &self.signature)
            .field("detail", &self.detail)
            .finish()
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidSmtpPort,
    InvalidDetailLevel(String),
    MissingContactsPath,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidSmtpPort => write!(f, "EMAIL_SMTP_PORT must be a valid u16"),
            ConfigError::InvalidDetailLevel(value) => write!(
                f,
                "EMAIL_LOG_DETAIL must be quiet, summary, or verbose (found '{value}')"
            ),
            ConfigError::MissingContactsPath => write!(
                f,
                "CONTACTS_PATH must point at the contact file to read stored submissions"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidSmtpPort
            | ConfigError::InvalidDetailLevel(_)
            | ConfigError::MissingContactsPath => None,
        }
    }
}
