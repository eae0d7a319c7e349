//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

pub use cli::{
    CliArgs, Command, DatabaseOverride, MailTransportKind, ServeArgs, ServeOverrides,
    SessionStoreKind,
};

use std::{net::SocketAddr, num::NonZeroU32, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "lireddit";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 4000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
const DEFAULT_REDIS_CONNECT_TIMEOUT_MS: u64 = 1_000;
const DEFAULT_SESSION_TTL_SECS: u64 = 60 * 60 * 24 * 365 * 10;
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";
const DEFAULT_RESET_LINK_BASE: &str = "http://localhost:3000/change-password";
const DEFAULT_RESET_TOKEN_TTL_SECS: u64 = 60 * 60 * 24 * 3;
const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_MAIL_FROM: &str = "LiReddit <no-reply@localhost>";

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub sessions: SessionSettings,
    pub cors: CorsSettings,
    pub account: AccountSettings,
    pub mail: MailSettings,
    pub graphql: GraphqlSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub store: SessionStoreKind,
    pub redis_url: String,
    pub redis_connect_timeout: Duration,
    pub cookie_secure: bool,
    pub ttl: Duration,
}

#[derive(Debug, Clone)]
pub struct CorsSettings {
    pub origin: String,
}

#[derive(Debug, Clone)]
pub struct AccountSettings {
    pub reset_link_base: String,
    pub reset_token_ttl: Duration,
}

#[derive(Clone)]
pub struct MailSettings {
    pub transport: MailTransportKind,
    pub from: String,
    pub smtp: Option<SmtpSettings>,
}

/// Relay used when `mail.transport = "smtp"`.
#[derive(Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    /// Implicit TLS (usually port 465) instead of STARTTLS.
    pub implicit_tls: bool,
    pub credentials: Option<(String, String)>,
}

impl std::fmt::Debug for MailSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailSettings")
            .field("transport", &self.transport)
            .field("from", &self.from)
            .field("smtp", &self.smtp)
            .finish()
    }
}

impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("implicit_tls", &self.implicit_tls)
            .field(
                "username",
                &self.credentials.as_ref().map(|(user, _)| user.as_str()),
            )
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct GraphqlSettings {
    pub introspection: bool,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("LIREDDIT").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Migrate(database)) => raw.apply_database_override(database),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    sessions: RawSessionSettings,
    cors: RawCorsSettings,
    account: RawAccountSettings,
    mail: RawMailSettings,
    graphql: RawGraphqlSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
        if let Some(max) = overrides.database_max_connections {
            self.database.max_connections = Some(max);
        }
        if let Some(store) = overrides.session_store {
            self.sessions.store = Some(store);
        }
        if let Some(url) = overrides.redis_url.as_ref() {
            self.sessions.redis_url = Some(url.clone());
        }
        if let Some(secure) = overrides.cookie_secure {
            self.sessions.cookie_secure = Some(secure);
        }
        if let Some(transport) = overrides.mail_transport {
            self.mail.transport = Some(transport);
        }
        if let Some(host) = overrides.smtp_host.as_ref() {
            self.mail.smtp_host = Some(host.clone());
        }
        if let Some(origin) = overrides.cors_origin.as_ref() {
            self.cors.origin = Some(origin.clone());
        }
        if let Some(enabled) = overrides.graphql_introspection {
            self.graphql.introspection = Some(enabled);
        }
    }

    fn apply_database_override(&mut self, overrides: &DatabaseOverride) {
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            database,
            sessions,
            cors,
            account,
            mail,
            graphql,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            database: build_database_settings(database)?,
            sessions: build_session_settings(sessions)?,
            cors: build_cors_settings(cors)?,
            account: build_account_settings(account)?,
            mail: build_mail_settings(mail)?,
            graphql: GraphqlSettings {
                introspection: graphql.introspection.unwrap_or(true),
            },
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let url = non_empty(database.url);
    let max_connections = non_zero_u32(
        database
            .max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
            .into(),
        "database.max_connections",
    )?;

    Ok(DatabaseSettings {
        url,
        max_connections,
    })
}

fn build_session_settings(sessions: RawSessionSettings) -> Result<SessionSettings, LoadError> {
    let store = sessions.store.unwrap_or(SessionStoreKind::Redis);
    let redis_url = non_empty(sessions.redis_url).unwrap_or_else(|| DEFAULT_REDIS_URL.to_string());
    if store == SessionStoreKind::Redis && !redis_url.starts_with("redis") {
        return Err(LoadError::invalid(
            "sessions.redis_url",
            format!("`{redis_url}` is not a redis:// or rediss:// URL"),
        ));
    }

    let timeout_ms = sessions
        .redis_connect_timeout_ms
        .unwrap_or(DEFAULT_REDIS_CONNECT_TIMEOUT_MS);
    let ttl_secs = sessions.ttl_seconds.unwrap_or(DEFAULT_SESSION_TTL_SECS);
    if ttl_secs == 0 {
        return Err(LoadError::invalid(
            "sessions.ttl_seconds",
            "must be greater than zero",
        ));
    }

    Ok(SessionSettings {
        store,
        redis_url,
        redis_connect_timeout: Duration::from_millis(timeout_ms),
        cookie_secure: sessions.cookie_secure.unwrap_or(false),
        ttl: Duration::from_secs(ttl_secs),
    })
}

fn build_cors_settings(cors: RawCorsSettings) -> Result<CorsSettings, LoadError> {
    let origin = non_empty(cors.origin).unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string());
    if !(origin.starts_with("http://") || origin.starts_with("https://")) {
        return Err(LoadError::invalid(
            "cors.origin",
            format!("`{origin}` must be an http(s) origin"),
        ));
    }
    Ok(CorsSettings { origin })
}

fn build_account_settings(account: RawAccountSettings) -> Result<AccountSettings, LoadError> {
    let reset_link_base =
        non_empty(account.reset_link_base).unwrap_or_else(|| DEFAULT_RESET_LINK_BASE.to_string());
    let ttl_secs = account
        .reset_token_ttl_seconds
        .unwrap_or(DEFAULT_RESET_TOKEN_TTL_SECS);
    if ttl_secs == 0 {
        return Err(LoadError::invalid(
            "account.reset_token_ttl_seconds",
            "must be greater than zero",
        ));
    }

    Ok(AccountSettings {
        reset_link_base,
        reset_token_ttl: Duration::from_secs(ttl_secs),
    })
}

fn build_mail_settings(mail: RawMailSettings) -> Result<MailSettings, LoadError> {
    let transport = mail.transport.unwrap_or(MailTransportKind::Log);
    let from = non_empty(mail.from).unwrap_or_else(|| DEFAULT_MAIL_FROM.to_string());
    if !from.contains('@') {
        return Err(LoadError::invalid(
            "mail.from",
            format!("`{from}` is not a mailbox"),
        ));
    }

    let smtp = match transport {
        MailTransportKind::Log => None,
        MailTransportKind::Smtp => {
            let host = non_empty(mail.smtp_host).ok_or_else(|| {
                LoadError::invalid("mail.smtp_host", "required when mail.transport is smtp")
            })?;
            let port = mail.smtp_port.unwrap_or(DEFAULT_SMTP_PORT);
            if port == 0 {
                return Err(LoadError::invalid(
                    "mail.smtp_port",
                    "port must be greater than zero",
                ));
            }
            let credentials = match (non_empty(mail.smtp_username), mail.smtp_password) {
                (Some(user), Some(password)) => Some((user, password)),
                (None, None) => None,
                _ => {
                    return Err(LoadError::invalid(
                        "mail.smtp_username",
                        "username and password must be set together",
                    ));
                }
            };
            Some(SmtpSettings {
                host,
                port,
                implicit_tls: mail.smtp_implicit_tls.unwrap_or(port == 465),
                credentials,
            })
        }
    };

    Ok(MailSettings {
        transport,
        from,
        smtp,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSessionSettings {
    store: Option<SessionStoreKind>,
    redis_url: Option<String>,
    redis_connect_timeout_ms: Option<u64>,
    cookie_secure: Option<bool>,
    ttl_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCorsSettings {
    origin: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawAccountSettings {
    reset_link_base: Option<String>,
    reset_token_ttl_seconds: Option<u64>,
}

#[derive(Clone, Deserialize, Default)]
#[serde(default)]
struct RawMailSettings {
    transport: Option<MailTransportKind>,
    from: Option<String>,
    smtp_host: Option<String>,
    smtp_port: Option<u16>,
    smtp_implicit_tls: Option<bool>,
    smtp_username: Option<String>,
    smtp_password: Option<String>,
}

impl std::fmt::Debug for RawMailSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawMailSettings")
            .field("transport", &self.transport)
            .field("from", &self.from)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawGraphqlSettings {
    introspection: Option<bool>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}
