use clap::Parser;
use serde::{Deserialize, Serialize};

/**
 * Command-line arguments for the application.
 */
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct ApplicationArguments {
    /**
     * Path to the configuration file.
     */
    #[arg(short, long)]
    pub config_file: String,
}

/**
 * Represents the configuration for the application.
 */
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /**
     * General application settings.
     */
    pub application: ApplicationConfig,
    /**
     * Logging configuration for the application.
     */
    #[serde(default)]
    pub logging: LoggingConfig,
    /**
     * Security configuration for the application. The api is open when missing.
     */
    pub security: Option<JwtConfig>,
    /**
     * Server configuration for the application.
     */
    pub server: Server,
    /**
     * Database configuration for the application.
     */
    pub database: Database,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationConfig {
    /**
     * Application name used in the notification headers.
     */
    pub name: String,
}

#[allow(clippy::struct_excessive_bools)]
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    /**
     * Whether to log the target of the log message.
     */
    pub target: bool,
    /**
     * Whether to log thread ids.
     */
    pub thread_ids: bool,
    /**
     * Whether to log thread names.
     */
    pub thread_names: bool,
    /**
     * Whether to log line numbers.
     */
    pub line_number: bool,
    /**
     * Whether to log the log level.
     */
    pub level: bool,
    /**
     * Whether to use ANSI colors in logs.
     */
    pub ansi: bool,
    /**
     * Additional directives for logging configuration, e.g. `consumption_db=debug`.
     */
    pub directives: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig { target: true, thread_ids: true, thread_names: true, line_number: true, level: true, ansi: true, directives: vec![] }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Database {
    /**
     * Whether to apply the embedded migrations at startup.
     */
    #[serde(default)]
    pub run_migrations: bool,
    /**
     * Type of the database (e.g., `PostgreSQL`).
     */
    pub db_type: DatabaseType,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DatabaseType {
    /**
     * `PostgreSQL` database type.
     */
    #[serde(rename_all = "camelCase")]
    Postgresql { connection_string: String, max_connections: u32, min_connections: u32, acquire_timeout: u64, acquire_slow_threshold: u64, idle_timeout: u64, max_lifetime: u64 },
}

/**
 * JWT validation settings.
 */
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JwtConfig {
    /**
     * PEM encoded public key, or the shared secret for HMAC algorithms.
     */
    pub jwt_public_key: String,
    /**
     * Algorithm name, e.g. `RS256` or `HS512`.
     */
    pub jwt_algorithm: String,
}

/**
 * Represents the server configuration for the application.
 */
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    /**
     * Number of worker threads for the server.
     */
    pub workers: usize,
    /**
     * Address to bind to.
     */
    #[serde(default = "default_host")]
    pub host: String,
    /**
     * HTTP port for the server.
     */
    pub http_port: Option<u16>,
    /**
     * HTTPS configuration for the server.
     */
    pub https_config: Option<HttpsConfig>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

/**
 * Represents the HTTPS configuration for the server.
 */
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpsConfig {
    /**
     * Port for the HTTPS server.
     */
    pub port: u16,
    /**
     * Path to the certificate file.
     */
    pub certificate_file: String,
    /**
     * Path to the private key file.
     */
    pub private_key_file: String,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_config_serialization() {
        let config = Config {
            application: ApplicationConfig { name: "consumptionDbApp".to_string() },
            logging: LoggingConfig::default(),
            security: Some(JwtConfig { jwt_public_key: "secret".to_string(), jwt_algorithm: "HS256".to_string() }),
            database: Database {
                run_migrations: true,
                db_type: DatabaseType::Postgresql {
                    connection_string: "".to_string(),
                    max_connections: 5,
                    min_connections: 1,
                    acquire_timeout: 30,
                    acquire_slow_threshold: 60,
                    idle_timeout: 300,
                    max_lifetime: 3600,
                },
            },
            server: Server { workers: 4, host: default_host(), http_port: Some(8080), https_config: None },
        };
        let serialized = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(config.application.name, deserialized.application.name);
        assert_eq!(config.logging.target, deserialized.logging.target);
        assert_eq!(config.logging.thread_ids, deserialized.logging.thread_ids);
        assert_eq!(config.logging.line_number, deserialized.logging.line_number);
        assert_eq!(config.logging.directives, deserialized.logging.directives);
        assert_eq!(config.server.workers, deserialized.server.workers);
        assert_eq!(config.server.http_port, deserialized.server.http_port);
        assert!(deserialized.server.https_config.is_none());
        assert!(deserialized.database.run_migrations);
        assert_eq!(deserialized.security.map(|security| security.jwt_algorithm), Some("HS256".to_string()));
    }

    #[test]
    fn test_config_defaults() {
        let config_str = r#"
            [application]
            name = "consumptionDbApp"

            [logging]
            target = false
            threadIds = false
            threadNames = false
            lineNumber = false
            level = true
            ansi = false
            directives = ["consumption_db=debug"]

            [server]
            workers = 2
            httpPort = 8080

            [database.dbType.postgresql]
            connectionString = "postgres://localhost/consumption"
            maxConnections = 5
            minConnections = 1
            acquireTimeout = 3000
            acquireSlowThreshold = 1000
            idleTimeout = 60000
            maxLifetime = 600000
        "#;
        let config: Config = toml::from_str(config_str).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert!(config.security.is_none());
        assert!(!config.database.run_migrations);
        assert_eq!(config.logging.directives, vec!["consumption_db=debug".to_string()]);
    }

    #[test]
    fn test_logging_section_is_optional() {
        let config_str = r#"
            [application]
            name = "consumptionDbApp"

            [server]
            workers = 1

            [database]
            runMigrations = true

            [database.dbType.postgresql]
            connectionString = "postgres://localhost/consumption"
            maxConnections = 5
            minConnections = 1
            acquireTimeout = 3000
            acquireSlowThreshold = 1000
            idleTimeout = 60000
            maxLifetime = 600000
        "#;
        let config: Config = toml::from_str(config_str).unwrap();
        assert!(config.logging.ansi);
        assert!(config.logging.directives.is_empty());
        assert!(config.database.run_migrations);
        assert!(config.server.http_port.is_none());
    }
}
