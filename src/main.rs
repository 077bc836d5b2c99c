use std::thread;
use std::time::Duration;

use consumption_db::api::endpoints;
use consumption_db::api::middleware::timing_middleware;
use consumption_db::api::security::JwtSecurityService;
use consumption_db::api::state::AppState;
use consumption_db::dao::{consumption::ConsumptionDao, measure::MeasureDao, method::MethodDao, release::ReleaseDao, software::SoftwareDao};
use consumption_db::model::apperror::{ApplicationError, ErrorType};
use consumption_db::model::config::{ApplicationArguments, Config, DatabaseType, HttpsConfig, JwtConfig, LoggingConfig};
use consumption_db::service::crud::CrudService;

use actix_web::middleware::from_fn;
use actix_web::{App, HttpServer, web};
use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use clap::Parser;
use prometheus::IntGauge;
use rustls::pki_types::PrivateKeyDer;
use rustls::{ServerConfig, SupportedProtocolVersion};
use rustls_pemfile::{certs, pkcs8_private_keys};
use sqlx::{Pool, Postgres, pool};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

/**
 * Reads the configuration, prepares the database and serves the api until shutdown.
 */
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let args = ApplicationArguments::parse();

    let config = get_config(&args.config_file)?;

    init_tracing(&config.logging)?;

    let connection_pool: Pool<Postgres> = match config.clone().database.db_type {
        DatabaseType::Postgresql { connection_string, max_connections, min_connections, acquire_timeout, acquire_slow_threshold, idle_timeout, max_lifetime } => pool::PoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_millis(acquire_timeout))
            .acquire_slow_threshold(Duration::from_millis(acquire_slow_threshold))
            .idle_timeout(Duration::from_millis(idle_timeout))
            .max_lifetime(Duration::from_millis(max_lifetime))
            .connect(connection_string.as_str())
            .await
            .map_err(|err| std::io::Error::other(format!("Failed to create database pool: {err}")))?,
    };

    if config.database.run_migrations {
        sqlx::migrate!("./sqlx-postgresql-migration/migrations").run(&connection_pool).await.map_err(|err| std::io::Error::other(format!("Failed to run database migrations: {err}")))?;
        tracing::info!("Database migrations applied");
    }

    let jwt_service = get_security_service(config.security.as_ref())?;

    let state = web::Data::new(AppState::new(
        config.application.name.clone(),
        jwt_service,
        CrudService::new(ConsumptionDao::new(), Some(connection_pool.clone())),
        CrudService::new(MeasureDao::new(), Some(connection_pool.clone())),
        CrudService::new(MethodDao::new(), Some(connection_pool.clone())),
        CrudService::new(ReleaseDao::new(), Some(connection_pool.clone())),
        CrudService::new(SoftwareDao::new(), Some(connection_pool.clone())),
    ));

    let prometheus = PrometheusMetricsBuilder::new("")
        .endpoint("/metrics")
        .mask_unmatched_patterns("UNKNOWN")
        .build()
        .map_err(|err| std::io::Error::other(format!("Failed to create Prometheus metrics: {err}")))?;

    // Initialize custom metrics
    let max_connections_gauge = IntGauge::new("max_connections", "Connection pool maximum").map_err(|err| std::io::Error::other(format!("Failed to create max_connections gauge: {err}")))?;
    let min_connections_gauge = IntGauge::new("min_connections", "Connection pool minimum").map_err(|err| std::io::Error::other(format!("Failed to create min_connections gauge: {err}")))?;
    let active_connections_gauge = IntGauge::new("active_connections", "Connection pool active").map_err(|err| std::io::Error::other(format!("Failed to create active_connections gauge: {err}")))?;
    let idle_connections_gauge = IntGauge::new("idle_connections", "Connection pool idle").map_err(|err| std::io::Error::other(format!("Failed to create idle_connections gauge: {err}")))?;
    register_prometheus_metrics(&prometheus, &max_connections_gauge)?;
    register_prometheus_metrics(&prometheus, &min_connections_gauge)?;
    register_prometheus_metrics(&prometheus, &active_connections_gauge)?;
    register_prometheus_metrics(&prometheus, &idle_connections_gauge)?;

    gather_db_metrics(max_connections_gauge, min_connections_gauge, active_connections_gauge, idle_connections_gauge, connection_pool);

    let server_init = HttpServer::new(move || App::new().wrap(from_fn(timing_middleware)).wrap(prometheus.clone()).app_data(state.clone()).configure(endpoints::configure));

    let host = config.server.host.as_str();
    let server_init = if let Some(http_port) = config.server.http_port {
        tracing::info!("Listening on http://{host}:{http_port}");
        server_init.bind((host, http_port))?
    } else {
        server_init
    };
    let server_init = if let Some(https_config) = &config.server.https_config {
        let ssl_builder = ssl_builder(https_config).map_err(|err| std::io::Error::other(format!("Failed to create SSL/TLS configuration: {err}")))?;
        tracing::info!("Listening on https://{host}:{}", https_config.port);
        server_init.bind_rustls_0_23((host, https_config.port), ssl_builder).map_err(|err| std::io::Error::other(format!("Failed to bind HTTPS server: {err}")))?
    } else {
        server_init
    };

    server_init.workers(config.server.workers).run().await
}

/**
 * Initializes the tracing subscriber from the logging configuration.
 *
 * `RUST_LOG` is read first, the configured directives are added on top.
 *
 * #Arguments
 * `logging`: The logging configuration.
 */
fn init_tracing(logging: &LoggingConfig) -> Result<(), std::io::Error> {
    let mut env_filter = EnvFilter::from_default_env();
    for directive in &logging.directives {
        let directive = directive.parse::<Directive>().map_err(|err| std::io::Error::other(format!("Invalid logging directive {directive}: {err}")))?;
        env_filter = env_filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(logging.target)
        .with_thread_ids(logging.thread_ids)
        .with_thread_names(logging.thread_names)
        .with_line_number(logging.line_number)
        .with_level(logging.level)
        .with_ansi(logging.ansi)
        .try_init()
        .map_err(|err| std::io::Error::other(format!("Failed to initialize logging: {err}")))
}

/**
 * Registers custom Prometheus metrics.
 *
 * #Arguments
 * `prometheus_metrics`: The Prometheus metrics instance to register the gauge with.
 * `gauge`: The gauge to register.
 */
fn register_prometheus_metrics(prometheus_metrics: &PrometheusMetrics, gauge: &IntGauge) -> Result<(), std::io::Error> {
    prometheus_metrics.registry.register(Box::new(gauge.clone())).map_err(|err| std::io::Error::other(format!("Failed to register Prometheus gauge: {err}")))?;
    Ok(())
}

/**
 * Gathers connection pool metrics every second in a separate thread.
 */
fn gather_db_metrics(max_connections_gauge: IntGauge, min_connections_gauge: IntGauge, active_connections_gauge: IntGauge, idle_connections_gauge: IntGauge, connection_pool: Pool<Postgres>) {
    thread::spawn(move || {
        loop {
            max_connections_gauge.set(i64::from(connection_pool.options().get_max_connections()));
            min_connections_gauge.set(i64::from(connection_pool.options().get_min_connections()));
            active_connections_gauge.set(i64::from(connection_pool.size()));
            #[allow(clippy::cast_possible_wrap)]
            idle_connections_gauge.set(connection_pool.num_idle() as i64);
            thread::sleep(Duration::from_secs(1));
        }
    });
}

/**
 * Initializes the SSL/TLS configuration for the server.
 *
 * #Arguments
 * `https_config`: The HTTPS configuration containing the certificate and private key files.
 *
 * #Returns
 * A `Result` containing the initialized `ServerConfig` or an `ApplicationError` if initialization fails.
 */
fn ssl_builder(https_config: &HttpsConfig) -> Result<ServerConfig, ApplicationError> {
    let config_builder = ServerConfig::builder_with_protocol_versions(&get_protocol_versions());
    let cert_file = &mut std::io::BufReader::new(
        std::fs::File::open(&https_config.certificate_file).map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Failed to read certificate file: {err}")))?,
    );
    let key_file = &mut std::io::BufReader::new(
        std::fs::File::open(&https_config.private_key_file).map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Failed to read private key file: {err}")))?,
    );
    let cert_chain = certs(cert_file).collect::<Result<Vec<_>, _>>().map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Failed to convert certificate to der: {err}")))?;
    let mut keys = pkcs8_private_keys(key_file)
        .map(|key| key.map(PrivateKeyDer::Pkcs8))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Failed to convert private key to der: {err}")))?;
    if keys.is_empty() {
        return Err(ApplicationError::new(ErrorType::Initialization, "No PKCS#8 private key found".to_string()));
    }
    let config = config_builder
        .with_no_client_auth()
        .with_single_cert(cert_chain, keys.remove(0))
        .map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Failed to create server config: {err}")))?;
    Ok(config)
}

/**
 * Returns the supported TLS protocol versions.
 */
fn get_protocol_versions() -> Vec<&'static SupportedProtocolVersion> {
    vec![&rustls::version::TLS13]
}

/**
 * Reads the configuration from the specified file.
 *
 * #Arguments
 * `config_file`: The path to the configuration file.
 *
 * #Returns
 * A `Result` containing the parsed `Config` or an `std::io::Error` if reading or parsing fails.
*/
fn get_config(config_file: &str) -> Result<Config, std::io::Error> {
    let config_str: String = std::fs::read_to_string(config_file).map_err(|err| std::io::Error::other(format!("Failed to read config file: {err}")))?;
    let config: Config = toml::from_str(&config_str).map_err(|err| std::io::Error::other(format!("Failed to parse config file: {err}")))?;
    Ok(config)
}

/**
 * Creates the JWT security service when security is configured.
 *
 * #Arguments
 * `jwt_config`: Public key or secret and algorithm, `None` leaves the api open.
 */
fn get_security_service(jwt_config: Option<&JwtConfig>) -> Result<Option<JwtSecurityService>, std::io::Error> {
    let Some(jwt_config) = jwt_config else {
        tracing::warn!("No security configured, the api is open");
        return Ok(None);
    };
    let jwt_service = JwtSecurityService::new(&jwt_config.jwt_public_key, &jwt_config.jwt_algorithm).map_err(|err| std::io::Error::other(format!("Failed to create JWT security service: {err}")))?;
    Ok(Some(jwt_service))
}
