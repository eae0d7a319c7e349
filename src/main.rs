use std::{process, sync::Arc};

use lireddit::{
    application::{
        error::AppError,
        mail::Mailer,
        posts::PostService,
        repos::{PostsRepo, PostsWriteRepo, UpdootsRepo, UsersRepo},
        sessions::{KeyValueStore, SessionStore},
        users::{PasswordResetSettings, UserService},
    },
    config::{self, MailTransportKind, SessionStoreKind},
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{
            self, HttpState, SessionCookieSettings,
            graphql::{LoaderFactory, build_schema},
        },
        mail::{LogMailer, SmtpMailer},
        sessions::{MemoryStore, RedisStore},
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn connect_database(settings: &config::Settings) -> Result<sqlx::PgPool, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| InfraError::database(err.to_string()))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| InfraError::database(err.to_string()))?;

    Ok(pool)
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    connect_database(&settings).await?;
    info!("database migrations applied");
    Ok(())
}

async fn build_key_value_store(
    settings: &config::SessionSettings,
) -> Result<Arc<dyn KeyValueStore>, AppError> {
    match settings.store {
        SessionStoreKind::Redis => {
            let store =
                RedisStore::connect(&settings.redis_url, settings.redis_connect_timeout).await?;
            Ok(Arc::new(store))
        }
        SessionStoreKind::Memory => {
            warn!("using in-memory session store; sessions are lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

fn build_mailer(settings: &config::MailSettings) -> Result<Arc<dyn Mailer>, AppError> {
    match (settings.transport, settings.smtp.as_ref()) {
        (MailTransportKind::Smtp, Some(smtp)) => {
            Ok(Arc::new(SmtpMailer::new(smtp, &settings.from)?))
        }
        (MailTransportKind::Smtp, None) => {
            Err(InfraError::configuration("smtp transport selected without relay settings").into())
        }
        (MailTransportKind::Log, _) => {
            warn!("using log mail transport; reset mail is not delivered");
            Ok(Arc::new(LogMailer))
        }
    }
}

fn build_http_state(
    settings: &config::Settings,
    repositories: Arc<PostgresRepositories>,
    kv: Arc<dyn KeyValueStore>,
    mailer: Arc<dyn Mailer>,
) -> HttpState {
    let users_repo: Arc<dyn UsersRepo> = repositories.clone();
    let posts_repo: Arc<dyn PostsRepo> = repositories.clone();
    let posts_write_repo: Arc<dyn PostsWriteRepo> = repositories.clone();
    let updoots_repo: Arc<dyn UpdootsRepo> = repositories.clone();

    let users = UserService::new(
        users_repo.clone(),
        kv.clone(),
        mailer,
        PasswordResetSettings {
            link_base: settings.account.reset_link_base.clone(),
            token_ttl: settings.account.reset_token_ttl,
        },
    );
    let posts = PostService::new(posts_repo, posts_write_repo, updoots_repo.clone());

    HttpState {
        schema: build_schema(users, posts, settings.graphql.introspection),
        sessions: SessionStore::new(kv, settings.sessions.ttl),
        loaders: LoaderFactory::new(users_repo, updoots_repo),
        cookies: SessionCookieSettings {
            secure: settings.sessions.cookie_secure,
            max_age: settings.sessions.ttl,
        },
        db: repositories,
        playground: settings.graphql.introspection,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let pool = connect_database(&settings).await?;
    let repositories = Arc::new(PostgresRepositories::new(pool));
    let kv = build_key_value_store(&settings.sessions).await?;

    let mailer = build_mailer(&settings.mail)?;

    let state = build_http_state(&settings, repositories, kv, mailer);
    let router = http::build_router(state, &settings.cors.origin)?;

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(InfraError::from)?;
    info!(addr = %settings.server.addr, "listening");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await
    });

    tokio::select! {
        result = &mut server => return server_exit(result),
        () = shutdown_signal() => {}
    }

    let _ = shutdown_tx.send(());
    let grace = settings.server.graceful_shutdown;
    match tokio::time::timeout(grace, server).await {
        Ok(result) => server_exit(result),
        Err(_) => {
            warn!(grace_secs = grace.as_secs(), "graceful shutdown timed out");
            Ok(())
        }
    }
}

fn server_exit(
    result: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<(), AppError> {
    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(AppError::unexpected(format!("server error: {err}"))),
        Err(err) => Err(AppError::unexpected(format!("server task failed: {err}"))),
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
