use std::{process, sync::Arc, time::Duration};

use bytes::Bytes;
use mdpage::{
    application::{
        error::AppError,
        ids::RandomIdAllocator,
        listing::ListingService,
        publish::PublishService,
        render::{ComrakRenderService, RenderPipelineConfig},
        repos::PageStore,
    },
    config,
    domain::uploads::{UploadRequest, media_type_for},
    infra::{
        error::InfraError,
        http::{self, HttpState, models::FileEntry},
        storage::FsPageStore,
        telemetry::{self, LogStream},
    },
};
use time::format_description::well_known::Rfc3339;
use tokio::{net::TcpListener, sync::Notify};
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

    let subscriber = tracing_fmt()
        .with_writer(std::io::stderr)
        .with_max_level(Level::ERROR)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging, LogStream::for_command(&command))?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Publish(args) => run_publish(settings, args).await,
        config::Command::List(args) => run_list(settings, args).await,
    }
}

struct Services {
    store: Arc<dyn PageStore>,
    publish: Arc<PublishService>,
    listing: Arc<ListingService>,
}

fn build_services(settings: &config::Settings) -> Result<Services, AppError> {
    let store: Arc<dyn PageStore> = Arc::new(
        FsPageStore::new(settings.storage.directory.clone()).map_err(InfraError::from)?,
    );
    let renderer = Arc::new(ComrakRenderService::new(RenderPipelineConfig::from(
        &settings.render,
    )));

    let publish = Arc::new(PublishService::new(
        renderer,
        Arc::new(RandomIdAllocator),
        store.clone(),
        settings.server.public_base_url.clone(),
    ));
    let listing = Arc::new(ListingService::new(store.clone()));

    Ok(Services {
        store,
        publish,
        listing,
    })
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let services = build_services(&settings)?;
    let router = http::build_router(HttpState {
        publish: services.publish,
        listing: services.listing,
        store: services.store,
        upload_limit_bytes: settings.uploads.max_request_bytes.get(),
    });

    let listener = TcpListener::bind(settings.server.addr)
        .await
        .map_err(InfraError::from)?;

    info!(
        target = "mdpage::serve",
        addr = %settings.server.addr,
        public_base_url = %settings.server.public_base_url,
        storage = %settings.storage.directory.display(),
        sanitize = settings.render.sanitize,
        "listening"
    );

    let shutdown = Arc::new(Notify::new());
    let signalled = shutdown.clone();
    let server = axum::serve(listener, router.into_make_service()).with_graceful_shutdown(
        async move {
            wait_for_shutdown_signal().await;
            signalled.notify_waiters();
        },
    );

    tokio::select! {
        result = server => {
            result.map_err(|err| InfraError::server(err.to_string()))?;
        }
        _ = drain_deadline(shutdown, settings.server.graceful_shutdown) => {
            warn!(
                target = "mdpage::serve",
                grace_seconds = settings.server.graceful_shutdown.as_secs(),
                "graceful shutdown window elapsed; dropping open connections"
            );
        }
    }

    info!(target = "mdpage::serve", "server stopped");
    Ok(())
}

async fn drain_deadline(shutdown: Arc<Notify>, grace: Duration) {
    shutdown.notified().await;
    tokio::time::sleep(grace).await;
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(target = "mdpage::serve", error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(target = "mdpage::serve", error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!(target = "mdpage::serve", "shutdown signal received");
}

async fn run_publish(settings: config::Settings, args: config::PublishArgs) -> Result<(), AppError> {
    let services = build_services(&settings)?;

    let bytes = tokio::fs::read(&args.file)
        .await
        .map_err(InfraError::from)?;
    let filename = args
        .file
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_string();
    let content_type = args
        .content_type
        .or_else(|| media_type_for(&filename).map(str::to_owned))
        .unwrap_or_default();

    let published = services
        .publish
        .publish(UploadRequest::new(filename, content_type, Bytes::from(bytes)))
        .await?;

    println!("{}", published.url);
    Ok(())
}

async fn run_list(settings: config::Settings, args: config::ListArgs) -> Result<(), AppError> {
    let services = build_services(&settings)?;
    let pages = services.listing.list_published().await?;

    if args.json {
        let files = pages
            .iter()
            .map(FileEntry::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| AppError::unexpected(err.to_string()))?;
        let rendered = serde_json::to_string_pretty(&http::models::FilesResponse { files })
            .map_err(|err| AppError::unexpected(err.to_string()))?;
        println!("{rendered}");
        return Ok(());
    }

    for page in &pages {
        let created_at = page
            .created_at
            .format(&Rfc3339)
            .map_err(|err| AppError::unexpected(err.to_string()))?;
        println!(
            "{}\t{}\t{}\t{}",
            page.id,
            created_at,
            page.size_bytes,
            services.publish.page_url(&page.id)
        );
    }
    Ok(())
}
