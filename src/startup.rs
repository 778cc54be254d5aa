use actix_cors::Cors;
use actix_web::dev::Server;
use actix_web::http::header;
use actix_web::{web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing_actix_web::TracingLogger;

use crate::account_client::AccountDirectory;
use crate::clock::{Clock, SystemClock};
use crate::configuration::Settings;
use crate::document_store::{DocumentStore, InMemoryDocumentStore};
use crate::email_client::GenericEmailService;
use crate::errors::{json_error_handler, query_error_handler};
use crate::liveness_client::{HttpLivenessClient, LivenessService};
use crate::middleware::SaveRequestResponse;
use crate::otp::{OtpGenerator, OtpManager, RandomOtpGenerator};
use crate::routes::main_route;
use crate::utils::{create_account_directory, create_email_client};
use crate::verification::VerificationController;

/// The external collaborators the service talks to. Tests swap these for
/// in-process fakes.
pub struct AppServices {
    pub email_client: Arc<dyn GenericEmailService>,
    pub account_directory: Arc<dyn AccountDirectory>,
    pub liveness: Arc<dyn LivenessService>,
    pub documents: Arc<dyn DocumentStore>,
    pub otp_generator: Arc<dyn OtpGenerator>,
    pub clock: Arc<dyn Clock>,
}

impl AppServices {
    pub fn from_configuration(configuration: &Settings) -> Result<Self, anyhow::Error> {
        Ok(Self {
            email_client: create_email_client(&configuration.email_client)?,
            account_directory: create_account_directory(&configuration.account_directory)?,
            liveness: Arc::new(HttpLivenessClient::new(
                configuration.liveness.base_url.clone(),
                configuration.liveness.timeout(),
            )?),
            documents: Arc::new(InMemoryDocumentStore::new()),
            otp_generator: Arc::new(RandomOtpGenerator),
            clock: Arc::new(SystemClock),
        })
    }
}

pub struct Application {
    port: u16,
    server: Server,
    housekeeping: Vec<JoinHandle<()>>,
}

impl Application {
    pub async fn build(configuration: Settings) -> Result<Self, anyhow::Error> {
        let services = AppServices::from_configuration(&configuration)?;
        Self::build_with_services(configuration, services).await
    }

    pub async fn build_with_services(
        configuration: Settings,
        services: AppServices,
    ) -> Result<Self, anyhow::Error> {
        let otp_manager = Arc::new(OtpManager::new(
            configuration.otp.clone(),
            services.email_client,
            services.otp_generator,
            services.clock.clone(),
        ));
        let controller = Arc::new(VerificationController::new(
            otp_manager.clone(),
            services.account_directory,
            services.liveness,
            services.documents,
            services.clock,
            configuration.liveness.clone(),
            configuration.session.clone(),
        ));
        let housekeeping = vec![
            otp_manager.spawn_sweeper(),
            controller
                .clone()
                .spawn_session_reaper(configuration.otp.sweep_interval()),
        ];

        let address = format!(
            "{}:{}",
            configuration.application.host, configuration.application.port
        );
        let listener = TcpListener::bind(&address)?;
        let port = listener.local_addr()?.port();
        tracing::info!("Listening on {}:{}", configuration.application.host, port);
        let server = run(
            listener,
            controller,
            configuration.application.workers,
            configuration.application.allowed_origins,
        )?;
        Ok(Self {
            port,
            server,
            housekeeping,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    // Only returns when the server is stopped.
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        let result = self.server.await;
        for task in self.housekeeping {
            task.abort();
        }
        result
    }
}

fn build_cors(allowed_origins: &[String]) -> Cors {
    allowed_origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allowed_methods(vec!["GET", "POST"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
        .allowed_header("x-request-id")
        .max_age(3600)
}

fn run(
    listener: TcpListener,
    controller: Arc<VerificationController>,
    workers: usize,
    allowed_origins: Vec<String>,
) -> Result<Server, anyhow::Error> {
    let controller = web::Data::from(controller);
    let server = HttpServer::new(move || {
        App::new()
            .wrap(SaveRequestResponse)
            .wrap(build_cors(&allowed_origins))
            .wrap(TracingLogger::default())
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .app_data(controller.clone())
            .configure(main_route)
    })
    .workers(workers)
    .listen(listener)?
    .run();

    Ok(server)
}
