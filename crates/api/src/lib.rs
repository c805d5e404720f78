mod error;
mod job_schedulers;
mod reminder;
mod shared;
mod status;

use actix_web::{dev::Server, middleware, web, App, HttpServer};
use job_schedulers::start_send_reminders_job;
use medtrack_infra::MedtrackContext;
use std::net::TcpListener;
use tracing_actix_web::TracingLogger;

pub use reminder::{run_reminder_pass, ReminderCycleTrigger};
pub use shared::auth::CRON_SECRET_HEADER;

pub fn configure_server_api(cfg: &mut web::ServiceConfig) {
    reminder::configure_routes(cfg);
    status::configure_routes(cfg);
}

pub struct Application {
    server: Server,
    port: u16,
}

impl Application {
    pub async fn new(context: MedtrackContext) -> Result<Self, std::io::Error> {
        Self::build(context, true).await
    }

    /// Serves the api without the minutely reminder job, passes then only run
    /// when the cron route is called
    pub async fn without_job_schedulers(context: MedtrackContext) -> Result<Self, std::io::Error> {
        Self::build(context, false).await
    }

    async fn build(context: MedtrackContext, with_jobs: bool) -> Result<Self, std::io::Error> {
        let (server, port) = Application::configure_server(context.clone()).await?;
        if with_jobs {
            Application::start_job_schedulers(context);
        }

        Ok(Self { server, port })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    fn start_job_schedulers(context: MedtrackContext) {
        start_send_reminders_job(context);
    }

    async fn configure_server(context: MedtrackContext) -> Result<(Server, u16), std::io::Error> {
        let port = context.config.port;
        let address = format!("0.0.0.0:{}", port);
        let listener = TcpListener::bind(&address)?;
        let port = listener.local_addr()?.port();

        let server = HttpServer::new(move || {
            let ctx = context.clone();

            App::new()
                .wrap(middleware::Compress::default())
                .wrap(TracingLogger::default())
                .app_data(web::Data::new(ctx))
                .service(web::scope("/api/v1").configure(configure_server_api))
        })
        .listen(listener)?
        .workers(4)
        .run();

        Ok((server, port))
    }

    pub async fn start(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}
