use medtrack_api::Application;
use medtrack_infra::{Config, InMemoryEmailChannel, InMemoryPushChannel, MedtrackContext};
use std::sync::Arc;

pub struct TestApp {
    pub config: Config,
    pub ctx: MedtrackContext,
    pub address: String,
    pub push: Arc<InMemoryPushChannel>,
    pub email: Arc<InMemoryEmailChannel>,
}

// Launch the application as a background task
pub async fn spawn_app() -> TestApp {
    let mut ctx = MedtrackContext::create_inmemory();
    ctx.config.port = 0; // Random port
    ctx.config.cron_secret = "test-cron-secret".into();
    let push = Arc::new(InMemoryPushChannel::new());
    let email = Arc::new(InMemoryEmailChannel::new());
    ctx.channels.push = push.clone();
    ctx.channels.email = email.clone();

    let config = ctx.config.clone();
    let application = Application::without_job_schedulers(ctx.clone())
        .await
        .expect("Failed to build application.");

    let address = format!("http://localhost:{}/api/v1", application.port());
    let _ = actix_web::rt::spawn(async move {
        application
            .start()
            .await
            .expect("Expected application to start");
    });

    TestApp {
        config,
        ctx,
        address,
        push,
        email,
    }
}
