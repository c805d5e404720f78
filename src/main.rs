mod telemetry;

use medtrack_api::{run_reminder_pass, Application, ReminderCycleTrigger};
use medtrack_infra::{run_migration, setup_context};
use telemetry::{get_subscriber, init_subscriber};
use tracing::error;

enum Command {
    /// Run a single reminder pass and exit
    Oneshot,
    /// Serve the http api together with the minutely reminder job
    Serve,
}

fn parse_command() -> Result<Command, String> {
    match std::env::args().nth(1).as_deref() {
        None => Ok(Command::Oneshot),
        Some("serve") => Ok(Command::Serve),
        Some(other) => Err(format!(
            "Unknown command `{}`, expected no arguments or `serve`",
            other
        )),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    openssl_probe::init_ssl_cert_env_vars();

    let subscriber = get_subscriber("medtrack_reminders".into(), "info".into());
    init_subscriber(subscriber);

    let command = match parse_command() {
        Ok(command) => command,
        Err(e) => {
            error!("{}", e);
            std::process::exit(2);
        }
    };

    if let Err(e) = run_migration().await {
        error!("Unable to run migrations: {:?}", e);
        std::process::exit(1);
    }
    let context = match setup_context().await {
        Ok(context) => context,
        Err(e) => {
            error!("Unable to setup context: {:?}", e);
            std::process::exit(1);
        }
    };

    match command {
        Command::Oneshot => {
            if run_reminder_pass(&context, ReminderCycleTrigger::Oneshot)
                .await
                .is_err()
            {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Serve => {
            let app = Application::new(context).await?;
            app.start().await
        }
    }
}
