//! Back-office client binary.
//!
//! Loads settings, wires the authenticated gateway and runs one command.

use std::sync::Arc;

use backoffice::{BackOffice, Cli, Command};
use backoffice_infrastructure::{LoggingNavigator, Settings};
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let command = Command::try_from(cli.action)?;
    let settings = Settings::load(cli.config.as_deref())?;

    tracing::debug!(
        api = %settings.api_base_url,
        "Starting back-office client v{}",
        env!("CARGO_PKG_VERSION")
    );

    let navigator = Arc::new(LoggingNavigator::new(settings.login_url.clone()));
    let client = BackOffice::from_settings(&settings, navigator)?;

    match command {
        Command::Login { username, password } => {
            let user = client.session().login(&username, &password).await?;
            println!("logged in as {} <{}>", user.name, user.email);
        }
        Command::Logout => {
            client.session().logout().await?;
            println!("logged out");
        }
        Command::WhoAmI => match client.session().current_user().await? {
            Some(user) => println!("{} <{}> ({})", user.name, user.email, user.role),
            None => println!("not logged in"),
        },
        Command::Send(request) => {
            let response = client.gateway().send(request).await?;
            println!(
                "{} {}",
                response.status.as_u16(),
                response.status.reason_phrase()
            );
            println!("{}", response.text());
        }
    }

    Ok(())
}
