use bazaar::{configuration::Settings, startup::Application, telemetry::{get_subscriber, init_subscriber}};

#[actix_web::main]
async fn main() -> anyhow::Result<()>{
    let subscriber = get_subscriber("bazaar".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber);

    let config = Settings::get()?;

    let application = Application::new(config).await?;
    tracing::info!(
        host = %application.host,
        port = application.port,
        "Marketplace API listening"
    );
    application.server.await?;
    Ok(())
}
