use tracing::error;
use tracing_subscriber::EnvFilter;

use toolkit_import::config::Config;
use toolkit_import::pipeline;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    };

    let conn = match pipeline::connect(&config) {
        Ok(conn) => conn,
        Err(e) => {
            error!("{:#}", e);
            println!("Failed to connect to database");
            std::process::exit(1);
        }
    };

    if let Err(e) = pipeline::run(&conn, &config) {
        error!("{:#}", e);
        std::process::exit(1);
    }

    println!("Done.");
}
