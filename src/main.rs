use log::error;
use seat_allocator::config::AppConfig;
use seat_allocator::server;

#[tokio::main]
async fn main() {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.server.log_filter.as_str())).init();

    if let Err(e) = server::run_server(&config.server, config.seating).await {
        error!("Server stopped: {}", e);
        std::process::exit(1);
    }
}
