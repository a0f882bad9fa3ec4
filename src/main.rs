use log::{error, info};
use tcpip_proxy::configuration::Config;
use tcpip_proxy::network::ProxyListener;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_target(false)
        .init();

    // Missing or extra flags print the usage and exit non-zero
    let config = Config::from_args();

    let listener = match ProxyListener::bind(&config).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("{}, exiting...", e);
            std::process::exit(1);
        }
    };

    info!(
        "Logs for each connection are written to {}",
        config.log_dir.display()
    );
    listener.run().await;
}
