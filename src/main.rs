use pr_reviewer_lib::config::AppConfig;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_target(false)
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("[config] {}", e);
            std::process::exit(2);
        }
    };

    if let Err(e) = pr_reviewer_lib::run(config).await {
        log::error!("[server] {}", e);
        std::process::exit(1);
    }
}
