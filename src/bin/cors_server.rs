//! Serves the working directory on localhost:8000 with a wildcard CORS
//! header on every response.

use devserve::{cors_dispatcher, HttpServer, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stdout)
        .init();

    let config = ServerConfig::default();
    let server = HttpServer::new(config.clone(), cors_dispatcher(&config.root));

    let listener = server.bind().await?;
    println!("Server started at {url}", url = config.url());
    server.serve(listener).await?;

    Ok(())
}
