//! Serves the working directory on localhost:8000, sending `.mp4` files
//! whole with an explicit `video/mp4` content type and no caching.

use devserve::{video_dispatcher, HttpServer, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stdout)
        .init();

    let config = ServerConfig::default();
    let server = HttpServer::new(config.clone(), video_dispatcher(&config.root));

    let listener = server.bind().await?;
    println!("Server started at {url}", url = config.url());
    server.serve(listener).await?;

    Ok(())
}
