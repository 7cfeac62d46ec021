use kyte_core::Config;

// Use mimalloc as the global allocator for lower fragmentation under
// concurrent multipart buffering.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Missing provider credentials fail here, before anything is bound.
    let config = Config::from_env()?;

    let (_state, router) = kyte_api::setup::initialize_app(config.clone()).await?;

    kyte_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
