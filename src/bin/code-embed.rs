use anyhow::Result;
use code_embed::Config;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Parse configuration from command line
    let config = Config::from_args_and_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    code_embed::cli::run(config).await
}
