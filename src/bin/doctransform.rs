use std::error::Error;

use doctransform::cli::{self, Command, USAGE};
use doctransform::{TransformBuilder, TransformConfig};

fn print_usage_and_exit(message: &str) -> ! {
    eprintln!("Error: {message}");
    eprintln!();
    eprintln!("Usage: {USAGE}");
    std::process::exit(1);
}

async fn run(command: Command) -> Result<(), Box<dyn Error>> {
    let builder = match command {
        Command::Run(args) => args.into_builder(),
        Command::Config(path) => {
            let config = TransformConfig::load(&path).await?;
            TransformBuilder::from_config(&config)?
        }
    };

    let job = builder.build()?;
    job.run().await?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let command = match cli::parse_args(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(e) => print_usage_and_exit(&e.to_string()),
    };

    if let Err(e) = run(command).await {
        eprintln!("doctransform error: {e}");
        std::process::exit(1);
    }
}
