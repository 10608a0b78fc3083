// src/main.rs

use treewatch::{cli, config, logging, run};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("treewatch error: {err:#}");
        std::process::exit(1);
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    let config = config::resolve(&args)?;
    logging::init_logging(
        args.log_level.or(config.log_level),
        config.verbose,
        config.syslog,
    )?;
    run(config, args.dry_run).await
}
