use clap::Parser;
use surface_explorer::cli::commands::{cmd_explore, cmd_fixture};
use surface_explorer::cli::config::{Cli, Commands, default_log_filter, load_config};
use surface_explorer::cli::interrupt::install_interrupt_handler;
use surface_explorer::explorer::explorer::CancelFlag;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // RUST_LOG overrides the -v derived default
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_log_filter(cli.verbose).into()),
        )
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load_config(cli.config.as_deref());

    let cancel = CancelFlag::new();
    if let Err(e) = install_interrupt_handler(cancel.clone()) {
        warn!(error = %e, "Ctrl-C will not stop the run gracefully");
    }

    match cli.command {
        Commands::Explore {
            url,
            node,
            script,
            run,
        } => {
            cmd_explore(
                &config,
                url.as_deref(),
                node.as_deref(),
                script.as_deref(),
                &run,
                &cancel,
            )?;
        }
        Commands::Fixture { app, run } => {
            cmd_fixture(&config, &app, &run, &cancel)?;
        }
    }

    Ok(())
}
