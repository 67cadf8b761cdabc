use std::net::{IpAddr, SocketAddr};

use anyhow::Context;
use clap::Parser;
use tracing::info;
use valset_relayer::{
    cli::{Commands, ValsetRelayerCli},
    config::load_config,
    metrics,
    observability::init_observability,
    runner::Runner,
};
use valset_relayer_lib::{
    chain::ValsetTarget, cosmos::CosmosClient, eth::PeggyContract, sync::ValsetRelayer,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = ValsetRelayerCli::parse();
    match cli.command {
        Commands::Start(args) => {
            let config_bz = std::fs::read(&args.config)
                .with_context(|| format!("failed to read config file {}", args.config))?;
            let config = load_config(&config_bz)?;

            let _guard = init_observability(&config.observability)?;

            info!(
                "Observability initialized with level: {}",
                config.observability.level()
            );

            if !config.relayer.relay_valsets {
                info!("Valset relaying is disabled, exiting");
                return Ok(());
            }

            let metrics_ip: IpAddr = config
                .metrics
                .address
                .parse()
                .with_context(|| format!("invalid metrics address {}", config.metrics.address))?;
            tokio::spawn(metrics::serve(SocketAddr::new(
                metrics_ip,
                config.metrics.port,
            )));

            let cosmos = CosmosClient::connect(&config.cosmos.tm_rpc_url)?;
            let peggy = PeggyContract::connect(
                &config.ethereum.eth_rpc_url,
                config.ethereum.peggy_address,
                &config.ethereum.private_key,
                config.ethereum.blocks_to_search,
            )
            .await?;

            info!(
                peggy = %config.ethereum.peggy_address,
                relayer = %peggy.from_address(),
                "Connected to cosmos and ethereum"
            );

            let relayer = ValsetRelayer::new(
                cosmos.clone(),
                cosmos,
                peggy,
                config.relayer.relay_valset_offset,
            );
            let runner = Runner::new(
                relayer,
                config.relayer.loop_interval,
                config.relayer.sync_timeout,
            );

            runner
                .run(async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        tracing::error!("Failed to listen for shutdown signal: {e}");
                        std::future::pending::<()>().await;
                    }
                    info!("Received shutdown signal");
                })
                .await;

            Ok(())
        }
    }
}
