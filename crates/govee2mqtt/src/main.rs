use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use tokio::sync::watch;
use tracing_subscriber::filter::LevelFilter;

use govee2mqtt::api;
use govee2mqtt::engine::command_channel;
use govee2mqtt::govee::Device;
use govee2mqtt::hass::classify::is_light;
use govee2mqtt::hass::classify::is_switch;
use govee2mqtt::hass::classify::sensor_entities;
use govee2mqtt::mqtt::device_slug;
use govee2mqtt::mqtt::MqttClient;
use govee2mqtt::mqtt::RumqttcClient;
use govee2mqtt::Args;
use govee2mqtt::Config;
use govee2mqtt::Engine;
use govee2mqtt::EngineError;
use govee2mqtt::GoveeApi;
use govee2mqtt::GoveeApiClient;
use govee2mqtt::RunMode;

/// Print each device and the entities it maps to.
fn print_devices(devices: &[Device]) {
    for device in devices {
        println!(
            "{} ({}) [{}]",
            device.name,
            device.sku,
            device_slug(&device.device_id)
        );
        if is_light(device) {
            println!("  - light");
        } else if is_switch(device) {
            println!("  - switch");
        }
        for entity in sensor_entities(device) {
            println!("  - {}: {}", entity.kind(), entity.instance);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_args(Args::parse())?;

    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::from(config.log_level))
        .init();

    tracing::info!("govee2mqtt v{} starting", env!("CARGO_PKG_VERSION"));

    let api = GoveeApiClient::new(&config.govee).context("failed to create API client")?;
    let devices = api
        .list_devices()
        .await
        .context("failed to list devices")?;
    tracing::info!("Found {} devices", devices.len());

    if config.dry_run {
        print_devices(&devices);
        return Ok(());
    }

    let mqtt_config = config
        .mqtt
        .as_ref()
        .context("MQTT_HOST is required when not in --dry-run mode")?;

    let (commands, command_rx) = command_channel();
    let mut bus = RumqttcClient::new(mqtt_config, commands.clone());
    if let Err(e) = bus.connect().await {
        tracing::error!("Failed to connect to MQTT broker: {}", e);
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let signal_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received interrupt, stopping");
            let _ = signal_tx.send(true);
        }
    });

    let mut engine = Engine::new(
        api,
        bus,
        mqtt_config.topics(),
        devices,
        command_rx,
        shutdown_rx.clone(),
    )
    .with_poll_interval(config.poll_interval)
    .with_continue_on_error(config.continue_on_error);

    let server = config.http_listen.map(|addr| {
        let status = engine.status();
        let commands = commands.clone();
        let shutdown = shutdown_rx.clone();
        tokio::spawn(async move {
            if let Err(e) = api::serve(addr, status, commands, shutdown).await {
                tracing::error!("HTTP API server failed: {}", e);
            }
        })
    });

    let mode = if config.once {
        RunMode::Once
    } else {
        RunMode::Continuous
    };

    let result: Result<(), EngineError> = async {
        engine.publish_discovery().await?;
        engine.run(mode).await
    }
    .await;

    if let Err(e) = engine.shutdown().await {
        tracing::warn!("Failed to disconnect from MQTT broker: {}", e);
    }

    let _ = shutdown_tx.send(true);
    if let Some(server) = server {
        let _ = server.await;
    }

    result.context("bridge stopped with an error")?;
    tracing::info!("govee2mqtt stopped");
    Ok(())
}
