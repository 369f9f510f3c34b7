use color_eyre::{eyre::eyre, Result};
use tagpad::config::AppConfig;
use tagpad::controller::{GilrsSampler, InputSource, NoDevice, SamplerSettings};
use tagpad::engine::{EngineHandle, PlaybackRequest, TagEngine};
use tagpad::event::LoggedEvent;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let config_path = AppConfig::default_path()?;
    AppConfig::ensure_default(&config_path).await?;
    let config = AppConfig::load(&config_path).await?;

    let (event_tx, event_rx) = mpsc::channel(256);
    let (playback_tx, playback_rx) = mpsc::channel(16);
    let (_definitions_tx, definitions_rx) = watch::channel(config.events.clone());

    let engine = TagEngine::from_config(&config, event_tx, playback_tx);

    info!("Initializing gamepad backend");
    let source: Box<dyn InputSource> = match GilrsSampler::create(Some(SamplerSettings::default()))
    {
        Ok(sampler) => Box::new(sampler.initialize()),
        Err(e) => {
            warn!("Continuing without gamepad support: {}", e);
            Box::new(NoDevice)
        }
    };

    let handle = EngineHandle::spawn(engine, source, definitions_rx, config.timing.tick_hz)
        .map_err(|e| eyre!("Failed to spawn engine: {}", e))?;

    let sink_task = tokio::spawn(report_events(event_rx));
    let playback_task = tokio::spawn(report_playback(playback_rx));

    info!("Tagging in {} mode, press Ctrl+C to stop", config.mode);
    tokio::signal::ctrl_c().await?;

    handle.shutdown().await?;
    sink_task.await?;
    playback_task.await?;
    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}

async fn report_events(mut events: mpsc::Receiver<LoggedEvent>) {
    while let Some(event) = events.recv().await {
        info!(
            "[{}] {} {} ({}) player={:?} zone={:?}",
            event.timestamp.format("%H:%M:%S%.3f"),
            event.team,
            event.event_name,
            event.source_label,
            event.player.map(|p| p.name),
            event.zone
        );
    }
}

// Headless runs have no video transport, so requests are only logged.
async fn report_playback(mut requests: mpsc::Receiver<PlaybackRequest>) {
    while let Some(request) = requests.recv().await {
        info!("Playback request: {:?}", request);
    }
}
