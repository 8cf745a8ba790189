mod config;
mod engine;
mod error;
mod models;
mod peripherals;
mod utils;

use std::time::Instant;

use log::{error, info};
use tokio::time::{sleep, Duration};

use config::NodeConfig;
use engine::{Collaborators, ReportingEngine, Uploader};
use peripherals::{
    provision, CloudSync, HttpCloudSync, HttpSensor, HttpTransport, LogCloudSync, LogDisplay,
    SystemClock, TcpProbe,
};

const PROBE_TIMEOUT_SECS: u64 = 3;
const PROVISION_WAIT_SECS: u64 = 5;

async fn build_engine(config: &NodeConfig) -> Result<ReportingEngine, error::NodeError> {
    let clock = SystemClock::new();
    clock.wait_for_sync(config.clock_sync_timeout).await;

    let probe = TcpProbe::for_url(&config.ingest_url, Duration::from_secs(PROBE_TIMEOUT_SECS))?;
    provision(
        &probe,
        config.provision_attempts,
        Duration::from_secs(PROVISION_WAIT_SECS),
    )
    .await?;

    let transport = HttpTransport::new(
        config.ingest_url.clone(),
        config.http_timeout,
        config.ingest_ca_cert.as_deref(),
    )?;
    let uploader = Uploader::new(
        config.device_id.clone(),
        Box::new(transport),
        Box::new(probe),
        config.http_timeout,
    );

    let cloud: Box<dyn CloudSync> = match &config.cloud_sync_url {
        Some(url) => Box::new(HttpCloudSync::new(url.clone(), config.http_timeout)?),
        None => Box::new(LogCloudSync),
    };

    Ok(ReportingEngine::new(
        &config.schedule,
        Collaborators {
            clock: Box::new(clock),
            sensor: Box::new(HttpSensor::new(config.sensor_url.clone(), config.http_timeout)?),
            uploader,
            cloud,
            display: Box::new(LogDisplay::new()),
        },
    ))
}

async fn main_loop(mut engine: ReportingEngine, tick: Duration) {
    info!("Starting sampling and reporting loop");

    loop {
        let outcome = engine.tick(Instant::now()).await;
        if let Some(report) = &outcome.report {
            info!(
                "Report cycle finished: {:?}, {} samples buffered",
                report,
                engine.buffer().len()
            );
        }

        sleep(tick).await;
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format_timestamp_secs()
        .init();

    // Load configuration
    let config = match NodeConfig::new() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Provisioning failures end the process so the supervisor restarts it
    let engine = match build_engine(&config).await {
        Ok(engine) => engine,
        Err(e) => {
            error!("Startup failed: {}", e);
            return Err(e.into());
        }
    };

    // Handle Ctrl+C gracefully
    let (tx, mut rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                let _ = tx.send(());
            }
            Err(e) => {
                // keep the sender alive so the loop is not stopped
                error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
                drop(tx);
            }
        }
    });

    tokio::select! {
        _ = main_loop(engine, config.tick) => {}
        _ = &mut rx => {
            info!("Program terminated by user. Exiting gracefully.");
        }
    }

    Ok(())
}
