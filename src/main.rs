use chrono::Utc;
use meter_link::{
    Config, ConnectionState, DeviceRegistry, EnergySession, LinkEvent, TelemetryLink,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let cfg_path = std::env::var("APP_CONFIG").unwrap_or_else(|_| "config/config.yaml".into());
    let cfg = Config::load_or_default(&cfg_path)?;
    info!(
        host = %cfg.device.host,
        port = cfg.device.port,
        "starting meter-link"
    );

    let registry = DeviceRegistry::open(&cfg.registry.path);
    match registry.list() {
        Ok(devices) => info!("registry holds {} known device(s)", devices.len()),
        Err(e) => warn!(error = %e, "could not read device registry"),
    }

    let (mut link, mut events) = TelemetryLink::new(cfg.device.host.clone(), cfg.device.port);
    link.connect();

    let mut session = EnergySession::new();

    let sig = tokio::signal::ctrl_c();
    tokio::pin!(sig);
    loop {
        tokio::select! {
            biased;
            _ = &mut sig => {
                info!("shutdown requested");
                break;
            }
            event = events.recv() => {
                match event {
                    Some(LinkEvent::Reading(reading)) => {
                        session.record(reading.power, Utc::now());
                        match session.cost(&cfg.rates) {
                            Ok(cost) => info!(
                                voltage = reading.voltage,
                                current = reading.current,
                                power = reading.power,
                                energy = reading.energy,
                                frequency = reading.frequency,
                                pf = reading.pf,
                                session_kwh = session.energy_kwh(),
                                cost,
                                tier = %session.tier(),
                                "reading"
                            ),
                            Err(e) => warn!(error = %e, "cost calculation failed"),
                        }
                    }
                    Some(LinkEvent::Status(ConnectionState::Connecting)) => {
                        info!("connecting");
                    }
                    Some(LinkEvent::Status(ConnectionState::Connected)) => {
                        info!("connected");
                    }
                    Some(LinkEvent::Status(ConnectionState::Failed(reason))) => {
                        // No automatic reconnect; restart the process to retry.
                        error!(%reason, "connection failed");
                        break;
                    }
                    Some(LinkEvent::Status(ConnectionState::Disconnected)) => {
                        warn!("link disconnected");
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    link.disconnect();
    info!(
        session_kwh = session.energy_kwh(),
        peak_kw = session.peak_kw(),
        "session ended"
    );

    Ok(())
}
