//! Binary entry point.
//!
//! One executable, two roles selected by the first argument:
//!
//! - `hearth hub [data-dir]`: run the control hub; HTTP + ingest
//!   listeners, arbitration, relay mirroring, persisted snapshots.
//! - `hearth node`: run the sensor node loop against the simulated bus;
//!   acquisition, signed telemetry, health pings, error LED.
//!
//! On sustained network loss either role exits nonzero after persisting
//! what it can; process supervision handles the restart.

use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use log::{debug, error, info};

use hearth::adapters::sim::{self, SimLink, SimPlatformInfo, SimRelayBoard, SimSensorBus};
use hearth::adapters::{FileStore, MonotonicClock};
use hearth::app::ports::{Clock, ConfigPort, ConnectivityPort};
use hearth::config::{SystemConfig, FIRMWARE_VERSION};
use hearth::connectivity::ReconnectWatchdog;
use hearth::frame::SensorFrame;
use hearth::health::HealthMonitor;
use hearth::hub::server::HubServer;
use hearth::hub::{ControlContext, HubService};
use hearth::indicator::ErrorLed;
use hearth::persist::{PersistedRecord, PersistenceStore};
use hearth::sensors::SensorHub;
use hearth::ticks::Interval;
use hearth::transport::Telemetry;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let role = args.next().unwrap_or_else(|| "hub".to_string());
    let data_dir = args.next().unwrap_or_else(|| "hearth-data".to_string());

    info!("hearth {} starting as {}", FIRMWARE_VERSION, role);

    let store = FileStore::new(&data_dir)
        .with_context(|| format!("opening data directory {data_dir}"))?;
    let config = match ConfigPort::load(&store) {
        Ok(c) => c,
        Err(e) => {
            error!("stored config unusable ({}), using defaults", e);
            SystemConfig::default()
        }
    };
    config
        .validate()
        .map_err(|msg| anyhow::anyhow!("invalid config: {msg}"))?;

    match role.as_str() {
        "hub" => run_hub(config, store),
        "node" => run_node(config),
        other => bail!("unknown role {other:?}, expected \"hub\" or \"node\""),
    }
}

/// The control hub loop: drain inbound connections, advance the timers,
/// mirror the arbitration result to the relays, snapshot when allowed.
fn run_hub(config: SystemConfig, store: FileStore) -> Result<()> {
    let server = HubServer::bind(&config).context("binding hub listeners")?;
    info!(
        "hub listening on {} (http) and {} (ingest)",
        server.http_addr()?,
        server.ingest_addr()?
    );

    let service = HubService::new(&config);
    let mut ctx = ControlContext::new(&config);
    let mut persistence = PersistenceStore::new(store, config.persist_min_interval_ticks);
    let mut relays = SimRelayBoard::default();
    let mut link = SimLink::default();
    let mut watchdog = ReconnectWatchdog::new(config.reconnect_timeout_ms);
    let clock = MonotonicClock::new();

    match persistence.load() {
        Ok(Some(record)) => {
            ctx.overrides = record.overrides;
            ctx.arbiter.restore(record.to_state(), clock.now());
            info!("restored actuator snapshot");
        }
        Ok(None) => info!("no actuator snapshot, starting from defaults"),
        Err(e) => error!("actuator snapshot unusable ({}), starting from defaults", e),
    }

    loop {
        let now = clock.now();

        ctx.links.wifi = link.is_connected();
        if let Err(e) = watchdog.check(&mut link, now) {
            // Unconditional commit: a rate-limited save could drop an
            // override flipped in the last few minutes.
            let record = PersistedRecord::capture(&ctx.overrides, &ctx.state());
            if let Err(pe) = persistence.force_save(&record, now) {
                error!("pre-restart snapshot failed: {}", pe);
            }
            error!("network unrecoverable ({}), restarting", e);
            bail!("restart required: {e}");
        }

        server.poll(&service, &mut ctx, now);
        let state = ctx.arbiter.poll(&ctx.overrides, now);
        sim::apply_state(&mut relays, &state);

        let record = PersistedRecord::capture(&ctx.overrides, &state);
        if let Err(e) = persistence.maybe_save(&record, now, ctx.frame.is_clean()) {
            error!("snapshot commit failed: {}", e);
        }

        thread::sleep(Duration::from_millis(20));
    }
}

/// The sensor node loop: acquire, deliver, report health, blink errors.
///
/// One fast cooperative pass every ~20 ms so the watchdog and the LED
/// pattern clock advance continuously; only the acquire-and-deliver
/// cycle is gated on the sensor interval.
fn run_node(config: SystemConfig) -> Result<()> {
    let mut bus = SimSensorBus::default();
    let mut sensors = SensorHub::new(&config);
    let telemetry = Telemetry::new(&config);
    let mut health = HealthMonitor::new(config.health_interval_secs);
    let mut led = ErrorLed::new();
    let mut link = SimLink::default();
    let mut watchdog = ReconnectWatchdog::new(config.reconnect_timeout_ms);
    let platform = SimPlatformInfo;
    let clock = MonotonicClock::new();

    let mut cycle = Interval::new(config.sensor_interval_ms);
    let mut frame = SensorFrame::quiet(0);
    let mut last_tick = clock.now();
    let mut led_was_on = false;

    loop {
        let now = clock.now();

        if let Err(e) = watchdog.check(&mut link, now) {
            error!("network unrecoverable ({}), restarting", e);
            bail!("restart required: {e}");
        }

        if cycle.ready(now) {
            frame = sensors.acquire(&mut bus, now);

            let signed = telemetry.send(&frame);
            let lined = telemetry.send_line(&frame);
            if !signed.is_delivered() && !lined.is_delivered() {
                info!("frame ts={} not delivered on either channel", frame.timestamp);
            }

            if health.due(now) {
                health.emit(&platform, &frame, now);
            }
        }

        let led_on = led.tick(
            hearth::ticks::ticks_since(now, last_tick),
            frame.dht_error,
            frame.ultrasonic_error,
        );
        if led_on != led_was_on {
            debug!("error led {}", if led_on { "on" } else { "off" });
            led_was_on = led_on;
        }
        last_tick = now;

        thread::sleep(Duration::from_millis(20));
    }
}
