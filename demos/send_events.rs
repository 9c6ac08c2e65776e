//! Send a short trail of events to a SAS server.
//!
//! # Running
//!
//! ```text
//! RUST_LOG=sas_client=debug cargo run --example send_events -- sas.example.com
//! ```
//!
//! Without an argument the demo connects to `127.0.0.1`. With no server
//! listening it keeps retrying in the background while messages queue up,
//! which is visible in the logs.

use std::time::Duration;

use sas_client::message::{Analytics, AnalyticsFormat, DataMessage, Event, Marker, TrailAssoc};
use sas_client::{Client, Scope, Trail};
use serde::Serialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Well-known marker IDs for calling and called party.
const MARKER_CALLING_DN: u32 = 0x0100_0006;
const MARKER_CALLED_DN: u32 = 0x0100_0007;

const EVENT_CALL_STARTED: u32 = 0x0001;
const EVENT_CALL_ANSWERED: u32 = 0x0002;

#[derive(Serialize)]
struct CallSummary<'a> {
    caller: &'a str,
    callee: &'a str,
    duration_ms: u64,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let server = std::env::args().nth(1).unwrap_or_else(|| "127.0.0.1".into());
    let mut client = Client::builder("demo-1", "demo", "org.example.demo", server)
        .resource_version("1.0")
        .start()
        .await?;

    let trail = Trail::next();
    client.send(
        Marker::new(trail, MARKER_CALLING_DN)
            .set_association_scope(Scope::Branch)
            .add_variable_param("sip:alice@example.com")?,
    );
    client.send(
        Marker::new(trail, MARKER_CALLED_DN)
            .set_association_scope(Scope::Branch)
            .add_variable_param("sip:bob@example.com")?,
    );
    client.send(
        Event::new(trail, EVENT_CALL_STARTED)
            .set_instance_id(1)
            .add_static_params([180, 200])?
            .add_variable_param("INVITE")?,
    );

    let forked = Trail::next();
    client.send(TrailAssoc::new(trail, forked, Scope::Trace));
    client.send(Event::new(forked, EVENT_CALL_ANSWERED).add_static_param(200)?);

    client.send(
        Analytics::new(
            trail,
            EVENT_CALL_ANSWERED,
            AnalyticsFormat::Json,
            "call-summary",
            "demo-call",
        )?
        .set_store(true)
        .add_json_param(&CallSummary {
            caller: "alice",
            callee: "bob",
            duration_ms: 1_250,
        })?,
    );

    tokio::time::sleep(Duration::from_secs(3)).await;
    tracing::info!(
        state = %client.connection_state(),
        pending = client.pending(),
        "Demo finished"
    );
    client.stop().await;
    Ok(())
}
