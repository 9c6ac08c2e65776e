//! # sas-client
//!
//! Asynchronous client for reporting trail events to a SAS
//! (Service Assurance Server) trace-aggregation server.
//!
//! Applications describe what happens to a unit of work (a call, a
//! request) as a *trail* of events and markers. The client frames each
//! message in the SAS binary protocol and delivers it over a single TCP
//! connection.
//!
//! ## Architecture
//!
//! - **Messages** ([`message`]): plain values built with a fluent API and
//!   encoded into frames
//! - **Delivery queue** ([`queue`]): bounded, never blocks the caller,
//!   drops messages under overload
//! - **Worker** ([`worker`]): one tokio task that connects, sends the
//!   handshake, drains the queue, heartbeats while idle and reconnects with
//!   exponential backoff
//!
//! Delivery is at-most-once: a message in flight when the connection fails
//! is dropped.
//!
//! ## Example
//!
//! ```no_run
//! use sas_client::message::{DataMessage, Event, Marker, Scope};
//! use sas_client::{Client, Trail};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sas_client::SasError> {
//!     let mut client = Client::builder("sprout-1", "sprout", "org.projectclearwater", "sas.example.com")
//!         .start()
//!         .await?;
//!
//!     let trail = Trail::next();
//!     client.send(
//!         Marker::new(trail, 0x01000003)
//!             .set_association_scope(Scope::Branch)
//!             .add_variable_param("sip:alice@example.com")?,
//!     );
//!     client.send(Event::new(trail, 0x0001).add_static_param(200)?);
//!
//!     client.stop().await;
//!     Ok(())
//! }
//! ```

pub mod backoff;
pub mod codec;
pub mod config;
pub mod error;
pub mod message;
pub mod protocol;
pub mod queue;
pub mod transport;
pub mod worker;

mod client;
mod trail;

pub use client::{Client, ClientBuilder, MessageSink, RecordingClient};
pub use config::ClientConfig;
pub use error::{Result, SasError};
pub use message::{Message, Scope};
pub use trail::{Trail, TrailAllocator};
pub use worker::ConnectionState;
