//! Codec module - transformations applied to variable parameter content.
//!
//! - [`Compression`] - optional compression of a parameter before it is
//!   length-prefixed (the prefix covers the compressed size)
//! - [`JsonCodec`] - JSON encoding of structured analytics payloads
//!
//! # Example
//!
//! ```
//! use sas_client::codec::{Compression, JsonCodec};
//!
//! let scheme: Compression = "zstd".parse().unwrap();
//! let packed = scheme.compress(b"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa").unwrap();
//! assert!(packed.len() < 40);
//!
//! let json = JsonCodec::encode(&vec![1, 2, 3]).unwrap();
//! assert_eq!(json, b"[1,2,3]");
//! ```

mod compression;
mod json;

pub use compression::{Compression, DEFAULT_ZSTD_LEVEL};
pub use json::JsonCodec;
