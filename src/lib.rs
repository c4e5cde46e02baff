//! # sovran-valuemap
//!
//! A thread-safe, dynamically-typed key/value container with coercing accessors.
//!
//! `sovran-valuemap` provides a single container, [`TypedMap`], for passing data
//! between components that don't share a static schema: request contexts,
//! configuration blobs, decoded JSON payloads. The same logical value may show
//! up as text, as a number or as a native type depending on where it came from;
//! the `get_*` accessors apply one consistent, best-effort conversion policy so
//! callers never have to branch on how a value was written.
//!
//! ## Key Features
//!
//! - **Thread-safe**: Built on `RwLock<HashMap<_>>`; share it behind an `Arc`
//! - **Never-failing reads**: Missing or unconvertible values read as zero values
//! - **Coercion**: Numbers, booleans, text, timestamps and durations convert
//!   into each other following fixed rules
//! - **JSON**: `serde` support plus `to_json` / `load_json` hooks
//!
//! ## Usage Examples
//!
//! ### Basic Usage
//!
//! ```rust
//! use sovran_valuemap::TypedMap;
//!
//! let map = TypedMap::new();
//!
//! // Store values of different types
//! map.set("test_bool", "true");
//! map.set("test_float", 1.2345);
//! map.set("test_int", "12345");
//! map.set("test_time", "1979-09-24T05:35:00Z");
//!
//! // Read them back as whatever type the caller needs
//! assert!(map.get_bool("test_bool"));
//! assert_eq!(map.get_f64("test_float"), 1.2345);
//! assert_eq!(map.get_i64("test_float"), 1);
//! assert_eq!(map.get_i32("test_int"), 12345);
//! assert_eq!(map.get_time("test_time").timestamp(), 306_999_300);
//! assert_eq!(map.get_epoch_millis("test_time"), 306_999_300_000);
//!
//! // Missing keys read as zero values instead of failing
//! assert_eq!(map.get_i64("nonexistent"), 0);
//! assert!(map.get("nonexistent").is_none());
//! ```
//!
//! ### Decoding a JSON Payload
//!
//! ```rust
//! use sovran_valuemap::{MapError, TypedMap};
//!
//! fn main() -> Result<(), MapError> {
//!     let body = br#"{
//!         "user": {"name": "ada", "admin": "1"},
//!         "page": "2",
//!         "timeout": "1m30s"
//!     }"#;
//!
//!     let request = TypedMap::from_json(body)?;
//!
//!     let user = request.get_sub_map("user");
//!     assert_eq!(user.get_string("name"), "ada");
//!     assert!(user.get_bool("admin"));
//!
//!     assert_eq!(request.get_i64("page"), 2);
//!     assert_eq!(request.get_duration("timeout").num_seconds(), 90);
//!
//!     // Write it back out
//!     let encoded = request.to_json()?;
//!     assert!(encoded.contains("\"page\":\"2\""));
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Sharing Between Threads
//!
//! ```rust
//! use sovran_valuemap::TypedMap;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let context = Arc::new(TypedMap::new());
//!
//! let handles: Vec<_> = (0..4)
//!     .map(|worker| {
//!         let context = Arc::clone(&context);
//!         thread::spawn(move || {
//!             context.set(format!("worker_{}", worker), worker * 10);
//!         })
//!     })
//!     .collect();
//!
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//!
//! assert_eq!(context.len(), 4);
//! assert_eq!(context.get_i64("worker_3"), 30);
//! ```
//!
//! ### Error Handling
//!
//! Reads never fail. Decoding is the only operation that can:
//!
//! ```rust
//! use sovran_valuemap::{MapError, TypedMap};
//!
//! let map = TypedMap::new();
//! map.set("kept", 1);
//!
//! match map.load_json(b"[1, 2, 3]") {
//!     Ok(()) => println!("Replaced entries"),
//!     Err(MapError::Decode(e)) => println!("Payload rejected: {}", e),
//!     Err(e) => println!("Other error: {}", e),
//! }
//!
//! // A rejected payload leaves the map as it was
//! assert_eq!(map.get_i64("kept"), 1);
//! ```

mod coerce;
mod error;
mod json;
mod map;
pub mod time;
mod value;

pub use error::MapError;
pub use map::{MergePolicy, TypedMap};
pub use value::Value;
