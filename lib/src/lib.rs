//! Library package for live network traffic capture and protocol dissection
//!
//! The library opens a capture device, decodes each captured frame's
//! protocol-layer stack into a normalized summary record, exposes the live
//! sequence of decoded packets through a filterable store, and persists or
//! restores a capture as a compact record list.
//!
//! # Examples
//!
//! ## Live capture
//!
//! <https://github.com/rwiretap/r-wiretap/blob/main/lib/examples/live-capture.rs>
//!
//! ```bash
//! sudo -E cargo run --example live-capture -p r-wirelib
//! ```

#![deny(missing_docs)]
pub mod capture;
pub mod dissect;
pub mod error;
pub mod filter;
pub mod packet;
pub mod session;
pub mod store;
