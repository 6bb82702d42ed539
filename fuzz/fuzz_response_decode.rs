//! Fuzz target for daemon response decoding.
//!
//! Run with: cargo +nightly fuzz run fuzz_response_decode
//!
//! Any body the daemon (or something pretending to be it) sends must decode
//! to a response or a classified error, never a panic.

#![no_main]

use gstc_core::transport::decode_response;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    match decode_response(data) {
        Ok(resp) => assert_eq!(resp.code, 0),
        Err(err) => assert!(err.is_transport() || err.code() != 0),
    }
});
