//! Fuzz target for `gstc.toml` parsing.
//!
//! Run with: cargo +nightly fuzz run fuzz_config_parser
//!
//! Any config that parses must also yield a usable daemon address and a bus
//! timeout its own request timeout accepts.

#![no_main]

use gstc_config::AppConfig;
use gstc_core::Address;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(config) = AppConfig::parse(s) else {
        return;
    };

    assert!(config.client.check_bus_timeout(config.bus.timeout_ns).is_ok());
    let address = Address::from_config(&config.daemon);
    assert!(address.url("/pipelines", None, None).starts_with(&address.base()));
});
