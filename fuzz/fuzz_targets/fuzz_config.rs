//! Fuzz target: `NodeConfig::from_json`
//!
//! Arbitrary text must either be rejected or yield a configuration that
//! passes validation and builds a usable backoff.
//!
//! cargo fuzz run fuzz_config

#![no_main]

use flowernode::commissioning::backoff::BackoffState;
use flowernode::config::NodeConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    if let Ok(config) = NodeConfig::from_json(text) {
        assert_eq!(config.validate(), Ok(()));
        let mut backoff = BackoffState::from_config(&config);
        for _ in 0..=usize::from(config.rejoin_tries) {
            assert!(backoff.on_failure() <= config.rejoin_max_delay_ms);
        }
    }
});
