#![no_main]

use libfuzzer_sys::fuzz_target;
use wlcgsgas::config::PipelineConfig;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Parsing and validation must reject bad input without panicking
        if let Ok(config) = PipelineConfig::from_toml_str(input) {
            let _ = config.collapse_fields();
            if let Some(tiers) = &config.tiers {
                let _ = tiers.splitter();
            }
        }
    }
});
