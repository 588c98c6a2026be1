#![no_main]

use libfuzzer_sys::fuzz_target;

// Splits the bytes at the first NUL: chain spec before it, input after.
// Goal: no panics on any spec or input; errors are fine.
fuzz_target!(|data: &[u8]| {
    let (spec, input) = match data.iter().position(|&b| b == 0) {
        Some(i) => (&data[..i], &data[i + 1..]),
        None => (data, &b"{}"[..]),
    };
    let Ok(spec) = serde_json::from_slice::<serde_json::Value>(spec) else {
        return;
    };
    let Ok(input) = serde_json::from_slice::<serde_json::Value>(input) else {
        return;
    };
    if let Ok(chain) = jolt_core::Chainr::from_spec(&spec) {
        let _ = chain.transform(input);
    }
});
