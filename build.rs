//! Embeds a build counter and the compile time for `get_status`.

use std::fs;

const COUNTER_FILE: &str = "build_number.txt";

fn main() {
    println!("cargo:rerun-if-changed=src");

    let previous: u64 = fs::read_to_string(COUNTER_FILE)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0);
    let build = previous + 1;
    if let Err(e) = fs::write(COUNTER_FILE, build.to_string()) {
        println!("cargo:warning=could not update {}: {}", COUNTER_FILE, e);
    }

    let compiled = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    println!("cargo:rustc-env=NUTRIEYEQ_BUILD_NUMBER={}", build);
    println!("cargo:rustc-env=NUTRIEYEQ_BUILD_TIMESTAMP={}", compiled);
}
