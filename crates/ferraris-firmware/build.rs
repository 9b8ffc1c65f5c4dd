//! Injects WiFi credentials from `.env` at build time and links the
//! esp-hal memory layout.

const SECRETS: [&str; 2] = ["WIFI_SSID", "WIFI_PASSWORD"];

fn main() {
    println!("cargo:rerun-if-changed=.env");
    for key in SECRETS {
        println!("cargo:rerun-if-env-changed={key}");
    }

    if let Err(e) = dotenvy::dotenv() {
        println!("cargo:warning=No .env loaded ({e}), using the build environment");
    }

    for key in SECRETS {
        let value = std::env::var(key).unwrap_or_else(|_| {
            println!("cargo:warning={key} is not set, the meter will not join a network");
            String::new()
        });
        println!("cargo:rustc-env={key}={value}");
    }

    println!("cargo:rustc-link-arg=-Tlinkall.x");
}
