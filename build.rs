//! Stamps build date, build time, compiler identifier and target triple
//! into environment variables consumed by `env!()` in `src/version.rs`.

use std::env;
use std::process::Command;

use time::OffsetDateTime;

fn main() {
    let now = OffsetDateTime::now_utc();

    let date_format =
        time::format_description::parse("[year]-[month]-[day]").expect("invalid date format string");
    let time_format =
        time::format_description::parse("[hour]:[minute]:[second]").expect("invalid time format string");

    println!(
        "cargo:rustc-env=DYNAUDNORM_BUILD_DATE={}",
        now.format(&date_format).expect("could not format build date")
    );
    println!(
        "cargo:rustc-env=DYNAUDNORM_BUILD_TIME={}",
        now.format(&time_format).expect("could not format build time")
    );

    let rustc = env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string());
    let compiler = Command::new(&rustc)
        .arg("--version")
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|version| version.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=DYNAUDNORM_BUILD_COMPILER={compiler}");

    let arch = env::var("TARGET").unwrap_or_else(|_| "unknown".to_string());
    println!("cargo:rustc-env=DYNAUDNORM_BUILD_ARCH={arch}");

    println!("cargo:rerun-if-changed=build.rs");
}
