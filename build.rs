// build.rs

//! Build script for the textos kernel
//!
//! - checks `x86_64-textos.json` when cargo builds for it
//! - exports the build profile for the boot log (`TEXTOS_BUILD_PROFILE`)

use serde::Deserialize;
use serde::de::{self, Deserializer};
use std::env;
use std::fs;
use std::path::Path;
use std::process::Command;

/// Custom target specification shipped with the kernel
const TARGET_SPEC: &str = "x86_64-textos.json";
/// Target name cargo reports for [`TARGET_SPEC`]
const TARGET_NAME: &str = "x86_64-textos";

/// Fields of the target JSON the kernel depends on
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct TargetSpec {
    arch: String,
    os: String,
    #[serde(deserialize_with = "deserialize_pointer_width")]
    target_pointer_width: u16,
    disable_redzone: bool,
    panic_strategy: String,
}

impl TargetSpec {
    fn check(&self) -> Result<(), String> {
        if self.arch != "x86_64" {
            return Err(format!("arch is '{}', expected 'x86_64'", self.arch));
        }
        if self.target_pointer_width != 64 {
            return Err(format!(
                "target-pointer-width is {}, expected 64",
                self.target_pointer_width
            ));
        }
        // Interrupt handlers run on the kernel stack
        if !self.disable_redzone {
            return Err("disable-redzone must be true".into());
        }
        if self.panic_strategy != "abort" {
            return Err(format!("panic-strategy is '{}', expected 'abort'", self.panic_strategy));
        }
        // Bare-metal modules are gated on target_os = "none"
        if self.os != "none" {
            return Err(format!("os is '{}', expected 'none'", self.os));
        }
        Ok(())
    }
}

/// Newer nightlies emit the pointer width as an integer, older ones as a string
fn deserialize_pointer_width<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PointerWidthRaw {
        Integer(u64),
        Text(String),
    }

    match PointerWidthRaw::deserialize(deserializer)? {
        PointerWidthRaw::Integer(value) => {
            u16::try_from(value).map_err(|_| de::Error::custom("target-pointer-width out of range"))
        }
        PointerWidthRaw::Text(text) => text
            .parse::<u16>()
            .map_err(|_| de::Error::custom(format!("target-pointer-width '{text}' is not a number"))),
    }
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed={TARGET_SPEC}");
    println!("cargo:rerun-if-env-changed=TARGET");

    let profile = env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());
    println!("cargo:rustc-env=TEXTOS_BUILD_PROFILE={profile}");

    // Host builds (`cargo test`) never read the target specification
    if building_for_custom_target() {
        validate_target_spec();
        warn_if_not_nightly();
    }
}

fn building_for_custom_target() -> bool {
    env::var("TARGET").is_ok_and(|target| target == TARGET_NAME || target.ends_with(TARGET_SPEC))
}

fn validate_target_spec() {
    let path = Path::new(TARGET_SPEC);
    let content = fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()));
    let spec: TargetSpec = serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("{TARGET_SPEC} is not a valid target specification: {e}"));

    if let Err(reason) = spec.check() {
        panic!("{TARGET_SPEC}: {reason}");
    }
}

/// `-Zbuild-std` needs a nightly compiler
fn warn_if_not_nightly() {
    let rustc = env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string());
    let version = Command::new(&rustc)
        .arg("--version")
        .output()
        .ok()
        .and_then(|output| String::from_utf8(output.stdout).ok());

    match version.as_deref().map(str::trim) {
        Some(version) if !version.contains("nightly") => {
            println!("cargo:warning=nightly toolchain required for {TARGET_NAME} (found {version})");
        }
        Some(_) => {}
        None => println!("cargo:warning=could not run '{rustc} --version'"),
    }
}
