use std::env;

fn main() {
    // Version string shown by --version
    let version = env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "unknown".to_string());
    println!("cargo:rustc-env=BUTTERFLY_VERSION={version}");

    println!("cargo:rerun-if-changed=Cargo.toml");
}
