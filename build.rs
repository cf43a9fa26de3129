use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");

    let pkg = std::env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".into());

    // Tag or short hash, with a marker for uncommitted changes. Outside a
    // git checkout (crates.io builds, tarballs) the package version stands
    // alone.
    let version = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty=+"])
        .output()
        .ok()
        .filter(|out| out.status.success())
        .and_then(|out| String::from_utf8(out.stdout).ok())
        .map(|describe| format!("{pkg} [{}]", describe.trim()))
        .unwrap_or(pkg);

    println!("cargo:rustc-env=APP_VERSION={version}");
}
