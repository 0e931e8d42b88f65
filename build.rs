use std::process::Command;

fn main() {
    println!("cargo:rustc-env=GIT_VERSION={}", git_version());
    println!("cargo:rerun-if-changed=.git/HEAD");
}

fn git_version() -> String {
    let described = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()
        .filter(|out| out.status.success())
        .map(|out| String::from_utf8_lossy(&out.stdout).trim().to_string());

    match described {
        Some(v) => v.strip_prefix('v').unwrap_or(&v).to_string(),
        None => env!("CARGO_PKG_VERSION").to_string(),
    }
}
