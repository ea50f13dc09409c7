//! ICMP reachability via the system `ping` binary.

use std::process::Stdio;

/// Send one ping to `host` and report whether it answered.
///
/// Execution failures (no `ping` binary, no permission) are logged and
/// treated as unreachable rather than aborting the caller's sweep.
pub async fn is_reachable(host: &str) -> bool {
    let status = tokio::process::Command::new("ping")
        .args(["-c", "1"])
        .arg(host)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    match status {
        Ok(status) => status.success(),
        Err(error) => {
            tracing::warn!(host, %error, "ping execution failed");
            false
        }
    }
}
