//! Local host identity.
//!
//! Prefers the longer of `hostname -f` and the first name of `hostname -A`;
//! falls back to the OS-reported hostname when both come back empty.

use tokio::process::Command;

/// Resolve the fully qualified name of this host.
pub async fn resolve_hostname() -> String {
    let fqdn = run_hostname("-f").await.unwrap_or_default();
    let all = run_hostname("-A").await.unwrap_or_default();

    let name = pick_hostname(&fqdn, &all);
    if name.is_empty() {
        let fallback = os_hostname();
        tracing::debug!(hostname = %fallback, "hostname command unavailable, using OS hostname");
        fallback
    } else {
        tracing::info!(hostname = %name, "Resolved hostname");
        name
    }
}

/// Hostname as reported by the OS, `localhost` if even that fails.
pub fn os_hostname() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "localhost".to_string())
}

fn pick_hostname(fqdn: &str, all_names: &str) -> String {
    let fqdn = fqdn.trim();
    let first = all_names.split_whitespace().next().unwrap_or("");
    if first.len() > fqdn.len() {
        first.to_string()
    } else {
        fqdn.to_string()
    }
}

async fn run_hostname(flag: &str) -> Option<String> {
    match Command::new("hostname").arg(flag).output().await {
        Ok(output) if output.status.success() => {
            Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
        }
        Ok(output) => {
            tracing::debug!(flag, status = %output.status, "hostname exited unsuccessfully");
            None
        }
        Err(e) => {
            tracing::debug!(flag, error = %e, "Failed to run hostname");
            None
        }
    }
}
