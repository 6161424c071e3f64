//! Current user identity
//! The metrics backend scopes product keys by the user's email address.

use crate::config::EMAIL_VAR;
use tokio::process::Command;

/// Resolve the current user's email.
/// Priority: 1. explicit flag, 2. APIUSAGE_EMAIL, 3. `git config user.email`
pub async fn resolve_email(explicit: Option<&str>) -> Option<String> {
    resolve_with(explicit, std::env::var(EMAIL_VAR).ok(), git_email()).await
}

async fn resolve_with<F>(explicit: Option<&str>, env: Option<String>, fallback: F) -> Option<String>
where
    F: std::future::Future<Output = Option<String>>,
{
    if let Some(email) = explicit.and_then(normalize) {
        return Some(email);
    }
    if let Some(email) = env.as_deref().and_then(normalize) {
        return Some(email);
    }
    fallback.await.as_deref().and_then(normalize)
}

async fn git_email() -> Option<String> {
    let output = Command::new("git")
        .args(["config", "--get", "user.email"])
        .output()
        .await
        .ok()?;

    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn normalize(raw: &str) -> Option<String> {
    let email = raw.trim();
    if email.contains('@') && !email.starts_with('@') && !email.ends_with('@') {
        Some(email.to_string())
    } else {
        None
    }
}
