use reqwest::StatusCode;
use serde::Serialize;
use tracing::debug;

/// Paths checked against the backend origin, in report order.
pub const CANDIDATE_PATHS: [&str; 5] = ["/", "/health", "/api/health", "/predict", "/segment"];

/// Best-effort liveness report. Informational only; never gates inference.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeReport {
    pub reachable: bool,
    pub responding_paths: Vec<String>,
}

/// GET every candidate path independently. A path counts as responding if
/// the call succeeds with a 2xx status or 405 (route exists, rejects GET).
/// Transport failures are skipped silently; they only show up as absence.
pub async fn probe_backend(http: &reqwest::Client, origin: &str) -> ProbeReport {
    let checks = CANDIDATE_PATHS.iter().map(|path| async move {
        match http.get(format!("{origin}{path}")).send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() || status == StatusCode::METHOD_NOT_ALLOWED {
                    Some((*path).to_string())
                } else {
                    None
                }
            }
            Err(err) => {
                debug!(path, error = %err, "probe path unreachable");
                None
            }
        }
    });

    let responding_paths: Vec<String> = futures::future::join_all(checks)
        .await
        .into_iter()
        .flatten()
        .collect();

    ProbeReport {
        reachable: !responding_paths.is_empty(),
        responding_paths,
    }
}
