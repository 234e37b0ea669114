use crate::client::InferenceClient;
use crate::error::{GatewayError, Result};
use seg_core::{ComparisonResult, ModelVariant, RunMode, RunOutput, SegmentationResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModeKind {
    Single,
    Compare,
}

/// Handle for one orchestration run. The epoch ties the run to the state of
/// the orchestrator at start; the id is only for log correlation.
struct RunToken {
    id: Uuid,
    epoch: u64,
}

#[derive(Default)]
struct Held {
    mode: Option<ModeKind>,
    output: Option<RunOutput>,
}

/// Runs one or two inference calls per user action and composes the outcome.
///
/// Every run captures a token; starting a newer run (or `reset`) invalidates
/// older in-flight runs, so a stale response resolves to `Superseded` rather
/// than surfacing outdated data. Concurrent invocations are not de-duplicated:
/// two racing runs are allowed, the older one simply loses.
pub struct Orchestrator {
    client: InferenceClient,
    epoch: AtomicU64,
    held: Mutex<Held>,
}

impl Orchestrator {
    pub fn new(client: InferenceClient) -> Self {
        Self {
            client,
            epoch: AtomicU64::new(0),
            held: Mutex::new(Held::default()),
        }
    }

    pub fn client(&self) -> &InferenceClient {
        &self.client
    }

    fn begin(&self, kind: ModeKind) -> RunToken {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let mut held = self.held.lock().unwrap();
        // Switching between single and compare discards the opposite
        // mode's held result.
        if held.mode != Some(kind) {
            held.output = None;
            held.mode = Some(kind);
        }
        let token = RunToken {
            id: Uuid::new_v4(),
            epoch,
        };
        debug!(run = %token.id, epoch, "orchestration run started");
        token
    }

    fn commit(&self, token: &RunToken, output: RunOutput) -> Result<()> {
        if self.epoch.load(Ordering::SeqCst) != token.epoch {
            info!(run = %token.id, "run superseded, result discarded");
            return Err(GatewayError::Superseded);
        }
        let mut held = self.held.lock().unwrap();
        held.output = Some(output);
        Ok(())
    }

    pub async fn run(&self, image: &str, mode: RunMode) -> Result<RunOutput> {
        match mode {
            RunMode::Single(variant) => self.single(image, variant).await.map(RunOutput::Single),
            RunMode::Compare => self.compare(image).await.map(RunOutput::Compare),
        }
    }

    pub async fn single(&self, image: &str, variant: ModelVariant) -> Result<SegmentationResult> {
        let token = self.begin(ModeKind::Single);
        let result = self.client.infer(image, variant).await?;
        self.commit(&token, RunOutput::Single(result.clone()))?;
        Ok(result)
    }

    /// Run both variants on the same image. The two calls are issued before
    /// either is awaited and share no data until composition; either failure
    /// fails the whole run, there is no partial comparison.
    pub async fn compare(&self, image: &str) -> Result<ComparisonResult> {
        let token = self.begin(ModeKind::Compare);
        let (unet, unet_mobilenet) = tokio::try_join!(
            self.client.infer(image, ModelVariant::Unet),
            self.client.infer(image, ModelVariant::UnetMobilenet),
        )?;
        let paired = ComparisonResult {
            unet,
            unet_mobilenet,
        };
        self.commit(&token, RunOutput::Compare(paired.clone()))?;
        Ok(paired)
    }

    /// Most recent committed result, if any.
    pub fn last(&self) -> Option<RunOutput> {
        self.held.lock().unwrap().output.clone()
    }

    /// Drop held state and invalidate any in-flight run.
    pub fn reset(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        let mut held = self.held.lock().unwrap();
        held.mode = None;
        held.output = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::testutil;
    use std::sync::Arc;
    use std::time::Duration;

    const IMAGE: &str = "data:image/png;base64,aW1hZ2U=";

    fn orchestrator_for(origin: String) -> Orchestrator {
        Orchestrator::new(InferenceClient::new(&Config::new(origin)).unwrap())
    }

    #[tokio::test]
    async fn compare_pairs_results_by_variant_regardless_of_completion_order() {
        // The unet call is delayed so the mobilenet response lands first.
        let origin = testutil::serve(testutil::mock_backend(None, Some("unet"))).await;
        let orchestrator = orchestrator_for(origin);

        let paired = orchestrator.compare(IMAGE).await.unwrap();
        assert!(paired.unet.segmented_image.ends_with("unet-overlay"));
        assert!(paired
            .unet_mobilenet
            .segmented_image
            .ends_with("unet_mobilenet-overlay"));
        assert!(paired.unet.mask_image.starts_with("data:image/png;base64,"));
    }

    #[tokio::test]
    async fn compare_with_one_failing_variant_fails_whole_run() {
        let origin =
            testutil::serve(testutil::mock_backend(Some("unet_mobilenet"), None)).await;
        let orchestrator = orchestrator_for(origin);

        let err = orchestrator.compare(IMAGE).await.unwrap_err();
        match err {
            GatewayError::Backend { status, details } => {
                assert_eq!(status, 500);
                assert!(details.contains("model exploded"));
            }
            other => panic!("expected Backend error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn single_run_normalizes_and_is_held() {
        let origin = testutil::serve(testutil::mock_backend(None, None)).await;
        let orchestrator = orchestrator_for(origin);

        let result = orchestrator
            .single(IMAGE, ModelVariant::Unet)
            .await
            .unwrap();
        assert_eq!(result.original_image, IMAGE);
        assert_eq!(result.metrics.iou, 0.8);
        assert_eq!(result.processing_time, 0.5);
        assert!(matches!(orchestrator.last(), Some(RunOutput::Single(_))));
    }

    #[tokio::test]
    async fn reset_supersedes_an_in_flight_run() {
        let origin = testutil::serve(testutil::mock_backend(None, Some("unet"))).await;
        let orchestrator = Arc::new(orchestrator_for(origin));

        let in_flight = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.single(IMAGE, ModelVariant::Unet).await })
        };
        tokio::time::sleep(Duration::from_millis(30)).await;
        orchestrator.reset();

        let outcome = in_flight.await.unwrap();
        assert!(matches!(outcome, Err(GatewayError::Superseded)));
        assert!(orchestrator.last().is_none());
    }

    #[tokio::test]
    async fn mode_switch_discards_the_held_result_of_the_other_mode() {
        let origin = testutil::serve(testutil::mock_backend(Some("unet"), None)).await;
        let orchestrator = orchestrator_for(origin);

        orchestrator
            .single(IMAGE, ModelVariant::UnetMobilenet)
            .await
            .unwrap();
        assert!(orchestrator.last().is_some());

        // Compare fails (unet variant 500s), but the mode switch alone has
        // already discarded the single-mode result.
        orchestrator.compare(IMAGE).await.unwrap_err();
        assert!(orchestrator.last().is_none());
    }

    #[tokio::test]
    async fn backend_failure_carries_status_and_body() {
        let origin = testutil::serve(testutil::mock_backend(Some("unet"), None)).await;
        let orchestrator = orchestrator_for(origin);

        let err = orchestrator
            .single(IMAGE, ModelVariant::Unet)
            .await
            .unwrap_err();
        match err {
            GatewayError::Backend { status, details } => {
                assert_eq!(status, 500);
                assert_eq!(details, "model exploded");
            }
            other => panic!("expected Backend error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_failure() {
        let orchestrator = orchestrator_for("http://127.0.0.1:1".to_string());
        let err = orchestrator
            .single(IMAGE, ModelVariant::Unet)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Transport(_)));
    }
}
