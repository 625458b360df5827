use async_trait::async_trait;
use menu_relay::inference::{InferenceBackend, InferenceOutcome, Payload};
use mockall::mock;

mock! {
    /// Stand-in for the inference backend used by handler tests
    pub Backend {}

    #[async_trait]
    impl InferenceBackend for Backend {
        async fn forward(&self, payload: Payload) -> InferenceOutcome;
    }
}
