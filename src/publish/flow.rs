//! Resolve / sign / submit / verify for one remote service.

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::broadcast;

use crate::config::TimingConfig;
use crate::http::RemoteError;
use crate::lifecycle::wait_for_shutdown;
use crate::observability::metrics;
use crate::publish::error::{PublishError, PublishResult};
use crate::publish::types::{
    Destination, IdempotencyKey, OutboundMessage, Receipt, ResolvedDestination, SubmissionResult,
    SubmissionStatus,
};
use crate::signing::{MessageSigner, Signature, SigningDomain};

/// A service that accepts signed writes and can be re-queried for them.
///
/// Implementations only build requests and interpret responses; ordering and
/// the verification policy live in [`Publisher`].
#[async_trait]
pub trait RemoteService: Send + Sync {
    /// Unsigned request body, ready for signing.
    type Draft: Send + Sync;

    /// Short name used in logs, metrics and errors.
    fn name(&self) -> &'static str;

    /// Key family this service accepts.
    fn signing_domain(&self) -> SigningDomain;

    /// Look the destination up. Unknown destinations are `PublishError::Unresolved`.
    async fn resolve(&self, destination: &Destination) -> PublishResult<ResolvedDestination>;

    /// Build the request body for `message`.
    fn draft(&self, message: &OutboundMessage, target: &ResolvedDestination) -> PublishResult<Self::Draft>;

    /// Bytes the signer signs.
    fn signing_payload(&self, draft: &Self::Draft) -> Vec<u8>;

    /// Send the signed draft once.
    async fn submit(
        &self,
        draft: &Self::Draft,
        signature: &Signature,
        idempotency_key: &IdempotencyKey,
    ) -> PublishResult<Receipt>;

    /// Whether the item with `id` is visible yet.
    async fn lookup(&self, id: &str) -> Result<bool, RemoteError>;
}

/// Drives a [`RemoteService`] with a [`MessageSigner`].
pub struct Publisher<R, S> {
    remote: R,
    signer: S,
    verify_delay: Duration,
}

impl<R, S> Publisher<R, S>
where
    R: RemoteService,
    S: MessageSigner,
{
    pub fn new(remote: R, signer: S, timing: &TimingConfig) -> Self {
        Self {
            remote,
            signer,
            verify_delay: timing.verify_delay(),
        }
    }

    pub fn with_verify_delay(mut self, delay: Duration) -> Self {
        self.verify_delay = delay;
        self
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Validate, resolve, sign and submit. Does not verify.
    pub async fn submit(&self, message: &OutboundMessage) -> PublishResult<SubmissionResult> {
        let service = self.remote.name();
        message.validate()?;

        let expected = self.remote.signing_domain();
        let actual = self.signer.domain();
        if expected != actual {
            return Err(PublishError::SignerMismatch { service, expected, actual });
        }

        let target = self.remote.resolve(&message.destination).await?;
        tracing::debug!(
            service,
            destination = %message.destination,
            target = %target.target,
            "Destination resolved"
        );

        let draft = self.remote.draft(message, &target)?;
        let payload = self.remote.signing_payload(&draft);
        let signature = self.signer.sign(&payload).await?;

        let receipt = match self
            .remote
            .submit(&draft, &signature, &message.idempotency_key)
            .await
        {
            Ok(receipt) => receipt,
            Err(e) => {
                metrics::record_submission(service, "rejected");
                tracing::warn!(service, status = ?e.status(), error = %e, "Submission failed");
                return Err(e);
            }
        };

        let status = if receipt.acknowledged {
            SubmissionStatus::Accepted
        } else {
            SubmissionStatus::PendingUnknown
        };
        metrics::record_submission(
            service,
            match status {
                SubmissionStatus::Accepted => "accepted",
                SubmissionStatus::PendingUnknown => "pending_unknown",
            },
        );
        tracing::info!(
            service,
            id = %receipt.id,
            idempotency_key = %message.idempotency_key,
            ?status,
            "Submitted"
        );

        Ok(SubmissionResult {
            id: receipt.id,
            status,
            verified: false,
            idempotency_key: message.idempotency_key,
            target,
        })
    }

    /// Re-query the service for a submitted item.
    ///
    /// Never fails: a lookup error leaves `verified` false.
    pub async fn verify(&self, mut result: SubmissionResult) -> SubmissionResult {
        let service = self.remote.name();
        result.verified = match self.remote.lookup(&result.id).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(service, id = %result.id, error = %e, "Verification lookup failed");
                false
            }
        };
        metrics::record_verification(service, result.verified);
        if !result.verified {
            tracing::info!(service, id = %result.id, "Submitted but not yet visible");
        }
        result
    }

    /// Submit, wait the verify delay, verify once.
    pub async fn publish(&self, message: &OutboundMessage) -> PublishResult<SubmissionResult> {
        self.publish_with(message, None).await
    }

    /// Like [`publish`](Self::publish), but a shutdown during the verify
    /// delay skips verification and returns the unverified result.
    pub async fn publish_until(
        &self,
        message: &OutboundMessage,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> PublishResult<SubmissionResult> {
        self.publish_with(message, Some(shutdown)).await
    }

    async fn publish_with(
        &self,
        message: &OutboundMessage,
        shutdown: Option<&mut broadcast::Receiver<()>>,
    ) -> PublishResult<SubmissionResult> {
        let result = self.submit(message).await?;
        if !self.verify_delay.is_zero() {
            tokio::select! {
                biased;
                _ = wait_for_shutdown(shutdown) => {
                    tracing::info!(service = self.remote.name(), id = %result.id, "Interrupted before verification");
                    return Ok(result);
                }
                _ = tokio::time::sleep(self.verify_delay) => {}
            }
        }
        Ok(self.verify(result).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Shutdown;
    use crate::signing::SigningError;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Calls {
        resolve: AtomicUsize,
        sign: AtomicUsize,
        submit: AtomicUsize,
        lookup: AtomicUsize,
    }

    /// In-memory service that dedups by idempotency key.
    struct FakeRemote {
        calls: Calls,
        items: Mutex<HashMap<IdempotencyKey, String>>,
        next_id: &'static str,
        visible: AtomicBool,
        reject_with: Option<u16>,
        known_channels: Vec<&'static str>,
    }

    impl FakeRemote {
        fn new() -> Self {
            Self {
                calls: Calls::default(),
                items: Mutex::new(HashMap::new()),
                next_id: "abc",
                visible: AtomicBool::new(false),
                reject_with: None,
                known_channels: vec!["42"],
            }
        }
    }

    #[async_trait]
    impl RemoteService for FakeRemote {
        type Draft = String;

        fn name(&self) -> &'static str {
            "fake"
        }

        fn signing_domain(&self) -> SigningDomain {
            SigningDomain::Content
        }

        async fn resolve(&self, destination: &Destination) -> PublishResult<ResolvedDestination> {
            self.calls.resolve.fetch_add(1, Ordering::SeqCst);
            match destination {
                Destination::Channel(id) if self.known_channels.contains(&id.as_str()) => {
                    Ok(ResolvedDestination {
                        destination: destination.clone(),
                        target: format!("https://example.com/channel/{}", id),
                        label: None,
                    })
                }
                other => Err(PublishError::Unresolved {
                    destination: other.to_string(),
                    reason: "not found".to_string(),
                }),
            }
        }

        fn draft(&self, message: &OutboundMessage, target: &ResolvedDestination) -> PublishResult<String> {
            Ok(format!("{}|{}", target.target, message.content))
        }

        fn signing_payload(&self, draft: &String) -> Vec<u8> {
            draft.as_bytes().to_vec()
        }

        async fn submit(
            &self,
            _draft: &String,
            signature: &Signature,
            idempotency_key: &IdempotencyKey,
        ) -> PublishResult<Receipt> {
            assert!(!signature.bytes.is_empty());
            self.calls.submit.fetch_add(1, Ordering::SeqCst);
            if let Some(status) = self.reject_with {
                return Err(RemoteError::Rejected {
                    service: "fake",
                    status,
                    body: "{\"error\":\"unauthorized\"}".to_string(),
                }
                .into());
            }
            let mut items = self.items.lock().unwrap();
            let id = items
                .entry(*idempotency_key)
                .or_insert_with(|| self.next_id.to_string())
                .clone();
            Ok(Receipt { id, acknowledged: true })
        }

        async fn lookup(&self, id: &str) -> Result<bool, RemoteError> {
            self.calls.lookup.fetch_add(1, Ordering::SeqCst);
            let stored = self.items.lock().unwrap().values().any(|v| v == id);
            Ok(stored && self.visible.load(Ordering::SeqCst))
        }
    }

    struct FakeSigner<'a> {
        domain: SigningDomain,
        fail: bool,
        calls: &'a AtomicUsize,
    }

    #[async_trait]
    impl MessageSigner for FakeSigner<'_> {
        fn domain(&self) -> SigningDomain {
            self.domain
        }

        async fn sign(&self, payload: &[u8]) -> Result<Signature, SigningError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SigningError::Failed {
                    domain: self.domain,
                    reason: "device unavailable".to_string(),
                });
            }
            Ok(Signature {
                domain: self.domain,
                bytes: payload.iter().rev().copied().collect(),
                signer: vec![1; 32],
            })
        }
    }

    fn publisher<'a>(remote: FakeRemote, sign_calls: &'a AtomicUsize, fail: bool) -> Publisher<FakeRemote, FakeSigner<'a>> {
        let signer = FakeSigner {
            domain: SigningDomain::Content,
            fail,
            calls: sign_calls,
        };
        Publisher::new(remote, signer, &TimingConfig::default()).with_verify_delay(Duration::ZERO)
    }

    fn hello() -> OutboundMessage {
        OutboundMessage::new("hello", "channel:42".parse().unwrap())
    }

    #[tokio::test]
    async fn test_submit_then_verify_scenario() {
        let sign_calls = AtomicUsize::new(0);
        let publisher = publisher(FakeRemote::new(), &sign_calls, false);

        let result = publisher.publish(&hello()).await.unwrap();
        assert_eq!(result.id, "abc");
        assert!(!result.verified);
        assert_eq!(result.status, SubmissionStatus::Accepted);

        publisher.remote().visible.store(true, Ordering::SeqCst);
        let result = publisher.verify(result).await;
        assert_eq!(result.id, "abc");
        assert!(result.verified);
    }

    #[tokio::test]
    async fn test_resubmission_with_same_key_is_deduplicated() {
        let sign_calls = AtomicUsize::new(0);
        let mut remote = FakeRemote::new();
        remote.next_id = "first";
        let publisher = publisher(remote, &sign_calls, false);

        let message = hello();
        let first = publisher.submit(&message).await.unwrap();
        let retry = publisher.submit(&message).await.unwrap();

        assert_eq!(first.id, retry.id);
        assert_eq!(first.idempotency_key, retry.idempotency_key);
        assert_eq!(publisher.remote().items.lock().unwrap().len(), 1);
        assert_eq!(publisher.remote().calls.submit.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_signing_failure_prevents_submit() {
        let sign_calls = AtomicUsize::new(0);
        let publisher = publisher(FakeRemote::new(), &sign_calls, true);

        let err = publisher.publish(&hello()).await.unwrap_err();
        assert!(matches!(err, PublishError::Signing(_)));
        assert_eq!(sign_calls.load(Ordering::SeqCst), 1);
        assert_eq!(publisher.remote().calls.submit.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unresolved_destination_prevents_signing() {
        let sign_calls = AtomicUsize::new(0);
        let publisher = publisher(FakeRemote::new(), &sign_calls, false);

        let message = OutboundMessage::new("hello", "channel:nope".parse().unwrap());
        let err = publisher.publish(&message).await.unwrap_err();
        assert!(matches!(err, PublishError::Unresolved { .. }));
        assert_eq!(publisher.remote().calls.resolve.load(Ordering::SeqCst), 1);
        assert_eq!(sign_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rejection_skips_verification() {
        let sign_calls = AtomicUsize::new(0);
        let mut remote = FakeRemote::new();
        remote.reject_with = Some(401);
        let publisher = publisher(remote, &sign_calls, false);

        let err = publisher.publish(&hello()).await.unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert_eq!(publisher.remote().calls.lookup.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_wrong_signing_domain_is_config_error() {
        let sign_calls = AtomicUsize::new(0);
        let signer = FakeSigner {
            domain: SigningDomain::Wallet,
            fail: false,
            calls: &sign_calls,
        };
        let publisher = Publisher::new(FakeRemote::new(), signer, &TimingConfig::default());

        let err = publisher.submit(&hello()).await.unwrap_err();
        assert!(err.is_config());
        assert!(matches!(err, PublishError::SignerMismatch { .. }));
        assert_eq!(publisher.remote().calls.resolve.load(Ordering::SeqCst), 0);
        assert_eq!(sign_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_message_fails_before_network() {
        let sign_calls = AtomicUsize::new(0);
        let publisher = publisher(FakeRemote::new(), &sign_calls, false);

        let message = OutboundMessage::new("", "channel:42".parse().unwrap());
        let err = publisher.publish(&message).await.unwrap_err();
        assert!(err.is_config());
        assert_eq!(publisher.remote().calls.resolve.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_shutdown_during_verify_delay_returns_unverified() {
        let sign_calls = AtomicUsize::new(0);
        let publisher = publisher(FakeRemote::new(), &sign_calls, false).with_verify_delay(Duration::from_secs(60));
        let shutdown = Shutdown::new();
        let mut rx = shutdown.subscribe();
        shutdown.trigger();

        let result = tokio::time::timeout(Duration::from_secs(5), publisher.publish_until(&hello(), &mut rx))
            .await
            .expect("verify delay ignored the shutdown")
            .unwrap();

        assert_eq!(result.id, "abc");
        assert!(!result.verified);
        assert_eq!(publisher.remote().calls.submit.load(Ordering::SeqCst), 1);
        assert_eq!(publisher.remote().calls.lookup.load(Ordering::SeqCst), 0);
    }
}
