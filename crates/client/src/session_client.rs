//! Public facade wiring configuration, gateway and services together.

use std::sync::Arc;

use ledger::{HttpGateway, Keypair, LedgerGateway, NetworkInfo, TransactionBuilder};
use study_core::Clock;
use study_core::model::{
    CourseId, ProgressSummary, SessionDraft, SessionId, SessionRecord, StudentAddress,
};

use crate::config::LedgerConfig;
use crate::error::{ClientError, ConfigError};
use crate::query::QueryService;
use crate::sequence::SequenceAllocator;
use crate::submission::SubmissionService;

/// A connected client for one contract on one network.
///
/// Construction is the only fallible phase: the config is validated and the
/// endpoint must answer a network-info handshake with the configured
/// passphrase. After that every method either succeeds or returns a
/// [`ClientError`] describing exactly what went wrong.
pub struct SessionClient {
    config: LedgerConfig,
    network: NetworkInfo,
    submission: SubmissionService,
    queries: QueryService,
}

impl std::fmt::Debug for SessionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionClient")
            .field("config", &self.config)
            .field("network", &self.network)
            .finish_non_exhaustive()
    }
}

impl SessionClient {
    /// Connect to an HTTP ledger endpoint.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Config` when the config fails validation, the
    /// endpoint is unreachable, or it serves a different network.
    pub async fn connect(config: LedgerConfig) -> Result<Self, ClientError> {
        let gateway = HttpGateway::with_timeout(config.rpc_url.clone(), config.http_timeout)
            .map_err(|e| ConfigError::Handshake(e.to_string()))?;
        Self::with_gateway(config, Arc::new(gateway), Clock::default_clock()).await
    }

    /// Connect through an arbitrary gateway and clock.
    ///
    /// This is how tests run the full workflow against an in-memory ledger
    /// with deterministic time.
    ///
    /// # Errors
    ///
    /// Same conditions as [`SessionClient::connect`].
    pub async fn with_gateway(
        config: LedgerConfig,
        gateway: Arc<dyn LedgerGateway>,
        clock: Clock,
    ) -> Result<Self, ClientError> {
        config.validate()?;

        let network = gateway
            .network_info()
            .await
            .map_err(|e| ConfigError::Handshake(e.to_string()))?;
        if network.passphrase != config.network_passphrase {
            return Err(ConfigError::PassphraseMismatch {
                expected: config.network_passphrase.clone(),
                got: network.passphrase,
            }
            .into());
        }

        // validate() caps the window at one hour, well inside chrono range
        let expiry_window = chrono::Duration::from_std(config.expiry_window)
            .map_err(|_| ConfigError::BadExpiryWindow)?;
        let builder = TransactionBuilder::new(
            config.contract_id.clone(),
            config.fee,
            expiry_window,
            clock,
        );

        let sequences = Arc::new(SequenceAllocator::new(Arc::clone(&gateway)));
        let submission = SubmissionService::new(
            Arc::clone(&gateway),
            sequences,
            builder,
            config.network_passphrase.clone(),
            config.poll_interval,
            config.submit_deadline,
            clock,
        );
        let queries = QueryService::new(gateway, config.contract_id.clone());

        tracing::debug!(
            network = %network.passphrase,
            contract = %config.contract_id,
            "client connected"
        );
        Ok(Self {
            config,
            network,
            submission,
            queries,
        })
    }

    #[must_use]
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Network details reported by the endpoint during the handshake.
    #[must_use]
    pub fn network(&self) -> &NetworkInfo {
        &self.network
    }

    /// Record a learning session on the ledger.
    ///
    /// Takes the draft by reference so a caller hitting
    /// [`ClientError::Timeout`] can resubmit the identical draft; the shared
    /// session id makes the retry land on the same logical record.
    ///
    /// # Errors
    ///
    /// See [`SubmissionService::record_session`].
    pub async fn record_session(
        &self,
        draft: &SessionDraft,
        keypair: &Keypair,
    ) -> Result<SessionRecord, ClientError> {
        self.submission.record_session(draft, keypair).await
    }

    /// Fetch a single session record by id.
    ///
    /// # Errors
    ///
    /// [`ClientError::NotFound`] when no session exists under `id`.
    pub async fn get_session(&self, id: SessionId) -> Result<SessionRecord, ClientError> {
        self.queries.get_session(id).await
    }

    /// Aggregate one student's progress in one course.
    ///
    /// # Errors
    ///
    /// See [`QueryService::get_student_progress`].
    pub async fn get_student_progress(
        &self,
        student: &StudentAddress,
        course_id: &CourseId,
    ) -> Result<ProgressSummary, ClientError> {
        self.queries.get_student_progress(student, course_id).await
    }

    /// List a student's session ids in one course, oldest first.
    ///
    /// # Errors
    ///
    /// See [`QueryService::list_student_sessions`].
    pub async fn list_student_sessions(
        &self,
        student: &StudentAddress,
        course_id: &CourseId,
    ) -> Result<Vec<SessionId>, ClientError> {
        self.queries.list_student_sessions(student, course_id).await
    }

    /// Tear the client down. Dropping has the same effect; this makes the
    /// end of a client's life explicit at the call site.
    pub fn close(self) {
        tracing::debug!(contract = %self.config.contract_id, "client closed");
    }
}
