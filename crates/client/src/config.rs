//! Client configuration.

use std::env;
use std::time::Duration;

use ledger::ContractId;
use url::Url;

use crate::error::ConfigError;

/// Flat fee attached to every envelope unless the config overrides it.
pub const DEFAULT_FEE: u32 = 100;
/// How long a freshly built envelope stays valid on the ledger.
pub const DEFAULT_EXPIRY_WINDOW: Duration = Duration::from_secs(30);
/// Base pause between status polls; a little jitter is added on top.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1500);
/// How long a submission may poll before giving up with a timeout.
pub const DEFAULT_SUBMIT_DEADLINE: Duration = Duration::from_secs(60);
/// Per-request timeout for the HTTP gateway.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

const MAX_EXPIRY_WINDOW: Duration = Duration::from_secs(3600);

/// Everything needed to talk to one contract on one network.
///
/// `new` fills in the defaults above; `from_env` reads `STUDY_LEDGER_*`
/// variables. Either way [`LedgerConfig::validate`] runs when a client is
/// built from the config, so a hand-assembled struct cannot smuggle in a
/// zero poll interval or an empty passphrase.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub contract_id: ContractId,
    pub rpc_url: Url,
    pub network_passphrase: String,
    pub fee: u32,
    pub expiry_window: Duration,
    pub poll_interval: Duration,
    pub submit_deadline: Duration,
    pub http_timeout: Duration,
}

impl LedgerConfig {
    #[must_use]
    pub fn new(contract_id: ContractId, rpc_url: Url, network_passphrase: impl Into<String>) -> Self {
        Self {
            contract_id,
            rpc_url,
            network_passphrase: network_passphrase.into(),
            fee: DEFAULT_FEE,
            expiry_window: DEFAULT_EXPIRY_WINDOW,
            poll_interval: DEFAULT_POLL_INTERVAL,
            submit_deadline: DEFAULT_SUBMIT_DEADLINE,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }

    /// Read the configuration from `STUDY_LEDGER_*` environment variables.
    ///
    /// `STUDY_LEDGER_CONTRACT_ID`, `STUDY_LEDGER_RPC_URL` and
    /// `STUDY_LEDGER_NETWORK_PASSPHRASE` are required; the durations and the
    /// fee fall back to the defaults when unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a required variable is missing or any
    /// variable fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let contract_id = ContractId::new(require("STUDY_LEDGER_CONTRACT_ID")?)?;
        let raw_url = require("STUDY_LEDGER_RPC_URL")?;
        let rpc_url = parse_url("STUDY_LEDGER_RPC_URL", &raw_url)?;
        let network_passphrase = require("STUDY_LEDGER_NETWORK_PASSPHRASE")?;

        let mut config = Self::new(contract_id, rpc_url, network_passphrase);
        if let Some(fee) = optional_u64("STUDY_LEDGER_FEE")? {
            config.fee = u32::try_from(fee).map_err(|_| ConfigError::InvalidVar {
                var: "STUDY_LEDGER_FEE",
                reason: "fee does not fit in u32".into(),
            })?;
        }
        if let Some(secs) = optional_u64("STUDY_LEDGER_EXPIRY_WINDOW_S")? {
            config.expiry_window = Duration::from_secs(secs);
        }
        if let Some(millis) = optional_u64("STUDY_LEDGER_POLL_INTERVAL_MS")? {
            config.poll_interval = Duration::from_millis(millis);
        }
        if let Some(secs) = optional_u64("STUDY_LEDGER_SUBMIT_DEADLINE_S")? {
            config.submit_deadline = Duration::from_secs(secs);
        }
        if let Some(secs) = optional_u64("STUDY_LEDGER_HTTP_TIMEOUT_S")? {
            config.http_timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    /// Check the invariants a usable config must hold.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant as a `ConfigError`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.network_passphrase.trim().is_empty() {
            return Err(ConfigError::EmptyPassphrase);
        }
        if self.fee == 0 {
            return Err(ConfigError::ZeroFee);
        }
        if self.expiry_window.is_zero() || self.expiry_window > MAX_EXPIRY_WINDOW {
            return Err(ConfigError::BadExpiryWindow);
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.submit_deadline < self.poll_interval {
            return Err(ConfigError::ShortDeadline);
        }
        if self.http_timeout.is_zero() {
            return Err(ConfigError::ZeroHttpTimeout);
        }
        Ok(())
    }
}

fn require(var: &'static str) -> Result<String, ConfigError> {
    let value = env::var(var).map_err(|_| ConfigError::MissingVar(var))?;
    if value.trim().is_empty() {
        return Err(ConfigError::MissingVar(var));
    }
    Ok(value)
}

fn parse_url(var: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidVar {
        var,
        reason: e.to_string(),
    })
}

fn optional_u64(var: &'static str) -> Result<Option<u64>, ConfigError> {
    match env::var(var) {
        Ok(raw) => {
            let value = raw.trim().parse().map_err(|_| ConfigError::InvalidVar {
                var,
                reason: format!("{raw:?} is not a non-negative integer"),
            })?;
            Ok(Some(value))
        }
        Err(_) => Ok(None),
    }
}
