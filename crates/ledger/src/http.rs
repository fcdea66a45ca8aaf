//! HTTP gateway speaking JSON-RPC 2.0 to a ledger endpoint.
//!
//! One POST endpoint serves five methods: `getNetwork`, `getAccount`,
//! `sendTransaction`, `getTransaction`, and `simulateCall`. Endpoint-level
//! refusals arrive as JSON-RPC error objects and are mapped onto
//! [`GatewayError`]; contract-level outcomes travel inside successful
//! results and never become gateway errors.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use study_core::model::StudentAddress;

use crate::contract::ContractId;
use crate::envelope::{SignedEnvelope, TxHash};
use crate::gateway::{
    GatewayError, LedgerGateway, NetworkInfo, ReadCall, ReadOutcome, SubmitAck,
    TransactionStatus,
};
use crate::value::WireValue;

/// Error codes the endpoint uses for refusals the client reacts to.
mod rpc_code {
    pub const UNKNOWN_ACCOUNT: i64 = 1001;
    pub const BAD_SEQUENCE: i64 = 1002;
    pub const BAD_SIGNATURE: i64 = 1003;
}

/// [`LedgerGateway`] over HTTP.
#[derive(Debug)]
pub struct HttpGateway {
    client: Client,
    endpoint: Url,
    next_id: AtomicU64,
}

impl HttpGateway {
    #[must_use]
    pub fn new(endpoint: Url) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            next_id: AtomicU64::new(1),
        }
    }

    /// Builds a gateway whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Transport` if the HTTP client cannot be
    /// constructed.
    pub fn with_timeout(endpoint: Url, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint,
            next_id: AtomicU64::new(1),
        })
    }

    async fn call<P, R>(
        &self,
        method: &'static str,
        params: P,
    ) -> Result<Result<R, RpcError>, GatewayError>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            if status.is_server_error() {
                return Err(GatewayError::Transport(format!("http status {status}")));
            }
            return Err(GatewayError::Rejected {
                method,
                code: i64::from(status.as_u16()),
                message: format!("http status {status}"),
            });
        }

        let body: RpcResponse<R> = response
            .json()
            .await
            .map_err(|e| GatewayError::Malformed(e.to_string()))?;
        match (body.result, body.error) {
            (Some(result), None) => Ok(Ok(result)),
            (_, Some(error)) => Ok(Err(error)),
            (None, None) => Err(GatewayError::Malformed(format!(
                "{method}: response carries neither result nor error"
            ))),
        }
    }
}

#[async_trait]
impl LedgerGateway for HttpGateway {
    async fn network_info(&self) -> Result<NetworkInfo, GatewayError> {
        let dto: NetworkDto = self
            .call("getNetwork", NoParams {})
            .await?
            .map_err(|e| rejected("getNetwork", e))?;
        Ok(NetworkInfo {
            passphrase: dto.passphrase,
            protocol_version: dto.protocol_version,
        })
    }

    async fn account_sequence(&self, account: &StudentAddress) -> Result<u64, GatewayError> {
        let outcome: Result<AccountDto, RpcError> = self
            .call(
                "getAccount",
                AccountParams {
                    address: account.as_str(),
                },
            )
            .await?;
        match outcome {
            Ok(dto) => Ok(dto.sequence),
            Err(e) if e.code == rpc_code::UNKNOWN_ACCOUNT => {
                Err(GatewayError::UnknownAccount(account.to_string()))
            }
            Err(e) => Err(rejected("getAccount", e)),
        }
    }

    async fn submit(&self, envelope: &SignedEnvelope) -> Result<SubmitAck, GatewayError> {
        tracing::debug!(
            hash = %envelope.hash(),
            source = %envelope.envelope().source(),
            sequence = envelope.envelope().sequence(),
            "submitting envelope"
        );
        let outcome: Result<SubmitDto, RpcError> = self
            .call("sendTransaction", SubmitParams { envelope })
            .await?;
        match outcome {
            Ok(dto) => {
                let hash =
                    TxHash::parse(&dto.hash).map_err(|e| GatewayError::Malformed(e.to_string()))?;
                Ok(SubmitAck { hash })
            }
            Err(e) if e.code == rpc_code::BAD_SIGNATURE => Err(GatewayError::BadSignature),
            Err(e) if e.code == rpc_code::BAD_SEQUENCE => {
                let data = e.data.unwrap_or_default();
                Err(GatewayError::BadSequence {
                    current: data.current.unwrap_or(0),
                    got: data.got.unwrap_or(envelope.envelope().sequence()),
                })
            }
            Err(e) => Err(rejected("sendTransaction", e)),
        }
    }

    async fn transaction_status(&self, hash: &TxHash) -> Result<TransactionStatus, GatewayError> {
        let dto: StatusDto = self
            .call("getTransaction", TxParams { hash: hash.as_str() })
            .await?
            .map_err(|e| rejected("getTransaction", e))?;
        status_from_dto(dto)
    }

    async fn read(
        &self,
        contract: &ContractId,
        call: &ReadCall,
    ) -> Result<ReadOutcome, GatewayError> {
        let dto: ReadDto = self
            .call(
                "simulateCall",
                ReadParams {
                    contract: contract.as_str(),
                    entry_point: call.entry_point().name(),
                    args: call.args(),
                },
            )
            .await?
            .map_err(|e| rejected("simulateCall", e))?;
        read_outcome_from_dto(dto)
    }
}

fn rejected(method: &'static str, error: RpcError) -> GatewayError {
    GatewayError::Rejected {
        method,
        code: error.code,
        message: error.message,
    }
}

fn status_from_dto(dto: StatusDto) -> Result<TransactionStatus, GatewayError> {
    match dto.status.as_str() {
        "pending" => Ok(TransactionStatus::Pending),
        "not_found" => Ok(TransactionStatus::NotFound),
        "success" => {
            let result = dto.result.ok_or_else(|| {
                GatewayError::Malformed("success status without a result".to_string())
            })?;
            Ok(TransactionStatus::Success {
                result,
                applied_at: dto.applied_at.unwrap_or(0),
            })
        }
        "failed" => {
            let code = dto.code.ok_or_else(|| {
                GatewayError::Malformed("failed status without a code".to_string())
            })?;
            Ok(TransactionStatus::Failed {
                code,
                message: dto.message.unwrap_or_default(),
            })
        }
        "expired" => Ok(TransactionStatus::Expired),
        other => Err(GatewayError::Malformed(format!(
            "unknown transaction status {other:?}"
        ))),
    }
}

fn read_outcome_from_dto(dto: ReadDto) -> Result<ReadOutcome, GatewayError> {
    match dto.outcome.as_str() {
        "value" => {
            let value = dto.value.ok_or_else(|| {
                GatewayError::Malformed("value outcome without a value".to_string())
            })?;
            Ok(ReadOutcome::Value(value))
        }
        "void" => Ok(ReadOutcome::Void),
        "failure" => {
            let code = dto.code.ok_or_else(|| {
                GatewayError::Malformed("failure outcome without a code".to_string())
            })?;
            Ok(ReadOutcome::Failure {
                code,
                message: dto.message.unwrap_or_default(),
            })
        }
        other => Err(GatewayError::Malformed(format!(
            "unknown read outcome {other:?}"
        ))),
    }
}

#[derive(Debug, Serialize)]
struct RpcRequest<P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: P,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<R> {
    result: Option<R>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<RpcErrorData>,
}

#[derive(Debug, Default, Deserialize)]
struct RpcErrorData {
    current: Option<u64>,
    got: Option<u64>,
}

#[derive(Debug, Serialize)]
struct NoParams {}

#[derive(Debug, Deserialize)]
struct NetworkDto {
    passphrase: String,
    protocol_version: u32,
}

#[derive(Debug, Serialize)]
struct AccountParams<'a> {
    address: &'a str,
}

#[derive(Debug, Deserialize)]
struct AccountDto {
    sequence: u64,
}

#[derive(Debug, Serialize)]
struct SubmitParams<'a> {
    envelope: &'a SignedEnvelope,
}

#[derive(Debug, Deserialize)]
struct SubmitDto {
    hash: String,
}

#[derive(Debug, Serialize)]
struct TxParams<'a> {
    hash: &'a str,
}

#[derive(Debug, Deserialize)]
struct StatusDto {
    status: String,
    #[serde(default)]
    result: Option<WireValue>,
    #[serde(default)]
    code: Option<u32>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    applied_at: Option<u64>,
}

#[derive(Debug, Serialize)]
struct ReadParams<'a> {
    contract: &'a str,
    entry_point: &'a str,
    args: &'a [WireValue],
}

#[derive(Debug, Deserialize)]
struct ReadDto {
    outcome: String,
    #[serde(default)]
    value: Option<WireValue>,
    #[serde(default)]
    code: Option<u32>,
    #[serde(default)]
    message: Option<String>,
}
