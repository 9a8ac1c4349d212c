use super::client::RpcClient;
use crate::error::CoreError;
use async_trait::async_trait;
use serde_json::{json, Value};

/// Plain `reqwest` POST of a JSON-RPC 2.0 envelope against a single
/// configured HTTP endpoint.
pub struct NativeRpcClient {
    http: reqwest::Client,
    url: String,
}

impl NativeRpcClient {
    pub fn new(url: String) -> Self {
        NativeRpcClient {
            http: reqwest::Client::new(),
            url,
        }
    }

    async fn post(&self, method: &str, params: Value) -> Result<Value, CoreError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let resp = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| CoreError::classify_provider_message(&e.to_string()))?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(CoreError::RateLimited(format!("{method}: 429")));
        }
        if !resp.status().is_success() {
            let status = resp.status();
            return Err(CoreError::classify_provider_message(&format!(
                "{method}: HTTP {status}"
            )));
        }

        let payload: Value = resp
            .json()
            .await
            .map_err(|e| CoreError::ProviderError(format!("{method}: {e}")))?;

        if let Some(err) = payload.get("error") {
            return Err(CoreError::ProviderError(format!("{method}: {err}")));
        }
        payload
            .get("result")
            .cloned()
            .ok_or_else(|| CoreError::ProviderError(format!("{method}: missing result field")))
    }
}

#[async_trait]
impl RpcClient for NativeRpcClient {
    async fn get_latest_blockhash(&self) -> Result<String, CoreError> {
        let result = self.post("getLatestBlockhash", json!([{"commitment": "confirmed"}])).await?;
        result["value"]["blockhash"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| CoreError::ProviderError("getLatestBlockhash: missing blockhash".into()))
    }

    async fn get_slot(&self) -> Result<u64, CoreError> {
        let result = self.post("getSlot", json!([{"commitment": "confirmed"}])).await?;
        result
            .as_u64()
            .ok_or_else(|| CoreError::ProviderError("getSlot: non-numeric result".into()))
    }

    async fn get_balance(&self, address: &str) -> Result<u64, CoreError> {
        let result = self.post("getBalance", json!([address])).await?;
        result["value"]
            .as_u64()
            .ok_or_else(|| CoreError::ProviderError("getBalance: missing value".into()))
    }

    async fn get_account_info(&self, address: &str) -> Result<Value, CoreError> {
        self.post(
            "getAccountInfo",
            json!([address, {"encoding": "jsonParsed", "commitment": "confirmed"}]),
        )
        .await
    }

    async fn get_transaction(&self, signature: &str) -> Result<Value, CoreError> {
        self.post(
            "getTransaction",
            json!([signature, {"encoding": "jsonParsed", "commitment": "confirmed", "maxSupportedTransactionVersion": 0}]),
        )
        .await
    }

    async fn simulate_transaction(&self, tx_base64: &str) -> Result<Value, CoreError> {
        self.post(
            "simulateTransaction",
            json!([tx_base64, {"encoding": "base64", "commitment": "confirmed"}]),
        )
        .await
    }

    async fn send_transaction(&self, tx_base64: &str) -> Result<String, CoreError> {
        let result = self
            .post(
                "sendTransaction",
                json!([tx_base64, {"encoding": "base64", "preflightCommitment": "confirmed"}]),
            )
            .await?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| CoreError::ProviderError("sendTransaction: non-string result".into()))
    }

    async fn confirm_transaction(&self, signature: &str) -> Result<bool, CoreError> {
        let result = self
            .post("getSignatureStatuses", json!([[signature], {"searchTransactionHistory": true}]))
            .await?;
        let status = &result["value"][0];
        if status.is_null() {
            return Ok(false);
        }
        let confirmed = status["confirmationStatus"]
            .as_str()
            .map(|s| s == "confirmed" || s == "finalized")
            .unwrap_or(false);
        Ok(confirmed && status["err"].is_null())
    }
}
