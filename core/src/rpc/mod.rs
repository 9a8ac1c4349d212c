mod client;
mod native_client;

pub use client::RpcClient;
pub use native_client::NativeRpcClient;

use crate::backoff;
use crate::error::CoreError;
use crate::metrics::RpcMetrics;
use crate::rate_limiter::RateLimiter;
use std::sync::Arc;

/// Wraps a raw `RpcClient` with the rate-limiter/backoff/counter
/// instrumentation every call goes through. One instance is shared across
/// the process.
pub struct InstrumentedRpc<C: RpcClient> {
    inner: C,
    limiter: Arc<RateLimiter>,
    max_retries: u32,
    metrics: Arc<RpcMetrics>,
}

impl<C: RpcClient> InstrumentedRpc<C> {
    pub fn new(inner: C, limiter: Arc<RateLimiter>, max_retries: u32, metrics: Arc<RpcMetrics>) -> Self {
        InstrumentedRpc {
            inner,
            limiter,
            max_retries,
            metrics,
        }
    }

    /// (a) acquire RPC token, (b) run under backoff, (c) emit
    /// attempt/success/error/rate_limited counters keyed by method name.
    async fn call<T, F, Fut>(&self, method: &str, f: F) -> Result<T, CoreError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        self.limiter.acquire(1.0).await;
        self.metrics.record_attempt(method);
        let result = backoff::run(&f, self.max_retries, method).await;
        match &result {
            Ok(_) => self.metrics.record_success(method),
            Err(CoreError::RateLimited(_)) => self.metrics.record_rate_limited(method),
            Err(_) => self.metrics.record_error(method),
        }
        result
    }

    pub async fn get_latest_blockhash(&self) -> Result<String, CoreError> {
        self.call("getLatestBlockhash", || self.inner.get_latest_blockhash()).await
    }

    pub async fn get_slot(&self) -> Result<u64, CoreError> {
        self.call("getSlot", || self.inner.get_slot()).await
    }

    pub async fn get_balance(&self, address: &str) -> Result<u64, CoreError> {
        self.call("getBalance", || self.inner.get_balance(address)).await
    }

    pub async fn get_account_info(&self, address: &str) -> Result<serde_json::Value, CoreError> {
        self.call("getAccountInfo", || self.inner.get_account_info(address)).await
    }

    pub async fn get_transaction(&self, signature: &str) -> Result<serde_json::Value, CoreError> {
        self.call("getTransaction", || self.inner.get_transaction(signature)).await
    }

    pub async fn simulate_transaction(&self, tx_base64: &str) -> Result<serde_json::Value, CoreError> {
        self.call("simulateTransaction", || self.inner.simulate_transaction(tx_base64))
            .await
    }

    pub async fn send_transaction(&self, tx_base64: &str) -> Result<String, CoreError> {
        self.call("sendTransaction", || self.inner.send_transaction(tx_base64)).await
    }

    pub async fn confirm_transaction(&self, signature: &str) -> Result<bool, CoreError> {
        self.call("confirmTransaction", || self.inner.confirm_transaction(signature))
            .await
    }
}

#[async_trait::async_trait]
impl<C: RpcClient> RpcClient for InstrumentedRpc<C> {
    async fn get_latest_blockhash(&self) -> Result<String, CoreError> {
        InstrumentedRpc::get_latest_blockhash(self).await
    }
    async fn get_slot(&self) -> Result<u64, CoreError> {
        InstrumentedRpc::get_slot(self).await
    }
    async fn get_balance(&self, address: &str) -> Result<u64, CoreError> {
        InstrumentedRpc::get_balance(self, address).await
    }
    async fn get_account_info(&self, address: &str) -> Result<serde_json::Value, CoreError> {
        InstrumentedRpc::get_account_info(self, address).await
    }
    async fn get_transaction(&self, signature: &str) -> Result<serde_json::Value, CoreError> {
        InstrumentedRpc::get_transaction(self, signature).await
    }
    async fn simulate_transaction(&self, tx_base64: &str) -> Result<serde_json::Value, CoreError> {
        InstrumentedRpc::simulate_transaction(self, tx_base64).await
    }
    async fn send_transaction(&self, tx_base64: &str) -> Result<String, CoreError> {
        InstrumentedRpc::send_transaction(self, tx_base64).await
    }
    async fn confirm_transaction(&self, signature: &str) -> Result<bool, CoreError> {
        InstrumentedRpc::confirm_transaction(self, signature).await
    }
}
