use crate::error::CoreError;
use async_trait::async_trait;

/// Typed wrapper over JSON-RPC. Implementations perform exactly one
/// provider round trip per call; rate limiting, retries, and counters live
/// in `InstrumentedRpc`, one layer up.
#[async_trait]
pub trait RpcClient: Send + Sync {
    async fn get_latest_blockhash(&self) -> Result<String, CoreError>;
    async fn get_slot(&self) -> Result<u64, CoreError>;
    async fn get_balance(&self, address: &str) -> Result<u64, CoreError>;
    async fn get_account_info(&self, address: &str) -> Result<serde_json::Value, CoreError>;
    async fn get_transaction(&self, signature: &str) -> Result<serde_json::Value, CoreError>;
    async fn simulate_transaction(&self, tx_base64: &str) -> Result<serde_json::Value, CoreError>;
    async fn send_transaction(&self, tx_base64: &str) -> Result<String, CoreError>;
    async fn confirm_transaction(&self, signature: &str) -> Result<bool, CoreError>;
}
