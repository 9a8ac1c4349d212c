use crate::backoff;
use crate::error::CoreError;
use crate::rate_limiter::RateLimiter;
use crate::rpc::RpcClient;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

const TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

/// `validate(address)` memoized for process lifetime, rate-limited.
/// Validation is advisory, the orchestrator may proceed even on `false`.
pub struct MintValidator {
    rpc: Arc<dyn RpcClient>,
    limiter: Arc<RateLimiter>,
    max_retries: u32,
    cache: RwLock<HashMap<String, bool>>,
}

impl MintValidator {
    pub fn new(rpc: Arc<dyn RpcClient>, limiter: Arc<RateLimiter>, max_retries: u32) -> Self {
        MintValidator {
            rpc,
            limiter,
            max_retries,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub async fn validate(&self, address: &str) -> Result<bool, CoreError> {
        if let Some(cached) = self.cache.read().expect("validator cache poisoned").get(address) {
            return Ok(*cached);
        }

        self.limiter.acquire(1.0).await;
        let rpc = self.rpc.clone();
        let address_owned = address.to_string();
        let result = backoff::run(
            || {
                let rpc = rpc.clone();
                let address = address_owned.clone();
                async move { rpc.get_account_info(&address).await }
            },
            self.max_retries,
            "mintValidator.getAccountInfo",
        )
        .await?;

        let valid = is_mint_account(&result);
        self.cache.write().expect("validator cache poisoned").insert(address.to_string(), valid);
        Ok(valid)
    }
}

fn is_mint_account(account_info: &serde_json::Value) -> bool {
    let value = &account_info["value"];
    let owner_is_token_program = value["owner"].as_str() == Some(TOKEN_PROGRAM_ID);
    let parsed_type_is_mint = value["data"]["parsed"]["type"].as_str() == Some("mint");
    owner_is_token_program && parsed_type_is_mint
}
