use crate::error::CoreError;
use crate::models::{Fingerprint, ProgramDescriptor};
use base64::{engine::general_purpose::STANDARD as Base64Engine, Engine};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;

/// Process configuration surface: a single websocket endpoint, a single
/// RPC endpoint, the subscription list, the scoring/fingerprint tables,
/// thresholds, rate limits, and the launchpad's constants.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    pub socket_url: String,
    pub rpc_url: String,

    pub program_subscriptions: Vec<ProgramDescriptor>,
    pub signal_weights: HashMap<String, f64>,
    pub fingerprints: Vec<Fingerprint>,

    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f64,
    #[serde(default = "default_stale_slot_threshold")]
    pub stale_slot_threshold: u64,

    #[serde(default = "default_rpc_rate_limit")]
    pub rpc_rate_limit: f64,
    #[serde(default = "default_rpc_max_retries")]
    pub rpc_max_retries: u32,
    #[serde(default = "default_rpc_retry_delay_ms")]
    pub rpc_retry_delay_ms: u64,

    #[serde(default = "default_socket_message_rate_limit")]
    pub socket_message_rate_limit: f64,

    pub launchpad_program_id: String,
    pub global_fee_vault: String,
    pub config_authority: String,
    pub buy_discriminator_hex: String,

    #[serde(default = "default_amount_in_native")]
    pub amount_in_native: u64,

    #[serde(default)]
    pub dex_priority: Vec<String>,

    #[serde(default)]
    pub wallet_keypair_path: Option<String>,
    #[serde(default)]
    pub wallet_keypair_json: Option<String>,
    #[serde(default)]
    pub wallet_private_key_string: Option<String>,
}

impl Settings {
    pub fn from_file(path: &str) -> Result<Self, CoreError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("SNIPER").separator("__"));
        let cfg = builder.build()?;
        Ok(cfg.try_deserialize()?)
    }

    pub fn save_to_file(&self, path: &str) -> Result<(), CoreError> {
        let toml_string = toml::to_string(self)?;
        std::fs::write(path, toml_string)?;
        Ok(())
    }

    /// Rejects out-of-range values fatally at startup.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.socket_url.is_empty() {
            return Err(CoreError::ConfigInvalid("socket_url must not be empty".into()));
        }
        if self.rpc_url.is_empty() {
            return Err(CoreError::ConfigInvalid("rpc_url must not be empty".into()));
        }
        if self.program_subscriptions.is_empty() {
            return Err(CoreError::ConfigInvalid(
                "program_subscriptions must not be empty".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(CoreError::ConfigInvalid(
                "confidence_threshold must be in (0, 1]".into(),
            ));
        }
        if self.score_threshold < 0.0 {
            return Err(CoreError::ConfigInvalid("score_threshold must be >= 0".into()));
        }
        if self.rpc_rate_limit <= 0.0 {
            return Err(CoreError::ConfigInvalid("rpc_rate_limit must be > 0".into()));
        }
        if self.socket_message_rate_limit <= 0.0 {
            return Err(CoreError::ConfigInvalid(
                "socket_message_rate_limit must be > 0".into(),
            ));
        }
        if self.amount_in_native == 0 {
            return Err(CoreError::ConfigInvalid("amount_in_native must be > 0".into()));
        }
        if self.buy_discriminator_hex.len() != 16 {
            return Err(CoreError::ConfigInvalid(
                "buy_discriminator_hex must encode exactly 8 bytes".into(),
            ));
        }
        Ok(())
    }

    pub fn buy_discriminator(&self) -> Result<[u8; 8], CoreError> {
        let bytes = hex::decode(&self.buy_discriminator_hex)
            .map_err(|e| CoreError::ConfigInvalid(format!("invalid buy_discriminator_hex: {e}")))?;
        bytes
            .try_into()
            .map_err(|_| CoreError::ConfigInvalid("buy_discriminator_hex must be 8 bytes".into()))
    }
}

/// Read a base64-encoded keypair from the given env var.
pub fn load_keypair_from_env_var(var: &str) -> Option<Vec<u8>> {
    let s = env::var(var).ok()?;
    match Base64Engine.decode(&s) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            log::warn!("failed to decode {var}: {e}");
            None
        }
    }
}

/// Parse a private key string in base58, JSON-array, or CSV form.
pub fn parse_private_key_string(s: &str) -> Result<Vec<u8>, String> {
    let trimmed = s.trim();

    if trimmed.len() >= 80 && !trimmed.starts_with('[') && !trimmed.contains(',') {
        return bs58::decode(trimmed)
            .into_vec()
            .map_err(|e| format!("base58 decode failed: {e}"));
    }

    if trimmed.starts_with('[') {
        return serde_json::from_str::<Vec<u8>>(trimmed).map_err(|e| format!("JSON parse failed: {e}"));
    }

    if trimmed.contains(',') {
        let parts: Result<Vec<u8>, _> = trimmed.split(',').map(|s| s.trim().parse::<u8>()).collect();
        return parts.map_err(|e| format!("CSV parse failed: {e}"));
    }

    Err("unrecognized private key format: expected base58, JSON array, or comma-separated bytes".into())
}

fn default_confidence_threshold() -> f64 {
    0.7
}
fn default_score_threshold() -> f64 {
    1.0
}
fn default_stale_slot_threshold() -> u64 {
    50
}
fn default_rpc_rate_limit() -> f64 {
    10.0
}
fn default_rpc_max_retries() -> u32 {
    5
}
fn default_rpc_retry_delay_ms() -> u64 {
    500
}
fn default_socket_message_rate_limit() -> f64 {
    50.0
}
fn default_amount_in_native() -> u64 {
    10_000_000
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FingerprintLogic;

    fn sample() -> Settings {
        Settings {
            socket_url: "wss://example".into(),
            rpc_url: "https://example".into(),
            program_subscriptions: vec![ProgramDescriptor {
                id: 1,
                label: "pumpfun".into(),
                address: "6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P".into(),
            }],
            signal_weights: HashMap::new(),
            fingerprints: vec![Fingerprint {
                tag: "pumpfun_create".into(),
                required_instructions: vec!["create".into()],
                required_programs: vec!["6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P".into()],
                logic: FingerprintLogic::And,
                min_score: 1.0,
                confidence: 0.94,
            }],
            confidence_threshold: default_confidence_threshold(),
            score_threshold: default_score_threshold(),
            stale_slot_threshold: default_stale_slot_threshold(),
            rpc_rate_limit: default_rpc_rate_limit(),
            rpc_max_retries: default_rpc_max_retries(),
            rpc_retry_delay_ms: default_rpc_retry_delay_ms(),
            socket_message_rate_limit: default_socket_message_rate_limit(),
            launchpad_program_id: "6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P".into(),
            global_fee_vault: "CebN5WGQ4jvEPvsVU4EoHEpgzq1VV7AbicfhtW4xC9iM".into(),
            config_authority: "GThUX1Atko4tqhN2NaiTazWSeFWMuiUvfFnyJyUghFMJ".into(),
            buy_discriminator_hex: "66063d1201daebea".into(),
            amount_in_native: default_amount_in_native(),
            dex_priority: vec![],
            wallet_keypair_path: None,
            wallet_keypair_json: None,
            wallet_private_key_string: None,
        }
    }

    #[test]
    fn validates_good_settings() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn rejects_empty_subscriptions() {
        let mut s = sample();
        s.program_subscriptions.clear();
        assert!(s.validate().is_err());
    }

    #[test]
    fn rejects_bad_discriminator_length() {
        let mut s = sample();
        s.buy_discriminator_hex = "abcd".into();
        assert!(s.validate().is_err());
    }

    #[test]
    fn decodes_discriminator_hex() {
        let s = sample();
        assert_eq!(s.buy_discriminator().unwrap(), [0x66, 0x06, 0x3d, 0x12, 0x01, 0xda, 0xeb, 0xea]);
    }

    #[test]
    fn parses_csv_private_key() {
        let bytes = parse_private_key_string("1,2,3").unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
    }
}
