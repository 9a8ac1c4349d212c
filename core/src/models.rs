use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Configuration-time constant: a subscription target and telemetry key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgramDescriptor {
    pub id: u64,
    pub label: String,
    pub address: String,
}

/// Combinator logic for a fingerprint's required-instruction test.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum FingerprintLogic {
    And,
    Or,
    Fuzzy,
}

/// A single log record produced by ingest, consumed by the classifier.
/// `signature` may be synthetic (`"slot-<slot>"`) when the feed lacks one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogMessage {
    pub signature: String,
    pub slot: u64,
    pub source_program: String,
    pub lines: Vec<String>,
    pub received_at: DateTime<Utc>,
}

impl LogMessage {
    pub fn joined_text(&self) -> String {
        self.lines.join("\n")
    }
}

/// Read-only, configuration-time predicate over observed instructions and program id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fingerprint {
    pub tag: String,
    pub required_instructions: Vec<String>,
    pub required_programs: Vec<String>,
    pub logic: FingerprintLogic,
    pub min_score: f64,
    pub confidence: f64,
}

/// Where a `TagResult` mint came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MintSource {
    Decoder,
    Fingerprint,
    ScoreFallback,
}

/// Result of classifying one `LogMessage`. `None` is a valid, common outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagResult {
    pub tag: String,
    pub confidence: f64,
    pub mint: Option<String>,
    pub source: MintSource,
}

/// Flattened view of a confirmed transaction as the decoders need it.
#[derive(Debug, Clone, Default)]
pub struct TransactionInfo {
    pub slot: u64,
    pub block_time: Option<i64>,
    pub signature: String,
    pub accounts: Vec<String>,
    pub log_messages: Vec<String>,
    pub pre_token_balances: Vec<TokenBalance>,
    pub post_token_balances: Vec<TokenBalance>,
    pub inner_instructions: Vec<CompiledInstruction>,
    pub compiled_instructions: Vec<CompiledInstruction>,
}

#[derive(Debug, Clone)]
pub struct TokenBalance {
    pub account_index: u32,
    pub mint: String,
    pub ui_amount: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct CompiledInstruction {
    pub program_id: String,
    pub accounts: Vec<String>,
    pub data: Vec<u8>,
}

/// Outcome of a decoder pass.
#[derive(Debug, Clone)]
pub struct DecodedEvent {
    pub mint: String,
    pub pool_data: Option<BTreeMap<String, String>>,
    pub metadata: Option<CreateMetadata>,
}

#[derive(Debug, Clone)]
pub struct CreateMetadata {
    pub name: String,
    pub symbol: String,
    pub uri: String,
    pub bonding_curve: Option<String>,
    pub user: Option<String>,
}

/// Memoized by address; process-lifetime cache entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MintCandidate {
    pub confirmed: bool,
}

/// Inputs to the snipe executor.
pub struct BuyOrder {
    pub payer_secret: [u8; 64],
    pub mint: String,
    pub amount_native: u64,
    pub max_slippage_sentinel: i64,
}

impl BuyOrder {
    pub fn new(payer_secret: [u8; 64], mint: String, amount_native: u64) -> Self {
        BuyOrder {
            payer_secret,
            mint,
            amount_native,
            max_slippage_sentinel: -1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joined_text_concatenates_lines() {
        let msg = LogMessage {
            signature: "sig-A".into(),
            slot: 100,
            source_program: "pumpfun".into(),
            lines: vec!["a".into(), "b".into()],
            received_at: Utc::now(),
        };
        assert_eq!(msg.joined_text(), "a\nb");
    }

    #[test]
    fn buy_order_defaults_slippage_sentinel() {
        let order = BuyOrder::new([0u8; 64], "Mint111".into(), 10_000_000);
        assert_eq!(order.max_slippage_sentinel, -1);
    }
}
