pub mod amm_pool;
pub mod bonding_curve;
pub mod virtual_pool;

use crate::models::{DecodedEvent, TransactionInfo};

/// Tag assigned by the orchestrator's score-only fallback path, when the
/// scorer alone clears the threshold without a fingerprint match. No single
/// decoder family is implied, so every decoder is tried in turn.
pub const SCORE_ONLY_FALLBACK_TAG: &str = "score_only_fallback";

/// The three decoders are variants of a single capability with one
/// operation, registered by tag.
pub fn decode_by_tag(tag: &str, tx: &TransactionInfo) -> Option<DecodedEvent> {
    match tag {
        "pumpfun_create" | "spl_mint_init" => bonding_curve::decode(tx),
        "raydium_initpool" => amm_pool::decode(tx),
        "meteora_initpool" => virtual_pool::decode(tx),
        SCORE_ONLY_FALLBACK_TAG => bonding_curve::decode(tx)
            .or_else(|| amm_pool::decode(tx))
            .or_else(|| virtual_pool::decode(tx)),
        _ => None,
    }
}
