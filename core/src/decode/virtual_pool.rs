use crate::models::{DecodedEvent, TransactionInfo};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

static POOL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"pool:\s*(\S+)").unwrap());
static VAULT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"vault:\s*(\S+)").unwrap());
static LIQUIDITY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"liquidity:\s*(\S+)").unwrap());
static NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"name:"([^"]*)""#).unwrap());
static SYMBOL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"symbol:"([^"]*)""#).unwrap());

/// Virtual-pool (Meteora-class) decoder. Any `postTokenBalances` entry with
/// `uiAmount > 0` yields its mint; pool/vault/liquidity/name/symbol are
/// parsed heuristically from log lines when present.
pub fn decode(tx: &TransactionInfo) -> Option<DecodedEvent> {
    let mint = tx
        .post_token_balances
        .iter()
        .find(|balance| balance.ui_amount.unwrap_or(0.0) > 0.0)
        .map(|balance| balance.mint.clone())?;

    let joined = tx.log_messages.join("\n");
    let mut pool_data = BTreeMap::new();
    if let Some(cap) = POOL_RE.captures(&joined) {
        pool_data.insert("pool".to_string(), cap[1].to_string());
    }
    if let Some(cap) = VAULT_RE.captures(&joined) {
        pool_data.insert("vault".to_string(), cap[1].to_string());
    }
    if let Some(cap) = LIQUIDITY_RE.captures(&joined) {
        pool_data.insert("liquidity".to_string(), cap[1].to_string());
    }
    if let Some(cap) = NAME_RE.captures(&joined) {
        pool_data.insert("name".to_string(), cap[1].to_string());
    }
    if let Some(cap) = SYMBOL_RE.captures(&joined) {
        pool_data.insert("symbol".to_string(), cap[1].to_string());
    }

    Some(DecodedEvent {
        mint,
        pool_data: if pool_data.is_empty() { None } else { Some(pool_data) },
        metadata: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TokenBalance;

    #[test]
    fn returns_mint_with_positive_ui_amount() {
        let tx = TransactionInfo {
            post_token_balances: vec![TokenBalance {
                account_index: 0,
                mint: "VirtualMint1".into(),
                ui_amount: Some(10.0),
            }],
            ..Default::default()
        };
        let decoded = decode(&tx).expect("expected a decode");
        assert_eq!(decoded.mint, "VirtualMint1");
    }

    #[test]
    fn parses_pool_fields_from_logs() {
        let tx = TransactionInfo {
            post_token_balances: vec![TokenBalance {
                account_index: 0,
                mint: "VirtualMint1".into(),
                ui_amount: Some(10.0),
            }],
            log_messages: vec![r#"pool: Pool111 vault: Vault111 liquidity: 42 name:"Foo" symbol:"FOO""#.to_string()],
            ..Default::default()
        };
        let decoded = decode(&tx).expect("expected a decode");
        let pool_data = decoded.pool_data.expect("pool data present");
        assert_eq!(pool_data["pool"], "Pool111");
        assert_eq!(pool_data["symbol"], "FOO");
    }

    #[test]
    fn no_positive_balance_yields_none() {
        let tx = TransactionInfo {
            post_token_balances: vec![TokenBalance {
                account_index: 0,
                mint: "Zero".into(),
                ui_amount: Some(0.0),
            }],
            ..Default::default()
        };
        assert!(decode(&tx).is_none());
    }
}
