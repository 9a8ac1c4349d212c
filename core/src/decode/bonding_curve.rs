use crate::models::{CreateMetadata, DecodedEvent, TransactionInfo};
use base64::{engine::general_purpose::STANDARD as Base64Engine, Engine};

const PROGRAM_DATA_MARKER: &str = "Program data: ";
const MINT_SUFFIX: &str = "pump";
/// The structured "create" event layout is only valid once the decoded
/// buffer reaches this size; shorter buffers fall back to the
/// offset-8/linear-scan strategy.
const STRUCTURED_CREATE_MIN_LEN: usize = 32 + 4 + 200 + 32 + 32 + 32;

/// Bonding-curve launch decoder. Scans `Program data:` log lines, prefers
/// the structured "create" layout when the buffer is long enough,
/// otherwise tries the fixed offset-8 slot, then a linear scan. Returns
/// `None` on failure across every candidate buffer, which the
/// orchestrator treats as `MintNotFound`.
pub fn decode(tx: &TransactionInfo) -> Option<DecodedEvent> {
    for line in &tx.log_messages {
        let Some(encoded) = line.strip_prefix(PROGRAM_DATA_MARKER) else {
            continue;
        };
        let Ok(buffer) = Base64Engine.decode(encoded.trim()) else {
            continue;
        };
        if buffer.len() < 32 {
            continue;
        }

        if let Some((mint, metadata)) = try_structured_create(&buffer) {
            return Some(DecodedEvent {
                mint,
                pool_data: None,
                metadata: Some(metadata),
            });
        }

        if let Some(mint) = try_offset_eight(&buffer).or_else(|| linear_scan(&buffer)) {
            return Some(DecodedEvent {
                mint,
                pool_data: None,
                metadata: None,
            });
        }
    }
    None
}

/// `name[32] || symbol[4] || uri[200] || mint[32] || bondingCurve[32] || user[32]`.
fn try_structured_create(buffer: &[u8]) -> Option<(String, CreateMetadata)> {
    if buffer.len() < STRUCTURED_CREATE_MIN_LEN {
        return None;
    }
    let mut offset = 0;
    let name = strip_nul(&buffer[offset..offset + 32]);
    offset += 32;
    let symbol = strip_nul(&buffer[offset..offset + 4]);
    offset += 4;
    let uri = strip_nul(&buffer[offset..offset + 200]);
    offset += 200;
    let mint = bs58::encode(&buffer[offset..offset + 32]).into_string();
    offset += 32;
    let bonding_curve = bs58::encode(&buffer[offset..offset + 32]).into_string();
    offset += 32;
    let user = bs58::encode(&buffer[offset..offset + 32]).into_string();

    Some((
        mint,
        CreateMetadata {
            name,
            symbol,
            uri,
            bonding_curve: Some(bonding_curve),
            user: Some(user),
        },
    ))
}

fn strip_nul(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).to_string()
}

/// 1. At fixed offset 8, attempt a 32-byte address; accept if its base58
/// form matches the launchpad mint convention (ends with "pump").
fn try_offset_eight(buffer: &[u8]) -> Option<String> {
    if buffer.len() < 8 + 32 {
        return None;
    }
    let candidate = bs58::encode(&buffer[8..40]).into_string();
    mint_address_matches_convention(&candidate).then_some(candidate)
}

/// 2. Otherwise slide a 32-byte window from offset 0 to len-32.
fn linear_scan(buffer: &[u8]) -> Option<String> {
    if buffer.len() < 32 {
        return None;
    }
    for offset in 0..=(buffer.len() - 32) {
        let candidate = bs58::encode(&buffer[offset..offset + 32]).into_string();
        if mint_address_matches_convention(&candidate) {
            return Some(candidate);
        }
    }
    None
}

fn mint_address_matches_convention(address: &str) -> bool {
    address.to_lowercase().ends_with(MINT_SUFFIX)
}

/// ATA of `mint` under `bonding_curve`, allow-owner-off-curve.
pub fn bonding_curve_ata(
    mint: &solana_sdk::pubkey::Pubkey,
    bonding_curve: &solana_sdk::pubkey::Pubkey,
) -> solana_sdk::pubkey::Pubkey {
    spl_associated_token_account::get_associated_token_address_with_program_id(
        bonding_curve,
        mint,
        &spl_token::id(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx_with_log(line: String) -> TransactionInfo {
        TransactionInfo {
            log_messages: vec![line],
            ..Default::default()
        }
    }

    fn pump_mint_bytes() -> [u8; 32] {
        let raw = bs58::decode("11111111111111111111111111pump").into_vec().expect("valid base58");
        raw.try_into().expect("32 bytes")
    }

    #[test]
    fn finds_mint_at_offset_eight() {
        let mut buffer = vec![0u8; 8];
        buffer.extend_from_slice(&pump_mint_bytes());
        let tx = tx_with_log(format!("Program data: {}", Base64Engine.encode(&buffer)));
        let decoded = decode(&tx).expect("expected a decode");
        assert!(decoded.mint.to_lowercase().ends_with("pump"));
    }

    #[test]
    fn linear_scan_finds_mint_not_at_offset_eight() {
        let mut buffer = vec![0u8; 5];
        buffer.extend_from_slice(&pump_mint_bytes());
        let tx = tx_with_log(format!("Program data: {}", Base64Engine.encode(&buffer)));
        let decoded = decode(&tx).expect("expected a decode");
        assert!(decoded.mint.to_lowercase().ends_with("pump"));
    }

    #[test]
    fn no_program_data_line_yields_none() {
        let tx = tx_with_log("Program log: Instruction: Buy".to_string());
        assert!(decode(&tx).is_none());
    }

    #[test]
    fn short_buffer_is_skipped() {
        let tx = tx_with_log(format!("Program data: {}", Base64Engine.encode([1, 2, 3])));
        assert!(decode(&tx).is_none());
    }
}
