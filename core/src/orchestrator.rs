use crate::decode::{decode_by_tag, SCORE_ONLY_FALLBACK_TAG};
use crate::error::CoreError;
use crate::executor::{SnipeExecutor, TransactionSigner};
use crate::ingest::{DedupCache, SlotCache};
use crate::metrics::Metrics;
use crate::mint_validator::MintValidator;
use crate::models::{CompiledInstruction, LogMessage, MintSource, TagResult, TokenBalance, TransactionInfo};
use crate::rpc::RpcClient;
use crate::settings::Settings;
use crate::signal::{fingerprint, scorer};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    Running,
    Closing,
}

/// Wires ingest to scoring, fingerprinting, decoding, validation and
/// execution in strict sequence per message. Owns the process's shared
/// mutable state; nothing here is a module-level singleton.
pub struct Orchestrator {
    settings: Settings,
    rpc: Arc<dyn RpcClient>,
    dedup: DedupCache,
    slot_cache: SlotCache,
    validator: MintValidator,
    executor: SnipeExecutor,
    metrics: Arc<Metrics>,
    closing: AtomicBool,
    shutdown: Arc<tokio::sync::Notify>,
}

impl Orchestrator {
    pub fn new(
        settings: Settings,
        rpc: Arc<dyn RpcClient>,
        validator: MintValidator,
        executor: SnipeExecutor,
        metrics: Arc<Metrics>,
    ) -> Self {
        Orchestrator {
            settings,
            rpc,
            dedup: DedupCache::new(),
            slot_cache: SlotCache::new(),
            validator,
            executor,
            metrics,
            closing: AtomicBool::new(false),
            shutdown: Arc::new(tokio::sync::Notify::new()),
        }
    }

    /// Flips state to `Closing` and wakes a blocked `run` loop.
    pub fn request_shutdown(&self) {
        self.closing.store(true, Ordering::SeqCst);
        self.shutdown.notify_waiters();
    }

    pub fn state(&self) -> OrchestratorState {
        if self.closing.load(Ordering::SeqCst) {
            OrchestratorState::Closing
        } else {
            OrchestratorState::Running
        }
    }

    /// Drains `rx` until the channel closes or shutdown is requested,
    /// processing one message at a time, strictly sequentially.
    pub async fn run(&self, mut rx: mpsc::Receiver<LogMessage>, signer: &dyn TransactionSigner, dry_run: bool) {
        while self.state() == OrchestratorState::Running {
            let message = tokio::select! {
                maybe = rx.recv() => match maybe {
                    Some(m) => m,
                    None => {
                        log::info!("orchestrator: ingest channel closed, shutting down");
                        return;
                    }
                },
                _ = self.shutdown.notified() => {
                    log::info!("orchestrator: shutdown requested, exiting run loop");
                    return;
                }
            };
            self.metrics.record_received(&message.source_program);
            if let Err(e) = self.process_message(&message, signer, dry_run).await {
                log::warn!("orchestrator: {} dropped: {e}", message.signature);
                match e {
                    CoreError::MintNotFound(_) | CoreError::MalformedTransaction(_) => {
                        self.metrics.record_unresolved(&message.source_program);
                    }
                    _ => self.metrics.record_failure(&message.source_program),
                }
            }
        }
    }

    /// Evicts dedup entries older than the TTL on a fixed interval, until
    /// shutdown is requested. Without this the dedup map grows unbounded
    /// and a signature is never eligible for reprocessing.
    pub async fn run_dedup_sweeper(&self) {
        let mut interval = tokio::time::interval(DedupCache::sweep_interval());
        loop {
            tokio::select! {
                _ = interval.tick() => self.dedup.sweep(),
                _ = self.shutdown.notified() => {
                    log::info!("orchestrator: shutdown requested, exiting dedup sweeper");
                    return;
                }
            }
        }
    }

    /// One message through the full pipeline: dedup -> staleness -> score
    /// -> fingerprint -> decode -> validate -> execute.
    async fn process_message(
        &self,
        message: &LogMessage,
        signer: &dyn TransactionSigner,
        dry_run: bool,
    ) -> Result<(), CoreError> {
        if !self.dedup.observe(&message.signature) {
            log::debug!("orchestrator: {} already seen, dropping", message.signature);
            return Ok(());
        }

        let current_slot = self.refresh_slot().await?;
        if SlotCache::is_stale(current_slot, message.slot, self.settings.stale_slot_threshold) {
            log::debug!(
                "orchestrator: {} stale (current={current_slot}, message={})",
                message.signature,
                message.slot
            );
            return Ok(());
        }

        let score = scorer::score(&message.lines, &self.settings.signal_weights);
        if score < self.settings.score_threshold {
            return Ok(());
        }

        let tag_result = match fingerprint::classify(message, &self.settings.fingerprints) {
            Some(result) => result,
            None => TagResult {
                tag: SCORE_ONLY_FALLBACK_TAG.to_string(),
                confidence: score.min(1.0),
                mint: None,
                source: MintSource::ScoreFallback,
            },
        };
        if tag_result.confidence < self.settings.confidence_threshold {
            return Ok(());
        }

        self.handle_match(message, &tag_result, signer, dry_run).await
    }

    async fn handle_match(
        &self,
        message: &LogMessage,
        tag_result: &TagResult,
        signer: &dyn TransactionSigner,
        dry_run: bool,
    ) -> Result<(), CoreError> {
        let raw_tx = self.rpc.get_transaction(&message.signature).await?;
        let tx_info = transaction_info_from_json(&raw_tx, message);

        let Some(decoded) = decode_by_tag(&tag_result.tag, &tx_info) else {
            return Err(CoreError::MintNotFound(message.signature.clone()));
        };

        // The mint is only known once a decoder resolves it; the resolved
        // result supersedes whatever classification produced `tag_result`.
        let resolved = TagResult {
            tag: tag_result.tag.clone(),
            confidence: tag_result.confidence,
            mint: Some(decoded.mint.clone()),
            source: MintSource::Decoder,
        };

        let valid = self.validator.validate(&decoded.mint).await.unwrap_or(false);
        if !valid {
            log::warn!("orchestrator: mint {} failed validation, proceeding advisorily", decoded.mint);
        }
        self.metrics.record_match(&message.source_program);

        let order = crate::models::BuyOrder::new([0u8; 64], decoded.mint.clone(), self.settings.amount_in_native);
        let signature = self.executor.execute(&order, signer, dry_run).await?;
        log::info!(
            "orchestrator: snipe submitted for mint {} tag={} source={:?} signature={signature}",
            decoded.mint,
            resolved.tag,
            resolved.source
        );
        Ok(())
    }

    async fn refresh_slot(&self) -> Result<u64, CoreError> {
        if let Some(slot) = self.slot_cache.get_fresh() {
            return Ok(slot);
        }
        let slot = self.rpc.get_slot().await?;
        self.slot_cache.set(slot);
        Ok(slot)
    }
}

/// Flattens a `getTransaction` jsonParsed RPC payload into the decoders'
/// input shape.
fn transaction_info_from_json(raw: &Value, message: &LogMessage) -> TransactionInfo {
    let meta = &raw["meta"];
    let log_messages: Vec<String> = meta["logMessages"]
        .as_array()
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_else(|| message.lines.clone());

    let pre_token_balances = parse_token_balances(&meta["preTokenBalances"]);
    let post_token_balances = parse_token_balances(&meta["postTokenBalances"]);

    let account_keys: Vec<String> = raw["transaction"]["message"]["accountKeys"]
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(str::to_string).or_else(|| v["pubkey"].as_str().map(str::to_string)))
                .collect()
        })
        .unwrap_or_default();

    let compiled_instructions = parse_instructions(&raw["transaction"]["message"]["instructions"], &account_keys);
    let inner_instructions = parse_inner_instructions(&meta["innerInstructions"], &account_keys);

    TransactionInfo {
        slot: raw["slot"].as_u64().unwrap_or(message.slot),
        block_time: raw["blockTime"].as_i64(),
        signature: message.signature.clone(),
        accounts: account_keys,
        log_messages,
        pre_token_balances,
        post_token_balances,
        inner_instructions,
        compiled_instructions,
    }
}

fn parse_token_balances(value: &Value) -> Vec<TokenBalance> {
    value
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|entry| {
                    Some(TokenBalance {
                        account_index: entry["accountIndex"].as_u64()? as u32,
                        mint: entry["mint"].as_str()?.to_string(),
                        ui_amount: entry["uiTokenAmount"]["uiAmount"].as_f64(),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

fn parse_instructions(value: &Value, account_keys: &[String]) -> Vec<CompiledInstruction> {
    value
        .as_array()
        .map(|arr| arr.iter().filter_map(|entry| parse_single_instruction(entry, account_keys)).collect())
        .unwrap_or_default()
}

fn parse_inner_instructions(value: &Value, account_keys: &[String]) -> Vec<CompiledInstruction> {
    value
        .as_array()
        .map(|groups| {
            groups
                .iter()
                .flat_map(|group| group["instructions"].as_array().cloned().unwrap_or_default())
                .filter_map(|entry| parse_single_instruction(&entry, account_keys))
                .collect()
        })
        .unwrap_or_default()
}

fn parse_single_instruction(entry: &Value, account_keys: &[String]) -> Option<CompiledInstruction> {
    let program_id = entry["programId"].as_str()?.to_string();
    let accounts: Vec<String> = entry["accounts"]
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_u64())
                .filter_map(|idx| account_keys.get(idx as usize).cloned())
                .collect()
        })
        .unwrap_or_default();
    let data = entry["data"]
        .as_str()
        .and_then(|s| bs58::decode(s).into_vec().ok())
        .unwrap_or_default();
    Some(CompiledInstruction { program_id, accounts, data })
}
