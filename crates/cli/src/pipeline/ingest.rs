use anyhow::{Context, Result};
use archive_identity::{derive_identity, mask_all_emails};
use archive_mbox::{split_mailbox, MboxConfig, MessageParser};
use archive_store::{MessageStore, NewMessage, PutOutcome};
use serde::Serialize;
use std::io::BufRead;

/// Counts reported after ingesting one mailbox
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    /// Blocks cut out of the mailbox
    pub blocks: usize,

    pub inserted: usize,

    /// Blocks already in the store
    pub duplicates: usize,

    /// Malformed blocks left out
    pub skipped: usize,

    /// Inserted messages without a usable timestamp
    pub degraded_dates: usize,

    /// Inserted messages whose sender address could not be parsed
    pub unknown_senders: usize,
}

/// Split, parse, mask and insert every message, then commit once.
///
/// Malformed blocks are skipped and counted. Read and storage failures abort
/// before the commit, leaving the previous committed state in place.
pub fn ingest_mailbox<R: BufRead>(
    store: &mut MessageStore,
    reader: R,
    config: &MboxConfig,
) -> Result<IngestStats> {
    config.validate()?;
    let parser = MessageParser::new(config.clone());
    let mut stats = IngestStats::default();

    for block in split_mailbox(reader, config)? {
        let block = block.context("Failed to read mailbox")?;
        stats.blocks += 1;

        let message = match parser.parse(&block) {
            Ok(message) => message,
            Err(err) if err.is_recoverable() => {
                log::warn!("Skipping block: {}", err);
                stats.skipped += 1;
                continue;
            }
            Err(err) => return Err(err).context("Failed to parse mailbox"),
        };

        let sender_id = match derive_identity(&message.sender) {
            Ok(token) => Some(token),
            Err(err) => {
                log::debug!("Message {}: {}", message.hash.short(), err);
                None
            }
        };
        let body = if config.mask_bodies {
            mask_all_emails(&message.body)
        } else {
            message.body.clone()
        };
        let degraded = message.date_degraded();
        let hash = message.hash.clone();

        let outcome = store.put(NewMessage {
            hash: message.hash,
            message_id: message.message_id,
            reply_to: message.reply_to,
            sender: message.sender,
            sender_id,
            recipients: message.recipients,
            subject: message.subject,
            timestamp: message.timestamp,
            raw_date: message.raw_date,
            source_year: message.source_year,
        });

        match outcome {
            PutOutcome::Inserted => {
                store
                    .put_body(&hash, &body)
                    .with_context(|| format!("Failed to store body of {}", hash))?;
                stats.inserted += 1;
                if degraded {
                    stats.degraded_dates += 1;
                }
                if store.get(&hash).is_some_and(|r| r.sender_id.is_none()) {
                    stats.unknown_senders += 1;
                }
            }
            PutOutcome::Duplicate => stats.duplicates += 1,
        }
    }

    store
        .commit()
        .context("Failed to commit ingested messages")?;
    log::info!(
        "Ingested {} blocks: {} new, {} duplicates, {} skipped, {} undated",
        stats.blocks,
        stats.inserted,
        stats.duplicates,
        stats.skipped,
        stats.degraded_dates
    );
    Ok(stats)
}
