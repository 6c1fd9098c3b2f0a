use archive_protocol::{MessageHash, MessageRecord};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// Messages whose reply reference cannot be trusted, split by reason.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Classification {
    /// Reference names no known message id
    pub dangling: BTreeSet<MessageHash>,

    /// Reference names a message id carried by more than one message
    pub ambiguous: BTreeSet<MessageHash>,
}

impl Classification {
    pub fn is_flagged(&self, hash: &MessageHash) -> bool {
        self.dangling.contains(hash) || self.ambiguous.contains(hash)
    }

    /// Every flagged hash, in hash order
    pub fn flagged(&self) -> impl Iterator<Item = &MessageHash> {
        self.dangling.union(&self.ambiguous)
    }

    pub fn len(&self) -> usize {
        self.dangling.len() + self.ambiguous.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dangling.is_empty() && self.ambiguous.is_empty()
    }

    /// Set `no_parent` on every flagged record. Flags are never cleared here.
    pub fn apply_to(&self, records: &mut [MessageRecord]) {
        for record in records.iter_mut() {
            if self.is_flagged(&record.hash) {
                record.no_parent = true;
            }
        }
    }
}

/// Flag every message whose reference is dangling or ambiguous.
///
/// Needs the complete record set: a reference can only be judged dangling
/// once every message id is known.
pub fn classify_orphans(records: &[MessageRecord]) -> Classification {
    let mut holders: HashMap<&str, BTreeSet<&MessageHash>> = HashMap::new();
    for record in records {
        if let Some(id) = record.message_id.as_deref() {
            holders.entry(id).or_default().insert(&record.hash);
        }
    }

    let mut classification = Classification::default();
    for record in records {
        let Some(reply_to) = record.reply_to.as_deref() else {
            continue;
        };
        match holders.get(reply_to).map(BTreeSet::len) {
            None => {
                log::debug!(
                    "Message {} replies to unknown id {}",
                    record.hash.short(),
                    reply_to
                );
                classification.dangling.insert(record.hash.clone());
            }
            Some(1) => {}
            Some(count) => {
                log::debug!(
                    "Message {} replies to id {} shared by {} messages",
                    record.hash.short(),
                    reply_to,
                    count
                );
                classification.ambiguous.insert(record.hash.clone());
            }
        }
    }

    log::info!(
        "Classified {} messages: {} dangling, {} ambiguous references",
        records.len(),
        classification.dangling.len(),
        classification.ambiguous.len()
    );
    classification
}

#[cfg(test)]
mod tests {
    use super::*;
    use archive_protocol::NO_SUBJECT;
    use pretty_assertions::assert_eq;

    fn record(hash: &str, id: Option<&str>, reply_to: Option<&str>) -> MessageRecord {
        MessageRecord {
            hash: MessageHash::new(hash),
            message_id: id.map(str::to_string),
            reply_to: reply_to.map(str::to_string),
            sender: "a@b.c".to_string(),
            sender_id: None,
            recipients: None,
            subject: NO_SUBJECT.to_string(),
            timestamp: None,
            raw_date: None,
            source_year: 1996,
            no_parent: false,
            thread_root: None,
        }
    }

    fn hashes(set: &BTreeSet<MessageHash>) -> Vec<&str> {
        set.iter().map(MessageHash::as_str).collect()
    }

    #[test]
    fn dangling_reference_is_flagged() {
        let records = vec![
            record("a", Some("<1>"), None),
            record("b", Some("<2>"), Some("<1>")),
            record("c", Some("<3>"), Some("<gone>")),
        ];
        let classification = classify_orphans(&records);
        assert_eq!(hashes(&classification.dangling), vec!["c"]);
        assert!(classification.ambiguous.is_empty());
    }

    #[test]
    fn every_reply_to_a_shared_id_is_flagged() {
        let records = vec![
            record("a", Some("<dup>"), None),
            record("b", Some("<dup>"), None),
            record("c", Some("<3>"), Some("<dup>")),
            record("d", Some("<4>"), Some("<dup>")),
        ];
        let classification = classify_orphans(&records);
        assert_eq!(hashes(&classification.ambiguous), vec!["c", "d"]);
        assert!(classification.dangling.is_empty());
        assert_eq!(classification.len(), 2);
    }

    #[test]
    fn self_reference_is_not_an_orphan() {
        let records = vec![record("a", Some("<1>"), Some("<1>"))];
        assert!(classify_orphans(&records).is_empty());
    }

    #[test]
    fn apply_only_sets_flags() {
        let mut records = vec![
            record("a", Some("<1>"), None),
            record("b", Some("<2>"), Some("<gone>")),
        ];
        records[0].no_parent = true;
        let classification = classify_orphans(&records);
        classification.apply_to(&mut records);
        assert!(records[0].no_parent);
        assert!(records[1].no_parent);
        assert_eq!(
            classification.flagged().map(MessageHash::as_str).collect::<Vec<_>>(),
            vec!["b"]
        );
    }
}
