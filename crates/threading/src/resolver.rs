use crate::graph::ReplyGraph;
use archive_protocol::{MessageHash, MessageRecord};
use petgraph::graph::NodeIndex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Thread roots for every message of one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// Message hash -> thread root hash
    pub thread_roots: BTreeMap<MessageHash, MessageHash>,

    /// Messages rooted by cycle breaking rather than by their headers, in
    /// hash order. These must also be flagged no-parent.
    pub forced_roots: Vec<MessageHash>,

    /// Propagation levels plus cycle-breaking rounds
    pub iterations: usize,
}

impl Resolution {
    pub fn root_of(&self, hash: &MessageHash) -> Option<&MessageHash> {
        self.thread_roots.get(hash)
    }

    /// Distinct thread roots
    pub fn thread_count(&self) -> usize {
        self.thread_roots
            .iter()
            .filter(|(hash, root)| hash == root)
            .count()
    }

    /// Write roots (and no-parent for forced roots) into the records.
    pub fn apply_to(&self, records: &mut [MessageRecord]) {
        let forced: BTreeSet<&MessageHash> = self.forced_roots.iter().collect();
        for record in records.iter_mut() {
            if let Some(root) = self.thread_roots.get(&record.hash) {
                record.thread_root = Some(root.clone());
            }
            if forced.contains(&record.hash) {
                record.no_parent = true;
            }
        }
    }
}

/// Breadth-first thread-root propagation over the reply graph.
///
/// Seeds are messages without a reference or flagged no-parent. Each level
/// hands the parent's root to every unresolved direct reply. When a level
/// resolves nothing while messages remain unresolved, the stuck ones
/// (reference cycles and parentless replies) are rooted on their own and
/// propagation resumes from them.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadResolver;

impl ThreadResolver {
    pub fn new() -> Self {
        Self
    }

    pub fn resolve(&self, records: &[MessageRecord]) -> Resolution {
        let graph = ReplyGraph::from_records(records);
        let mut roots: Vec<Option<NodeIndex>> = vec![None; graph.node_count()];

        let mut frontier: Vec<NodeIndex> = graph
            .nodes()
            .filter(|&idx| graph.node(idx).seed)
            .collect();
        for &idx in &frontier {
            roots[idx.index()] = Some(idx);
        }
        log::debug!("Seeded {} thread roots", frontier.len());

        let mut forced = Vec::new();
        let mut iterations = 0;

        loop {
            while !frontier.is_empty() {
                let mut next = Vec::new();
                for &parent in &frontier {
                    let root = roots[parent.index()];
                    for child in graph.children(parent) {
                        if roots[child.index()].is_none() {
                            roots[child.index()] = root;
                            next.push(child);
                        }
                    }
                }
                if next.is_empty() {
                    break;
                }
                iterations += 1;
                log::debug!("Level {}: {} messages resolved", iterations, next.len());
                frontier = next;
            }

            let unresolved: Vec<NodeIndex> = graph
                .nodes()
                .filter(|idx| roots[idx.index()].is_none())
                .collect();
            if unresolved.is_empty() {
                break;
            }

            let mut stuck = graph.stuck_nodes(&unresolved);
            if stuck.is_empty() {
                log::warn!(
                    "{} messages unresolved outside any cycle; rooting them",
                    unresolved.len()
                );
                stuck = unresolved;
            }

            iterations += 1;
            log::warn!(
                "Reference cycle or untrusted reference: rooting {} messages ({})",
                stuck.len(),
                stuck
                    .iter()
                    .map(|&idx| graph.hash(idx).short())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            for &idx in &stuck {
                roots[idx.index()] = Some(idx);
                forced.push(graph.hash(idx).clone());
            }
            frontier = stuck;
        }

        let thread_roots: BTreeMap<MessageHash, MessageHash> = graph
            .nodes()
            .filter_map(|idx| {
                roots[idx.index()].map(|root| (graph.hash(idx).clone(), graph.hash(root).clone()))
            })
            .collect();
        forced.sort();

        let resolution = Resolution {
            thread_roots,
            forced_roots: forced,
            iterations,
        };
        log::info!(
            "Resolved {} messages into {} threads ({} forced roots, {} iterations)",
            resolution.thread_roots.len(),
            resolution.thread_count(),
            resolution.forced_roots.len(),
            resolution.iterations
        );
        resolution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archive_protocol::NO_SUBJECT;
    use pretty_assertions::assert_eq;

    fn record(hash: &str, reply_to: Option<&str>) -> MessageRecord {
        MessageRecord {
            hash: MessageHash::new(hash),
            message_id: Some(format!("<{hash}>")),
            reply_to: reply_to.map(|parent| format!("<{parent}>")),
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

    fn root_of<'a>(resolution: &'a Resolution, hash: &str) -> &'a str {
        resolution
            .root_of(&MessageHash::new(hash))
            .map(MessageHash::as_str)
            .unwrap_or("<unresolved>")
    }

    #[test]
    fn chain_counts_one_iteration_per_level() {
        let records = vec![
            record("a", None),
            record("b", Some("a")),
            record("c", Some("b")),
            record("d", Some("c")),
        ];
        let resolution = ThreadResolver::new().resolve(&records);
        for hash in ["a", "b", "c", "d"] {
            assert_eq!(root_of(&resolution, hash), "a");
        }
        assert_eq!(resolution.iterations, 3);
        assert!(resolution.forced_roots.is_empty());
        assert_eq!(resolution.thread_count(), 1);
    }

    #[test]
    fn no_parent_message_is_a_seed() {
        let mut orphan = record("b", Some("a"));
        orphan.no_parent = true;
        let records = vec![record("a", None), orphan, record("c", Some("b"))];
        let resolution = ThreadResolver::new().resolve(&records);
        assert_eq!(root_of(&resolution, "b"), "b");
        assert_eq!(root_of(&resolution, "c"), "b");
        assert_eq!(resolution.thread_count(), 2);
    }

    #[test]
    fn cycle_members_become_forced_roots() {
        let records = vec![record("a", Some("b")), record("b", Some("a"))];
        let resolution = ThreadResolver::new().resolve(&records);
        assert_eq!(root_of(&resolution, "a"), "a");
        assert_eq!(root_of(&resolution, "b"), "b");
        assert_eq!(
            resolution.forced_roots,
            vec![MessageHash::new("a"), MessageHash::new("b")]
        );
        assert_eq!(resolution.iterations, 1);
    }

    #[test]
    fn apply_marks_forced_roots_no_parent() {
        let mut records = vec![record("s", Some("s")), record("t", None)];
        let resolution = ThreadResolver::new().resolve(&records);
        resolution.apply_to(&mut records);
        assert!(records[0].no_parent);
        assert_eq!(records[0].thread_root, Some(MessageHash::new("s")));
        assert!(!records[1].no_parent);
        assert_eq!(records[1].thread_root, Some(MessageHash::new("t")));
    }
}
