use archive_protocol::{MessageHash, MessageRecord};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;

/// Node in the reply graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyNode {
    pub hash: MessageHash,

    /// Starts a thread on its own: no reference, or flagged no-parent
    pub seed: bool,
}

/// Parent -> child edges between messages whose reply reference is trusted.
///
/// Nodes are inserted in hash order, so node indices order the same way as
/// hashes and every traversal is independent of record insertion order. A
/// reply edge exists only when the child is not flagged no-parent and its
/// reference names exactly one message id in the set. Every node therefore has
/// at most one parent.
#[derive(Debug, Clone, Default)]
pub struct ReplyGraph {
    graph: DiGraph<ReplyNode, ()>,
    index: HashMap<MessageHash, NodeIndex>,
}

impl ReplyGraph {
    pub fn from_records(records: &[MessageRecord]) -> Self {
        let mut sorted: Vec<&MessageRecord> = records.iter().collect();
        sorted.sort_by(|a, b| a.hash.cmp(&b.hash));
        sorted.dedup_by(|a, b| a.hash == b.hash);

        let mut graph = DiGraph::with_capacity(sorted.len(), sorted.len());
        let mut index = HashMap::with_capacity(sorted.len());
        let mut by_message_id: HashMap<&str, Vec<NodeIndex>> = HashMap::new();

        for record in &sorted {
            let idx = graph.add_node(ReplyNode {
                hash: record.hash.clone(),
                seed: record.is_seed_root(),
            });
            index.insert(record.hash.clone(), idx);
            if let Some(id) = record.message_id.as_deref() {
                by_message_id.entry(id).or_default().push(idx);
            }
        }

        for record in &sorted {
            if record.no_parent {
                continue;
            }
            let Some(reply_to) = record.reply_to.as_deref() else {
                continue;
            };
            if let Some(&[parent]) = by_message_id.get(reply_to).map(Vec::as_slice) {
                let child = index[&record.hash];
                graph.add_edge(parent, child, ());
            }
        }

        Self { graph, index }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// All nodes in hash order
    pub fn nodes(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    pub fn find(&self, hash: &MessageHash) -> Option<NodeIndex> {
        self.index.get(hash).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> &ReplyNode {
        &self.graph[idx]
    }

    pub fn hash(&self, idx: NodeIndex) -> &MessageHash {
        &self.graph[idx].hash
    }

    pub fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(idx, Direction::Incoming)
            .next()
    }

    /// Direct replies in hash order
    pub fn children(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut children: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .collect();
        children.sort();
        children
    }

    /// Nodes among `unresolved` that no amount of propagation can reach.
    ///
    /// With at most one parent per node, an unresolved node is stuck for one
    /// of two reasons: it sits on a reference cycle (a strongly connected
    /// component of size above one, or a self-reply), or it has no trusted
    /// parent at all. Anything else hangs below one of those and resolves
    /// once they are rooted. Returned in hash order.
    pub fn stuck_nodes(&self, unresolved: &[NodeIndex]) -> Vec<NodeIndex> {
        let mut sub: DiGraph<NodeIndex, ()> = DiGraph::with_capacity(unresolved.len(), 0);
        let mut local = HashMap::with_capacity(unresolved.len());
        for &idx in unresolved {
            local.insert(idx, sub.add_node(idx));
        }
        for &idx in unresolved {
            for child in self.graph.neighbors_directed(idx, Direction::Outgoing) {
                if let Some(&to) = local.get(&child) {
                    sub.add_edge(local[&idx], to, ());
                }
            }
        }

        let mut stuck = Vec::new();
        for component in tarjan_scc(&sub) {
            let cyclic = component.len() > 1
                || component
                    .first()
                    .is_some_and(|&n| sub.contains_edge(n, n));
            if cyclic {
                stuck.extend(component.into_iter().map(|n| sub[n]));
            }
        }
        for &idx in unresolved {
            if !self.graph[idx].seed && self.parent(idx).is_none() {
                stuck.push(idx);
            }
        }

        stuck.sort();
        stuck.dedup();
        stuck
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archive_protocol::NO_SUBJECT;

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

    #[test]
    fn edges_only_for_unique_targets() {
        let records = vec![
            record("a", Some("<1>"), None),
            record("b", Some("<2>"), Some("<1>")),
            record("c", Some("<dup>"), None),
            record("d", Some("<dup>"), None),
            record("e", None, Some("<dup>")),
            record("f", None, Some("<missing>")),
        ];
        let graph = ReplyGraph::from_records(&records);

        assert_eq!(graph.node_count(), 6);
        assert_eq!(graph.edge_count(), 1);
        let a = graph.find(&MessageHash::new("a")).unwrap();
        let b = graph.find(&MessageHash::new("b")).unwrap();
        assert_eq!(graph.children(a), vec![b]);
        assert_eq!(graph.parent(b), Some(a));
    }

    #[test]
    fn no_parent_messages_get_no_edge() {
        let mut child = record("b", Some("<2>"), Some("<1>"));
        child.no_parent = true;
        let graph = ReplyGraph::from_records(&[record("a", Some("<1>"), None), child]);
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.node(graph.find(&MessageHash::new("b")).unwrap()).seed);
    }

    #[test]
    fn stuck_nodes_are_cycle_members_and_parentless() {
        let records = vec![
            record("a", Some("<a>"), Some("<b>")),
            record("b", Some("<b>"), Some("<a>")),
            record("c", Some("<c>"), Some("<a>")),
            record("s", Some("<s>"), Some("<s>")),
        ];
        let graph = ReplyGraph::from_records(&records);
        let unresolved: Vec<NodeIndex> = graph.nodes().collect();
        let stuck: Vec<&str> = graph
            .stuck_nodes(&unresolved)
            .into_iter()
            .map(|idx| graph.hash(idx).as_str())
            .collect();
        assert_eq!(stuck, vec!["a", "b", "s"]);
    }
}
