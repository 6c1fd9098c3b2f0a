use crate::error::{Result, ThreadingError};
use archive_protocol::{DateBucket, MessageHash, MessageRecord};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// One message and its direct replies, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreadNode {
    pub message: MessageRecord,
    pub children: Vec<ThreadNode>,
}

impl ThreadNode {
    pub fn hash(&self) -> &MessageHash {
        &self.message.hash
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Pre-order walk; `visit` receives each node with its depth (root = 0).
    pub fn walk<'a, F>(&'a self, visit: &mut F)
    where
        F: FnMut(&'a ThreadNode, usize),
    {
        let mut pending = vec![(self, 0)];
        while let Some((node, depth)) = pending.pop() {
            visit(node, depth);
            pending.extend(node.children.iter().rev().map(|child| (child, depth + 1)));
        }
    }
}

impl Drop for ThreadNode {
    // Unlink descendants one level at a time so deep chains drop without recursing.
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// A rooted reply tree, identified by the root message hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Thread {
    pub root: ThreadNode,
}

impl Thread {
    pub fn root_hash(&self) -> &MessageHash {
        self.root.hash()
    }

    pub fn root_message(&self) -> &MessageRecord {
        &self.root.message
    }

    /// Bucket of the root message
    pub fn bucket(&self) -> DateBucket {
        self.root.message.bucket()
    }

    /// Root whose stated parent could not be trusted
    pub fn has_unknown_root(&self) -> bool {
        self.root.message.no_parent
    }

    /// Every message, pre-order
    pub fn messages(&self) -> Vec<&MessageRecord> {
        let mut out = Vec::new();
        self.root.walk(&mut |node, _| out.push(&node.message));
        out
    }

    pub fn len(&self) -> usize {
        let mut count = 0;
        self.root.walk(&mut |_, _| count += 1);
        count
    }

    /// A thread always holds at least its root
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, hash: &MessageHash) -> bool {
        self.messages().iter().any(|m| &m.hash == hash)
    }

    pub fn contains_sender(&self, token: &str) -> bool {
        self.messages().iter().any(|m| m.participant() == token)
    }

    /// Every month bucket a message of this thread falls in
    pub fn date_buckets(&self) -> BTreeSet<DateBucket> {
        self.messages().iter().map(|m| m.bucket()).collect()
    }

    /// Participant tokens, malformed senders collapsed to `unknown`
    pub fn participants(&self) -> BTreeSet<&str> {
        self.messages().into_iter().map(MessageRecord::participant).collect()
    }
}

/// Builds reply trees from resolved records.
///
/// A node's children are the messages whose reference equals the node's
/// message id and that share its thread root. No-parent messages are never
/// attached as children; they only appear as roots. Siblings and the forest
/// itself are ordered by [`MessageRecord::chronological_cmp`].
pub struct TreeBuilder<'a> {
    by_hash: BTreeMap<&'a MessageHash, &'a MessageRecord>,
    replies: HashMap<&'a str, Vec<&'a MessageRecord>>,
    roots: Vec<&'a MessageRecord>,
}

impl<'a> TreeBuilder<'a> {
    /// Index `records`. Fails when a record has no thread root or names a
    /// root outside the set.
    pub fn new(records: &'a [MessageRecord]) -> Result<Self> {
        let by_hash: BTreeMap<&MessageHash, &MessageRecord> =
            records.iter().map(|r| (&r.hash, r)).collect();

        let mut replies: HashMap<&str, Vec<&MessageRecord>> = HashMap::new();
        let mut roots = Vec::new();

        for &record in by_hash.values() {
            let root = record
                .thread_root
                .as_ref()
                .ok_or_else(|| ThreadingError::UnresolvedMessage(record.hash.clone()))?;
            if !by_hash.contains_key(root) {
                return Err(ThreadingError::UnknownRoot {
                    message: record.hash.clone(),
                    root: root.clone(),
                });
            }

            if root == &record.hash {
                roots.push(record);
            } else if !record.no_parent {
                if let Some(reply_to) = record.reply_to.as_deref() {
                    replies.entry(reply_to).or_default().push(record);
                }
            }
        }

        for siblings in replies.values_mut() {
            siblings.sort_by(|a, b| a.chronological_cmp(b));
        }
        roots.sort_by(|a, b| a.chronological_cmp(b));

        Ok(Self {
            by_hash,
            replies,
            roots,
        })
    }

    pub fn thread_count(&self) -> usize {
        self.roots.len()
    }

    /// The whole forest. Every record must land in exactly one tree.
    pub fn build(&self) -> Result<Vec<Thread>> {
        let mut placed = HashSet::with_capacity(self.by_hash.len());
        let threads: Vec<Thread> = self
            .roots
            .iter()
            .map(|&root| Thread {
                root: self.grow(root, &mut placed),
            })
            .collect();

        if let Some(&record) = self
            .by_hash
            .values()
            .find(|record| !placed.contains(&record.hash))
        {
            return Err(ThreadingError::Detached {
                message: record.hash.clone(),
                root: record.thread_root.clone().unwrap_or_else(|| record.hash.clone()),
            });
        }

        log::info!(
            "Built {} threads from {} messages",
            threads.len(),
            self.by_hash.len()
        );
        Ok(threads)
    }

    /// The tree rooted at `root` alone.
    pub fn build_thread(&self, root: &MessageHash) -> Result<Thread> {
        let record = self
            .roots
            .iter()
            .copied()
            .find(|r| &r.hash == root)
            .ok_or_else(|| ThreadingError::NotARoot(root.clone()))?;
        let mut placed = HashSet::new();
        Ok(Thread {
            root: self.grow(record, &mut placed),
        })
    }

    fn replies_to(&self, record: &MessageRecord) -> &[&'a MessageRecord] {
        record
            .message_id
            .as_deref()
            .and_then(|id| self.replies.get(id))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Collect the subtree pre-order with parent links, then assemble nodes
    /// bottom-up. Both passes use explicit stacks.
    fn grow(&self, root: &'a MessageRecord, placed: &mut HashSet<&'a MessageHash>) -> ThreadNode {
        let mut order: Vec<(&'a MessageRecord, usize)> = vec![(root, 0)];
        placed.insert(&root.hash);

        let mut pending: Vec<(&'a MessageRecord, usize)> = self
            .replies_to(root)
            .iter()
            .rev()
            .map(|&child| (child, 0))
            .collect();
        while let Some((record, parent)) = pending.pop() {
            let parent_root = &order[parent].0.thread_root;
            if record.thread_root != *parent_root || !placed.insert(&record.hash) {
                continue;
            }
            let index = order.len();
            order.push((record, parent));
            pending.extend(
                self.replies_to(record)
                    .iter()
                    .rev()
                    .filter(|child| !placed.contains(&child.hash))
                    .map(|&child| (child, index)),
            );
        }

        let mut children: Vec<Vec<ThreadNode>> = Vec::new();
        children.resize_with(order.len(), Vec::new);
        for (index, &(record, parent)) in order.iter().enumerate().skip(1).rev() {
            let mut own = std::mem::take(&mut children[index]);
            own.reverse();
            children[parent].push(ThreadNode {
                message: record.clone(),
                children: own,
            });
        }

        let mut own = std::mem::take(&mut children[0]);
        own.reverse();
        ThreadNode {
            message: root.clone(),
            children: own,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archive_protocol::NO_SUBJECT;
    use pretty_assertions::assert_eq;

    fn resolved(hash: &str, reply_to: Option<&str>, root: &str, timestamp: Option<i64>) -> MessageRecord {
        MessageRecord {
            hash: MessageHash::new(hash),
            message_id: Some(format!("<{hash}>")),
            reply_to: reply_to.map(|parent| format!("<{parent}>")),
            sender: format!("{hash}@example.com"),
            sender_id: Some(format!("{hash}_token")),
            recipients: None,
            subject: NO_SUBJECT.to_string(),
            timestamp,
            raw_date: None,
            source_year: 1996,
            no_parent: false,
            thread_root: Some(MessageHash::new(root)),
        }
    }

    fn shape(node: &ThreadNode) -> String {
        if node.is_leaf() {
            return node.hash().to_string();
        }
        let children: Vec<String> = node.children.iter().map(shape).collect();
        format!("{}({})", node.hash(), children.join(" "))
    }

    #[test]
    fn siblings_order_by_time_then_undated_by_hash() {
        let records = vec![
            resolved("r", None, "r", Some(0)),
            resolved("z", Some("r"), "r", None),
            resolved("y", Some("r"), "r", Some(30)),
            resolved("x", Some("r"), "r", Some(20)),
            resolved("w", Some("r"), "r", None),
        ];
        let threads = TreeBuilder::new(&records).unwrap().build().unwrap();
        assert_eq!(threads.len(), 1);
        assert_eq!(shape(&threads[0].root), "r(x y w z)");
    }

    #[test]
    fn no_parent_reply_is_its_own_tree() {
        let mut orphan = resolved("b", Some("a"), "b", Some(20));
        orphan.no_parent = true;
        let records = vec![resolved("a", None, "a", Some(10)), orphan];
        let threads = TreeBuilder::new(&records).unwrap().build().unwrap();
        let shapes: Vec<String> = threads.iter().map(|t| shape(&t.root)).collect();
        assert_eq!(shapes, vec!["a", "b"]);
        assert!(threads[1].has_unknown_root());
    }

    #[test]
    fn unresolved_record_is_rejected() {
        let mut record = resolved("a", None, "a", None);
        record.thread_root = None;
        let records = [record];
        assert_eq!(
            TreeBuilder::new(&records).err(),
            Some(ThreadingError::UnresolvedMessage(MessageHash::new("a")))
        );
    }

    #[test]
    fn root_outside_the_set_is_rejected() {
        let records = [resolved("a", Some("q"), "q", None)];
        assert!(matches!(
            TreeBuilder::new(&records),
            Err(ThreadingError::UnknownRoot { .. })
        ));
    }

    #[test]
    fn build_thread_rejects_a_reply_hash() {
        let records = vec![
            resolved("a", None, "a", Some(10)),
            resolved("b", Some("a"), "a", Some(20)),
        ];
        let builder = TreeBuilder::new(&records).unwrap();
        assert_eq!(
            builder.build_thread(&MessageHash::new("b")).err(),
            Some(ThreadingError::NotARoot(MessageHash::new("b")))
        );
    }

    #[test]
    fn walk_reports_depths_in_pre_order() {
        let records = vec![
            resolved("a", None, "a", Some(10)),
            resolved("b", Some("a"), "a", Some(20)),
            resolved("c", Some("b"), "a", Some(30)),
            resolved("d", Some("a"), "a", Some(40)),
        ];
        let threads = TreeBuilder::new(&records).unwrap().build().unwrap();
        let mut seen = Vec::new();
        threads[0].root.walk(&mut |node, depth| seen.push((node.hash().to_string(), depth)));
        assert_eq!(
            seen,
            vec![
                ("a".to_string(), 0),
                ("b".to_string(), 1),
                ("c".to_string(), 2),
                ("d".to_string(), 1),
            ]
        );
    }

    #[test]
    fn helpers_cover_the_whole_tree() {
        let records = vec![
            resolved("a", None, "a", Some(828_315_000)),
            resolved("b", Some("a"), "a", Some(828_400_000)),
            resolved("c", Some("b"), "a", None),
        ];
        let thread = TreeBuilder::new(&records)
            .unwrap()
            .build_thread(&MessageHash::new("a"))
            .unwrap();

        assert_eq!(thread.len(), 3);
        let order: Vec<&str> = thread.messages().iter().map(|m| m.hash.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
        assert!(thread.contains_sender("c_token"));
        assert!(!thread.contains_sender("d_token"));
        assert_eq!(
            thread.date_buckets().into_iter().collect::<Vec<_>>(),
            vec![
                DateBucket::month(1996, 3),
                DateBucket::month(1996, 4),
                DateBucket::unknown(1996),
            ]
        );
        assert_eq!(
            thread.participants().into_iter().collect::<Vec<_>>(),
            vec!["a_token", "b_token", "c_token"]
        );
    }
}
