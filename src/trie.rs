//! The radix trie that stores forwarding rules: insertion with node
//! splitting, longest-prefix descent, subtree removal, and the
//! auxiliary-trie-based non-trivial count.
//!
//! Crate-private: callers go through [`crate::store::ForwardingStore`].

use crate::digit::{digit_rank, is_number, ALPHABET_LEN};
use debug_print::debug_println;
use slab::Slab;
use std::collections::BTreeSet;

pub(crate) type NodeId = usize;

#[derive(Debug, Clone)]
pub(crate) struct Node {
    /// Digit sequence labeling the edge from this node's parent. Empty only for the root.
    edge: String,
    /// Replacement prefix for the path from the root through this node, when set.
    forward: Option<String>,
    /// Indexed by `digit_rank` of a child edge's first digit; at most one child per digit.
    children: [Option<NodeId>; ALPHABET_LEN],
    /// Lookup-only back-link; never an ownership relation.
    parent: Option<NodeId>,
}

impl Node {
    fn leaf(edge: String, forward: Option<String>, parent: Option<NodeId>) -> Self {
        Self {
            edge,
            forward,
            children: [None; ALPHABET_LEN],
            parent,
        }
    }
}

fn common_prefix_len(a: &str, b: &str) -> usize {
    a.as_bytes()
        .iter()
        .zip(b.as_bytes())
        .take_while(|(x, y)| x == y)
        .count()
}

/// A single compressed prefix tree. The root is created once and never removed.
#[derive(Debug, Clone)]
pub(crate) struct Trie {
    nodes: Slab<Node>,
    root: NodeId,
}

impl Default for Trie {
    fn default() -> Self {
        Self::new()
    }
}

impl Trie {
    pub(crate) fn new() -> Self {
        let mut nodes = Slab::new();
        let root = nodes.insert(Node::leaf(String::new(), None, None));
        Self { nodes, root }
    }

    fn add_child(&mut self, parent: NodeId, edge: &str, forward: Option<String>) -> NodeId {
        let rank = digit_rank(edge.chars().next().expect("edge is non-empty")).expect("digit");
        let id = self.nodes.insert(Node::leaf(edge.to_string(), forward, Some(parent)));
        self.nodes[parent].children[rank] = Some(id);
        id
    }

    /// Splits `child`'s edge at `l`: the first `l` digits stay on `child`, the
    /// rest moves (along with `child`'s old forward and children) into a fresh
    /// intermediate node built fully before `child`'s old fields are cleared.
    fn split_child(&mut self, child: NodeId, l: usize) {
        let tail = {
            let node = &mut self.nodes[child];
            let old_edge = std::mem::take(&mut node.edge);
            let (head, tail) = old_edge.split_at(l);
            node.edge = head.to_string();
            tail.to_string()
        };
        let forward = self.nodes[child].forward.take();
        let children = std::mem::replace(&mut self.nodes[child].children, [None; ALPHABET_LEN]);

        let new_id = self
            .nodes
            .insert(Node::leaf(tail, forward, Some(child)));
        self.nodes[new_id].children = children;
        for grandchild in children.into_iter().flatten() {
            self.nodes[grandchild].parent = Some(new_id);
        }

        let rank = digit_rank(self.nodes[new_id].edge.chars().next().expect("non-empty tail"))
            .expect("digit");
        self.nodes[child].children[rank] = Some(new_id);
        debug_println!("split node {child}, new intermediate {new_id}");
    }

    /// Shared insertion algorithm: walks from the root installing `key -> forward`,
    /// splitting edges as needed. Does not validate `key`/`forward`: callers
    /// (`insert`, the non-trivial-count signature pass) do that themselves.
    fn insert_raw(&mut self, key: &str, forward: String) {
        let mut node = self.root;
        let mut remaining = key;
        loop {
            if remaining.is_empty() {
                self.nodes[node].forward = Some(forward);
                return;
            }
            let rank = digit_rank(remaining.chars().next().expect("non-empty")).expect("digit");
            match self.nodes[node].children[rank] {
                None => {
                    self.add_child(node, remaining, Some(forward));
                    return;
                }
                Some(child) => {
                    let edge_len = self.nodes[child].edge.len();
                    let l = common_prefix_len(remaining, &self.nodes[child].edge);
                    if l == edge_len && l == remaining.len() {
                        self.nodes[child].forward = Some(forward);
                        return;
                    } else if l == edge_len {
                        node = child;
                        remaining = &remaining[l..];
                    } else {
                        self.split_child(child, l);
                        if l == remaining.len() {
                            self.nodes[child].forward = Some(forward);
                        } else {
                            self.add_child(child, &remaining[l..], Some(forward));
                        }
                        return;
                    }
                }
            }
        }
    }

    /// Adds the rule `a -> b`. Rejects (without mutating) a non-number argument
    /// or `a == b`.
    pub(crate) fn insert(&mut self, a: &str, b: &str) -> bool {
        if !is_number(a) || !is_number(b) || a == b {
            return false;
        }
        debug_println!("insert {a} -> {b}");
        self.insert_raw(a, b.to_string());
        true
    }

    /// Inserts `key` as a present-but-payload-irrelevant marker, used only by
    /// non-trivial counting's scratch trie. Mirrors `insert` but allows `key`
    /// to coincide with its own placeholder payload.
    fn insert_signature(&mut self, key: &str) {
        self.insert_raw(key, String::new());
    }

    /// Descends from the root consuming only full matching edges; stops the
    /// moment the next child's edge would exceed the remaining input. Returns
    /// the deepest node reached and the number of digits consumed.
    pub(crate) fn longest_prefix_descent(&self, input: &str) -> (NodeId, usize) {
        let mut node = self.root;
        let mut consumed = 0;
        let mut remaining = input;
        loop {
            let Some(first) = remaining.chars().next() else {
                break;
            };
            let Some(rank) = digit_rank(first) else { break };
            match self.nodes[node].children[rank] {
                None => break,
                Some(child) => {
                    let edge = &self.nodes[child].edge;
                    if remaining.starts_with(edge.as_str()) {
                        consumed += edge.len();
                        remaining = &remaining[edge.len()..];
                        node = child;
                    } else {
                        break;
                    }
                }
            }
        }
        (node, consumed)
    }

    /// Returns the rule-bearing node whose path is the longest prefix of
    /// `input`, with the digits consumed to reach it. `None` if no ancestor on
    /// the descent is rule-bearing.
    pub(crate) fn longest_rule_match(&self, input: &str) -> Option<(NodeId, usize)> {
        let mut node = self.root;
        let mut consumed = 0;
        let mut remaining = input;
        let mut best = None;
        loop {
            let Some(first) = remaining.chars().next() else {
                break;
            };
            let Some(rank) = digit_rank(first) else { break };
            match self.nodes[node].children[rank] {
                None => break,
                Some(child) => {
                    let edge = &self.nodes[child].edge;
                    if remaining.starts_with(edge.as_str()) {
                        consumed += edge.len();
                        remaining = &remaining[edge.len()..];
                        node = child;
                        if self.nodes[node].forward.is_some() {
                            best = Some((node, consumed));
                        }
                    } else {
                        break;
                    }
                }
            }
        }
        best
    }

    pub(crate) fn forward_of(&self, node: NodeId) -> &str {
        self.nodes[node].forward.as_deref().expect("rule-bearing node")
    }

    /// Removes all rules whose key has `a` as a prefix. No-op for a non-number,
    /// or when `a` lands strictly inside a compressed edge rather than on an
    /// existing node boundary: removal never implicitly splits an edge the
    /// way insertion does.
    pub(crate) fn remove_subtree(&mut self, a: &str) {
        if !is_number(a) {
            return;
        }
        let (node, consumed) = self.longest_prefix_descent(a);
        if consumed != a.len() || node == self.root {
            return;
        }
        debug_println!("remove subtree rooted at node {node} (prefix {a})");
        self.detach(node);
    }

    fn detach(&mut self, node: NodeId) {
        let parent = self.nodes[node].parent.expect("non-root has a parent");
        let first = self.nodes[node]
            .edge
            .chars()
            .next()
            .expect("non-root edge is non-empty");
        let rank = digit_rank(first).expect("digit");
        self.nodes[parent].children[rank] = None;
        self.destroy_subtree(node);
    }

    fn destroy_subtree(&mut self, node: NodeId) {
        let children = self.nodes[node].children;
        for child in children.into_iter().flatten() {
            self.destroy_subtree(child);
        }
        self.nodes.remove(node);
    }

    /// Collects every number `x` with `lookup(x) == input`, plus `input` itself,
    /// sorted and duplicate-free (via `BTreeSet`, since byte order on this
    /// alphabet already is the required alphabet order).
    pub(crate) fn reverse(&self, input: &str) -> BTreeSet<String> {
        let mut found = BTreeSet::new();
        found.insert(input.to_string());
        self.reverse_dfs(self.root, String::new(), input, &mut found);
        found
    }

    fn reverse_dfs(&self, node: NodeId, path: String, input: &str, found: &mut BTreeSet<String>) {
        if let Some(forward) = &self.nodes[node].forward {
            if input.starts_with(forward.as_str()) {
                let mut candidate = path.clone();
                candidate.push_str(&input[forward.len()..]);
                found.insert(candidate);
            }
        }
        for child in self.nodes[node].children {
            let Some(child) = child else { continue };
            let mut child_path = path.clone();
            child_path.push_str(&self.nodes[child].edge);
            self.reverse_dfs(child, child_path, input, found);
        }
    }

    /// Builds the signature scratch trie: every rule-bearing node of `self`
    /// whose `forward` is composed entirely of digits in `available`
    /// contributes its `forward` as a signature.
    fn collect_signatures(&self, node: NodeId, available: &BTreeSet<char>, scratch: &mut Trie) {
        if let Some(forward) = &self.nodes[node].forward {
            if forward.chars().all(|c| available.contains(&c)) {
                scratch.insert_signature(forward);
            }
        }
        for child in self.nodes[node].children {
            let Some(child) = child else { continue };
            self.collect_signatures(child, available, scratch);
        }
    }

    /// Sums `|available|^(len - depth)` over every *minimal* signature in this
    /// (scratch) trie: the first rule-bearing node reached along each path,
    /// which is why the walk returns instead of recursing once it finds one.
    fn sum_minimal_signatures(&self, node: NodeId, depth: usize, len: usize, available: usize, total: &mut usize) {
        if depth > len {
            return;
        }
        if self.nodes[node].forward.is_some() {
            *total += available.pow((len - depth) as u32);
            return;
        }
        for child in self.nodes[node].children {
            let Some(child) = child else { continue };
            let child_depth = depth + self.nodes[child].edge.len();
            self.sum_minimal_signatures(child, child_depth, len, available, total);
        }
    }

    /// The number of distinct length-`len` strings over the digits
    /// appearing in `set` whose forward lookup differs from themselves.
    pub(crate) fn non_trivial_count(&self, set: &str, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        let available: BTreeSet<char> = set.chars().filter(|&c| crate::digit::is_digit(c)).collect();
        if available.is_empty() {
            return 0;
        }
        let mut scratch = Trie::new();
        self.collect_signatures(self.root, &available, &mut scratch);
        let mut total = 0;
        scratch.sum_minimal_signatures(scratch.root, 0, len, available.len(), &mut total);
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_rejects_invalid_input() {
        let mut t = Trie::new();
        assert!(!t.insert("", "1"));
        assert!(!t.insert("1", ""));
        assert!(!t.insert("12a", "1"));
        assert!(!t.insert("1", "1"));
        assert_eq!(t.longest_rule_match("1"), None);
    }

    #[test]
    fn insert_new_leaf_then_overwrite() {
        let mut t = Trie::new();
        assert!(t.insert("12", "34"));
        let (node, consumed) = t.longest_rule_match("12").unwrap();
        assert_eq!(consumed, 2);
        assert_eq!(t.forward_of(node), "34");

        // last-write-wins
        assert!(t.insert("12", "56"));
        let (node, _) = t.longest_rule_match("12").unwrap();
        assert_eq!(t.forward_of(node), "56");
    }

    #[test]
    fn insert_splits_shared_edge() {
        let mut t = Trie::new();
        assert!(t.insert("123", "a"));
        assert!(t.insert("124", "b"));
        let (n1, c1) = t.longest_rule_match("123").unwrap();
        assert_eq!(c1, 3);
        assert_eq!(t.forward_of(n1), "a");
        let (n2, c2) = t.longest_rule_match("124").unwrap();
        assert_eq!(c2, 3);
        assert_eq!(t.forward_of(n2), "b");
    }

    #[test]
    fn longest_prefix_preference() {
        let mut t = Trie::new();
        assert!(t.insert("1", "x"));
        assert!(t.insert("12", "y"));
        let (node, consumed) = t.longest_rule_match("1234").unwrap();
        assert_eq!(consumed, 2);
        assert_eq!(t.forward_of(node), "y");
    }

    #[test]
    fn remove_subtree_exact_boundary() {
        let mut t = Trie::new();
        assert!(t.insert("12", "34"));
        assert!(t.insert("123", "56"));
        t.remove_subtree("12");
        assert_eq!(t.longest_rule_match("1234"), None);
    }

    #[test]
    fn remove_subtree_mid_edge_is_noop() {
        let mut t = Trie::new();
        assert!(t.insert("12", "34"));
        // "1" lands strictly inside the "12" edge: no node boundary there.
        t.remove_subtree("1");
        let (node, consumed) = t.longest_rule_match("12").unwrap();
        assert_eq!(consumed, 2);
        assert_eq!(t.forward_of(node), "34");
    }

    #[test]
    fn remove_subtree_unknown_prefix_is_noop() {
        let mut t = Trie::new();
        assert!(t.insert("12", "34"));
        t.remove_subtree("9");
        assert!(t.longest_rule_match("12").is_some());
    }

    #[test]
    fn reverse_contains_self_on_empty_trie() {
        let t = Trie::new();
        let result = t.reverse("2234");
        assert_eq!(result, BTreeSet::from(["2234".to_string()]));
    }

    #[test]
    fn reverse_single_step_not_fixed_point() {
        let mut t = Trie::new();
        assert!(t.insert("0", "00"));
        assert!(t.insert("00", "0"));
        let fwd = t.longest_rule_match("07").unwrap();
        assert_eq!(format!("{}{}", t.forward_of(fwd.0), &"07"[fwd.1..]), "007");
        let fwd = t.longest_rule_match("007").unwrap();
        assert_eq!(format!("{}{}", t.forward_of(fwd.0), &"007"[fwd.1..]), "07");
    }

    #[test]
    fn reverse_does_not_chain_through_intermediate_rule() {
        let mut t = Trie::new();
        assert!(t.insert("1", "2"));
        assert!(t.insert("12", "3"));
        let result = t.reverse("23");
        assert_eq!(
            result,
            BTreeSet::from(["13".to_string(), "23".to_string()])
        );
    }

    #[test]
    fn non_trivial_count_coalesces_shorter_signature() {
        let mut t = Trie::new();
        assert!(t.insert("1", "2"));
        assert!(t.insert("12", "2"));
        assert_eq!(t.non_trivial_count("12", 3), 4);
    }

    #[test]
    fn non_trivial_count_zero_cases() {
        let mut t = Trie::new();
        assert!(t.insert("1", "2"));
        assert_eq!(t.non_trivial_count("12", 0), 0);
        assert_eq!(t.non_trivial_count("", 3), 0);
        assert_eq!(t.non_trivial_count("abc", 3), 0);
        assert_eq!(Trie::new().non_trivial_count("12", 3), 0);
    }
}
