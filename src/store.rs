//! The public rewrite-engine façade over the radix trie.

use crate::digit::is_number;
use crate::number_list::NumberList;
use crate::trie::Trie;

/// A single named-database-sized forwarding store: a set of prefix
/// rewriting rules plus the three queries over them.
#[derive(Debug, Clone, Default)]
pub struct ForwardingStore {
    trie: Trie,
}

impl ForwardingStore {
    /// A store with no rules.
    pub fn new() -> Self {
        Self { trie: Trie::new() }
    }

    /// Adds the rule "prefix `a` -> prefix `b`", replacing any prior rule for
    /// the same `a`. Returns `false` (without mutating) if `a` or `b` is not a
    /// number, or `a == b`.
    pub fn add(&mut self, a: &str, b: &str) -> bool {
        self.trie.insert(a, b)
    }

    /// Removes every rule whose key has `a` as a prefix. Does nothing if `a`
    /// is not a number or no such rule exists.
    pub fn remove(&mut self, a: &str) {
        self.trie.remove_subtree(a)
    }

    /// Rewrites `input` by its longest matching rule, or returns it unchanged
    /// if no rule applies. Empty list for invalid input.
    pub fn lookup(&self, input: &str) -> NumberList {
        let mut result = NumberList::new();
        if !is_number(input) {
            return result;
        }
        match self.trie.longest_rule_match(input) {
            Some((node, consumed)) => {
                let forward = self.trie.forward_of(node);
                let mut rewritten = String::with_capacity(forward.len() + input.len() - consumed);
                rewritten.push_str(forward);
                rewritten.push_str(&input[consumed..]);
                result.push(rewritten);
            }
            None => result.push(input.to_string()),
        }
        result
    }

    /// Every number that rewrites to `input` under the current rules, plus
    /// `input` itself, sorted and duplicate-free. Empty list for invalid input.
    pub fn reverse(&self, input: &str) -> NumberList {
        if !is_number(input) {
            return NumberList::new();
        }
        self.trie.reverse(input).into_iter().collect()
    }

    /// The number of length-`len` strings over the digits present in `set`
    /// whose forward lookup differs from themselves. `0` if `set` is empty,
    /// contains no digit symbols, or `len` is `0`.
    pub fn non_trivial_count(&self, set: &str, len: usize) -> usize {
        self.trie.non_trivial_count(set, len)
    }
}
