//! Selector resolution over the live tree.
//!
//! Pure, stateless lookups: a chain's strategies are tried in priority
//! order against a scope, and the first strategy yielding any result wins.
//! Results of different strategies are never merged; mixing node shapes
//! from incompatible strategies is worse than returning fewer nodes.
//! "Nothing found" is a normal terminal case, not an error; callers decide
//! whether absence is fatal.

use crate::domain::{LocatorChain, NodeRef};

/// First node under `scope` matching the chain, in document order.
#[must_use]
pub fn resolve(chain: &LocatorChain, scope: &NodeRef) -> Option<NodeRef> {
    for strategy in chain {
        if let Some(node) = scope
            .descendants()
            .into_iter()
            .find(|n| strategy.matches(n))
        {
            return Some(node);
        }
    }
    None
}

/// All nodes under `scope` matching the first strategy that matches
/// anything. Possibly empty.
#[must_use]
pub fn resolve_all(chain: &LocatorChain, scope: &NodeRef) -> Vec<NodeRef> {
    for strategy in chain {
        let hits: Vec<NodeRef> = scope
            .descendants()
            .into_iter()
            .filter(|n| strategy.matches(n))
            .collect();
        if !hits.is_empty() {
            return hits;
        }
    }
    Vec::new()
}

/// Whether the node itself, or any of its descendants, matches the chain.
/// Used for role inference, where a marker may sit on the message node or
/// on a wrapper inside it.
#[must_use]
pub fn matches_within(chain: &LocatorChain, node: &NodeRef) -> bool {
    chain.iter().any(|strategy| {
        strategy.matches(node) || node.descendants().iter().any(|d| strategy.matches(d))
    })
}
