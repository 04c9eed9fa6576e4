use crate::core::user::UserId;
use crate::graph::debt_graph::{DebtGraph, NodeIndex, UserNode};
use log::debug;
use serde::{Deserialize, Serialize};

/// Users whose unsettled obligations close a loop.
///
/// `members` is the DFS path that was live when the loop closed, seed
/// first. It can start with users who lead into the loop without being
/// part of it; [`Party::minimal_cycle`] gives just the loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    members: Vec<UserId>,
    /// The on-path user whose re-encounter closed the loop.
    closing: UserId,
}

impl Party {
    pub fn members(&self) -> &[UserId] {
        &self.members
    }

    /// The user detection was seeded at.
    pub fn seed(&self) -> Option<&UserId> {
        self.members.first()
    }

    pub fn closing(&self) -> &UserId {
        &self.closing
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, user: &UserId) -> bool {
        self.members.contains(user)
    }

    /// The members from `closing` onward: the loop itself, where the
    /// last user owes the first.
    pub fn minimal_cycle(&self) -> &[UserId] {
        let start = self
            .members
            .iter()
            .position(|m| *m == self.closing)
            .unwrap_or(0);
        &self.members[start..]
    }

    pub fn into_members(self) -> Vec<UserId> {
        self.members
    }
}

/// How the depth-first search walks the graph. Both produce identical
/// results; the iterative walk does not grow the call stack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Traversal {
    Recursive,
    #[default]
    Iterative,
}

/// Look for a party reachable from `seed` using the chosen traversal.
pub fn find_party_with(graph: &DebtGraph, seed: &UserId, traversal: Traversal) -> Option<Party> {
    let party = match traversal {
        Traversal::Recursive => find_party(graph, seed),
        Traversal::Iterative => find_party_iterative(graph, seed),
    };
    match &party {
        Some(p) => debug!("party found from {}: {} members", seed, p.len()),
        None => debug!("no party reachable from {}", seed),
    }
    party
}

/// Depth-first search from `seed` for a loop of debts.
///
/// Neighbors are tried in edge insertion order and the first loop found
/// wins. Each user is entered at most once, so the search terminates on
/// any graph, self-loops and repeated edges included. A seed with no
/// node yields `None`.
pub fn find_party(graph: &DebtGraph, seed: &UserId) -> Option<Party> {
    let start = graph.node_index(seed)?;
    let mut state = DfsState::new(graph.user_count());
    let closing = visit(graph, start, &mut state)?;
    Some(state.into_party(graph, closing))
}

fn visit(graph: &DebtGraph, node: NodeIndex, state: &mut DfsState) -> Option<NodeIndex> {
    state.enter(node);
    for &next in owing_of(graph, node) {
        if !state.visited[next] {
            if let Some(closing) = visit(graph, next, state) {
                return Some(closing);
            }
        } else if state.on_stack[next] {
            return Some(next);
        }
    }
    state.leave(node);
    None
}

/// [`find_party`] with an explicit frame stack instead of recursion.
pub fn find_party_iterative(graph: &DebtGraph, seed: &UserId) -> Option<Party> {
    let start = graph.node_index(seed)?;
    let mut state = DfsState::new(graph.user_count());

    // (node, index of the next outgoing edge to try)
    let mut frames: Vec<(NodeIndex, usize)> = vec![(start, 0)];
    state.enter(start);

    while let Some(frame) = frames.last_mut() {
        let (node, cursor) = *frame;
        match owing_of(graph, node).get(cursor) {
            Some(&next) => {
                frame.1 += 1;
                if !state.visited[next] {
                    state.enter(next);
                    frames.push((next, 0));
                } else if state.on_stack[next] {
                    return Some(state.into_party(graph, next));
                }
            }
            None => {
                frames.pop();
                state.leave(node);
            }
        }
    }
    None
}

fn owing_of(graph: &DebtGraph, node: NodeIndex) -> &[NodeIndex] {
    graph.node(node).map(UserNode::owing_users).unwrap_or(&[])
}

struct DfsState {
    visited: Vec<bool>,
    on_stack: Vec<bool>,
    path: Vec<NodeIndex>,
}

impl DfsState {
    fn new(node_count: usize) -> Self {
        Self {
            visited: vec![false; node_count],
            on_stack: vec![false; node_count],
            path: Vec::new(),
        }
    }

    fn enter(&mut self, node: NodeIndex) {
        self.visited[node] = true;
        self.on_stack[node] = true;
        self.path.push(node);
    }

    fn leave(&mut self, node: NodeIndex) {
        self.on_stack[node] = false;
        self.path.pop();
    }

    fn into_party(self, graph: &DebtGraph, closing: NodeIndex) -> Party {
        let name = |idx: NodeIndex| {
            graph
                .node(idx)
                .map(|n| n.name().clone())
                .unwrap_or_default()
        };
        Party {
            members: self.path.iter().map(|&idx| name(idx)).collect(),
            closing: name(closing),
        }
    }
}
