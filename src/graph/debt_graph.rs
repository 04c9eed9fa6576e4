use crate::core::iou::Iou;
use crate::core::user::UserId;
use log::{debug, warn};
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex as PetIndex};
use std::collections::HashMap;

/// Position of a [`UserNode`] in its graph's arena.
pub type NodeIndex = usize;

/// One user in the debt graph and the users they owe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserNode {
    name: UserId,
    /// Outgoing edges in insertion order. Repeated IOUs between the same
    /// pair appear once per IOU.
    owing: Vec<NodeIndex>,
}

impl UserNode {
    fn new(name: UserId) -> Self {
        Self {
            name,
            owing: Vec::new(),
        }
    }

    pub fn name(&self) -> &UserId {
        &self.name
    }

    pub fn owing_users(&self) -> &[NodeIndex] {
        &self.owing
    }
}

/// Directed graph of unsettled obligations between users.
///
/// An edge `giver -> receiver` means "giver owes receiver". Nodes live in
/// an arena keyed by [`UserId`] (at most one node per user) and edges are
/// arena indices, so the graph holds no shared references. A graph is
/// built fresh for every detection and never updated incrementally.
///
/// # Examples
///
/// ```
/// use iou_party::core::iou::Iou;
/// use iou_party::core::user::UserId;
/// use iou_party::graph::debt_graph::DebtGraph;
/// use uuid::Uuid;
///
/// let ious = vec![
///     Iou::owe(UserId::new("alice"), Some(UserId::new("bob")), Uuid::new_v4()),
///     Iou::owe(UserId::new("bob"), None, Uuid::new_v4()),
/// ];
/// let graph = DebtGraph::from_ious(&ious);
///
/// assert_eq!(graph.user_count(), 2);
/// assert_eq!(graph.edge_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DebtGraph {
    nodes: Vec<UserNode>,
    index: HashMap<UserId, NodeIndex>,
    edge_count: usize,
}

impl DebtGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from a sequence of IOU records.
    ///
    /// Claimed records and records without a giver are skipped; a record
    /// without a receiver contributes its giver's node but no edge.
    pub fn from_ious<'a>(ious: impl IntoIterator<Item = &'a Iou>) -> Self {
        let mut graph = Self::new();
        let mut skipped = 0usize;
        for iou in ious {
            if !graph.add_iou(iou) {
                skipped += 1;
            }
        }
        debug!(
            "built debt graph: {} users, {} edges, {} records skipped",
            graph.user_count(),
            graph.edge_count(),
            skipped
        );
        graph
    }

    /// Add one record. Returns `false` if the record was skipped.
    pub fn add_iou(&mut self, iou: &Iou) -> bool {
        if iou.is_claimed() {
            return false;
        }
        if iou.giver().is_blank() {
            warn!("skipping IOU {}: record has no giver", iou.id());
            return false;
        }
        match iou.edge() {
            Some((giver, receiver)) => self.add_edge(giver, receiver),
            None => {
                self.ensure_node(iou.giver());
            }
        }
        true
    }

    /// Index of the node for `user`, creating it if absent.
    pub fn ensure_node(&mut self, user: &UserId) -> NodeIndex {
        if let Some(&idx) = self.index.get(user) {
            return idx;
        }
        let idx = self.nodes.len();
        self.nodes.push(UserNode::new(user.clone()));
        self.index.insert(user.clone(), idx);
        idx
    }

    /// Record that `giver` owes `receiver`.
    pub fn add_edge(&mut self, giver: &UserId, receiver: &UserId) {
        let from = self.ensure_node(giver);
        let to = self.ensure_node(receiver);
        self.nodes[from].owing.push(to);
        self.edge_count += 1;
    }

    pub fn node_index(&self, user: &UserId) -> Option<NodeIndex> {
        self.index.get(user).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> Option<&UserNode> {
        self.nodes.get(idx)
    }

    pub fn contains(&self, user: &UserId) -> bool {
        self.index.contains_key(user)
    }

    /// Number of distinct users in the graph.
    pub fn user_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges, counting repeated pairs.
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Users in node creation order.
    pub fn users(&self) -> impl Iterator<Item = &UserId> {
        self.nodes.iter().map(UserNode::name)
    }

    /// The users `user` owes, in edge insertion order.
    pub fn owing(&self, user: &UserId) -> Vec<&UserId> {
        self.node_index(user)
            .map(|idx| {
                self.nodes[idx]
                    .owing
                    .iter()
                    .map(|&to| self.nodes[to].name())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// True when no cycle exists anywhere in the graph.
    pub fn is_acyclic(&self) -> bool {
        let mut g: DiGraph<(), ()> = DiGraph::with_capacity(self.nodes.len(), self.edge_count);
        let handles: Vec<PetIndex> = self.nodes.iter().map(|_| g.add_node(())).collect();
        for (from, node) in self.nodes.iter().enumerate() {
            for &to in &node.owing {
                g.add_edge(handles[from], handles[to], ());
            }
        }
        !is_cyclic_directed(&g)
    }
}
