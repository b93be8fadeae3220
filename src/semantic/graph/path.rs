//! Join path search.
//!
//! Relationships are traversed in either direction. Search is Dijkstra over
//! `(table, hops)` states so the hop limit prunes paths regardless of cost.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet, VecDeque};

use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::semantic::error::{PathError, PathResult};

use super::{IndexSuggestion, JoinPath, JoinPathOutcome, JoinStep, JoinType, RelationshipGraph};

/// A partial path on the search frontier.
struct Label {
    cost: f64,
    node: NodeIndex,
    nodes: Vec<NodeIndex>,
    edges: Vec<EdgeIndex>,
    /// Table names visited, for tie-breaking.
    tables: Vec<String>,
    /// Relationship ids traversed, for tie-breaking.
    rel_ids: Vec<String>,
}

impl Label {
    fn hops(&self) -> usize {
        self.edges.len()
    }

    /// Total order: cost, hops, visited table names, relationship ids.
    fn key_cmp(&self, other: &Self) -> Ordering {
        self.cost
            .total_cmp(&other.cost)
            .then_with(|| self.hops().cmp(&other.hops()))
            .then_with(|| self.tables.cmp(&other.tables))
            .then_with(|| self.rel_ids.cmp(&other.rel_ids))
    }
}

impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool {
        self.key_cmp(other) == Ordering::Equal
    }
}

impl Eq for Label {}

impl PartialOrd for Label {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Label {
    // Reversed so BinaryHeap pops the smallest key first.
    fn cmp(&self, other: &Self) -> Ordering {
        other.key_cmp(self)
    }
}

impl RelationshipGraph {
    /// Find the cheapest join path from `from` to `to` using at most `max_hops` joins.
    ///
    /// `Unreachable` and `BeyondHopLimit` are distinct outcomes: the first
    /// means no path exists at all, the second reports how many hops the
    /// shortest path needs.
    pub fn find_join_path(&self, from: &str, to: &str, max_hops: usize) -> PathResult<JoinPathOutcome> {
        let from_idx = self
            .node_index(from)
            .ok_or_else(|| PathError::UnknownTable(from.into()))?;
        let to_idx = self
            .node_index(to)
            .ok_or_else(|| PathError::UnknownTable(to.into()))?;

        // Same table = empty path
        if from_idx == to_idx {
            let name = self.graph[from_idx].id.clone();
            return Ok(JoinPathOutcome::Found(JoinPath {
                from: name.clone(),
                to: name,
                steps: Vec::new(),
                estimated_cost: 0.0,
                suggested_indexes: Vec::new(),
            }));
        }

        if let Some(label) = self.cheapest_within(from_idx, to_idx, max_hops) {
            let path = self.materialize(from_idx, &label);
            tracing::debug!(
                from = %path.from,
                to = %path.to,
                hops = path.hops(),
                cost = path.estimated_cost,
                "join path found"
            );
            return Ok(JoinPathOutcome::Found(path));
        }

        Ok(match self.min_hops(from_idx, to_idx) {
            Some(required_hops) => JoinPathOutcome::BeyondHopLimit {
                required_hops,
                max_hops,
            },
            None => JoinPathOutcome::Unreachable,
        })
    }

    /// Tables directly connected to `table` in either direction, sorted by name.
    pub fn related_tables(&self, table: &str) -> PathResult<Vec<String>> {
        let idx = self
            .node_index(table)
            .ok_or_else(|| PathError::UnknownTable(table.into()))?;

        let mut related: Vec<String> = self
            .neighbors_undirected(idx)
            .filter(|(_, other)| *other != idx)
            .map(|(_, other)| self.graph[other].id.clone())
            .collect();
        related.sort();
        related.dedup();
        Ok(related)
    }

    /// Every edge touching `node`, paired with the node on the other end.
    fn neighbors_undirected(&self, node: NodeIndex) -> impl Iterator<Item = (EdgeIndex, NodeIndex)> + '_ {
        let outgoing = self
            .graph
            .edges_directed(node, Direction::Outgoing)
            .map(|e| (e.id(), e.target()));
        let incoming = self
            .graph
            .edges_directed(node, Direction::Incoming)
            .map(|e| (e.id(), e.source()));
        outgoing.chain(incoming)
    }

    fn cheapest_within(&self, from: NodeIndex, to: NodeIndex, max_hops: usize) -> Option<Label> {
        let mut settled: HashSet<(NodeIndex, usize)> = HashSet::new();
        let mut heap = BinaryHeap::new();

        heap.push(Label {
            cost: 0.0,
            node: from,
            nodes: vec![from],
            edges: Vec::new(),
            tables: vec![self.graph[from].id.clone()],
            rel_ids: Vec::new(),
        });

        while let Some(label) = heap.pop() {
            if label.node == to {
                return Some(label);
            }
            if !settled.insert((label.node, label.hops())) {
                continue;
            }
            if label.hops() >= max_hops {
                continue;
            }

            for (edge_idx, next) in self.neighbors_undirected(label.node) {
                // No table appears twice in a path.
                if label.nodes.contains(&next) {
                    continue;
                }
                if settled.contains(&(next, label.hops() + 1)) {
                    continue;
                }
                let edge = &self.graph[edge_idx];

                let mut nodes = label.nodes.clone();
                nodes.push(next);
                let mut edges = label.edges.clone();
                edges.push(edge_idx);
                let mut tables = label.tables.clone();
                tables.push(self.graph[next].id.clone());
                let mut rel_ids = label.rel_ids.clone();
                rel_ids.push(edge.relationship.id.clone());

                heap.push(Label {
                    cost: label.cost + edge.weight,
                    node: next,
                    nodes,
                    edges,
                    tables,
                    rel_ids,
                });
            }
        }

        None
    }

    /// Minimum hop count between two nodes ignoring any limit (BFS).
    fn min_hops(&self, from: NodeIndex, to: NodeIndex) -> Option<usize> {
        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut queue: VecDeque<(NodeIndex, usize)> = VecDeque::new();

        visited.insert(from);
        queue.push_back((from, 0));

        while let Some((current, hops)) = queue.pop_front() {
            for (_, neighbor) in self.neighbors_undirected(current) {
                if neighbor == to {
                    return Some(hops + 1);
                }
                if visited.insert(neighbor) {
                    queue.push_back((neighbor, hops + 1));
                }
            }
        }

        None
    }

    fn materialize(&self, from: NodeIndex, label: &Label) -> JoinPath {
        let mut steps = Vec::with_capacity(label.edges.len());
        let mut suggested_indexes: Vec<IndexSuggestion> = Vec::new();
        let mut current = from;

        for (&edge_idx, &next) in label.edges.iter().zip(label.nodes.iter().skip(1)) {
            let edge = &self.graph[edge_idx];
            let rel = &edge.relationship;
            let here = &self.graph[current];
            let there = &self.graph[next];

            // Column on each side of the join, in traversal order.
            let forward = self
                .graph
                .edge_endpoints(edge_idx)
                .map(|(source, _)| source == current)
                .unwrap_or(true);
            let (here_col, there_col) = if forward {
                (&rel.from_column, &rel.to_column)
            } else {
                (&rel.to_column, &rel.from_column)
            };

            let join_type = if here.is_nullable(here_col) || there.is_nullable(there_col) {
                JoinType::Left
            } else {
                JoinType::Inner
            };

            for (table, column) in [(here, here_col), (there, there_col)] {
                if table.is_indexed(column) {
                    continue;
                }
                let suggestion = IndexSuggestion {
                    table: table.id.clone(),
                    column: column.clone(),
                };
                if !suggested_indexes.contains(&suggestion) {
                    suggested_indexes.push(suggestion);
                }
            }

            steps.push(JoinStep {
                from_table: here.id.clone(),
                to_table: there.id.clone(),
                join_type,
                on_clause: format!("{}.{} = {}.{}", here.id, here_col, there.id, there_col),
                relationship: rel.clone(),
            });
            current = next;
        }

        JoinPath {
            from: self.graph[from].id.clone(),
            to: self.graph[current].id.clone(),
            steps,
            estimated_cost: label.cost,
            suggested_indexes,
        }
    }
}
