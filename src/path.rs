//! Path graph: prefix doubling and BWT-ordered edge generation.
//!
//! A [`PathGraph`] assigns every node of a reverse-deterministic
//! [`RefGraph`] a total order by the infinite label sequences leaving it.
//! Each [`PathNode`] represents a path of length `2^generation` in the
//! reference graph; a generation joins paths of length `2^k` into paths of
//! length `2^(k+1)` and refines the sort keys until every node is uniquely
//! identified by its key. The per-generation strategy changes as the keys
//! outgrow bit packing and sorted nodes start to accumulate:
//!
//! * generation 1 builds a direct-access join index with a counting sort;
//! * generations 2 and 3 reuse the `from` order left by the previous join;
//! * generation 4 switches from packed integer keys to key pairs, sorts the
//!   whole array, and starts pruning;
//! * later generations carry sorted nodes through unchanged and only join
//!   and re-rank the rest.
//!
//! Once sorted, [`PathGraph::generate_edges`] produces the BWT-ordered edge
//! array, and [`PathGraph::rows`] emits one `(bwt, F, M, position)` row per
//! edge for the downstream index builder.

use crate::graph::{label_rank, RefGraph, LABEL_COUNT};
use crate::sort::{bin_sort_copy, bin_sort_in_place};
use crate::{try_alloc, Config, ConstructionError, PATH_SORTED};

use std::cmp::Ordering;
use std::iter::FusedIterator;
use std::mem;
use std::ops::Range;


//-----------------------------------------------------------------------------

// Keys packed by the early generations fit in 24 bits.
const PACKED_KEY_BOUND: usize = (1 << 24) - 1;

// The key partition of a finite graph cannot be refined forever.
const MAX_GENERATIONS: usize = 64;

/// A path of length `2^generation` in the reference graph.
///
/// The path starts at reference node `from` and ends at `to`; `key` sorts
/// the paths by their label sequences, and its first component becomes the
/// final rank. A node with `to == PATH_SORTED` is uniquely identified by its
/// label prefix and is carried through the remaining generations unchanged.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PathNode {
    /// First reference node of the path.
    pub from: usize,
    /// Last reference node of the path, or [`PATH_SORTED`].
    pub to: usize,
    /// Sort key of the path.
    pub key: (usize, usize),
}

impl PathNode {
    /// Returns `true` if the node no longer needs extending.
    #[inline]
    pub fn is_sorted(&self) -> bool {
        self.to == PATH_SORTED
    }

    #[inline]
    fn set_sorted(&mut self) {
        self.to = PATH_SORTED;
    }
}

fn key_cmp(a: &PathNode, b: &PathNode) -> Ordering {
    a.key.cmp(&b.key)
}

fn from_cmp(a: &PathNode, b: &PathNode) -> Ordering {
    a.from.cmp(&b.from)
}

/// A labelled edge between path nodes.
///
/// Before [`PathGraph::generate_edges`] finishes, `from` is a reference node
/// identifier; afterwards it is an index into the path node array. `ranking`
/// is the rank of the destination path node.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PathEdge {
    /// Source of the edge.
    pub from: usize,
    /// Rank of the destination path node.
    pub ranking: usize,
    /// Label of the edge.
    pub label: u8,
}

fn ranking_cmp(a: &PathEdge, b: &PathEdge) -> Ordering {
    a.ranking.cmp(&b.ranking)
}

/// One row of the output stream: a BWT character with its F and M bits and
/// the genomic position of the corresponding node.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BwtRow {
    /// BWT character.
    pub bwt: u8,
    /// Set on the first incoming edge of each node.
    pub f: bool,
    /// Set on the first outgoing slot of each node.
    pub m: bool,
    /// Genomic position of the node the M bit counts.
    pub pos: usize,
}

//-----------------------------------------------------------------------------

/// The prefix-sorted path graph over a reference graph.
///
/// # Examples
///
/// ```
/// use gcsa::{Config, PathGraph, RefGraph, SequenceChunk};
///
/// // ACGT with no variants: a linear graph.
/// let reference = vec![0, 1, 2, 3];
/// let chunks = vec![SequenceChunk { len: 4, off: 0 }];
/// let config = Config::default();
/// let graph = RefGraph::new(&reference, &chunks, &[], &config).unwrap();
///
/// let mut paths = PathGraph::new(&graph, &config).unwrap();
/// assert!(paths.is_sorted());
/// paths.generate_edges(&graph).unwrap();
///
/// let rows: Vec<_> = paths.rows().collect();
/// assert_eq!(rows.len(), 5);
/// assert!(rows.iter().all(|row| row.f && row.m));
/// ```
#[derive(Clone, Debug)]
pub struct PathGraph {
    threads: usize,
    verbose: bool,

    past_nodes: Vec<PathNode>,
    nodes: Vec<PathNode>,
    edges: Vec<PathEdge>,

    ranks: usize,
    // Number of reference graph nodes; bounds the `from` fields.
    max_from: usize,
    // Number of nodes created by the latest join before pruning.
    temp_nodes: usize,

    generation: usize,
    sorted: bool,
    has_edges: bool,
}

impl PathGraph {
    /// Runs prefix doubling over the given reference graph until every path
    /// node is uniquely ranked.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError::OutOfMemory`] if a node array cannot be
    /// allocated and [`ConstructionError::InvariantViolation`] if doubling
    /// fails to converge.
    pub fn new(base: &RefGraph, config: &Config) -> Result<PathGraph, ConstructionError> {
        let mut graph = PathGraph {
            threads: config.threads.max(1),
            verbose: config.verbose,
            past_nodes: Vec::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
            ranks: 0,
            max_from: base.num_nodes(),
            temp_nodes: 0,
            generation: 0,
            sorted: false,
            has_edges: false,
        };

        graph.create_from_ref(base)?;
        graph.generation_one()?;
        while graph.generation < 3 {
            graph.early_generation()?;
        }
        graph.first_prune_generation()?;
        while !graph.sorted {
            if graph.generation >= MAX_GENERATIONS {
                return Err(ConstructionError::InvariantViolation(
                    "prefix doubling did not converge",
                ));
            }
            mem::swap(&mut graph.past_nodes, &mut graph.nodes);
            graph.late_generation()?;
        }
        graph.past_nodes = Vec::new();
        Ok(graph)
    }

    /// Returns the number of path nodes.
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of path edges. This is `0` until
    /// [`PathGraph::generate_edges`] has been called.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Returns `true` if every path node is uniquely ranked.
    #[inline]
    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    /// Returns the number of generations the doubling ran for.
    #[inline]
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Returns the `i`th path node.
    ///
    /// # Panics
    ///
    /// May panic if `i >= self.num_nodes()`.
    #[inline]
    pub fn node(&self, i: usize) -> PathNode {
        self.nodes[i]
    }

    /// Returns the `i`th path edge.
    ///
    /// # Panics
    ///
    /// May panic if `i >= self.num_edges()`.
    #[inline]
    pub fn edge(&self, i: usize) -> PathEdge {
        self.edges[i]
    }
}

//-----------------------------------------------------------------------------

/// The doubling generations.
impl PathGraph {
    // One path node per reference graph edge, keyed by the label of the
    // source node, plus a sentinel node for the tail.
    fn create_from_ref(&mut self, base: &RefGraph) -> Result<(), ConstructionError> {
        self.temp_nodes = base.num_edges() + 1;
        let mut nodes: Vec<PathNode> = try_alloc(self.temp_nodes)?;
        for i in 0..base.num_edges() {
            let edge = base.edge(i);
            nodes.push(PathNode {
                from: edge.from,
                to: edge.to,
                key: (label_rank(base.node(edge.from).label), 0),
            });
        }
        let last = base.last_node();
        nodes.push(PathNode {
            from: last,
            to: last,
            key: (label_rank(b'Z'), 0),
        });
        let len = nodes.len();
        self.nodes = nodes;
        self.print_info(len);
        Ok(())
    }

    // Joins the initial nodes with themselves. The nodes are first ordered
    // by `from` with a counting sort; the join leaves the new generation
    // ordered by `from` as well, which the early generations rely on.
    fn generation_one(&mut self) -> Result<(), ConstructionError> {
        self.generation += 1;

        let mut from_index = vec![0usize; self.max_from + 1];
        for node in self.nodes.iter() {
            from_index[node.from] += 1;
        }
        let mut total = from_index[0];
        from_index[0] = 0;
        for i in 1..from_index.len() {
            total += from_index[i];
            from_index[i] = total - from_index[i];
        }

        let mut from_table: Vec<PathNode> = try_alloc(self.nodes.len())?;
        from_table.resize(self.nodes.len(), PathNode::default());
        for node in self.nodes.iter() {
            from_table[from_index[node.from]] = *node;
            from_index[node.from] += 1;
        }

        // Reset the index to range starts.
        for i in (1..from_index.len()).rev() {
            from_index[i] = from_index[i - 1];
        }
        from_index[0] = 0;

        self.temp_nodes = 0;
        for node in from_table.iter() {
            self.temp_nodes += from_index[node.to + 1] - from_index[node.to];
        }

        let mut new_nodes: Vec<PathNode> = try_alloc(self.temp_nodes)?;
        let shift = 3 * (1usize << (self.generation - 1));
        for node in from_table.iter() {
            for j in from_index[node.to]..from_index[node.to + 1] {
                new_nodes.push(PathNode {
                    from: node.from,
                    to: from_table[j].to,
                    key: ((node.key.0 << shift) + from_table[j].key.0, 0),
                });
            }
        }
        let len = new_nodes.len();
        self.past_nodes = new_nodes;
        self.nodes = Vec::new();
        self.print_info(len);
        Ok(())
    }

    // Generations 2 and 3: the previous generation is already ordered by
    // `from`, so the join index is a single scan. Keys still fit in packed
    // integers.
    fn early_generation(&mut self) -> Result<(), ConstructionError> {
        self.generation += 1;

        let mut from_index = vec![0usize; self.max_from + 1];
        for i in 0..self.past_nodes.len() {
            from_index[self.past_nodes[i].from + 1] = i + 1;
        }

        self.temp_nodes = 0;
        for node in self.past_nodes.iter() {
            self.temp_nodes += from_index[node.to + 1] - from_index[node.to];
        }

        let mut new_nodes: Vec<PathNode> = try_alloc(self.temp_nodes)?;
        let shift = 3 * (1usize << (self.generation - 1));
        for node in self.past_nodes.iter() {
            for j in from_index[node.to]..from_index[node.to + 1] {
                new_nodes.push(PathNode {
                    from: node.from,
                    to: self.past_nodes[j].to,
                    key: ((node.key.0 << shift) + self.past_nodes[j].key.0, 0),
                });
            }
        }
        let len = new_nodes.len();
        self.past_nodes = new_nodes;
        self.print_info(len);
        Ok(())
    }

    // Generation 4: the keys have outgrown bit packing, so the join keys the
    // new nodes with pairs of previous ranks, sorts the whole array, and
    // starts merging.
    fn first_prune_generation(&mut self) -> Result<(), ConstructionError> {
        self.generation += 1;

        let mut from_index = vec![0usize; self.max_from + 1];
        for i in 0..self.past_nodes.len() {
            from_index[self.past_nodes[i].from + 1] = i + 1;
        }

        self.temp_nodes = 0;
        for node in self.past_nodes.iter() {
            self.temp_nodes += from_index[node.to + 1] - from_index[node.to];
        }

        let mut joined: Vec<PathNode> = try_alloc(self.temp_nodes)?;
        for node in self.past_nodes.iter() {
            for j in from_index[node.to]..from_index[node.to + 1] {
                joined.push(PathNode {
                    from: node.from,
                    to: self.past_nodes[j].to,
                    key: (node.key.0, self.past_nodes[j].key.0),
                });
            }
        }

        let mut sorted_nodes: Vec<PathNode> = try_alloc(joined.len())?;
        sorted_nodes.resize(joined.len(), PathNode::default());
        bin_sort_copy(
            &joined,
            &mut sorted_nodes,
            |n: &PathNode| n.key.0,
            key_cmp,
            PACKED_KEY_BOUND,
            self.threads,
        );
        drop(joined);

        self.nodes = sorted_nodes;
        self.past_nodes = Vec::new();
        self.merge_update_rank();
        self.print_info(self.nodes.len());
        Ok(())
    }

    // Generations 5 and later: sorted nodes are carried through unchanged,
    // the rest are joined. The previous generation is grouped by its ranks,
    // so the new nodes only need sorting within each group.
    fn late_generation(&mut self) -> Result<(), ConstructionError> {
        self.generation += 1;
        debug_assert!(self.past_nodes.len() != self.ranks);

        let mut from_table: Vec<PathNode> = try_alloc(self.past_nodes.len())?;
        from_table.resize(self.past_nodes.len(), PathNode::default());
        bin_sort_copy(
            &self.past_nodes,
            &mut from_table,
            |n: &PathNode| n.from,
            from_cmp,
            self.max_from,
            self.threads,
        );

        let mut from_index = vec![0usize; self.max_from + 1];
        for i in 0..from_table.len() {
            from_index[from_table[i].from + 1] = i + 1;
        }

        self.temp_nodes = 0;
        for node in self.past_nodes.iter() {
            if node.is_sorted() {
                self.temp_nodes += 1;
            } else {
                self.temp_nodes += from_index[node.to + 1] - from_index[node.to];
            }
        }

        let mut nodes: Vec<PathNode> = try_alloc(self.temp_nodes)?;
        for node in self.past_nodes.iter() {
            if node.is_sorted() {
                nodes.push(*node);
            } else {
                for j in from_index[node.to]..from_index[node.to + 1] {
                    nodes.push(PathNode {
                        from: node.from,
                        to: from_table[j].to,
                        key: (node.key.0, from_table[j].key.0),
                    });
                }
            }
        }
        drop(from_table);

        // Group by the previous rank and collapse or re-rank each group.
        self.ranks = 0;
        let mut write = 0;
        let mut block_start = 0;
        let len = nodes.len();
        for i in 1..=len {
            if i == len || nodes[i].key.0 != nodes[block_start].key.0 {
                write = self.process_block(&mut nodes, block_start, i, write);
                block_start = i;
            }
        }
        nodes.truncate(write);

        self.nodes = nodes;
        self.merge_update_rank();
        self.print_info(self.nodes.len());
        Ok(())
    }

    // Handles one block of nodes sharing the previous rank: sorts the block,
    // collapses each run of equal keys that starts in a single reference
    // node, and assigns the next ranks. A node whose path extends an already
    // sorted node with the same origin is dropped. Returns the new write
    // position.
    fn process_block(
        &mut self,
        nodes: &mut [PathNode],
        start: usize,
        end: usize,
        mut write: usize,
    ) -> usize {
        if end - start > 1 {
            nodes[start..end].sort_unstable_by(key_cmp);
            let mut run_start = start;
            while run_start < end {
                let mut run_end = run_start + 1;
                while run_end < end && nodes[run_end].key == nodes[run_start].key {
                    run_end += 1;
                }
                let mergeable = nodes[run_start..run_end]
                    .iter()
                    .all(|n| n.from == nodes[run_start].from);
                if !mergeable {
                    for i in run_start..run_end {
                        nodes[i].key.0 = self.ranks;
                        nodes[write] = nodes[i];
                        write += 1;
                    }
                    self.ranks += 1;
                } else if write == 0
                    || !nodes[write - 1].is_sorted()
                    || nodes[write - 1].from != nodes[run_start].from
                {
                    let mut node = nodes[run_start];
                    node.set_sorted();
                    node.key.0 = self.ranks;
                    self.ranks += 1;
                    nodes[write] = node;
                    write += 1;
                }
                run_start = run_end;
            }
        } else if write == 0
            || !nodes[write - 1].is_sorted()
            || nodes[write - 1].from != nodes[start].from
        {
            nodes[start].key.0 = self.ranks;
            self.ranks += 1;
            nodes[write] = nodes[start];
            write += 1;
        }
        write
    }

    // Re-ranks and merges the freshly sorted node array. The full pass only
    // runs for generation 4: the later generations arrive here with their
    // ranks already assigned and their mergeable runs already collapsed by
    // the block scan, so only the completion check remains.
    fn merge_update_rank(&mut self) {
        if self.generation == 4 {
            // Assign ranks by distinct keys.
            let mut rank = 0;
            let mut key = self.nodes[0].key;
            for node in self.nodes.iter_mut() {
                if node.key != key {
                    key = node.key;
                    rank += 1;
                }
                node.key = (rank, 0);
            }
            self.ranks = rank + 1;

            // Collapse each maximal mergeable set into its first member.
            let mut write = 0;
            let mut range = 0..0;
            loop {
                range = self.next_maximal_set(range);
                if range.start >= range.end {
                    break;
                }
                self.nodes[write] = self.nodes[range.start];
                write += 1;
            }
            self.nodes.truncate(write);

            // A node that is the sole bearer of its key is sorted.
            let mut candidate = Some(0);
            let mut key = self.nodes[0].key;
            self.ranks = 1;
            for i in 1..self.nodes.len() {
                if self.nodes[i].key != key {
                    if let Some(c) = candidate {
                        self.nodes[c].set_sorted();
                    }
                    candidate = Some(i);
                    key = self.nodes[i].key;
                    self.ranks += 1;
                } else {
                    candidate = None;
                }
            }
            if let Some(c) = candidate {
                self.nodes[c].set_sorted();
            }
        }

        // Replace the ranks of a fully sorted graph so that rank `i` is node
        // `i`; merges may otherwise leave gaps in the ranks. Every node is
        // now uniquely ranked, so all of them count as sorted.
        if self.ranks == self.nodes.len() {
            for (i, node) in self.nodes.iter_mut().enumerate() {
                node.key.0 = i;
                node.set_sorted();
            }
            self.sorted = true;
        }
    }

    // Returns the next maximal mergeable set of path nodes. A set of nodes
    // with adjacent keys is mergeable if every member starts in the same
    // reference node and no other node shares any of the keys. If the
    // maximal set is empty, returns the next node by itself.
    fn next_maximal_set(&self, range: Range<usize>) -> Range<usize> {
        if range.end >= self.nodes.len() {
            return 0..0;
        }
        let start = range.end;
        let mut end = start + 1;
        if start > 0 && self.nodes[start - 1].key == self.nodes[start].key {
            return start..end;
        }
        for i in start + 1..self.nodes.len() {
            if self.nodes[i - 1].key != self.nodes[i].key {
                end = i;
            }
            if self.nodes[i].from != self.nodes[start].from {
                return start..end;
            }
        }
        start..self.nodes.len()
    }

    fn print_info(&self, new_nodes: usize) {
        if self.verbose {
            eprintln!(
                "Generation {} ({} -> {} nodes, {} ranks)",
                self.generation, self.temp_nodes, new_nodes, self.ranks
            );
        }
    }
}

//-----------------------------------------------------------------------------

/// Edge generation and output streams.
impl PathGraph {
    /// Produces the BWT-ordered edge array.
    ///
    /// On return the path nodes are in rank order, `key.0` of each node is
    /// its out-degree, `key.1` is the exclusive upper bound of its incoming
    /// edge range, and `to` is the genomic position of the node. The path
    /// node of the head has been removed and its edge relabelled from `Y` to
    /// `Z`, making the order cyclic.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError::InvariantViolation`] if the graph is not
    /// sorted.
    pub fn generate_edges(&mut self, base: &RefGraph) -> Result<(), ConstructionError> {
        if !self.sorted {
            return Err(ConstructionError::InvariantViolation(
                "edge generation requires a sorted path graph",
            ));
        }
        if self.has_edges {
            return Err(ConstructionError::InvariantViolation(
                "the edges have already been generated",
            ));
        }

        // Order the nodes by `from` and replace `to` with the genomic
        // position; the path endpoints are no longer needed.
        bin_sort_in_place(
            &mut self.nodes,
            |n: &PathNode| n.from,
            from_cmp,
            self.max_from,
            self.threads,
        );
        for node in self.nodes.iter_mut() {
            node.to = base.node(node.from).value;
        }

        let mut from_index = vec![0usize; self.max_from + 1];
        for i in 0..self.nodes.len() {
            from_index[self.nodes[i].from + 1] = i + 1;
        }

        // One path edge per (reference edge, path node at its destination),
        // bucketed by label during emission.
        let mut label_index = [0usize; LABEL_COUNT];
        for i in 0..base.num_edges() {
            let edge = base.edge(i);
            let rank = label_rank(base.node(edge.from).label);
            label_index[rank] += from_index[edge.to + 1] - from_index[edge.to];
        }
        let mut total = label_index[0];
        label_index[0] = 0;
        for i in 1..LABEL_COUNT {
            total += label_index[i];
            label_index[i] = total - label_index[i];
        }

        let mut edges: Vec<PathEdge> = try_alloc(total)?;
        edges.resize(total, PathEdge::default());
        for i in 0..base.num_edges() {
            let edge = base.edge(i);
            let label = base.node(edge.from).label;
            let rank = label_rank(label);
            for j in from_index[edge.to]..from_index[edge.to + 1] {
                edges[label_index[rank]] = PathEdge {
                    from: edge.from,
                    ranking: self.nodes[j].key.0,
                    label: label,
                };
                label_index[rank] += 1;
            }
        }
        drop(from_index);

        // Sort each label bucket by ranking. The base buckets are large; the
        // head and tail buckets hold at most a few edges.
        let ends = label_index;
        let mut start = 0;
        for rank in 0..LABEL_COUNT {
            let end = ends[rank];
            if rank < 4 {
                bin_sort_in_place(
                    &mut edges[start..end],
                    |e: &PathEdge| e.ranking,
                    ranking_cmp,
                    self.nodes.len() - 1,
                    self.threads,
                );
            } else {
                edges[start..end].sort_unstable_by(ranking_cmp);
            }
            start = end;
        }

        // Back to rank order.
        let nodes_max_key = self.nodes.len() - 1;
        bin_sort_in_place(
            &mut self.nodes,
            |n: &PathNode| n.key.0,
            key_cmp,
            nodes_max_key,
            self.threads,
        );

        // Walk the nodes and the edges in tandem, replacing each edge source
        // with the index of the path node it leaves and repurposing `key.0`
        // as the out-degree.
        let mut node_idx = 0;
        let mut edge_idx = 0;
        self.nodes[0].key.0 = 0;
        while node_idx < self.nodes.len() && edge_idx < edges.len() {
            if edges[edge_idx].from == self.nodes[node_idx].from {
                edges[edge_idx].from = node_idx;
                edge_idx += 1;
                self.nodes[node_idx].key.0 += 1;
            } else {
                node_idx += 1;
                if node_idx < self.nodes.len() {
                    self.nodes[node_idx].key.0 = 0;
                }
            }
        }

        // Remove the path node of the head: it would be a dead end in the
        // cyclic order. The tail node takes its place in the rank order and
        // inherits its out-degree.
        debug_assert!(self.nodes.len() > 2);
        let len = self.nodes.len();
        self.nodes[len - 1].key.0 = self.nodes[len - 2].key.0;
        self.nodes[len - 2] = self.nodes[len - 1];
        self.nodes.pop();
        for edge in edges.iter_mut() {
            if edge.label == b'Y' {
                edge.label = b'Z';
            } else if edge.ranking >= self.nodes.len() {
                debug_assert_eq!(edge.ranking, self.nodes.len());
                edge.ranking -= 1;
            }
        }

        // Sort all edges by ranking and index the incoming edge range of
        // each node in `key.1`.
        bin_sort_in_place(
            &mut edges,
            |e: &PathEdge| e.ranking,
            ranking_cmp,
            self.nodes.len() - 1,
            self.threads,
        );
        for i in 0..edges.len() {
            self.nodes[edges[i].ranking].key.1 = i + 1;
        }

        self.edges = edges;
        self.has_edges = true;
        Ok(())
    }

    // Returns the incoming edge range of the given node.
    fn incoming_edges(&self, node: usize) -> Range<usize> {
        if self.nodes[node].key.1 == 0 {
            return 0..0;
        }
        if node == 0 {
            0..self.nodes[node].key.1
        } else {
            self.nodes[node - 1].key.1..self.nodes[node].key.1
        }
    }

    /// Returns an iterator over the output rows, one per edge in the final
    /// order.
    ///
    /// # Panics
    ///
    /// Panics if [`PathGraph::generate_edges`] has not been called.
    pub fn rows(&self) -> RowIter<'_> {
        assert!(self.has_edges, "PathGraph: the edges have not been generated");
        RowIter {
            parent: self,
            node_idx: 0,
            edge_range: 0..0,
            m_node: 0,
            m_offset: 0,
            emitted: 0,
        }
    }

    /// Returns an iterator over the F array positions corresponding to the
    /// successive M bits, one per node.
    ///
    /// # Panics
    ///
    /// Panics if [`PathGraph::generate_edges`] has not been called.
    pub fn f_locations(&self) -> FLocationIter<'_> {
        assert!(self.has_edges, "PathGraph: the edges have not been generated");
        FLocationIter {
            parent: self,
            node_idx: 0,
            location: 0,
        }
    }

    /// Returns the cumulative occurrence counts of the base characters in
    /// the BWT: entry `c + 1` is the number of characters with rank at most
    /// `c`, and the tail characters are not counted.
    ///
    /// # Panics
    ///
    /// Panics if [`PathGraph::generate_edges`] has not been called.
    pub fn label_counts(&self) -> [usize; 5] {
        assert!(self.has_edges, "PathGraph: the edges have not been generated");
        let mut counts = [0usize; 5];
        for edge in self.edges.iter() {
            let label = if edge.label == b'Y' { b'Z' } else { edge.label };
            if label != b'Z' {
                counts[label_rank(label) + 1] += 1;
            }
        }
        for i in 1..counts.len() {
            counts[i] += counts[i - 1];
        }
        counts
    }
}

//-----------------------------------------------------------------------------

/// A read-only iterator over the output rows of a [`PathGraph`].
///
/// The type of `Item` is [`BwtRow`]. The F bits follow the incoming edge
/// ranges of the nodes in rank order; the M bits and positions follow their
/// out-degrees. Both streams have one set bit per node.
#[derive(Clone, Debug)]
pub struct RowIter<'a> {
    parent: &'a PathGraph,
    // The node whose incoming edges are being emitted.
    node_idx: usize,
    // Unvisited part of the incoming edge range.
    edge_range: Range<usize>,
    // The node and offset the M stream is at.
    m_node: usize,
    m_offset: usize,
    emitted: usize,
}

impl<'a> Iterator for RowIter<'a> {
    type Item = BwtRow;

    fn next(&mut self) -> Option<Self::Item> {
        if self.node_idx >= self.parent.nodes.len() {
            return None;
        }
        let mut first_edge = false;
        if self.edge_range.is_empty() {
            self.edge_range = self.parent.incoming_edges(self.node_idx);
            debug_assert!(!self.edge_range.is_empty());
            first_edge = true;
        }

        let edge = self.parent.edges[self.edge_range.start];
        let bwt = if edge.label == b'Y' { b'Z' } else { edge.label };
        self.edge_range.start += 1;
        if self.edge_range.is_empty() {
            self.node_idx += 1;
        }

        let pos = self.parent.nodes[self.m_node].to;
        let m = self.m_offset == 0;
        self.m_offset += 1;
        if self.m_offset >= self.parent.nodes[self.m_node].key.0 {
            self.m_node += 1;
            self.m_offset = 0;
        }

        self.emitted += 1;
        Some(BwtRow {
            bwt: bwt,
            f: first_edge,
            m: m,
            pos: pos,
        })
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.parent.edges.len() - self.emitted;
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for RowIter<'a> {}

impl<'a> FusedIterator for RowIter<'a> {}

//-----------------------------------------------------------------------------

/// A read-only iterator over the F array positions of the successive M bits
/// in a [`PathGraph`].
///
/// The type of `Item` is [`usize`].
#[derive(Clone, Debug)]
pub struct FLocationIter<'a> {
    parent: &'a PathGraph,
    // The first node we have not visited.
    node_idx: usize,
    // Location in the F array.
    location: usize,
}

impl<'a> Iterator for FLocationIter<'a> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        if self.node_idx >= self.parent.nodes.len() {
            return None;
        }
        let range = self.parent.incoming_edges(self.node_idx);
        self.node_idx += 1;
        let result = self.location;
        self.location += range.len();
        Some(result)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.parent.nodes.len() - self.node_idx;
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for FLocationIter<'a> {}

impl<'a> FusedIterator for FLocationIter<'a> {}

//-----------------------------------------------------------------------------
