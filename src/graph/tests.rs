use super::*;

use crate::{Config, PathGraph, BwtRow};

use rand::Rng;

//-----------------------------------------------------------------------------

fn encode(reference: &str) -> Vec<u8> {
    reference
        .bytes()
        .map(|b| match b {
            b'A' => 0,
            b'C' => 1,
            b'G' => 2,
            b'T' => 3,
            _ => panic!("invalid base {}", b),
        })
        .collect()
}

fn single_chunk(len: usize) -> Vec<SequenceChunk> {
    vec![SequenceChunk { len: len, off: 0 }]
}

fn build(reference: &str, variants: &[Variant]) -> RefGraph {
    let encoded = encode(reference);
    let mut graph = RefGraph::new(
        &encoded,
        &single_chunk(encoded.len()),
        variants,
        &Config::default(),
    )
    .unwrap();
    graph.sort_edges_by_from(1);
    graph
}

// Returns `true` if the graph contains a head-to-tail path whose labels
// (excluding the head and the tail) spell `s`. Requires the edges to be
// sorted by source node.
fn spells(graph: &RefGraph, s: &str) -> bool {
    let head = (0..graph.num_nodes())
        .find(|&i| graph.node(i).label == b'Y')
        .unwrap();
    let mut current = vec![head];
    for label in s.bytes() {
        let mut next = Vec::new();
        for &node in &current {
            for i in graph.edges_from(node) {
                let to = graph.edge(i).to;
                if graph.node(to).label == label {
                    next.push(to);
                }
            }
        }
        next.sort_unstable();
        next.dedup();
        if next.is_empty() {
            return false;
        }
        current = next;
    }
    current.iter().any(|&node| {
        graph
            .edges_from(node)
            .into_iter()
            .any(|i| graph.node(graph.edge(i).to).label == b'Z')
    })
}

fn alt_string(reference: &str, variant: &Variant) -> String {
    let mut s: Vec<u8> = reference.as_bytes().to_vec();
    match &variant.kind {
        VariantKind::Substitution { alt } => {
            s[variant.pos] = BASES[*alt as usize];
        }
        VariantKind::Deletion { len } => {
            s.drain(variant.pos..variant.pos + len);
        }
        VariantKind::Insertion { seq } => {
            let decoded: Vec<u8> = seq.iter().map(|&code| BASES[code as usize]).collect();
            s.splice(variant.pos..variant.pos, decoded);
        }
    }
    String::from_utf8(s).unwrap()
}

fn random_reference(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| BASES[rng.gen_range(0..4)] as char)
        .collect()
}

fn random_variants(reference: &str, count: usize) -> Vec<Variant> {
    let mut rng = rand::thread_rng();
    let encoded = encode(reference);
    let mut positions: Vec<usize> = (0..count)
        .map(|_| rng.gen_range(1..reference.len() - 6))
        .collect();
    positions.sort_unstable();
    positions.dedup();

    positions
        .iter()
        .map(|&pos| match rng.gen_range(0..3) {
            0 => {
                let alt = (encoded[pos] + rng.gen_range(1..4)) % 4;
                Variant::substitution(pos, alt)
            }
            1 => Variant::deletion(pos, rng.gen_range(1..4)),
            _ => {
                let seq: Vec<u8> = (0..rng.gen_range(1..5)).map(|_| rng.gen_range(0..4)).collect();
                Variant::insertion(pos, &seq)
            }
        })
        .collect()
}

//-----------------------------------------------------------------------------

#[test]
fn linear_graph() {
    let graph = build("ACGT", &[]);
    assert_eq!(graph.num_nodes(), 6, "Incorrect node count");
    assert_eq!(graph.num_edges(), 5, "Incorrect edge count");
    assert_eq!(graph.node(graph.last_node()).label, b'Z', "The last node is not the tail");

    let labels: Vec<u8> = (0..graph.num_nodes()).map(|i| graph.node(i).label).collect();
    assert_eq!(labels, b"YACGTZ", "Incorrect node labels");
    for i in 1..5 {
        assert_eq!(graph.node(i).value, i - 1, "Incorrect value for node {}", i);
    }
    assert!(graph.is_reverse_deterministic(), "A linear graph must be reverse-deterministic");
    assert!(spells(&graph, "ACGT"), "The reference is not spelled by the graph");
    assert!(!spells(&graph, "ACGG"), "A non-existent string is spelled by the graph");
}

#[test]
fn substitution_paths() {
    let variants = vec![Variant::substitution(1, 2)];
    let graph = build("ACGT", &variants);
    assert!(graph.is_reverse_deterministic(), "Not reverse-deterministic after a substitution");
    assert!(spells(&graph, "ACGT"), "The reference path is missing");
    assert!(spells(&graph, "AGGT"), "The substituted path is missing");
    assert!(!spells(&graph, "ATGT"), "A non-existent substitution is spelled by the graph");
}

#[test]
fn deletion_paths() {
    let variants = vec![Variant::deletion(2, 2)];
    let graph = build("ACGTACGT", &variants);
    assert!(graph.is_reverse_deterministic(), "Not reverse-deterministic after a deletion");
    assert!(spells(&graph, "ACGTACGT"), "The reference path is missing");
    assert!(spells(&graph, "ACACGT"), "The deletion path is missing");
}

#[test]
fn insertion_paths() {
    let variants = vec![Variant::insertion(1, &[1, 2])];
    let graph = build("AAA", &variants);
    assert!(graph.is_reverse_deterministic(), "Not reverse-deterministic after an insertion");
    assert!(spells(&graph, "AAA"), "The reference path is missing");
    assert!(spells(&graph, "ACGAA"), "The insertion path is missing");

    let unknown = (0..graph.num_nodes())
        .filter(|&i| graph.node(i).value == UNKNOWN_POSITION)
        .count();
    assert_eq!(unknown, 2, "Incorrect number of inserted nodes without a position");
}

#[test]
fn random_path_preservation() {
    for _ in 0..5 {
        let reference = random_reference(300);
        let variants = random_variants(&reference, 10);
        let graph = build(&reference, &variants);

        assert!(graph.is_reverse_deterministic(), "Not reverse-deterministic after construction");
        assert!(spells(&graph, &reference), "The reference path is missing");
        for variant in &variants {
            let alt = alt_string(&reference, variant);
            assert!(
                spells(&graph, &alt),
                "The path for the variant at {} is missing",
                variant.pos
            );
        }
    }
}

#[test]
fn determinize_idempotent() {
    let reference = random_reference(200);
    let variants = random_variants(&reference, 8);
    let graph = build(&reference, &variants);

    let mut nodes = graph.nodes().to_vec();
    let mut edges = graph.edges().to_vec();
    let last_node = reverse_determinize(&mut nodes, &mut edges, graph.last_node(), 1).unwrap();

    assert_eq!(nodes.len(), graph.num_nodes(), "Node count changed");
    assert_eq!(edges.len(), graph.num_edges(), "Edge count changed");
    assert_eq!(nodes[last_node].label, b'Z', "The tail node was lost");

    let mut labels: Vec<u8> = nodes.iter().map(|n| n.label).collect();
    let mut truth: Vec<u8> = graph.nodes().iter().map(|n| n.label).collect();
    labels.sort_unstable();
    truth.sort_unstable();
    assert_eq!(labels, truth, "The label multiset changed");
}

//-----------------------------------------------------------------------------

#[test]
fn invalid_variants() {
    let reference = encode("ACGTACGT");
    let chunks = single_chunk(reference.len());
    let config = Config::default();

    let cases = vec![
        Variant::substitution(100, 0),
        Variant::substitution(1, 1),
        Variant::substitution(1, 7),
        Variant::deletion(2, 0),
        Variant::deletion(5, 3),
        Variant::insertion(3, &[]),
        Variant::insertion(3, &[0, 9]),
    ];
    for variant in cases {
        let result = RefGraph::new(&reference, &chunks, &[variant.clone()], &config);
        assert!(
            matches!(result, Err(ConstructionError::InvalidVariant { .. })),
            "Variant at {} was not rejected",
            variant.pos
        );
    }

    let unsorted = vec![Variant::substitution(5, 0), Variant::substitution(2, 0)];
    let result = RefGraph::new(&reference, &chunks, &unsorted, &config);
    assert!(
        matches!(result, Err(ConstructionError::InvalidVariant { .. })),
        "Unsorted variants were not rejected"
    );
}

#[test]
fn lenient_mode() {
    let reference = encode("ACGTACGT");
    let chunks = single_chunk(reference.len());
    let config = Config {
        lenient: true,
        ..Config::default()
    };

    let variants = vec![Variant::substitution(1, 1), Variant::substitution(2, 0)];
    let graph = RefGraph::new(&reference, &chunks, &variants, &config).unwrap();
    let baseline = RefGraph::new(&reference, &chunks, &[Variant::substitution(2, 0)], &config).unwrap();
    assert_eq!(
        graph.num_nodes(),
        baseline.num_nodes(),
        "The invalid variant was not skipped"
    );
}

//-----------------------------------------------------------------------------

#[test]
fn spill_format_roundtrip() {
    let formats = vec![
        SpillFormat { endianness: Endianness::Little, large: false },
        SpillFormat { endianness: Endianness::Big, large: false },
        SpillFormat { endianness: Endianness::Little, large: true },
        SpillFormat { endianness: Endianness::Big, large: true },
    ];
    let nodes = vec![
        Node { label: b'Y', value: 0 },
        Node { label: b'A', value: 12345 },
        Node { label: b'G', value: UNKNOWN_POSITION },
        Node { label: b'Z', value: 1 << 20 },
    ];
    let edges = vec![
        Edge { from: 0, to: 1 },
        Edge { from: 1, to: 54321 },
    ];

    for format in formats {
        let mut buffer: Vec<u8> = Vec::new();
        write_count(&mut buffer, nodes.len(), format).unwrap();
        for node in &nodes {
            write_node(&mut buffer, *node, format).unwrap();
        }
        for edge in &edges {
            write_edge(&mut buffer, *edge, format).unwrap();
        }

        let mut reader: &[u8] = &buffer;
        assert_eq!(
            read_count(&mut reader, format).unwrap(),
            nodes.len(),
            "Count did not round-trip ({:?})",
            format
        );
        for node in &nodes {
            assert_eq!(
                read_node(&mut reader, format).unwrap(),
                *node,
                "Node did not round-trip ({:?})",
                format
            );
        }
        for edge in &edges {
            assert_eq!(
                read_edge(&mut reader, format).unwrap(),
                *edge,
                "Edge did not round-trip ({:?})",
                format
            );
        }
        assert!(reader.is_empty(), "Trailing bytes after reading ({:?})", format);
    }
}

//-----------------------------------------------------------------------------

fn sharded_config(dir: &tempfile::TempDir, threads: usize) -> Config {
    Config {
        threads: threads,
        spill_base: dir.path().join("graph"),
        ..Config::default()
    }
}

fn as_graph(parts: (Vec<Node>, Vec<Edge>, usize, EdgeOrder)) -> RefGraph {
    RefGraph {
        nodes: parts.0,
        edges: parts.1,
        last_node: parts.2,
        edge_order: parts.3,
    }
}

fn pipeline_rows(graph: &RefGraph, config: &Config) -> Vec<BwtRow> {
    let mut paths = PathGraph::new(graph, config).unwrap();
    paths.generate_edges(graph).unwrap();
    paths.rows().collect()
}

#[test]
fn sharded_matches_monolithic() {
    let reference = encode(&random_reference(4000));
    let chunks: Vec<SequenceChunk> = (0..8).map(|_| SequenceChunk { len: 500, off: 0 }).collect();

    let dir = tempfile::tempdir().unwrap();
    let config = sharded_config(&dir, 3);
    let sharded = as_graph(build_sharded(&reference, &chunks, &[], &config).unwrap());
    let monolithic = as_graph(build_monolithic(&reference, &[], &config).unwrap());

    assert_eq!(sharded.nodes, monolithic.nodes, "Node arrays differ");
    assert_eq!(sharded.last_node, monolithic.last_node, "Tail nodes differ");

    let mut sharded_edges = sharded.edges.clone();
    let mut monolithic_edges = monolithic.edges.clone();
    sharded_edges.sort_unstable();
    monolithic_edges.sort_unstable();
    assert_eq!(sharded_edges, monolithic_edges, "Edge sets differ");

    let sharded_rows = pipeline_rows(&sharded, &config);
    let monolithic_rows = pipeline_rows(&monolithic, &config);
    assert_eq!(sharded_rows, monolithic_rows, "Output rows differ");
}

#[test]
fn sharded_with_boundary_variant() {
    let reference = encode(&random_reference(200));
    let chunks: Vec<SequenceChunk> = (0..2).map(|_| SequenceChunk { len: 100, off: 0 }).collect();
    // A substitution of the last base of the first chunk.
    let alt = (reference[99] + 1) % 4;
    let variants = vec![Variant::substitution(99, alt)];

    let dir = tempfile::tempdir().unwrap();
    let config = sharded_config(&dir, 2);
    let sharded = as_graph(build_sharded(&reference, &chunks, &variants, &config).unwrap());
    let monolithic = as_graph(build_monolithic(&reference, &variants, &config).unwrap());

    let mut copy = sharded.edges.clone();
    assert!(
        check_reverse_deterministic(&sharded.nodes, &mut copy, 1),
        "The stitched graph is not reverse-deterministic"
    );
    assert_eq!(
        sharded.num_nodes(),
        monolithic.num_nodes(),
        "Node counts differ"
    );

    let sharded_rows = pipeline_rows(&sharded, &config);
    let monolithic_rows = pipeline_rows(&monolithic, &config);
    assert_eq!(sharded_rows, monolithic_rows, "Output rows differ");
}

#[test]
fn sharded_cleans_up_on_failure() {
    let reference = encode(&random_reference(2000));
    let chunks: Vec<SequenceChunk> = (0..4).map(|_| SequenceChunk { len: 500, off: 0 }).collect();

    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        threads: 2,
        spill_base: dir.path().join("missing").join("graph"),
        ..Config::default()
    };
    let result = build_sharded(&reference, &chunks, &[], &config);
    assert!(
        matches!(result, Err(ConstructionError::ShardFailed { .. })),
        "An unwritable spill file did not fail the shard"
    );
}

#[test]
fn multi_threaded_sharded_build() {
    let reference = encode(&random_reference(3000));
    let chunks: Vec<SequenceChunk> = (0..6).map(|_| SequenceChunk { len: 500, off: 0 }).collect();

    // Variants in the interior of each stretch; a variant cannot span an
    // ambiguous gap.
    let mut rng = rand::thread_rng();
    let mut variants = Vec::new();
    for stretch in 0..6 {
        for _ in 0..4 {
            let pos = stretch * 500 + rng.gen_range(10..480);
            let alt = (reference[pos] + rng.gen_range(1..4)) % 4;
            variants.push(Variant::substitution(pos, alt));
        }
    }
    variants.sort_unstable_by_key(|v| v.pos);
    variants.dedup_by_key(|v| v.pos);

    let dirs: Vec<tempfile::TempDir> = (0..2).map(|_| tempfile::tempdir().unwrap()).collect();
    let serial = as_graph(build_sharded(&reference, &chunks, &variants, &sharded_config(&dirs[0], 1)).unwrap());
    let parallel = as_graph(build_sharded(&reference, &chunks, &variants, &sharded_config(&dirs[1], 4)).unwrap());

    assert_eq!(serial.nodes, parallel.nodes, "Node arrays differ");
    assert_eq!(serial.last_node, parallel.last_node, "Tail nodes differ");
    let rows_serial = pipeline_rows(&serial, &sharded_config(&dirs[0], 1));
    let rows_parallel = pipeline_rows(&parallel, &sharded_config(&dirs[1], 4));
    assert_eq!(rows_serial, rows_parallel, "Output rows differ");
}

//-----------------------------------------------------------------------------

#[test]
fn edge_ranges() {
    let reference = random_reference(150);
    let variants = random_variants(&reference, 5);
    let mut graph = build(&reference, &variants);

    graph.sort_edges_by_from(1);
    for node in 0..graph.num_nodes() {
        let range = graph.edges_from(node);
        for i in range.clone() {
            assert_eq!(graph.edge(i).from, node, "Incorrect source in the range of node {}", node);
        }
        let count = graph.edges().iter().filter(|e| e.from == node).count();
        assert_eq!(range.len(), count, "Incorrect out-degree for node {}", node);
    }

    graph.sort_edges_by_to(1);
    for node in 0..graph.num_nodes() {
        let range = graph.edges_to(node);
        for i in range.clone() {
            assert_eq!(graph.edge(i).to, node, "Incorrect destination in the range of node {}", node);
        }
        let count = graph.edges().iter().filter(|e| e.to == node).count();
        assert_eq!(range.len(), count, "Incorrect in-degree for node {}", node);
    }
}

//-----------------------------------------------------------------------------
