use uast_nodes::{Node, Object};
use uast_nodes_proto::{
    encode, read_raw, read_tree, read_tree_with, write_to, write_to_with, DecodeOptions,
    EncodeOptions,
};

fn s(v: &str) -> Node {
    Node::from(v)
}

fn obj<const N: usize>(fields: [(&str, Node); N]) -> Node {
    Node::object(fields)
}

fn bytes_of(node: &Node) -> Vec<u8> {
    let mut buf = Vec::new();
    write_to(&mut buf, node).expect("write");
    buf
}

struct Case {
    name: &'static str,
    size: usize,
    input: Node,
    json: Option<&'static str>,
}

const SAME_KEYS_JSON: &str = r#"{
	"root": 1,
	"last": 5,
	"nodes": {
		"1": {
			"id": 1,
			"kind": 2,
			"keys": [
				2,
				3
			],
			"values": [
				4,
				5
			]
		},
		"2": {
			"id": 2,
			"kind": 8,
			"val": "@type"
		},
		"3": {
			"id": 3,
			"kind": 8,
			"val": "k"
		},
		"4": {
			"id": 4,
			"kind": 8,
			"val": "node"
		},
		"5": {
			"id": 5,
			"kind": 2,
			"keys": [
				2,
				3
			],
			"values": [
				4,
				0
			]
		}
	}
}"#;

const EMPTY_OBJECT_JSON: &str = r#"{
	"root": 1,
	"last": 3,
	"nodes": {
		"1": {
			"id": 1,
			"kind": 4,
			"values": [
				2,
				3
			]
		},
		"2": {
			"id": 2,
			"kind": 4
		},
		"3": {
			"id": 3,
			"kind": 2
		}
	}
}"#;

fn cases() -> Vec<Case> {
    vec![
        Case {
            name: "nested array",
            size: 46,
            input: Node::array([obj([
                ("k", Node::array([s("A")])),
                ("k2", Node::from(42i64)),
            ])]),
            json: None,
        },
        Case {
            name: "nested object",
            size: 73,
            input: obj([
                ("@type", s("node")),
                ("k", Node::array([s("A")])),
                ("k2", Node::from(42i64)),
                ("k3", obj([("@type", s("node"))])),
            ]),
            json: None,
        },
        Case {
            name: "same keys",
            size: 48,
            input: obj([
                ("@type", s("node")),
                ("k", obj([("@type", s("node")), ("k", Node::Null)])),
            ]),
            json: Some(SAME_KEYS_JSON),
        },
        Case {
            name: "dups",
            size: 61,
            input: Node::array([
                obj([
                    ("@type", s("node")),
                    ("k", Node::array([s("n1"), s("n2")])),
                ]),
                obj([
                    ("@type", s("node")),
                    ("k", Node::array([s("n1"), s("n2")])),
                ]),
            ]),
            json: None,
        },
        Case {
            name: "empty object",
            size: 22,
            input: Node::array([Node::Array(vec![]), Node::Object(Object::new())]),
            json: Some(EMPTY_OBJECT_JSON),
        },
    ]
}

#[test]
fn tree_fixture_matrix() {
    for case in cases() {
        let buf = bytes_of(&case.input);
        assert_eq!(buf.len(), case.size, "{}: size", case.name);

        let out = read_tree(buf.as_slice()).unwrap_or_else(|e| panic!("{}: {e}", case.name));
        assert_eq!(out, case.input, "{}: round trip", case.name);

        if let Some(json) = case.json {
            let raw = read_raw(buf.as_slice()).expect("read raw");
            assert_eq!(raw.to_json().expect("json"), json, "{}: raw graph", case.name);
        }
    }
}

#[test]
fn encoding_is_deterministic() {
    for case in cases() {
        assert_eq!(bytes_of(&case.input), bytes_of(&case.input), "{}", case.name);
    }
    // field insertion order does not leak into the output
    let a = obj([("x", Node::from(1i64)), ("y", Node::from(2i64))]);
    let b = obj([("y", Node::from(2i64)), ("x", Node::from(1i64))]);
    assert_eq!(bytes_of(&a), bytes_of(&b));
}

#[test]
fn dedup_stores_identical_subtrees_once() {
    let item = || {
        obj([
            ("@type", s("uast:Identifier")),
            ("Name", s("foo")),
            ("@pos", obj([("line", Node::from(1u64)), ("col", Node::from(4u64))])),
        ])
    };
    let tree = Node::array((0..10).map(|_| item()));

    let deduped = encode(&tree, &EncodeOptions::default()).expect("encode");
    let naive = encode(
        &tree,
        &EncodeOptions {
            dedup_nodes: false,
            ..EncodeOptions::default()
        },
    )
    .expect("encode");
    assert!(deduped.records.len() < naive.records.len());
    assert_eq!(deduped.dedup_hits, 18);
    let root = &deduped.records[0];
    assert!(root.values.iter().all(|&id| id == root.values[0]));

    let mut small = Vec::new();
    write_to(&mut small, &tree).expect("write");
    let mut big = Vec::new();
    write_to_with(
        &mut big,
        &tree,
        &EncodeOptions {
            dedup_nodes: false,
            ..EncodeOptions::default()
        },
    )
    .expect("write");
    assert!(small.len() < big.len());
    assert_eq!(read_tree(small.as_slice()).expect("read"), tree);
    assert_eq!(read_tree(big.as_slice()).expect("read"), tree);
}

#[test]
fn shared_key_sets_are_smaller_than_disjoint_ones() {
    let shared = obj([
        ("@type", s("node")),
        ("k", obj([("@type", s("node")), ("k", Node::Null)])),
    ]);
    let disjoint = obj([
        ("@type", s("node")),
        ("k", obj([("@role", s("node")), ("v", Node::Null)])),
    ]);
    assert!(bytes_of(&shared).len() < bytes_of(&disjoint).len());
}

#[test]
fn null_root_and_null_children() {
    let buf = bytes_of(&Node::Null);
    assert_eq!(read_tree(buf.as_slice()).expect("read"), Node::Null);

    let tree = Node::array([Node::Null, obj([("a", Node::Null)]), Node::Null]);
    assert_eq!(read_tree(bytes_of(&tree).as_slice()).expect("read"), tree);
}

#[test]
fn scalar_root() {
    for v in [
        s(""),
        Node::from(-7i64),
        Node::from(u64::MAX),
        Node::from(2.5),
        Node::from(false),
    ] {
        assert_eq!(read_tree(bytes_of(&v).as_slice()).expect("read"), v);
    }
}

#[test]
fn value_offsets_kick_in_for_wide_lists() {
    let first = Node::array((0..150).map(|i| s(&format!("s{i}"))));
    let second = Node::array((0..150).map(|i| s(&format!("t{i}"))));
    let tree = Node::array([first, second]);

    let enc = encode(&tree, &EncodeOptions::default()).expect("encode");
    let second_rec = enc
        .records
        .iter()
        .find(|r| r.id == 153)
        .expect("second array");
    assert_eq!(second_rec.values_offs, 154);
    assert_eq!(second_rec.values[0], 0);

    let with = bytes_of(&tree);
    let mut without = Vec::new();
    write_to_with(
        &mut without,
        &tree,
        &EncodeOptions {
            values_offsets: false,
            ..EncodeOptions::default()
        },
    )
    .expect("write");
    assert!(with.len() < without.len());
    assert_eq!(read_tree(with.as_slice()).expect("read"), tree);
    assert_eq!(read_tree(without.as_slice()).expect("read"), tree);
}

#[test]
fn key_deltas_need_a_matching_reader() {
    let tree = obj([
        ("a", Node::from(1i64)),
        ("b", obj([("a", Node::from(2i64)), ("b", Node::Null), ("c", s("x"))])),
        ("c", Node::array([s("a"), s("b")])),
    ]);
    let opts = EncodeOptions {
        keys_delta: true,
        ..EncodeOptions::default()
    };
    let mut buf = Vec::new();
    write_to_with(&mut buf, &tree, &opts).expect("write");

    let back = read_tree_with(buf.as_slice(), &DecodeOptions::default().with_keys_delta(true))
        .expect("read");
    assert_eq!(back, tree);

    let plain = read_tree(buf.as_slice());
    assert!(!matches!(plain, Ok(ref t) if *t == tree));
}

#[test]
fn json_documents_round_trip() {
    let doc = serde_json::json!({
        "@type": "File",
        "Body": [
            {"@type": "FuncDecl", "Name": {"@type": "Ident", "Name": "main"}, "Params": []},
            {"@type": "FuncDecl", "Name": {"@type": "Ident", "Name": "main"}, "Params": []},
            {"@type": "Comment", "Text": "// TODO", "Block": false, "Pos": 12.5},
        ],
        "Meta": {},
        "Neg": -12,
    });
    let tree = Node::from(doc.clone());
    let back = read_tree(bytes_of(&tree).as_slice()).expect("read");
    assert_eq!(back, tree);
    assert_eq!(serde_json::Value::from(back), doc);
}

/// Unwraps a chain of single-element arrays without recursing.
fn unwrap_chain(mut node: Node) -> (usize, Node) {
    let mut depth = 0;
    loop {
        match node {
            Node::Array(mut items) if items.len() == 1 => {
                depth += 1;
                node = items.pop().unwrap_or_default();
            }
            other => return (depth, other),
        }
    }
}

#[test]
fn deep_chain_round_trips() {
    let depth = 50_000;
    let mut tree = s("bottom");
    for _ in 0..depth {
        tree = Node::array([tree]);
    }
    let buf = bytes_of(&tree);
    let back = read_tree(buf.as_slice()).expect("read");
    assert_eq!(unwrap_chain(back), (depth, s("bottom")));
    assert_eq!(unwrap_chain(tree), (depth, s("bottom")));
}
