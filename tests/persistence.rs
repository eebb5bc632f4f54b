use anyhow::Result;
use proptest::prelude::*;
use tempfile::NamedTempFile;
use wirelink::config::LayoutConfig;
use wirelink::editor::operations::node_port_position;
use wirelink::editor::{EditorEvent, EditorState};
use wirelink::model::{
    Diagram, DiagramDoc, Direction, Node, NodeId, NodeKind, ParamValue, Point, Size,
};

fn sample() -> Diagram {
    let mut s = EditorState::new(Diagram::new());
    for (kind, x, y) in [("INPUT", 0.0, 0.0), ("TON", 300.0, 0.0), ("OUTPUT", 600.0, 0.0)] {
        s.dispatch(EditorEvent::AddNode {
            kind: kind.into(),
            position: Point::new(x, y),
            parameters: Default::default(),
        })
        .unwrap();
    }
    let steps = [
        EditorEvent::ActivatePort { node: "1".into(), direction: Direction::Out, index: 0, double: false },
        EditorEvent::ClickCanvas { point: Point::new(150.0, 34.0) },
        EditorEvent::DoubleClickCanvas { point: Point::new(200.0, 34.0) },
        EditorEvent::ActivatePort { node: "2".into(), direction: Direction::In, index: 0, double: false },
        EditorEvent::ActivatePort { node: "2".into(), direction: Direction::Out, index: 1, double: false },
        EditorEvent::ActivatePort { node: "3".into(), direction: Direction::In, index: 0, double: false },
    ];
    for e in steps {
        s.dispatch(e).unwrap();
    }
    s.into_diagram()
}

#[test]
fn json_round_trip() -> Result<()> {
    let diagram = sample();
    let doc = diagram.to_doc();
    let file = NamedTempFile::new()?;
    doc.save_json(file.path())?;

    let loaded = DiagramDoc::load_json(file.path())?;
    assert_eq!(loaded, doc);
    let rebuilt = Diagram::from_doc(loaded)?;
    assert_eq!(rebuilt, diagram);
    Ok(())
}

#[test]
fn json_keeps_junction_kind_and_parameters() -> Result<()> {
    let json = sample().to_doc().to_json()?;
    assert!(json.contains("\"JUNCTION\""));
    assert!(json.contains("\"PT\""));

    let doc = DiagramDoc::from_json(&json)?;
    let ton = doc.nodes.iter().find(|n| n.kind == NodeKind::from("TON")).unwrap();
    assert_eq!(ton.parameters.get("PT"), Some(&ParamValue::Int(1000)));
    assert!(doc.nodes.iter().any(|n| n.kind == NodeKind::Junction));
    Ok(())
}

#[test]
fn binary_round_trip() -> Result<()> {
    let doc = sample().to_doc();
    let file = NamedTempFile::new()?;
    doc.save_to_binary(file.path())?;
    let loaded = DiagramDoc::load_from_binary(file.path())?;
    assert_eq!(loaded, doc);
    Ok(())
}

#[test]
fn binary_rejects_foreign_file() -> Result<()> {
    let file = NamedTempFile::new()?;
    std::fs::write(file.path(), b"NOTWIRES\x01\x00\x00\x00")?;
    let err = DiagramDoc::load_from_binary(file.path()).unwrap_err();
    assert!(err.to_string().contains("magic"));
    Ok(())
}

fn node(id: &str, inputs: u32, outputs: u32) -> Node {
    Node {
        id: NodeId::from(id),
        kind: NodeKind::from("X"),
        position: Point::default(),
        size: None,
        input_count: inputs,
        output_count: outputs,
        parameters: Default::default(),
    }
}

#[test]
fn sample_diagram_is_clean() {
    assert!(sample().validate().is_empty());
}

proptest! {
    #[test]
    fn port_position_is_deterministic(
        x in -500i32..500,
        y in -500i32..500,
        w in 0u16..400,
        h in 0u16..400,
        inputs in 1u32..8,
        outputs in 1u32..8,
        index in 0u32..8,
    ) {
        let layout = LayoutConfig::default();
        let mut n = node("1", inputs, outputs);
        n.position = Point::new(x as f32, y as f32);
        n.size = Some(Size::new(w as f32, h as f32));
        for direction in [Direction::In, Direction::Out] {
            let first = node_port_position(&layout, &n, direction, index);
            let second = node_port_position(&layout, &n.clone(), direction, index);
            prop_assert_eq!(first, second);
        }
    }
}
