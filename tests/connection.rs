use wirelink::editor::routing::route;
use wirelink::editor::view::edge_anchors;
use wirelink::editor::{EditorEvent, EditorState, IgnoreReason, Outcome};
use wirelink::model::{Diagram, Direction, EdgeId, NodeId, NodeKind, Point, PortRef};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn add(state: &mut EditorState, kind: &str, x: f32, y: f32) -> NodeId {
    match state
        .dispatch(EditorEvent::AddNode {
            kind: kind.into(),
            position: Point::new(x, y),
            parameters: Default::default(),
        })
        .unwrap()
    {
        Outcome::NodeAdded(id) => id,
        other => panic!("expected NodeAdded, got {:?}", other),
    }
}

fn activate(state: &mut EditorState, node: &NodeId, direction: Direction, index: u32) -> Outcome {
    state
        .dispatch(EditorEvent::ActivatePort {
            node: node.clone(),
            direction,
            index,
            double: false,
        })
        .unwrap()
}

fn double_activate(state: &mut EditorState, node: &NodeId, direction: Direction, index: u32) -> Outcome {
    state
        .dispatch(EditorEvent::ActivatePort {
            node: node.clone(),
            direction,
            index,
            double: true,
        })
        .unwrap()
}

fn click(state: &mut EditorState, x: f32, y: f32) {
    state
        .dispatch(EditorEvent::ClickCanvas { point: Point::new(x, y) })
        .unwrap();
}

fn finalized(outcome: Outcome) -> (EdgeId, Option<EdgeId>) {
    match outcome {
        Outcome::Finalized { edge, replaced } => (edge, replaced),
        other => panic!("expected Finalized, got {:?}", other),
    }
}

#[test]
fn two_and_blocks_connect_with_direct_route() {
    init_logging();
    let mut s = EditorState::new(Diagram::new());
    let a = add(&mut s, "AND", 0.0, 0.0);
    let b = add(&mut s, "AND", 300.0, 0.0);

    assert_eq!(activate(&mut s, &a, Direction::Out, 0), Outcome::Started { from: PortRef::new(a.clone(), 0) });
    let (edge_id, replaced) = finalized(activate(&mut s, &b, Direction::In, 0));
    assert_eq!(replaced, None);
    assert!(!s.is_drawing());

    let d = s.diagram();
    assert_eq!(d.node_count(), 2);
    assert_eq!(d.edge_count(), 1);
    let edge = d.edge(&edge_id).unwrap();
    assert_eq!(edge.id.0, "1#out:0->2#in:0");
    assert!(edge.waypoints.is_empty());

    let anchors = edge_anchors(d, s.config(), edge).unwrap();
    assert_eq!(anchors, vec![Point::new(100.0, 34.0), Point::new(300.0, 34.0)]);
    assert_eq!(
        route(&anchors),
        vec![
            Point::new(100.0, 34.0),
            Point::new(200.0, 34.0),
            Point::new(200.0, 34.0),
            Point::new(300.0, 34.0),
        ]
    );
}

#[test]
fn finalizing_into_occupied_input_replaces_edge() {
    init_logging();
    let mut s = EditorState::new(Diagram::new());
    let a = add(&mut s, "INPUT", 0.0, 0.0);
    let b = add(&mut s, "INPUT", 0.0, 100.0);
    let c = add(&mut s, "NOT", 300.0, 0.0);

    activate(&mut s, &a, Direction::Out, 0);
    let (e1, _) = finalized(activate(&mut s, &c, Direction::In, 0));
    activate(&mut s, &b, Direction::Out, 0);
    let (e2, replaced) = finalized(activate(&mut s, &c, Direction::In, 0));

    assert_eq!(replaced, Some(e1.clone()));
    assert!(s.diagram().contains_edge(&e2));
    assert!(!s.diagram().contains_edge(&e1));
    assert_eq!(s.diagram().edge_count(), 1);
}

#[test]
fn start_extend_cancel_leaves_graph_untouched() {
    let mut s = EditorState::new(Diagram::new());
    let a = add(&mut s, "INPUT", 0.0, 0.0);
    add(&mut s, "NOT", 300.0, 0.0);
    let before = s.diagram().clone();

    activate(&mut s, &a, Direction::Out, 0);
    click(&mut s, 150.0, 34.0);
    click(&mut s, 150.0, 120.0);
    assert_eq!(s.dispatch(EditorEvent::Cancel).unwrap(), Outcome::Cancelled);

    assert_eq!(s.diagram(), &before);
    assert!(!s.is_drawing());
    assert_eq!(
        s.dispatch(EditorEvent::Cancel).unwrap(),
        Outcome::Ignored(IgnoreReason::NotDrawing)
    );
}

#[test]
fn waypoints_are_stored_on_the_edge() {
    let mut s = EditorState::new(Diagram::new());
    let a = add(&mut s, "INPUT", 0.0, 0.0);
    let b = add(&mut s, "NOT", 300.0, 200.0);
    activate(&mut s, &a, Direction::Out, 0);
    click(&mut s, 150.0, 34.0);
    click(&mut s, 150.0, 234.0);
    let (e, _) = finalized(activate(&mut s, &b, Direction::In, 0));
    assert_eq!(
        s.diagram().edge(&e).unwrap().waypoints,
        vec![Point::new(150.0, 34.0), Point::new(150.0, 234.0)]
    );
}

#[test]
fn double_click_branches_through_a_junction() {
    init_logging();
    let mut s = EditorState::new(Diagram::new());
    let a = add(&mut s, "INPUT", 0.0, 0.0);
    let b = add(&mut s, "NOT", 400.0, 0.0);

    activate(&mut s, &a, Direction::Out, 0);
    click(&mut s, 200.0, 34.0);
    let Outcome::Branched { junction, edge } = s
        .dispatch(EditorEvent::DoubleClickCanvas { point: Point::new(200.0, 100.0) })
        .unwrap()
    else {
        panic!("expected branch");
    };

    let j = s.diagram().node(&junction).unwrap();
    assert_eq!(j.kind, NodeKind::Junction);
    assert_eq!(j.position, Point::new(200.0, 100.0));
    let first = s.diagram().edge(&edge).unwrap();
    assert_eq!(first.source, PortRef::new(a.clone(), 0));
    assert_eq!(first.target, PortRef::new(junction.clone(), 0));
    assert_eq!(first.waypoints, vec![Point::new(200.0, 34.0)]);

    let wire = s.pending().unwrap();
    assert_eq!(wire.anchor, PortRef::new(junction.clone(), 0));
    assert!(wire.waypoints.is_empty());

    let (second, _) = finalized(activate(&mut s, &b, Direction::In, 0));
    let second = s.diagram().edge(&second).unwrap();
    assert_eq!(second.source, PortRef::new(junction.clone(), 0));
    assert_eq!(second.target, PortRef::new(b, 0));
    assert_eq!(s.diagram().edge_count(), 2);
    assert!(!s.is_drawing());
}

#[test]
fn double_activating_connected_input_detaches_and_resumes() {
    let mut s = EditorState::new(Diagram::new());
    let a = add(&mut s, "INPUT", 0.0, 0.0);
    let b = add(&mut s, "NOT", 300.0, 0.0);
    let c = add(&mut s, "NOT", 300.0, 200.0);
    activate(&mut s, &a, Direction::Out, 0);
    click(&mut s, 150.0, 34.0);
    let (e, _) = finalized(activate(&mut s, &b, Direction::In, 0));

    let Outcome::Detached { edge, resumed_from } = double_activate(&mut s, &b, Direction::In, 0) else {
        panic!("expected detach");
    };
    assert_eq!(edge, e);
    assert_eq!(resumed_from, PortRef::new(a.clone(), 0));
    assert_eq!(s.diagram().edge_count(), 0);
    let wire = s.pending().unwrap();
    assert_eq!(wire.anchor_direction, Direction::Out);
    assert_eq!(wire.waypoints, vec![Point::new(150.0, 34.0)]);

    let (moved, _) = finalized(activate(&mut s, &c, Direction::In, 0));
    let moved = s.diagram().edge(&moved).unwrap();
    assert_eq!(moved.source, PortRef::new(a, 0));
    assert_eq!(moved.target, PortRef::new(c, 0));
    assert_eq!(moved.waypoints, vec![Point::new(150.0, 34.0)]);
}

#[test]
fn double_activating_connected_output_draws_backwards() {
    let mut s = EditorState::new(Diagram::new());
    let a = add(&mut s, "INPUT", 0.0, 0.0);
    let a2 = add(&mut s, "INPUT", 0.0, 200.0);
    let b = add(&mut s, "NOT", 300.0, 0.0);
    activate(&mut s, &a, Direction::Out, 0);
    click(&mut s, 150.0, 34.0);
    click(&mut s, 150.0, 60.0);
    finalized(activate(&mut s, &b, Direction::In, 0));

    let Outcome::Detached { resumed_from, .. } = double_activate(&mut s, &a, Direction::Out, 0) else {
        panic!("expected detach");
    };
    assert_eq!(resumed_from, PortRef::new(b.clone(), 0));
    let wire = s.pending().unwrap();
    assert_eq!(wire.anchor_direction, Direction::In);
    assert_eq!(wire.waypoints, vec![Point::new(150.0, 60.0), Point::new(150.0, 34.0)]);

    // an input can't finish a wire anchored at an input
    assert_eq!(
        activate(&mut s, &b, Direction::In, 0),
        Outcome::Ignored(IgnoreReason::AlreadyDrawing)
    );
    let (e, _) = finalized(activate(&mut s, &a2, Direction::Out, 0));
    let e = s.diagram().edge(&e).unwrap();
    assert_eq!(e.source, PortRef::new(a2, 0));
    assert_eq!(e.target, PortRef::new(b, 0));
    assert_eq!(e.waypoints, vec![Point::new(150.0, 34.0), Point::new(150.0, 60.0)]);
}

#[test]
fn double_activation_on_free_port_acts_like_single() {
    let mut s = EditorState::new(Diagram::new());
    let a = add(&mut s, "INPUT", 0.0, 0.0);
    assert!(matches!(double_activate(&mut s, &a, Direction::Out, 0), Outcome::Started { .. }));
}

#[test]
fn self_loop_is_accepted() {
    let mut s = EditorState::new(Diagram::new());
    let a = add(&mut s, "AND", 0.0, 0.0);
    activate(&mut s, &a, Direction::Out, 0);
    let (e, _) = finalized(activate(&mut s, &a, Direction::In, 1));
    let e = s.diagram().edge(&e).unwrap();
    assert_eq!(e.source.node, e.target.node);
}

#[test]
fn unknown_node_is_rejected_without_changes() {
    let mut s = EditorState::new(Diagram::new());
    let a = add(&mut s, "INPUT", 0.0, 0.0);
    activate(&mut s, &a, Direction::Out, 0);
    let err = s
        .dispatch(EditorEvent::ActivatePort {
            node: NodeId::from("99"),
            direction: Direction::In,
            index: 0,
            double: false,
        })
        .unwrap_err();
    assert!(err.is_invalid_reference());
    assert_eq!(s.pending().unwrap().anchor, PortRef::new(a, 0));
}

#[test]
fn delete_selection_removes_only_that_edge() {
    let mut s = EditorState::new(Diagram::new());
    let a = add(&mut s, "INPUT", 0.0, 0.0);
    let b = add(&mut s, "NOT", 300.0, 0.0);
    let c = add(&mut s, "OUTPUT", 600.0, 0.0);
    activate(&mut s, &a, Direction::Out, 0);
    let (ab, _) = finalized(activate(&mut s, &b, Direction::In, 0));
    activate(&mut s, &b, Direction::Out, 0);
    let (bc, _) = finalized(activate(&mut s, &c, Direction::In, 0));
    s.dispatch(EditorEvent::SelectEdge { edge: ab.clone(), toggle: false }).unwrap();

    let outcome = s.dispatch(EditorEvent::DeleteSelection { edge: ab.clone() }).unwrap();
    assert_eq!(
        outcome,
        Outcome::Deleted {
            nodes: vec![],
            edges: vec![ab.clone()],
        }
    );
    assert!(!s.diagram().contains_edge(&ab));
    assert!(s.diagram().contains_edge(&bc));
    assert_eq!(s.diagram().node_count(), 3);
    assert!(s.selection.is_empty());
}

#[test]
fn double_activating_unconnected_junction_starts_a_wire() {
    let mut s = EditorState::new(Diagram::new());
    let a = add(&mut s, "INPUT", 0.0, 0.0);
    activate(&mut s, &a, Direction::Out, 0);
    let Outcome::Branched { junction, edge } = s
        .dispatch(EditorEvent::DoubleClickCanvas { point: Point::new(200.0, 100.0) })
        .unwrap()
    else {
        panic!("expected branch");
    };
    s.dispatch(EditorEvent::Cancel).unwrap();
    s.dispatch(EditorEvent::DeleteSelection { edge }).unwrap();
    assert!(s.diagram().incoming_edge(&PortRef::new(junction.clone(), 0)).is_none());

    assert_eq!(
        activate(&mut s, &junction, Direction::Out, 0),
        Outcome::Ignored(IgnoreReason::JunctionNeedsDoubleActivation)
    );
    assert_eq!(
        double_activate(&mut s, &junction, Direction::Out, 0),
        Outcome::Started { from: PortRef::new(junction.clone(), 0) }
    );
    let wire = s.pending().unwrap();
    assert_eq!(wire.anchor_direction, Direction::Out);
    assert!(wire.waypoints.is_empty());
}

#[test]
fn detach_while_drawing_replaces_pending_wire() {
    let mut s = EditorState::new(Diagram::new());
    let a = add(&mut s, "INPUT", 0.0, 0.0);
    let other = add(&mut s, "INPUT", 0.0, 200.0);
    let b = add(&mut s, "NOT", 300.0, 0.0);
    activate(&mut s, &a, Direction::Out, 0);
    let (e, _) = finalized(activate(&mut s, &b, Direction::In, 0));

    activate(&mut s, &other, Direction::Out, 0);
    click(&mut s, 100.0, 300.0);
    let Outcome::Detached { edge, resumed_from } = double_activate(&mut s, &b, Direction::In, 0) else {
        panic!("expected detach");
    };
    assert_eq!(edge, e);
    assert_eq!(resumed_from, PortRef::new(a.clone(), 0));
    let wire = s.pending().unwrap();
    assert_eq!(wire.anchor, PortRef::new(a, 0));
    assert!(wire.waypoints.is_empty());
    assert_eq!(s.diagram().edge_count(), 0);
}

#[test]
fn splice_while_drawing_replaces_pending_wire() {
    let mut s = EditorState::new(Diagram::new());
    let a = add(&mut s, "INPUT", 0.0, 0.0);
    let other = add(&mut s, "INPUT", 0.0, 200.0);
    let b = add(&mut s, "NOT", 400.0, 0.0);
    activate(&mut s, &a, Direction::Out, 0);
    let Outcome::Branched { junction, .. } = s
        .dispatch(EditorEvent::DoubleClickCanvas { point: Point::new(200.0, 34.0) })
        .unwrap()
    else {
        panic!("expected branch");
    };
    finalized(activate(&mut s, &b, Direction::In, 0));

    activate(&mut s, &other, Direction::Out, 0);
    let Outcome::Spliced { source, removed_nodes, .. } = double_activate(&mut s, &junction, Direction::Out, 0) else {
        panic!("expected splice");
    };
    assert_eq!(source, PortRef::new(a.clone(), 0));
    assert_eq!(removed_nodes, vec![junction.clone()]);
    let wire = s.pending().unwrap();
    assert_eq!(wire.anchor, PortRef::new(a, 0));
    assert_eq!(wire.waypoints, vec![Point::new(200.0, 34.0)]);
    assert_eq!(s.diagram().edge_count(), 0);
    assert!(!s.diagram().contains_node(&junction));
}

#[test]
fn branching_a_backwards_wire_keeps_drawing_towards_an_output() {
    let mut s = EditorState::new(Diagram::new());
    let a = add(&mut s, "INPUT", 0.0, 0.0);
    let a2 = add(&mut s, "INPUT", 0.0, 200.0);
    let b = add(&mut s, "NOT", 300.0, 0.0);
    activate(&mut s, &a, Direction::Out, 0);
    click(&mut s, 150.0, 34.0);
    click(&mut s, 150.0, 60.0);
    finalized(activate(&mut s, &b, Direction::In, 0));
    double_activate(&mut s, &a, Direction::Out, 0);
    assert_eq!(s.pending().unwrap().anchor_direction, Direction::In);

    let Outcome::Branched { junction, edge } = s
        .dispatch(EditorEvent::DoubleClickCanvas { point: Point::new(100.0, 150.0) })
        .unwrap()
    else {
        panic!("expected branch");
    };
    let relay = s.diagram().edge(&edge).unwrap();
    assert_eq!(relay.source, PortRef::new(junction.clone(), 0));
    assert_eq!(relay.target, PortRef::new(b.clone(), 0));
    assert_eq!(relay.waypoints, vec![Point::new(150.0, 34.0), Point::new(150.0, 60.0)]);

    let wire = s.pending().unwrap();
    assert_eq!(wire.anchor, PortRef::new(junction.clone(), 0));
    assert_eq!(wire.anchor_direction, Direction::In);
    assert!(wire.waypoints.is_empty());

    let (last, _) = finalized(activate(&mut s, &a2, Direction::Out, 0));
    let last = s.diagram().edge(&last).unwrap();
    assert_eq!(last.source, PortRef::new(a2, 0));
    assert_eq!(last.target, PortRef::new(junction, 0));
    assert!(s.diagram().validate().is_empty());
}
