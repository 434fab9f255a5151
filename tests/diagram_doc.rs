use anyhow::Result;
use tempfile::NamedTempFile;

use bendpoint::geometry::Point;
use bendpoint::model::{DanglingAnchor, Diagram, DiagramDoc, Edge, Node};
use bendpoint::router::RouterRegistry;

fn sample_doc() -> DiagramDoc {
    let mut diagram = Diagram::new();
    diagram.add_node(Node::new("n1", 0.0, 0.0));
    diagram.add_node(Node::new("n2", 120.0, 40.0));
    let mut edge = Edge::new("e1", "orthogonal", "n1", "n2");
    edge.routing_points = vec![Point::new(60.0, 0.0), Point::new(60.0, 40.0)];
    diagram.add_edge(edge);

    // Handles and a mid-drag anchor survive persistence too.
    let registry = RouterRegistry::with_defaults();
    let edge = diagram.edges.get_mut("e1").unwrap();
    registry
        .get("orthogonal")
        .unwrap()
        .create_routing_handles(edge);
    diagram.anchors.insert(
        "e1_dangling-target".to_string(),
        DanglingAnchor {
            id: "e1_dangling-target".to_string(),
            position: Point::new(130.0, 55.0),
            original_id: "n2".to_string(),
        },
    );

    DiagramDoc { diagram }
}

#[test]
fn test_binary_round_trip() -> Result<()> {
    let doc = sample_doc();
    let file = NamedTempFile::new()?;
    doc.save_to_binary(file.path())?;

    let loaded = DiagramDoc::load_from_binary(file.path())?;
    assert_eq!(loaded.diagram.nodes.len(), 2);
    assert_eq!(loaded.diagram.edges["e1"].routing_points, doc.diagram.edges["e1"].routing_points);
    assert_eq!(loaded.diagram.edges["e1"].handles.len(), 4);
    assert_eq!(
        loaded.diagram.anchors["e1_dangling-target"].position,
        Point::new(130.0, 55.0)
    );
    Ok(())
}

#[test]
fn test_json_round_trip() -> Result<()> {
    let doc = sample_doc();
    let file = NamedTempFile::new()?;
    doc.save_to_json(file.path())?;

    let loaded = DiagramDoc::load_from_json(file.path())?;
    assert_eq!(loaded.diagram.edges["e1"].router_kind, "orthogonal");
    assert_eq!(
        loaded.diagram.edges["e1"].handles[0].id,
        doc.diagram.edges["e1"].handles[0].id
    );
    Ok(())
}

#[test]
fn test_load_rejects_wrong_magic() -> Result<()> {
    let file = NamedTempFile::new()?;
    std::fs::write(file.path(), b"NOTBENDPT\x01\x00\x00\x00")?;
    assert!(DiagramDoc::load_from_binary(file.path()).is_err());
    Ok(())
}
