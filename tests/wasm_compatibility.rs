#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use conceptmap::{ConceptMap, LayoutConfig, MindMapConfig};
    use wasm_bindgen_test::*;

    const PAYLOAD: &str = r#"{
        "nodes": [
            { "id": "A", "label": "Start" },
            { "id": "B", "label": "Is it working?" },
            { "id": "C", "label": "Great!" },
            { "id": "D", "label": "Debug" }
        ],
        "edges": [
            { "from": "A", "to": "B" },
            { "from": "B", "to": "C", "label": "Yes" },
            { "from": "B", "to": "D", "label": "No" },
            { "from": "D", "to": "B" }
        ]
    }"#;

    #[wasm_bindgen_test]
    fn test_layout_and_render() {
        let map = ConceptMap::parse(PAYLOAD).expect("Failed to parse concept map");
        let layout = map
            .layout(&LayoutConfig::default())
            .expect("Failed to lay out concept map");

        assert_eq!(layout.broken_edges, vec![3]);

        let svg = layout.render_svg("white").expect("Failed to render SVG");
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Start"));
        assert!(svg.contains("Great!"));
        assert!(svg.contains("Debug"));
    }

    #[wasm_bindgen_test]
    fn test_mind_map() {
        let map = ConceptMap::parse(PAYLOAD).expect("Failed to parse concept map");
        let svg = map
            .mind_map(&MindMapConfig::default())
            .expect("Failed to lay out mind map")
            .render_svg("white")
            .expect("Failed to render SVG");

        assert!(svg.contains("viewBox"));
    }

    #[wasm_bindgen_test]
    fn test_minimal_map() {
        let map = ConceptMap::parse(r#"{ "nodes": [ { "id": "A" } ] }"#)
            .expect("Failed to parse minimal map");
        let svg = map
            .layout(&LayoutConfig::default())
            .expect("Failed to lay out minimal map")
            .render_svg("white")
            .expect("Failed to render minimal SVG");

        assert!(svg.contains("<svg"));
        assert!(svg.contains(">A<"));
    }
}
