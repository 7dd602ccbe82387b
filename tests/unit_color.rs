// Unit tests for palette assignment and the lightness cascade.

use sunburst::color::{Rgb, ROOT_COLOR};
use sunburst::hierarchy::tree::Tree;
use sunburst::{EngineConfig, EngineError, SunburstEngine, Table};

fn three_zones() -> Table {
    Table::from_rows(
        &["Zone", "Cluster", "Country"],
        &[
            vec!["A", "A-North", "a1"],
            vec!["A", "A-North", "a2"],
            vec!["A", "A-South", "a3"],
            vec!["B", "B-North", "b1"],
            vec!["C", "C-North", "c1"],
        ],
    )
    .unwrap()
}

fn two_color_config() -> EngineConfig {
    EngineConfig {
        palette: vec!["#1F77B4".to_string(), "#FF7F0E".to_string()],
        ..EngineConfig::default()
    }
}

fn build(config: EngineConfig) -> Tree {
    SunburstEngine::new(config)
        .unwrap()
        .build(&three_zones(), None)
        .unwrap()
}

fn color(tree: &Tree, label: &str) -> String {
    tree.get(label).unwrap().color.clone()
}

fn lightness(hex: &str) -> f64 {
    Rgb::from_hex(hex).unwrap().to_hsl().l
}

// ============================================================
// Palette
// ============================================================

#[test]
fn palette_cycles_over_top_level_nodes() {
    let tree = build(two_color_config());
    assert_eq!(color(&tree, "A"), "#1f77b4");
    assert_eq!(color(&tree, "B"), "#ff7f0e");
    assert_eq!(color(&tree, "C"), "#1f77b4");
}

#[test]
fn virtual_root_is_white() {
    let tree = build(two_color_config());
    assert_eq!(color(&tree, "Geo Levels"), ROOT_COLOR);
    assert_eq!(ROOT_COLOR, "#ffffff");
}

#[test]
fn colors_are_lowercase_six_digit_hex() {
    let tree = build(EngineConfig::default());
    for node in tree.nodes() {
        let c = &node.color;
        assert_eq!(c.len(), 7, "{}: {c}", node.label);
        assert!(c.starts_with('#'));
        assert!(
            c[1..].chars().all(|ch| ch.is_ascii_digit() || ('a'..='f').contains(&ch)),
            "{}: {c}",
            node.label
        );
    }
}

#[test]
fn malformed_palette_entry_is_rejected() {
    let config = EngineConfig {
        palette: vec!["#1f77b4".to_string(), "blue".to_string()],
        ..EngineConfig::default()
    };
    let err = SunburstEngine::new(config).err().unwrap();
    assert!(matches!(err, EngineError::InvalidConfig(_)));
}

// ============================================================
// Lightness cascade
// ============================================================

#[test]
fn deeper_nodes_are_never_darker_than_their_parent() {
    let tree = build(two_color_config());
    for node in tree.nodes() {
        let Some(p) = node.parent else { continue };
        let parent = &tree.nodes()[p];
        if parent.is_virtual_root() {
            continue;
        }
        assert!(
            lightness(&node.color) >= lightness(&parent.color) - 1e-9,
            "{} is darker than {}",
            node.label,
            parent.label
        );
    }
}

#[test]
fn siblings_share_one_shade() {
    let tree = build(two_color_config());
    assert_eq!(color(&tree, "A-North"), color(&tree, "A-South"));
    assert_eq!(color(&tree, "a1"), color(&tree, "a2"));
    assert_ne!(color(&tree, "A"), color(&tree, "A-North"));
}

#[test]
fn shade_is_one_lighten_step_above_the_parent() {
    let tree = build(two_color_config());
    let expected = Rgb::from_hex("#1f77b4").unwrap().lighten(0.10).to_hex();
    assert_eq!(color(&tree, "A-North"), expected);

    let l_parent = lightness(&color(&tree, "A"));
    let l_child = lightness(&color(&tree, "A-North"));
    assert!((l_child - l_parent - 0.10).abs() < 0.01);
}

#[test]
fn zero_step_keeps_the_base_color() {
    let tree = build(EngineConfig {
        lighten_step: 0.0,
        ..two_color_config()
    });
    assert_eq!(color(&tree, "a1"), "#1f77b4");
    assert_eq!(color(&tree, "b1"), "#ff7f0e");
}

#[test]
fn near_white_base_saturates_at_white() {
    let tree = build(EngineConfig {
        palette: vec!["#f0f0f0".to_string()],
        ..EngineConfig::default()
    });
    assert_eq!(color(&tree, "a1"), "#ffffff");
    assert!(lightness(&color(&tree, "A-North")) <= 1.0);
}
