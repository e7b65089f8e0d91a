//! Render-ready rows for tree views.

use serde::Serialize;

use hwscope_types::{HardwareType, Rgb, SensorType};

use crate::colors::ColorMap;
use crate::tree::{HardwareTree, NodeKind};

/// What a row shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowKind {
    Host,
    Hardware { hardware_type: HardwareType },
    Sensor { sensor_type: SensorType },
}

/// One line of the tree view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderRow {
    /// Node key (root, hardware or sensor identifier).
    pub key: String,
    pub depth: usize,
    #[serde(flatten)]
    pub kind: RowKind,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<String>,
    /// Pen color, for plotted sensors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgb>,
    pub plot: bool,
    pub hidden: bool,
    pub expanded: bool,
    /// Whether the node has children (collapsed or not).
    pub has_children: bool,
}

/// Depth-first rows for every tree-visible node.
///
/// Descendants of a collapsed node are omitted; the collapsed node itself is
/// listed.
pub fn render_rows(tree: &HardwareTree, colors: &ColorMap) -> Vec<RenderRow> {
    let mut rows = Vec::new();
    let mut collapsed_at: Option<usize> = None;

    for (id, depth) in tree.traverse_visible() {
        if let Some(limit) = collapsed_at {
            if depth > limit {
                continue;
            }
            collapsed_at = None;
        }

        let Some(node) = tree.get(id) else {
            continue;
        };
        if !node.is_expanded() {
            collapsed_at = Some(depth);
        }

        let mut row = RenderRow {
            key: node.key().to_string(),
            depth,
            kind: RowKind::Host,
            label: node.label().to_string(),
            value: None,
            min: None,
            max: None,
            color: None,
            plot: false,
            hidden: false,
            expanded: node.is_expanded(),
            has_children: !node.children().is_empty(),
        };

        match node.kind() {
            NodeKind::Root { .. } => {}
            NodeKind::Hardware(hw) => {
                row.kind = RowKind::Hardware {
                    hardware_type: hw.hardware_type(),
                };
            }
            NodeKind::Sensor(sensor) => {
                let sensor_type = sensor.sensor_type();
                let format = |v: Option<f32>| v.map(|v| sensor_type.format_value(v));
                row.kind = RowKind::Sensor { sensor_type };
                row.value = format(sensor.value());
                row.min = format(sensor.min());
                row.max = format(sensor.max());
                row.color = colors.get(sensor.identifier()).copied();
                row.plot = sensor.plot();
                row.hidden = sensor.hidden();
            }
        }

        rows.push(row);
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::colors::PlotColorAssigner;
    use crate::mock::MockHardware;
    use crate::refresh::SensorSample;

    fn tree() -> HardwareTree {
        let mut tree = HardwareTree::new("bench");
        tree.add_hardware(
            MockHardware::builder("/amdcpu/0", "Ryzen 9", HardwareType::Cpu)
                .sensor(SensorType::Temperature, "Tctl", 60.0)
                .sensor(SensorType::Clock, "Core #1", 4200.0)
                .build(),
        );
        tree.add_hardware(
            MockHardware::builder("/nvme/0", "Samsung 980", HardwareType::Storage)
                .sensor(SensorType::Temperature, "Composite", 38.0)
                .build(),
        );
        tree
    }

    #[test]
    fn test_rows_are_depth_first() {
        let tree = tree();
        let rows = render_rows(&tree, &ColorMap::new());
        let labels: Vec<(usize, &str)> = rows.iter().map(|r| (r.depth, r.label.as_str())).collect();
        assert_eq!(
            labels,
            vec![
                (0, "bench"),
                (1, "Ryzen 9"),
                (2, "Core #1"),
                (2, "Tctl"),
                (1, "Samsung 980"),
                (2, "Composite"),
            ]
        );
        assert_eq!(rows[0].kind, RowKind::Host);
        assert!(rows[0].has_children);
    }

    #[test]
    fn test_values_are_formatted_and_colored() {
        let mut tree = tree();
        tree.apply_samples(&[SensorSample {
            identifier: "/amdcpu/0/temperature/0".into(),
            value: Some(61.3),
            min: Some(55.0),
            max: Some(70.0),
        }]);
        let id = tree.find_sensor("/amdcpu/0/temperature/0").unwrap();
        tree.sensor_mut(id).unwrap().set_plot(true);

        let colors = PlotColorAssigner::default().recompute(&tree.plot_entries());
        let rows = render_rows(&tree, &colors);
        let tctl = rows.iter().find(|r| r.label == "Tctl").unwrap();
        assert_eq!(tctl.value.as_deref(), Some("61.3 °C"));
        assert_eq!(tctl.max.as_deref(), Some("70.0 °C"));
        assert!(tctl.plot);
        assert_eq!(tctl.color, colors.get("/amdcpu/0/temperature/0").copied());
        assert!(tctl.color.is_some());

        let core = rows.iter().find(|r| r.label == "Core #1").unwrap();
        assert!(core.color.is_none());
        assert!(core.value.is_none());
    }

    #[test]
    fn test_collapsed_node_hides_descendants() {
        let mut tree = tree();
        let cpu = tree.find_by_key("/amdcpu/0").unwrap();
        tree.get_mut(cpu).unwrap().set_expanded(false);

        let rows = render_rows(&tree, &ColorMap::new());
        let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["bench", "Ryzen 9", "Samsung 980", "Composite"]);
        assert!(!rows[1].expanded);
    }

    #[test]
    fn test_row_json_shape() {
        let tree = tree();
        let rows = render_rows(&tree, &ColorMap::new());
        let json = serde_json::to_value(&rows[1]).unwrap();
        assert_eq!(json["kind"], "hardware");
        assert_eq!(json["hardware_type"], "cpu");
        assert!(json.get("value").is_none());
    }
}
