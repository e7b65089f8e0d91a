//! Hardware topology tree.
//!
//! Mirrors the host, its hardware devices (possibly nested) and their sensors
//! into an arena of nodes addressed by [`NodeId`]. Parent/child links are id
//! lists; child order is insertion order and is what the tree view shows.
//!
//! Ordering rules:
//! - hardware siblings are kept ascending by [`HardwareType`], equal types in
//!   arrival order ([`HardwareTree::insert_sorted`]);
//! - hardware children of a device come before its sensors;
//! - sensors of a device are ordered by `(SensorType, index)`, equal keys in
//!   arrival order.
//!
//! A hardware subtree is created when the hardware layer reports the device
//! added and destroyed when it reports the device removed, matched by handle
//! identity. Sensor add/remove events addressed to a device that is no longer
//! in the tree find no node and are dropped, which is how the subscriptions a
//! removed subtree held go away.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use hwscope_types::{HardwareType, Rgb, SensorType};

use crate::colors::PlotEntry;
use crate::refresh::SensorSample;
use crate::traits::{SharedHardware, SharedSensor, same_handle};

/// Key of the root node in persisted per-node settings.
pub const ROOT_KEY: &str = "/";

/// Handle to a node in a [`HardwareTree`].
///
/// Handles of removed nodes never resolve again, even after the slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

/// What a node represents.
#[derive(Debug)]
pub enum NodeKind {
    /// The monitored host.
    Root {
        /// Display name of the host.
        name: String,
    },
    /// A hardware device.
    Hardware(HardwareNode),
    /// A sensor.
    Sensor(SensorNode),
}

/// A node wrapping one hardware device.
#[derive(Debug)]
pub struct HardwareNode {
    hardware: SharedHardware,
    hardware_type: HardwareType,
}

impl HardwareNode {
    /// The wrapped device handle.
    pub fn hardware(&self) -> &SharedHardware {
        &self.hardware
    }

    /// Classification captured when the node was created.
    pub fn hardware_type(&self) -> HardwareType {
        self.hardware_type
    }
}

/// A node wrapping one sensor.
///
/// `plot`, `pen_color` and `hidden` belong to the user; `value`, `min` and
/// `max` are only written when a refresh result is applied.
#[derive(Debug)]
pub struct SensorNode {
    sensor: SharedSensor,
    plot: bool,
    pen_color: Option<Rgb>,
    hidden: bool,
    value: Option<f32>,
    min: Option<f32>,
    max: Option<f32>,
}

impl SensorNode {
    fn new(sensor: SharedSensor) -> Self {
        Self {
            sensor,
            plot: false,
            pen_color: None,
            hidden: false,
            value: None,
            min: None,
            max: None,
        }
    }

    /// The wrapped sensor handle.
    pub fn sensor(&self) -> &SharedSensor {
        &self.sensor
    }

    /// Stable identifier of the sensor.
    pub fn identifier(&self) -> &str {
        self.sensor.identifier()
    }

    pub fn sensor_type(&self) -> SensorType {
        self.sensor.sensor_type()
    }

    /// Whether the user selected this sensor for charting.
    pub fn plot(&self) -> bool {
        self.plot
    }

    pub fn set_plot(&mut self, plot: bool) {
        self.plot = plot;
    }

    /// Explicit pen color chosen by the user.
    pub fn pen_color(&self) -> Option<Rgb> {
        self.pen_color
    }

    pub fn set_pen_color(&mut self, color: Option<Rgb>) {
        self.pen_color = color;
    }

    /// Whether the user hid this sensor.
    pub fn hidden(&self) -> bool {
        self.hidden
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    /// Value from the most recent refresh.
    pub fn value(&self) -> Option<f32> {
        self.value
    }

    pub fn min(&self) -> Option<f32> {
        self.min
    }

    pub fn max(&self) -> Option<f32> {
        self.max
    }

    fn apply(&mut self, sample: &SensorSample) {
        self.value = sample.value;
        self.min = sample.min;
        self.max = sample.max;
    }

    /// Restart min/max from the current value.
    pub fn reset_min_max(&mut self) {
        self.min = self.value;
        self.max = self.value;
    }

    fn order_key(&self) -> (SensorType, usize) {
        (self.sensor.sensor_type(), self.sensor.index())
    }
}

/// A tree element.
#[derive(Debug)]
pub struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    visible: bool,
    expanded: bool,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            visible: true,
            expanded: true,
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in display order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn set_expanded(&mut self, expanded: bool) {
        self.expanded = expanded;
    }

    /// Display label.
    pub fn label(&self) -> &str {
        match &self.kind {
            NodeKind::Root { name } => name,
            NodeKind::Hardware(hw) => hw.hardware.name(),
            NodeKind::Sensor(s) => s.sensor.name(),
        }
    }

    /// Stable key used for persisted per-node settings.
    pub fn key(&self) -> &str {
        match &self.kind {
            NodeKind::Root { .. } => ROOT_KEY,
            NodeKind::Hardware(hw) => hw.hardware.identifier(),
            NodeKind::Sensor(s) => s.sensor.identifier(),
        }
    }

    pub fn as_hardware(&self) -> Option<&HardwareNode> {
        match &self.kind {
            NodeKind::Hardware(hw) => Some(hw),
            _ => None,
        }
    }

    pub fn as_sensor(&self) -> Option<&SensorNode> {
        match &self.kind {
            NodeKind::Sensor(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sensor_mut(&mut self) -> Option<&mut SensorNode> {
        match &mut self.kind {
            NodeKind::Sensor(s) => Some(s),
            _ => None,
        }
    }
}

/// Structural effect of a tree mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeChange {
    /// Nodes were created.
    Added {
        /// New hardware nodes, pre-order.
        hardware: Vec<NodeId>,
        /// New sensor nodes, pre-order.
        sensors: Vec<NodeId>,
    },
    /// Nodes were destroyed.
    Removed {
        /// Number of nodes destroyed.
        nodes: usize,
        /// Identifiers of the destroyed sensors.
        sensors: Vec<String>,
    },
    /// Nothing happened (duplicate or unknown notification).
    Unchanged,
}

impl TreeChange {
    /// Whether dependents of the selection (the plotted set) must be recomputed.
    pub fn selection_changed(&self) -> bool {
        !matches!(self, TreeChange::Unchanged)
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Rooted tree of host, hardware and sensor nodes.
#[derive(Debug)]
pub struct HardwareTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
    hardware_index: HashMap<String, NodeId>,
    sensor_index: HashMap<String, NodeId>,
    show_hidden: bool,
}

impl HardwareTree {
    /// Create a tree holding only the host node.
    pub fn new(host_name: impl Into<String>) -> Self {
        let mut tree = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
            hardware_index: HashMap::new(),
            sensor_index: HashMap::new(),
            show_hidden: false,
        };
        tree.root = tree.alloc(Node::new(NodeKind::Root {
            name: host_name.into(),
        }));
        tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Whether the tree holds only the root.
    pub fn is_empty(&self) -> bool {
        self.len() == 1
    }

    /// Number of sensor nodes.
    pub fn sensor_count(&self) -> usize {
        self.sensor_index.len()
    }

    /// Look up a sensor node by sensor identifier.
    pub fn find_sensor(&self, identifier: &str) -> Option<NodeId> {
        self.sensor_index.get(identifier).copied()
    }

    /// Look up a node by its persisted key (root, hardware or sensor identifier).
    pub fn find_by_key(&self, key: &str) -> Option<NodeId> {
        if key == ROOT_KEY {
            return Some(self.root);
        }
        self.hardware_index
            .get(key)
            .or_else(|| self.sensor_index.get(key))
            .copied()
    }

    /// Look up the node wrapping exactly this device handle, at any depth.
    pub fn find_hardware(&self, hardware: &SharedHardware) -> Option<NodeId> {
        let id = *self.hardware_index.get(hardware.identifier())?;
        let node = self.get(id)?.as_hardware()?;
        same_handle(node.hardware(), hardware).then_some(id)
    }

    pub fn sensor(&self, id: NodeId) -> Option<&SensorNode> {
        self.get(id)?.as_sensor()
    }

    pub fn sensor_mut(&mut self, id: NodeId) -> Option<&mut SensorNode> {
        self.get_mut(id)?.as_sensor_mut()
    }

    /// Identifiers of every sensor in the tree.
    pub fn sensor_identifiers(&self) -> impl Iterator<Item = &str> {
        self.sensor_index.keys().map(String::as_str)
    }

    /// Whether hidden sensors are shown (and therefore plottable).
    pub fn show_hidden(&self) -> bool {
        self.show_hidden
    }

    pub fn set_show_hidden(&mut self, show: bool) {
        self.show_hidden = show;
    }

    /// Add a top-level device and, recursively, its sub-devices and sensors.
    ///
    /// A device whose handle or identifier is already in the tree is ignored:
    /// duplicate notifications never duplicate a subtree.
    pub fn add_hardware(&mut self, hardware: SharedHardware) -> TreeChange {
        if self.hardware_index.contains_key(hardware.identifier()) {
            debug!(
                hardware = hardware.identifier(),
                "Ignoring duplicate hardware-added notification"
            );
            return TreeChange::Unchanged;
        }

        let mut new_hardware = Vec::new();
        let mut new_sensors = Vec::new();
        let node = self.build_hardware(hardware, &mut new_hardware, &mut new_sensors);
        self.insert_sorted(self.root, node);

        info!(
            hardware = self.get(node).map(Node::label).unwrap_or_default(),
            devices = new_hardware.len(),
            sensors = new_sensors.len(),
            "Hardware added"
        );

        TreeChange::Added {
            hardware: new_hardware,
            sensors: new_sensors,
        }
    }

    /// Remove every top-level device wrapping exactly this handle.
    ///
    /// Unknown devices are ignored.
    pub fn remove_hardware(&mut self, hardware: &SharedHardware) -> TreeChange {
        let matches: Vec<NodeId> = self
            .children_of(self.root)
            .iter()
            .copied()
            .filter(|&child| {
                self.get(child)
                    .and_then(Node::as_hardware)
                    .is_some_and(|hw| same_handle(hw.hardware(), hardware))
            })
            .collect();

        if matches.is_empty() {
            debug!(
                hardware = hardware.identifier(),
                "Ignoring removal of unknown hardware"
            );
            return TreeChange::Unchanged;
        }

        let mut nodes = 0;
        let mut sensors = Vec::new();
        for id in matches {
            let (count, removed) = self.remove_subtree(id);
            nodes += count;
            sensors.extend(removed);
        }

        info!(
            hardware = hardware.identifier(),
            nodes,
            sensors = sensors.len(),
            "Hardware removed"
        );
        TreeChange::Removed { nodes, sensors }
    }

    /// Attach a sensor reported by a device already in the tree.
    pub fn add_sensor(&mut self, hardware: &SharedHardware, sensor: SharedSensor) -> TreeChange {
        let Some(parent) = self.find_hardware(hardware) else {
            debug!(
                hardware = hardware.identifier(),
                sensor = sensor.identifier(),
                "Ignoring sensor added to hardware not in the tree"
            );
            return TreeChange::Unchanged;
        };

        match self.attach_sensor(parent, sensor) {
            Some(id) => TreeChange::Added {
                hardware: Vec::new(),
                sensors: vec![id],
            },
            None => TreeChange::Unchanged,
        }
    }

    /// Detach a sensor from a device in the tree, matched by handle identity.
    pub fn remove_sensor(&mut self, hardware: &SharedHardware, sensor: &SharedSensor) -> TreeChange {
        let Some(parent) = self.find_hardware(hardware) else {
            return TreeChange::Unchanged;
        };

        let target = self.children_of(parent).iter().copied().find(|&child| {
            self.sensor(child)
                .is_some_and(|s| same_handle(s.sensor(), sensor))
        });

        match target {
            Some(id) => {
                let (nodes, sensors) = self.remove_subtree(id);
                debug!(sensor = sensor.identifier(), "Sensor removed");
                TreeChange::Removed { nodes, sensors }
            }
            None => TreeChange::Unchanged,
        }
    }

    /// Insert a hardware node among `parent`'s children.
    ///
    /// Scans from the front while the current child is a hardware node whose
    /// type is `<=` the new node's type and inserts at the first position where
    /// that fails. Equal types therefore keep arrival order, and the scan stops
    /// at the first non-hardware child.
    pub fn insert_sorted(&mut self, parent: NodeId, child: NodeId) {
        let Some(new_type) = self
            .get(child)
            .and_then(Node::as_hardware)
            .map(HardwareNode::hardware_type)
        else {
            return;
        };

        let position = self
            .children_of(parent)
            .iter()
            .position(|&sibling| {
                !self
                    .get(sibling)
                    .and_then(Node::as_hardware)
                    .is_some_and(|hw| hw.hardware_type() <= new_type)
            })
            .unwrap_or(self.children_of(parent).len());

        self.link(parent, child, position);
    }

    /// All nodes, depth-first in display order, with their depth.
    pub fn traverse(&self) -> DepthFirst<'_> {
        DepthFirst::new(self, false)
    }

    /// Tree-visible nodes only, depth-first, with their depth.
    ///
    /// Subtrees below a node that is not visible are skipped entirely.
    pub fn traverse_visible(&self) -> DepthFirst<'_> {
        DepthFirst::new(self, true)
    }

    /// Whether the node and all of its ancestors are visible.
    pub fn is_tree_visible(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(id) = current {
            match self.get(id) {
                Some(node) if self.shown(node) => current = node.parent,
                _ => return false,
            }
        }
        true
    }

    /// Plotted sensors (plot set and tree-visible), in traversal order.
    pub fn plotted(&self) -> Vec<NodeId> {
        self.traverse_visible()
            .filter(|&(id, _)| self.sensor(id).is_some_and(SensorNode::plot))
            .map(|(id, _)| id)
            .collect()
    }

    /// Every tree-visible sensor in traversal order, as input for color assignment.
    pub fn plot_entries(&self) -> Vec<PlotEntry<String>> {
        self.traverse_visible()
            .filter_map(|(id, _)| self.sensor(id))
            .map(|s| PlotEntry {
                key: s.identifier().to_string(),
                plotted: s.plot(),
                pen_color: s.pen_color(),
            })
            .collect()
    }

    /// Copy refreshed values into the matching sensor nodes.
    ///
    /// Samples for sensors that left the tree meanwhile are skipped. Returns the
    /// number of nodes updated.
    pub fn apply_samples(&mut self, samples: &[SensorSample]) -> usize {
        let mut updated = 0;
        for sample in samples {
            let Some(&id) = self.sensor_index.get(&sample.identifier) else {
                continue;
            };
            if let Some(node) = self.sensor_mut(id) {
                node.apply(sample);
                updated += 1;
            }
        }
        updated
    }

    fn shown(&self, node: &Node) -> bool {
        node.visible
            && match &node.kind {
                NodeKind::Sensor(s) => !s.hidden || self.show_hidden,
                _ => true,
            }
    }

    fn children_of(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(Node::children).unwrap_or_default()
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.node = Some(node);
                NodeId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                NodeId {
                    index,
                    generation: 0,
                }
            }
        }
    }

    fn release(&mut self, id: NodeId) -> Option<Node> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        Some(node)
    }

    fn link(&mut self, parent: NodeId, child: NodeId, position: usize) {
        if let Some(node) = self.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.get_mut(parent) {
            let position = position.min(node.children.len());
            node.children.insert(position, child);
        }
    }

    fn build_hardware(
        &mut self,
        hardware: SharedHardware,
        new_hardware: &mut Vec<NodeId>,
        new_sensors: &mut Vec<NodeId>,
    ) -> NodeId {
        let identifier = hardware.identifier().to_string();
        let sensors = hardware.sensors();
        let sub_hardware = hardware.sub_hardware();

        let id = self.alloc(Node::new(NodeKind::Hardware(HardwareNode {
            hardware_type: hardware.hardware_type(),
            hardware,
        })));
        self.hardware_index.insert(identifier, id);
        new_hardware.push(id);

        for sensor in sensors {
            if let Some(sensor_id) = self.attach_sensor(id, sensor) {
                new_sensors.push(sensor_id);
            }
        }

        for sub in sub_hardware {
            if self.hardware_index.contains_key(sub.identifier()) {
                debug!(
                    hardware = sub.identifier(),
                    "Skipping sub-hardware already in the tree"
                );
                continue;
            }
            let child = self.build_hardware(sub, new_hardware, new_sensors);
            self.insert_sorted(id, child);
        }

        id
    }

    fn attach_sensor(&mut self, parent: NodeId, sensor: SharedSensor) -> Option<NodeId> {
        if self.sensor_index.contains_key(sensor.identifier()) {
            warn!(
                sensor = sensor.identifier(),
                "Sensor identifier already in the tree, ignoring"
            );
            return None;
        }

        let node = SensorNode::new(sensor);
        let key = node.order_key();
        let identifier = node.identifier().to_string();

        let position = self
            .children_of(parent)
            .iter()
            .position(|&sibling| match self.get(sibling).map(Node::kind) {
                Some(NodeKind::Sensor(s)) => s.order_key() > key,
                _ => false,
            })
            .unwrap_or(self.children_of(parent).len());

        let id = self.alloc(Node::new(NodeKind::Sensor(node)));
        self.sensor_index.insert(identifier, id);
        self.link(parent, id, position);
        Some(id)
    }

    /// Detach `id` from its parent and free it with all descendants.
    fn remove_subtree(&mut self, id: NodeId) -> (usize, Vec<String>) {
        if let Some(parent) = self.get(id).and_then(Node::parent)
            && let Some(node) = self.get_mut(parent)
        {
            node.children.retain(|&child| child != id);
        }

        let mut removed_sensors = Vec::new();
        let mut count = 0;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.release(current) else {
                continue;
            };
            count += 1;
            stack.extend(node.children.iter().copied());
            match &node.kind {
                NodeKind::Hardware(hw) => {
                    self.hardware_index.remove(hw.hardware.identifier());
                }
                NodeKind::Sensor(s) => {
                    let identifier = s.identifier().to_string();
                    self.sensor_index.remove(&identifier);
                    removed_sensors.push(identifier);
                }
                NodeKind::Root { .. } => {}
            }
        }
        (count, removed_sensors)
    }
}

/// Depth-first iterator over a [`HardwareTree`], yielding `(id, depth)`.
#[derive(Debug)]
pub struct DepthFirst<'a> {
    tree: &'a HardwareTree,
    stack: Vec<(NodeId, usize)>,
    visible_only: bool,
}

impl<'a> DepthFirst<'a> {
    fn new(tree: &'a HardwareTree, visible_only: bool) -> Self {
        Self {
            tree,
            stack: vec![(tree.root, 0)],
            visible_only,
        }
    }
}

impl Iterator for DepthFirst<'_> {
    type Item = (NodeId, usize);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (id, depth) = self.stack.pop()?;
            let Some(node) = self.tree.get(id) else {
                continue;
            };
            if self.visible_only && !self.tree.shown(node) {
                continue;
            }
            self.stack
                .extend(node.children.iter().rev().map(|&child| (child, depth + 1)));
            return Some((id, depth));
        }
    }
}
