//! Heroine FDL - WASM Module
//!
//! An angle-constrained force-directed layout engine for the Heroine Graph
//! visualization library. It is compiled to WebAssembly and exposes a
//! JavaScript-friendly API via wasm-bindgen; the Rust API is usable directly.
//!
//! # Architecture
//!
//! - `geometry`: Points and vectors with a lazily cached polar form
//! - `graph`: Layout graph using petgraph's StableGraph
//! - `spatial`: R-tree spatial indexing for neighbor queries and hit testing
//! - `layout`: The force simulation and constraint relaxation

use js_sys::Float64Array;
use tracing::debug;
use wasm_bindgen::prelude::*;

pub mod error;
pub mod geometry;
pub mod graph;
pub mod layout;
pub mod spatial;

use error::LayoutError;
use geometry::{Point, Vector};
use graph::{EdgeId, LayoutGraph, NodeId};
use layout::{ForceLayout, LayoutConfig};

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Either a graph being edited, or a layout running over it.
enum Stage {
    Editing(LayoutGraph),
    Running(ForceLayout<LayoutGraph>),
}

impl Default for Stage {
    fn default() -> Self {
        Stage::Editing(LayoutGraph::new())
    }
}

impl Stage {
    fn graph(&self) -> &LayoutGraph {
        match self {
            Stage::Editing(graph) => graph,
            Stage::Running(layout) => layout.graph(),
        }
    }

    fn into_graph(self) -> LayoutGraph {
        match self {
            Stage::Editing(graph) => graph,
            Stage::Running(layout) => layout.into_graph(),
        }
    }
}

/// Main entry point for the layout engine.
///
/// Build the graph with `addNode`/`addEdge`, then `start` a layout and drive
/// it with `step` and `enforceConstraints`. Adding nodes or edges ends a
/// running layout; positions are kept.
#[wasm_bindgen]
pub struct HeroineLayoutWasm {
    stage: Stage,
}

#[wasm_bindgen]
impl HeroineLayoutWasm {
    /// Create a new empty layout engine.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            stage: Stage::default(),
        }
    }

    /// Create a layout engine with pre-allocated capacity.
    #[wasm_bindgen(js_name = withCapacity)]
    pub fn with_capacity(node_capacity: usize, edge_capacity: usize) -> Self {
        Self {
            stage: Stage::Editing(LayoutGraph::with_capacity(node_capacity, edge_capacity)),
        }
    }

    // =========================================================================
    // Graph Construction
    // =========================================================================

    /// Add a node with the default mass.
    ///
    /// Returns the stable node ID.
    #[wasm_bindgen(js_name = addNode)]
    pub fn add_node(&mut self, x: f64, y: f64) -> u32 {
        self.edit().add_node(Point::new(x, y)).raw()
    }

    #[wasm_bindgen(js_name = addNodeWithMass)]
    pub fn add_node_with_mass(&mut self, x: f64, y: f64, mass: f64) -> Result<u32, JsError> {
        Ok(self.edit().add_node_with_mass(Point::new(x, y), mass)?.raw())
    }

    /// Add an edge whose ideal geometry is the endpoints' current offset.
    #[wasm_bindgen(js_name = addEdge)]
    pub fn add_edge(&mut self, source: u32, target: u32) -> Result<u32, JsError> {
        Ok(self.edit().add_edge(NodeId(source), NodeId(target))?.raw())
    }

    /// Add an edge with an explicit ideal displacement `(dx, dy)`.
    #[wasm_bindgen(js_name = addEdgeWithIdeal)]
    pub fn add_edge_with_ideal(
        &mut self,
        source: u32,
        target: u32,
        dx: f64,
        dy: f64,
    ) -> Result<u32, JsError> {
        let ideal = Vector::from_rectangular(dx, dy);
        Ok(self
            .edit()
            .add_edge_with_ideal(NodeId(source), NodeId(target), ideal)?
            .raw())
    }

    #[wasm_bindgen(js_name = nodeCount)]
    pub fn node_count(&self) -> u32 {
        self.stage.graph().node_count() as u32
    }

    #[wasm_bindgen(js_name = edgeCount)]
    pub fn edge_count(&self) -> u32 {
        self.stage.graph().edge_count() as u32
    }

    // =========================================================================
    // Positions
    // =========================================================================

    /// Move a node. Allowed while a layout is running (e.g. dragging).
    #[wasm_bindgen(js_name = setNodePosition)]
    pub fn set_node_position(&mut self, node_id: u32, x: f64, y: f64) -> Result<(), JsError> {
        let id = NodeId(node_id);
        let position = Point::new(x, y);
        match &mut self.stage {
            Stage::Editing(graph) => graph.set_position(id, position)?,
            Stage::Running(layout) => layout.set_position(id, position)?,
        }
        Ok(())
    }

    /// Get a node's X position.
    #[wasm_bindgen(js_name = getNodeX)]
    pub fn get_node_x(&self, node_id: u32) -> Option<f64> {
        self.stage.graph().position(NodeId(node_id)).map(|p| p.x)
    }

    /// Get a node's Y position.
    #[wasm_bindgen(js_name = getNodeY)]
    pub fn get_node_y(&self, node_id: u32) -> Option<f64> {
        self.stage.graph().position(NodeId(node_id)).map(|p| p.y)
    }

    /// Get all positions as `[x0, y0, x1, y1, ...]` in node ID order.
    #[wasm_bindgen(js_name = getPositions)]
    pub fn get_positions(&self) -> Float64Array {
        Float64Array::from(&self.positions()[..])
    }

    /// Find the nearest node within `max_distance` of `(x, y)`.
    #[wasm_bindgen(js_name = findNearestNode)]
    pub fn find_nearest_node(&self, x: f64, y: f64, max_distance: f64) -> Option<u32> {
        self.stage
            .graph()
            .nearest_node(Point::new(x, y), max_distance)
            .map(NodeId::raw)
    }

    /// Get the bounding box as `[minX, minY, maxX, maxY]`.
    #[wasm_bindgen(js_name = getBounds)]
    pub fn get_bounds(&self) -> Option<Vec<f64>> {
        self.stage
            .graph()
            .bounds()
            .map(|(min, max)| vec![min.x, min.y, max.x, max.y])
    }

    /// Serialize every node's position as `{ nodes: [{ id, x, y }] }`.
    pub fn snapshot(&self) -> Result<JsValue, JsError> {
        Ok(serde_wasm_bindgen::to_value(&self.stage.graph().snapshot())?)
    }

    // =========================================================================
    // Edge Geometry
    // =========================================================================

    /// Angle error of an edge in radians, in `(-π, π]`.
    #[wasm_bindgen(js_name = edgeAngleDelta)]
    pub fn edge_angle_delta(&self, edge_id: u32) -> Option<f64> {
        self.stage
            .graph()
            .edge(EdgeId(edge_id))
            .map(|edge| edge.angle_delta())
    }

    /// Length error of an edge (ideal minus actual).
    #[wasm_bindgen(js_name = edgeLengthDelta)]
    pub fn edge_length_delta(&self, edge_id: u32) -> Option<f64> {
        self.stage
            .graph()
            .edge(EdgeId(edge_id))
            .map(|edge| edge.length_delta())
    }

    // =========================================================================
    // Layout
    // =========================================================================

    /// Start a layout over the component containing `start_id`, with the
    /// default configuration.
    pub fn start(&mut self, start_id: Option<u32>) -> Result<(), JsError> {
        Ok(self.begin(start_id, LayoutConfig::default())?)
    }

    /// Start a layout with a (partial) configuration object, e.g.
    /// `{ damping: 0.8, torqueStrength: 20 }`.
    #[wasm_bindgen(js_name = startWithConfig)]
    pub fn start_with_config(
        &mut self,
        start_id: Option<u32>,
        config: JsValue,
    ) -> Result<(), JsError> {
        let config: LayoutConfig = serde_wasm_bindgen::from_value(config)?;
        Ok(self.begin(start_id, config)?)
    }

    #[wasm_bindgen(js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        matches!(self.stage, Stage::Running(_))
    }

    /// Perform one tick. Returns the energy indicator.
    pub fn step(&mut self) -> Result<f64, JsError> {
        Ok(self.running()?.step())
    }

    #[wasm_bindgen(js_name = enforceConstraints)]
    pub fn enforce_constraints(&mut self, repetitions: u32) -> Result<(), JsError> {
        self.running()?.enforce_constraints(repetitions as usize);
        Ok(())
    }

    /// Step until the energy drops below `tolerance` or `max_ticks` have run.
    ///
    /// Returns `{ ticks, energy, converged }`.
    #[wasm_bindgen(js_name = runUntilStable)]
    pub fn run_until_stable(&mut self, max_ticks: u32, tolerance: f64) -> Result<JsValue, JsError> {
        let summary = self.running()?.run_until_stable(max_ticks as usize, tolerance);
        Ok(serde_wasm_bindgen::to_value(&summary)?)
    }

    /// Number of constraints in the running layout, or 0 when stopped.
    #[wasm_bindgen(js_name = numConstraints)]
    pub fn num_constraints(&self) -> u32 {
        match &self.stage {
            Stage::Running(layout) => layout.num_constraints() as u32,
            Stage::Editing(_) => 0,
        }
    }

    /// End the running layout, keeping the current positions.
    pub fn stop(&mut self) {
        self.edit();
    }
}

impl HeroineLayoutWasm {
    fn begin(&mut self, start_id: Option<u32>, config: LayoutConfig) -> Result<(), LayoutError> {
        let start = start_id.map(NodeId).ok_or(LayoutError::MissingStartNode)?;
        let mut graph = std::mem::take(&mut self.stage).into_graph();
        // a failed start leaves the graph editable
        let checked = ForceLayout::with_config(&mut graph, start, config.clone()).map(|_| ());
        if let Err(err) = checked {
            self.stage = Stage::Editing(graph);
            return Err(err);
        }
        self.stage = Stage::Running(ForceLayout::with_config(graph, start, config)?);
        Ok(())
    }

    /// Switch to editing, ending any running layout, and return the graph.
    fn edit(&mut self) -> &mut LayoutGraph {
        if let Stage::Running(_) = self.stage {
            debug!("layout stopped for editing");
            let graph = std::mem::take(&mut self.stage).into_graph();
            self.stage = Stage::Editing(graph);
        }
        match &mut self.stage {
            Stage::Editing(graph) => graph,
            Stage::Running(_) => unreachable!("stage was just set to editing"),
        }
    }

    fn running(&mut self) -> Result<&mut ForceLayout<LayoutGraph>, LayoutError> {
        match &mut self.stage {
            Stage::Running(layout) => Ok(layout),
            Stage::Editing(_) => Err(LayoutError::MissingStartNode),
        }
    }

    fn positions(&self) -> Vec<f64> {
        let graph = self.stage.graph();
        let mut positions = Vec::with_capacity(graph.node_count() * 2);
        for id in graph.node_ids() {
            if let Some(p) = graph.position(id) {
                positions.push(p.x);
                positions.push(p.y);
            }
        }
        positions
    }
}

impl Default for HeroineLayoutWasm {
    fn default() -> Self {
        Self::new()
    }
}
