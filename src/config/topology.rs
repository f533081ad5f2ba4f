use std::{collections::BTreeMap, fmt};

use crate::config::{layer::LayerConfig, network::ValidationError, BackpropType};

/// Backpropagation settings owned by a topology node. Shared by both
/// topology variants so that overrides apply to each identically.
#[derive(Clone, Debug, PartialEq)]
pub struct BackpropSettings {
    pub pretrain: bool,
    pub backprop: bool,
    pub backprop_type: BackpropType,
    pub tbptt_fwd_length: usize,
    pub tbptt_back_length: usize,
}

impl Default for BackpropSettings {
    fn default() -> Self {
        Self {
            pretrain: false,
            backprop: true,
            backprop_type: BackpropType::Standard,
            tbptt_fwd_length: 20,
            tbptt_back_length: 20,
        }
    }
}

impl BackpropSettings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.backprop_type == BackpropType::TruncatedBptt {
            if self.tbptt_fwd_length == 0 {
                return Err(ValidationError::TbpttLengthZero { field: "forward" });
            }
            if self.tbptt_back_length == 0 {
                return Err(ValidationError::TbpttLengthZero { field: "backward" });
            }
        }

        Ok(())
    }
}

/// An ordered stack of layers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SequentialConfig {
    pub layers: Vec<LayerConfig>,
    pub settings: BackpropSettings,
}

impl SequentialConfig {
    pub fn new(layers: Vec<LayerConfig>) -> Self {
        Self { layers, settings: BackpropSettings::default() }
    }
}

#[derive(Debug, PartialEq)]
pub enum GraphConfigError {
    VertexAlreadyExists(String),
    UnknownInput { vertex: String, input: String },
}

impl fmt::Display for GraphConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VertexAlreadyExists(name) => write!(f, "a vertex named '{name}' already exists"),
            Self::UnknownInput { vertex, input } => {
                write!(f, "vertex '{vertex}' takes input from '{input}', which does not exist")
            }
        }
    }
}

impl std::error::Error for GraphConfigError {}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphVertex {
    pub layer: LayerConfig,
    pub inputs: Vec<String>,
}

/// An arbitrary DAG of named layers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphConfig {
    inputs: Vec<String>,
    vertices: BTreeMap<String, GraphVertex>,
    pub settings: BackpropSettings,
}

impl GraphConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an external input feeding the graph.
    pub fn add_input(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.inputs.contains(&name) {
            self.inputs.push(name);
        }
    }

    /// Adds a named layer taking input from previously added vertices or
    /// declared graph inputs.
    pub fn add_layer(
        &mut self,
        name: impl Into<String>,
        layer: LayerConfig,
        inputs: &[&str],
    ) -> Result<(), GraphConfigError> {
        let name = name.into();

        if self.vertices.contains_key(&name) || self.inputs.iter().any(|i| *i == name) {
            return Err(GraphConfigError::VertexAlreadyExists(name));
        }

        for input in inputs {
            if !self.vertices.contains_key(*input) && !self.inputs.iter().any(|i| i == input) {
                return Err(GraphConfigError::UnknownInput { vertex: name, input: input.to_string() });
            }
        }

        let inputs = inputs.iter().map(|i| i.to_string()).collect();
        self.vertices.insert(name, GraphVertex { layer, inputs });

        Ok(())
    }

    pub fn vertex(&self, name: &str) -> Option<&GraphVertex> {
        self.vertices.get(name)
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }
}

/// How a network's layers connect. A training run uses exactly one variant,
/// and overrides never convert between them.
#[derive(Clone, Debug, PartialEq)]
pub enum Topology {
    Sequential(SequentialConfig),
    Graph(GraphConfig),
}

impl Topology {
    pub fn settings(&self) -> &BackpropSettings {
        match self {
            Self::Sequential(conf) => &conf.settings,
            Self::Graph(conf) => &conf.settings,
        }
    }

    pub fn settings_mut(&mut self) -> &mut BackpropSettings {
        match self {
            Self::Sequential(conf) => &mut conf.settings,
            Self::Graph(conf) => &mut conf.settings,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.settings().validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::layer::LayerKind;

    #[test]
    fn graph_rejects_duplicate_vertex_names() {
        let mut graph = GraphConfig::new();
        graph.add_input("in");
        graph.add_layer("dense", LayerConfig::new(LayerKind::Dense), &["in"]).unwrap();

        let result = graph.add_layer("dense", LayerConfig::new(LayerKind::Dense), &["in"]);
        assert_eq!(result, Err(GraphConfigError::VertexAlreadyExists("dense".to_string())));
    }

    #[test]
    fn graph_rejects_unknown_inputs() {
        let mut graph = GraphConfig::new();

        let result = graph.add_layer("dense", LayerConfig::new(LayerKind::Dense), &["missing"]);
        assert_eq!(
            result,
            Err(GraphConfigError::UnknownInput { vertex: "dense".to_string(), input: "missing".to_string() })
        );
    }

    #[test]
    fn truncated_backprop_requires_window_lengths() {
        let mut settings = BackpropSettings { backprop_type: BackpropType::TruncatedBptt, ..Default::default() };
        assert_eq!(settings.validate(), Ok(()));

        settings.tbptt_fwd_length = 0;
        assert_eq!(settings.validate(), Err(ValidationError::TbpttLengthZero { field: "forward" }));

        settings.tbptt_fwd_length = 20;
        settings.tbptt_back_length = 0;
        assert_eq!(settings.validate(), Err(ValidationError::TbpttLengthZero { field: "backward" }));

        // standard backprop never looks at the window lengths
        settings.backprop_type = BackpropType::Standard;
        assert_eq!(settings.validate(), Ok(()));
    }
}
