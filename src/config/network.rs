use std::fmt;

use crate::{
    config::{layer::LayerConfig, LrPolicy, OptimisationAlgorithm, StepFunction, Updater},
    logger::ansi,
};

/// A merged configuration failed re-validation. Each variant names the
/// invariant that did not hold and the offending value.
#[derive(Debug, PartialEq)]
pub enum ValidationError {
    IterationsZero,
    LineSearchIterationsZero,
    LearningRateOutOfRange { layer: usize, value: f32 },
    BiasLearningRateOutOfRange { layer: usize, value: f32 },
    DropoutOutOfRange { layer: usize, value: f32 },
    NegativeRegulariser { layer: usize, term: &'static str, value: f32 },
    UpdaterParamOutOfRange { layer: usize, param: &'static str, value: f32 },
    GradientNormThresholdOutOfRange { layer: usize, value: f32 },
    MissingLrPolicyParam { policy: LrPolicy, param: &'static str },
    TbpttLengthZero { field: &'static str },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IterationsZero => write!(f, "iteration count must be at least 1"),
            Self::LineSearchIterationsZero => {
                write!(f, "line-search optimisation algorithms need at least 1 line-search iteration")
            }
            Self::LearningRateOutOfRange { layer, value } => {
                write!(f, "layer {layer}: learning rate {value} must be finite and positive")
            }
            Self::BiasLearningRateOutOfRange { layer, value } => {
                write!(f, "layer {layer}: bias learning rate {value} must be finite and positive")
            }
            Self::DropoutOutOfRange { layer, value } => {
                write!(f, "layer {layer}: dropout {value} must lie in [0, 1)")
            }
            Self::NegativeRegulariser { layer, term, value } => {
                write!(f, "layer {layer}: {term} coefficient {value} must be non-negative")
            }
            Self::UpdaterParamOutOfRange { layer, param, value } => {
                write!(f, "layer {layer}: updater parameter {param} = {value} is out of range")
            }
            Self::GradientNormThresholdOutOfRange { layer, value } => {
                write!(f, "layer {layer}: gradient normalisation threshold {value} must be finite and positive")
            }
            Self::MissingLrPolicyParam { policy, param } => {
                write!(f, "learning rate policy {policy:?} requires {param} to be set")
            }
            Self::TbpttLengthZero { field } => {
                write!(f, "truncated backprop {field} length must be at least 1")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Global training configuration shared across layers, plus the layers it
/// owns.
#[derive(Clone, Debug, PartialEq)]
pub struct NetworkConfig {
    pub mini_batch: bool,
    pub iterations: usize,
    pub max_line_search_iterations: usize,
    pub seed: i64,
    /// `None` until either set explicitly or derived by
    /// [`normalise`](Self::normalise). An explicit value always wins over
    /// derivation.
    pub use_regularisation: Option<bool>,
    pub optimisation_algo: OptimisationAlgorithm,
    pub step_function: Option<StepFunction>,
    pub use_drop_connect: bool,
    pub minimise: bool,
    pub lr_policy: LrPolicy,
    pub lr_policy_decay_rate: Option<f32>,
    pub lr_policy_steps: Option<f32>,
    pub lr_policy_power: Option<f32>,
    pub layers: Vec<LayerConfig>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            mini_batch: true,
            iterations: 1,
            max_line_search_iterations: 5,
            seed: 0,
            use_regularisation: None,
            optimisation_algo: OptimisationAlgorithm::Sgd,
            step_function: None,
            use_drop_connect: false,
            minimise: true,
            lr_policy: LrPolicy::Fixed,
            lr_policy_decay_rate: None,
            lr_policy_steps: None,
            lr_policy_power: None,
            layers: Vec::new(),
        }
    }
}

impl NetworkConfig {
    pub fn builder() -> NetworkConfigBuilder {
        NetworkConfigBuilder::default()
    }

    pub fn into_builder(self) -> NetworkConfigBuilder {
        NetworkConfigBuilder { config: self }
    }

    /// Rebuilds this configuration into its canonical form.
    ///
    /// Re-derives fields that are functions of other fields (the
    /// regularisation flag when never explicitly set, per-layer bias
    /// learning rates and updater parameter defaults) and re-checks every
    /// cross-field invariant. Consumes `self` and returns a new value;
    /// applying it twice is a no-op the second time.
    pub fn normalise(mut self) -> Result<Self, ValidationError> {
        if self.iterations == 0 {
            return Err(ValidationError::IterationsZero);
        }

        if self.optimisation_algo.uses_line_search() && self.max_line_search_iterations == 0 {
            return Err(ValidationError::LineSearchIterationsZero);
        }

        let policy = self.lr_policy;
        if policy.needs_decay_rate() && self.lr_policy_decay_rate.is_none() {
            return Err(ValidationError::MissingLrPolicyParam { policy, param: "decay rate" });
        }
        if policy.needs_steps() && self.lr_policy_steps.is_none() {
            return Err(ValidationError::MissingLrPolicyParam { policy, param: "steps" });
        }
        if policy.needs_power() && self.lr_policy_power.is_none() {
            return Err(ValidationError::MissingLrPolicyParam { policy, param: "power" });
        }

        let regularised = self.use_drop_connect || self.layers.iter().any(LayerConfig::regularised);
        self.use_regularisation.get_or_insert(regularised);

        for (idx, layer) in self.layers.iter_mut().enumerate() {
            resolve_layer(idx, layer)?;
        }

        Ok(self)
    }

    pub fn display(&self) {
        println!("Iterations             : {}", ansi(self.iterations, 31));
        println!("Seed                   : {}", ansi(self.seed, 31));
        println!("Optimisation Algorithm : {}", ansi(format!("{:?}", self.optimisation_algo), 31));
        println!("LR Policy              : {}", ansi(format!("{:?}", self.lr_policy), 31));
        println!("Layers                 : {}", ansi(self.layers.len(), 31));
    }
}

fn resolve_layer(idx: usize, layer: &mut LayerConfig) -> Result<(), ValidationError> {
    let lr = layer.learning_rate;
    if !lr.is_finite() || lr <= 0.0 {
        return Err(ValidationError::LearningRateOutOfRange { layer: idx, value: lr });
    }

    let bias_lr = *layer.bias_learning_rate.get_or_insert(lr);
    if !bias_lr.is_finite() || bias_lr <= 0.0 {
        return Err(ValidationError::BiasLearningRateOutOfRange { layer: idx, value: bias_lr });
    }

    if !(0.0..1.0).contains(&layer.dropout) {
        return Err(ValidationError::DropoutOutOfRange { layer: idx, value: layer.dropout });
    }

    for (term, value) in [("l1", layer.l1), ("l2", layer.l2), ("l1 bias", layer.l1_bias), ("l2 bias", layer.l2_bias)] {
        if value < 0.0 {
            return Err(ValidationError::NegativeRegulariser { layer: idx, term, value });
        }
    }

    let updater = layer.updater;

    if updater.uses_momentum() {
        let momentum = *layer.momentum.get_or_insert(0.9);
        if !(0.0..1.0).contains(&momentum) {
            return Err(ValidationError::UpdaterParamOutOfRange { layer: idx, param: "momentum", value: momentum });
        }
    }

    if updater.uses_epsilon() {
        let default = match updater {
            Updater::Adagrad | Updater::Adadelta => 1e-6,
            _ => 1e-8,
        };
        let epsilon = *layer.epsilon.get_or_insert(default);
        if !epsilon.is_finite() || epsilon <= 0.0 {
            return Err(ValidationError::UpdaterParamOutOfRange { layer: idx, param: "epsilon", value: epsilon });
        }
    }

    if updater.uses_rho() {
        let rho = *layer.rho.get_or_insert(0.95);
        if !(0.0..1.0).contains(&rho) || rho == 0.0 {
            return Err(ValidationError::UpdaterParamOutOfRange { layer: idx, param: "rho", value: rho });
        }
    }

    if updater.uses_rms_decay() {
        let decay = *layer.rms_decay.get_or_insert(0.95);
        if decay <= 0.0 || decay >= 1.0 {
            return Err(ValidationError::UpdaterParamOutOfRange { layer: idx, param: "rms decay", value: decay });
        }
    }

    if updater.uses_adam_decay() {
        let mean = *layer.adam_mean_decay.get_or_insert(0.9);
        let var = *layer.adam_var_decay.get_or_insert(0.999);
        for (param, value) in [("adam mean decay", mean), ("adam var decay", var)] {
            if value <= 0.0 || value >= 1.0 {
                return Err(ValidationError::UpdaterParamOutOfRange { layer: idx, param, value });
            }
        }
    }

    if let Some(norm) = layer.gradient_norm {
        if norm.uses_threshold() {
            let threshold = *layer.gradient_norm_threshold.get_or_insert(1.0);
            if !threshold.is_finite() || threshold <= 0.0 {
                return Err(ValidationError::GradientNormThresholdOutOfRange { layer: idx, value: threshold });
            }
        }
    }

    Ok(())
}

/// Builds a [`NetworkConfig`] field by field, validating on
/// [`build`](NetworkConfigBuilder::build).
#[derive(Clone, Debug, Default)]
pub struct NetworkConfigBuilder {
    config: NetworkConfig,
}

impl NetworkConfigBuilder {
    pub fn mini_batch(mut self, value: bool) -> Self {
        self.config.mini_batch = value;
        self
    }

    pub fn iterations(mut self, value: usize) -> Self {
        self.config.iterations = value;
        self
    }

    pub fn max_line_search_iterations(mut self, value: usize) -> Self {
        self.config.max_line_search_iterations = value;
        self
    }

    pub fn seed(mut self, value: impl Into<i64>) -> Self {
        self.config.seed = value.into();
        self
    }

    pub fn regularisation(mut self, value: bool) -> Self {
        self.config.use_regularisation = Some(value);
        self
    }

    pub fn optimisation_algo(mut self, value: OptimisationAlgorithm) -> Self {
        self.config.optimisation_algo = value;
        self
    }

    pub fn step_function(mut self, value: StepFunction) -> Self {
        self.config.step_function = Some(value);
        self
    }

    pub fn drop_connect(mut self, value: bool) -> Self {
        self.config.use_drop_connect = value;
        self
    }

    pub fn minimise(mut self, value: bool) -> Self {
        self.config.minimise = value;
        self
    }

    pub fn lr_policy(mut self, value: LrPolicy) -> Self {
        self.config.lr_policy = value;
        self
    }

    pub fn lr_policy_decay_rate(mut self, value: f32) -> Self {
        self.config.lr_policy_decay_rate = Some(value);
        self
    }

    pub fn lr_policy_steps(mut self, value: f32) -> Self {
        self.config.lr_policy_steps = Some(value);
        self
    }

    pub fn lr_policy_power(mut self, value: f32) -> Self {
        self.config.lr_policy_power = Some(value);
        self
    }

    pub fn layer(mut self, layer: LayerConfig) -> Self {
        self.config.layers.push(layer);
        self
    }

    pub fn build(self) -> Result<NetworkConfig, ValidationError> {
        self.config.normalise()
    }
}
