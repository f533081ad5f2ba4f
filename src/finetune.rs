use std::fmt;

use crate::{
    config::{
        layer::LayerConfig,
        network::{NetworkConfig, NetworkConfigBuilder, ValidationError},
        topology::Topology,
        Activation, BackpropType, ConvolutionMode, GradientNorm, LrPolicy, OptimisationAlgorithm, StepFunction,
        Updater,
    },
    init::{InitDistribution, WeightInit},
    logger::ansi,
    schedule::StepSchedule,
};

#[derive(Debug, PartialEq)]
pub enum FineTuneError {
    /// A layer-scoped override was given but no layer was supplied.
    MissingRequiredTarget(&'static str),
    Validation(ValidationError),
}

impl From<ValidationError> for FineTuneError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl fmt::Display for FineTuneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRequiredTarget(field) => {
                write!(f, "override '{field}' targets a layer, but no layer was supplied")
            }
            Self::Validation(err) => write!(f, "merged configuration failed validation: {err}"),
        }
    }
}

impl std::error::Error for FineTuneError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::MissingRequiredTarget(_) => None,
        }
    }
}

/// A sparse set of hyperparameter overrides.
///
/// Every field is optional; a field left `None` never touches the target it
/// would otherwise overwrite. Values of `Some(0.0)` or `Some(false)` are
/// overrides like any other.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FineTuneConfig {
    pub activation: Option<Activation>,
    pub weight_init: Option<WeightInit>,
    pub bias_init: Option<f32>,
    pub dist: Option<InitDistribution>,
    pub learning_rate: Option<f32>,
    pub bias_learning_rate: Option<f32>,
    pub learning_rate_schedule: Option<StepSchedule>,
    /// Carried for completeness; no target field consumes it.
    pub lr_score_based_decay: Option<f32>,
    pub l1: Option<f32>,
    pub l2: Option<f32>,
    pub l1_bias: Option<f32>,
    pub l2_bias: Option<f32>,
    pub dropout: Option<f32>,
    pub updater: Option<Updater>,
    pub momentum: Option<f32>,
    pub momentum_schedule: Option<StepSchedule>,
    pub epsilon: Option<f32>,
    pub rho: Option<f32>,
    pub rms_decay: Option<f32>,
    pub adam_mean_decay: Option<f32>,
    pub adam_var_decay: Option<f32>,
    pub mini_batch: Option<bool>,
    pub iterations: Option<usize>,
    pub max_line_search_iterations: Option<usize>,
    pub seed: Option<i64>,
    pub use_regularisation: Option<bool>,
    pub optimisation_algo: Option<OptimisationAlgorithm>,
    pub step_function: Option<StepFunction>,
    pub use_drop_connect: Option<bool>,
    pub minimise: Option<bool>,
    pub gradient_norm: Option<GradientNorm>,
    pub gradient_norm_threshold: Option<f32>,
    pub lr_policy: Option<LrPolicy>,
    pub lr_policy_decay_rate: Option<f32>,
    pub lr_policy_steps: Option<f32>,
    pub lr_policy_power: Option<f32>,
    pub convolution_mode: Option<ConvolutionMode>,
    pub pretrain: Option<bool>,
    pub backprop: Option<bool>,
    pub backprop_type: Option<BackpropType>,
    pub tbptt_fwd_length: Option<usize>,
    pub tbptt_back_length: Option<usize>,
}

impl FineTuneConfig {
    pub fn builder() -> FineTuneConfigBuilder {
        FineTuneConfigBuilder::default()
    }

    /// Applies this override set to a layer and its network configuration.
    ///
    /// `layer` may be `None` when only network-scoped fields are overridden;
    /// layer-required overrides (gradient normalisation) then fail with
    /// [`FineTuneError::MissingRequiredTarget`]. The merged network is
    /// rebuilt through [`NetworkConfig::normalise`] before being returned,
    /// so no partially-applied configuration ever escapes. The merged layer
    /// is returned as-is.
    pub fn merge(
        &self,
        layer: Option<LayerConfig>,
        network: NetworkConfig,
    ) -> Result<(Option<LayerConfig>, NetworkConfig), FineTuneError> {
        let layer = match layer {
            Some(mut layer) => {
                self.apply_to_layer(&mut layer);
                Some(layer)
            }
            None => {
                if let Some(field) = self.layer_required_field() {
                    return Err(FineTuneError::MissingRequiredTarget(field));
                }
                None
            }
        };

        let network = self.apply_to_network(network.into_builder()).build()?;

        Ok((layer, network))
    }

    /// Applies the topology-scoped overrides, returning the same variant that
    /// was passed in.
    pub fn project(&self, mut topology: Topology) -> Result<Topology, FineTuneError> {
        let settings = topology.settings_mut();

        if let Some(v) = self.pretrain {
            settings.pretrain = v;
        }
        if let Some(v) = self.backprop {
            settings.backprop = v;
        }
        if let Some(v) = self.backprop_type {
            settings.backprop_type = v;
        }
        if let Some(v) = self.tbptt_fwd_length {
            settings.tbptt_fwd_length = v;
        }
        if let Some(v) = self.tbptt_back_length {
            settings.tbptt_back_length = v;
        }

        topology.validate()?;

        Ok(topology)
    }

    /// A fresh [`NetworkConfigBuilder`] with every network-scoped override
    /// already applied, for callers chaining further configuration before
    /// building. Runs through the same rule set as [`merge`](Self::merge),
    /// restricted to the fields that exist without a layer.
    pub fn network_builder(&self) -> NetworkConfigBuilder {
        self.apply_to_network(NetworkConfig::builder())
    }

    /// The single rule table for network-scoped fields, shared by `merge`
    /// and `network_builder`.
    fn apply_to_network(&self, mut b: NetworkConfigBuilder) -> NetworkConfigBuilder {
        if let Some(v) = self.mini_batch {
            b = b.mini_batch(v);
        }
        if let Some(v) = self.iterations {
            b = b.iterations(v);
        }
        if let Some(v) = self.max_line_search_iterations {
            b = b.max_line_search_iterations(v);
        }
        if let Some(v) = self.seed {
            b = b.seed(v);
        }
        if let Some(v) = self.use_regularisation {
            b = b.regularisation(v);
        }
        if let Some(v) = self.optimisation_algo {
            b = b.optimisation_algo(v);
        }
        if let Some(v) = self.step_function {
            b = b.step_function(v);
        }
        if let Some(v) = self.use_drop_connect {
            b = b.drop_connect(v);
        }
        if let Some(v) = self.minimise {
            b = b.minimise(v);
        }
        if let Some(v) = self.lr_policy {
            b = b.lr_policy(v);
        }
        if let Some(v) = self.lr_policy_decay_rate {
            b = b.lr_policy_decay_rate(v);
        }
        if let Some(v) = self.lr_policy_steps {
            b = b.lr_policy_steps(v);
        }
        if let Some(v) = self.lr_policy_power {
            b = b.lr_policy_power(v);
        }

        b
    }

    /// Layer-scoped overrides, in cascade order: a blanket learning rate
    /// writes both weight and bias rates, then an explicit bias rate wins;
    /// a scalar momentum is written before the momentum schedule so an
    /// explicit schedule wins; convolution mode only lands on layer kinds
    /// that have one.
    fn apply_to_layer(&self, layer: &mut LayerConfig) {
        if let Some(v) = self.activation {
            layer.activation = v;
        }
        if let Some(v) = self.weight_init {
            layer.weight_init = v;
        }
        if let Some(v) = self.bias_init {
            layer.bias_init = v;
        }
        if let Some(v) = self.dist {
            layer.dist = Some(v);
        }
        if let Some(v) = self.learning_rate {
            layer.learning_rate = v;
            layer.bias_learning_rate = Some(v);
        }
        if let Some(v) = self.bias_learning_rate {
            layer.bias_learning_rate = Some(v);
        }
        if let Some(v) = &self.learning_rate_schedule {
            layer.learning_rate_schedule = Some(v.clone());
        }
        if let Some(v) = self.l1 {
            layer.l1 = v;
        }
        if let Some(v) = self.l2 {
            layer.l2 = v;
        }
        if let Some(v) = self.l1_bias {
            layer.l1_bias = v;
        }
        if let Some(v) = self.l2_bias {
            layer.l2_bias = v;
        }
        if let Some(v) = self.dropout {
            layer.dropout = v;
        }
        if let Some(v) = self.updater {
            layer.updater = v;
        }
        if let Some(v) = self.momentum {
            layer.momentum = Some(v);
        }
        if let Some(v) = &self.momentum_schedule {
            layer.momentum_schedule = Some(v.clone());
        }
        if let Some(v) = self.epsilon {
            layer.epsilon = Some(v);
        }
        if let Some(v) = self.rho {
            layer.rho = Some(v);
        }
        if let Some(v) = self.rms_decay {
            layer.rms_decay = Some(v);
        }
        if let Some(v) = self.adam_mean_decay {
            layer.adam_mean_decay = Some(v);
        }
        if let Some(v) = self.adam_var_decay {
            layer.adam_var_decay = Some(v);
        }
        if let Some(v) = self.gradient_norm {
            layer.gradient_norm = Some(v);
        }
        if let Some(v) = self.gradient_norm_threshold {
            layer.gradient_norm_threshold = Some(v);
        }
        if let Some(v) = self.convolution_mode {
            let _ = layer.set_convolution_mode(v);
        }
    }

    /// The first override present that cannot be applied without a layer.
    fn layer_required_field(&self) -> Option<&'static str> {
        if self.gradient_norm.is_some() {
            return Some("gradient normalisation");
        }
        if self.gradient_norm_threshold.is_some() {
            return Some("gradient normalisation threshold");
        }

        None
    }

    pub fn display(&self) {
        fn row(name: &str, value: Option<impl fmt::Debug>) {
            if let Some(v) = value {
                println!("{name:<23}: {}", ansi(format!("{v:?}"), 31));
            }
        }

        row("Learning Rate", self.learning_rate);
        row("Bias Learning Rate", self.bias_learning_rate);
        row("Updater", self.updater);
        row("Momentum", self.momentum);
        if let Some(schedule) = &self.learning_rate_schedule {
            println!("{:<23}: {}", "LR Schedule", schedule.colourful());
        }
        if let Some(schedule) = &self.momentum_schedule {
            println!("{:<23}: {}", "Momentum Schedule", schedule.colourful());
        }
        row("Activation", self.activation);
        row("Weight Init", self.weight_init);
        row("Dropout", self.dropout);
        row("L1", self.l1);
        row("L2", self.l2);
        row("Iterations", self.iterations);
        row("Seed", self.seed);
        row("LR Policy", self.lr_policy);
        row("Gradient Norm", self.gradient_norm);
        row("Convolution Mode", self.convolution_mode);
        row("Pretrain", self.pretrain);
        row("Backprop Type", self.backprop_type);
    }
}

/// Builds a [`FineTuneConfig`] one override at a time.
#[derive(Clone, Debug, Default)]
pub struct FineTuneConfigBuilder {
    config: FineTuneConfig,
}

impl FineTuneConfigBuilder {
    pub fn activation(mut self, value: Activation) -> Self {
        self.config.activation = Some(value);
        self
    }

    pub fn weight_init(mut self, value: WeightInit) -> Self {
        self.config.weight_init = Some(value);
        self
    }

    pub fn bias_init(mut self, value: f32) -> Self {
        self.config.bias_init = Some(value);
        self
    }

    pub fn dist(mut self, value: InitDistribution) -> Self {
        self.config.dist = Some(value);
        self
    }

    pub fn learning_rate(mut self, value: f32) -> Self {
        self.config.learning_rate = Some(value);
        self
    }

    pub fn bias_learning_rate(mut self, value: f32) -> Self {
        self.config.bias_learning_rate = Some(value);
        self
    }

    pub fn learning_rate_schedule(mut self, value: StepSchedule) -> Self {
        self.config.learning_rate_schedule = Some(value);
        self
    }

    pub fn lr_score_based_decay(mut self, value: f32) -> Self {
        self.config.lr_score_based_decay = Some(value);
        self
    }

    pub fn l1(mut self, value: f32) -> Self {
        self.config.l1 = Some(value);
        self
    }

    pub fn l2(mut self, value: f32) -> Self {
        self.config.l2 = Some(value);
        self
    }

    pub fn l1_bias(mut self, value: f32) -> Self {
        self.config.l1_bias = Some(value);
        self
    }

    pub fn l2_bias(mut self, value: f32) -> Self {
        self.config.l2_bias = Some(value);
        self
    }

    pub fn dropout(mut self, value: f32) -> Self {
        self.config.dropout = Some(value);
        self
    }

    pub fn updater(mut self, value: Updater) -> Self {
        self.config.updater = Some(value);
        self
    }

    pub fn momentum(mut self, value: f32) -> Self {
        self.config.momentum = Some(value);
        self
    }

    pub fn momentum_schedule(mut self, value: StepSchedule) -> Self {
        self.config.momentum_schedule = Some(value);
        self
    }

    pub fn epsilon(mut self, value: f32) -> Self {
        self.config.epsilon = Some(value);
        self
    }

    pub fn rho(mut self, value: f32) -> Self {
        self.config.rho = Some(value);
        self
    }

    pub fn rms_decay(mut self, value: f32) -> Self {
        self.config.rms_decay = Some(value);
        self
    }

    pub fn adam_mean_decay(mut self, value: f32) -> Self {
        self.config.adam_mean_decay = Some(value);
        self
    }

    pub fn adam_var_decay(mut self, value: f32) -> Self {
        self.config.adam_var_decay = Some(value);
        self
    }

    pub fn mini_batch(mut self, value: bool) -> Self {
        self.config.mini_batch = Some(value);
        self
    }

    pub fn iterations(mut self, value: usize) -> Self {
        self.config.iterations = Some(value);
        self
    }

    pub fn max_line_search_iterations(mut self, value: usize) -> Self {
        self.config.max_line_search_iterations = Some(value);
        self
    }

    pub fn seed(mut self, value: impl Into<i64>) -> Self {
        self.config.seed = Some(value.into());
        self
    }

    pub fn regularisation(mut self, value: bool) -> Self {
        self.config.use_regularisation = Some(value);
        self
    }

    pub fn optimisation_algo(mut self, value: OptimisationAlgorithm) -> Self {
        self.config.optimisation_algo = Some(value);
        self
    }

    pub fn step_function(mut self, value: StepFunction) -> Self {
        self.config.step_function = Some(value);
        self
    }

    pub fn drop_connect(mut self, value: bool) -> Self {
        self.config.use_drop_connect = Some(value);
        self
    }

    pub fn minimise(mut self, value: bool) -> Self {
        self.config.minimise = Some(value);
        self
    }

    pub fn gradient_norm(mut self, value: GradientNorm) -> Self {
        self.config.gradient_norm = Some(value);
        self
    }

    pub fn gradient_norm_threshold(mut self, value: f32) -> Self {
        self.config.gradient_norm_threshold = Some(value);
        self
    }

    pub fn lr_policy(mut self, value: LrPolicy) -> Self {
        self.config.lr_policy = Some(value);
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

    pub fn convolution_mode(mut self, value: ConvolutionMode) -> Self {
        self.config.convolution_mode = Some(value);
        self
    }

    pub fn pretrain(mut self, value: bool) -> Self {
        self.config.pretrain = Some(value);
        self
    }

    pub fn backprop(mut self, value: bool) -> Self {
        self.config.backprop = Some(value);
        self
    }

    pub fn backprop_type(mut self, value: BackpropType) -> Self {
        self.config.backprop_type = Some(value);
        self
    }

    pub fn tbptt_fwd_length(mut self, value: usize) -> Self {
        self.config.tbptt_fwd_length = Some(value);
        self
    }

    pub fn tbptt_back_length(mut self, value: usize) -> Self {
        self.config.tbptt_back_length = Some(value);
        self
    }

    pub fn build(self) -> FineTuneConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::layer::LayerKind;

    fn dense_layer() -> LayerConfig {
        LayerConfig::new(LayerKind::Dense)
    }

    #[test]
    fn learning_rate_cascades_to_bias_rate() {
        let overrides = FineTuneConfig::builder().learning_rate(0.05).build();

        let (layer, _) = overrides.merge(Some(dense_layer()), NetworkConfig::default()).unwrap();
        let layer = layer.unwrap();

        assert_eq!(layer.learning_rate, 0.05);
        assert_eq!(layer.bias_learning_rate, Some(0.05));
    }

    #[test]
    fn explicit_bias_rate_beats_cascade() {
        let overrides = FineTuneConfig::builder().learning_rate(0.05).bias_learning_rate(0.01).build();

        let (layer, _) = overrides.merge(Some(dense_layer()), NetworkConfig::default()).unwrap();
        let layer = layer.unwrap();

        assert_eq!(layer.learning_rate, 0.05);
        assert_eq!(layer.bias_learning_rate, Some(0.01));
    }

    #[test]
    fn momentum_schedule_is_installed_alongside_scalar() {
        let schedule = StepSchedule::from_steps([(0, 0.9), (10, 0.99)]);
        let overrides = FineTuneConfig::builder().momentum(0.5).momentum_schedule(schedule.clone()).build();

        let (layer, _) = overrides.merge(Some(dense_layer()), NetworkConfig::default()).unwrap();
        let layer = layer.unwrap();

        assert_eq!(layer.momentum, Some(0.5));
        assert_eq!(layer.momentum_schedule, Some(schedule));
    }

    #[test]
    fn score_based_decay_is_never_applied() {
        let overrides = FineTuneConfig::builder().lr_score_based_decay(0.1).build();

        let original = dense_layer();
        let (layer, network) = overrides.merge(Some(original.clone()), NetworkConfig::default()).unwrap();

        assert_eq!(layer, Some(original));
        assert_eq!(network, NetworkConfig::default());
    }

    #[test]
    fn gradient_norm_without_layer_is_an_error() {
        let overrides = FineTuneConfig::builder().gradient_norm(GradientNorm::ClipL2PerLayer).build();

        let result = overrides.merge(None, NetworkConfig::default());
        assert_eq!(result, Err(FineTuneError::MissingRequiredTarget("gradient normalisation")));

        let overrides = FineTuneConfig::builder().gradient_norm_threshold(5.0).build();

        let result = overrides.merge(None, NetworkConfig::default());
        assert_eq!(result, Err(FineTuneError::MissingRequiredTarget("gradient normalisation threshold")));
    }

    #[test]
    fn network_builder_matches_merge_on_fresh_network() {
        let overrides = FineTuneConfig::builder()
            .seed(42)
            .iterations(10)
            .minimise(false)
            .optimisation_algo(OptimisationAlgorithm::Lbfgs)
            .build();

        let built = overrides.network_builder().build().unwrap();
        let (_, merged) = overrides.merge(None, NetworkConfig::default()).unwrap();

        assert_eq!(built, merged);
    }
}
