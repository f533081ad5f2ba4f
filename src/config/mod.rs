pub mod layer;
pub mod network;
pub mod topology;

/// Activation function applied to a layer's output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Activation {
    Identity,
    ReLU,
    CReLU,
    SCReLU,
    Sigmoid,
    Tanh,
}

/// Gradient update rule used to turn gradients into weight deltas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Updater {
    Sgd,
    Nesterovs,
    Adagrad,
    Adadelta,
    RmsProp,
    Adam,
    None,
}

impl Updater {
    pub fn uses_momentum(self) -> bool {
        matches!(self, Self::Nesterovs)
    }

    pub fn uses_epsilon(self) -> bool {
        matches!(self, Self::Adagrad | Self::Adadelta | Self::RmsProp | Self::Adam)
    }

    pub fn uses_rho(self) -> bool {
        matches!(self, Self::Adadelta)
    }

    pub fn uses_rms_decay(self) -> bool {
        matches!(self, Self::RmsProp)
    }

    pub fn uses_adam_decay(self) -> bool {
        matches!(self, Self::Adam)
    }
}

/// Outer optimisation algorithm driving the training loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptimisationAlgorithm {
    Sgd,
    LineGradientDescent,
    ConjugateGradient,
    Lbfgs,
}

impl OptimisationAlgorithm {
    /// Line-search based algorithms bound their inner iteration count and
    /// take a step function.
    pub fn uses_line_search(self) -> bool {
        !matches!(self, Self::Sgd)
    }
}

/// Step function used by line-search optimisation algorithms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepFunction {
    Default,
    Gradient,
    Negative,
}

/// Per-layer gradient normalisation strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GradientNorm {
    RenormaliseL2PerLayer,
    RenormaliseL2PerParamType,
    ClipElementWiseAbsoluteValue,
    ClipL2PerLayer,
    ClipL2PerParamType,
}

impl GradientNorm {
    pub fn uses_threshold(self) -> bool {
        matches!(self, Self::ClipElementWiseAbsoluteValue | Self::ClipL2PerLayer | Self::ClipL2PerParamType)
    }
}

/// Global learning rate decay policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LrPolicy {
    Fixed,
    Step,
    Exponential,
    Inverse,
    Poly,
    Schedule,
}

impl LrPolicy {
    pub fn needs_decay_rate(self) -> bool {
        matches!(self, Self::Step | Self::Exponential | Self::Inverse)
    }

    pub fn needs_steps(self) -> bool {
        matches!(self, Self::Step)
    }

    pub fn needs_power(self) -> bool {
        matches!(self, Self::Inverse | Self::Poly)
    }
}

/// Padding behaviour for convolutional and pooling layers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConvolutionMode {
    Strict,
    Truncate,
    Same,
}

/// How gradients are propagated backwards through time/depth.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackpropType {
    Standard,
    TruncatedBptt,
}
