//! Fine-tuning support for neural network training configurations.
//!
//! A [`FineTuneConfig`] is a sparse set of hyperparameter overrides. Applying
//! one to an existing configuration overwrites exactly the fields that were
//! set, leaves everything else alone, and re-validates the result, so a
//! network trained with one recipe can be retrained with another without
//! rebuilding its configuration from scratch.

pub mod config;
pub mod finetune;
pub mod init;
pub mod logger;
pub mod schedule;

pub use config::{
    layer::{LayerConfig, LayerKind},
    network::{NetworkConfig, NetworkConfigBuilder, ValidationError},
    topology::{BackpropSettings, GraphConfig, GraphConfigError, SequentialConfig, Topology},
    Activation, BackpropType, ConvolutionMode, GradientNorm, LrPolicy, OptimisationAlgorithm, StepFunction, Updater,
};
pub use finetune::{FineTuneConfig, FineTuneConfigBuilder, FineTuneError};
pub use init::{InitDistribution, WeightInit};
pub use schedule::StepSchedule;
