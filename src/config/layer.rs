use crate::{
    config::{Activation, ConvolutionMode, GradientNorm, Updater},
    init::{InitDistribution, WeightInit},
    schedule::StepSchedule,
};

/// Discriminant for the shape of computation a layer performs. Fixed at
/// construction time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerKind {
    Dense,
    Convolutional,
    SpatialPooling,
    Recurrent,
}

impl LayerKind {
    /// Only spatially-structured layers have a convolution mode.
    pub fn supports_convolution_mode(self) -> bool {
        matches!(self, Self::Convolutional | Self::SpatialPooling)
    }
}

/// Training configuration for a single layer.
///
/// Optional fields left `None` are resolved to their effective values by
/// [`NetworkConfig::normalise`](crate::NetworkConfig::normalise): the bias
/// learning rate falls back to the weight learning rate, and updater
/// parameters fall back to the updater's defaults.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerConfig {
    kind: LayerKind,
    pub activation: Activation,
    pub weight_init: WeightInit,
    pub bias_init: f32,
    pub dist: Option<InitDistribution>,
    pub learning_rate: f32,
    pub bias_learning_rate: Option<f32>,
    pub learning_rate_schedule: Option<StepSchedule>,
    pub l1: f32,
    pub l2: f32,
    pub l1_bias: f32,
    pub l2_bias: f32,
    pub dropout: f32,
    pub updater: Updater,
    pub momentum: Option<f32>,
    pub momentum_schedule: Option<StepSchedule>,
    pub epsilon: Option<f32>,
    pub rho: Option<f32>,
    pub rms_decay: Option<f32>,
    pub adam_mean_decay: Option<f32>,
    pub adam_var_decay: Option<f32>,
    pub gradient_norm: Option<GradientNorm>,
    pub gradient_norm_threshold: Option<f32>,
    convolution_mode: Option<ConvolutionMode>,
}

impl LayerConfig {
    pub fn new(kind: LayerKind) -> Self {
        Self {
            kind,
            activation: Activation::ReLU,
            weight_init: WeightInit::Xavier,
            bias_init: 0.0,
            dist: None,
            learning_rate: 0.01,
            bias_learning_rate: None,
            learning_rate_schedule: None,
            l1: 0.0,
            l2: 0.0,
            l1_bias: 0.0,
            l2_bias: 0.0,
            dropout: 0.0,
            updater: Updater::Sgd,
            momentum: None,
            momentum_schedule: None,
            epsilon: None,
            rho: None,
            rms_decay: None,
            adam_mean_decay: None,
            adam_var_decay: None,
            gradient_norm: None,
            gradient_norm_threshold: None,
            convolution_mode: None,
        }
    }

    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    pub fn convolution_mode(&self) -> Option<ConvolutionMode> {
        self.convolution_mode
    }

    /// Sets the convolution mode if this layer kind has one. Returns whether
    /// the mode was stored; for kinds without spatial structure this is a
    /// no-op, not an error.
    pub fn set_convolution_mode(&mut self, mode: ConvolutionMode) -> bool {
        if self.kind.supports_convolution_mode() {
            self.convolution_mode = Some(mode);
            true
        } else {
            false
        }
    }

    /// Whether any regularisation term is in force on this layer.
    pub fn regularised(&self) -> bool {
        self.l1 > 0.0 || self.l2 > 0.0 || self.l1_bias > 0.0 || self.l2_bias > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convolution_mode_respects_layer_kind() {
        let mut dense = LayerConfig::new(LayerKind::Dense);
        assert!(!dense.set_convolution_mode(ConvolutionMode::Same));
        assert_eq!(dense.convolution_mode(), None);

        let mut conv = LayerConfig::new(LayerKind::Convolutional);
        assert!(conv.set_convolution_mode(ConvolutionMode::Same));
        assert_eq!(conv.convolution_mode(), Some(ConvolutionMode::Same));

        let mut pool = LayerConfig::new(LayerKind::SpatialPooling);
        assert!(pool.set_convolution_mode(ConvolutionMode::Truncate));
        assert_eq!(pool.convolution_mode(), Some(ConvolutionMode::Truncate));
    }

    #[test]
    fn fresh_layer_is_unregularised() {
        let layer = LayerConfig::new(LayerKind::Dense);
        assert!(!layer.regularised());
    }
}
