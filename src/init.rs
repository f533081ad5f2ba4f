use rand::{thread_rng, Rng};
use rand_distr::{Distribution, Normal, Uniform};

/// Weight initialisation strategy for a layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WeightInit {
    Zero,
    Ones,
    Uniform,
    Xavier,
    Relu,
    /// Sample from the layer's explicitly configured distribution.
    Distribution,
}

impl WeightInit {
    /// The sampling distribution implied by this strategy for a weight matrix
    /// with the given fan sizes. `None` for constant fills and for
    /// [`WeightInit::Distribution`], which uses the layer's own distribution.
    pub fn distribution(self, fan_in: usize, fan_out: usize) -> Option<InitDistribution> {
        match self {
            Self::Zero | Self::Ones | Self::Distribution => None,
            Self::Uniform => {
                let bound = 1.0 / (fan_in.max(1) as f32).sqrt();
                Some(InitDistribution::Uniform { min: -bound, max: bound })
            }
            Self::Xavier => {
                let stdev = (2.0 / (fan_in + fan_out).max(1) as f32).sqrt();
                Some(InitDistribution::Normal { mean: 0.0, stdev })
            }
            Self::Relu => {
                let stdev = (2.0 / fan_in.max(1) as f32).sqrt();
                Some(InitDistribution::Normal { mean: 0.0, stdev })
            }
        }
    }

    /// Constant fill value, for the strategies that have one.
    pub fn constant(self) -> Option<f32> {
        match self {
            Self::Zero => Some(0.0),
            Self::Ones => Some(1.0),
            _ => None,
        }
    }
}

/// A concrete sampling distribution for weight initialisation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InitDistribution {
    Normal { mean: f32, stdev: f32 },
    Uniform { min: f32, max: f32 },
}

impl InitDistribution {
    pub fn sample(&self, rng: &mut impl Rng) -> f32 {
        match *self {
            Self::Normal { mean, stdev } => Normal::new(mean, stdev).unwrap().sample(rng),
            Self::Uniform { min, max } => Uniform::new(min, max).sample(rng),
        }
    }

    pub fn vec_f32(&self, length: usize) -> Vec<f32> {
        let mut rng = thread_rng();
        (0..length).map(|_| self.sample(&mut rng)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn uniform_samples_stay_in_bounds() {
        let mut rng = StdRng::seed_from_u64(0x2077);
        let dist = InitDistribution::Uniform { min: -0.25, max: 0.25 };

        for _ in 0..1000 {
            let x = dist.sample(&mut rng);
            assert!((-0.25..0.25).contains(&x));
        }
    }

    #[test]
    fn xavier_scales_with_fan_sizes() {
        let narrow = WeightInit::Xavier.distribution(10, 10).unwrap();
        let wide = WeightInit::Xavier.distribution(1000, 1000).unwrap();

        let (InitDistribution::Normal { stdev: a, .. }, InitDistribution::Normal { stdev: b, .. }) = (narrow, wide)
        else {
            panic!("xavier should be gaussian");
        };

        assert!(a > b);
    }

    #[test]
    fn constant_strategies_have_no_distribution() {
        assert_eq!(WeightInit::Zero.distribution(64, 64), None);
        assert_eq!(WeightInit::Zero.constant(), Some(0.0));
        assert_eq!(WeightInit::Ones.constant(), Some(1.0));
        assert_eq!(WeightInit::Relu.constant(), None);
    }

    #[test]
    fn vec_f32_has_requested_length() {
        let dist = InitDistribution::Normal { mean: 0.0, stdev: 1.0 };
        assert_eq!(dist.vec_f32(128).len(), 128);
    }
}
