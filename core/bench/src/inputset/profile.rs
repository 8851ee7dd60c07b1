use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use typed_builder::TypedBuilder;

/// Named generation intensity.
///
/// `quick` is for iterating on a prototype. `strict` must be used before any compile whose
/// results matter: coverage is empirical, so a coarser set risks a circuit that is wrong on
/// value combinations it never saw.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    clap::ValueEnum,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CoverageProfile {
    Quick,
    Standard,
    #[default]
    Strict,
}

impl CoverageProfile {
    pub fn axis_step(&self) -> usize {
        match self {
            CoverageProfile::Quick => 8,
            CoverageProfile::Standard | CoverageProfile::Strict => 1,
        }
    }

    pub fn pair_step(&self) -> usize {
        match self {
            CoverageProfile::Quick | CoverageProfile::Standard => 16,
            CoverageProfile::Strict => 8,
        }
    }

    pub fn random_count(&self) -> usize {
        match self {
            CoverageProfile::Quick => 64,
            CoverageProfile::Standard => 128,
            CoverageProfile::Strict => 256,
        }
    }
}

/// Which layers to generate and how densely.
///
/// A `None` step disables the corresponding sweep. The defaults are the `standard` profile
/// with the baseline left to the shape (half of the value range).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
pub struct CoverageConfig {
    #[builder(default, setter(strip_option))]
    pub(crate) baseline: Option<u64>,
    #[builder(default = Some(1))]
    pub(crate) axis_step: Option<usize>,
    #[builder(default = true)]
    pub(crate) extremes: bool,
    #[builder(default = Some(16))]
    pub(crate) pair_step: Option<usize>,
    #[builder(default = 128)]
    pub(crate) random_count: usize,
}

impl CoverageConfig {
    pub fn baseline(&self) -> Option<u64> {
        self.baseline
    }

    pub fn axis_step(&self) -> Option<usize> {
        self.axis_step
    }

    pub fn extremes(&self) -> bool {
        self.extremes
    }

    pub fn pair_step(&self) -> Option<usize> {
        self.pair_step
    }

    pub fn random_count(&self) -> usize {
        self.random_count
    }

    pub fn with_baseline(mut self, baseline: Option<u64>) -> Self {
        self.baseline = baseline;
        self
    }
}

impl From<CoverageProfile> for CoverageConfig {
    fn from(profile: CoverageProfile) -> Self {
        CoverageConfig::builder()
            .axis_step(Some(profile.axis_step()))
            .pair_step(Some(profile.pair_step()))
            .random_count(profile.random_count())
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::str::FromStr;

    #[rstest]
    #[case(CoverageProfile::Quick, 8, 16, 64)]
    #[case(CoverageProfile::Standard, 1, 16, 128)]
    #[case(CoverageProfile::Strict, 1, 8, 256)]
    fn profile_parameters(
        #[case] profile: CoverageProfile,
        #[case] axis: usize,
        #[case] pair: usize,
        #[case] random: usize,
    ) {
        let conf = CoverageConfig::from(profile);
        assert_eq!(conf.axis_step(), Some(axis));
        assert_eq!(conf.pair_step(), Some(pair));
        assert_eq!(conf.random_count(), random);
        assert!(conf.extremes());
        assert_eq!(conf.baseline(), None);
    }

    #[test]
    fn builder_defaults_to_standard() {
        assert_eq!(
            CoverageConfig::builder().build(),
            CoverageConfig::from(CoverageProfile::Standard)
        );
    }

    #[test]
    fn profile_names() {
        assert_eq!(CoverageProfile::from_str("strict").unwrap(), CoverageProfile::Strict);
        assert_eq!(CoverageProfile::Quick.to_string(), "quick");
        assert_eq!(CoverageProfile::default(), CoverageProfile::Strict);
        assert!(CoverageProfile::from_str("exhaustive").is_err());
    }
}
