//! Event-density tiers for heatmap shading of grid cells.
//!
//! Two policies exist and are never mixed:
//!
//! - [`DensityPolicy::Fixed`] buckets each cell by its own count against
//!   absolute thresholds, so a cell's tier never depends on its neighbours.
//! - [`DensityPolicy::Relative`] scales tiers between the quietest and
//!   busiest non-empty cells of the grid being classified, so the same count
//!   can shade differently from one month to the next.
//!
//! A [`DensityMap`] remembers which policy produced it.

use clap::ValueEnum;
use serde::{
  Deserialize,
  Serialize
};
use tracing::debug;

use crate::error::{
  CalendarError,
  CalendarResult
};
use crate::grid::CalendarGrid;

/// Density bucket of a cell, `0..=3`.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Default,
  Serialize,
)]
#[serde(transparent)]
pub struct DensityTier(u8);

impl DensityTier {
  pub const NONE: Self = Self(0);
  pub const LOW: Self = Self(1);
  pub const MEDIUM: Self = Self(2);
  pub const HIGH: Self = Self(3);
  pub const MAX: Self = Self::HIGH;

  pub fn level(self) -> u8 {
    self.0
  }

  fn from_level(level: u8) -> Self {
    Self(level.min(Self::MAX.0))
  }
}

pub const DEFAULT_LOW_MAX: usize = 3;
pub const DEFAULT_MID_MAX: usize = 6;
pub const DEFAULT_RELATIVE_STEP: f64 =
  0.2;

/// Absolute bucket edges: `1..=low_max` is low, `..=mid_max` medium,
/// anything above high.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
)]
pub struct FixedThresholds {
  low_max: usize,
  mid_max: usize
}

impl FixedThresholds {
  pub fn new(
    low_max: usize,
    mid_max: usize
  ) -> CalendarResult<Self> {
    if low_max == 0 || low_max >= mid_max
    {
      return Err(
        CalendarError::InvalidThresholds {
          low_max,
          mid_max
        }
      );
    }
    Ok(Self { low_max, mid_max })
  }

  pub fn low_max(self) -> usize {
    self.low_max
  }

  pub fn mid_max(self) -> usize {
    self.mid_max
  }

  pub fn tier(
    self,
    count: usize
  ) -> DensityTier {
    match count {
      | 0 => DensityTier::NONE,
      | c if c <= self.low_max => {
        DensityTier::LOW
      }
      | c if c <= self.mid_max => {
        DensityTier::MEDIUM
      }
      | _ => DensityTier::HIGH
    }
  }
}

impl Default for FixedThresholds {
  fn default() -> Self {
    Self {
      low_max: DEFAULT_LOW_MAX,
      mid_max: DEFAULT_MID_MAX
    }
  }
}

/// Level `L` is reached at `low + range * (L * step)`.
#[derive(
  Debug, Clone, Copy, PartialEq, Serialize,
)]
pub struct RelativeScale {
  step: f64
}

impl RelativeScale {
  pub fn new(
    step: f64
  ) -> CalendarResult<Self> {
    let top = step
      * f64::from(DensityTier::MAX.0);
    if !step.is_finite()
      || step <= 0.0
      || top > 1.0 + f64::EPSILON
    {
      return Err(
        CalendarError::InvalidScale(step)
      );
    }
    Ok(Self { step })
  }

  pub fn step(self) -> f64 {
    self.step
  }

  fn tier(
    self,
    count: usize,
    low: usize,
    range: usize
  ) -> DensityTier {
    if count == 0 {
      return DensityTier::NONE;
    }
    if range == 0 {
      return DensityTier::LOW;
    }

    let count = count as f64;
    let low = low as f64;
    let range = range as f64;
    for level in
      (DensityTier::LOW.0
        ..=DensityTier::MAX.0)
        .rev()
    {
      let threshold = low
        + range
          * (f64::from(level) * self.step);
      if count >= threshold {
        return DensityTier::from_level(
          level
        );
      }
    }

    DensityTier::LOW
  }
}

impl Default for RelativeScale {
  fn default() -> Self {
    Self {
      step: DEFAULT_RELATIVE_STEP
    }
  }
}

/// Which policy to use, as named in config files and on the command line.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum DensityPolicyKind {
  #[default]
  Fixed,
  Relative
}

#[derive(
  Debug, Clone, Copy, PartialEq, Serialize,
)]
#[serde(
  tag = "policy",
  rename_all = "lowercase"
)]
pub enum DensityPolicy {
  Fixed(FixedThresholds),
  Relative(RelativeScale)
}

impl DensityPolicy {
  pub fn from_kind(
    kind: DensityPolicyKind,
    thresholds: FixedThresholds,
    scale: RelativeScale
  ) -> Self {
    match kind {
      | DensityPolicyKind::Fixed => {
        Self::Fixed(thresholds)
      }
      | DensityPolicyKind::Relative => {
        Self::Relative(scale)
      }
    }
  }

  pub fn kind(
    &self
  ) -> DensityPolicyKind {
    match self {
      | Self::Fixed(_) => {
        DensityPolicyKind::Fixed
      }
      | Self::Relative(_) => {
        DensityPolicyKind::Relative
      }
    }
  }
}

impl Default for DensityPolicy {
  fn default() -> Self {
    Self::Fixed(
      FixedThresholds::default()
    )
  }
}

/// Tiers for every cell of one grid, parallel to its cells.
#[derive(
  Debug, Clone, PartialEq, Serialize,
)]
pub struct DensityMap {
  policy: DensityPolicy,
  tiers:  Vec<DensityTier>
}

impl DensityMap {
  pub fn policy(
    &self
  ) -> &DensityPolicy {
    &self.policy
  }

  pub fn tiers(&self) -> &[DensityTier] {
    &self.tiers
  }

  pub fn get(
    &self,
    index: usize
  ) -> Option<DensityTier> {
    self.tiers.get(index).copied()
  }

  pub fn len(&self) -> usize {
    self.tiers.len()
  }

  pub fn is_empty(&self) -> bool {
    self.tiers.is_empty()
  }

  /// Number of cells per tier, indexed by level.
  pub fn histogram(
    &self
  ) -> [usize; 4] {
    let mut histogram = [0; 4];
    for tier in &self.tiers {
      histogram[usize::from(tier.0)] +=
        1;
    }
    histogram
  }
}

/// Classifies raw per-cell counts. The result has one tier per count.
pub fn classify_counts(
  counts: &[usize],
  policy: &DensityPolicy
) -> Vec<DensityTier> {
  match policy {
    | DensityPolicy::Fixed(thresholds) => {
      counts
        .iter()
        .map(|&count| {
          thresholds.tier(count)
        })
        .collect()
    }
    | DensityPolicy::Relative(scale) => {
      let Some(low) = counts
        .iter()
        .copied()
        .filter(|&count| count > 0)
        .min()
      else {
        return vec![
          DensityTier::NONE;
          counts.len()
        ];
      };
      let max = counts
        .iter()
        .copied()
        .max()
        .unwrap_or(low);
      let range = max - low;

      debug!(low, max, range, "relative density bounds");
      counts
        .iter()
        .map(|&count| {
          scale.tier(count, low, range)
        })
        .collect()
    }
  }
}

/// Classifies every cell of `grid` without touching it.
#[tracing::instrument(skip(grid))]
pub fn classify(
  grid: &CalendarGrid<'_>,
  policy: &DensityPolicy
) -> DensityMap {
  let tiers = classify_counts(
    &grid.counts(),
    policy
  );
  let map = DensityMap {
    policy: *policy,
    tiers
  };
  debug!(histogram = ?map.histogram(), "classified grid density");
  map
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::event::EventsByDay;
  use crate::focus::FocusDate;
  use crate::grid::build_sunday_grid;

  fn levels(
    tiers: &[DensityTier]
  ) -> Vec<u8> {
    tiers
      .iter()
      .map(|tier| tier.level())
      .collect()
  }

  fn relative() -> DensityPolicy {
    DensityPolicy::Relative(
      RelativeScale::default()
    )
  }

  #[test]
  fn fixed_thresholds_bucket_counts() {
    let tiers = classify_counts(
      &[0, 1, 4, 7],
      &DensityPolicy::default()
    );
    assert_eq!(levels(&tiers), vec![
      0, 1, 2, 3
    ]);

    let edges = classify_counts(
      &[3, 6, 100],
      &DensityPolicy::default()
    );
    assert_eq!(levels(&edges), vec![
      1, 2, 3
    ]);
  }

  #[test]
  fn relative_scale_walks_down_levels() {
    let tiers = classify_counts(
      &[0, 2, 2, 10],
      &relative()
    );
    assert_eq!(levels(&tiers), vec![
      0, 1, 1, 3
    ]);

    // low = 1, range = 20: levels start near 5, 9 and 13.
    let spread = classify_counts(
      &[1, 4, 6, 8, 10, 12, 14, 21],
      &relative()
    );
    assert_eq!(levels(&spread), vec![
      1, 1, 1, 1, 2, 2, 3, 3
    ]);
  }

  #[test]
  fn relative_level_threshold_is_inclusive() {
    // low = 2, range = 5: a count of 4 sits exactly on level 2.
    let tiers = classify_counts(
      &[2, 4, 7],
      &relative()
    );
    assert_eq!(levels(&tiers), vec![
      1, 2, 3
    ]);
  }

  #[test]
  fn relative_scale_floors_flat_grids() {
    let tiers = classify_counts(
      &[0, 4, 4, 0],
      &relative()
    );
    assert_eq!(levels(&tiers), vec![
      0, 1, 1, 0
    ]);
  }

  #[test]
  fn empty_grid_is_all_zero_under_both_policies()
  {
    let zeros = vec![0; 42];
    for policy in
      [DensityPolicy::default(), relative()]
    {
      let tiers =
        classify_counts(&zeros, &policy);
      assert_eq!(tiers.len(), 42);
      assert!(tiers.iter().all(|tier| {
        *tier == DensityTier::NONE
      }));
    }
    assert!(
      classify_counts(&[], &relative())
        .is_empty()
    );
  }

  #[test]
  fn fixed_policy_is_local_relative_is_not()
  {
    let quiet = [0, 2, 3];
    let busy = [0, 2, 3, 40];

    let fixed_quiet = classify_counts(
      &quiet,
      &DensityPolicy::default()
    );
    let fixed_busy = classify_counts(
      &busy,
      &DensityPolicy::default()
    );
    assert_eq!(
      fixed_quiet[..],
      fixed_busy[..3]
    );

    let rel_quiet =
      classify_counts(&quiet, &relative());
    let rel_busy =
      classify_counts(&busy, &relative());
    assert_ne!(
      rel_quiet[..],
      rel_busy[..3]
    );
  }

  #[test]
  fn tiers_stay_in_range() {
    let counts: Vec<usize> =
      (0..42).map(|i| i * i).collect();
    for policy in
      [DensityPolicy::default(), relative()]
    {
      let tiers =
        classify_counts(&counts, &policy);
      assert_eq!(tiers.len(), counts.len());
      assert!(tiers.iter().all(|tier| {
        *tier <= DensityTier::MAX
      }));
    }
  }

  #[test]
  fn validates_thresholds_and_scale() {
    assert!(
      FixedThresholds::new(0, 5).is_err()
    );
    assert!(
      FixedThresholds::new(5, 5).is_err()
    );
    assert!(
      FixedThresholds::new(2, 5).is_ok()
    );
    assert!(RelativeScale::new(0.0).is_err());
    assert!(RelativeScale::new(0.4).is_err());
    assert!(
      RelativeScale::new(f64::NAN).is_err()
    );
    assert!(RelativeScale::new(0.25).is_ok());
  }

  #[test]
  fn classify_keeps_policy_and_grid_length() {
    let focus = FocusDate::new(1, 1, 2024)
      .expect("valid focus");
    let empty = EventsByDay::new();
    let grid =
      build_sunday_grid(&focus, &empty)
        .expect("grid");

    let map = classify(&grid, &relative());
    assert_eq!(map.len(), grid.len());
    assert_eq!(
      map.policy().kind(),
      DensityPolicyKind::Relative
    );
    assert_eq!(map.histogram(), [
      42, 0, 0, 0
    ]);
    assert_eq!(
      map.get(41),
      Some(DensityTier::NONE)
    );
    assert_eq!(map.get(42), None);
  }
}
