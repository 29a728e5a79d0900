//! Three-state threshold rule turning a z-score into spread positions.

use crate::series::Series;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    /// Short the spread: sell leg 1, buy the hedge.
    Short,
    #[default]
    Flat,
    /// Long the spread: buy leg 1, sell the hedge.
    Long,
}

impl Position {
    pub fn as_i8(self) -> i8 {
        match self {
            Position::Short => -1,
            Position::Flat => 0,
            Position::Long => 1,
        }
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.as_i8())
    }

    pub fn is_flat(self) -> bool {
        self == Position::Flat
    }
}

/// Entry/exit thresholds, in standard deviations.
///
/// `z_exit < z_entry` is expected. The rule itself does not enforce it;
/// configuration validation does.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdRule {
    pub z_entry: f64,
    pub z_exit: f64,
}

impl ThresholdRule {
    pub fn new(z_entry: f64, z_exit: f64) -> Self {
        Self { z_entry, z_exit }
    }

    /// One transition. Exit is checked before entry; an undefined z-score
    /// matches nothing and holds the current position.
    pub fn next(&self, current: Position, lagged_z: f64) -> Position {
        if lagged_z > -self.z_exit && lagged_z < self.z_exit {
            Position::Flat
        } else if lagged_z < -self.z_entry {
            Position::Long
        } else if lagged_z > self.z_entry {
            Position::Short
        } else {
            current
        }
    }

    /// Positions for every period of `z_score`. The decision at `t` only sees
    /// the z-score of `t - 1`; the first period starts flat.
    pub fn positions(&self, z_score: &Series<f64>) -> Series<Position> {
        let lagged = z_score.lag(f64::NAN);
        let mut current = Position::Flat;
        let positions = lagged.map(|z| {
            current = self.next(current, *z);
            current
        });
        log::debug!(
            "generated {} positions ({} non-flat)",
            positions.len(),
            positions.values().iter().filter(|p| !p.is_flat()).count()
        );
        positions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::test_series;
    use Position::*;

    fn run(rule: ThresholdRule, z: &[f64]) -> Vec<Position> {
        rule.positions(&test_series(z)).values().to_vec()
    }

    #[test]
    fn entry_persists_until_exit_band() {
        let rule = ThresholdRule::new(2.0, 0.5);
        assert_eq!(
            run(rule, &[0.0, 3.0, 1.0, -3.0, 0.0]),
            vec![Flat, Flat, Short, Short, Long]
        );
    }

    #[test]
    fn exit_band_flattens_the_next_period() {
        let rule = ThresholdRule::new(2.0, 0.5);
        assert_eq!(
            run(rule, &[0.0, 3.0, 0.3, -3.0, 0.0]),
            vec![Flat, Flat, Short, Flat, Long]
        );
    }

    #[test]
    fn undefined_z_holds_position() {
        let rule = ThresholdRule::new(1.0, 0.2);
        assert_eq!(
            run(rule, &[f64::NAN, -1.5, f64::NAN, 0.5, 0.1, 0.0]),
            vec![Flat, Flat, Long, Long, Long, Flat]
        );
    }

    #[test]
    fn warmup_periods_are_flat() {
        let rule = ThresholdRule::new(1.0, 0.2);
        assert_eq!(
            run(rule, &[f64::NAN, f64::NAN, 5.0]),
            vec![Flat, Flat, Flat]
        );
    }

    #[test]
    fn flips_directly_between_long_and_short() {
        let rule = ThresholdRule::new(1.0, 0.2);
        assert_eq!(
            run(rule, &[-2.0, 2.0, 0.0]),
            vec![Flat, Long, Short]
        );
    }

    #[test]
    fn exit_takes_precedence_over_entry_when_bands_overlap() {
        let rule = ThresholdRule::new(0.5, 1.0);
        assert_eq!(rule.next(Long, 0.7), Flat);
        assert_eq!(rule.next(Flat, -0.9), Flat);
        assert_eq!(rule.next(Flat, -1.2), Long);
    }

    #[test]
    fn same_period_z_never_moves_position() {
        let rule = ThresholdRule::new(2.0, 0.5);
        let base = [0.0, 1.0, 1.5, 1.0, 0.8];
        let mut shocked = base;
        shocked[3] = 10.0;
        let a = run(rule, &base);
        let b = run(rule, &shocked);
        assert_eq!(a[..=3], b[..=3]);
        assert_ne!(a[4], b[4]);
    }

    #[test]
    fn numeric_encoding() {
        assert_eq!(Short.as_i8(), -1);
        assert_eq!(Flat.as_f64(), 0.0);
        assert_eq!(Long.as_i8(), 1);
        assert_eq!(Position::default(), Flat);
    }
}
