use std::{
    fmt::{
        Display,
        Formatter,
    },
    time::Duration,
};

use message::Measurement;

/// Frames closer together than this belong to the same burst.
pub const DEFAULT_THRESHOLD: Duration = Duration::from_millis(80);

/// Running average of a burst, emitted once the next burst begins.
#[derive(Debug, Copy, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Averaged(pub Measurement);

impl AsRef<Measurement> for Averaged {
    fn as_ref(&self) -> &Measurement {
        &self.0
    }
}

/// Mass fields rounded to whole µg/m³, the rest to two decimals.
impl Display for Averaged {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (i, v) in self.0.to_array().iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }

            if i < Measurement::MASS_FIELDS {
                // adding zero turns -0 into 0
                write!(f, "{:.0}", v.round_ties_even() + 0.0)?;
            } else {
                write!(f, "{v:.2}")?;
            }
        }

        Ok(())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct BurstState {
    pub running_average: Option<Measurement>,
    pub last_elapsed:    Option<Duration>,
}

/// Averages measurements that arrive in quick succession.
///
/// A read that took longer than the threshold starts a new burst and hands back the
/// average of the previous one. Faster reads fold into the running average as
/// `(avg + new) / 2`, which weights later frames more heavily than a plain mean.
#[derive(Debug, Clone)]
pub struct BurstSmoother {
    threshold: Duration,
    state:     BurstState,
}

impl Default for BurstSmoother {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl BurstSmoother {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            state: BurstState::default(),
        }
    }

    #[inline]
    pub fn state(&self) -> &BurstState {
        &self.state
    }

    /// Record a measurement whose read took `elapsed`.
    #[tracing::instrument(skip(self, measurement), level = "trace")]
    pub fn observe(&mut self, elapsed: Duration, measurement: &Measurement) -> Option<Averaged> {
        self.state.last_elapsed = Some(elapsed);

        if elapsed > self.threshold {
            tracing::trace!("new burst");
            return self.state.running_average.replace(*measurement).map(Averaged);
        }

        // a fast first frame has nothing to extend
        if let Some(avg) = self.state.running_average.as_mut() {
            *avg = avg.zip_with(measurement, |a, b| (a + b) / 2.0);
        }

        None
    }

    /// Take the average of the burst in progress, if any.
    #[inline]
    pub fn flush(&mut self) -> Option<Averaged> {
        self.state.running_average.take().map(Averaged)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn uniform(v: f32) -> Measurement {
        Measurement::from([v; Measurement::FIELDS])
    }

    #[test]
    fn test_burst_sequence() {
        let mut smoother = BurstSmoother::default();

        let first = Measurement::from([8.0, 4.0, 2.0, 1.0, 10.0, 20.0, 30.0, 40.0, 50.0, 0.5]);
        let second = Measurement::from([4.0, 8.0, 2.0, 3.0, 20.0, 20.0, 10.0, 0.0, 50.0, 1.5]);
        let third = Measurement::from([2.0, 0.0, 4.0, 1.0, 0.0, 40.0, 10.0, 0.0, 0.0, 0.5]);

        assert_eq!(smoother.observe(ms(90), &first), None);
        assert_eq!(smoother.state().running_average, Some(first));

        assert_eq!(smoother.observe(ms(10), &second), None);
        let after_second = Measurement::from([6.0, 6.0, 2.0, 2.0, 15.0, 20.0, 20.0, 20.0, 50.0, 1.0]);
        assert_eq!(smoother.state().running_average, Some(after_second));

        assert_eq!(smoother.observe(ms(10), &third), None);
        let after_third = Measurement::from([4.0, 3.0, 3.0, 1.5, 7.5, 30.0, 15.0, 10.0, 25.0, 0.75]);
        assert_eq!(smoother.state().running_average, Some(after_third));

        let fourth = uniform(100.0);
        assert_eq!(smoother.observe(ms(90), &fourth), Some(Averaged(after_third)));
        assert_eq!(smoother.state().running_average, Some(fourth));
    }

    #[test]
    fn test_weighting_favors_later_frames() {
        let mut smoother = BurstSmoother::default();

        smoother.observe(ms(100), &uniform(0.0));
        smoother.observe(ms(1), &uniform(0.0));
        smoother.observe(ms(1), &uniform(8.0));

        // a plain mean would be 8/3
        assert_eq!(smoother.flush(), Some(Averaged(uniform(4.0))));
        assert_eq!(smoother.flush(), None);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let mut smoother = BurstSmoother::new(ms(80));

        smoother.observe(ms(81), &uniform(2.0));
        assert_eq!(smoother.observe(ms(80), &uniform(4.0)), None);

        assert_eq!(smoother.state().running_average, Some(uniform(3.0)));
    }

    #[test]
    fn test_fast_first_frame() {
        let mut smoother = BurstSmoother::default();

        assert_eq!(smoother.observe(ms(5), &uniform(1.0)), None);
        assert_eq!(smoother.state().running_average, None);
        assert_eq!(smoother.state().last_elapsed, Some(ms(5)));

        assert_eq!(smoother.observe(ms(200), &uniform(2.0)), None);
        assert_eq!(smoother.state().running_average, Some(uniform(2.0)));
    }

    #[test]
    fn test_averaged_display() {
        let avg = Averaged(Measurement::from([
            1.4, 2.5, 3.5, 10.6, 0.123, 1.0, 2.0, 3.0, 4.0, 0.555,
        ]));

        assert_eq!(avg.to_string(), "1,2,4,11,0.12,1.00,2.00,3.00,4.00,0.56");
    }

    #[test]
    fn test_averaged_display_no_negative_zero() {
        let avg = Averaged(Measurement::from([
            -0.3, -0.0, 0.2, -0.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
        ]));

        assert_eq!(avg.to_string(), "0,0,0,0,0.00,0.00,0.00,0.00,0.00,0.00");
    }
}
