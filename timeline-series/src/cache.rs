//! Explicit memoization of [`build_series`](crate::build_series).

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use exam_timeline_core::{Exam, HealthMetric, SeriesConfig, TrendSeries};
use tracing::debug;

use crate::build_series;

/// Last built series and the fingerprint of the inputs it came from.
#[derive(Debug, Default)]
pub struct SeriesCache {
    fingerprint: Option<u64>,
    series: TrendSeries,
    builds: usize,
}

impl SeriesCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached series, rebuilding it when the inputs changed.
    pub fn get_or_build(
        &mut self,
        exams: &[Exam],
        metrics: &[HealthMetric],
        config: &SeriesConfig,
    ) -> &TrendSeries {
        let fingerprint = input_fingerprint(exams, metrics, config);
        if self.fingerprint == Some(fingerprint) {
            debug!(fingerprint, "series cache hit");
        } else {
            self.series = build_series(exams, metrics, config);
            self.fingerprint = Some(fingerprint);
            self.builds += 1;
            debug!(
                fingerprint,
                rows = self.series.rows.len(),
                available = self.series.available.len(),
                "series rebuilt"
            );
        }
        &self.series
    }

    /// Series of the last build, if any input has been seen since the last
    /// invalidation.
    pub fn current(&self) -> Option<&TrendSeries> {
        self.fingerprint.map(|_| &self.series)
    }

    /// Drop the cached series; the next lookup always rebuilds.
    pub fn invalidate(&mut self) {
        self.fingerprint = None;
        self.series = TrendSeries::default();
    }

    /// Number of rebuilds performed so far.
    pub fn builds(&self) -> usize {
        self.builds
    }
}

/// Content hash of everything the series depends on.
pub fn input_fingerprint(exams: &[Exam], metrics: &[HealthMetric], config: &SeriesConfig) -> u64 {
    let mut hasher = DefaultHasher::new();
    exams.hash(&mut hasher);
    metrics.hash(&mut hasher);
    config.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_timeline_core::{MetricStatus, RawValue};

    fn inputs() -> (Vec<Exam>, Vec<HealthMetric>) {
        let exams = vec![Exam {
            id: 1,
            profile_id: Some(7),
            name: "Perfil lipídico".to_string(),
            exam_date: Some("2024-05-02".to_string()),
            upload_date: None,
            created_at: None,
            laboratory_name: Some("Lab Central".to_string()),
            status: None,
        }];
        let metrics = vec![HealthMetric {
            id: 10,
            exam_id: Some(1),
            name: "Colesterol".to_string(),
            value: Some(RawValue::from("182")),
            unit: Some("mg/dL".to_string()),
            status: MetricStatus::Normal,
            date: None,
            reference_min: None,
            reference_max: None,
            reference_range: Some("< 190".to_string()),
            category: None,
        }];
        (exams, metrics)
    }

    #[test]
    fn identical_inputs_reuse_series() {
        let (exams, metrics) = inputs();
        let config = SeriesConfig::default();
        let mut cache = SeriesCache::new();
        assert!(cache.current().is_none());

        let rows = cache.get_or_build(&exams, &metrics, &config).rows.len();
        assert_eq!(rows, 1);
        cache.get_or_build(&exams, &metrics, &config);
        cache.get_or_build(&exams.clone(), &metrics.clone(), &config);
        assert_eq!(cache.builds(), 1);
    }

    #[test]
    fn changed_inputs_rebuild() {
        let (exams, mut metrics) = inputs();
        let config = SeriesConfig::default();
        let mut cache = SeriesCache::new();
        cache.get_or_build(&exams, &metrics, &config);

        metrics[0].value = Some(RawValue::from("201"));
        let series = cache.get_or_build(&exams, &metrics, &config);
        assert_eq!(series.rows[0].value("colesterol total"), Some(201.0));
        assert_eq!(cache.builds(), 2);

        let other_config = SeriesConfig {
            date_format: "%Y-%m-%d".to_string(),
            ..SeriesConfig::default()
        };
        let series = cache.get_or_build(&exams, &metrics, &other_config);
        assert_eq!(series.rows[0].date, "2024-05-02");
        assert_eq!(cache.builds(), 3);
    }

    #[test]
    fn invalidate_forces_rebuild() {
        let (exams, metrics) = inputs();
        let config = SeriesConfig::default();
        let mut cache = SeriesCache::new();
        cache.get_or_build(&exams, &metrics, &config);
        cache.invalidate();
        assert!(cache.current().is_none());
        cache.get_or_build(&exams, &metrics, &config);
        assert_eq!(cache.builds(), 2);
    }
}
