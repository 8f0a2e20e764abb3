//! Per-view state of the trend screen for one active patient profile.
//!
//! The session is the single owner of the fetched collections, the series
//! cache and the metric selection. Callers feed it the two fetch results
//! (in any order) and read back a [`TrendView`].

use std::collections::BTreeSet;

use exam_timeline_core::{
    Exam, FetchError, HealthMetric, MetricSelection, SeriesConfig, TrendSeries,
};
use tracing::{debug, info, warn};

use crate::cache::SeriesCache;
use crate::catalog::{filter_by_category, metric_categories, metric_infos, MetricInfo};
use crate::chart::ChartModel;
use crate::select_exams;

#[derive(Debug, Clone, PartialEq)]
enum Fetch<T> {
    Idle,
    Loading,
    Ready(Vec<T>),
}

impl<T> Fetch<T> {
    fn is_loading(&self) -> bool {
        matches!(self, Fetch::Loading)
    }

    fn ready(&self) -> Option<&[T]> {
        match self {
            Fetch::Ready(items) => Some(items),
            _ => None,
        }
    }
}

/// What the trend screen should render.
#[derive(Debug, Clone, PartialEq)]
pub enum TrendView {
    /// No profile chosen yet, or a fetch is still pending.
    Loading,
    /// The patient has no exam.
    NoExams,
    /// Every exam was excluded from the chart.
    NoExamSelected,
    /// Exams exist but none yielded a plottable metric.
    NoMetrics,
    /// Data is there but no selected metric can be drawn.
    NothingSelected,
    Chart(ChartModel),
}

#[derive(Debug)]
pub struct TrendSession {
    config: SeriesConfig,
    profile_id: Option<i64>,
    exams: Fetch<Exam>,
    metrics: Fetch<HealthMetric>,
    cache: SeriesCache,
    selection: MetricSelection,
    excluded_exams: BTreeSet<i64>,
    category: Option<String>,
}

impl TrendSession {
    pub fn new(config: SeriesConfig) -> Self {
        Self {
            config,
            profile_id: None,
            exams: Fetch::Idle,
            metrics: Fetch::Idle,
            cache: SeriesCache::new(),
            selection: MetricSelection::default(),
            excluded_exams: BTreeSet::new(),
            category: None,
        }
    }

    pub fn profile_id(&self) -> Option<i64> {
        self.profile_id
    }

    pub fn config(&self) -> &SeriesConfig {
        &self.config
    }

    pub fn selection(&self) -> &MetricSelection {
        &self.selection
    }

    /// Start (or restart) loading data for `profile_id`.
    ///
    /// Both fetches are marked pending. Switching to another profile also
    /// drops the cached series, the exam exclusions and the category filter;
    /// the selection is reconciled once the new data arrives.
    pub fn switch_profile(&mut self, profile_id: i64) {
        if self.profile_id != Some(profile_id) {
            info!(profile_id, "switching trend profile");
            self.cache.invalidate();
            self.excluded_exams.clear();
            self.category = None;
        } else {
            debug!(profile_id, "refetching trend data");
        }
        self.profile_id = Some(profile_id);
        self.exams = Fetch::Loading;
        self.metrics = Fetch::Loading;
    }

    /// Record the exam fetch result. Returns `false` for a stale response.
    pub fn receive_exams(
        &mut self,
        profile_id: i64,
        result: Result<Vec<Exam>, FetchError>,
    ) -> bool {
        if !self.accepts(profile_id, "exams") {
            return false;
        }
        self.exams = Fetch::Ready(absorb_failure(profile_id, "exams", result));
        self.refresh();
        true
    }

    /// Record the health-metric fetch result. Returns `false` for a stale response.
    pub fn receive_metrics(
        &mut self,
        profile_id: i64,
        result: Result<Vec<HealthMetric>, FetchError>,
    ) -> bool {
        if !self.accepts(profile_id, "metrics") {
            return false;
        }
        self.metrics = Fetch::Ready(absorb_failure(profile_id, "metrics", result));
        self.refresh();
        true
    }

    /// `true` until both collections for the active profile have arrived.
    pub fn is_loading(&self) -> bool {
        self.profile_id.is_none() || self.exams.is_loading() || self.metrics.is_loading()
    }

    /// Current series, once both fetches have resolved.
    pub fn series(&self) -> Option<&TrendSeries> {
        if self.is_loading() {
            return None;
        }
        self.cache.current()
    }

    pub fn toggle_metric(&mut self, metric: &str) {
        self.selection.toggle(metric);
    }

    /// Every fetched exam, included or not.
    pub fn exams(&self) -> &[Exam] {
        self.exams.ready().unwrap_or_default()
    }

    pub fn is_exam_included(&self, exam_id: i64) -> bool {
        !self.excluded_exams.contains(&exam_id)
    }

    /// Include or exclude one exam from the chart and rebuild.
    pub fn toggle_exam(&mut self, exam_id: i64) {
        if !self.excluded_exams.remove(&exam_id) {
            self.excluded_exams.insert(exam_id);
        }
        debug!(exam_id, excluded = self.excluded_exams.len(), "exam filter changed");
        self.refresh();
    }

    /// Categories of the fetched metrics, first-seen order.
    pub fn categories(&self) -> Vec<String> {
        self.metrics.ready().map(metric_categories).unwrap_or_default()
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Narrow the selectable metrics to `category`; `None` shows all.
    pub fn set_category(&mut self, category: Option<&str>) {
        self.category = category.map(str::to_string);
    }

    /// Metrics offered as checkboxes under the current category filter.
    pub fn selectable_metrics(&self) -> Vec<String> {
        let (Some(series), Some(metrics)) = (self.series(), self.metrics.ready()) else {
            return Vec::new();
        };
        filter_by_category(&series.displayed, metrics, self.category.as_deref())
    }

    /// Info cards of the selected metrics.
    pub fn selected_metric_infos(&self) -> Vec<MetricInfo> {
        self.metrics
            .ready()
            .map(|metrics| metric_infos(metrics, self.selection.selected()))
            .unwrap_or_default()
    }

    pub fn view(&self) -> TrendView {
        if self.is_loading() {
            return TrendView::Loading;
        }

        let exams = self.exams();
        if exams.is_empty() {
            return TrendView::NoExams;
        }
        if exams.iter().all(|exam| !self.is_exam_included(exam.id)) {
            return TrendView::NoExamSelected;
        }

        let Some(series) = self.cache.current().filter(|series| !series.is_empty()) else {
            return TrendView::NoMetrics;
        };

        let chart = ChartModel::build(series, &self.selection);
        if chart.is_empty() {
            TrendView::NothingSelected
        } else {
            TrendView::Chart(chart)
        }
    }

    fn accepts(&self, profile_id: i64, what: &str) -> bool {
        if self.profile_id == Some(profile_id) {
            return true;
        }
        debug!(
            profile_id,
            active = ?self.profile_id,
            what,
            "ignoring response for inactive profile"
        );
        false
    }

    fn refresh(&mut self) {
        let (Some(exams), Some(metrics)) = (self.exams.ready(), self.metrics.ready()) else {
            return;
        };

        let included = select_exams(exams, &self.excluded_exams);
        let series = self.cache.get_or_build(&included, metrics, &self.config);
        if self.selection.sync_available(&series.displayed) {
            debug!(selected = ?self.selection.selected(), "metric selection reset");
        }
    }
}

fn absorb_failure<T>(profile_id: i64, what: &str, result: Result<Vec<T>, FetchError>) -> Vec<T> {
    result.unwrap_or_else(|err| {
        warn!(profile_id, what, error = %err, "fetch failed, continuing with no data");
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_timeline_core::{MetricStatus, RawValue};

    fn exam(id: i64, date: &str) -> Exam {
        Exam {
            id,
            profile_id: Some(1),
            name: format!("Exame {id}"),
            exam_date: Some(date.to_string()),
            upload_date: None,
            created_at: None,
            laboratory_name: None,
            status: None,
        }
    }

    fn metric(id: i64, exam_id: i64, name: &str, value: &str) -> HealthMetric {
        HealthMetric {
            id,
            exam_id: Some(exam_id),
            name: name.to_string(),
            value: Some(RawValue::from(value)),
            unit: None,
            status: MetricStatus::Unknown,
            date: None,
            reference_min: None,
            reference_max: None,
            reference_range: None,
            category: None,
        }
    }

    #[test]
    fn loading_until_both_fetches_resolve() {
        let mut session = TrendSession::new(SeriesConfig::default());
        assert_eq!(session.view(), TrendView::Loading);

        session.switch_profile(1);
        assert!(session.receive_metrics(1, Ok(vec![metric(1, 1, "Glicose", "90")])));
        assert!(session.is_loading());
        assert_eq!(session.view(), TrendView::Loading);
        assert!(session.series().is_none());

        assert!(session.receive_exams(1, Ok(vec![exam(1, "2024-01-15")])));
        assert!(!session.is_loading());
        assert!(matches!(session.view(), TrendView::Chart(_)));
        assert_eq!(session.selection().selected(), ["glicose".to_string()]);
    }

    #[test]
    fn stale_responses_are_ignored() {
        let mut session = TrendSession::new(SeriesConfig::default());
        session.switch_profile(1);
        session.switch_profile(2);
        assert!(!session.receive_exams(1, Ok(vec![exam(1, "2024-01-15")])));
        assert!(session.is_loading());
    }

    #[test]
    fn failures_degrade_to_empty_states() {
        let mut session = TrendSession::new(SeriesConfig::default());
        session.switch_profile(1);
        session.receive_exams(1, Err(FetchError::Status(500)));
        session.receive_metrics(1, Err(FetchError::Network("offline".to_string())));
        assert_eq!(session.view(), TrendView::NoExams);

        session.switch_profile(1);
        session.receive_exams(1, Ok(vec![exam(1, "2024-01-15")]));
        session.receive_metrics(1, Err(FetchError::Status(502)));
        assert_eq!(session.view(), TrendView::NoMetrics);
    }

    #[test]
    fn deselecting_everything_shows_selection_state() {
        let mut session = TrendSession::new(SeriesConfig::default());
        session.switch_profile(1);
        session.receive_exams(1, Ok(vec![exam(1, "2024-01-15")]));
        session.receive_metrics(1, Ok(vec![metric(1, 1, "Glicose", "90")]));

        session.toggle_metric("glicose");
        assert_eq!(session.view(), TrendView::NothingSelected);
        session.toggle_metric("glicose");
        assert!(matches!(session.view(), TrendView::Chart(_)));
    }

    #[test]
    fn excluded_exams_leave_the_chart() {
        let mut session = TrendSession::new(SeriesConfig::default());
        session.switch_profile(1);
        session.receive_exams(1, Ok(vec![exam(1, "2024-01-15"), exam(2, "2024-02-15")]));
        session.receive_metrics(1, Ok(vec![metric(1, 1, "Glicose", "90"), metric(2, 2, "Glicose", "97")]));
        assert_eq!(session.series().expect("series").rows.len(), 2);

        session.toggle_exam(1);
        assert!(!session.is_exam_included(1));
        let rows = &session.series().expect("series").rows;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].exam_id, 2);
        assert_eq!(session.exams().len(), 2);

        session.toggle_exam(2);
        assert_eq!(session.view(), TrendView::NoExamSelected);
        assert_eq!(session.selection().selected(), ["glicose".to_string()]);

        session.toggle_exam(1);
        assert!(matches!(session.view(), TrendView::Chart(_)));

        session.switch_profile(2);
        assert!(session.is_exam_included(2));
    }

    #[test]
    fn category_filter_and_info_cards() {
        let mut glucose = metric(1, 1, "Glicose", "90");
        glucose.category = Some("Bioquímica".to_string());
        glucose.unit = Some("mg/dL".to_string());
        let mut hemoglobin = metric(2, 1, "Hemoglobina", "13,5");
        hemoglobin.category = Some("Hematologia".to_string());
        let ferritin = metric(3, 1, "Ferritina", "80");

        let mut session = TrendSession::new(SeriesConfig::default());
        session.switch_profile(1);
        session.receive_exams(1, Ok(vec![exam(1, "2024-01-15")]));
        session.receive_metrics(1, Ok(vec![glucose, hemoglobin, ferritin]));

        assert_eq!(session.categories(), ["Bioquímica", "Hematologia", "Sem categoria"]);
        assert_eq!(session.selectable_metrics(), ["hemoglobina", "glicose", "ferritina"]);

        session.set_category(Some("Hematologia"));
        assert_eq!(session.selectable_metrics(), ["hemoglobina"]);
        // Filtering the checkboxes keeps the chart selection untouched.
        assert_eq!(session.selection().selected().len(), 3);

        session.toggle_metric("hemoglobina");
        session.toggle_metric("ferritina");
        let infos = session.selected_metric_infos();
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].key, "glicose");
        assert_eq!(infos[0].category.as_deref(), Some("Bioquímica"));
        assert_eq!(infos[0].unit.as_deref(), Some("mg/dL"));

        session.switch_profile(2);
        assert_eq!(session.category(), None);
    }

    #[test]
    fn patient_switch_resets_disjoint_selection() {
        let mut session = TrendSession::new(SeriesConfig::default());
        session.switch_profile(1);
        session.receive_exams(1, Ok(vec![exam(1, "2024-01-15")]));
        session.receive_metrics(1, Ok(vec![metric(1, 1, "Glicose", "90"), metric(2, 1, "TSH", "2,1")]));
        session.toggle_metric("tsh");
        assert_eq!(session.selection().selected(), ["glicose".to_string()]);

        // Same patient refetched: selection kept.
        session.switch_profile(1);
        session.receive_exams(1, Ok(vec![exam(1, "2024-01-15")]));
        session.receive_metrics(1, Ok(vec![metric(1, 1, "Glicose", "91"), metric(2, 1, "TSH", "2,1")]));
        assert_eq!(session.selection().selected(), ["glicose".to_string()]);

        // Another patient with disjoint metrics: selection reset to all.
        session.switch_profile(2);
        session.receive_exams(2, Ok(vec![exam(5, "2024-03-01")]));
        session.receive_metrics(2, Ok(vec![metric(9, 5, "Ferritina", "120")]));
        assert_eq!(session.selection().selected(), ["ferritina".to_string()]);
    }
}
