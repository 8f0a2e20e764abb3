use serde::{Deserialize, Serialize};

/// Metrics the user chose to plot. Lives in memory only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "state", content = "metrics", rename_all = "snake_case")]
pub enum MetricSelection {
    /// Nothing has been offered yet.
    #[default]
    Uninitialized,
    /// Current selection; an empty list means "show nothing".
    Active(Vec<String>),
}

impl MetricSelection {
    /// Reconcile the selection with a freshly computed list of metrics.
    ///
    /// Returns `true` when the selection was (re)initialized to `available`.
    /// A list with no overlap with the current selection is treated as a
    /// patient switch.
    pub fn sync_available(&mut self, available: &[String]) -> bool {
        if available.is_empty() {
            return false;
        }

        let reset = match self {
            MetricSelection::Uninitialized => true,
            MetricSelection::Active(selected) => {
                !selected.iter().any(|name| available.contains(name))
            }
        };

        if reset {
            *self = MetricSelection::Active(dedup(available));
        }
        reset
    }

    /// Add `metric` if absent, remove it if present.
    pub fn toggle(&mut self, metric: &str) {
        match self {
            MetricSelection::Uninitialized => {
                *self = MetricSelection::Active(vec![metric.to_string()]);
            }
            MetricSelection::Active(selected) => {
                if let Some(index) = selected.iter().position(|name| name == metric) {
                    selected.remove(index);
                } else {
                    selected.push(metric.to_string());
                }
            }
        }
    }

    pub fn is_selected(&self, metric: &str) -> bool {
        self.selected().iter().any(|name| name == metric)
    }

    pub fn selected(&self) -> &[String] {
        match self {
            MetricSelection::Uninitialized => &[],
            MetricSelection::Active(selected) => selected,
        }
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self, MetricSelection::Active(_))
    }
}

fn dedup(names: &[String]) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if !unique.contains(name) {
            unique.push(name.clone());
        }
    }
    unique
}
