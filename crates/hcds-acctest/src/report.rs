use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Change {
    Created { id: String },
    Updated { id: String, time_zone: String },
    Replaced { from: String, to: String },
    Unchanged { id: String },
    Imported { id: String },
    Deleted { id: String },
}

impl std::fmt::Display for Change {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Change::Created { id } => write!(f, "+ dataset {}", id),
            Change::Updated { id, time_zone } => {
                write!(f, "~ dataset {} (time_zone = {})", id, time_zone)
            }
            Change::Replaced { from, to } => write!(f, "-/+ dataset {} => {}", from, to),
            Change::Unchanged { id } => write!(f, "  dataset {}", id),
            Change::Imported { id } => write!(f, "< dataset {} (import verified)", id),
            Change::Deleted { id } => write!(f, "- dataset {}", id),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub index: usize,
    /// "apply", "import_verify" or "destroy".
    pub kind: String,
    /// HCL applied by this step, for apply steps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
    pub changes: Vec<Change>,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleReport {
    pub driver: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub steps: Vec<StepRecord>,
}

impl LifecycleReport {
    pub fn new(driver: impl Into<String>) -> Self {
        Self {
            driver: driver.into(),
            started_at: Utc::now(),
            finished_at: None,
            steps: Vec::new(),
        }
    }

    pub fn record(&mut self, kind: &str, config: Option<String>, changes: Vec<Change>) {
        self.steps.push(StepRecord {
            index: self.steps.len() + 1,
            kind: kind.to_string(),
            config,
            changes,
            at: Utc::now(),
        });
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// All changes across steps, in order.
    pub fn changes(&self) -> impl Iterator<Item = &Change> {
        self.steps.iter().flat_map(|s| s.changes.iter())
    }
}
