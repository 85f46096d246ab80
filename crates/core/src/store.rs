use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
    time::SystemTime,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::{fs, sync::Mutex};
use tracing::debug;
use uuid::Uuid;

use crate::{
    error::{CoreError, Result},
    types::AnalysisReport,
};

pub const ANONYMOUS_REVIEWER: &str = "Student/User";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
    #[default]
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Teacher => "teacher",
            Role::Student => "student",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "teacher" => Ok(Role::Teacher),
            "student" => Ok(Role::Student),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// Who asked for the analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reviewer {
    pub name: Option<String>,
    pub role: Role,
}

impl Reviewer {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(ANONYMOUS_REVIEWER)
    }
}

/// Aggregate document kept per teacher.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeacherRecord {
    pub name: String,
    pub rating: f64,
    pub rating_count: u32,
    pub topics: Vec<String>,
    pub rating_history: Vec<f64>,
}

impl TeacherRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Fold one more rating into the running average.
    ///
    /// A record that carries a rating but no count is treated as holding one.
    pub fn apply_rating(&mut self, rating: f64, topic: &str) {
        let rated_before =
            self.rating_count > 0 || self.rating > 0.0 || !self.rating_history.is_empty();
        if rated_before {
            let count = self.rating_count.max(1);
            self.rating = (self.rating * f64::from(count) + rating) / f64::from(count + 1);
            self.rating_count = count + 1;
        } else {
            self.rating = rating;
            self.rating_count = 1;
        }

        if !topic.is_empty() && !self.topics.iter().any(|t| t == topic) {
            self.topics.push(topic.to_string());
        }
        if !self.rating_history.contains(&rating) {
            self.rating_history.push(rating);
        }
    }
}

/// One saved analysis in a teacher's report history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRecord {
    pub id: Uuid,
    pub saved_at: SystemTime,
    pub analyzed_by: String,
    pub user_role: Role,
    pub report: AnalysisReport,
}

impl ReportRecord {
    pub fn new(report: AnalysisReport, reviewer: &Reviewer) -> Self {
        Self {
            id: report.id,
            saved_at: SystemTime::now(),
            analyzed_by: reviewer.display_name().to_string(),
            user_role: reviewer.role,
            report,
        }
    }
}

#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn append_report(&self, teacher_id: &str, record: &ReportRecord) -> Result<()>;

    /// Apply a new rating to the teacher's aggregate, creating it if needed.
    async fn update_aggregate_rating(
        &self,
        teacher_id: &str,
        rating: f64,
        topic: &str,
    ) -> Result<TeacherRecord>;

    async fn teacher(&self, teacher_id: &str) -> Result<Option<TeacherRecord>>;

    async fn reports(&self, teacher_id: &str) -> Result<Vec<ReportRecord>>;
}

/// Rate the teacher with the report's overall rating, then store the report.
pub async fn persist_report(
    store: &dyn ReportStore,
    teacher_id: &str,
    report: &AnalysisReport,
    reviewer: &Reviewer,
) -> Result<TeacherRecord> {
    let Some(ai) = report.ai.as_ref() else {
        return Err(CoreError::StoreFailed {
            reason: "report carries no evaluation to rate".to_string(),
        });
    };

    let aggregate = store
        .update_aggregate_rating(teacher_id, ai.overall_rating, &ai.subject)
        .await?;
    store
        .append_report(teacher_id, &ReportRecord::new(report.clone(), reviewer))
        .await?;
    Ok(aggregate)
}

fn sanitize_id(teacher_id: &str) -> Result<String> {
    let id: String = teacher_id
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if id.is_empty() {
        return Err(CoreError::StoreFailed {
            reason: "teacher id is empty".to_string(),
        });
    }
    Ok(id)
}

/// JSON documents on disk:
/// `<root>/teachers/<id>/teacher.json` and
/// `<root>/teachers/<id>/analysis_reports/<uuid>.json`.
#[derive(Debug)]
pub struct FileReportStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FileReportStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn teacher_dir(&self, teacher_id: &str) -> Result<PathBuf> {
        Ok(self.root.join("teachers").join(sanitize_id(teacher_id)?))
    }

    async fn read_teacher(path: &Path) -> Result<Option<TeacherRecord>> {
        match fs::read_to_string(path).await {
            Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ReportStore for FileReportStore {
    async fn append_report(&self, teacher_id: &str, record: &ReportRecord) -> Result<()> {
        let dir = self.teacher_dir(teacher_id)?.join("analysis_reports");
        fs::create_dir_all(&dir).await?;

        let path = dir.join(format!("{}.json", record.id));
        fs::write(&path, serde_json::to_vec_pretty(record)?).await?;
        debug!(path = %path.display(), "report saved");
        Ok(())
    }

    async fn update_aggregate_rating(
        &self,
        teacher_id: &str,
        rating: f64,
        topic: &str,
    ) -> Result<TeacherRecord> {
        let _guard = self.write_lock.lock().await;

        let dir = self.teacher_dir(teacher_id)?;
        fs::create_dir_all(&dir).await?;
        let path = dir.join("teacher.json");

        let mut record = Self::read_teacher(&path)
            .await?
            .unwrap_or_else(|| TeacherRecord::new(teacher_id.trim()));
        record.apply_rating(rating, topic);

        fs::write(&path, serde_json::to_vec_pretty(&record)?).await?;
        Ok(record)
    }

    async fn teacher(&self, teacher_id: &str) -> Result<Option<TeacherRecord>> {
        Self::read_teacher(&self.teacher_dir(teacher_id)?.join("teacher.json")).await
    }

    async fn reports(&self, teacher_id: &str) -> Result<Vec<ReportRecord>> {
        let dir = self.teacher_dir(teacher_id)?.join("analysis_reports");
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                let text = fs::read_to_string(&path).await?;
                records.push(serde_json::from_str::<ReportRecord>(&text)?);
            }
        }
        records.sort_by_key(|record| record.saved_at);
        Ok(records)
    }
}

#[derive(Debug, Default)]
pub struct MemoryReportStore {
    teachers: Mutex<HashMap<String, TeacherRecord>>,
    reports: Mutex<HashMap<String, Vec<ReportRecord>>>,
}

impl MemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReportStore for MemoryReportStore {
    async fn append_report(&self, teacher_id: &str, record: &ReportRecord) -> Result<()> {
        self.reports
            .lock()
            .await
            .entry(sanitize_id(teacher_id)?)
            .or_default()
            .push(record.clone());
        Ok(())
    }

    async fn update_aggregate_rating(
        &self,
        teacher_id: &str,
        rating: f64,
        topic: &str,
    ) -> Result<TeacherRecord> {
        let mut teachers = self.teachers.lock().await;
        let record = teachers
            .entry(sanitize_id(teacher_id)?)
            .or_insert_with(|| TeacherRecord::new(teacher_id.trim()));
        record.apply_rating(rating, topic);
        Ok(record.clone())
    }

    async fn teacher(&self, teacher_id: &str) -> Result<Option<TeacherRecord>> {
        Ok(self
            .teachers
            .lock()
            .await
            .get(&sanitize_id(teacher_id)?)
            .cloned())
    }

    async fn reports(&self, teacher_id: &str) -> Result<Vec<ReportRecord>> {
        Ok(self
            .reports
            .lock()
            .await
            .get(&sanitize_id(teacher_id)?)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{llm::schema::AiReport, report::ReportAssembler};

    fn rated_report(rating: f64, subject: &str) -> AnalysisReport {
        let ai: AiReport = serde_json::from_value(serde_json::json!({
            "subject": subject,
            "overall_rating": rating,
        }))
        .unwrap();
        ReportAssembler::new("lecture.mp3", 60.0)
            .ai(Some(ai))
            .assemble()
    }

    #[test]
    fn running_average_over_three_ratings() {
        let mut record = TeacherRecord::new("Dr. Rao");
        record.apply_rating(4.0, "Optics");
        record.apply_rating(2.0, "Optics");
        record.apply_rating(3.0, "Waves");

        assert_eq!(record.rating_count, 3);
        assert!((record.rating - 3.0).abs() < 1e-9);
        assert_eq!(record.topics, vec!["Optics", "Waves"]);
        assert_eq!(record.rating_history, vec![4.0, 2.0, 3.0]);
    }

    #[test]
    fn rating_without_count_counts_as_one() {
        let mut record: TeacherRecord =
            serde_json::from_str(r#"{"name":"x","rating":4.0,"rating_history":[4.0]}"#).unwrap();
        record.apply_rating(2.0, "");
        assert_eq!(record.rating_count, 2);
        assert!((record.rating - 3.0).abs() < 1e-9);
    }

    #[test]
    fn seeded_rating_without_history_is_averaged() {
        let mut record: TeacherRecord =
            serde_json::from_str(r#"{"name":"x","rating":5.0,"rating_count":0}"#).unwrap();
        record.apply_rating(3.0, "Optics");
        assert_eq!(record.rating_count, 2);
        assert!((record.rating - 4.0).abs() < 1e-9);
        assert_eq!(record.rating_history, vec![3.0]);
    }

    #[test]
    fn reviewer_defaults() {
        let reviewer = Reviewer::default();
        assert_eq!(reviewer.display_name(), ANONYMOUS_REVIEWER);
        assert_eq!(reviewer.role, Role::Student);
        assert_eq!("Teacher".parse::<Role>(), Ok(Role::Teacher));
        assert!("janitor".parse::<Role>().is_err());
    }

    #[tokio::test]
    async fn file_store_persists_aggregate_and_reports() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileReportStore::new(dir.path());
        let reviewer = Reviewer {
            name: Some("Asha".to_string()),
            role: Role::Admin,
        };

        persist_report(&store, "Dr. Rao", &rated_report(5.0, "Optics"), &reviewer)
            .await
            .unwrap();
        let aggregate = persist_report(&store, "Dr. Rao", &rated_report(3.0, "Optics"), &reviewer)
            .await
            .unwrap();

        assert_eq!(aggregate.rating_count, 2);
        assert!((aggregate.rating - 4.0).abs() < 1e-9);
        assert!(dir.path().join("teachers/Dr__Rao/teacher.json").exists());

        let reopened = FileReportStore::new(dir.path());
        let teacher = reopened.teacher("Dr. Rao").await.unwrap().unwrap();
        assert_eq!(teacher.name, "Dr. Rao");
        let reports = reopened.reports("Dr. Rao").await.unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].analyzed_by, "Asha");
        assert_eq!(reports[0].user_role, Role::Admin);
    }

    #[tokio::test]
    async fn report_without_evaluation_is_not_persisted() {
        let store = MemoryReportStore::new();
        let report = ReportAssembler::new("lecture.mp3", 10.0).assemble();
        let err = persist_report(&store, "t1", &report, &Reviewer::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::StoreFailed { .. }));
        assert!(store.reports("t1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_teacher_id_is_rejected() {
        let store = MemoryReportStore::new();
        assert!(store.update_aggregate_rating("  ", 4.0, "x").await.is_err());
    }
}
