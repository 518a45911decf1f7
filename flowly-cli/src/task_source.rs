use chrono_tz::Tz;
use flowly_core::{PlanError, Task, TaskSource};
use flowly_ingest::load_tasks;
use std::path::PathBuf;

/// Reads the task store's export file. The export belongs to a single user,
/// so `user_id` is not used to filter.
#[derive(Debug, Clone)]
pub struct ExportTaskSource {
    path: Option<PathBuf>,
    tz: Tz,
}

impl ExportTaskSource {
    pub fn new(path: Option<PathBuf>, tz: Tz) -> Self {
        Self { path, tz }
    }
}

impl TaskSource for ExportTaskSource {
    fn tasks_for_user(&self, _user_id: &str) -> Result<Vec<Task>, PlanError> {
        let path = self.path.as_ref().ok_or_else(|| {
            PlanError::TaskSource(
                "no task export configured (pass --tasks <file> or set [tasks] path)".to_string(),
            )
        })?;
        load_tasks(path, self.tz).map_err(|e| PlanError::TaskSource(format!("{e:#}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_is_a_task_source_error() {
        let src = ExportTaskSource::new(None, Tz::UTC);
        assert!(matches!(src.tasks_for_user("u"), Err(PlanError::TaskSource(_))));
    }

    #[test]
    fn reads_export_on_every_call() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        std::fs::write(&path, r#"[{"id": "1", "title": "first"}]"#).unwrap();
        let src = ExportTaskSource::new(Some(path.clone()), Tz::UTC);
        assert_eq!(src.tasks_for_user("u").unwrap().len(), 1);

        std::fs::write(&path, r#"[{"id": "1", "title": "a"}, {"id": "2", "title": "b"}]"#).unwrap();
        assert_eq!(src.tasks_for_user("u").unwrap().len(), 2);
    }
}
