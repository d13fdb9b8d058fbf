//! Types for the CloudConvert client: jobs, payloads and API responses.

use std::path::PathBuf;
use std::pin::Pin;

use bytes::Bytes;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::conversion::ConversionOptions;

use super::ClientError;

/// Task names used inside every submitted job.
pub const IMPORT_TASK: &str = "import-file";
pub const CONVERT_TASK: &str = "convert-file";
pub const EXPORT_TASK: &str = "export-file";

/// Keys of the convert task that options cannot replace.
const RESERVED_CONVERT_KEYS: &[&str] = &["operation", "input", "output_format"];

/// Converted bytes as they arrive from the backend.
pub type ResultStream = Pin<Box<dyn Stream<Item = Result<Bytes, ClientError>> + Send>>;

/// One remote conversion: which file, into what, with which options.
#[derive(Debug, Clone)]
pub struct RemoteJob {
    pub source: PathBuf,
    /// Normalized output format (lower case, no leading dot).
    pub output_format: String,
    pub options: ConversionOptions,
    /// Use the sandbox endpoint and key.
    pub sandbox: bool,
}

impl RemoteJob {
    /// Source basename sent to the backend as the import filename.
    pub fn filename(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string())
    }
}

/// Account details returned by `GET /users/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    /// Remaining conversion credits.
    pub credits: i64,
}

/// Builds the `{tag, tasks}` body for `POST /jobs`.
///
/// The convert task reads from the import task and the export task from the
/// convert task. Options are merged into the convert task after the base keys,
/// skipping any that would replace `operation`, `input` or `output_format`.
pub fn build_job_payload(
    tag: &str,
    import_task: Value,
    output_format: &str,
    options: &ConversionOptions,
) -> Value {
    let mut convert = Map::new();
    convert.insert("operation".to_string(), json!("convert"));
    convert.insert("input".to_string(), json!(IMPORT_TASK));
    convert.insert("output_format".to_string(), json!(output_format));
    for (key, value) in options.iter() {
        if RESERVED_CONVERT_KEYS.contains(&key) {
            tracing::debug!(key, "Ignoring option that would replace a task key");
            continue;
        }
        convert.insert(key.to_string(), value.clone());
    }

    let mut tasks = Map::new();
    tasks.insert(IMPORT_TASK.to_string(), import_task);
    tasks.insert(CONVERT_TASK.to_string(), Value::Object(convert));
    tasks.insert(
        EXPORT_TASK.to_string(),
        json!({
            "operation": "export/url",
            "input": CONVERT_TASK,
        }),
    );

    json!({
        "tag": tag,
        "tasks": Value::Object(tasks),
    })
}

/// `{"data": ...}` wrapper used by every API response.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub data: T,
}

/// Job status as returned by `POST /jobs` and `GET /jobs/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct JobData {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub tasks: Vec<TaskData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskData {
    #[serde(default)]
    pub name: String,
    pub operation: String,
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub result: Option<TaskResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskResult {
    #[serde(default)]
    pub files: Vec<ExportedFile>,
    #[serde(default)]
    pub form: Option<UploadForm>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportedFile {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Signed form returned by an `import/upload` task.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadForm {
    pub url: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl JobData {
    pub fn is_finished(&self) -> bool {
        self.status == "finished"
    }

    pub fn is_error(&self) -> bool {
        self.status == "error"
    }

    /// Download URLs of every finished `export/url` task, in task order.
    pub fn export_urls(&self) -> Vec<String> {
        self.tasks
            .iter()
            .filter(|t| t.operation == "export/url" && t.status == "finished")
            .filter_map(|t| t.result.as_ref())
            .flat_map(|r| r.files.iter())
            .filter_map(|f| f.url.clone())
            .filter(|url| !url.is_empty())
            .collect()
    }

    /// Upload form of the import task, if the job is waiting for one.
    pub fn upload_form(&self) -> Option<&UploadForm> {
        self.tasks
            .iter()
            .filter(|t| t.operation == "import/upload")
            .filter_map(|t| t.result.as_ref())
            .find_map(|r| r.form.as_ref())
    }

    /// Human readable reason for a failed job.
    pub fn failure_reason(&self) -> String {
        self.tasks
            .iter()
            .find(|t| t.status == "error")
            .map(|t| {
                let message = t.message.as_deref().unwrap_or("no message");
                if t.name.is_empty() {
                    message.to_string()
                } else {
                    format!("task {} failed: {}", t.name, message)
                }
            })
            .unwrap_or_else(|| format!("job status is {}", self.status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finished_job() -> JobData {
        serde_json::from_value(json!({
            "id": "job-1",
            "status": "finished",
            "tasks": [
                {"name": "import-file", "operation": "import/base64", "status": "finished"},
                {"name": "convert-file", "operation": "convert", "status": "finished"},
                {
                    "name": "export-file",
                    "operation": "export/url",
                    "status": "finished",
                    "result": {"files": [
                        {"filename": "report.pdf", "url": "https://storage.example/report.pdf"},
                        {"filename": "report-2.pdf", "url": "https://storage.example/report-2.pdf"}
                    ]}
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_payload_shape() {
        let options = ConversionOptions::new()
            .with("page_range", "1-3")
            .with("output_format", "exe")
            .with("pdf_a", true);
        let import = json!({"operation": "import/base64", "file": "AAA=", "filename": "report.docx"});

        let payload = build_job_payload("convertino", import, "pdf", &options);

        assert_eq!(payload["tag"], "convertino");
        let tasks = payload["tasks"].as_object().unwrap();
        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks[IMPORT_TASK]["operation"], "import/base64");
        assert_eq!(tasks[IMPORT_TASK]["filename"], "report.docx");

        let convert = &tasks[CONVERT_TASK];
        assert_eq!(convert["operation"], "convert");
        assert_eq!(convert["input"], IMPORT_TASK);
        assert_eq!(convert["output_format"], "pdf");
        assert_eq!(convert["page_range"], "1-3");
        assert_eq!(convert["pdf_a"], true);

        assert_eq!(tasks[EXPORT_TASK]["operation"], "export/url");
        assert_eq!(tasks[EXPORT_TASK]["input"], CONVERT_TASK);
    }

    #[test]
    fn test_export_urls_in_order() {
        let job = finished_job();
        assert!(job.is_finished());
        assert_eq!(
            job.export_urls(),
            vec![
                "https://storage.example/report.pdf".to_string(),
                "https://storage.example/report-2.pdf".to_string()
            ]
        );
    }

    #[test]
    fn test_export_urls_ignores_unfinished_and_missing() {
        let job: JobData = serde_json::from_value(json!({
            "id": "job-2",
            "status": "finished",
            "tasks": [
                {"name": "export-file", "operation": "export/url", "status": "processing",
                 "result": {"files": [{"filename": "a.pdf", "url": "https://x/a.pdf"}]}},
                {"name": "export-2", "operation": "export/url", "status": "finished",
                 "result": {"files": [{"filename": "b.pdf"}]}}
            ]
        }))
        .unwrap();
        assert!(job.export_urls().is_empty());
    }

    #[test]
    fn test_failure_reason_names_task() {
        let job: JobData = serde_json::from_value(json!({
            "id": "job-3",
            "status": "error",
            "tasks": [
                {"name": "convert-file", "operation": "convert", "status": "error",
                 "message": "Unsupported output format"}
            ]
        }))
        .unwrap();
        assert!(job.is_error());
        assert_eq!(
            job.failure_reason(),
            "task convert-file failed: Unsupported output format"
        );
    }

    #[test]
    fn test_upload_form() {
        let job: JobData = serde_json::from_value(json!({
            "id": "job-4",
            "status": "waiting",
            "tasks": [
                {"name": "import-file", "operation": "import/upload", "status": "waiting",
                 "result": {"form": {"url": "https://upload.example/", "parameters": {"key": "abc"}}}}
            ]
        }))
        .unwrap();
        let form = job.upload_form().unwrap();
        assert_eq!(form.url, "https://upload.example/");
        assert_eq!(form.parameters["key"], "abc");
    }

    #[test]
    fn test_remote_job_filename() {
        let job = RemoteJob {
            source: PathBuf::from("/docs/report.docx"),
            output_format: "pdf".into(),
            options: ConversionOptions::new(),
            sandbox: false,
        };
        assert_eq!(job.filename(), "report.docx");
    }
}
