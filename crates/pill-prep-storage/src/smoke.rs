//! Upload smoke test: image → upload → insert → read back → public URL.

use std::path::PathBuf;

use chrono::Local;
use serde_json::Value;
use tracing::info;

use crate::{
    generate_test_image, CaptureMetadata, CapturePath, CaptureSpec, StorageBackend, StorageError,
    StorageResult,
};

/// What to upload and where.
#[derive(Debug, Clone)]
pub struct SmokeTestPlan {
    pub kcode: String,
    pub bucket: String,
    pub table: String,
    pub category: String,
    pub spec: CaptureSpec,
    /// Directory for the generated local image
    pub local_dir: PathBuf,
}

impl SmokeTestPlan {
    pub fn new(kcode: impl Into<String>) -> Self {
        Self {
            kcode: kcode.into(),
            bucket: "pill-photos".to_string(),
            table: "capture_real_photos".to_string(),
            category: "CS_1_single".to_string(),
            spec: CaptureSpec::default(),
            local_dir: std::env::temp_dir().join("pill_test"),
        }
    }

    pub fn object_path(&self) -> CapturePath {
        CapturePath::new(&self.category, &self.kcode, &self.spec)
    }
}

/// Outcome of a successful smoke test.
#[derive(Debug, Clone)]
pub struct SmokeTestReport {
    pub local_image: PathBuf,
    pub object_path: String,
    /// `id` of the inserted row, when the table returns one
    pub row_id: Option<Value>,
    /// Rows read back for the K-CODE
    pub records: Vec<Value>,
    pub public_url: String,
}

/// Run the smoke test against `backend`. The first failure aborts the run.
pub fn run_smoke_test(
    backend: &dyn StorageBackend,
    plan: &SmokeTestPlan,
) -> StorageResult<SmokeTestReport> {
    let path = plan.object_path();
    let object_path = path.to_string();

    let local_image = plan.local_dir.join(&path.filename);
    let bytes = generate_test_image(&local_image)?;

    backend.upload_object(&plan.bucket, &object_path, bytes, "image/jpeg")?;
    info!(bucket = %plan.bucket, path = %object_path, "Uploaded test image");

    let metadata = CaptureMetadata::smoke_test(&path, &plan.spec, Local::now());
    let row = serde_json::to_value(&metadata).map_err(|e| StorageError::Response {
        operation: "insert",
        message: e.to_string(),
    })?;
    let inserted = backend.insert_row(&plan.table, &row)?;
    let row_id = inserted.get("id").cloned();
    info!(table = %plan.table, id = ?row_id, "Saved capture metadata");

    let records = backend.select_by_kcode(&plan.table, &plan.kcode)?;
    if records.is_empty() {
        return Err(StorageError::NotFound {
            kcode: plan.kcode.clone(),
        });
    }
    info!(kcode = %plan.kcode, records = records.len(), "Verified capture rows");

    let public_url = backend.public_url(&plan.bucket, &object_path);
    Ok(SmokeTestReport {
        local_image,
        object_path,
        row_id,
        records,
        public_url,
    })
}
