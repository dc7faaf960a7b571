//! Smoke-test orchestration against an in-memory backend.

use std::cell::RefCell;
use std::collections::HashMap;

use pill_prep_storage::{
    run_smoke_test, SmokeTestPlan, StorageBackend, StorageError, StorageResult,
};
use serde_json::{json, Value};
use tempfile::TempDir;

/// Which step the fake should fail at.
#[derive(Clone, Copy, PartialEq)]
enum FailAt {
    Nothing,
    Upload,
    Insert,
}

struct FakeBackend {
    fail_at: FailAt,
    /// Drop inserted rows so read-back finds nothing
    lose_rows: bool,
    objects: RefCell<HashMap<String, Vec<u8>>>,
    rows: RefCell<Vec<Value>>,
}

impl FakeBackend {
    fn new() -> Self {
        Self {
            fail_at: FailAt::Nothing,
            lose_rows: false,
            objects: RefCell::new(HashMap::new()),
            rows: RefCell::new(Vec::new()),
        }
    }

    fn failing(fail_at: FailAt) -> Self {
        Self {
            fail_at,
            ..Self::new()
        }
    }
}

impl StorageBackend for FakeBackend {
    fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<()> {
        assert_eq!(content_type, "image/jpeg");
        if self.fail_at == FailAt::Upload {
            return Err(StorageError::Http {
                operation: "upload",
                status: 409,
                message: "The resource already exists".into(),
            });
        }
        self.objects
            .borrow_mut()
            .insert(format!("{bucket}/{path}"), bytes);
        Ok(())
    }

    fn insert_row(&self, _table: &str, row: &Value) -> StorageResult<Value> {
        if self.fail_at == FailAt::Insert {
            return Err(StorageError::Http {
                operation: "insert",
                status: 401,
                message: "Invalid API key".into(),
            });
        }
        let mut stored = row.clone();
        stored["id"] = json!(self.rows.borrow().len() + 1);
        if !self.lose_rows {
            self.rows.borrow_mut().push(stored.clone());
        }
        Ok(stored)
    }

    fn select_by_kcode(&self, _table: &str, kcode: &str) -> StorageResult<Vec<Value>> {
        Ok(self
            .rows
            .borrow()
            .iter()
            .filter(|r| r["kcode"] == kcode)
            .cloned()
            .collect())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("https://fake.local/storage/v1/object/public/{bucket}/{path}")
    }
}

fn plan(dir: &TempDir) -> SmokeTestPlan {
    let mut plan = SmokeTestPlan::new("K-030864");
    plan.local_dir = dir.path().to_path_buf();
    plan
}

#[test]
fn test_smoke_test_success() {
    let dir = TempDir::new().unwrap();
    let backend = FakeBackend::new();
    let report = run_smoke_test(&backend, &plan(&dir)).unwrap();

    assert_eq!(
        report.object_path,
        "CS_1_single/K-030864/K-030864_0_3_front_0_90_000_200.jpg"
    );
    assert!(report.local_image.exists());
    assert_eq!(report.row_id, Some(json!(1)));
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0]["photo_url"], report.object_path.as_str());
    assert!(report.public_url.ends_with(&report.object_path));

    let objects = backend.objects.borrow();
    let uploaded = objects
        .get(&format!("pill-photos/{}", report.object_path))
        .unwrap();
    assert_eq!(*uploaded, std::fs::read(&report.local_image).unwrap());
}

#[test]
fn test_upload_failure_aborts() {
    let dir = TempDir::new().unwrap();
    let backend = FakeBackend::failing(FailAt::Upload);
    let err = run_smoke_test(&backend, &plan(&dir)).unwrap_err();

    assert!(err.to_string().contains("409"));
    assert!(backend.rows.borrow().is_empty());
}

#[test]
fn test_insert_failure_aborts() {
    let dir = TempDir::new().unwrap();
    let backend = FakeBackend::failing(FailAt::Insert);
    let err = run_smoke_test(&backend, &plan(&dir)).unwrap_err();

    assert!(matches!(err, StorageError::Http { status: 401, .. }));
    assert_eq!(backend.objects.borrow().len(), 1);
}

#[test]
fn test_empty_read_back_is_an_error() {
    let dir = TempDir::new().unwrap();
    let backend = FakeBackend {
        lose_rows: true,
        ..FakeBackend::new()
    };
    let err = run_smoke_test(&backend, &plan(&dir)).unwrap_err();
    assert!(matches!(err, StorageError::NotFound { ref kcode } if kcode == "K-030864"));
}
