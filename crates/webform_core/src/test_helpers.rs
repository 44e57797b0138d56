#![cfg(test)]

pub mod fixtures {
    use crate::models::{LegacyFieldRecord, LegacyForm, RawSubmissionRow};

    pub fn form(nid: i64, title: &str) -> LegacyForm {
        LegacyForm {
            nid,
            title: title.to_string(),
        }
    }

    /// A top level text field with no extra payload.
    pub fn field(cid: i64, key: &str) -> LegacyFieldRecord {
        LegacyFieldRecord {
            legacy_id: cid,
            parent_legacy_id: 0,
            key: key.to_string(),
            display_name: key.to_string(),
            field_type: "textfield".to_string(),
            is_required: false,
            default_value: String::new(),
            weight: 0,
            extra_payload: Vec::new(),
        }
    }

    pub fn value(sid: i64, key: &str, data: &str) -> RawSubmissionRow {
        RawSubmissionRow {
            sid,
            form_key: key.to_string(),
            data: data.to_string(),
            uid: 1,
            remote_addr: "192.0.2.1".to_string(),
            submitted: 1_700_000_000 + sid,
        }
    }
}

pub mod collaborators {
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::error::{MigrateError, Result};
    use crate::models::{LegacyFieldRecord, LegacyForm, RawSubmissionRow, SubmissionRecord, TargetForm};
    use crate::settings::{LegacyEmailTemplate, LegacyFormSettings};
    use crate::source::{FormStore, LegacySource, WatermarkStore};

    #[derive(Debug, Clone)]
    pub struct LegacyFixture {
        pub form: LegacyForm,
        pub fields: Vec<LegacyFieldRecord>,
        pub settings: Option<LegacyFormSettings>,
        pub email_templates: Vec<LegacyEmailTemplate>,
        pub values: Vec<RawSubmissionRow>,
    }

    impl LegacyFixture {
        pub fn new(form: LegacyForm, fields: Vec<LegacyFieldRecord>) -> Self {
            Self {
                form,
                fields,
                settings: None,
                email_templates: Vec::new(),
                values: Vec::new(),
            }
        }

        pub fn with_values(mut self, values: Vec<RawSubmissionRow>) -> Self {
            self.values = values;
            self
        }
    }

    /// In-memory legacy source.
    #[derive(Debug, Default)]
    pub struct MemorySource {
        pub forms: Vec<LegacyFixture>,
        /// Every call fails with a connectivity error
        pub offline: bool,
    }

    impl MemorySource {
        pub fn new(forms: Vec<LegacyFixture>) -> Self {
            Self {
                forms,
                offline: false,
            }
        }

        pub fn offline() -> Self {
            Self {
                forms: Vec::new(),
                offline: true,
            }
        }

        fn fixture(&self, form: &LegacyForm) -> Result<&LegacyFixture> {
            if self.offline {
                return Err(MigrateError::connectivity("legacy database", "connection refused"));
            }
            self.forms
                .iter()
                .find(|fixture| fixture.form.nid == form.nid)
                .ok_or_else(|| MigrateError::not_found(format!("legacy form {}", form.nid)))
        }
    }

    #[async_trait]
    impl LegacySource for MemorySource {
        async fn check_connection(&self) -> Result<i64> {
            if self.offline {
                return Err(MigrateError::connectivity("legacy database", "connection refused"));
            }
            self.forms
                .first()
                .map(|fixture| fixture.form.nid)
                .ok_or_else(|| MigrateError::not_found("legacy webforms"))
        }

        async fn list_forms(&self, form_identifier: Option<i64>) -> Result<Vec<LegacyForm>> {
            if self.offline {
                return Err(MigrateError::connectivity("legacy database", "connection refused"));
            }
            Ok(self
                .forms
                .iter()
                .filter(|fixture| form_identifier.map_or(true, |nid| fixture.form.nid == nid))
                .map(|fixture| fixture.form.clone())
                .collect())
        }

        async fn form_fields(&self, form: &LegacyForm) -> Result<Vec<LegacyFieldRecord>> {
            Ok(self.fixture(form)?.fields.clone())
        }

        async fn form_settings(&self, form: &LegacyForm) -> Result<Option<LegacyFormSettings>> {
            Ok(self.fixture(form)?.settings.clone())
        }

        async fn email_templates(&self, form: &LegacyForm) -> Result<Vec<LegacyEmailTemplate>> {
            Ok(self.fixture(form)?.email_templates.clone())
        }

        async fn submission_ids(
            &self,
            form: &LegacyForm,
            after: i64,
            limit: Option<u64>,
        ) -> Result<Vec<i64>> {
            let mut ids: Vec<i64> = self
                .fixture(form)?
                .values
                .iter()
                .map(|row| row.sid)
                .filter(|&sid| sid > after)
                .collect();
            ids.sort_unstable();
            ids.dedup();
            if let Some(limit) = limit {
                ids.truncate(limit as usize);
            }
            Ok(ids)
        }

        async fn submitted_values(&self, form: &LegacyForm, after: i64) -> Result<Vec<RawSubmissionRow>> {
            Ok(self
                .fixture(form)?
                .values
                .iter()
                .filter(|row| row.sid > after)
                .cloned()
                .collect())
        }
    }

    /// In-memory target store.
    #[derive(Debug, Default)]
    pub struct MemoryStore {
        pub forms: Mutex<BTreeMap<String, TargetForm>>,
        /// (form id, legacy sid) -> record
        pub submissions: Mutex<BTreeMap<(String, i64), SubmissionRecord>>,
        pub links: Mutex<BTreeMap<i64, String>>,
        /// Submissions whose save fails with a persistence error
        pub failing_sids: Vec<i64>,
        pub fail_links: bool,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing(sids: &[i64]) -> Self {
            Self {
                failing_sids: sids.to_vec(),
                ..Self::default()
            }
        }

        pub fn form_count(&self) -> usize {
            self.forms.lock().unwrap().len()
        }

        pub fn submission_ids(&self, form_id: &str) -> Vec<i64> {
            self.submissions
                .lock()
                .unwrap()
                .keys()
                .filter(|(id, _)| id == form_id)
                .map(|(_, sid)| *sid)
                .collect()
        }
    }

    #[async_trait]
    impl FormStore for MemoryStore {
        async fn upsert_form(&self, form: &TargetForm) -> Result<()> {
            self.forms
                .lock()
                .unwrap()
                .insert(form.id.clone(), form.clone());
            Ok(())
        }

        async fn save_submission(&self, form_id: &str, submission: &SubmissionRecord) -> Result<()> {
            if self.failing_sids.contains(&submission.legacy_submission_id) {
                return Err(MigrateError::persistence(
                    "submission",
                    submission.legacy_submission_id.to_string(),
                    "UNIQUE constraint failed: webform_submissions.uuid",
                ));
            }
            self.submissions.lock().unwrap().insert(
                (form_id.to_string(), submission.legacy_submission_id),
                submission.clone(),
            );
            Ok(())
        }

        async fn delete_submissions(&self, form_id: &str) -> Result<u64> {
            let mut submissions = self.submissions.lock().unwrap();
            let before = submissions.len();
            submissions.retain(|(id, _), _| id != form_id);
            Ok((before - submissions.len()) as u64)
        }

        async fn link_content(&self, legacy_form_id: i64, form_id: &str) -> Result<()> {
            if self.fail_links {
                return Err(MigrateError::persistence(
                    "content link",
                    legacy_form_id.to_string(),
                    "no such content record",
                ));
            }
            self.links
                .lock()
                .unwrap()
                .insert(legacy_form_id, form_id.to_string());
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    pub struct MemoryWatermark {
        pub value: Mutex<i64>,
    }

    impl MemoryWatermark {
        pub fn at(value: i64) -> Self {
            Self {
                value: Mutex::new(value),
            }
        }

        pub fn get(&self) -> i64 {
            *self.value.lock().unwrap()
        }
    }

    #[async_trait]
    impl WatermarkStore for MemoryWatermark {
        async fn load(&self) -> Result<i64> {
            Ok(self.get())
        }

        async fn store(&self, last_submission_id: i64) -> Result<()> {
            *self.value.lock().unwrap() = last_submission_id;
            Ok(())
        }
    }
}
