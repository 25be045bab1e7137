//! In-memory `AccountApi` that records every call.

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use shared::{
    domain::{AccountId, ApiLayout, CourseId},
    protocol::{
        AccountRecord, CourseRecord, LoginForm, NewAccount, NewCourse, PasswordChangeRequest,
    },
};

use crate::{api::AccountApi, error::ApiFailure};

struct StoredAccount {
    record: AccountRecord,
    password: String,
}

pub struct FakeAccountApi {
    layout: ApiLayout,
    accounts: Mutex<BTreeMap<String, StoredAccount>>,
    courses: Mutex<Vec<CourseRecord>>,
    calls: Mutex<Vec<&'static str>>,
    offline: AtomicBool,
}

impl FakeAccountApi {
    pub fn new(layout: ApiLayout) -> Self {
        Self {
            layout,
            accounts: Mutex::new(BTreeMap::new()),
            courses: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            offline: AtomicBool::new(false),
        }
    }

    /// Instructors layout with `prof1` / `pw` (Ada Lovelace) registered.
    pub fn with_ada() -> Self {
        let api = Self::new(ApiLayout::Instructors);
        api.insert("prof1", "pw", "Ada", "Lovelace");
        api
    }

    pub fn insert(&self, username: &str, password: &str, first_name: &str, last_name: &str) {
        let mut accounts = self.accounts.lock().expect("accounts");
        let id = AccountId(accounts.len() as i64 + 1);
        accounts.insert(
            username.to_string(),
            StoredAccount {
                record: AccountRecord {
                    id: Some(id),
                    username: username.to_string(),
                    first_name: first_name.to_string(),
                    last_name: last_name.to_string(),
                    email: None,
                },
                password: password.to_string(),
            },
        );
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().expect("calls").clone()
    }

    pub fn password_of(&self, username: &str) -> Option<String> {
        self.accounts
            .lock()
            .expect("accounts")
            .get(username)
            .map(|stored| stored.password.clone())
    }

    fn enter(&self, operation: &'static str) -> Result<(), ApiFailure> {
        self.calls.lock().expect("calls").push(operation);
        if self.offline.load(Ordering::SeqCst) {
            return Err(ApiFailure::Transport("connection refused".to_string()));
        }
        Ok(())
    }

    fn courses_supported(&self) -> Result<(), ApiFailure> {
        match self.layout {
            ApiLayout::Professors => Ok(()),
            ApiLayout::Instructors => Err(ApiFailure::Unsupported("course management")),
        }
    }
}

fn status(status: u16) -> ApiFailure {
    ApiFailure::Status {
        status,
        detail: None,
    }
}

#[async_trait]
impl AccountApi for FakeAccountApi {
    fn layout(&self) -> ApiLayout {
        self.layout
    }

    async fn list_accounts(&self) -> Result<Vec<AccountRecord>, ApiFailure> {
        self.enter("list_accounts")?;
        Ok(self
            .accounts
            .lock()
            .expect("accounts")
            .values()
            .map(|stored| stored.record.clone())
            .collect())
    }

    async fn create_account(&self, account: &NewAccount) -> Result<AccountRecord, ApiFailure> {
        self.enter("create_account")?;
        if self
            .accounts
            .lock()
            .expect("accounts")
            .contains_key(&account.username)
        {
            return Err(status(400));
        }
        self.insert(
            &account.username,
            &account.password,
            &account.first_name,
            &account.last_name,
        );
        self.fetch_record(&account.username)
    }

    async fn delete_account(&self, username: &str) -> Result<(), ApiFailure> {
        if self.layout == ApiLayout::Instructors {
            return Err(ApiFailure::Unsupported("account deletion"));
        }
        self.enter("delete_account")?;
        self.accounts
            .lock()
            .expect("accounts")
            .remove(username)
            .map(|_| ())
            .ok_or_else(|| status(404))
    }

    async fn fetch_account(&self, username: &str) -> Result<AccountRecord, ApiFailure> {
        self.enter("fetch_account")?;
        self.fetch_record(username)
    }

    async fn login(&self, form: &LoginForm) -> Result<(), ApiFailure> {
        self.enter("login")?;
        let accounts = self.accounts.lock().expect("accounts");
        match accounts.get(&form.username) {
            None => Err(status(404)),
            Some(stored) if stored.password != form.password => Err(status(401)),
            Some(_) => Ok(()),
        }
    }

    async fn change_password(
        &self,
        username: &str,
        request: &PasswordChangeRequest,
    ) -> Result<(), ApiFailure> {
        if self.layout == ApiLayout::Professors {
            return Err(ApiFailure::Unsupported("password changes"));
        }
        self.enter("change_password")?;
        let mut accounts = self.accounts.lock().expect("accounts");
        match accounts.get_mut(username) {
            Some(stored) if stored.password == request.old_password => {
                stored.password = request.new_password.clone();
                Ok(())
            }
            _ => Err(status(400)),
        }
    }

    async fn list_courses(&self) -> Result<Vec<CourseRecord>, ApiFailure> {
        self.courses_supported()?;
        self.enter("list_courses")?;
        Ok(self.courses.lock().expect("courses").clone())
    }

    async fn create_course(&self, course: &NewCourse) -> Result<CourseRecord, ApiFailure> {
        self.courses_supported()?;
        self.enter("create_course")?;
        let mut courses = self.courses.lock().expect("courses");
        if courses.iter().any(|existing| existing.code == course.code) {
            return Err(ApiFailure::Status {
                status: 400,
                detail: Some("Course code already registered".to_string()),
            });
        }
        let record = CourseRecord {
            id: Some(CourseId(courses.len() as i64 + 1)),
            code: course.code.clone(),
            name: course.name.clone(),
            professor_id: Some(course.professor_id),
        };
        courses.push(record.clone());
        Ok(record)
    }

    async fn courses_for_professor(
        &self,
        professor_id: AccountId,
    ) -> Result<Vec<CourseRecord>, ApiFailure> {
        self.courses_supported()?;
        self.enter("courses_for_professor")?;
        Ok(self
            .courses
            .lock()
            .expect("courses")
            .iter()
            .filter(|course| course.professor_id == Some(professor_id))
            .cloned()
            .collect())
    }
}

impl FakeAccountApi {
    fn fetch_record(&self, username: &str) -> Result<AccountRecord, ApiFailure> {
        self.accounts
            .lock()
            .expect("accounts")
            .get(username)
            .map(|stored| stored.record.clone())
            .ok_or_else(|| status(404))
    }
}
