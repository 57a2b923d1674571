use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{extract::Request, middleware::Next, response::Response, Router};
use chrono::{DateTime, Duration, NaiveTime, Utc};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::completion::CompletionService;
use crate::features::document_types::models::{
    ContentRule, DocumentType, NewDocumentType, UpdateDocumentType,
};
use crate::features::document_types::repositories::DocumentTypeRepository;
use crate::features::documents::models::{
    next_version, CurrentDocumentView, DocumentDraft, DocumentStatus, StudentDocument,
};
use crate::features::documents::repositories::DocumentRepository;
use crate::features::documents::DocumentService;
use crate::features::notifications::models::{NewNotification, Notification, NotificationStatus};
use crate::features::notifications::repositories::NotificationRepository;
use crate::features::notifications::NotificationCenter;
use crate::features::scheduler::models::{ScheduleSettings, SharedScheduleSettings};
use crate::features::tracking::{AuditSink, NewAuditEntry};
use crate::features::users::{DirectoryUser, Role, UserDirectory};
use crate::modules::mail::{MailTransport, OutgoingMail};
use crate::modules::storage::{normalize_key, BlobStorage, StoredBlob};

// =============================================================================
// USERS
// =============================================================================

/// A directory user registered 30 days ago
pub fn directory_user(
    name: &str,
    role: Role,
    unit_id: Option<Uuid>,
    email: Option<&str>,
) -> DirectoryUser {
    DirectoryUser {
        id: Uuid::new_v4(),
        full_name: name.to_string(),
        email: email.map(str::to_string),
        role,
        unit_id,
        active: true,
        created_at: Utc::now() - Duration::days(30),
    }
}

fn email_for(name: &str) -> String {
    format!("{}@uni.test", name.to_lowercase().replace(' ', "."))
}

#[derive(Default)]
pub struct InMemoryDirectory {
    users: Mutex<Vec<DirectoryUser>>,
}

impl InMemoryDirectory {
    pub fn add(&self, user: DirectoryUser) {
        self.users.lock().unwrap().push(user);
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<DirectoryUser>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == user_id)
            .cloned())
    }

    async fn list_active_students(&self) -> Result<Vec<DirectoryUser>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.active && u.role == Role::Student)
            .cloned()
            .collect())
    }

    async fn list_active_staff(&self, unit_id: Uuid, roles: &[Role]) -> Result<Vec<DirectoryUser>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.active && u.unit_id == Some(unit_id) && roles.contains(&u.role))
            .cloned()
            .collect())
    }
}

// =============================================================================
// DOCUMENT TYPES
// =============================================================================

#[derive(Default)]
pub struct InMemoryDocumentTypes {
    types: Mutex<Vec<DocumentType>>,
}

impl InMemoryDocumentTypes {
    fn sorted(&self, required_only: bool) -> Vec<DocumentType> {
        let mut types: Vec<DocumentType> = self
            .types
            .lock()
            .unwrap()
            .iter()
            .filter(|t| !required_only || t.required)
            .cloned()
            .collect();
        types.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then_with(|| a.name.cmp(&b.name))
        });
        types
    }
}

#[async_trait]
impl DocumentTypeRepository for InMemoryDocumentTypes {
    async fn list_all(&self) -> Result<Vec<DocumentType>> {
        Ok(self.sorted(false))
    }

    async fn list_required(&self) -> Result<Vec<DocumentType>> {
        Ok(self.sorted(true))
    }

    async fn find_by_id(&self, type_id: Uuid) -> Result<Option<DocumentType>> {
        Ok(self
            .types
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == type_id)
            .cloned())
    }

    async fn create(&self, data: &NewDocumentType) -> Result<DocumentType> {
        let mut types = self.types.lock().unwrap();
        if types.iter().any(|t| t.code == data.code) {
            return Err(AppError::Conflict(format!(
                "Document type code '{}' already exists",
                data.code
            )));
        }

        let now = Utc::now();
        let created = DocumentType {
            id: Uuid::new_v4(),
            code: data.code.clone(),
            name: data.name.clone(),
            description: data.description.clone(),
            required: data.required,
            owning_unit_id: data.owning_unit_id,
            display_order: data.display_order,
            allowed_content: data.allowed_content,
            created_at: now,
            updated_at: now,
        };
        types.push(created.clone());
        Ok(created)
    }

    async fn update(
        &self,
        type_id: Uuid,
        data: &UpdateDocumentType,
    ) -> Result<Option<DocumentType>> {
        let mut types = self.types.lock().unwrap();
        let Some(existing) = types.iter_mut().find(|t| t.id == type_id) else {
            return Ok(None);
        };

        if let Some(name) = &data.name {
            existing.name = name.clone();
        }
        if let Some(description) = &data.description {
            existing.description = Some(description.clone());
        }
        if let Some(required) = data.required {
            existing.required = required;
        }
        if let Some(unit) = data.owning_unit_id {
            existing.owning_unit_id = unit;
        }
        if let Some(order) = data.display_order {
            existing.display_order = order;
        }
        if let Some(rule) = data.allowed_content {
            existing.allowed_content = rule;
        }
        existing.updated_at = Utc::now();

        Ok(Some(existing.clone()))
    }
}

// =============================================================================
// DOCUMENTS
// =============================================================================

pub struct InMemoryDocuments {
    rows: Mutex<Vec<StudentDocument>>,
    directory: Arc<InMemoryDirectory>,
    fail_next_insert: AtomicBool,
}

impl InMemoryDocuments {
    pub fn new(directory: Arc<InMemoryDirectory>) -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            directory,
            fail_next_insert: AtomicBool::new(false),
        }
    }

    /// Make the next `create_version` fail as if the database were down
    pub fn fail_next_insert(&self) {
        self.fail_next_insert.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentRepository for InMemoryDocuments {
    async fn create_version(&self, draft: &DocumentDraft) -> Result<StudentDocument> {
        if self.fail_next_insert.swap(false, Ordering::SeqCst) {
            return Err(AppError::Internal("simulated insert failure".to_string()));
        }

        let mut rows = self.rows.lock().unwrap();
        let group = |d: &StudentDocument| {
            d.student_id == draft.student_id && d.type_id == draft.type_id
        };
        let latest = rows.iter().filter(|d| group(d)).map(|d| d.version).max();

        let now = Utc::now();
        for row in rows.iter_mut().filter(|d| group(d) && d.is_current) {
            row.is_current = false;
            row.updated_at = now;
        }

        let created = StudentDocument {
            id: Uuid::new_v4(),
            student_id: draft.student_id,
            type_id: draft.type_id,
            uploader_id: draft.uploader_id,
            content: draft.content.clone(),
            status: DocumentStatus::Pending,
            version: next_version(latest),
            is_current: true,
            remarks: draft.remarks.clone(),
            uploaded_at: now,
            updated_at: now,
        };
        rows.push(created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, document_id: Uuid) -> Result<Option<StudentDocument>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.id == document_id)
            .cloned())
    }

    async fn find_current(
        &self,
        student_id: Uuid,
        type_id: Uuid,
    ) -> Result<Option<StudentDocument>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.student_id == student_id && d.type_id == type_id && d.is_current)
            .cloned())
    }

    async fn find_all_current(&self, student_id: Uuid) -> Result<Vec<StudentDocument>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.student_id == student_id && d.is_current)
            .cloned()
            .collect())
    }

    async fn find_all_current_with_uploader(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<CurrentDocumentView>> {
        let mut views = Vec::new();
        for document in self.find_all_current(student_id).await? {
            let uploader = self.directory.find_by_id(document.uploader_id).await?;
            views.push(CurrentDocumentView {
                uploader_name: uploader.as_ref().map(|u| u.full_name.clone()),
                uploader_unit_id: uploader.and_then(|u| u.unit_id),
                document,
            });
        }
        Ok(views)
    }

    async fn version_history(
        &self,
        student_id: Uuid,
        type_id: Uuid,
    ) -> Result<Vec<StudentDocument>> {
        let mut history: Vec<StudentDocument> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.student_id == student_id && d.type_id == type_id)
            .cloned()
            .collect();
        history.sort_by(|a, b| b.version.cmp(&a.version));
        Ok(history)
    }

    async fn update_status(
        &self,
        document_id: Uuid,
        status: DocumentStatus,
        remarks: Option<&str>,
    ) -> Result<Option<StudentDocument>> {
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows.iter_mut().find(|d| d.id == document_id && d.is_current) else {
            return Ok(None);
        };

        row.status = status;
        if let Some(remarks) = remarks {
            row.remarks = Some(remarks.to_string());
        }
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn delete(&self, document_id: Uuid) -> Result<Option<StudentDocument>> {
        let mut rows = self.rows.lock().unwrap();
        let position = rows.iter().position(|d| d.id == document_id);
        Ok(position.map(|i| rows.remove(i)))
    }
}

// =============================================================================
// NOTIFICATIONS
// =============================================================================

#[derive(Default)]
pub struct InMemoryNotifications {
    rows: Mutex<Vec<Notification>>,
    failing: Mutex<HashSet<Uuid>>,
}

impl InMemoryNotifications {
    /// Every stored notification in insertion order
    pub fn all(&self) -> Vec<Notification> {
        self.rows.lock().unwrap().clone()
    }

    pub fn backdate(&self, notification_id: Uuid, created_at: DateTime<Utc>) {
        if let Some(row) = self
            .rows
            .lock()
            .unwrap()
            .iter_mut()
            .find(|n| n.id == notification_id)
        {
            row.created_at = created_at;
        }
    }

    /// Make delivery bookkeeping for one notification fail
    pub fn fail_updates_for(&self, notification_id: Uuid) {
        self.failing.lock().unwrap().insert(notification_id);
    }

    fn update<F>(&self, notification_id: Uuid, apply: F) -> Result<Notification>
    where
        F: FnOnce(&mut Notification),
    {
        if self.failing.lock().unwrap().contains(&notification_id) {
            return Err(AppError::Internal("simulated update failure".to_string()));
        }

        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|n| n.id == notification_id)
            .ok_or_else(|| AppError::NotFound(format!("Notification {}", notification_id)))?;
        apply(row);
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    /// Like `update`, but only touches rows that are still `pending`
    fn update_pending<F>(&self, notification_id: Uuid, apply: F) -> Result<Option<Notification>>
    where
        F: FnOnce(&mut Notification),
    {
        let still_pending = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .any(|n| n.id == notification_id && n.status == NotificationStatus::Pending);
        if !still_pending {
            return Ok(None);
        }
        self.update(notification_id, apply).map(Some)
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotifications {
    async fn insert(&self, data: &NewNotification) -> Result<Notification> {
        let now = Utc::now();
        let created = Notification {
            id: Uuid::new_v4(),
            recipient_id: data.recipient_id,
            sender_id: data.sender_id,
            kind: data.kind,
            title: data.title.clone(),
            body: data.body.clone(),
            status: NotificationStatus::Pending,
            metadata: data.metadata.clone(),
            scheduled_at: data.scheduled_at,
            sent_at: None,
            read_at: None,
            created_at: now,
            updated_at: now,
        };
        self.rows.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, notification_id: Uuid) -> Result<Option<Notification>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|n| n.id == notification_id)
            .cloned())
    }

    async fn mark_sent(
        &self,
        notification_id: Uuid,
        sent_at: DateTime<Utc>,
    ) -> Result<Option<Notification>> {
        self.update_pending(notification_id, |n| {
            n.status = NotificationStatus::Sent;
            n.sent_at = Some(sent_at);
        })
    }

    async fn mark_failed(
        &self,
        notification_id: Uuid,
        reason: &str,
    ) -> Result<Option<Notification>> {
        self.update_pending(notification_id, |n| {
            n.status = NotificationStatus::Failed;
            match n.metadata.as_object_mut() {
                Some(map) => {
                    map.insert("delivery_error".to_string(), reason.into());
                }
                None => n.metadata = serde_json::json!({ "delivery_error": reason }),
            }
        })
    }

    async fn mark_read(
        &self,
        notification_id: Uuid,
        read_at: DateTime<Utc>,
    ) -> Result<Option<Notification>> {
        match self.update(notification_id, |n| {
            n.status = NotificationStatus::Read;
            n.read_at = Some(read_at);
        }) {
            Ok(n) => Ok(Some(n)),
            Err(AppError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn mark_all_read(&self, recipient_id: Uuid, read_at: DateTime<Utc>) -> Result<u64> {
        let mut updated = 0;
        for row in self
            .rows
            .lock()
            .unwrap()
            .iter_mut()
            .filter(|n| n.recipient_id == recipient_id && n.status != NotificationStatus::Read)
        {
            row.status = NotificationStatus::Read;
            row.read_at = Some(read_at);
            updated += 1;
        }
        Ok(updated)
    }

    async fn find_pending_scheduled(&self, now: DateTime<Utc>) -> Result<Vec<Notification>> {
        let mut due: Vec<Notification> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|n| {
                n.status == NotificationStatus::Pending
                    && n.scheduled_at.is_some_and(|at| at <= now)
            })
            .cloned()
            .collect();
        due.sort_by_key(|n| n.scheduled_at);
        Ok(due)
    }

    async fn delete_read_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|n| !(n.status == NotificationStatus::Read && n.created_at < cutoff));
        Ok((before - rows.len()) as u64)
    }

    async fn list_for_recipient(
        &self,
        recipient_id: Uuid,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Notification>, i64)> {
        let mut matching: Vec<Notification> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.recipient_id == recipient_id)
            .filter(|n| !unread_only || n.status != NotificationStatus::Read)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }

    async fn count_unread(&self, recipient_id: Uuid) -> Result<i64> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.recipient_id == recipient_id && n.status != NotificationStatus::Read)
            .count() as i64)
    }
}

// =============================================================================
// BLOBS, MAIL, AUDIT
// =============================================================================

#[derive(Default)]
pub struct InMemoryBlobStorage {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryBlobStorage {
    pub fn paths(&self) -> Vec<String> {
        self.blobs.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl BlobStorage for InMemoryBlobStorage {
    async fn save(&self, key: &str, data: Vec<u8>, mime: &str) -> Result<StoredBlob> {
        let path = normalize_key(key)?;
        let size = data.len() as i64;
        self.blobs.lock().unwrap().insert(path.clone(), data);
        Ok(StoredBlob {
            path,
            size,
            mime: mime.to_string(),
        })
    }

    async fn delete(&self, path: &str) -> Result<bool> {
        Ok(self.blobs.lock().unwrap().remove(path).is_some())
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.blobs
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Blob {} not found", path)))
    }
}

#[derive(Debug, Clone, Copy)]
enum MailMode {
    Accept,
    Refuse,
    Unreachable,
}

pub struct FakeMailTransport {
    mode: MailMode,
    sent: Mutex<Vec<OutgoingMail>>,
}

impl FakeMailTransport {
    fn with_mode(mode: MailMode) -> Self {
        Self {
            mode,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn accepting() -> Self {
        Self::with_mode(MailMode::Accept)
    }

    pub fn refusing() -> Self {
        Self::with_mode(MailMode::Refuse)
    }

    pub fn unreachable() -> Self {
        Self::with_mode(MailMode::Unreachable)
    }

    /// Messages the transport accepted
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for FakeMailTransport {
    async fn send(&self, mail: &OutgoingMail) -> Result<bool> {
        match self.mode {
            MailMode::Accept => {
                self.sent.lock().unwrap().push(mail.clone());
                Ok(true)
            }
            MailMode::Refuse => Ok(false),
            MailMode::Unreachable => Err(AppError::Delivery("relay unreachable".to_string())),
        }
    }
}

#[derive(Default)]
pub struct RecordingAuditSink {
    entries: Mutex<Vec<NewAuditEntry>>,
    unavailable: AtomicBool,
}

impl RecordingAuditSink {
    pub fn entries(&self) -> Vec<NewAuditEntry> {
        self.entries.lock().unwrap().clone()
    }

    /// Make every following `record` call fail
    pub fn go_offline(&self) {
        self.unavailable.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl AuditSink for RecordingAuditSink {
    async fn record(&self, entry: NewAuditEntry) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }
}

// =============================================================================
// WIRED SERVICES
// =============================================================================

/// All services wired to in-memory adapters
pub struct TestContext {
    pub types: Arc<InMemoryDocumentTypes>,
    pub document_store: Arc<InMemoryDocuments>,
    pub notification_store: Arc<InMemoryNotifications>,
    pub directory: Arc<InMemoryDirectory>,
    pub blobs: Arc<InMemoryBlobStorage>,
    pub audit: Arc<RecordingAuditSink>,
    pub mail: Arc<FakeMailTransport>,
    pub notifications: Arc<NotificationCenter>,
    pub schedule_settings: SharedScheduleSettings,
    pub documents: Arc<DocumentService>,
    pub completion: Arc<CompletionService>,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    pub fn new() -> Self {
        let types = Arc::new(InMemoryDocumentTypes::default());
        let directory = Arc::new(InMemoryDirectory::default());
        let document_store = Arc::new(InMemoryDocuments::new(directory.clone()));
        let notification_store = Arc::new(InMemoryNotifications::default());
        let blobs = Arc::new(InMemoryBlobStorage::default());
        let audit = Arc::new(RecordingAuditSink::default());
        let mail = Arc::new(FakeMailTransport::accepting());

        let notifications = Arc::new(NotificationCenter::new(
            notification_store.clone(),
            directory.clone(),
            mail.clone(),
        ));
        let schedule_settings = ScheduleSettings {
            enabled: true,
            overdue_scan_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            reminder_window_days: 7,
            notify_roles: vec![Role::UnitAdmin, Role::Reviewer],
        }
        .into_shared();
        let documents = Arc::new(DocumentService::new(
            document_store.clone(),
            types.clone(),
            blobs.clone(),
            audit.clone(),
            directory.clone(),
            notifications.clone(),
            schedule_settings.clone(),
        ));
        let completion = Arc::new(CompletionService::new(
            types.clone(),
            document_store.clone(),
        ));

        Self {
            types,
            document_store,
            notification_store,
            directory,
            blobs,
            audit,
            mail,
            notifications,
            schedule_settings,
            documents,
            completion,
        }
    }

    /// The authenticated identity of a directory user
    pub fn actor(user: &DirectoryUser) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: user.id,
            role: user.role,
            unit_id: user.unit_id,
        }
    }

    pub async fn add_type(
        &self,
        code: &str,
        required: bool,
        owning_unit_id: Uuid,
        display_order: i32,
    ) -> DocumentType {
        self.add_type_with_rule(code, required, owning_unit_id, display_order, ContentRule::Any)
            .await
    }

    pub async fn add_type_with_rule(
        &self,
        code: &str,
        required: bool,
        owning_unit_id: Uuid,
        display_order: i32,
        allowed_content: ContentRule,
    ) -> DocumentType {
        self.types
            .create(&NewDocumentType {
                code: code.to_string(),
                name: code.to_uppercase(),
                description: None,
                required,
                owning_unit_id,
                display_order,
                allowed_content,
            })
            .await
            .unwrap()
    }

    pub fn add_student(&self, name: &str) -> DirectoryUser {
        let user = directory_user(name, Role::Student, None, Some(&email_for(name)));
        self.directory.add(user.clone());
        user
    }

    pub fn add_student_without_email(&self, name: &str) -> DirectoryUser {
        let user = directory_user(name, Role::Student, None, None);
        self.directory.add(user.clone());
        user
    }

    pub fn add_student_registered(&self, name: &str, created_at: DateTime<Utc>) -> DirectoryUser {
        let mut user = directory_user(name, Role::Student, None, Some(&email_for(name)));
        user.created_at = created_at;
        self.directory.add(user.clone());
        user
    }

    pub fn add_staff(&self, name: &str, role: Role, unit_id: Uuid) -> DirectoryUser {
        let user = directory_user(name, role, Some(unit_id), Some(&email_for(name)));
        self.directory.add(user.clone());
        user
    }
}

async fn inject_user_middleware(
    axum::extract::State(user): axum::extract::State<AuthenticatedUser>,
    mut request: Request,
    next: Next,
) -> Response {
    request.extensions_mut().insert(user);
    next.run(request).await
}

/// Serve `router` as if every request came from `user`
pub fn with_user(router: Router, user: AuthenticatedUser) -> Router {
    router.layer(axum::middleware::from_fn_with_state(
        user,
        inject_user_middleware,
    ))
}
