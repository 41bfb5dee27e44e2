use crate::{
    auth::{
        ensure_email_free, hash_password, unique_violation_as_conflict,
        user::{self, UserRole},
        UserResponse,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    repositories::{PageRequest, TransactionRepository, UserRepository},
};
use chrono::Utc;
use sea_orm::{DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 6, max = 128, message = "Password must be at least 6 characters"))]
    pub password: String,
    pub role: UserRole,
}

/// Partial update; absent fields keep their value
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: Option<String>,
    pub role: Option<UserRole>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUserRoleRequest {
    pub role: UserRole,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub role: Option<UserRole>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPage {
    pub users: Vec<UserResponse>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

/// Back-office account management
#[derive(Clone)]
pub struct UserService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    users: UserRepository,
    transactions: TransactionRepository,
}

impl UserService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db,
            event_sender,
            users: UserRepository,
            transactions: TransactionRepository,
        }
    }

    /// Creates an account with any role
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn create_user(&self, request: CreateUserRequest) -> Result<UserResponse, ServiceError> {
        request.validate()?;
        let email = request.email.trim().to_lowercase();
        ensure_email_free(&self.users, &*self.db, &email, Uuid::nil()).await?;

        let password_hash = hash_password(request.password).await?;
        let now = Utc::now();
        let created = self
            .users
            .create(
                &*self.db,
                user::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    name: Set(request.name.trim().to_string()),
                    email: Set(email.clone()),
                    password_hash: Set(password_hash),
                    role: Set(request.role),
                    created_at: Set(now),
                    updated_at: Set(now),
                },
            )
            .await
            .map_err(|e| unique_violation_as_conflict(e, &email))?;

        self.event_sender
            .send_or_log(Event::UserCreated(created.id))
            .await;
        info!(user_id = %created.id, role = ?created.role, "User created by admin");

        Ok(created.into())
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, id: Uuid) -> Result<UserResponse, ServiceError> {
        self.find(id).await.map(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn list_users(&self, query: UserListQuery) -> Result<UserPage, ServiceError> {
        let page = PageRequest::new(query.page, query.limit);
        let (rows, total) = self.users.list(&*self.db, query.role, page).await?;

        Ok(UserPage {
            users: rows.into_iter().map(Into::into).collect(),
            total,
            page: page.page,
            limit: page.limit,
        })
    }

    #[instrument(skip(self, request))]
    pub async fn update_user(
        &self,
        id: Uuid,
        request: UpdateUserRequest,
    ) -> Result<UserResponse, ServiceError> {
        request.validate()?;
        let existing = self.find(id).await?;
        let mut active: user::ActiveModel = existing.into();

        if let Some(name) = request.name {
            active.name = Set(name.trim().to_string());
        }
        let mut email = None;
        if let Some(raw) = request.email {
            let normalized = raw.trim().to_lowercase();
            ensure_email_free(&self.users, &*self.db, &normalized, id).await?;
            active.email = Set(normalized.clone());
            email = Some(normalized);
        }
        if let Some(role) = request.role {
            active.role = Set(role);
        }
        active.updated_at = Set(Utc::now());

        let updated = self
            .users
            .update(&*self.db, active)
            .await
            .map_err(|e| unique_violation_as_conflict(e, email.as_deref().unwrap_or_default()))?;

        self.event_sender
            .send_or_log(Event::UserUpdated(updated.id))
            .await;
        info!(user_id = %id, "User updated by admin");

        Ok(updated.into())
    }

    #[instrument(skip(self))]
    pub async fn update_user_role(
        &self,
        id: Uuid,
        request: UpdateUserRoleRequest,
    ) -> Result<UserResponse, ServiceError> {
        let existing = self.find(id).await?;
        let old_role = existing.role;

        let mut active: user::ActiveModel = existing.into();
        active.role = Set(request.role);
        active.updated_at = Set(Utc::now());
        let updated = self.users.update(&*self.db, active).await?;

        self.event_sender
            .send_or_log(Event::UserUpdated(updated.id))
            .await;
        info!(user_id = %id, ?old_role, new_role = ?updated.role, "User role changed");

        Ok(updated.into())
    }

    /// Removes an account and its cart. Accounts with transaction history
    /// are kept, and an admin cannot remove their own account.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, actor_id: Uuid, id: Uuid) -> Result<(), ServiceError> {
        if actor_id == id {
            warn!(user_id = %id, "Admin attempted to delete their own account");
            return Err(ServiceError::Forbidden(
                "admins cannot delete their own account".to_string(),
            ));
        }

        self.find(id).await?;
        if self.transactions.count_by_user(&*self.db, id).await? > 0 {
            return Err(ServiceError::Conflict(
                "user has transactions and cannot be deleted".to_string(),
            ));
        }

        if !self.users.delete(&*self.db, id).await? {
            return Err(user_not_found(id));
        }

        self.event_sender.send_or_log(Event::UserDeleted(id)).await;
        info!(user_id = %id, "User deleted");
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<user::Model, ServiceError> {
        self.users
            .find_by_id(&*self.db, id)
            .await?
            .ok_or_else(|| user_not_found(id))
    }
}

fn user_not_found(id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("user {} not found", id))
}
