//! User account management.
//!
//! Update follows the same transactional shape as products: scalar columns
//! and the role assignment set change atomically, with the optional avatar
//! handled by the image pipeline before the transaction opens.

use std::collections::HashSet;
use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use livraria_cdn::ImagePipeline;
use livraria_core::models::{
    CreateUserRequest, ResourceClass, UpdateUserRequest, UploadedImage, User, UserRecord,
};
use livraria_core::AppError;
use livraria_db::{with_transaction, RoleRepository, UserRepository};

use super::check_request;

#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
    users: UserRepository,
    roles: RoleRepository,
    pipeline: Arc<ImagePipeline>,
}

impl UserService {
    pub fn new(
        pool: PgPool,
        users: UserRepository,
        roles: RoleRepository,
        pipeline: Arc<ImagePipeline>,
    ) -> Self {
        Self {
            pool,
            users,
            roles,
            pipeline,
        }
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn create(&self, request: CreateUserRequest) -> Result<User, AppError> {
        check_request(&request)?;
        self.resolve_roles(&request.role_ids).await?;

        if self.users.email_taken(&request.email, None).await? {
            return Err(AppError::Conflict(
                "A user with this email already exists".to_string(),
            ));
        }

        let hash = bcrypt::hash(&request.password, bcrypt::DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let users = self.users.clone();
        let role_ids = request.role_ids.clone();
        let record = with_transaction(&self.pool, move |tx| {
            Box::pin(async move {
                let record = users
                    .insert_tx(tx, &request.name, &request.email, Some(&hash), None, None)
                    .await?;
                users.replace_roles_tx(tx, record.id, &role_ids).await?;
                Ok(record)
            })
        })
        .await?;

        tracing::info!(user_id = %record.id, "User created");
        self.hydrated(record.id).await
    }

    pub async fn get(&self, id: Uuid) -> Result<User, AppError> {
        self.hydrated(id).await
    }

    pub async fn list(&self) -> Result<Vec<UserRecord>, AppError> {
        self.users.list_records().await
    }

    /// Full update: scalar columns and the role set change together or not at
    /// all.
    #[tracing::instrument(skip(self, request, avatar), fields(user_id = %id))]
    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateUserRequest,
        avatar: Option<UploadedImage>,
    ) -> Result<User, AppError> {
        check_request(&request)?;

        // Root row first, then referenced entities.
        let existing = self
            .users
            .find_record(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

        self.resolve_roles(&request.role_ids).await?;

        if self.users.email_taken(&request.email, Some(id)).await? {
            return Err(AppError::Conflict(
                "A user with this email already exists".to_string(),
            ));
        }

        let new_url = self
            .pipeline
            .handle(avatar, ResourceClass::User, id, existing.image_url.as_deref())
            .await?;
        let image_url = new_url.or(existing.image_url);

        let users = self.users.clone();
        let role_ids = request.role_ids.clone();
        with_transaction(&self.pool, move |tx| {
            Box::pin(async move {
                users
                    .update_scalars_tx(tx, id, &request.name, &request.email, image_url.as_deref())
                    .await?;
                users.replace_roles_tx(tx, id, &role_ids).await?;
                Ok(())
            })
        })
        .await?;

        tracing::info!(user_id = %id, "User updated");
        self.hydrated(id).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if !self.users.delete(id).await? {
            return Err(AppError::NotFound(format!("User {} not found", id)));
        }
        Ok(())
    }

    pub async fn list_roles(&self) -> Result<Vec<livraria_core::models::Role>, AppError> {
        self.roles.list().await
    }

    async fn hydrated(&self, id: Uuid) -> Result<User, AppError> {
        self.users
            .find_hydrated(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    async fn resolve_roles(&self, role_ids: &[Uuid]) -> Result<(), AppError> {
        let found: HashSet<Uuid> = self
            .roles
            .existing_ids(role_ids)
            .await?
            .into_iter()
            .collect();
        if let Some(missing) = role_ids.iter().find(|id| !found.contains(id)) {
            return Err(AppError::NotFound(format!("Role {} not found", missing)));
        }
        Ok(())
    }
}
