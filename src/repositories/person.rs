//! # Person Repository

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use super::{Page, require_text};
use crate::error::RepositoryError;
use crate::models::person::{self, ActiveModel as PersonActiveModel, Entity as Person};

#[derive(Debug, Clone)]
pub struct CreatePerson {
    pub name: String,
    pub email: String,
    pub role: String,
    pub position: Option<String>,
    pub phone: Option<String>,
}

pub struct PersonRepository<'a, C> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> PersonRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Creates a person; the email is unique among live people of the tenant.
    pub async fn create(
        &self,
        tenant_id: Uuid,
        request: CreatePerson,
        now: DateTime<Utc>,
    ) -> Result<person::Model, RepositoryError> {
        require_text("name", &request.name)?;
        require_text("email", &request.email)?;
        if !request.email.contains('@') {
            return Err(RepositoryError::Validation(
                "email must be a valid address".to_string(),
            ));
        }
        let role = if request.role.trim().is_empty() {
            "staff".to_string()
        } else {
            request.role.trim().to_string()
        };

        PersonActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            name: Set(request.name.trim().to_string()),
            email: Set(request.email.trim().to_ascii_lowercase()),
            role: Set(role),
            position: Set(request.position),
            phone: Set(request.phone),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            deleted_at: Set(None),
        }
        .insert(self.db)
        .await
        .map_err(RepositoryError::database_error)
    }

    pub async fn get(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<person::Model>, RepositoryError> {
        Person::find_by_id(id)
            .filter(person::Column::TenantId.eq(tenant_id))
            .filter(person::Column::DeletedAt.is_null())
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        page: Page,
    ) -> Result<Vec<person::Model>, RepositoryError> {
        Person::find()
            .filter(person::Column::TenantId.eq(tenant_id))
            .filter(person::Column::DeletedAt.is_null())
            .order_by_asc(person::Column::Name)
            .order_by_asc(person::Column::Id)
            .limit(page.limit)
            .offset(page.offset)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }
}
