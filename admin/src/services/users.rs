use payloads::{APIClient, ListQuery, Page, UserId};

use super::{one, page_of};
use crate::error::{AdminError, ErrorMessages, FORBIDDEN_MESSAGE};
use crate::models::{User, UserForm, parse_id};

pub const MESSAGES: ErrorMessages = ErrorMessages {
    not_found: "Usuario no encontrado",
    conflict: "Ya existe un usuario con ese nombre o correo",
    forbidden: FORBIDDEN_MESSAGE,
};

#[derive(Clone)]
pub struct UsersService {
    client: APIClient,
}

impl UsersService {
    pub fn new(client: APIClient) -> Self {
        Self { client }
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(
        &self,
        query: &ListQuery,
    ) -> Result<Page<User>, AdminError> {
        page_of(self.client.list_users(query).await, &MESSAGES)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<User, AdminError> {
        let id: UserId = parse_id("Usuario", id)?;
        one(self.client.get_user(id).await, &MESSAGES)
    }

    #[tracing::instrument(skip_all, fields(username = %form.username))]
    pub async fn create(&self, form: &UserForm) -> Result<User, AdminError> {
        let details = form.to_create()?;
        one(self.client.create_user(&details).await, &MESSAGES)
    }

    #[tracing::instrument(skip_all, fields(id = %original.id))]
    pub async fn update(
        &self,
        original: &User,
        form: &UserForm,
    ) -> Result<User, AdminError> {
        let id: UserId = parse_id("Usuario", &original.id)?;
        let details = form.to_update(original)?;
        one(self.client.update_user(id, &details).await, &MESSAGES)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<(), AdminError> {
        let id: UserId = parse_id("Usuario", id)?;
        self.client.delete_user(id).await.map_err(|e| MESSAGES.map(e))
    }
}
