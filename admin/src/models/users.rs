use derive_more::Display;
use jiff::Timestamp;
use payloads::requests::{PASSWORD_MIN_LEN, USERNAME_MIN_LEN};
use payloads::{requests, responses};
use std::str::FromStr;

use super::{changed, optional, require, validated};
use crate::error::AdminError;

/// The roles the admin distinguishes. Backend role names map through a
/// fixed table; anything unrecognized is treated as `Usuario`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Role {
    #[display("admin")]
    Admin,
    #[display("supervisor")]
    Supervisor,
    #[display("usuario")]
    Usuario,
}

const BACKEND_ROLES: &[(&str, Role)] = &[
    ("ADMIN", Role::Admin),
    ("ADMINISTRADOR", Role::Admin),
    ("SUPERVISOR", Role::Supervisor),
    ("USUARIO", Role::Usuario),
    ("USER", Role::Usuario),
];

impl Role {
    pub fn from_backend(role: &str) -> Role {
        let role = role.trim();
        BACKEND_ROLES
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(role))
            .map(|(_, mapped)| *mapped)
            .unwrap_or(Role::Usuario)
    }

    pub fn to_backend(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Supervisor => "SUPERVISOR",
            Role::Usuario => "USUARIO",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::Admin => "Administrador",
            Role::Supervisor => "Supervisor",
            Role::Usuario => "Usuario",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "supervisor" => Ok(Role::Supervisor),
            "usuario" => Ok(Role::Usuario),
            other => Err(format!("Rol desconocido: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub nombre: String,
    pub role: Role,
    pub empresa: Option<String>,
    pub telefono: Option<String>,
    pub cargo: Option<String>,
    pub is_active: bool,
    pub must_change_password: bool,
    pub last_login: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl From<responses::User> for User {
    fn from(user: responses::User) -> Self {
        Self {
            id: user.id.to_string(),
            nombre: user
                .nombre
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| user.username.clone()),
            username: user.username,
            email: user.email,
            role: Role::from_backend(&user.role),
            empresa: user.empresa,
            telefono: user.telefono,
            cargo: user.cargo,
            is_active: user.is_active,
            must_change_password: user.must_change_password,
            last_login: user.last_login,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserForm {
    pub username: String,
    pub email: String,
    /// Ignored by `to_update`.
    pub password: String,
    pub nombre: String,
    pub role: Role,
    pub empresa: String,
    pub telefono: String,
    pub cargo: String,
    pub is_active: bool,
}

impl Default for UserForm {
    fn default() -> Self {
        Self {
            username: String::new(),
            email: String::new(),
            password: String::new(),
            nombre: String::new(),
            role: Role::Usuario,
            empresa: String::new(),
            telefono: String::new(),
            cargo: String::new(),
            is_active: true,
        }
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

impl UserForm {
    pub fn from_user(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone(),
            password: String::new(),
            nombre: user.nombre.clone(),
            role: user.role,
            empresa: user.empresa.clone().unwrap_or_default(),
            telefono: user.telefono.clone().unwrap_or_default(),
            cargo: user.cargo.clone().unwrap_or_default(),
            is_active: user.is_active,
        }
    }

    fn validate_profile(&self, problems: &mut Vec<String>) {
        require(problems, "El nombre", &self.nombre);
        let email = self.email.trim();
        if email.is_empty() {
            problems.push("El correo es requerido".to_string());
        } else if !looks_like_email(email) {
            problems.push("El correo no es válido".to_string());
        }
    }

    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let username = self.username.trim();
        if username.is_empty() {
            problems.push(requests::USERNAME_REQUIRED.to_string());
        } else if username.chars().count() < USERNAME_MIN_LEN {
            problems.push(requests::USERNAME_TOO_SHORT.to_string());
        }
        if self.password.is_empty() {
            problems.push(requests::PASSWORD_REQUIRED.to_string());
        } else if self.password.chars().count() < PASSWORD_MIN_LEN {
            problems.push(requests::PASSWORD_TOO_SHORT.to_string());
        }
        self.validate_profile(&mut problems);
        problems
    }

    pub fn to_create(&self) -> Result<requests::CreateUser, AdminError> {
        validated(self.validate(), || requests::CreateUser {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            nombre: self.nombre.trim().to_string(),
            role: self.role.to_backend().to_string(),
            empresa: optional(&self.empresa),
            telefono: optional(&self.telefono),
            cargo: optional(&self.cargo),
        })
    }

    pub fn to_update(
        &self,
        original: &User,
    ) -> Result<requests::UpdateUser, AdminError> {
        let mut problems = Vec::new();
        self.validate_profile(&mut problems);
        validated(problems, || requests::UpdateUser {
            email: changed(&original.email, self.email.trim().to_string()),
            nombre: changed(&original.nombre, self.nombre.trim().to_string()),
            role: changed(&original.role, self.role)
                .map(|role| role.to_backend().to_string()),
            empresa: changed(&original.empresa, optional(&self.empresa))
                .flatten(),
            telefono: changed(&original.telefono, optional(&self.telefono))
                .flatten(),
            cargo: changed(&original.cargo, optional(&self.cargo)).flatten(),
            is_active: changed(&original.is_active, self.is_active),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use payloads::UserId;

    fn backend_user(role: &str) -> responses::User {
        responses::User {
            id: UserId(3),
            username: "jperez".into(),
            email: "jperez@ayniline.pe".into(),
            nombre: None,
            role: role.into(),
            empresa: Some("AyniLine".into()),
            telefono: None,
            cargo: None,
            is_active: true,
            must_change_password: false,
            last_login: None,
            created_at: "2025-01-01T00:00:00Z".parse().unwrap(),
        }
    }

    #[test]
    fn roles_map_through_lookup_table() {
        assert_eq!(Role::from_backend("ADMIN"), Role::Admin);
        assert_eq!(Role::from_backend("administrador"), Role::Admin);
        assert_eq!(Role::from_backend("Supervisor"), Role::Supervisor);
        assert_eq!(Role::from_backend("TECNICO"), Role::Usuario);
        assert_eq!(Role::from_backend(""), Role::Usuario);
    }

    #[test]
    fn missing_name_falls_back_to_username() {
        let user = User::from(backend_user("SUPERVISOR"));
        assert_eq!(user.id, "3");
        assert_eq!(user.nombre, "jperez");
        assert_eq!(user.role, Role::Supervisor);
    }

    #[test]
    fn create_validates_password_and_email() {
        let form = UserForm {
            username: "ana".into(),
            email: "ana-sin-arroba".into(),
            password: "123".into(),
            nombre: "Ana".into(),
            ..Default::default()
        };
        let Err(AdminError::Validation(problems)) = form.to_create() else {
            panic!("expected validation error");
        };
        assert_eq!(
            problems,
            vec![
                requests::PASSWORD_TOO_SHORT.to_string(),
                "El correo no es válido".to_string(),
            ]
        );
    }

    #[test]
    fn update_maps_role_change_to_backend_name() {
        let user = User::from(backend_user("USUARIO"));
        let form = UserForm {
            role: Role::Supervisor,
            ..UserForm::from_user(&user)
        };
        let update = form.to_update(&user).unwrap();
        assert_eq!(
            update,
            requests::UpdateUser {
                role: Some("SUPERVISOR".into()),
                ..Default::default()
            }
        );
    }
}
