//! Admin sections and who may open them.

use crate::error::AdminError;
use crate::models::Role;
use crate::state::SessionSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Dashboard,
    Users,
    Records,
    History,
    Accidents,
    Requests,
    NotFound,
}

const ROUTES: &[(&str, Route)] = &[
    ("/login", Route::Login),
    ("/usuarios", Route::Users),
    ("/registro", Route::Records),
    ("/historial", Route::History),
    ("/accidentes", Route::Accidents),
    ("/solicitudes", Route::Requests),
];

/// Which roles may open a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    Roles(&'static [Role]),
}

impl Route {
    /// Resolve a path, including nested ones like `/registro/12/editar`.
    pub fn recognize(path: &str) -> Route {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let path = path.trim_end_matches('/');
        if path.is_empty() {
            return Route::Dashboard;
        }
        ROUTES
            .iter()
            .find(|(prefix, _)| {
                path == *prefix
                    || path
                        .strip_prefix(prefix)
                        .is_some_and(|rest| rest.starts_with('/'))
            })
            .map(|(_, route)| *route)
            .unwrap_or(Route::NotFound)
    }

    pub fn path(self) -> &'static str {
        match self {
            Route::Dashboard => "/",
            Route::NotFound => "/404",
            route => ROUTES
                .iter()
                .find(|(_, r)| *r == route)
                .map(|(path, _)| *path)
                .unwrap_or("/404"),
        }
    }

    pub fn access(self) -> Access {
        match self {
            Route::Login | Route::NotFound => Access::Public,
            Route::Users => Access::Roles(&[Role::Admin]),
            Route::History => Access::Roles(&[Role::Admin, Role::Supervisor]),
            Route::Dashboard
            | Route::Records
            | Route::Accidents
            | Route::Requests => Access::Authenticated,
        }
    }

    /// Check `session` against the route's access rule.
    pub fn guard(self, session: &SessionSnapshot) -> Result<(), AdminError> {
        match self.access() {
            Access::Public => Ok(()),
            _ if !session.is_authenticated => Err(AdminError::Unauthenticated),
            Access::Authenticated => Ok(()),
            Access::Roles(roles) => match session.role() {
                Some(role) if roles.contains(&role) => Ok(()),
                _ => {
                    tracing::warn!(route = self.path(), "Access denied");
                    Err(AdminError::Forbidden)
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_paths_resolve_to_their_section() {
        assert_eq!(Route::recognize("/"), Route::Dashboard);
        assert_eq!(Route::recognize(""), Route::Dashboard);
        assert_eq!(Route::recognize("/registro/12/editar"), Route::Records);
        assert_eq!(Route::recognize("/usuarios?page=2"), Route::Users);
        assert_eq!(Route::recognize("/registros"), Route::NotFound);
        assert_eq!(Route::recognize("/nada"), Route::NotFound);
    }

    #[test]
    fn paths_round_trip() {
        for route in [Route::Login, Route::Users, Route::Requests] {
            assert_eq!(Route::recognize(route.path()), route);
        }
    }

    #[test]
    fn login_is_public_and_the_rest_need_a_session() {
        let anonymous = SessionSnapshot::default();
        assert!(Route::Login.guard(&anonymous).is_ok());
        assert!(matches!(
            Route::Records.guard(&anonymous),
            Err(AdminError::Unauthenticated)
        ));
    }
}
