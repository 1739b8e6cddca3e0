//! # Route Guard
//!
//! The console's navigable locations and who may open them.
//!
//! ```text
//!   /, /login                       public
//!   /venta /historialVenta /alert   token required
//!   /reports /servicios /cuentas
//!   /customer/:id /Almacen
//!   /AdminPage                      token + admin
//!
//!   no token            ──► RedirectLogin { from }
//!   token, not admin    ──► RedirectHome      (admin routes only)
//! ```

use crate::session::Session;

/// A navigable location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Sales,
    SalesHistory,
    Alerts,
    Reports,
    Services,
    Accounts,
    CustomerAccount(i64),
    Warehouse,
    Admin,
}

impl Route {
    /// Parses a path. Unknown paths and non-numeric customer ids are `None`.
    pub fn parse(path: &str) -> Option<Route> {
        let path = path.trim();
        let path = if path.len() > 1 {
            path.trim_end_matches('/')
        } else {
            path
        };

        if let Some(id) = path.strip_prefix("/customer/") {
            return id.parse().ok().map(Route::CustomerAccount);
        }

        Some(match path {
            "/" | "" => Route::Home,
            "/login" => Route::Login,
            "/venta" => Route::Sales,
            "/historialVenta" => Route::SalesHistory,
            "/alert" => Route::Alerts,
            "/reports" => Route::Reports,
            "/servicios" => Route::Services,
            "/cuentas" => Route::Accounts,
            "/Almacen" => Route::Warehouse,
            "/AdminPage" => Route::Admin,
            _ => return None,
        })
    }

    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".into(),
            Route::Login => "/login".into(),
            Route::Sales => "/venta".into(),
            Route::SalesHistory => "/historialVenta".into(),
            Route::Alerts => "/alert".into(),
            Route::Reports => "/reports".into(),
            Route::Services => "/servicios".into(),
            Route::Accounts => "/cuentas".into(),
            Route::CustomerAccount(id) => format!("/customer/{}", id),
            Route::Warehouse => "/Almacen".into(),
            Route::Admin => "/AdminPage".into(),
        }
    }

    pub fn requires_auth(&self) -> bool {
        !matches!(self, Route::Home | Route::Login)
    }

    pub fn admin_only(&self) -> bool {
        matches!(self, Route::Admin)
    }
}

/// Guard outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Allow,
    /// Go to `/login`, then come back to `from`.
    RedirectLogin { from: Route },
    /// Authenticated but not an admin.
    RedirectHome,
}

/// Decides whether `session` may open `route`.
pub fn check_access(route: Route, session: &Session) -> Access {
    if !route.requires_auth() {
        return Access::Allow;
    }
    if !session.is_authenticated() {
        return Access::RedirectLogin { from: route };
    }
    if route.admin_only() && !session.is_admin {
        return Access::RedirectHome;
    }
    Access::Allow
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(token: Option<&str>, is_admin: bool) -> Session {
        Session {
            token: token.map(str::to_string),
            is_admin,
            remembered_user: None,
        }
    }

    #[test]
    fn test_parse_routes() {
        assert_eq!(Route::parse("/"), Some(Route::Home));
        assert_eq!(Route::parse("/venta/"), Some(Route::Sales));
        assert_eq!(Route::parse("/customer/42"), Some(Route::CustomerAccount(42)));
        assert_eq!(Route::parse("/customer/abc"), None);
        assert_eq!(Route::parse("/nope"), None);
        assert_eq!(Route::CustomerAccount(7).path(), "/customer/7");
    }

    #[test]
    fn test_public_routes_always_allowed() {
        let anon = session(None, false);
        assert_eq!(check_access(Route::Home, &anon), Access::Allow);
        assert_eq!(check_access(Route::Login, &anon), Access::Allow);
    }

    #[test]
    fn test_missing_token_redirects_to_login_with_origin() {
        let anon = session(None, false);
        assert_eq!(
            check_access(Route::CustomerAccount(3), &anon),
            Access::RedirectLogin {
                from: Route::CustomerAccount(3)
            }
        );
        // an empty token is no token
        assert!(matches!(
            check_access(Route::Reports, &session(Some(""), true)),
            Access::RedirectLogin { .. }
        ));
    }

    #[test]
    fn test_admin_route_needs_admin_flag() {
        assert_eq!(
            check_access(Route::Admin, &session(Some("t"), false)),
            Access::RedirectHome
        );
        assert_eq!(check_access(Route::Admin, &session(Some("t"), true)), Access::Allow);
        assert_eq!(check_access(Route::Alerts, &session(Some("t"), false)), Access::Allow);
    }
}
