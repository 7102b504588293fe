/// Route guards for the single-page frontend
///
/// The frontend's entry routes are guarded server-side before `index.html` is
/// served. A visitor is in one of three states:
///
/// ```text
///              login                 role in ADMIN_ROLES
/// Anonymous ─────────> Authenticated ───────────────────> Admin
/// ```
///
/// | Route kind      | Anonymous                     | Authenticated  | Admin |
/// |-----------------|-------------------------------|----------------|-------|
/// | requires auth   | `/auth/login`, remember path  | allow          | allow |
/// | requires admin  | `/auth/login`, remember path  | `/dashboard`   | allow |
/// | guest only      | allow                         | `/dashboard`   | `/dashboard` |
/// | anything else   | allow                         | allow          | allow |
///
/// The remembered path is used once, on the first guarded request after
/// login, and then cleared.

use crate::models::user::User;

pub const LOGIN_PATH: &str = "/auth/login";
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Cookie holding the path to return to after login
pub const REDIRECT_COOKIE: &str = "redirect_after_login";

/// Who is asking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visitor {
    Anonymous,
    Authenticated,
    Admin,
}

impl Visitor {
    pub fn from_user(user: Option<&User>) -> Self {
        match user {
            None => Visitor::Anonymous,
            Some(u) if u.role().is_admin() => Visitor::Admin,
            Some(_) => Visitor::Authenticated,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Visitor::Anonymous)
    }
}

/// Access rule attached to a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    Public,
    GuestOnly,
    RequiresAuth,
    RequiresAdmin,
}

/// Guarded routes. A trailing `/*` matches the prefix and everything below it.
pub const ROUTES: &[(&str, Guard)] = &[
    ("/dashboard", Guard::RequiresAuth),
    ("/account", Guard::RequiresAuth),
    ("/announcements", Guard::RequiresAuth),
    ("/store/add-credits", Guard::RequiresAuth),
    ("/admin/*", Guard::RequiresAdmin),
    ("/auth/login", Guard::GuestOnly),
    ("/auth/register", Guard::GuestOnly),
];

fn normalize(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

/// Looks up the guard for a path
pub fn guard_for(path: &str) -> Guard {
    let path = normalize(path);

    ROUTES
        .iter()
        .find(|(pattern, _)| match pattern.strip_suffix("/*") {
            Some(prefix) => path == prefix || path.starts_with(&format!("{}/", prefix)),
            None => path == *pattern,
        })
        .map(|(_, guard)| *guard)
        .unwrap_or(Guard::Public)
}

/// Whether a stored path is safe to redirect to
///
/// Only same-origin absolute paths qualify; `//host` and backslash tricks are
/// rejected so the cookie can't be turned into an open redirect.
pub fn is_safe_redirect(path: &str) -> bool {
    path.starts_with('/')
        && !path.starts_with("//")
        && !path.contains('\\')
        && !path.chars().any(char::is_control)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Redirect(String),
}

/// Result of guarding one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub decision: Decision,

    /// Path to remember for after login
    pub store_redirect: Option<String>,

    /// Whether the remembered path should be cleared
    pub clear_redirect: bool,
}

impl Navigation {
    fn allow() -> Self {
        Self {
            decision: Decision::Allow,
            store_redirect: None,
            clear_redirect: false,
        }
    }

    fn redirect(to: &str) -> Self {
        Self {
            decision: Decision::Redirect(to.to_string()),
            store_redirect: None,
            clear_redirect: false,
        }
    }
}

/// Decides what happens when `visitor` navigates to `path`
pub fn resolve(path: &str, visitor: Visitor, stored_redirect: Option<&str>) -> Navigation {
    let guard = guard_for(path);
    let current = normalize(path);

    if visitor.is_authenticated() && guard != Guard::Public {
        if let Some(stored) = stored_redirect {
            let target = normalize(stored);
            let mut nav = if is_safe_redirect(stored) && target != current {
                Navigation::redirect(target)
            } else {
                resolve(path, visitor, None)
            };
            nav.clear_redirect = true;
            return nav;
        }
    }

    match (guard, visitor) {
        (Guard::Public, _) => Navigation::allow(),

        (Guard::RequiresAuth | Guard::RequiresAdmin, Visitor::Anonymous) => {
            let mut nav = Navigation::redirect(LOGIN_PATH);
            if is_safe_redirect(path) {
                nav.store_redirect = Some(path.to_string());
            }
            nav
        }

        (Guard::RequiresAdmin, Visitor::Authenticated) => Navigation::redirect(DASHBOARD_PATH),

        (Guard::GuestOnly, Visitor::Authenticated | Visitor::Admin) => {
            Navigation::redirect(DASHBOARD_PATH)
        }

        _ => Navigation::allow(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_table() {
        assert_eq!(guard_for("/dashboard"), Guard::RequiresAuth);
        assert_eq!(guard_for("/dashboard/"), Guard::RequiresAuth);
        assert_eq!(guard_for("/store/add-credits"), Guard::RequiresAuth);
        assert_eq!(guard_for("/admin"), Guard::RequiresAdmin);
        assert_eq!(guard_for("/admin/settings"), Guard::RequiresAdmin);
        assert_eq!(guard_for("/administrator"), Guard::Public);
        assert_eq!(guard_for("/auth/register"), Guard::GuestOnly);
        assert_eq!(guard_for("/"), Guard::Public);
        assert_eq!(guard_for("/leaderboard"), Guard::Public);
    }

    #[test]
    fn test_anonymous_is_sent_to_login_with_memory() {
        let nav = resolve("/admin/settings", Visitor::Anonymous, None);
        assert_eq!(nav.decision, Decision::Redirect(LOGIN_PATH.to_string()));
        assert_eq!(nav.store_redirect.as_deref(), Some("/admin/settings"));

        let nav = resolve("/account", Visitor::Anonymous, None);
        assert_eq!(nav.store_redirect.as_deref(), Some("/account"));

        assert_eq!(resolve("/auth/login", Visitor::Anonymous, None), Navigation::allow());
    }

    #[test]
    fn test_member_kept_out_of_admin() {
        let nav = resolve("/admin", Visitor::Authenticated, None);
        assert_eq!(nav.decision, Decision::Redirect(DASHBOARD_PATH.to_string()));
        assert!(nav.store_redirect.is_none());

        assert_eq!(resolve("/admin", Visitor::Admin, None), Navigation::allow());
        assert_eq!(resolve("/dashboard", Visitor::Authenticated, None), Navigation::allow());
    }

    #[test]
    fn test_guest_pages_bounce_signed_in_users() {
        for visitor in [Visitor::Authenticated, Visitor::Admin] {
            let nav = resolve("/auth/login", visitor, None);
            assert_eq!(nav.decision, Decision::Redirect(DASHBOARD_PATH.to_string()));
        }
    }

    #[test]
    fn test_stored_redirect_consumed_once() {
        let nav = resolve("/dashboard", Visitor::Admin, Some("/admin/settings"));
        assert_eq!(nav.decision, Decision::Redirect("/admin/settings".to_string()));
        assert!(nav.clear_redirect);

        // Arriving at the stored target also clears it
        let nav = resolve("/admin/settings", Visitor::Admin, Some("/admin/settings"));
        assert_eq!(nav.decision, Decision::Allow);
        assert!(nav.clear_redirect);

        // Next request has no cookie and proceeds normally
        assert_eq!(resolve("/dashboard", Visitor::Admin, None), Navigation::allow());
    }

    #[test]
    fn test_unsafe_stored_redirect_dropped() {
        let nav = resolve("/auth/login", Visitor::Authenticated, Some("//evil.example.com"));
        assert_eq!(nav.decision, Decision::Redirect(DASHBOARD_PATH.to_string()));
        assert!(nav.clear_redirect);
    }

    #[test]
    fn test_is_safe_redirect() {
        assert!(is_safe_redirect("/account"));
        assert!(!is_safe_redirect("https://evil.example.com"));
        assert!(!is_safe_redirect("//evil.example.com"));
        assert!(!is_safe_redirect("/\\evil.example.com"));
        assert!(!is_safe_redirect(""));
    }

    #[test]
    fn test_visitor_from_user() {
        use crate::auth::authorization::Role;

        assert_eq!(Visitor::from_user(None), Visitor::Anonymous);
        assert_eq!(Visitor::from_user(Some(&User::new("a", Role::Vip))), Visitor::Authenticated);
        assert_eq!(Visitor::from_user(Some(&User::new("b", Role::Owner))), Visitor::Admin);
    }
}
