use crate::config::HeaderAuthConfig;

use super::principal::Principal;
use super::request_context::RequestContext;

/// Resolves the current user of a request and knows where to send users who must log in.
pub trait AuthProvider: Send + Sync {
    fn current_user(&self, ctx: &RequestContext) -> Option<Principal>;

    fn login_url(&self, ctx: &RequestContext) -> String;
}

/// Trusts identity headers set by a fronting proxy, e.g. `X-Remote-User: nika` and
/// `X-Remote-Roles: admin, manager`. Only deploy behind a proxy that strips these
/// headers from client requests.
#[derive(Debug, Clone)]
pub struct HeaderAuth {
    user_header: String,
    roles_header: String,
    login_url: String,
}

impl HeaderAuth {
    pub fn new(cfg: &HeaderAuthConfig) -> Self {
        Self {
            user_header: cfg.user_header.to_ascii_lowercase(),
            roles_header: cfg.roles_header.to_ascii_lowercase(),
            login_url: cfg.login_url.clone(),
        }
    }
}

impl AuthProvider for HeaderAuth {
    fn current_user(&self, ctx: &RequestContext) -> Option<Principal> {
        let user = ctx.header(&self.user_header).map(str::trim).filter(|u| !u.is_empty())?;
        let roles = ctx
            .header(&self.roles_header)
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim())
                    .filter(|s| !s.is_empty())
                    .map(|s| s.to_string())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        Some(Principal::new(user).with_roles(roles))
    }

    fn login_url(&self, _ctx: &RequestContext) -> String {
        self.login_url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn ctx_with(headers: &[(&'static str, &'static str)]) -> RequestContext {
        let mut ctx = RequestContext::default();
        for (k, v) in headers {
            ctx.headers.insert(*k, HeaderValue::from_static(*v));
        }
        ctx
    }

    #[test]
    fn reads_user_and_roles_from_headers() {
        let auth = HeaderAuth::new(&HeaderAuthConfig::default());
        let ctx = ctx_with(&[("x-remote-user", "nika"), ("x-remote-roles", "admin, manager,,")]);
        let p = auth.current_user(&ctx).unwrap();
        assert_eq!(p.user_id, "nika");
        assert_eq!(p.roles, vec!["admin", "manager"]);
        assert_eq!(auth.login_url(&ctx), "/auth/login");
    }

    #[test]
    fn missing_or_blank_user_header_is_anonymous() {
        let auth = HeaderAuth::new(&HeaderAuthConfig::default());
        assert!(auth.current_user(&ctx_with(&[("x-remote-roles", "admin")])).is_none());
        assert!(auth.current_user(&ctx_with(&[("x-remote-user", "  ")])).is_none());
    }
}
