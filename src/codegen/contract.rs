//! Route contracts shared by the endpoint and client writers. Both sides of
//! an operation are rendered from the same [`RouteContract`], which keeps the
//! route template and the authentication requirement in lock step.

use crate::codegen::directives::Directive;
use crate::settings::ApiSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpVerb {
    Get,
    Post,
}

impl HttpVerb {
    pub fn server_attribute(self) -> &'static str {
        match self {
            HttpVerb::Get => "HttpGet",
            HttpVerb::Post => "HttpPost",
        }
    }

    pub fn client_attribute(self) -> &'static str {
        match self {
            HttpVerb::Get => "Get",
            HttpVerb::Post => "Post",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Body,
    Query,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// No authorization attribute.
    Open,
    /// Explicitly exempt from an authorization requirement.
    Anonymous,
    /// Authenticated callers, restricted to any of `roles` when non-empty.
    Authenticated { roles: Vec<String> },
}

impl Access {
    pub fn requires_token(&self) -> bool {
        matches!(self, Access::Authenticated { .. })
    }

    /// Server-side attributes expressing the requirement.
    pub fn attributes(&self) -> Vec<String> {
        match self {
            Access::Open => Vec::new(),
            Access::Anonymous => vec!["AllowAnonymous".to_string()],
            Access::Authenticated { roles } if roles.is_empty() => vec!["Authorize".to_string()],
            Access::Authenticated { roles } => roles
                .iter()
                .map(|r| format!("Authorize(Roles = \"{}\")", r))
                .collect(),
        }
    }
}

pub const BEARER_HEADER: &str = "Authorization: Bearer";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteContract {
    pub verb: HttpVerb,
    pub template: String,
    /// Endpoint action and client method name.
    pub action: String,
    pub service_method: String,
    pub binding: Binding,
    pub access: Access,
    pub request_type: String,
    pub response_type: String,
    /// Whether the service call receives the caller's user context.
    pub passes_current_user: bool,
}

fn template(api: &ApiSettings, controller: &str, action: &str) -> String {
    format!(
        "{}/{}/{}",
        api.route_prefix.trim_end_matches('/'),
        controller,
        action.trim_end_matches("Async")
    )
}

/// Contract of the endpoint generated for `directive`, if it declares one.
pub fn route_contract(api: &ApiSettings, directive: &Directive<'_>) -> Option<RouteContract> {
    let endpoint = directive.op.endpoint.as_ref()?;
    let handler = directive.kind.is_handler();
    let (verb, action, binding) = if handler {
        (HttpVerb::Post, "PostAsync", Binding::Body)
    } else {
        (HttpVerb::Get, "GetAsync", Binding::Query)
    };
    let access = if endpoint.authentication_required {
        Access::Authenticated {
            roles: endpoint.permissions.clone(),
        }
    } else {
        Access::Open
    };
    Some(RouteContract {
        verb,
        template: template(api, &directive.route_segment(), action),
        action: action.to_string(),
        service_method: directive.service_method(),
        binding,
        access,
        request_type: directive.request_type(),
        response_type: directive.response_type(),
        passes_current_user: handler,
    })
}

/// A fixed account operation exposed by the identity controller.
#[derive(Debug, Clone, Copy)]
pub struct AuthOperation {
    /// Stem of the request/response type names.
    pub name: &'static str,
    pub action: &'static str,
    pub request_fields: &'static [&'static str],
    pub response_fields: &'static [&'static str],
    pub anonymous: bool,
}

impl AuthOperation {
    pub fn request_type(&self) -> String {
        format!("{}Request", self.name)
    }

    pub fn response_type(&self) -> String {
        format!("{}Response", self.name)
    }
}

pub const IDENTITY_CONTROLLER: &str = "ApplicationUserController";
pub const IDENTITY_CLIENT: &str = "IApplicationUserClient";
const IDENTITY_SEGMENT: &str = "ApplicationUser";

pub const AUTH_OPERATIONS: [AuthOperation; 5] = [
    AuthOperation {
        name: "ApplicationUserInsert",
        action: "InsertApplicationUserAsync",
        request_fields: &["Name", "Email", "Password"],
        response_fields: &[],
        anonymous: true,
    },
    AuthOperation {
        name: "Login",
        action: "LoginAsync",
        request_fields: &["Email", "Password"],
        response_fields: &["Token", "RefreshToken"],
        anonymous: true,
    },
    AuthOperation {
        name: "RefreshToken",
        action: "RefreshTokenAsync",
        request_fields: &["Token", "RefreshToken"],
        response_fields: &["Token", "RefreshToken"],
        anonymous: false,
    },
    AuthOperation {
        name: "Logout",
        action: "LogoutAsync",
        request_fields: &[],
        response_fields: &[],
        anonymous: false,
    },
    AuthOperation {
        name: "ChangePassword",
        action: "ChangePasswordAsync",
        request_fields: &["CurrentPassword", "NewPassword"],
        response_fields: &[],
        anonymous: false,
    },
];

pub fn auth_contract(api: &ApiSettings, op: &AuthOperation) -> RouteContract {
    RouteContract {
        verb: HttpVerb::Post,
        template: template(api, IDENTITY_SEGMENT, op.action),
        action: op.action.to_string(),
        service_method: op.action.to_string(),
        binding: Binding::Body,
        access: if op.anonymous {
            Access::Anonymous
        } else {
            Access::Authenticated { roles: Vec::new() }
        },
        request_type: op.request_type(),
        response_type: op.response_type(),
        passes_current_user: !op.anonymous,
    }
}
