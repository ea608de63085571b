//! Known path table for project configuration attributes.
//!
//! Each supported attribute maps to exactly one JSON pointer inside the
//! project document. No path in this table may be a strict ancestor of
//! another one (or of a hooks array path), otherwise a batch replacing the
//! ancestor would invalidate later operations under it. The tests below
//! enforce this whenever the table grows.

use crate::error::{ReconcileError, ReconcileResult};

const SELFSERVICE: &str = "/services/identity/config/selfservice";

/// One entry of the path table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub path: &'static str,
    /// Values are redacted from logs and plan output.
    pub sensitive: bool,
}

const fn field(name: &'static str, path: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        path,
        sensitive: false,
    }
}

const fn secret(name: &'static str, path: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        path,
        sensitive: true,
    }
}

/// Every attribute the engine knows how to place in the project document.
pub static FIELDS: &[FieldSpec] = &[
    // CORS
    field("cors_enabled", "/cors_public/enabled"),
    field("cors_origins", "/cors_public/origins"),
    field("cors_admin_enabled", "/cors_admin/enabled"),
    field("cors_admin_origins", "/cors_admin/origins"),
    // Sessions
    field("session_lifespan", "/services/identity/config/session/lifespan"),
    field(
        "session_cookie_persistent",
        "/services/identity/config/session/cookie/persistent",
    ),
    field(
        "session_cookie_same_site",
        "/services/identity/config/session/cookie/same_site",
    ),
    field(
        "session_whoami_required_aal",
        "/services/identity/config/session/whoami/required_aal",
    ),
    // Self-service URLs and flows
    field(
        "default_return_url",
        "/services/identity/config/selfservice/default_browser_return_url",
    ),
    field(
        "allowed_return_urls",
        "/services/identity/config/selfservice/allowed_return_urls",
    ),
    field(
        "login_ui_url",
        "/services/identity/config/selfservice/flows/login/ui_url",
    ),
    field(
        "login_lifespan",
        "/services/identity/config/selfservice/flows/login/lifespan",
    ),
    field(
        "registration_ui_url",
        "/services/identity/config/selfservice/flows/registration/ui_url",
    ),
    field(
        "enable_registration",
        "/services/identity/config/selfservice/flows/registration/enabled",
    ),
    field(
        "recovery_ui_url",
        "/services/identity/config/selfservice/flows/recovery/ui_url",
    ),
    field(
        "enable_recovery",
        "/services/identity/config/selfservice/flows/recovery/enabled",
    ),
    field(
        "recovery_use",
        "/services/identity/config/selfservice/flows/recovery/use",
    ),
    field(
        "verification_ui_url",
        "/services/identity/config/selfservice/flows/verification/ui_url",
    ),
    field(
        "enable_verification",
        "/services/identity/config/selfservice/flows/verification/enabled",
    ),
    field(
        "verification_use",
        "/services/identity/config/selfservice/flows/verification/use",
    ),
    field(
        "settings_ui_url",
        "/services/identity/config/selfservice/flows/settings/ui_url",
    ),
    field(
        "settings_required_aal",
        "/services/identity/config/selfservice/flows/settings/required_aal",
    ),
    field(
        "settings_privileged_session_max_age",
        "/services/identity/config/selfservice/flows/settings/privileged_session_max_age",
    ),
    field(
        "error_ui_url",
        "/services/identity/config/selfservice/flows/error/ui_url",
    ),
    // Password policy
    field(
        "enable_password",
        "/services/identity/config/selfservice/methods/password/enabled",
    ),
    field(
        "password_min_length",
        "/services/identity/config/selfservice/methods/password/config/min_password_length",
    ),
    field(
        "password_identifier_similarity",
        "/services/identity/config/selfservice/methods/password/config/identifier_similarity_check_enabled",
    ),
    field(
        "password_haveibeenpwned",
        "/services/identity/config/selfservice/methods/password/config/haveibeenpwned_enabled",
    ),
    field(
        "password_max_breaches",
        "/services/identity/config/selfservice/methods/password/config/max_breaches",
    ),
    // MFA and other methods
    field(
        "enable_code",
        "/services/identity/config/selfservice/methods/code/enabled",
    ),
    field(
        "enable_passwordless_code",
        "/services/identity/config/selfservice/methods/code/passwordless_enabled",
    ),
    field(
        "enable_totp",
        "/services/identity/config/selfservice/methods/totp/enabled",
    ),
    field(
        "totp_issuer",
        "/services/identity/config/selfservice/methods/totp/config/issuer",
    ),
    field(
        "enable_lookup_secret",
        "/services/identity/config/selfservice/methods/lookup_secret/enabled",
    ),
    field(
        "enable_webauthn",
        "/services/identity/config/selfservice/methods/webauthn/enabled",
    ),
    field(
        "webauthn_passwordless",
        "/services/identity/config/selfservice/methods/webauthn/config/passwordless",
    ),
    field(
        "webauthn_rp_display_name",
        "/services/identity/config/selfservice/methods/webauthn/config/rp/display_name",
    ),
    field(
        "webauthn_rp_id",
        "/services/identity/config/selfservice/methods/webauthn/config/rp/id",
    ),
    field(
        "webauthn_rp_origins",
        "/services/identity/config/selfservice/methods/webauthn/config/rp/origins",
    ),
    field(
        "enable_passkey",
        "/services/identity/config/selfservice/methods/passkey/enabled",
    ),
    field(
        "enable_profile",
        "/services/identity/config/selfservice/methods/profile/enabled",
    ),
    // SMTP courier
    secret(
        "smtp_connection_uri",
        "/services/identity/config/courier/smtp/connection_uri",
    ),
    field(
        "smtp_from_address",
        "/services/identity/config/courier/smtp/from_address",
    ),
    field(
        "smtp_from_name",
        "/services/identity/config/courier/smtp/from_name",
    ),
    field(
        "smtp_headers",
        "/services/identity/config/courier/smtp/headers",
    ),
    // OAuth2
    field(
        "oauth2_access_token_lifespan",
        "/services/oauth2/config/ttl/access_token",
    ),
    field(
        "oauth2_refresh_token_lifespan",
        "/services/oauth2/config/ttl/refresh_token",
    ),
    field(
        "oauth2_id_token_lifespan",
        "/services/oauth2/config/ttl/id_token",
    ),
    field(
        "oauth2_auth_code_lifespan",
        "/services/oauth2/config/ttl/auth_code",
    ),
    field(
        "oauth2_pkce_enforced",
        "/services/oauth2/config/oauth2/pkce/enforced",
    ),
    field(
        "oauth2_issuer_url",
        "/services/oauth2/config/urls/self/issuer",
    ),
    // Permissions
    field(
        "permission_namespaces",
        "/services/permission/config/namespaces",
    ),
];

/// Root of the self-service flows subtree, shared with the hooks paths.
pub(crate) fn selfservice_root() -> &'static str {
    SELFSERVICE
}

/// Look up a field by attribute name.
pub fn lookup(name: &str) -> Option<&'static FieldSpec> {
    FIELDS.iter().find(|spec| spec.name == name)
}

/// Field stored at exactly `path`.
pub fn lookup_path(path: &str) -> Option<&'static FieldSpec> {
    FIELDS.iter().find(|spec| spec.path == path)
}

/// Like [`lookup`], but an unknown name is a configuration error.
pub fn require(name: &str) -> ReconcileResult<&'static FieldSpec> {
    lookup(name).ok_or_else(|| ReconcileError::UnknownField(name.to_string()))
}
