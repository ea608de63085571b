//! External identifier of a webhook entry.
//!
//! Shape: `project_id:flow:timing:auth_method:method:url`. The auth method
//! segment is empty for hooks without one. The url comes last so that its
//! own colons survive parsing.

use std::fmt;
use std::str::FromStr;

use super::{HookKey, HookLocation};
use crate::error::{ReconcileError, ReconcileResult};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HookId {
    pub project_id: String,
    pub location: HookLocation,
    pub key: HookKey,
}

impl HookId {
    pub fn new(project_id: impl Into<String>, location: HookLocation, key: HookKey) -> Self {
        Self {
            project_id: project_id.into(),
            location,
            key,
        }
    }

    pub fn parse(id: &str) -> ReconcileResult<Self> {
        let invalid = |reason: &str| ReconcileError::InvalidHookId {
            id: id.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = id.splitn(6, ':').collect();
        if parts.len() != 6 {
            return Err(invalid("expected 6 ':'-separated parts"));
        }
        let (project_id, flow, timing, auth_method, method, url) =
            (parts[0], parts[1], parts[2], parts[3], parts[4], parts[5]);

        if project_id.is_empty() {
            return Err(invalid("project_id is empty"));
        }
        if method.is_empty() {
            return Err(invalid("method is empty"));
        }
        if url.is_empty() {
            return Err(invalid("url is empty"));
        }
        let location = HookLocation::parse(flow, timing, auth_method)
            .map_err(|err| invalid(&err.to_string()))?;

        Ok(Self::new(project_id, location, HookKey::new(url, Some(method))))
    }
}

impl fmt::Display for HookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let auth_method = self
            .location
            .auth_method()
            .map(|method| method.as_str())
            .unwrap_or_default();
        write!(
            f,
            "{}:{}:{}:{}:{}:{}",
            self.project_id,
            self.location.flow(),
            self.location.timing(),
            auth_method,
            self.key.method,
            self.key.url
        )
    }
}

impl FromStr for HookId {
    type Err = ReconcileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::{AuthMethod, Flow, Timing};

    #[test]
    fn parses_after_hook_with_url_colons() {
        let id = HookId::parse("proj-1:registration:after:password:POST:https://hooks.example.com:8443/new")
            .unwrap();
        assert_eq!(id.project_id, "proj-1");
        assert_eq!(id.location.flow(), Flow::Registration);
        assert_eq!(id.location.timing(), Timing::After);
        assert_eq!(id.location.auth_method(), Some(AuthMethod::Password));
        assert_eq!(id.key.method, "POST");
        assert_eq!(id.key.url, "https://hooks.example.com:8443/new");
    }

    #[test]
    fn formats_before_hook_with_empty_auth_segment() {
        let location = HookLocation::new(Flow::Login, Timing::Before, None).unwrap();
        let id = HookId::new("proj-1", location, HookKey::new("https://x/y", None));
        assert_eq!(id.to_string(), "proj-1:login:before::POST:https://x/y");
        assert_eq!(HookId::parse(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn rejects_short_identifiers() {
        let err = HookId::parse("proj-1:login:before:POST").unwrap_err();
        assert!(matches!(err, ReconcileError::InvalidHookId { .. }));
    }

    #[test]
    fn rejects_incomplete_after_identifier() {
        let err = HookId::parse("proj-1:login:after::POST:https://x/y").unwrap_err();
        assert!(err.to_string().contains("auth_method"));
    }
}
