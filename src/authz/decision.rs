use std::fmt;

use serde::Serialize;

/// Why a request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    AuthenticationRequired,
    NoRoleAssigned,
    RoleLacksCapability,
    NoTargetToOwn,
    NotTheOwner,
    SelfTargetNotPermitted,
    ResourceNotFound,
    ActionNotSupported,
    NoPolicyRegistered,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::AuthenticationRequired => "authentication required",
            DenyReason::NoRoleAssigned => "no role assigned",
            DenyReason::RoleLacksCapability => "role lacks capability",
            DenyReason::NoTargetToOwn => "no target to own",
            DenyReason::NotTheOwner => "not the owner",
            DenyReason::SelfTargetNotPermitted => "self-target not permitted",
            DenyReason::ResourceNotFound => "resource not found",
            DenyReason::ActionNotSupported => "action not supported",
            DenyReason::NoPolicyRegistered => "no policy registered",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one evaluation. Computed per request, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "reason", rename_all = "lowercase")]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// `Allow` if either side allows; otherwise keeps the first denial.
    pub fn or(self, other: Decision) -> Decision {
        match (self, other) {
            (Decision::Allow, _) | (_, Decision::Allow) => Decision::Allow,
            (first, _) => first,
        }
    }

    pub fn allow_if(condition: bool, reason: DenyReason) -> Decision {
        if condition {
            Decision::Allow
        } else {
            Decision::Deny(reason)
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Allow => f.write_str("allow"),
            Decision::Deny(reason) => write!(f, "deny ({reason})"),
        }
    }
}
