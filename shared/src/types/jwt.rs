use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Claims carried in the payload segment of a backend-issued session token.
///
/// The client never verifies the signature; these fields only drive local
/// decisions (is the token still live, which kind of account is it for).
///
/// # Timestamps
/// `exp` and `iat` accept any JSON number (fractional seconds are floored).
/// A non-numeric value decodes as `None`, which the expiry check treats as
/// expired.
///
/// `sub`, `scope` and `role` decode as `None` when the backend put a
/// non-string value there; the rest of the payload still decodes.
///
/// # Role
/// The backend puts the role name in `scope` (e.g. `"USER"`). `role` is
/// read as a fallback for tokens minted by older backends.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Standard JWT subject: the account's login name.
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub sub: Option<String>,

    /// Standard JWT expiry (Unix timestamp, seconds).
    #[serde(
        default,
        deserialize_with = "numeric_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub exp: Option<i64>,

    /// Issued-at (Unix timestamp, seconds).
    #[serde(
        default,
        deserialize_with = "numeric_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub iat: Option<i64>,

    /// Role name of the account, space-padded by some backends.
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub scope: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub role: Option<String>,

    /// Everything else the backend chose to embed.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TokenClaims {
    /// Role claim with surrounding whitespace removed.
    pub fn role_claim(&self) -> Option<&str> {
        self.scope
            .as_deref()
            .or(self.role.as_deref())
            .map(str::trim)
    }

    /// True when `exp` is missing or not after `now` (seconds since epoch).
    pub fn is_expired_at(&self, now: i64) -> bool {
        match self.exp {
            Some(exp) => exp <= now,
            None => true,
        }
    }
}

fn numeric_date<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(Value::as_f64)
        .map(|secs| secs.floor() as i64))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

// ---------------------------------------------------------------------------
// Role classes
// ---------------------------------------------------------------------------

/// Kind of account a login flow is for.
///
/// Each class has two spellings: the claim value the backend signs into the
/// token (`"USER"`) and the short tag the client remembers locally
/// (`"user"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleClass {
    User,
    Employer,
    Admin,
}

impl RoleClass {
    pub const ALL: [RoleClass; 3] = [RoleClass::User, RoleClass::Employer, RoleClass::Admin];

    /// Value expected in the token's role claim.
    pub fn claim(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Employer => "EMPLOYER",
            Self::Admin => "ADMIN",
        }
    }

    /// Short tag persisted next to the token.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Employer => "employer",
            Self::Admin => "admin",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.tag() == tag)
    }

    /// Text shown when a login for this class receives a token of another class.
    pub fn mismatch_message(&self) -> &'static str {
        match self {
            Self::User => {
                "This is not a job seeker account. Please use the employer sign-in form."
            }
            Self::Employer => {
                "This is not an employer account. Please use the job seeker sign-in form."
            }
            Self::Admin => "This is not an administrator account.",
        }
    }
}

impl fmt::Display for RoleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}
