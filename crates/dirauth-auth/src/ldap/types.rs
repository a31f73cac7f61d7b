//! LDAP bind outcome types

/// LDAP result code for a rejected bind
pub const RC_INVALID_CREDENTIALS: u32 = 49;

/// Outcome of one bind attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindResult {
    /// Directory accepted the principal and password
    Success,
    /// Directory rejected the bind, or the input never reached it
    InvalidCredentials,
    /// Connecting or talking to the directory failed
    TransportError(String),
}

impl BindResult {
    pub fn is_success(&self) -> bool {
        matches!(self, BindResult::Success)
    }

    /// Map an LDAP bind result code.
    pub fn from_rc(rc: u32) -> Self {
        match rc {
            0 => BindResult::Success,
            _ => BindResult::InvalidCredentials,
        }
    }
}
