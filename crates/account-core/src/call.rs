//! Calls owned by an account
//!
//! A [`Call`] is a handle to one signaling dialog. It carries the
//! engine-assigned [`CallId`], the identity of the owning account (a
//! non-owning back-reference) and forwards call-control commands to the
//! protocol engine. Calls are cheap to clone; every clone refers to the same
//! dialog.
//!
//! [`CallerInfo`] is derived on demand from the engine's description of the
//! remote party and is never stored on the call.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::{ProtocolEngine, RemoteParty, SIP_RINGING};
use crate::error::{AccountError, AccountResult};
use crate::identity::AccountIdentity;

/// Engine-assigned call identifier
///
/// Unique per account while the call is active; the engine may reuse it once
/// the dialog has ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CallId(pub u32);

impl std::fmt::Display for CallId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for CallId {
    fn from(id: u32) -> Self {
        CallId(id)
    }
}

/// Direction of a call relative to the account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallDirection {
    /// Placed by this account
    Outgoing,
    /// Received by this account
    Incoming,
}

/// Caller display name and URI
///
/// Either field may be empty when the remote party did not provide it.
///
/// # Examples
///
/// ```rust
/// use rvoip_account_core::CallerInfo;
///
/// let info = CallerInfo::parse("\"Alice Smith\" <sip:alice@example.com>;tag=1928");
/// assert_eq!(info.display_name, "Alice Smith");
/// assert_eq!(info.remote_uri, "sip:alice@example.com");
///
/// let bare = CallerInfo::parse("sip:carol@example.com");
/// assert_eq!(bare.display_name, "");
/// assert_eq!(bare.remote_uri, "sip:carol@example.com");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerInfo {
    /// Display name of the remote party
    pub display_name: String,
    /// Bare SIP URI of the remote party
    pub remote_uri: String,
}

impl CallerInfo {
    /// Extract caller info from a SIP name-addr or addr-spec
    ///
    /// Supported forms:
    /// - `"Alice Smith" <sip:alice@example.com>`
    /// - `Alice Smith <sip:alice@example.com>`
    /// - `sip:alice@example.com`
    ///
    /// A quoted display name may contain `<`, `>` and `\"` escapes. Header
    /// parameters after the URI are dropped.
    pub fn parse(name_addr: &str) -> Self {
        let name_addr = name_addr.trim();
        let (quoted_name, rest) = match split_quoted_string(name_addr) {
            Some((name, rest)) => (Some(name), rest),
            None => (None, name_addr),
        };

        if let Some(open) = rest.find('<') {
            let uri_part = &rest[open + 1..];
            let remote_uri = match uri_part.find('>') {
                Some(close) => &uri_part[..close],
                None => uri_part,
            };
            let display_name = match quoted_name {
                Some(name) => name.trim().to_string(),
                None => rest[..open].trim().trim_matches('"').trim().to_string(),
            };
            return Self {
                display_name,
                remote_uri: remote_uri.trim().to_string(),
            };
        }

        let remote_uri = match rest.find(';') {
            Some(params) => &rest[..params],
            None => rest,
        };
        Self {
            display_name: quoted_name.map(|name| name.trim().to_string()).unwrap_or_default(),
            remote_uri: remote_uri.trim().to_string(),
        }
    }

    /// Caller info for the remote party the engine reports
    pub fn from_remote_party(party: &RemoteParty) -> Self {
        Self::parse(&party.remote_uri)
    }
}

/// Split a leading quoted-string off `input`, unescaping `\"` and `\\`
///
/// Returns `None` when `input` does not start with a terminated quoted-string.
fn split_quoted_string(input: &str) -> Option<(String, &str)> {
    let body = input.strip_prefix('"')?;
    let mut name = String::new();
    let mut chars = body.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                if let Some((_, escaped)) = chars.next() {
                    name.push(escaped);
                }
            }
            '"' => return Some((name, &body[i + 1..])),
            _ => name.push(c),
        }
    }
    None
}

/// One signaling dialog of an account
#[derive(Clone)]
pub struct Call {
    id: CallId,
    direction: CallDirection,
    account: AccountIdentity,
    created_at: DateTime<Utc>,
    engine: Arc<dyn ProtocolEngine>,
}

impl std::fmt::Debug for Call {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Call")
            .field("id", &self.id)
            .field("direction", &self.direction)
            .field("account", &self.account.id_uri())
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl Call {
    pub(crate) fn new(
        id: CallId,
        direction: CallDirection,
        account: AccountIdentity,
        engine: Arc<dyn ProtocolEngine>,
    ) -> Self {
        Self {
            id,
            direction,
            account,
            created_at: Utc::now(),
            engine,
        }
    }

    /// Engine-assigned call id
    pub fn id(&self) -> CallId {
        self.id
    }

    /// Whether the call was placed or received by the account
    pub fn direction(&self) -> CallDirection {
        self.direction
    }

    /// Identity of the owning account
    pub fn account(&self) -> &AccountIdentity {
        &self.account
    }

    /// When the account learned about the call
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Answer the INVITE with the given status code
    pub async fn answer(&self, status_code: u16) -> AccountResult<()> {
        self.engine.answer(self.id, status_code).await?;
        Ok(())
    }

    /// Send 180 Ringing
    pub async fn ring(&self) -> AccountResult<()> {
        self.answer(SIP_RINGING).await
    }

    /// Reject the INVITE as busy
    pub async fn decline(&self) -> AccountResult<()> {
        self.engine.decline(self.id).await?;
        Ok(())
    }

    /// Terminate the dialog
    pub async fn hang_up(&self) -> AccountResult<()> {
        self.engine.hangup(self.id).await?;
        Ok(())
    }

    /// Look up the caller's display name and URI
    pub async fn caller_info(&self) -> AccountResult<CallerInfo> {
        let party = self
            .engine
            .remote_party(self.id)
            .await
            .map_err(|e| AccountError::CallerInfoUnavailable {
                call_id: self.id,
                reason: e.to_string(),
            })?;
        Ok(CallerInfo::from_remote_party(&party))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quoted_display_name() {
        let info = CallerInfo::parse("\"Alice Smith\" <sip:alice@example.com>");
        assert_eq!(info.display_name, "Alice Smith");
        assert_eq!(info.remote_uri, "sip:alice@example.com");
    }

    #[test]
    fn test_parse_unquoted_display_name() {
        let info = CallerInfo::parse("Bob Jones <sip:bob@example.com;transport=tcp>;tag=abc");
        assert_eq!(info.display_name, "Bob Jones");
        assert_eq!(info.remote_uri, "sip:bob@example.com;transport=tcp");
    }

    #[test]
    fn test_parse_angle_brackets_without_name() {
        let info = CallerInfo::parse("<sip:carol@example.com>");
        assert_eq!(info.display_name, "");
        assert_eq!(info.remote_uri, "sip:carol@example.com");
    }

    #[test]
    fn test_parse_addr_spec_drops_header_params() {
        let info = CallerInfo::parse("  sip:dave@example.com;tag=xyz ");
        assert_eq!(info.display_name, "");
        assert_eq!(info.remote_uri, "sip:dave@example.com");
    }

    #[test]
    fn test_parse_quoted_name_containing_angle_brackets() {
        let info = CallerInfo::parse("\"Support <24h>\" <sip:help@example.com>");
        assert_eq!(info.display_name, "Support <24h>");
        assert_eq!(info.remote_uri, "sip:help@example.com");

        let info = CallerInfo::parse("\"a > b\" <sip:x@example.com>;tag=1");
        assert_eq!(info.display_name, "a > b");
        assert_eq!(info.remote_uri, "sip:x@example.com");
    }

    #[test]
    fn test_parse_quoted_name_with_escapes() {
        let info = CallerInfo::parse(r#""Say \"hi\" \\ bye" <sip:eve@example.com>"#);
        assert_eq!(info.display_name, r#"Say "hi" \ bye"#);
        assert_eq!(info.remote_uri, "sip:eve@example.com");
    }

    #[test]
    fn test_parse_unterminated_quote_falls_back() {
        let info = CallerInfo::parse("\"Broken <sip:frank@example.com>");
        assert_eq!(info.display_name, "Broken");
        assert_eq!(info.remote_uri, "sip:frank@example.com");
    }

    #[test]
    fn test_parse_empty_input() {
        assert_eq!(CallerInfo::parse(""), CallerInfo::default());
    }

    #[test]
    fn test_call_id_display() {
        assert_eq!(CallId(42).to_string(), "42");
        assert_eq!(CallId::from(7), CallId(7));
    }
}
