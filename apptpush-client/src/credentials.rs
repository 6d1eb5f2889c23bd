//! Access-token source used to authorize the socket.

use parking_lot::RwLock;

/// Token type used when the source does not supply one.
pub const DEFAULT_TOKEN_TYPE: &str = "Bearer";

/// Supplies the credentials of the signed-in user on demand.
pub trait CredentialSource: Send + Sync {
    /// Current access token, if the user is signed in.
    fn access_token(&self) -> Option<String>;

    /// Token type (e.g. "Bearer"). `None` means [`DEFAULT_TOKEN_TYPE`].
    fn token_type(&self) -> Option<String> {
        None
    }
}

/// Builds the `Authorization` header value, or `None` without a token.
pub fn authorization_header(source: &dyn CredentialSource) -> Option<String> {
    let token = source.access_token().filter(|t| !t.is_empty())?;
    let token_type = source
        .token_type()
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_TOKEN_TYPE.to_string());
    Some(format!("{} {}", token_type, token))
}

#[derive(Debug, Default)]
struct Token {
    value: Option<String>,
    token_type: Option<String>,
}

/// In-memory credential source.
///
/// The token can be replaced after a refresh or cleared on sign-out; the
/// next `connect` picks up whatever is stored at that moment.
#[derive(Debug, Default)]
pub struct StaticCredentials {
    token: RwLock<Token>,
}

impl StaticCredentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Token {
                value: Some(token.into()),
                token_type: None,
            }),
        }
    }

    /// A source with no token; `connect` is skipped until one is set.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_token_type(self, token_type: impl Into<String>) -> Self {
        self.token.write().token_type = Some(token_type.into());
        self
    }

    pub fn set_token(&self, token: impl Into<String>) {
        self.token.write().value = Some(token.into());
    }

    pub fn clear(&self) {
        let mut token = self.token.write();
        token.value = None;
        token.token_type = None;
    }
}

impl CredentialSource for StaticCredentials {
    fn access_token(&self) -> Option<String> {
        self.token.read().value.clone()
    }

    fn token_type(&self) -> Option<String> {
        self.token.read().token_type.clone()
    }
}
