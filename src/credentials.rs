use serde::{Deserialize, Serialize};
use std::sync::RwLock;

use crate::error::{Error, Result};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Bearer tokens for one browser session.
///
/// Every authenticated gateway call reads from here and nothing else; the
/// gateway is also the only writer after login (refresh and invalidation).
#[derive(Debug, Default)]
pub struct Credentials {
    tokens: RwLock<Option<TokenPair>>,
}

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, tokens: TokenPair) {
        *self.tokens.write().unwrap_or_else(|e| e.into_inner()) = Some(tokens);
    }

    /// Access token, or a local failure if nobody is logged in.
    pub fn bearer(&self) -> Result<String> {
        self.tokens
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|t| t.access.clone())
            .ok_or(Error::MissingCredential)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.tokens
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .and_then(|t| t.refresh.clone())
    }

    pub fn replace_access(&self, access: String) {
        if let Some(t) = self
            .tokens
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .as_mut()
        {
            t.access = access;
        }
    }

    pub fn clear(&self) {
        *self.tokens.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.bearer().is_ok()
    }
}
