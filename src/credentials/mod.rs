use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("no inference API tokens configured (set AUTH1..AUTH4)")]
    Empty,
}

/// Round-robin set of bearer tokens for the inference API.
///
/// The cursor is 1-based and starts at the first token. Every fallback
/// request reads [`CredentialSet::current_token`], so a rotation affects
/// the next request sent by any caller sharing the set.
#[derive(Debug, Clone)]
pub struct CredentialSet {
    tokens: Vec<String>,
    cursor: usize,
}

impl CredentialSet {
    pub fn new(tokens: Vec<String>) -> Result<Self, CredentialError> {
        if tokens.is_empty() {
            return Err(CredentialError::Empty);
        }
        Ok(Self { tokens, cursor: 1 })
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current_token(&self) -> &str {
        &self.tokens[self.cursor - 1]
    }

    /// `Bearer <token>` value for the current cursor.
    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.current_token())
    }

    /// Advance to the next token, wrapping from N back to 1.
    pub fn rotate(&mut self) {
        self.cursor = if self.cursor == self.tokens.len() { 1 } else { self.cursor + 1 };
    }
}
