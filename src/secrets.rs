//! Boundary for protecting auth secrets of saved requests at rest.

/// Reversible transform applied to secrets before they are written to the
/// store and after they are read back.
pub trait SecretCipher: Send + Sync {
    fn encrypt(&self, secret: &str) -> String;
    /// Implementations should hand back `token` unchanged when it cannot be
    /// decrypted, so records written before a cipher was configured still load.
    fn decrypt(&self, token: &str) -> String;
}

/// Stores secrets as given.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainCipher;

impl SecretCipher for PlainCipher {
    fn encrypt(&self, secret: &str) -> String {
        secret.to_string()
    }

    fn decrypt(&self, token: &str) -> String {
        token.to_string()
    }
}
