use bcrypt::{hash, verify};

/// bcrypt hashing, run off the async executor
#[derive(Debug, Clone, Copy)]
pub struct PasswordService {
    cost: u32,
}

impl PasswordService {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub async fn hash_password(&self, password: &str) -> Result<String, String> {
        let password = password.to_owned();
        let cost = self.cost;
        tokio::task::spawn_blocking(move || hash(password, cost))
            .await
            .map_err(|e| format!("Hashing task failed: {}", e))?
            .map_err(|e| format!("Failed to hash password: {}", e))
    }

    /// `Ok(false)` on mismatch; `Err` only when the stored hash is unusable
    pub async fn verify_password(&self, password: &str, hash: &str) -> Result<bool, String> {
        let password = password.to_owned();
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || verify(password, &hash))
            .await
            .map_err(|e| format!("Verification task failed: {}", e))?
            .map_err(|e| format!("Failed to verify password: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_is_salted_and_verifiable() {
        let passwords = PasswordService::new(4);
        let first = passwords.hash_password("s3cret-pass").await.unwrap();
        let second = passwords.hash_password("s3cret-pass").await.unwrap();

        assert_ne!(first, "s3cret-pass");
        assert!(!first.contains("s3cret-pass"));
        assert_ne!(first, second);
        assert!(first.starts_with("$2"));

        assert!(passwords.verify_password("s3cret-pass", &first).await.unwrap());
        assert!(!passwords.verify_password("s3cret-pasS", &first).await.unwrap());
        assert!(!passwords.verify_password("", &first).await.unwrap());
    }

    #[tokio::test]
    async fn garbage_hash_is_an_error() {
        let passwords = PasswordService::new(4);
        assert!(passwords.verify_password("x", "not-a-bcrypt-hash").await.is_err());
    }
}
