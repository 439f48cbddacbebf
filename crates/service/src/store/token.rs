use rand::{distributions::Alphanumeric, Rng};

/// Candidate secret codes for new accounts.
///
/// Implementations only propose values; uniqueness is checked by the store.
pub trait TokenSource: Send + Sync {
    fn generate(&self) -> String;
}

/// `SEC_` followed by random alphanumerics from the thread-local RNG.
#[derive(Debug, Clone)]
pub struct RandomTokens {
    len: usize,
}

impl RandomTokens {
    pub const PREFIX: &'static str = "SEC_";

    pub fn new(len: usize) -> Self { Self { len } }
}

impl Default for RandomTokens {
    fn default() -> Self { Self::new(24) }
}

impl TokenSource for RandomTokens {
    fn generate(&self) -> String {
        let body: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(self.len)
            .map(char::from)
            .collect();
        format!("{}{}", Self::PREFIX, body)
    }
}
