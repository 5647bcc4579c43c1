use argon2::Params;

/// Process-level configuration, built once at startup and passed by
/// reference into the service constructors. No ambient globals.
#[derive(Debug, Clone)]
pub struct Config {
    /// HS256 secret for signing identity tokens.
    pub jwt_secret: String,
    /// Argon2id time cost (iterations). Memory and parallelism stay at the
    /// argon2 crate defaults.
    pub hash_cost: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            jwt_secret: "dev-secret-change-me".into(),
            hash_cost: Params::DEFAULT_T_COST,
        }
    }
}
