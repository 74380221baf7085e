use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecommenderConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

/// Where wizard snapshots and last results are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatStoreKind {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub recommender: RecommenderConfig,
    pub archive: ArchiveConfig,
    pub chat_store: ChatStoreKind,
    /// Seconds a chat session may stay untouched in memory.
    pub session_idle_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "nutrichat".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "nutrichat-users".into()),
        };
        let recommender = RecommenderConfig {
            base_url: std::env::var("RECOMMENDER_URL")
                .unwrap_or_else(|_| "http://localhost:5000".into()),
            timeout_secs: std::env::var("RECOMMENDER_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60),
        };
        let archive = ArchiveConfig {
            endpoint: std::env::var("MINIO_ENDPOINT")?,
            bucket: std::env::var("MINIO_BUCKET").unwrap_or_else(|_| "nutrichat-exports".into()),
            access_key: std::env::var("MINIO_ACCESS_KEY")?,
            secret_key: std::env::var("MINIO_SECRET_KEY")?,
            region: std::env::var("MINIO_REGION").unwrap_or_else(|_| "us-east-1".into()),
        };
        let chat_store = match std::env::var("CHAT_STORE").as_deref() {
            Ok("memory") => ChatStoreKind::Memory,
            Ok("postgres") | Err(_) => ChatStoreKind::Postgres,
            Ok(other) => anyhow::bail!("unknown CHAT_STORE {other:?} (expected postgres or memory)"),
        };
        let session_idle_secs = std::env::var("SESSION_IDLE_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(1800);
        Ok(Self {
            database_url,
            jwt,
            recommender,
            archive,
            chat_store,
            session_idle_secs,
        })
    }
}
