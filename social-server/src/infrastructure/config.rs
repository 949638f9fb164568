use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub jwt_secret: String,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn env_u32(name: &str, default: u32) -> anyhow::Result<u32> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid {}: {}", name, e)),
        Err(_) => Ok(default),
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into());
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid PORT: {}", e))?;
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
        let db_max_connections = env_u32("DB_MAX_CONNECTIONS", 20)?;
        let db_min_connections = env_u32("DB_MIN_CONNECTIONS", 5)?;
        let jwt_secret =
            std::env::var("JWT_SECRET").map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?;
        let cors_origins = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            host,
            port,
            database_url,
            db_max_connections,
            db_min_connections,
            jwt_secret,
            cors_origins,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // set_var is unsafe in edition 2024; this is the only test in the
    // crate touching process env.
    #[test]
    fn pool_sizing_is_configurable_with_defaults() {
        unsafe {
            std::env::set_var("DATABASE_URL", "postgres://localhost/social");
            std::env::set_var("JWT_SECRET", "secret");
            std::env::remove_var("DB_MAX_CONNECTIONS");
            std::env::remove_var("DB_MIN_CONNECTIONS");
        }
        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.db_max_connections, 20);
        assert_eq!(config.db_min_connections, 5);

        unsafe {
            std::env::set_var("DB_MAX_CONNECTIONS", "8");
            std::env::set_var("DB_MIN_CONNECTIONS", "2");
        }
        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.db_max_connections, 8);
        assert_eq!(config.db_min_connections, 2);

        unsafe {
            std::env::set_var("DB_MAX_CONNECTIONS", "many");
        }
        assert!(AppConfig::from_env().is_err());
    }
}
