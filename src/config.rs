use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_path: String,
    pub storage_dir: String,
    pub public_base_url: String,
    pub allowed_origins: Vec<String>,
    pub environment: String,
    pub app_secret_key: String,
    pub session_ttl_secs: i64,
    pub admin_emails: Vec<String>,
    pub posts_per_hour: u32,
    pub posts_per_day: u32,
    pub log_requests: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if it exists (development)
        dotenvy::dotenv().ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| "Invalid SERVER_PORT")?;

        let database_path =
            env::var("DATABASE_PATH").unwrap_or_else(|_| "./data/the-hook.db".to_string());

        let storage_dir =
            env::var("STORAGE_DIR").unwrap_or_else(|_| "./data/storage".to_string());

        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{}", server_port))
            .trim_end_matches('/')
            .to_string();

        let allowed_origins = split_list(
            &env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".to_string()),
        );

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let app_secret_key = env::var("APP_SECRET_KEY")
            .map_err(|_| "APP_SECRET_KEY must be set for session signing")?;

        let session_ttl_secs = env::var("SESSION_TTL_SECS")
            .unwrap_or_else(|_| "2592000".to_string())
            .parse()
            .map_err(|_| "Invalid SESSION_TTL_SECS")?;

        let admin_emails = split_list(&env::var("ADMIN_EMAILS").unwrap_or_default())
            .into_iter()
            .map(|email| email.to_lowercase())
            .collect();

        let posts_per_hour = env::var("POSTS_PER_HOUR")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map_err(|_| "Invalid POSTS_PER_HOUR")?;

        let posts_per_day = env::var("POSTS_PER_DAY")
            .unwrap_or_else(|_| "200".to_string())
            .parse()
            .map_err(|_| "Invalid POSTS_PER_DAY")?;

        let log_requests = env::var("LOG_REQUESTS")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Config {
            server_host,
            server_port,
            database_path,
            storage_dir,
            public_base_url,
            allowed_origins,
            environment,
            app_secret_key,
            session_ttl_secs,
            admin_emails,
            posts_per_hour,
            posts_per_day,
            log_requests,
        })
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Whether a sign-up with this email is bootstrapped as an admin
    pub fn is_admin_email(&self, email: &str) -> bool {
        let email = email.to_lowercase();
        self.admin_emails.iter().any(|e| *e == email)
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
