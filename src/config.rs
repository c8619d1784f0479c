use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub server_host: String,
    pub server_port: u16,
    pub hold: HoldPolicy,
    /// Seconds between expired-hold sweeps; 0 disables the sweeper.
    pub hold_sweep_interval_secs: u64,
    pub admin_email: String,
    pub admin_password: Option<String>,
}

/// Bounds for how long a seat hold may last before payment.
#[derive(Clone, Copy, Debug)]
pub struct HoldPolicy {
    pub default_minutes: i64,
    pub max_minutes: i64,
}

impl Default for HoldPolicy {
    fn default() -> Self {
        Self {
            default_minutes: 15,
            max_minutes: 120,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            database_url: env::var("DATABASE_URL")
                .expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_SECRET")
                .expect("JWT_SECRET must be set"),
            jwt_expiration_hours: env::var("JWT_EXPIRATION_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .expect("JWT_EXPIRATION_HOURS must be a number"),
            server_host: env::var("SERVER_HOST")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("SERVER_PORT must be a number"),
            hold: HoldPolicy {
                default_minutes: env::var("DEFAULT_HOLD_MINUTES")
                    .unwrap_or_else(|_| "15".to_string())
                    .parse()
                    .expect("DEFAULT_HOLD_MINUTES must be a number"),
                max_minutes: env::var("MAX_HOLD_MINUTES")
                    .unwrap_or_else(|_| "120".to_string())
                    .parse()
                    .expect("MAX_HOLD_MINUTES must be a number"),
            },
            hold_sweep_interval_secs: env::var("HOLD_SWEEP_INTERVAL_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .expect("HOLD_SWEEP_INTERVAL_SECS must be a number"),
            admin_email: env::var("ADMIN_EMAIL")
                .unwrap_or_else(|_| "admin@airline.local".to_string()),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
        }
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
