use std::env;
use std::time::Duration;

#[derive(Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub server_host: String,
    pub server_port: u16,
    /// Cadence of the simulated GPS feed.
    pub feed_tick: Duration,
    /// Cadence of the change-detector observers.
    pub notify_poll: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
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
            feed_tick: Duration::from_secs(
                env::var("FEED_TICK_SECONDS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .expect("FEED_TICK_SECONDS must be a number"),
            ),
            notify_poll: Duration::from_secs(
                env::var("NOTIFY_POLL_SECONDS")
                    .unwrap_or_else(|_| "3".to_string())
                    .parse()
                    .expect("NOTIFY_POLL_SECONDS must be a number"),
            ),
        }
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
