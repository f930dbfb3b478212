use serde::Deserialize;

const DEFAULT_TTL_DAYS: i64 = 30;
/// Ten years; keeps `now + ttl` far from `OffsetDateTime`'s range limits.
const MAX_TTL_DAYS: i64 = 3650;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub ttl_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "rupee-tracker".into()),
            ttl_days: ttl_days(std::env::var("JWT_TTL_DAYS").ok().as_deref())?,
        };
        if jwt.secret.is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }
        Ok(Self {
            database_url,
            max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(10),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("APP_PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(8080),
            jwt,
        })
    }
}

fn ttl_days(raw: Option<&str>) -> anyhow::Result<i64> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_TTL_DAYS);
    };
    let days: i64 = raw
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("JWT_TTL_DAYS must be a whole number of days, got {raw:?}"))?;
    if !(1..=MAX_TTL_DAYS).contains(&days) {
        anyhow::bail!("JWT_TTL_DAYS must be between 1 and {MAX_TTL_DAYS}, got {days}");
    }
    Ok(days)
}
