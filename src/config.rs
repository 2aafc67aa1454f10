use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use dotenvy::dotenv;

use crate::service::calendar::{WorkSchedule, parse_clock_time};

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,

    // Rate limiting
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    // Attendance rules
    pub schedule: WorkSchedule,

    // Employee existence cache
    pub employee_cache_capacity: u64,
    pub employee_cache_ttl: Duration,

    // Logging
    pub log_dir: String,
    pub log_level: tracing::Level,
}

fn required(name: &str) -> Result<String> {
    env::var(name).with_context(|| format!("{name} must be set"))
}

fn parsed_or<T>(name: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse()
        .map_err(|e| anyhow!("{name}='{raw}' is invalid: {e}"))
}

/// Builds the work schedule from `HH:MM` boundaries.
pub fn parse_schedule(start: &str, end: &str) -> Result<WorkSchedule> {
    let start = parse_clock_time(start).with_context(|| format!("WORK_START '{start}'"))?;
    let end = parse_clock_time(end).with_context(|| format!("WORK_END '{end}'"))?;
    WorkSchedule::new(start, end).map_err(|e| anyhow!(e))
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let work_start = env::var("WORK_START").unwrap_or_else(|_| "09:00".to_string());
        let work_end = env::var("WORK_END").unwrap_or_else(|_| "18:00".to_string());

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,

            rate_protected_per_min: parsed_or("RATE_PROTECTED_PER_MIN", "1000")?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api/v1".to_string()),

            schedule: parse_schedule(&work_start, &work_end)?,

            employee_cache_capacity: parsed_or("EMPLOYEE_CACHE_CAPACITY", "100000")?,
            employee_cache_ttl: Duration::from_secs(parsed_or("EMPLOYEE_CACHE_TTL_SECS", "3600")?),

            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
            log_level: parsed_or("LOG_LEVEL", "debug")?,
        })
    }

    #[cfg(test)]
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            database_url: "mysql://localhost/hrm_test".to_string(),
            jwt_secret: jwt_secret.to_string(),
            server_addr: "127.0.0.1:0".to_string(),
            rate_protected_per_min: 1000,
            api_prefix: "/api/v1".to_string(),
            schedule: WorkSchedule::default(),
            employee_cache_capacity: 16,
            employee_cache_ttl: Duration::from_secs(60),
            log_dir: "logs".to_string(),
            log_level: tracing::Level::DEBUG,
        }
    }
}
