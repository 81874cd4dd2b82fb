use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub mod game;
pub mod health;
pub mod session;
pub mod validation;

fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}

fn parse_system_time(raw: &str) -> Result<SystemTime, time::error::Parse> {
    OffsetDateTime::parse(raw.trim(), &Rfc3339).map(SystemTime::from)
}
