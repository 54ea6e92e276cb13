pub mod health;
pub mod redact;
