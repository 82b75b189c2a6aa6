/// TOML configuration (`salon.toml`) loading and validation.
pub mod toml_config;
/// Input validation for registration, login and profile updates.
pub mod validation;
