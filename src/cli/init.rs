//! Init command implementation
//!
//! Scaffolds a new salon-server deployment directory with its configuration files.

use super::output::Output;
use crate::utils::toml_config::SalonConfig;
use std::fs;
use std::path::{Path, PathBuf};

/// Result of the init operation
#[derive(Debug)]
pub enum InitResult {
    /// Initialization completed successfully
    Success,
    /// Project already exists (salon.toml found)
    AlreadyExists,
    /// An error occurred during initialization
    Error(String),
}

/// Configuration for the init command
pub struct InitConfig {
    /// Directory to initialize
    pub path: PathBuf,
    /// Overwrite existing files
    pub force: bool,
    /// Host address for the server
    pub host: String,
    /// Port for the server
    pub port: u16,
}

/// Run the init command
pub fn run(config: InitConfig, output: &Output) -> InitResult {
    output.banner();
    output.header("Initializing salon-server");

    let base_path = &config.path;

    let config_path = base_path.join("salon.toml");
    if config_path.exists() && !config.force {
        output.warning("salon.toml already exists!");
        output.hint("Use --force to overwrite existing files");
        return InitResult::AlreadyExists;
    }

    output.subheader("Creating directories");

    let data_dir = base_path.join("data");
    if data_dir.exists() {
        output.skipped("data", "already exists");
    } else {
        if let Err(e) = fs::create_dir_all(&data_dir) {
            output.error(&format!("Failed to create data: {}", e));
            return InitResult::Error(e.to_string());
        }
        output.created_dir("data");
    }

    output.subheader("Creating configuration files");

    let toml_content = SalonConfig::template(&config.host, config.port);
    if let Err(e) = write_file(&config_path, &toml_content, config.force) {
        output.error(&format!("Failed to create salon.toml: {}", e));
        return InitResult::Error(e.to_string());
    }
    output.created("config", "salon.toml");

    let env_example_path = base_path.join(".env.example");
    if let Err(e) = write_file(&env_example_path, &generate_env_example(), config.force) {
        output.error(&format!("Failed to create .env.example: {}", e));
        return InitResult::Error(e.to_string());
    }
    output.created("env", ".env.example");

    let gitignore_path = base_path.join(".gitignore");
    if !gitignore_path.exists() {
        if let Err(e) = write_file(&gitignore_path, &generate_gitignore(), false) {
            output.warning(&format!("Failed to create .gitignore: {}", e));
        } else {
            output.created("file", ".gitignore");
        }
    }

    output.complete("salon-server initialized successfully!");

    output.header("Next Steps");
    output.newline();
    output.info("1. Set up environment variables:");
    output.command("cp .env.example .env");
    output.command("# Set ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET (32+ chars, different)");
    output.newline();
    output.info("2. Check the configuration:");
    output.command("salon-server config --validate");
    output.newline();
    output.info("3. Start the server:");
    output.command("salon-server");
    output.newline();

    output.hint(&format!(
        "Server will be available at http://{}:{}/api/v1",
        config.host, config.port
    ));
    output.hint("OpenAPI document at /api-docs/openapi.json");

    InitResult::Success
}

fn write_file(path: &Path, content: &str, force: bool) -> std::io::Result<()> {
    if path.exists() && !force {
        return Ok(()); // Skip existing files unless force is true
    }
    fs::write(path, content)
}

fn generate_env_example() -> String {
    r#"# salon-server Environment Variables
# ==================================
# Copy this file to .env and fill in the values.

# REQUIRED: signing secret for access tokens (minimum 32 characters)
# Generate with: openssl rand -base64 48
ACCESS_TOKEN_SECRET=change-me-access-secret-at-least-32-characters

# REQUIRED: signing secret for refresh tokens (minimum 32 characters,
# must differ from ACCESS_TOKEN_SECRET)
REFRESH_TOKEN_SECRET=change-me-refresh-secret-at-least-32-characters

# Optional: log filter, overrides server.log_level
RUST_LOG=info,salon=debug
"#
    .to_string()
}

fn generate_gitignore() -> String {
    r#"# salon-server generated files
/data/
*.db
*.db-journal

# Environment
.env
.env.local

# Rust
/target/
"#
    .to_string()
}
