//! Colored output helpers for CLI
//!
//! Every line is rendered to a `String` first, so the plain (no-color)
//! rendering can be asserted in tests; the public methods print it.

use owo_colors::OwoColorize;

/// Kinds of status line, each with its own marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Info,
    Warn,
    Error,
    Created,
    Skipped,
}

impl Status {
    fn plain_tag(self) -> &'static str {
        match self {
            Status::Ok => "[OK]",
            Status::Info => "[INFO]",
            Status::Warn => "[WARN]",
            Status::Error => "[ERROR]",
            Status::Created => "[CREATED]",
            Status::Skipped => "[SKIPPED]",
        }
    }

    fn marker(self) -> String {
        match self {
            Status::Ok | Status::Created => "✓".green().bold().to_string(),
            Status::Info => "•".magenta().to_string(),
            Status::Warn => "⚠".yellow().bold().to_string(),
            Status::Error => "✗".red().bold().to_string(),
            Status::Skipped => "○".yellow().to_string(),
        }
    }
}

/// Output style configuration
pub struct Output {
    /// Whether to use colored output
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

const BANNER: [&str; 4] = [
    "  ___  __ _ | | ___  _ __",
    " / __|/ _` || |/ _ \\| '_ \\",
    " \\__ \\ (_| || | (_) | | | |",
    " |___/\\__,_||_|\\___/|_| |_|",
];

impl Output {
    pub fn new() -> Self {
        Self { colored: true }
    }

    pub fn no_color() -> Self {
        Self { colored: false }
    }

    /// Renders one status line.
    pub fn render(&self, status: Status, message: &str) -> String {
        if !self.colored {
            return format!("  {} {}", status.plain_tag(), message);
        }

        let message = match status {
            Status::Ok => message.green().to_string(),
            Status::Warn => message.yellow().to_string(),
            Status::Error => message.red().to_string(),
            Status::Info | Status::Created | Status::Skipped => message.to_string(),
        };
        format!("  {} {}", status.marker(), message)
    }

    fn render_heading(&self, title: &str, major: bool) -> String {
        match (self.colored, major) {
            (true, true) => format!("\n  {}", title.bright_white().bold().underline()),
            (true, false) => format!("\n  {}", title.magenta().bold()),
            (false, true) => format!("\n  === {} ===", title),
            (false, false) => format!("\n  --- {} ---", title),
        }
    }

    fn render_kv(&self, key: &str, value: &str) -> String {
        if self.colored {
            format!("    {}: {}", key.dimmed(), value.bright_white())
        } else {
            format!("    {}: {}", key, value)
        }
    }

    pub fn banner(&self) {
        let version = format!("v{}", env!("CARGO_PKG_VERSION"));
        println!();
        for line in BANNER {
            if self.colored {
                println!("   {}", line.bright_magenta().bold());
            } else {
                println!("   {}", line);
            }
        }
        if self.colored {
            println!(
                "\n   {} {}\n",
                "Salon & Spa Session Server".bright_white().bold(),
                version.dimmed()
            );
        } else {
            println!("\n   Salon & Spa Session Server {}\n", version);
        }
    }

    pub fn success(&self, message: &str) {
        println!("{}", self.render(Status::Ok, message));
    }

    pub fn info(&self, message: &str) {
        println!("{}", self.render(Status::Info, message));
    }

    pub fn warning(&self, message: &str) {
        println!("{}", self.render(Status::Warn, message));
    }

    /// Errors go to stderr.
    pub fn error(&self, message: &str) {
        eprintln!("{}", self.render(Status::Error, message));
    }

    /// A file written by `init`, e.g. `created("config", "salon.toml")`.
    pub fn created(&self, kind: &str, path: &str) {
        let message = if self.colored {
            format!("{} {}", kind.dimmed(), path.bright_white())
        } else {
            format!("{} {}", kind, path)
        };
        println!("{}", self.render(Status::Created, &message));
    }

    pub fn created_dir(&self, path: &str) {
        self.created("directory", path);
    }

    pub fn skipped(&self, path: &str, reason: &str) {
        let message = if self.colored {
            format!("{} {}", path.dimmed(), format!("({})", reason).yellow())
        } else {
            format!("{} ({})", path, reason)
        };
        println!("{}", self.render(Status::Skipped, &message));
    }

    pub fn header(&self, title: &str) {
        println!("{}", self.render_heading(title, true));
    }

    pub fn subheader(&self, title: &str) {
        println!("{}", self.render_heading(title, false));
    }

    pub fn kv(&self, key: &str, value: &str) {
        println!("{}", self.render_kv(key, value));
    }

    pub fn list_item(&self, item: &str) {
        if self.colored {
            println!("    {} {}", "•".magenta(), item);
        } else {
            println!("    - {}", item);
        }
    }

    pub fn hint(&self, message: &str) {
        if self.colored {
            println!("\n  {}", message.dimmed().italic());
        } else {
            println!("\n  [TIP] {}", message);
        }
    }

    /// A shell command the user is expected to run next.
    pub fn command(&self, cmd: &str) {
        let line = format!("$ {}", cmd);
        if self.colored {
            println!("     {}", line.bright_magenta());
        } else {
            println!("     {}", line);
        }
    }

    pub fn complete(&self, message: &str) {
        if self.colored {
            println!("\n  {}", message.bright_green().bold());
        } else {
            println!("\n  [DONE] {}", message);
        }
    }

    pub fn newline(&self) {
        println!();
    }
}
