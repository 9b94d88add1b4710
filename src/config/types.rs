// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;
use std::collections::HashMap;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub site: SiteConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    #[serde(default)]
    pub routes: RoutesConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Site configuration
///
/// The root is the Base Directory all lookups are anchored to. When unset,
/// the directory containing the running executable is used.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SiteConfig {
    #[serde(default)]
    pub root: Option<String>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    pub show_headers: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub enable_cors: bool,
    pub max_body_size: u64,
}

/// Routes configuration
#[derive(Debug, Deserialize, Clone)]
pub struct RoutesConfig {
    /// Index files tried when a request names a directory
    #[serde(default = "default_index_files")]
    pub index_files: Vec<String>,
    /// Page routes matched exactly before the catch-all tree lookup
    #[serde(default = "default_pages")]
    pub pages: HashMap<String, RouteHandler>,
}

/// Route handler types
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RouteHandler {
    /// Serve a specific file, relative to the site root
    File { path: String },
    /// Serve files from a subtree, relative to the site root
    Dir { path: String },
}

fn default_index_files() -> Vec<String> {
    vec!["index.html".to_string(), "index.htm".to_string()]
}

/// The site's fixed pages. The admin page is served unauthenticated, the
/// same as every other file in the tree.
fn default_pages() -> HashMap<String, RouteHandler> {
    let mut pages = HashMap::new();
    pages.insert(
        "/".to_string(),
        RouteHandler::File {
            path: "index.html".to_string(),
        },
    );
    pages.insert(
        "/booking.html".to_string(),
        RouteHandler::File {
            path: "booking.html".to_string(),
        },
    );
    pages.insert(
        "/admin/".to_string(),
        RouteHandler::File {
            path: "admin/index.html".to_string(),
        },
    );
    pages.insert(
        "/admin/index.html".to_string(),
        RouteHandler::File {
            path: "admin/index.html".to_string(),
        },
    );
    pages
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            index_files: default_index_files(),
            pages: default_pages(),
        }
    }
}
