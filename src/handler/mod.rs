//! Request handler module
//!
//! Routing dispatch and static file serving. The router maps the site's
//! fixed pages and falls through to a tree lookup for everything else.

pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
