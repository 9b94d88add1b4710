//! Static file serving module
//!
//! Resolves request paths to files under the site root and builds their
//! responses. The containment check here is what keeps a request path from
//! reaching anything outside the Base Directory.

use crate::handler::router::RequestContext;
use crate::http::{self, mime, range::RangeParseResult};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::path::{Component, Path};
use tokio::fs;

/// Serve a single file at a known location (fixed page routes)
pub async fn serve_file(ctx: &RequestContext<'_>, file_path: &Path) -> Response<Full<Bytes>> {
    match load_file(file_path).await {
        Some((content, content_type)) => build_content_response(ctx, content, content_type),
        None => http::build_404_response(),
    }
}

/// Serve the request path out of a directory tree (catch-all route)
pub async fn serve_tree(
    ctx: &RequestContext<'_>,
    tree_root: &Path,
    request_path: &str,
    index_files: &[String],
) -> Response<Full<Bytes>> {
    match load_from_tree(tree_root, request_path, index_files).await {
        Some((content, content_type)) => build_content_response(ctx, content, content_type),
        None => http::build_404_response(),
    }
}

/// Load a file addressed by a request path, confined to `tree_root`
///
/// A request naming a directory (trailing slash or a real directory)
/// resolves through the index file list. Returns None for anything that
/// does not end up as a readable file under the tree root.
pub async fn load_from_tree(
    tree_root: &Path,
    request_path: &str,
    index_files: &[String],
) -> Option<(Vec<u8>, &'static str)> {
    let relative = request_path.trim_start_matches('/');

    // Parent-directory segments never resolve, whatever they would point at
    if Path::new(relative)
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        logger::log_warning(&format!("Path traversal attempt blocked: {request_path}"));
        return None;
    }

    let tree_root_canonical = match tree_root.canonicalize() {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Site directory not found or inaccessible '{}': {e}",
                tree_root.display()
            ));
            return None;
        }
    };

    let mut file_path = tree_root_canonical.join(relative);

    // Directory requests resolve through the index file list
    if relative.is_empty() || request_path.ends_with('/') || file_path.is_dir() {
        for index_file in index_files {
            let candidate = file_path.join(index_file);
            if candidate.is_file() {
                file_path = candidate;
                break;
            }
        }
    }

    // Missing file is an ordinary 404, no logging needed
    let Ok(file_path_canonical) = file_path.canonicalize() else {
        return None;
    };

    // Canonicalized result must stay under the tree root; this also covers
    // symlinks pointing outside of it
    if !file_path_canonical.starts_with(&tree_root_canonical) {
        logger::log_warning(&format!(
            "Path escape blocked: {request_path} -> {}",
            file_path_canonical.display()
        ));
        return None;
    }

    // A directory with no matching index file is a 404 as well
    if !file_path_canonical.is_file() {
        return None;
    }

    read_with_mime(&file_path_canonical).await
}

/// Load a single file without tree resolution
pub async fn load_file(path: &Path) -> Option<(Vec<u8>, &'static str)> {
    if !path.is_file() {
        return None;
    }
    read_with_mime(path).await
}

/// Read file bytes and pair them with the Content-Type for the extension
async fn read_with_mime(path: &Path) -> Option<(Vec<u8>, &'static str)> {
    let content = match fs::read(path).await {
        Ok(c) => c,
        Err(e) => {
            logger::log_error(&format!("Failed to read file '{}': {e}", path.display()));
            return None;
        }
    };
    let content_type = mime::get_content_type(path.extension().and_then(|e| e.to_str()));
    Some((content, content_type))
}

/// Build the response for loaded file content, honoring HEAD and Range
fn build_content_response(
    ctx: &RequestContext<'_>,
    data: Vec<u8>,
    content_type: &'static str,
) -> Response<Full<Bytes>> {
    let total_size = data.len();

    match http::parse_range_header(ctx.range_header.as_deref(), total_size) {
        RangeParseResult::Valid(range) => {
            let start = range.start;
            let end = range.end_position(total_size);
            let body = Bytes::from(data[start..=end].to_vec());
            http::response::build_partial_response(
                body,
                content_type,
                start,
                end,
                total_size,
                ctx.is_head,
            )
        }
        RangeParseResult::NotSatisfiable => http::build_416_response(total_size),
        RangeParseResult::None => {
            http::response::build_file_response(Bytes::from(data), content_type, ctx.is_head)
        }
    }
}
