//! Streams a converted file back to the HTTP caller.

use std::path::Path;

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::Response,
};
use serde::Deserialize;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use crate::metrics::DELIVERIES_TOTAL;

/// How a converted file is handed to the caller.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeliveryOptions {
    /// Ask the client to display the file instead of saving it.
    #[serde(default)]
    pub inline: bool,
    /// Display name; defaults to the file's basename.
    #[serde(default)]
    pub filename: Option<String>,
    /// Remove the file once it is opened for the response.
    #[serde(default)]
    pub delete_after: bool,
}

/// Build a download response for `path`.
pub async fn deliver(path: &Path, options: &DeliveryOptions) -> std::io::Result<Response> {
    let file = tokio::fs::File::open(path).await?;
    let length = file.metadata().await?.len();

    // The open handle keeps the contents readable after the unlink.
    if options.delete_after {
        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!(path = %path.display(), error = %e, "Failed to delete delivered file");
        }
    }

    let basename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let display_name = options
        .filename
        .as_deref()
        .filter(|n| !n.is_empty())
        .unwrap_or(&basename);

    let content_type = mime_guess::from_path(path).first_or_octet_stream();
    let disposition = content_disposition(options.inline, display_name, &basename);

    DELIVERIES_TOTAL
        .with_label_values(&[if options.inline { "inline" } else { "attachment" }])
        .inc();
    debug!(path = %path.display(), bytes = length, inline = options.inline, "Delivering file");

    let mut response = Response::new(Body::from_stream(ReaderStream::new(file)));
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("private, must-revalidate"),
    );
    headers.insert(header::CONNECTION, HeaderValue::from_static("close"));
    if let Ok(value) = HeaderValue::from_str(content_type.essence_str()) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    Ok(response)
}

/// `Content-Disposition` value with an ASCII `filename` and, when the display
/// name is not plain ASCII, an RFC 5987 `filename*` carrying the original.
pub fn content_disposition(inline: bool, display_name: &str, fallback_source: &str) -> String {
    let kind = if inline { "inline" } else { "attachment" };
    let mut fallback = to_ascii(display_name);
    if fallback.trim_matches('_').is_empty() {
        fallback = to_ascii(fallback_source);
    }

    if fallback == display_name {
        format!("{}; filename=\"{}\"", kind, fallback)
    } else {
        format!(
            "{}; filename=\"{}\"; filename*=utf-8''{}",
            kind,
            fallback,
            urlencoding::encode(display_name)
        )
    }
}

/// Folds a file name to printable ASCII safe inside a quoted header value.
pub fn to_ascii(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '"' | '\\' | '/' | '%' => out.push('_'),
            c if c.is_ascii_graphic() || c == ' ' => out.push(c),
            c => match fold_latin(c) {
                Some(folded) => out.push_str(folded),
                None => out.push('_'),
            },
        }
    }
    out
}

fn fold_latin(c: char) -> Option<&'static str> {
    let folded = match c {
        'À' | 'Á' | 'Â' | 'Ã' | 'Å' => "A",
        'Ä' => "Ae",
        'à' | 'á' | 'â' | 'ã' | 'å' => "a",
        'ä' => "ae",
        'Æ' => "AE",
        'æ' => "ae",
        'Ç' => "C",
        'ç' => "c",
        'È' | 'É' | 'Ê' | 'Ë' => "E",
        'è' | 'é' | 'ê' | 'ë' => "e",
        'Ì' | 'Í' | 'Î' | 'Ï' => "I",
        'ì' | 'í' | 'î' | 'ï' => "i",
        'Ñ' => "N",
        'ñ' => "n",
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ø' => "O",
        'Ö' => "Oe",
        'ò' | 'ó' | 'ô' | 'õ' | 'ø' => "o",
        'ö' => "oe",
        'Ù' | 'Ú' | 'Û' => "U",
        'Ü' => "Ue",
        'ù' | 'ú' | 'û' => "u",
        'ü' => "ue",
        'Ý' => "Y",
        'ý' | 'ÿ' => "y",
        'ß' => "ss",
        '\u{2013}' | '\u{2014}' => "-",
        _ => return None,
    };
    Some(folded)
}
