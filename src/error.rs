use anyhow::anyhow;
use reqwest::StatusCode;

/// Error document returned by the WOUDC service (pygeoapi style):
/// `{"code": "...", "description": "..."}`.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct ApiErrorResponse {
    #[serde(default)]
    pub(crate) code: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
}

pub(crate) fn format_api_error(
    status: StatusCode,
    url: &str,
    e: &ApiErrorResponse,
) -> anyhow::Error {
    let code = e.code.as_deref().unwrap_or("");
    let description = e.description.as_deref().unwrap_or("");

    if status == StatusCode::NOT_FOUND {
        return anyhow!(
            "WOUDC resource not found (HTTP 404).\n- Check the collection name and/or item identifier\n- Available collections are listed at the service /collections endpoint\n\nServer message: {} {}\nrequest: {}",
            code,
            description,
            url
        );
    }

    if status == StatusCode::BAD_REQUEST {
        return anyhow!(
            "WOUDC rejected the request (HTTP 400): the service did not accept one of the query parameters.\n\nServer message: {} {}\nrequest: {}",
            code,
            description,
            url
        );
    }

    anyhow!(
        "API request failed: HTTP {} for url ({})\n{}\n{}",
        status.as_u16(),
        url,
        code,
        description
    )
}
