//! Resource URL construction.
//!
//! Pure URL algebra for the Salesforce REST layout
//! `<instance>/services/data/<version>/<resource>[/<subpath>][?<query>]`
//! and the OAuth endpoints. Nothing here performs I/O.
//!
//! Required inputs are checked in positional order; the first empty one
//! fails with [`ErrorKind::InvalidArgument`] naming that parameter. Inputs
//! that must be absolute URLs fail with [`ErrorKind::MalformedUrl`].
//!
//! Path components are pushed as individual segments, so reserved characters
//! in ids or external-id values are percent-encoded rather than altering the
//! path. An instance URL that carries its own path keeps it.

use std::fmt;

use url::Url;

use crate::error::{Error, ErrorKind, Result};

/// Default blob field for [`sobject_blob_retrieve`].
pub const DEFAULT_BLOB_FIELD: &str = "body";

/// How the Salesforce login page is rendered during interactive flows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DisplayType {
    /// Full-page authorization screen.
    #[default]
    Page,
    /// Compact dialog for popup windows.
    Popup,
    /// Mobile-optimized dialog for touch screens.
    Touch,
    /// Mobile-optimized dialog for devices without touch.
    Mobile,
}

impl DisplayType {
    /// The lower-cased name sent as the `display` parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayType::Page => "page",
            DisplayType::Popup => "popup",
            DisplayType::Touch => "touch",
            DisplayType::Mobile => "mobile",
        }
    }
}

impl fmt::Display for DisplayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// OAuth `response_type` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResponseType {
    Token,
    Code,
}

impl ResponseType {
    fn as_str(&self) -> &'static str {
        match self {
            ResponseType::Token => "token",
            ResponseType::Code => "code",
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn require(value: &str, parameter: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::invalid_argument(parameter));
    }
    Ok(())
}

/// Parse `value` as an absolute URL that can take path segments.
pub fn parse_absolute(value: &str, parameter: &str) -> Result<Url> {
    require(value, parameter)?;
    let url = Url::parse(value.trim()).map_err(|e| {
        Error::with_source(
            ErrorKind::MalformedUrl {
                parameter: parameter.to_string(),
                reason: e.to_string(),
            },
            e,
        )
    })?;
    if url.cannot_be_a_base() || !url.has_host() {
        return Err(Error::new(ErrorKind::MalformedUrl {
            parameter: parameter.to_string(),
            reason: "not a hierarchical absolute URL".to_string(),
        }));
    }
    Ok(url)
}

/// Returns true if `value` is a well-formed absolute http(s) URL.
pub fn is_absolute_url(value: &str) -> bool {
    Url::parse(value.trim())
        .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
        .unwrap_or(false)
}

fn push_segments(url: &mut Url, segments: &[&str], parameter: &str) -> Result<()> {
    let mut path = url.path_segments_mut().map_err(|_| {
        Error::new(ErrorKind::MalformedUrl {
            parameter: parameter.to_string(),
            reason: "URL cannot carry a path".to_string(),
        })
    })?;
    path.pop_if_empty();
    path.extend(segments);
    Ok(())
}

/// Append percent-encoded `key=value` pairs, preserving any existing query.
fn append_query(url: &mut Url, pairs: &[(&str, &str)]) {
    if pairs.is_empty() {
        return;
    }
    let encoded = pairs
        .iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");
    let query = match url.query() {
        Some(existing) if !existing.is_empty() => format!("{existing}&{encoded}"),
        _ => encoded,
    };
    url.set_query(Some(&query));
}

/// `<instance>/services/data/<segments...>` with the instance query dropped.
fn data_url(instance_url: &str, segments: &[&str]) -> Result<Url> {
    let mut url = parse_absolute(instance_url, "instance_url")?;
    url.set_query(None);
    url.set_fragment(None);
    let mut all = vec!["services", "data"];
    all.extend_from_slice(segments);
    push_segments(&mut url, &all, "instance_url")?;
    Ok(url)
}

fn versioned(instance_url: &str, api_version: &str, segments: &[&str]) -> Result<Url> {
    require(instance_url, "instance_url")?;
    require(api_version, "api_version")?;
    let mut all = vec![api_version];
    all.extend_from_slice(segments);
    data_url(instance_url, &all)
}

// ============================================================================
// REST resources
// ============================================================================

/// `<instance>/services/data`
pub fn base_uri(instance_url: &str) -> Result<Url> {
    data_url(instance_url, &[])
}

/// Lists the REST API versions the instance supports. Same URL as [`base_uri`].
pub fn versions(instance_url: &str) -> Result<Url> {
    base_uri(instance_url)
}

/// `<instance>/services/data/<version>/limits`
pub fn limits(instance_url: &str, api_version: &str) -> Result<Url> {
    versioned(instance_url, api_version, &["limits"])
}

/// The limits resource relative to `/services/data`, as used inside
/// composite batch subrequests: `<version>/limits`.
pub fn limits_resource(api_version: &str) -> Result<String> {
    require(api_version, "api_version")?;
    Ok(format!("{}/limits", api_version))
}

/// `<instance>/services/data/<version>/sobjects`
pub fn describe_global(instance_url: &str, api_version: &str) -> Result<Url> {
    versioned(instance_url, api_version, &["sobjects"])
}

/// `<instance>/services/data/<version>/sobjects/<name>`
///
/// GET returns basic object information; POST creates a record.
pub fn sobject_basic_information(
    instance_url: &str,
    api_version: &str,
    sobject_name: &str,
) -> Result<Url> {
    require(instance_url, "instance_url")?;
    require(api_version, "api_version")?;
    require(sobject_name, "sobject_name")?;
    versioned(instance_url, api_version, &["sobjects", sobject_name])
}

/// `<instance>/services/data/<version>/sobjects/<name>/describe`
pub fn sobject_describe(instance_url: &str, api_version: &str, sobject_name: &str) -> Result<Url> {
    require(instance_url, "instance_url")?;
    require(api_version, "api_version")?;
    require(sobject_name, "sobject_name")?;
    versioned(
        instance_url,
        api_version,
        &["sobjects", sobject_name, "describe"],
    )
}

/// `<instance>/services/data/<version>/sobjects/<name>/<id>[?fields=a,b]`
///
/// `fields` is joined with a literal comma into a single `fields` parameter,
/// appended only when non-empty.
pub fn sobject_rows(
    instance_url: &str,
    api_version: &str,
    sobject_name: &str,
    object_id: &str,
    fields: &[&str],
) -> Result<Url> {
    require(instance_url, "instance_url")?;
    require(api_version, "api_version")?;
    require(sobject_name, "sobject_name")?;
    require(object_id, "object_id")?;

    let mut url = versioned(
        instance_url,
        api_version,
        &["sobjects", sobject_name, object_id],
    )?;
    let fields: Vec<&str> = fields.iter().copied().filter(|f| !f.is_empty()).collect();
    if !fields.is_empty() {
        append_query(&mut url, &[("fields", &fields.join(","))]);
    }
    Ok(url)
}

/// `<instance>/services/data/<version>/sobjects/<name>/<field>/<value>`
///
/// Target of external-id upserts.
pub fn sobject_rows_by_external_id(
    instance_url: &str,
    api_version: &str,
    sobject_name: &str,
    field_name: &str,
    field_value: &str,
) -> Result<Url> {
    require(instance_url, "instance_url")?;
    require(api_version, "api_version")?;
    require(sobject_name, "sobject_name")?;
    require(field_name, "field_name")?;
    require(field_value, "field_value")?;
    versioned(
        instance_url,
        api_version,
        &["sobjects", sobject_name, field_name, field_value],
    )
}

/// `<instance>/services/data/<version>/sobjects/<name>/<id>/<blob_field>`
///
/// `blob_field` defaults to [`DEFAULT_BLOB_FIELD`].
pub fn sobject_blob_retrieve(
    instance_url: &str,
    api_version: &str,
    sobject_name: &str,
    object_id: &str,
    blob_field: Option<&str>,
) -> Result<Url> {
    require(instance_url, "instance_url")?;
    require(api_version, "api_version")?;
    require(sobject_name, "sobject_name")?;
    require(object_id, "object_id")?;
    let blob_field = blob_field
        .filter(|f| !f.is_empty())
        .unwrap_or(DEFAULT_BLOB_FIELD);
    versioned(
        instance_url,
        api_version,
        &["sobjects", sobject_name, object_id, blob_field],
    )
}

/// `<instance>/services/data/<version>/composite/sobjects`
pub fn sobjects_composite(instance_url: &str, api_version: &str) -> Result<Url> {
    versioned(instance_url, api_version, &["composite", "sobjects"])
}

/// `<instance>/services/data/<version>/composite/batch`
pub fn batch(instance_url: &str, api_version: &str) -> Result<Url> {
    versioned(instance_url, api_version, &["composite", "batch"])
}

/// `<instance>/services/data/<version>/query?q=<soql>`, or `queryAll` to
/// include deleted and archived records.
pub fn query(instance_url: &str, api_version: &str, soql: &str, query_all: bool) -> Result<Url> {
    require(instance_url, "instance_url")?;
    require(api_version, "api_version")?;
    require(soql, "query")?;
    let resource = if query_all { "queryAll" } else { "query" };
    let mut url = versioned(instance_url, api_version, &[resource])?;
    append_query(&mut url, &[("q", soql)]);
    Ok(url)
}

/// `<instance>/services/data/<version>/search?q=<sosl>`
pub fn search(instance_url: &str, api_version: &str, sosl: &str) -> Result<Url> {
    require(instance_url, "instance_url")?;
    require(api_version, "api_version")?;
    require(sosl, "query")?;
    let mut url = versioned(instance_url, api_version, &["search"])?;
    append_query(&mut url, &[("q", sosl)]);
    Ok(url)
}

/// Resolve a server-relative path such as a query's `nextRecordsUrl`
/// against the instance.
pub fn instance_relative(instance_url: &str, relative: &str) -> Result<Url> {
    require(relative, "relative_url")?;
    let base = parse_absolute(instance_url, "instance_url")?;
    base.join(relative).map_err(|e| {
        Error::with_source(
            ErrorKind::MalformedUrl {
                parameter: "relative_url".to_string(),
                reason: e.to_string(),
            },
            e,
        )
    })
}

// ============================================================================
// OAuth endpoints
// ============================================================================

/// Authorization URL for the user-agent (implicit) flow.
///
/// Parameters, in order: `response_type=token`, `client_id`, `redirect_uri`,
/// `display`, then `scope` and `state` when given.
pub fn user_agent_authentication_url(
    login_url: &str,
    client_id: &str,
    redirect_url: &str,
    display: DisplayType,
    state: Option<&str>,
    scope: Option<&str>,
) -> Result<Url> {
    authorization_url(
        ResponseType::Token,
        login_url,
        client_id,
        redirect_url,
        display,
        None,
        scope,
        state,
    )
}

/// Authorization URL for the web-server (authorization code) flow.
///
/// Parameters, in order: `response_type=code`, `client_id`, `redirect_uri`,
/// `display`, `immediate`, then `scope` and `state` when given.
pub fn web_server_authentication_url(
    login_url: &str,
    client_id: &str,
    redirect_url: &str,
    display: DisplayType,
    immediate: bool,
    scope: Option<&str>,
    state: Option<&str>,
) -> Result<Url> {
    authorization_url(
        ResponseType::Code,
        login_url,
        client_id,
        redirect_url,
        display,
        Some(immediate),
        scope,
        state,
    )
}

#[allow(clippy::too_many_arguments)]
fn authorization_url(
    response_type: ResponseType,
    login_url: &str,
    client_id: &str,
    redirect_url: &str,
    display: DisplayType,
    immediate: Option<bool>,
    scope: Option<&str>,
    state: Option<&str>,
) -> Result<Url> {
    require(login_url, "login_url")?;
    require(client_id, "client_id")?;
    require(redirect_url, "redirect_url")?;
    let mut url = parse_absolute(login_url, "login_url")?;

    let immediate = immediate.map(|i| if i { "true" } else { "false" });
    let mut pairs = vec![
        ("response_type", response_type.as_str()),
        ("client_id", client_id),
        ("redirect_uri", redirect_url),
        ("display", display.as_str()),
    ];
    if let Some(immediate) = immediate {
        pairs.push(("immediate", immediate));
    }
    if let Some(scope) = scope.filter(|s| !s.is_empty()) {
        pairs.push(("scope", scope));
    }
    if let Some(state) = state.filter(|s| !s.is_empty()) {
        pairs.push(("state", state));
    }
    append_query(&mut url, &pairs);
    Ok(url)
}

/// Token endpoint URL for the refresh-token grant.
///
/// Parameters, in order: `grant_type=refresh_token`, `refresh_token`,
/// `client_id`, `client_secret` when given, and a trailing `format=json`.
pub fn refresh_token_url(
    token_refresh_url: &str,
    refresh_token: &str,
    client_id: &str,
    client_secret: Option<&str>,
) -> Result<Url> {
    require(token_refresh_url, "token_refresh_url")?;
    require(refresh_token, "refresh_token")?;
    require(client_id, "client_id")?;
    let mut url = parse_absolute(token_refresh_url, "token_refresh_url")?;

    let mut pairs = vec![
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token),
        ("client_id", client_id),
    ];
    if let Some(secret) = client_secret.filter(|s| !s.is_empty()) {
        pairs.push(("client_secret", secret));
    }
    pairs.push(("format", "json"));
    append_query(&mut url, &pairs);
    Ok(url)
}
