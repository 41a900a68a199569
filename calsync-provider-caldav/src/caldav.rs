//! The one CalDAV exchange calsync needs: every VEVENT resource of a
//! collection overlapping the sync window.

use anyhow::{Context, Result};
use calsync_core::config::CalDavDescriptor;
use calsync_core::date_range::DateRange;
use http::{Method, StatusCode, Uri};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::{Client, connect::HttpConnector};
use hyper_util::rt::TokioExecutor;
use libdav::CalDavClient;
use libdav::dav::{WebDavClient, WebDavError};
use libdav::requests::{DavRequest, ParseResponseError, PreparedRequest};
use roxmltree::Node;
use tower::ServiceBuilder;
use tower_http::auth::AddAuthorization;
use tower_http::follow_redirect::{FollowRedirect, FollowRedirectLayer};
use tracing::debug;

type HttpClient = FollowRedirect<AddAuthorization<Client<HttpsConnector<HttpConnector>, String>>>;

pub type DavClient = CalDavClient<HttpClient>;

/// An authenticated client bound to one calendar collection.
pub struct Connection {
    pub client: DavClient,
    /// Path of the collection on the server, e.g. `/123/calendars/home/`.
    pub collection: String,
}

/// Basic auth over HTTPS (plain HTTP allowed for local servers), following
/// redirects since several providers move collections between hosts.
pub fn connect(descriptor: &CalDavDescriptor) -> Result<Connection> {
    let uri = collection_uri(descriptor)?;
    let collection = uri.path().to_string();

    let connector = HttpsConnectorBuilder::new()
        .with_native_roots()
        .context("Failed to load native TLS roots")?
        .https_or_http()
        .enable_http1()
        .build();
    let authorized = AddAuthorization::basic(
        Client::builder(TokioExecutor::new()).build(connector),
        &descriptor.username,
        &descriptor.password,
    );
    let http = ServiceBuilder::new()
        .layer(FollowRedirectLayer::new())
        .service(authorized);

    Ok(Connection {
        client: CalDavClient::new(WebDavClient::new(uri, http)),
        collection,
    })
}

fn collection_uri(descriptor: &CalDavDescriptor) -> Result<Uri> {
    let uri: Uri = descriptor
        .url
        .parse()
        .with_context(|| format!("Invalid CalDAV URL for '{}': {}", descriptor.label, descriptor.url))?;
    if uri.host().is_none() {
        anyhow::bail!("CalDAV URL for '{}' has no host: {}", descriptor.label, descriptor.url);
    }
    Ok(uri)
}

/// calendar-query REPORT with a server-side time-range filter.
#[derive(Debug, Clone)]
pub struct EventsInWindow {
    collection: String,
    start: String,
    end: String,
}

impl EventsInWindow {
    pub fn new(collection: &str, range: &DateRange) -> Self {
        EventsInWindow {
            collection: collection.to_string(),
            start: range.from_caldav(),
            end: range.to_caldav(),
        }
    }

    fn body(&self) -> String {
        format!(
            r#"<C:calendar-query xmlns:D="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
    <D:prop>
        <C:calendar-data/>
    </D:prop>
    <C:filter>
        <C:comp-filter name="VCALENDAR">
            <C:comp-filter name="VEVENT">
                <C:time-range start="{}" end="{}"/>
            </C:comp-filter>
        </C:comp-filter>
    </C:filter>
</C:calendar-query>"#,
            self.start, self.end
        )
    }
}

/// Raw iCalendar text of one event resource.
#[derive(Debug, Clone, PartialEq)]
pub struct EventResource {
    pub href: String,
    pub ics: String,
}

impl DavRequest for EventsInWindow {
    type Response = Vec<EventResource>;
    type ParseError = ParseResponseError;
    type Error<E> = WebDavError<E>;

    fn prepare_request(&self) -> Result<PreparedRequest, http::Error> {
        Ok(PreparedRequest {
            method: Method::from_bytes(b"REPORT")?,
            path: self.collection.clone(),
            body: self.body(),
            headers: vec![("Depth".to_string(), "1".to_string())],
        })
    }

    fn parse_response(
        &self,
        parts: &http::response::Parts,
        body: &[u8],
    ) -> Result<Self::Response, ParseResponseError> {
        if !parts.status.is_success() {
            return Err(ParseResponseError::BadStatusCode(parts.status));
        }
        parse_multistatus(body)
    }
}

/// Event resources of a multistatus body. Responses reporting a failure
/// status, and the collection itself, carry no calendar data and are left out.
pub(crate) fn parse_multistatus(body: &[u8]) -> Result<Vec<EventResource>, ParseResponseError> {
    let doc = roxmltree::Document::parse(std::str::from_utf8(body)?)?;

    let mut resources = Vec::new();
    for response in doc.descendants().filter(|n| is_dav(n, "response")) {
        let Some(href) = child_text(response, "href") else {
            continue;
        };

        match child_text(response, "status").and_then(status_code) {
            Some(status) if !status.is_success() => {
                debug!(%href, %status, "Skipping response");
                continue;
            }
            _ => {}
        }

        let ics = response
            .children()
            .filter(|n| is_dav(n, "propstat"))
            .filter(|p| child_text(*p, "status").and_then(status_code).is_none_or(|s| s.is_success()))
            .flat_map(|p| p.descendants())
            .find(|n| n.tag_name().name() == "calendar-data")
            .and_then(|n| n.text())
            .filter(|text| !text.trim().is_empty());

        match ics {
            Some(ics) => resources.push(EventResource {
                href: href.to_string(),
                ics: ics.to_string(),
            }),
            None => debug!(%href, "No calendar data"),
        }
    }

    Ok(resources)
}

fn is_dav(node: &Node, name: &str) -> bool {
    node.tag_name().name() == name && node.tag_name().namespace() == Some("DAV:")
}

fn child_text<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.children()
        .find(|n| is_dav(n, name))
        .and_then(|n| n.text())
        .map(str::trim)
}

/// `HTTP/1.1 404 Not Found` -> 404
fn status_code(line: &str) -> Option<StatusCode> {
    line.split_whitespace()
        .nth(1)
        .and_then(|code| StatusCode::from_bytes(code.as_bytes()).ok())
}
