//! Request dispatch: overlay upgrades, health checks and static assets

use log::{debug, warn};
use std::convert::Infallible;
use std::path::PathBuf;
use warp::filters::BoxedFilter;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::ws::Ws;
use warp::{Filter, Reply};

use crate::constants::{HEALTH_PATH, WS_PATH};
use crate::core::category::Category;
use crate::core::server::SharedRelayServer;
use crate::error::{RelayError, Result};
use crate::handlers::websocket::handle_overlay_client;

/// Query parameter naming the category to subscribe to
pub const CATEGORY_PARAM: &str = "type";

/// Every route the relay answers
pub fn routes(server: SharedRelayServer) -> BoxedFilter<(Response,)> {
    // `/ws?type=<category>`; the query and upgrade are optional here so a bad
    // request gets an explicit 400 instead of falling through
    let ws_route = warp::path(WS_PATH)
        .and(warp::path::end())
        .and(warp::get())
        .and(raw_query())
        .and(optional_upgrade())
        .and(with_server(server.clone()))
        .map(upgrade_or_reject);

    let health_route = warp::path(HEALTH_PATH)
        .and(warp::path::end())
        .map(|| "OK".into_response());

    let api = ws_route.or(health_route).unify();

    match server.config().asset_dir.clone() {
        Some(dir) => api.or(assets(dir)).unify().boxed(),
        None => api.boxed(),
    }
}

/// Resolve the subscription category from a raw query string
pub fn category_from_query(query: &str) -> Result<Category> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == CATEGORY_PARAM)
        .ok_or_else(|| RelayError::InvalidCategory(String::new()))
        .and_then(|(_, value)| value.parse())
}

fn upgrade_or_reject(query: String, ws: Option<Ws>, server: SharedRelayServer) -> Response {
    let Some(ws) = ws else {
        warn!("Rejected non-upgrade request to /{}", WS_PATH);
        return reject(StatusCode::BAD_REQUEST, "websocket upgrade required");
    };

    let category = match category_from_query(&query) {
        Ok(category) => category,
        Err(e) => {
            warn!("Rejected overlay connection: {}", e);
            return reject(StatusCode::BAD_REQUEST, "missing or unknown type parameter");
        }
    };

    if server.is_shutting_down() {
        return reject(StatusCode::SERVICE_UNAVAILABLE, "server is shutting down");
    }

    // Early refusal only; the registry enforces the limit when the upgraded
    // connection registers
    let max_connections = server.config().max_connections;
    if server.connection_count() >= max_connections {
        warn!(
            "Rejected {} connection, limit of {} reached",
            category, max_connections
        );
        return reject(StatusCode::SERVICE_UNAVAILABLE, "too many connections");
    }

    debug!("Upgrading {} overlay connection", category);
    let max_message_size = server.config().max_message_size;
    ws.max_message_size(max_message_size)
        .on_upgrade(move |socket| handle_overlay_client(socket, category, server))
        .into_response()
}

fn reject(status: StatusCode, reason: &'static str) -> Response {
    warp::reply::with_status(reason, status).into_response()
}

// Static overlay pages, with `index.html` served at the root
fn assets(dir: PathBuf) -> BoxedFilter<(Response,)> {
    let index = warp::get()
        .and(warp::path::end())
        .and(warp::fs::file(dir.join("index.html")));

    index
        .or(warp::fs::dir(dir))
        .unify()
        .map(|file: warp::fs::File| file.into_response())
        .boxed()
}

fn raw_query() -> impl Filter<Extract = (String,), Error = Infallible> + Clone {
    warp::query::raw()
        .or(warp::any().map(String::new))
        .unify()
}

fn optional_upgrade() -> impl Filter<Extract = (Option<Ws>,), Error = Infallible> + Clone {
    warp::ws()
        .map(Some)
        .or(warp::any().map(|| None::<Ws>))
        .unify()
}

// Helper function to include the server in request handlers
fn with_server(
    server: SharedRelayServer,
) -> impl Filter<Extract = (SharedRelayServer,), Error = Infallible> + Clone {
    warp::any().map(move || server.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_query() {
        assert_eq!(category_from_query("type=chat").unwrap(), Category::Chat);
        assert_eq!(
            category_from_query("foo=1&type=Notification").unwrap(),
            Category::Notification
        );
        assert_eq!(
            category_from_query("type=EMOTEWALL").unwrap(),
            Category::EmoteWall
        );
    }

    #[test]
    fn test_category_from_query_rejects() {
        assert!(category_from_query("").is_err());
        assert!(category_from_query("type=bogus").is_err());
        assert!(category_from_query("kind=chat").is_err());
        assert!(category_from_query("type=").is_err());
    }
}
