//! HTTP surface (§6's external interfaces, driven over the wire instead of
//! a line-oriented file): order entry, modify, cancel, book snapshot, trade
//! history. A thin translation layer over `Market` — no matching logic
//! lives here.

use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::json;
use std::str::FromStr;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::warn;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{FromRequest, Path, Query, Request, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use uuid::Uuid;

use crate::book::BookSnapshot;
use crate::instrument::Pair;
use crate::order::MatchedTrade;
use crate::state::AppState;
use crate::trade::Trade;
use crate::types::{FillId, OrderConditions, OrderId, Price, Quantity, Side};

fn parse_pair<'de, D>(deserializer: D) -> Result<Pair, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Pair::from_str(&s).map_err(|_| de::Error::custom(format!("unsupported symbol `{s}`")))
}

/// Same validation as `parse_pair`, applied to a raw `{symbol}` path segment
/// instead of a JSON field.
fn parse_pair_param(s: &str) -> Result<Pair, ApiErr> {
    Pair::from_str(s).map_err(|_| err(StatusCode::BAD_REQUEST, &format!("unsupported symbol `{s}`")))
}

type ApiErr = (StatusCode, Json<serde_json::Value>);
fn err(status: StatusCode, msg: &str) -> ApiErr {
    (status, Json(json!({ "error": msg })))
}

pub struct LoggedJson<T>(pub T);

impl<S, T> FromRequest<S> for LoggedJson<T>
where
    S: Send + Sync,
    T: serde::de::DeserializeOwned,
{
    type Rejection = ApiErr;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|e| err(StatusCode::BAD_REQUEST, &e.to_string()))?;
        match serde_json::from_slice::<T>(&bytes) {
            Ok(val) => Ok(LoggedJson(val)),
            Err(e) => {
                let preview = String::from_utf8_lossy(&bytes);
                let preview = &preview[..preview.len().min(4096)];
                warn!(error = %e, body_preview = %preview, "order rejected: JSON deserialization failed");
                Err(err(StatusCode::UNPROCESSABLE_ENTITY, &e.to_string()))
            }
        }
    }
}

/// Request payload for `POST /orders`.
#[derive(Deserialize)]
pub struct NewOrder {
    #[serde(rename = "symbol", deserialize_with = "parse_pair")]
    pub pair: Pair,
    pub side: Side,
    /// Limit price, or `0`/absent for a market order.
    #[serde(default)]
    pub price: Price,
    pub quantity: Quantity,
    #[serde(default)]
    pub ioc: bool,
    #[serde(default)]
    pub aon: bool,
}

/// Request payload for `PUT /orders/{symbol}/{id}`.
#[derive(Deserialize)]
pub struct ModifyOrder {
    pub side: Side,
    pub price: Price,
    pub quantity: Quantity,
}

#[derive(Serialize)]
pub struct OrderAck {
    pub order_id: OrderId,
    pub accepted: bool,
    pub trades: Vec<MatchedTrade>,
}

#[derive(Deserialize)]
pub struct TradesQuery {
    #[serde(default = "default_limit")]
    limit: usize,
    after: Option<FillId>,
}

fn default_limit() -> usize {
    100
}

#[derive(Serialize)]
pub struct TradesPage {
    items: Vec<Trade>,
    next: Option<FillId>,
}

/// `POST /orders`
pub async fn create_order(State(state): State<AppState>, LoggedJson(payload): LoggedJson<NewOrder>) -> Result<Json<OrderAck>, ApiErr> {
    if payload.quantity == 0 {
        return Err(err(StatusCode::BAD_REQUEST, "quantity must be > 0"));
    }
    let order_id = Uuid::new_v4().to_string();
    let mut conditions = OrderConditions::NONE;
    if payload.ioc {
        conditions |= OrderConditions::IMMEDIATE_OR_CANCEL;
    }
    if payload.aon {
        conditions |= OrderConditions::ALL_OR_NONE;
    }

    let id_for_entry = order_id.clone();
    let result = state
        .engine
        .call(move |market| {
            use crate::order::Order;
            use std::cell::RefCell;
            use std::rc::Rc;

            let order = Rc::new(RefCell::new(Order::new(id_for_entry.clone(), payload.side, payload.pair.symbol(), payload.quantity, payload.price)));
            let accepted = market.order_entry(order.clone(), conditions);
            let trades = order.borrow().trades().to_vec();
            (accepted, trades)
        })
        .await
        .map_err(|e| err(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()))?;

    let (accepted, trades) = result;
    if !accepted {
        return Err(err(StatusCode::BAD_REQUEST, "unknown symbol or duplicate order id"));
    }
    Ok(Json(OrderAck { order_id, accepted, trades }))
}

/// `PUT /orders/{symbol}/{id}`
pub async fn modify_order(
    State(state): State<AppState>,
    Path((symbol, order_id)): Path<(String, OrderId)>,
    LoggedJson(payload): LoggedJson<ModifyOrder>,
) -> Result<Json<OrderAck>, ApiErr> {
    let symbol = parse_pair_param(&symbol)?.symbol();
    let id = order_id.clone();
    let ok = state
        .engine
        .call(move |market| {
            use crate::order::Order;
            use std::cell::RefCell;
            use std::rc::Rc;

            let new_order = Rc::new(RefCell::new(Order::new(id.clone(), payload.side, symbol.clone(), payload.quantity, payload.price)));
            let applied = market.order_modify(new_order.clone());
            let trades = new_order.borrow().trades().to_vec();
            (applied, trades)
        })
        .await
        .map_err(|e| err(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()))?;

    let (applied, trades) = ok;
    if !applied {
        return Err(err(StatusCode::NOT_FOUND, "order not found"));
    }
    Ok(Json(OrderAck { order_id, accepted: applied, trades }))
}

/// `DELETE /orders/{symbol}/{id}`
pub async fn cancel_order(State(state): State<AppState>, Path((_symbol, order_id)): Path<(String, OrderId)>) -> impl IntoResponse {
    let id = order_id.clone();
    let cancelled = state.engine.call(move |market| market.order_cancel(&id)).await.unwrap_or(false);
    if cancelled {
        (StatusCode::OK, Json(json!({"status": "cancelled"})))
    } else {
        err(StatusCode::NOT_FOUND, "order not found")
    }
}

/// `GET /book/{symbol}`
pub async fn get_order_book(State(state): State<AppState>, Path(symbol): Path<String>) -> Result<Json<BookSnapshot>, ApiErr> {
    let symbol = parse_pair_param(&symbol)?.symbol();
    let snap = state
        .engine
        .call(move |market| market.book(&symbol).map(|b| b.snapshot()))
        .await
        .map_err(|e| err(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()))?;
    snap.map(Json).ok_or_else(|| err(StatusCode::NOT_FOUND, "unknown symbol"))
}

/// `GET /trades/{symbol}`
pub async fn get_trade_log(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(q): Query<TradesQuery>,
) -> Result<Json<TradesPage>, ApiErr> {
    let symbol = parse_pair_param(&symbol)?.symbol();
    let limit = q.limit.min(1000);
    let (items, next) = state.trades_for(&symbol, q.after, limit);
    Ok(Json(TradesPage { items, next }))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/orders", post(create_order))
        .route("/orders/{symbol}/{id}", put(modify_order).delete(cancel_order))
        .route("/trades/{symbol}", get(get_trade_log))
        .route("/book/{symbol}", get(get_order_book))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(false).level(tracing::Level::TRACE))
                .on_response(DefaultOnResponse::new().level(tracing::Level::TRACE)),
        )
        .with_state(state)
}
