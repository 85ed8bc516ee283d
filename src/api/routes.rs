//! HTTP surface. Handlers dispatch over the storage backend: Postgres for
//! live accounts, the in-memory demo session when no database is configured.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::api::auth::{self, AuthUser};
use crate::demo::DemoSession;
use crate::error::TradeError;
use crate::persistence::{self, PgStore};
use crate::quotes::synthetic::unit_roll;
use crate::quotes::{HttpMarketData, QuoteFeed};
use crate::settlement::tamg::{self, DEFAULT_TAMG_PRICE};
use crate::settlement::{settle_trade, TimerSimulator, TradeIntent, TradeStore};
use crate::transfers::{self, Transfer};
use crate::types::asset::AssetClass;
use crate::types::position::Position;
use crate::types::quote::Quote;
use crate::types::trade::{Trade, TradeSide};

/// Trade journal entries shown to the user.
pub const TRADE_DISPLAY_LIMIT: usize = 50;

const TAMG_PRICE_KEY: &str = "tamg_price";
const DEFAULT_DEMO_BALANCE: f64 = 10_000.0;

/// Login credential kept in memory (hydrated from the profiles table when a
/// database is configured).
#[derive(Debug, Clone)]
pub struct Credential {
    pub user_id: Uuid,
    pub username: String,
    pub password_hash: String,
}

pub type CredentialStore = Arc<RwLock<HashMap<String, Credential>>>;

/// In-memory backend: one practice profile, admin price held locally.
#[derive(Clone)]
pub struct MemoryBackend {
    pub session: Arc<DemoSession>,
    pub tamg_price: Arc<RwLock<f64>>,
}

impl MemoryBackend {
    pub fn new(session: DemoSession) -> Self {
        Self {
            session: Arc::new(session),
            tamg_price: Arc::new(RwLock::new(DEFAULT_TAMG_PRICE)),
        }
    }
}

/// Storage strategy behind the HTTP surface.
#[derive(Clone)]
pub enum Backend {
    Postgres(PgStore),
    Memory(MemoryBackend),
}

#[derive(Clone)]
pub struct AppState {
    pub backend: Backend,
    pub feed: Arc<QuoteFeed<HttpMarketData>>,
    pub simulator: Arc<TimerSimulator>,
    pub jwt_secret: Arc<Vec<u8>>,
    pub credentials: CredentialStore,
}

// --- Error mapping ---

/// User-facing error: a status and one short message. Internals stay in the
/// logs.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: "invalid or missing credentials".to_string(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: message.into(),
        }
    }

    fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "internal error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "error": self.message }))).into_response()
    }
}

impl From<TradeError> for ApiError {
    fn from(err: TradeError) -> Self {
        if err.is_validation() {
            Self {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                message: err.to_string(),
            }
        } else {
            tracing::error!(%err, "storage failure");
            Self::internal()
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::from(TradeError::from(err))
    }
}

// --- Auth handlers ---

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    username: String,
    password: String,
    /// Honored by the demo backend only; live accounts start at zero and
    /// fund via deposits.
    starting_balance: Option<f64>,
}

#[derive(Debug, Serialize)]
struct RegisterResponse {
    user_id: Uuid,
    username: String,
}

async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let username = req.username.trim().to_lowercase();
    if username.is_empty() || req.password.is_empty() {
        return Err(ApiError::bad_request("username and password are required"));
    }
    if state.credentials.read().await.contains_key(&username) {
        return Err(ApiError::conflict("username already taken"));
    }

    let password_hash =
        auth::hash_password(&req.password).map_err(|_| ApiError::internal())?;
    let user_id = Uuid::new_v4();

    match &state.backend {
        Backend::Postgres(store) => {
            persistence::insert_profile(store.pool(), user_id, &username, &password_hash, 0.0)
                .await?;
        }
        Backend::Memory(mem) => {
            // One practice profile per session; registering again starts a
            // fresh session with the chosen balance.
            let starting = req.starting_balance.unwrap_or(DEFAULT_DEMO_BALANCE);
            if !(starting > 0.0) {
                return Err(ApiError::bad_request("starting balance must be positive"));
            }
            mem.session.start_over(user_id, starting).await;
        }
    }

    state.credentials.write().await.insert(
        username.clone(),
        Credential {
            user_id,
            username: username.clone(),
            password_hash,
        },
    );

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse { user_id, username }),
    ))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    token: String,
    user_id: Uuid,
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let username = req.username.trim().to_lowercase();
    let credential = state
        .credentials
        .read()
        .await
        .get(&username)
        .cloned()
        .ok_or_else(ApiError::unauthorized)?;
    if !auth::verify_password(&credential.password_hash, &req.password) {
        return Err(ApiError::unauthorized());
    }
    let token = auth::issue_token(&state.jwt_secret, credential.user_id)
        .map_err(|_| ApiError::internal())?;
    Ok(Json(LoginResponse {
        token,
        user_id: credential.user_id,
    }))
}

// --- Quotes ---

#[derive(Debug, Deserialize)]
struct QuoteQuery {
    #[serde(default = "default_class")]
    class: AssetClass,
}

fn default_class() -> AssetClass {
    AssetClass::Stock
}

async fn get_quote(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<QuoteQuery>,
) -> Result<Json<Quote>, ApiError> {
    if query.class == AssetClass::Tamg {
        return Err(ApiError::bad_request("TAMG is priced by /tamg/price"));
    }
    Ok(Json(state.feed.quote(&symbol, query.class).await))
}

// --- Trading ---

#[derive(Debug, Deserialize)]
struct TradeRequest {
    symbol: String,
    side: TradeSide,
    asset_class: AssetClass,
    shares: f64,
}

#[derive(Debug, Serialize)]
struct TradeResponse {
    trade: Trade,
    balance: f64,
    position: Option<Position>,
}

async fn place_trade(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<TradeRequest>,
) -> Result<Json<TradeResponse>, ApiError> {
    if req.asset_class == AssetClass::Tamg {
        return Err(ApiError::bad_request(
            "TAMG trades go through /tamg/subscribe and /tamg/liquidate",
        ));
    }
    let quote = state.feed.quote(&req.symbol, req.asset_class).await;
    let intent = TradeIntent {
        user_id: user.user_id,
        symbol: req.symbol.to_uppercase(),
        side: req.side,
        asset_class: req.asset_class,
        shares: req.shares,
        price_per_share: quote.price,
    };
    let settled = match &state.backend {
        Backend::Postgres(store) => {
            settle_trade(store, state.simulator.as_ref(), &intent).await?
        }
        Backend::Memory(mem) => {
            settle_trade(mem.session.as_ref(), state.simulator.as_ref(), &intent).await?
        }
    };
    Ok(Json(TradeResponse {
        trade: settled.trade,
        balance: settled.balance,
        position: settled.position,
    }))
}

async fn list_trades(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<Trade>>, ApiError> {
    let trades = match &state.backend {
        Backend::Postgres(store) => store.recent_trades(user.user_id, TRADE_DISPLAY_LIMIT).await?,
        Backend::Memory(mem) => {
            mem.session
                .recent_trades(user.user_id, TRADE_DISPLAY_LIMIT)
                .await?
        }
    };
    Ok(Json(trades))
}

async fn portfolio(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<Position>>, ApiError> {
    let positions = match &state.backend {
        Backend::Postgres(store) => store.positions(user.user_id).await?,
        Backend::Memory(mem) => mem.session.positions(user.user_id).await?,
    };
    Ok(Json(positions))
}

#[derive(Debug, Serialize)]
struct BalanceResponse {
    balance: f64,
}

async fn balance(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<BalanceResponse>, ApiError> {
    let balance = match &state.backend {
        Backend::Postgres(store) => store.balance(user.user_id).await?,
        Backend::Memory(mem) => mem.session.balance(user.user_id).await?,
    };
    Ok(Json(BalanceResponse { balance }))
}

// --- TAMG ---

async fn current_tamg_price(state: &AppState) -> Result<f64, ApiError> {
    match &state.backend {
        Backend::Postgres(store) => {
            let configured = persistence::get_setting(store.pool(), TAMG_PRICE_KEY).await?;
            Ok(configured
                .and_then(|value| value.parse().ok())
                .unwrap_or(DEFAULT_TAMG_PRICE))
        }
        Backend::Memory(mem) => Ok(*mem.tamg_price.read().await),
    }
}

#[derive(Debug, Serialize)]
struct TamgPriceResponse {
    price: f64,
}

async fn tamg_price(State(state): State<AppState>) -> Result<Json<TamgPriceResponse>, ApiError> {
    let price = current_tamg_price(&state).await?;
    Ok(Json(TamgPriceResponse { price }))
}

#[derive(Debug, Deserialize)]
struct TamgPriceRequest {
    price: f64,
}

/// Admin-configured scalar. Role separation is handled upstream and out of
/// scope here; any authenticated caller may set it.
async fn set_tamg_price(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(req): Json<TamgPriceRequest>,
) -> Result<Json<TamgPriceResponse>, ApiError> {
    if !(req.price > 0.0) {
        return Err(TradeError::NonPositivePrice.into());
    }
    match &state.backend {
        Backend::Postgres(store) => {
            persistence::set_setting(store.pool(), TAMG_PRICE_KEY, &req.price.to_string()).await?;
        }
        Backend::Memory(mem) => *mem.tamg_price.write().await = req.price,
    }
    Ok(Json(TamgPriceResponse { price: req.price }))
}

#[derive(Debug, Deserialize)]
struct TamgTradeRequest {
    shares: f64,
}

async fn tamg_subscribe(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<TamgTradeRequest>,
) -> Result<Json<TradeResponse>, ApiError> {
    let price = current_tamg_price(&state).await?;
    let settled = match &state.backend {
        Backend::Postgres(store) => {
            tamg::subscribe(store, state.simulator.as_ref(), user.user_id, req.shares, price)
                .await?
        }
        Backend::Memory(mem) => {
            tamg::subscribe(
                mem.session.as_ref(),
                state.simulator.as_ref(),
                user.user_id,
                req.shares,
                price,
            )
            .await?
        }
    };
    Ok(Json(TradeResponse {
        trade: settled.trade,
        balance: settled.balance,
        position: settled.position,
    }))
}

async fn tamg_liquidate(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<TamgTradeRequest>,
) -> Result<Json<TradeResponse>, ApiError> {
    let price = current_tamg_price(&state).await?;
    let settled = match &state.backend {
        Backend::Postgres(store) => {
            tamg::liquidate(store, state.simulator.as_ref(), user.user_id, req.shares, price)
                .await?
        }
        Backend::Memory(mem) => {
            tamg::liquidate(
                mem.session.as_ref(),
                state.simulator.as_ref(),
                user.user_id,
                req.shares,
                price,
            )
            .await?
        }
    };
    Ok(Json(TradeResponse {
        trade: settled.trade,
        balance: settled.balance,
        position: settled.position,
    }))
}

// --- Transfers ---

fn live_pool(state: &AppState) -> Result<&sqlx::PgPool, ApiError> {
    match &state.backend {
        Backend::Postgres(store) => Ok(store.pool()),
        Backend::Memory(_) => Err(ApiError::bad_request(
            "transfers are not available in demo mode",
        )),
    }
}

#[derive(Debug, Deserialize)]
struct TransferRequest {
    amount: f64,
}

async fn deposit(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<TransferRequest>,
) -> Result<Json<Transfer>, ApiError> {
    let pool = live_pool(&state)?;
    Ok(Json(transfers::deposit(pool, user.user_id, req.amount).await?))
}

async fn withdraw(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<TransferRequest>,
) -> Result<Json<Transfer>, ApiError> {
    let pool = live_pool(&state)?;
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos() as u64;
    let roll = unit_roll(seed ^ user.user_id.as_u128() as u64);
    Ok(Json(transfers::withdraw(pool, user.user_id, req.amount, roll).await?))
}

async fn list_transfers(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<Transfer>>, ApiError> {
    let pool = live_pool(&state)?;
    Ok(Json(
        persistence::list_transfers_for_user(pool, user.user_id, TRADE_DISPLAY_LIMIT).await?,
    ))
}

// --- Router ---

async fn health() -> &'static str {
    "healthy"
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/quotes/{symbol}", get(get_quote))
        .route("/trades", post(place_trade).get(list_trades))
        .route("/portfolio", get(portfolio))
        .route("/balance", get(balance))
        .route("/tamg/price", get(tamg_price))
        .route("/tamg/subscribe", post(tamg_subscribe))
        .route("/tamg/liquidate", post(tamg_liquidate))
        .route("/admin/tamg-price", put(set_tamg_price))
        .route("/transfers", get(list_transfers))
        .route("/transfers/deposit", post(deposit))
        .route("/transfers/withdraw", post(withdraw))
        .with_state(state)
}
