//! HTTP API
//!
//! JSON endpoints over a [`Marketplace`]. Every stateful route is scoped to a
//! session namespace taken from the path.

use axum::{extract::{Path, Query, State}, http::StatusCode, response::{IntoResponse, Response}, routing::{get, post, put}, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::catalog::CatalogQuery;
use crate::checkout::CheckoutRequest;
use crate::domain::aggregates::{
    ArtisanDetails, ArtisanProduct, ArtisanProfile, ArtisanRegistration, Batch, CartError, FarmerDetails, FarmerProfile,
    FarmerRegistration, HuskOrder, IndustryDetails, IndustryProfile, IndustryRegistration, Listing, ListingError, OrderError,
    OrderStatus, ProductSnapshot, Role, RoleProfile, UserDetails, UserProfile, UserRegistration,
};
use crate::domain::value_objects::{OrderId, ProductId};
use crate::session::{Marketplace, Session};
use crate::storage::StorageError;
use crate::MarketplaceError;

#[derive(Clone, Debug)] pub struct AppState { pub marketplace: Marketplace }

impl AppState {
    fn session(&self, id: &str) -> Session { self.marketplace.session(id) }
    fn product(&self, id: ProductId) -> Result<ProductSnapshot, ApiError> {
        self.marketplace.catalog().get(id).cloned().ok_or(ApiError(MarketplaceError::ProductNotFound(id)))
    }
}

pub fn router(marketplace: Marketplace) -> Router {
    let state = AppState { marketplace };
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/sessions", post(create_session))
        .route("/api/v1/catalog", get(list_catalog))
        .route("/api/v1/catalog/:id", get(get_catalog_product))
        .route("/api/v1/sessions/:session/wishlist", get(list_wishlist).post(add_to_wishlist))
        .route("/api/v1/sessions/:session/wishlist/:id", axum::routing::delete(remove_from_wishlist))
        .route("/api/v1/sessions/:session/cart", get(get_cart).post(add_to_cart).delete(clear_cart))
        .route("/api/v1/sessions/:session/cart/:id", put(update_cart_item).delete(remove_cart_item))
        .route("/api/v1/sessions/:session/checkout", post(checkout))
        .route("/api/v1/sessions/:session/orders", get(list_orders))
        .route("/api/v1/sessions/:session/orders/last", get(last_order))
        .route("/api/v1/sessions/:session/orders/:id", get(get_order))
        .route("/api/v1/sessions/:session/orders/:id/cancel", post(cancel_order))
        .route("/api/v1/sessions/:session/orders/:id/status", post(advance_order))
        .route("/api/v1/sessions/:session/profiles/:role", get(get_profile).delete(remove_profile))
        .route("/api/v1/sessions/:session/profiles/user/details", put(update_user_details))
        .route("/api/v1/sessions/:session/register/user", post(register_user))
        .route("/api/v1/sessions/:session/register/farmer", post(start_farmer))
        .route("/api/v1/sessions/:session/register/farmer/complete", post(complete_farmer))
        .route("/api/v1/sessions/:session/register/artisan", post(start_artisan))
        .route("/api/v1/sessions/:session/register/artisan/complete", post(complete_artisan))
        .route("/api/v1/sessions/:session/register/industry", post(start_industry))
        .route("/api/v1/sessions/:session/register/industry/complete", post(complete_industry))
        .route("/api/v1/sessions/:session/batches", get(list_listings::<Batch>).post(create_listing::<Batch>))
        .route("/api/v1/sessions/:session/batches/:id", put(update_listing::<Batch>).delete(delete_listing::<Batch>))
        .route("/api/v1/sessions/:session/artisan-products", get(list_listings::<ArtisanProduct>).post(create_listing::<ArtisanProduct>))
        .route("/api/v1/sessions/:session/artisan-products/:id", put(update_listing::<ArtisanProduct>).delete(delete_listing::<ArtisanProduct>))
        .route("/api/v1/sessions/:session/husk-orders", get(list_listings::<HuskOrder>).post(create_listing::<HuskOrder>))
        .route("/api/v1/sessions/:session/husk-orders/:id", axum::routing::delete(delete_listing::<HuskOrder>))
        .with_state(state)
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug)]
pub struct ApiError(pub MarketplaceError);

impl From<MarketplaceError> for ApiError {
    fn from(e: MarketplaceError) -> Self { Self(e) }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            MarketplaceError::ProductNotFound(_) => (StatusCode::NOT_FOUND, "PRODUCT_NOT_FOUND"),
            MarketplaceError::Cart(CartError::ItemNotFound(_)) => (StatusCode::NOT_FOUND, "CART_ITEM_NOT_FOUND"),
            MarketplaceError::Order(OrderError::NotFound(_)) => (StatusCode::NOT_FOUND, "ORDER_NOT_FOUND"),
            MarketplaceError::Listing(ListingError::NotFound(_)) => (StatusCode::NOT_FOUND, "LISTING_NOT_FOUND"),
            MarketplaceError::Order(OrderError::CannotCancel { .. }) => (StatusCode::CONFLICT, "CANNOT_CANCEL"),
            MarketplaceError::Order(OrderError::InvalidTransition { .. }) => (StatusCode::CONFLICT, "INVALID_TRANSITION"),
            MarketplaceError::Order(OrderError::DuplicateId(_)) | MarketplaceError::Listing(ListingError::DuplicateId(_)) => (StatusCode::CONFLICT, "DUPLICATE_ID"),
            MarketplaceError::RegistrationNotStarted(_) => (StatusCode::CONFLICT, "REGISTRATION_NOT_STARTED"),
            MarketplaceError::Storage(StorageError::Conflict { .. }) => (StatusCode::CONFLICT, "CONCURRENT_UPDATE"),
            MarketplaceError::ProfileRequired(_) => (StatusCode::PRECONDITION_REQUIRED, "PROFILE_REQUIRED"),
            MarketplaceError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_FAILED"),
            MarketplaceError::EmptyCheckout => (StatusCode::UNPROCESSABLE_ENTITY, "EMPTY_CHECKOUT"),
            MarketplaceError::Cart(CartError::Money(_)) | MarketplaceError::Money(_) => (StatusCode::UNPROCESSABLE_ENTITY, "CURRENCY_MISMATCH"),
            MarketplaceError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let (message, details) = match &self.0 {
            MarketplaceError::ProfileRequired(role) => (
                format!("{} profile required, register at {}", role, role.registration_route()),
                Some(json!({ "role": role, "registrationRoute": role.registration_route() })),
            ),
            MarketplaceError::Validation(errors) => (self.0.to_string(), serde_json::to_value(errors).ok()),
            MarketplaceError::Storage(_) => ("A storage error occurred".to_string(), None),
            other => (other.to_string(), None),
        };
        if status.is_server_error() {
            tracing::error!(error_code = code, error = %self.0, "request failed");
        } else {
            tracing::debug!(error_code = code, message = %message, "request rejected");
        }
        (status, Json(ErrorBody { code, message, details })).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

// =============================================================================
// Catalog and sessions
// =============================================================================

async fn health(State(s): State<AppState>) -> impl IntoResponse {
    let healthy = s.marketplace.health_check().await;
    let (status, label) = if healthy { (StatusCode::OK, "healthy") } else { (StatusCode::SERVICE_UNAVAILABLE, "unhealthy") };
    (status, Json(json!({ "status": label, "service": "areca-market" })))
}

async fn create_session() -> impl IntoResponse {
    (StatusCode::CREATED, Json(json!({ "session": Marketplace::new_session_id() })))
}

async fn list_catalog(State(s): State<AppState>, Query(q): Query<CatalogQuery>) -> Json<Vec<ProductSnapshot>> {
    Json(s.marketplace.catalog().query(&q))
}

async fn get_catalog_product(State(s): State<AppState>, Path(id): Path<u64>) -> ApiResult<ProductSnapshot> {
    Ok(Json(s.product(ProductId(id))?))
}

// =============================================================================
// Wishlist and cart
// =============================================================================

#[derive(Debug, Deserialize)] #[serde(rename_all = "camelCase")] pub struct ProductRef { pub product_id: u64 }
#[derive(Debug, Deserialize)] pub struct QuantityUpdate { pub quantity: u32 }

async fn list_wishlist(State(s): State<AppState>, Path(session): Path<String>) -> ApiResult<Vec<ProductSnapshot>> {
    Ok(Json(s.session(&session).wishlist().list().await?))
}

async fn add_to_wishlist(State(s): State<AppState>, Path(session): Path<String>, Json(r): Json<ProductRef>) -> Result<impl IntoResponse, ApiError> {
    let product = s.product(ProductId(r.product_id))?;
    let outcome = s.session(&session).wishlist().add(product).await?;
    Ok(Json(json!({ "outcome": outcome })))
}

async fn remove_from_wishlist(State(s): State<AppState>, Path((session, id)): Path<(String, u64)>) -> Result<StatusCode, ApiError> {
    s.session(&session).wishlist().remove(ProductId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_cart(State(s): State<AppState>, Path(session): Path<String>) -> ApiResult<crate::stores::CartSummary> {
    Ok(Json(s.session(&session).cart().summary().await?))
}

async fn add_to_cart(State(s): State<AppState>, Path(session): Path<String>, Json(r): Json<ProductRef>) -> Result<impl IntoResponse, ApiError> {
    let product = s.product(ProductId(r.product_id))?;
    let quantity = s.session(&session).cart().add(product).await?;
    Ok(Json(json!({ "productId": r.product_id, "quantity": quantity })))
}

async fn update_cart_item(State(s): State<AppState>, Path((session, id)): Path<(String, u64)>, Json(u): Json<QuantityUpdate>) -> ApiResult<crate::stores::CartSummary> {
    let cart = s.session(&session).cart();
    cart.update_quantity(ProductId(id), u.quantity).await?;
    Ok(Json(cart.summary().await?))
}

async fn remove_cart_item(State(s): State<AppState>, Path((session, id)): Path<(String, u64)>) -> Result<StatusCode, ApiError> {
    s.session(&session).cart().remove(ProductId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn clear_cart(State(s): State<AppState>, Path(session): Path<String>) -> Result<StatusCode, ApiError> {
    s.session(&session).cart().clear().await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Checkout and orders
// =============================================================================

#[derive(Debug, Deserialize)] pub struct OrderListParams { pub highlight: Option<String> }
#[derive(Debug, Deserialize)] pub struct StatusUpdate { pub status: OrderStatus }

async fn checkout(State(s): State<AppState>, Path(session): Path<String>, Json(req): Json<CheckoutRequest>) -> Result<impl IntoResponse, ApiError> {
    let order = s.session(&session).checkout().place(req).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

async fn list_orders(State(s): State<AppState>, Path(session): Path<String>, Query(p): Query<OrderListParams>) -> ApiResult<crate::stores::OrderListing> {
    let highlight = p.highlight.map(OrderId::from);
    Ok(Json(s.session(&session).orders().list_with_highlight(highlight.as_ref()).await?))
}

async fn last_order(State(s): State<AppState>, Path(session): Path<String>) -> Result<Response, ApiError> {
    Ok(match s.session(&session).orders().last_placed().await? {
        Some(order) => Json(order).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

async fn get_order(State(s): State<AppState>, Path((session, id)): Path<(String, String)>) -> Result<Response, ApiError> {
    Ok(Json(s.session(&session).orders().get(&OrderId::from(id)).await?).into_response())
}

async fn cancel_order(State(s): State<AppState>, Path((session, id)): Path<(String, String)>) -> Result<Response, ApiError> {
    Ok(Json(s.session(&session).orders().cancel(&OrderId::from(id)).await?).into_response())
}

async fn advance_order(State(s): State<AppState>, Path((session, id)): Path<(String, String)>, Json(u): Json<StatusUpdate>) -> Result<Response, ApiError> {
    Ok(Json(s.session(&session).orders().advance(&OrderId::from(id), u.status).await?).into_response())
}

// =============================================================================
// Profiles and registration
// =============================================================================

async fn required<P: RoleProfile>(session: &Session) -> Result<Response, ApiError> {
    Ok(Json(session.profiles().require::<P>().await?).into_response())
}

async fn get_profile(State(s): State<AppState>, Path((session, role)): Path<(String, Role)>) -> Result<Response, ApiError> {
    let session = s.session(&session);
    match role {
        Role::User => required::<UserProfile>(&session).await,
        Role::Farmer => required::<FarmerProfile>(&session).await,
        Role::Artisan => required::<ArtisanProfile>(&session).await,
        Role::Industry => required::<IndustryProfile>(&session).await,
    }
}

async fn remove_profile(State(s): State<AppState>, Path((session, role)): Path<(String, Role)>) -> Result<StatusCode, ApiError> {
    s.session(&session).profiles().remove(role).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn update_user_details(State(s): State<AppState>, Path(session): Path<String>, Json(d): Json<UserDetails>) -> ApiResult<UserProfile> {
    Ok(Json(s.session(&session).profiles().update_user_details(d).await?))
}

async fn register_user(State(s): State<AppState>, Path(session): Path<String>, Json(r): Json<UserRegistration>) -> Result<impl IntoResponse, ApiError> {
    let profile = s.session(&session).profiles().register_user(r).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

async fn start_farmer(State(s): State<AppState>, Path(session): Path<String>, Json(r): Json<FarmerRegistration>) -> Result<StatusCode, ApiError> {
    s.session(&session).profiles().start_farmer_registration(r).await?;
    Ok(StatusCode::ACCEPTED)
}

async fn complete_farmer(State(s): State<AppState>, Path(session): Path<String>, Json(d): Json<FarmerDetails>) -> Result<impl IntoResponse, ApiError> {
    let profile = s.session(&session).profiles().complete_farmer_registration(d).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

async fn start_artisan(State(s): State<AppState>, Path(session): Path<String>, Json(r): Json<ArtisanRegistration>) -> Result<StatusCode, ApiError> {
    s.session(&session).profiles().start_artisan_registration(r).await?;
    Ok(StatusCode::ACCEPTED)
}

async fn complete_artisan(State(s): State<AppState>, Path(session): Path<String>, Json(d): Json<ArtisanDetails>) -> Result<impl IntoResponse, ApiError> {
    let profile = s.session(&session).profiles().complete_artisan_registration(d).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

async fn start_industry(State(s): State<AppState>, Path(session): Path<String>, Json(r): Json<IndustryRegistration>) -> Result<StatusCode, ApiError> {
    s.session(&session).profiles().start_industry_registration(r).await?;
    Ok(StatusCode::ACCEPTED)
}

async fn complete_industry(State(s): State<AppState>, Path(session): Path<String>, Json(d): Json<IndustryDetails>) -> Result<impl IntoResponse, ApiError> {
    let profile = s.session(&session).profiles().complete_industry_registration(d).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

// =============================================================================
// Seller listings
// =============================================================================

async fn list_listings<T: Listing>(State(s): State<AppState>, Path(session): Path<String>) -> ApiResult<Vec<T>> {
    Ok(Json(s.session(&session).listings::<T>().list().await?))
}

async fn create_listing<T: Listing>(State(s): State<AppState>, Path(session): Path<String>, Json(draft): Json<T::Draft>) -> Result<Response, ApiError> {
    let listing = s.session(&session).listings::<T>().create(draft).await?;
    Ok((StatusCode::CREATED, Json(listing)).into_response())
}

async fn update_listing<T: Listing>(State(s): State<AppState>, Path((session, id)): Path<(String, String)>, Json(draft): Json<T::Draft>) -> ApiResult<T> {
    Ok(Json(s.session(&session).listings::<T>().update(&id, draft).await?))
}

async fn delete_listing<T: Listing>(State(s): State<AppState>, Path((session, id)): Path<(String, String)>) -> Result<StatusCode, ApiError> {
    let removed = s.session(&session).listings::<T>().delete(&id).await?;
    if removed { Ok(StatusCode::NO_CONTENT) } else { Err(ApiError(ListingError::NotFound(id).into())) }
}
