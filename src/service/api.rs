use crate::{
    application::app::Application,
    domain::{
        errors::ApiError,
        models::{
            AlertTemplate, AlertTransaction, NewTransaction, SmsLogEntry, SmsMessage, SmsReceipt,
            Transaction,
        },
    },
    infrastructure::shutdown::Shutdown,
};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

const DEFAULT_HISTORY_LIMIT: usize = 10;

// Fields the service assigns itself; client-supplied values are dropped.
const SERVICE_ASSIGNED_FIELDS: [&str; 3] = ["id", "timestamp", "fraud_score"];

pub fn router<A>(app: Arc<A>) -> Router
where
    A: Application + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(home))
        .route("/api/status", get(status))
        .route(
            "/api/transactions",
            get(list_transactions::<A>).post(create_transaction::<A>),
        )
        .route("/api/send-sms", post(send_sms::<A>))
        .route("/api/send-fraud-alert", post(send_fraud_alert::<A>))
        .route(
            "/api/send-transaction-confirmation",
            post(send_transaction_confirmation::<A>),
        )
        .route("/api/sms-history", get(sms_history::<A>))
        .route(
            "/api/sms-history/:transaction_id",
            get(sms_history_by_transaction::<A>),
        )
        .with_state(app)
        .layer(CorsLayer::permissive())
}

pub async fn start_server<A, S>(shutdown: S, app: Arc<A>, port: u16) -> anyhow::Result<()>
where
    A: Application + Send + Sync + 'static,
    S: Shutdown + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;

    tracing::info!("API server started on port {}", port);

    let mut shutdown_rx = shutdown.subscribe();
    axum::serve(listener, router(app))
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
            tracing::warn!("API server received shutdown signal");
        })
        .await?;

    Ok(())
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::MissingField(_) | ApiError::InvalidFormat(_) => StatusCode::BAD_REQUEST,
            ApiError::ServiceUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Storage(e) => {
                tracing::error!("Storage failure: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status == StatusCode::BAD_REQUEST {
            tracing::warn!("Rejected request: {}", self);
        }

        (status, Json(json!({ "success": false, "error": self.to_string() }))).into_response()
    }
}

#[derive(Serialize)]
struct HomeResponse {
    status: &'static str,
    message: &'static str,
}

async fn home() -> Json<HomeResponse> {
    Json(HomeResponse {
        status: "connected",
        message: "Fraud detection backend running",
    })
}

#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    timestamp: String,
}

async fn status() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "connected",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
    })
}

async fn list_transactions<A>(
    State(app_state): State<Arc<A>>,
) -> Result<Json<Vec<Transaction>>, ApiError>
where
    A: Application + Send + Sync + 'static,
{
    let transactions = app_state.list_transactions().await?;
    Ok(Json(transactions))
}

#[derive(Deserialize)]
struct CreateTransactionRequest {
    account_id: Option<String>,
    amount: Option<f64>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl CreateTransactionRequest {
    fn validate(self) -> Result<NewTransaction, ApiError> {
        let account_id = self
            .account_id
            .filter(|id| !id.trim().is_empty())
            .ok_or(ApiError::MissingField("account_id"))?;
        let amount = self.amount.ok_or(ApiError::MissingField("amount"))?;
        if !(amount.is_finite() && amount >= 0.0) {
            return Err(ApiError::InvalidFormat(format!(
                "amount must be a non-negative number, got {}",
                amount
            )));
        }

        let mut extra = self.extra;
        for field in SERVICE_ASSIGNED_FIELDS {
            extra.remove(field);
        }

        Ok(NewTransaction {
            account_id,
            amount,
            extra,
        })
    }
}

#[derive(Serialize)]
struct CreateTransactionResponse {
    status: &'static str,
    transaction: Transaction,
}

async fn create_transaction<A>(
    State(app_state): State<Arc<A>>,
    payload: Result<Json<CreateTransactionRequest>, JsonRejection>,
) -> Result<Json<CreateTransactionResponse>, ApiError>
where
    A: Application + Send + Sync + 'static,
{
    let Json(request) = payload.map_err(|e| ApiError::InvalidFormat(e.body_text()))?;
    let candidate = request.validate()?;

    let transaction = app_state.append_transaction(candidate).await?;

    Ok(Json(CreateTransactionResponse {
        status: "success",
        transaction,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendSmsRequest {
    phone_number: Option<String>,
    message: Option<String>,
    transaction_id: Option<String>,
}

async fn send_sms<A>(
    State(app_state): State<Arc<A>>,
    payload: Result<Json<SendSmsRequest>, JsonRejection>,
) -> Result<Json<SmsReceipt>, ApiError>
where
    A: Application + Send + Sync + 'static,
{
    let Json(request) = payload.map_err(|e| ApiError::InvalidFormat(e.body_text()))?;
    let to = request
        .phone_number
        .ok_or(ApiError::MissingField("phoneNumber"))?;
    let body = request
        .message
        .filter(|m| !m.is_empty())
        .ok_or(ApiError::MissingField("message"))?;

    let receipt = app_state
        .send_sms(SmsMessage {
            to,
            body,
            transaction_id: request.transaction_id,
        })
        .await?;
    Ok(Json(receipt))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AlertRequest {
    phone_number: Option<String>,
    transaction_data: Option<AlertTransaction>,
}

async fn send_fraud_alert<A>(
    State(app_state): State<Arc<A>>,
    payload: Result<Json<AlertRequest>, JsonRejection>,
) -> Result<Json<SmsReceipt>, ApiError>
where
    A: Application + Send + Sync + 'static,
{
    send_alert(app_state, payload, AlertTemplate::Fraud).await
}

async fn send_transaction_confirmation<A>(
    State(app_state): State<Arc<A>>,
    payload: Result<Json<AlertRequest>, JsonRejection>,
) -> Result<Json<SmsReceipt>, ApiError>
where
    A: Application + Send + Sync + 'static,
{
    send_alert(app_state, payload, AlertTemplate::Confirmation).await
}

async fn send_alert<A>(
    app_state: Arc<A>,
    payload: Result<Json<AlertRequest>, JsonRejection>,
    template: AlertTemplate,
) -> Result<Json<SmsReceipt>, ApiError>
where
    A: Application + Send + Sync + 'static,
{
    let Json(request) = payload.map_err(|e| ApiError::InvalidFormat(e.body_text()))?;
    let phone_number = request
        .phone_number
        .ok_or(ApiError::MissingField("phoneNumber"))?;
    let transaction = request
        .transaction_data
        .ok_or(ApiError::MissingField("transactionData"))?;

    let receipt = app_state
        .send_alert(transaction, phone_number, template)
        .await?;
    Ok(Json(receipt))
}

#[derive(Deserialize)]
struct HistoryQuery {
    limit: Option<usize>,
}

async fn sms_history<A>(
    State(app_state): State<Arc<A>>,
    Query(params): Query<HistoryQuery>,
) -> Json<Vec<SmsLogEntry>>
where
    A: Application + Send + Sync + 'static,
{
    let limit = params
        .limit
        .filter(|l| *l > 0)
        .unwrap_or(DEFAULT_HISTORY_LIMIT);
    Json(app_state.sms_history(limit).await)
}

async fn sms_history_by_transaction<A>(
    State(app_state): State<Arc<A>>,
    Path(transaction_id): Path<String>,
) -> Json<Vec<SmsLogEntry>>
where
    A: Application + Send + Sync + 'static,
{
    Json(app_state.sms_by_transaction(transaction_id).await)
}
