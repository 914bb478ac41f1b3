//! Checkout endpoints. `createOrder` mints a gateway order for the hosted
//! checkout; `verifyOrder` records the confirmation the checkout hands back.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;
use tracing::warn;

use crate::api::json_body;
use crate::auth::roles::{Action, Resource};
use crate::auth::AuthenticatedUser;
use crate::database::notification_repository::{NewNotification, NotificationKind};
use crate::database::order_repository::Order;
use crate::error::{AppError, AppResult};
use crate::events;
use crate::payments::types::{
    to_minor_units, CreateOrderBody, GatewayOrder, GatewayOrderRequest, VerifyOrderBody,
    VerifyOrderResponse, VerifyPaymentRequest,
};
use crate::payments::{PaymentVerifier, VerificationOutcome};
use crate::state::AppState;

/// Razorpay caps receipts at 40 characters
const MAX_RECEIPT_LEN: usize = 40;

fn receipt_for(project_id: Option<&str>) -> String {
    let receipt = match project_id {
        Some(id) => format!("order_{}", id),
        None => format!("rcpt_{}", uuid::Uuid::new_v4().simple()),
    };
    receipt.chars().take(MAX_RECEIPT_LEN).collect()
}

pub async fn create_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    body: Result<Json<CreateOrderBody>, JsonRejection>,
) -> AppResult<Json<GatewayOrder>> {
    let request = json_body(body)?;

    let amount = to_minor_units(request.amount)
        .ok_or_else(|| AppError::validation("amount must be a positive number"))?;

    let project_id = request.project_id.filter(|id| !id.trim().is_empty());
    if let Some(project_id) = &project_id {
        let actor = user.authorize(&state, Resource::Orders, Action::Read).await?;
        let order = state
            .stores
            .orders
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| AppError::not_found("Order"))?;
        if !actor.covers_owner(&order.user_id) {
            return Err(AppError::forbidden("order belongs to another user"));
        }
    }

    let gateway_order = state
        .gateway
        .create_order(GatewayOrderRequest {
            amount,
            currency: request.currency.unwrap_or_else(|| state.currency.clone()),
            receipt: receipt_for(project_id.as_deref()),
            notes: Some(json!({
                "projectId": project_id,
                "userId": user.user_id,
            })),
        })
        .await?;

    Ok(Json(gateway_order))
}

async fn announce_payment(state: &AppState, request: &VerifyPaymentRequest, order: &Order) {
    events::record_activity(
        state,
        &request.user_id,
        "verify_payment",
        "order",
        &order.id,
        Some(json!({
            "gateway_order_id": request.gateway_order_id,
            "gateway_payment_id": request.gateway_payment_id,
            "amount": request.amount,
        })),
    )
    .await;

    events::notify(
        state,
        vec![NewNotification::new(
            &order.user_id,
            NotificationKind::Payment,
            format!(
                "Payment of {:.2} {} received for '{}'",
                request.amount, state.currency, order.title
            ),
        )
        .for_order(&order.id)],
    )
    .await;

    events::notify_admins(
        state,
        NewNotification::new(
            "",
            NotificationKind::Payment,
            format!("Payment received for order '{}'", order.title),
        )
        .for_order(&order.id),
        Some(&order.user_id),
    )
    .await;
}

/// Not behind session auth: the gateway signature is the proof of origin.
pub async fn verify_order(
    State(state): State<AppState>,
    body: Result<Json<VerifyOrderBody>, JsonRejection>,
) -> (StatusCode, Json<VerifyOrderResponse>) {
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => {
            warn!("Rejected verification body: {}", rejection.body_text());
            return (
                StatusCode::BAD_REQUEST,
                Json(VerifyOrderResponse::failed("Invalid request body")),
            );
        }
    };

    let request = match body.into_request() {
        Ok(request) => request,
        Err(missing) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(VerifyOrderResponse::failed(format!(
                    "Missing required fields: {}",
                    missing.join(", ")
                ))),
            );
        }
    };

    let verifier = PaymentVerifier::new(
        state.gateway.as_ref(),
        state.stores.orders.as_ref(),
        state.stores.transactions.as_ref(),
        &state.currency,
    );

    match verifier.verify(&request).await {
        Ok(VerificationOutcome::Verified { transaction, order }) => {
            announce_payment(&state, &request, &order).await;
            (
                StatusCode::OK,
                Json(VerifyOrderResponse::ok(
                    "Payment verified successfully",
                    transaction.id,
                )),
            )
        }
        Ok(VerificationOutcome::SignatureMismatch { .. }) => (
            StatusCode::BAD_REQUEST,
            Json(VerifyOrderResponse::failed(
                "Payment verification failed: invalid signature",
            )),
        ),
        Err(e) => {
            let status = e.status_code();
            if status.is_server_error() {
                tracing::error!(order_id = %request.order_id, "Payment verification failed: {}", e);
            }
            (status, Json(VerifyOrderResponse::failed(e.to_string())))
        }
    }
}
