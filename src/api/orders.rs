use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::api::{json_body, patch_object, require_text, typed_patch};
use crate::auth::roles::{Action, Resource, Role};
use crate::auth::{Actor, AuthenticatedUser};
use crate::database::delivery_address_repository::{AddressInput, DeliveryAddress};
use crate::database::notification_repository::{NewNotification, NotificationKind};
use crate::database::order_repository::{NewOrder, Order, OrderFilter, OrderPatch, OrderStatus};
use crate::database::payment_transaction_repository::PaymentTransaction;
use crate::error::{AppError, AppResult};
use crate::events;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct OrderQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub title: String,
    pub description: Option<String>,
    pub project_type: Option<String>,
    pub requirements: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub amount: f64,
    pub delivery_address: Option<AddressInput>,
}

#[derive(Debug, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payments: Option<Vec<PaymentTransaction>>,
    pub delivery_address: Option<DeliveryAddress>,
}

/// Load an order the actor's scope covers
pub(crate) async fn visible_order(state: &AppState, actor: &Actor, id: &str) -> AppResult<Order> {
    let order = state
        .stores
        .orders
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))?;

    if !actor.covers_owner(&order.user_id) {
        return Err(AppError::forbidden("order belongs to another user"));
    }
    Ok(order)
}

pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<OrderQuery>,
) -> AppResult<Json<Vec<Order>>> {
    let actor = user.authorize(&state, Resource::Orders, Action::List).await?;

    if let Some(status) = &query.status {
        status
            .parse::<OrderStatus>()
            .map_err(AppError::validation)?;
    }

    let filter = OrderFilter {
        user_id: actor.owner_filter(),
        status: query.status,
    };
    Ok(Json(state.stores.orders.list(&filter).await?))
}

pub async fn create_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    body: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<OrderDetail>)> {
    let actor = user.authorize(&state, Resource::Orders, Action::Create).await?;
    let request = json_body(body)?;

    require_text("title", &request.title)?;
    if !request.amount.is_finite() || request.amount < 0.0 {
        return Err(AppError::validation("amount must be zero or positive"));
    }
    if let Some(address) = &request.delivery_address {
        let missing = address.missing_fields();
        if !missing.is_empty() {
            return Err(AppError::validation(format!(
                "delivery address is missing: {}",
                missing.join(", ")
            )));
        }
    }

    let order = state
        .stores
        .orders
        .insert(&NewOrder {
            user_id: actor.user_id.clone(),
            title: request.title.trim().to_string(),
            description: request.description,
            project_type: request.project_type,
            requirements: request.requirements,
            deadline: request.deadline,
            amount: request.amount,
        })
        .await?;

    let delivery_address = match &request.delivery_address {
        Some(address) => Some(state.stores.addresses.insert(&order.id, address).await?),
        None => None,
    };

    info!(order_id = %order.id, user_id = %actor.user_id, "Order submitted");

    events::record_activity(&state, &actor.user_id, "create_order", "order", &order.id, None).await;
    events::notify_admins(
        &state,
        NewNotification::new(
            "",
            NotificationKind::Order,
            format!("New order submitted: {}", order.title),
        )
        .for_order(&order.id),
        Some(&actor.user_id),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(OrderDetail {
            order,
            payments: None,
            delivery_address,
        }),
    ))
}

pub async fn get_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<OrderDetail>> {
    let actor = user.authorize(&state, Resource::Orders, Action::Read).await?;
    let order = visible_order(&state, &actor, &id).await?;

    let payments = state.stores.transactions.list_for_order(&order.id).await?;
    let delivery_address = state.stores.addresses.find_for_order(&order.id).await?;

    Ok(Json(OrderDetail {
        order,
        payments: Some(payments),
        delivery_address,
    }))
}

fn describe_changes(patch: &OrderPatch) -> String {
    let mut changes = Vec::new();
    if let Some(status) = patch.status {
        changes.push(format!("status is now {}", status));
    }
    if let Some(payment) = patch.payment_status {
        changes.push(format!("payment is {}", payment));
    }
    if let Some(delivery) = patch.delivery_status {
        changes.push(format!("delivery is {}", delivery.as_str()));
    }
    changes.join(", ")
}

pub async fn update_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<Order>> {
    let actor = user.authorize(&state, Resource::Orders, Action::Update).await?;
    let fields = patch_object(body)?;
    actor.check_fields(Resource::Orders, &fields)?;

    let current = visible_order(&state, &actor, &id).await?;
    let current_status = current.lifecycle().map_err(AppError::validation)?;

    if actor.role == Role::Customer && current_status != OrderStatus::Draft {
        return Err(AppError::forbidden(
            "orders can only be edited by the customer while in Draft",
        ));
    }

    let details = Value::Object(fields.clone());
    let patch: OrderPatch = typed_patch(fields)?;

    if let Some(next) = patch.status {
        if !current_status.can_transition_to(next) {
            return Err(AppError::validation(format!(
                "cannot move an order from {} to {}",
                current_status, next
            )));
        }
    }
    if let Some(progress) = patch.progress {
        if !(0..=100).contains(&progress) {
            return Err(AppError::validation("progress must be between 0 and 100"));
        }
    }
    if let Some(amount) = patch.amount {
        if !amount.is_finite() || amount < 0.0 {
            return Err(AppError::validation("amount must be zero or positive"));
        }
    }

    let order = state
        .stores
        .orders
        .update(&id, &patch)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))?;

    events::record_activity(&state, &actor.user_id, "update_order", "order", &order.id, Some(details))
        .await;

    if patch.changes_state() && order.user_id != actor.user_id {
        events::notify(
            &state,
            vec![NewNotification::new(
                &order.user_id,
                NotificationKind::Order,
                format!("Your order '{}' was updated: {}", order.title, describe_changes(&patch)),
            )
            .for_order(&order.id)],
        )
        .await;
    }

    Ok(Json(order))
}

pub async fn delete_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let actor = user.authorize(&state, Resource::Orders, Action::Delete).await?;

    if !state.stores.orders.delete(&id).await? {
        return Err(AppError::not_found("Order"));
    }

    info!(order_id = %id, user_id = %actor.user_id, "Order deleted");
    events::record_activity(
        &state,
        &actor.user_id,
        "delete_order",
        "order",
        &id,
        Some(json!({ "hard_delete": true })),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
