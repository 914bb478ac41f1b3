use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Datelike, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::api::{json_body, patch_object, typed_patch};
use crate::auth::roles::{Action, Resource};
use crate::auth::{Actor, AuthenticatedUser};
use crate::database::invoice_repository::{Invoice, InvoiceFilter, InvoiceStatus, NewInvoice};
use crate::database::notification_repository::{NewNotification, NotificationKind};
use crate::error::{AppError, AppResult};
use crate::events;
use crate::invoicing::{
    invoice_number_prefix, next_invoice_number, price_line_items, LineItemInput, RemoteCustomer,
};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceQuery {
    pub order_id: Option<String>,
    pub status: Option<InvoiceStatus>,
}

#[derive(Debug, Deserialize)]
pub struct CreateInvoiceRequest {
    pub order_id: String,
    pub line_items: Vec<LineItemInput>,
    #[serde(default)]
    pub discount: f64,
    pub due_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InvoiceUpdate {
    pub line_items: Option<Vec<LineItemInput>>,
    pub discount: Option<f64>,
    pub due_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub status: Option<InvoiceStatus>,
}

async fn visible_invoice(state: &AppState, actor: &Actor, id: &str) -> AppResult<Invoice> {
    let invoice = state
        .stores
        .invoices
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Invoice"))?;

    if !actor.covers_owner(&invoice.user_id) {
        return Err(AppError::forbidden("invoice belongs to another user"));
    }
    Ok(invoice)
}

/// Remote contact for the invoice owner, if they have an email on file
async fn remote_customer(state: &AppState, user_id: &str) -> Option<RemoteCustomer> {
    let profile = match state.stores.profiles.find(user_id).await {
        Ok(profile) => profile?,
        Err(e) => {
            warn!(user_id, "Profile lookup for invoicing failed: {}", e);
            return None;
        }
    };

    let email = profile.email.filter(|e| !e.trim().is_empty())?;
    Some(RemoteCustomer {
        name: profile.full_name.unwrap_or_else(|| email.clone()),
        email,
    })
}

fn invoice_notice(invoice: &Invoice, message: String) -> NewNotification {
    NewNotification::new(&invoice.user_id, NotificationKind::Invoice, message)
        .for_invoice(&invoice.id)
        .for_order(&invoice.order_id)
}

pub async fn list_invoices(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<InvoiceQuery>,
) -> AppResult<Json<Vec<Invoice>>> {
    let actor = user.authorize(&state, Resource::Invoices, Action::List).await?;

    let filter = InvoiceFilter {
        user_id: actor.owner_filter(),
        order_id: query.order_id,
        status: query.status.map(|s| s.as_str().to_string()),
    };
    Ok(Json(state.stores.invoices.list(&filter).await?))
}

pub async fn create_invoice(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    body: Result<Json<CreateInvoiceRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Invoice>)> {
    let actor = user.authorize(&state, Resource::Invoices, Action::Create).await?;
    let request = json_body(body)?;

    let order = state
        .stores
        .orders
        .find_by_id(&request.order_id)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))?;

    let (line_items, totals) = price_line_items(&request.line_items, request.discount)?;

    let year = Utc::now().year();
    let latest = state
        .stores
        .invoices
        .latest_number(&invoice_number_prefix(year))
        .await?;
    let invoice_number = next_invoice_number(year, latest.as_deref());

    let mut invoice = state
        .stores
        .invoices
        .insert(&NewInvoice {
            invoice_number,
            order_id: order.id.clone(),
            user_id: order.user_id.clone(),
            line_items,
            totals,
            currency: state.currency.clone(),
            due_date: request.due_date,
            notes: request.notes,
        })
        .await?;

    info!(invoice_id = %invoice.id, number = %invoice.invoice_number, "Invoice created");

    if state.invoicing.is_enabled() {
        match remote_customer(&state, &invoice.user_id).await {
            Some(customer) => {
                if let Some(external_id) = state.invoicing.push_new(&invoice, &customer).await {
                    invoice.external_id = Some(external_id);
                    match state.stores.invoices.update(&invoice).await {
                        Ok(Some(saved)) => invoice = saved,
                        Ok(None) => {}
                        Err(e) => warn!(invoice_id = %invoice.id, "Failed to store external invoice id: {}", e),
                    }
                }
            }
            None => warn!(
                invoice_id = %invoice.id,
                "Invoice owner has no email on file; skipping remote copy"
            ),
        }
    }

    events::record_activity(&state, &actor.user_id, "create_invoice", "invoice", &invoice.id, None)
        .await;
    events::notify(
        &state,
        vec![invoice_notice(
            &invoice,
            format!(
                "Invoice {} for {:.2} {} has been created",
                invoice.invoice_number, invoice.total, invoice.currency
            ),
        )],
    )
    .await;

    Ok((StatusCode::CREATED, Json(invoice)))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<Invoice>> {
    let actor = user.authorize(&state, Resource::Invoices, Action::Read).await?;
    let mut invoice = visible_invoice(&state, &actor, &id).await?;

    if let Some(remote_status) = state.invoicing.refresh_status(&invoice).await {
        info!(
            invoice_id = %invoice.id,
            from = %invoice.status,
            to = %remote_status,
            "Invoice status changed remotely"
        );
        match state.stores.invoices.set_status(&invoice.id, remote_status).await {
            Ok(Some(saved)) => invoice = saved,
            Ok(None) => {}
            Err(e) => {
                warn!(invoice_id = %invoice.id, "Failed to store remote invoice status: {}", e);
                invoice.status = remote_status.as_str().to_string();
            }
        }
    }

    Ok(Json(invoice))
}

pub async fn update_invoice(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<Invoice>> {
    let actor = user.authorize(&state, Resource::Invoices, Action::Update).await?;
    let fields = patch_object(body)?;
    actor.check_fields(Resource::Invoices, &fields)?;

    let mut invoice = visible_invoice(&state, &actor, &id).await?;
    let details = Value::Object(fields.clone());
    let update: InvoiceUpdate = typed_patch(fields)?;

    if update.line_items.is_some() || update.discount.is_some() {
        let inputs = match update.line_items {
            Some(items) => items,
            None => invoice
                .line_items
                .iter()
                .map(|item| LineItemInput {
                    description: item.description.clone(),
                    quantity: item.quantity,
                    rate: item.rate,
                    tax_rate: item.tax_rate,
                })
                .collect(),
        };
        let (line_items, totals) =
            price_line_items(&inputs, update.discount.unwrap_or(invoice.discount))?;
        invoice.line_items = sqlx::types::Json(line_items);
        invoice.apply_totals(&totals);
    }

    let became_paid = update.status == Some(InvoiceStatus::Paid)
        && invoice.status != InvoiceStatus::Paid.as_str();

    if let Some(due_date) = update.due_date {
        invoice.due_date = Some(due_date);
    }
    if let Some(notes) = update.notes {
        invoice.notes = Some(notes);
    }
    if let Some(status) = update.status {
        invoice.status = status.as_str().to_string();
    }

    let invoice = state
        .stores
        .invoices
        .update(&invoice)
        .await?
        .ok_or_else(|| AppError::not_found("Invoice"))?;

    state.invoicing.push_update(&invoice, became_paid).await;

    events::record_activity(
        &state,
        &actor.user_id,
        "update_invoice",
        "invoice",
        &invoice.id,
        Some(details),
    )
    .await;

    Ok(Json(invoice))
}

pub async fn delete_invoice(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let actor = user.authorize(&state, Resource::Invoices, Action::Delete).await?;

    if !state.stores.invoices.delete(&id).await? {
        return Err(AppError::not_found("Invoice"));
    }

    events::record_activity(&state, &actor.user_id, "delete_invoice", "invoice", &id, None).await;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn send_invoice(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<Invoice>> {
    let actor = user.authorize(&state, Resource::Invoices, Action::Update).await?;
    let mut invoice = visible_invoice(&state, &actor, &id).await?;

    let emailed = match remote_customer(&state, &invoice.user_id).await {
        Some(customer) => state.invoicing.send(&invoice, &customer).await,
        None => false,
    };

    if invoice.status == InvoiceStatus::Draft.as_str() {
        invoice = state
            .stores
            .invoices
            .set_status(&invoice.id, InvoiceStatus::Sent)
            .await?
            .ok_or_else(|| AppError::not_found("Invoice"))?;
    }

    events::record_activity(
        &state,
        &actor.user_id,
        "send_invoice",
        "invoice",
        &invoice.id,
        Some(serde_json::json!({ "emailed": emailed })),
    )
    .await;
    events::notify(
        &state,
        vec![invoice_notice(
            &invoice,
            format!("Invoice {} has been sent to you", invoice.invoice_number),
        )],
    )
    .await;

    Ok(Json(invoice))
}

pub async fn download_pdf(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let actor = user.authorize(&state, Resource::Invoices, Action::Read).await?;
    let invoice = visible_invoice(&state, &actor, &id).await?;

    let pdf = state.invoicing.pdf(&invoice).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}.pdf\"", invoice.invoice_number),
            ),
        ],
        pdf,
    )
        .into_response())
}
