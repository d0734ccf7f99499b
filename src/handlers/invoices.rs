use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::info;

use crate::db::Storage;
use crate::db::models::InvoiceDetail;
use crate::db::params::{InvoicePatch, NewInvoice};
use crate::error::LawdeskError;
use crate::middleware::{ApiJson, AuthUser};

pub async fn list(
    State(storage): State<Storage>,
    user: AuthUser,
) -> Result<Json<Vec<InvoiceDetail>>, LawdeskError> {
    Ok(Json(storage.list_invoices(user.tenant()).await?))
}

pub async fn get(
    State(storage): State<Storage>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<InvoiceDetail>, LawdeskError> {
    Ok(Json(storage.get_invoice(user.tenant(), &id).await?))
}

pub async fn create(
    State(storage): State<Storage>,
    user: AuthUser,
    ApiJson(new): ApiJson<NewInvoice>,
) -> Result<(StatusCode, Json<InvoiceDetail>), LawdeskError> {
    let owner = user.owner_for(new.lawyer_id.as_deref())?;
    let detail = storage.create_invoice(owner, new).await?;
    info!(
        invoice = %detail.invoice.number,
        amount = detail.invoice.amount,
        items = detail.items.len(),
        "invoice created"
    );
    Ok((StatusCode::CREATED, Json(detail)))
}

pub async fn update(
    State(storage): State<Storage>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<InvoicePatch>,
) -> Result<Json<InvoiceDetail>, LawdeskError> {
    Ok(Json(storage.update_invoice(user.tenant(), &id, patch).await?))
}

pub async fn delete(
    State(storage): State<Storage>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, LawdeskError> {
    storage.delete_invoice(user.tenant(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
