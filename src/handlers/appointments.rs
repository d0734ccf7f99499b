use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::db::Storage;
use crate::db::models::Appointment;
use crate::db::params::{AppointmentPatch, AppointmentRange, NewAppointment};
use crate::error::LawdeskError;
use crate::middleware::{ApiJson, ApiQuery, AuthUser};

pub async fn list(
    State(storage): State<Storage>,
    user: AuthUser,
    ApiQuery(range): ApiQuery<AppointmentRange>,
) -> Result<Json<Vec<Appointment>>, LawdeskError> {
    Ok(Json(storage.list_appointments(user.tenant(), &range).await?))
}

pub async fn get(
    State(storage): State<Storage>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Appointment>, LawdeskError> {
    Ok(Json(storage.get_appointment(user.tenant(), &id).await?))
}

pub async fn create(
    State(storage): State<Storage>,
    user: AuthUser,
    ApiJson(new): ApiJson<NewAppointment>,
) -> Result<(StatusCode, Json<Appointment>), LawdeskError> {
    let owner = user.owner_for(new.lawyer_id.as_deref())?;
    let appointment = storage.create_appointment(owner, new).await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

pub async fn update(
    State(storage): State<Storage>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<AppointmentPatch>,
) -> Result<Json<Appointment>, LawdeskError> {
    Ok(Json(
        storage.update_appointment(user.tenant(), &id, patch).await?,
    ))
}

pub async fn delete(
    State(storage): State<Storage>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, LawdeskError> {
    storage.delete_appointment(user.tenant(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
