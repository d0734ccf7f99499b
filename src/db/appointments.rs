use chrono::Utc;
use sqlx::SqliteConnection;
use uuid::Uuid;

use super::Storage;
use super::models::{Appointment, Tenant};
use super::params::{AppointmentPatch, AppointmentRange, NewAppointment, require_text, require_text_if_set};
use super::sqlite::{OwnedTable, ensure_owned};
use crate::error::LawdeskError;

const APPOINTMENT_COLUMNS: &str = "id, title, type, date, location, notes, case_id, client_id, \
                                   lawyer_id, created_at";

/// Case and client references must stay inside the owner's practice.
pub(crate) async fn ensure_references(
    conn: &mut SqliteConnection,
    lawyer_id: &str,
    case_id: Option<&str>,
    client_id: Option<&str>,
) -> Result<(), LawdeskError> {
    if let Some(case_id) = case_id {
        ensure_owned(conn, OwnedTable::Cases, case_id, lawyer_id).await?;
    }
    if let Some(client_id) = client_id {
        ensure_owned(conn, OwnedTable::Clients, client_id, lawyer_id).await?;
    }
    Ok(())
}

impl Storage {
    /// Appointments in date order, optionally limited to `[from, to]`.
    pub async fn list_appointments(
        &self,
        tenant: Tenant<'_>,
        range: &AppointmentRange,
    ) -> Result<Vec<Appointment>, LawdeskError> {
        let sql = format!(
            r#"SELECT {APPOINTMENT_COLUMNS} FROM appointments
               WHERE (? IS NULL OR lawyer_id = ?)
                 AND (? IS NULL OR date >= ?)
                 AND (? IS NULL OR date <= ?)
               ORDER BY date ASC"#
        );
        Ok(sqlx::query_as::<_, Appointment>(&sql)
            .bind(tenant.lawyer_id())
            .bind(tenant.lawyer_id())
            .bind(range.from)
            .bind(range.from)
            .bind(range.to)
            .bind(range.to)
            .fetch_all(self.pool())
            .await?)
    }

    pub async fn get_appointment(
        &self,
        tenant: Tenant<'_>,
        id: &str,
    ) -> Result<Appointment, LawdeskError> {
        let sql = format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ? AND (? IS NULL OR lawyer_id = ?)"
        );
        sqlx::query_as::<_, Appointment>(&sql)
            .bind(id)
            .bind(tenant.lawyer_id())
            .bind(tenant.lawyer_id())
            .fetch_optional(self.pool())
            .await?
            .ok_or(LawdeskError::NotFound("appointment"))
    }

    pub async fn create_appointment(
        &self,
        lawyer_id: String,
        new: NewAppointment,
    ) -> Result<Appointment, LawdeskError> {
        require_text(&new.title, "عنوان الموعد")?;

        let mut conn = self.pool().acquire().await?;
        ensure_references(&mut conn, &lawyer_id, new.case_id.as_deref(), new.client_id.as_deref())
            .await?;

        let appointment = Appointment {
            id: Uuid::new_v4().to_string(),
            title: new.title.trim().to_string(),
            appointment_type: new.appointment_type,
            date: new.date,
            location: new.location,
            notes: new.notes,
            case_id: new.case_id,
            client_id: new.client_id,
            lawyer_id,
            created_at: Utc::now(),
        };
        sqlx::query(
            r#"INSERT INTO appointments (
                   id, title, type, date, location, notes, case_id, client_id, lawyer_id, created_at
               ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&appointment.id)
        .bind(&appointment.title)
        .bind(appointment.appointment_type)
        .bind(appointment.date)
        .bind(&appointment.location)
        .bind(&appointment.notes)
        .bind(&appointment.case_id)
        .bind(&appointment.client_id)
        .bind(&appointment.lawyer_id)
        .bind(appointment.created_at)
        .execute(&mut *conn)
        .await?;
        Ok(appointment)
    }

    pub async fn update_appointment(
        &self,
        tenant: Tenant<'_>,
        id: &str,
        patch: AppointmentPatch,
    ) -> Result<Appointment, LawdeskError> {
        require_text_if_set(patch.title.as_deref(), "عنوان الموعد")?;
        let existing = self.get_appointment(tenant, id).await?;

        let mut conn = self.pool().acquire().await?;
        ensure_references(
            &mut conn,
            &existing.lawyer_id,
            patch.case_id.as_ref().and_then(|id| id.as_deref()),
            patch.client_id.as_ref().and_then(|id| id.as_deref()),
        )
        .await?;

        sqlx::query(
            r#"UPDATE appointments SET
                 title = COALESCE(?, title),
                 type = COALESCE(?, type),
                 date = COALESCE(?, date),
                 location = CASE WHEN ? THEN ? ELSE location END,
                 notes = CASE WHEN ? THEN ? ELSE notes END,
                 case_id = CASE WHEN ? THEN ? ELSE case_id END,
                 client_id = CASE WHEN ? THEN ? ELSE client_id END
               WHERE id = ?"#,
        )
        .bind(patch.title.as_deref().map(str::trim))
        .bind(patch.appointment_type)
        .bind(patch.date)
        .bind(patch.location.is_some())
        .bind(patch.location.flatten())
        .bind(patch.notes.is_some())
        .bind(patch.notes.flatten())
        .bind(patch.case_id.is_some())
        .bind(patch.case_id.flatten())
        .bind(patch.client_id.is_some())
        .bind(patch.client_id.flatten())
        .bind(&existing.id)
        .execute(&mut *conn)
        .await?;
        drop(conn);

        self.get_appointment(tenant, id).await
    }

    pub async fn delete_appointment(&self, tenant: Tenant<'_>, id: &str) -> Result<(), LawdeskError> {
        let existing = self.get_appointment(tenant, id).await?;
        sqlx::query("DELETE FROM appointments WHERE id = ?")
            .bind(&existing.id)
            .execute(self.pool())
            .await?;
        Ok(())
    }
}
