use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use reqwest::Method;
use tracing::{debug, info};

use super::models::{AppointmentRecord, BookingRequest};
use super::{require_customer, APPOINTMENTS_PATH};
use crate::directory::Psychologist;
use crate::error::{AppError, AppResult};
use crate::http::AuthClient;
use crate::session::{id_of, Role};
use crate::validation::BookingForm;

pub const PENDING_STATUS: &str = "PENDIENTE";

impl AppointmentRecord {
    pub fn id(&self) -> Option<i64> { self.cita_id.as_ref().and_then(id_of) }
    pub fn provider_id(&self) -> Option<i64> { self.psicologos.as_ref().and_then(id_of) }
    pub fn customer_id(&self) -> Option<i64> { self.customer.as_ref().and_then(id_of) }

    pub fn is_pending(&self) -> bool { self.cita_estado.as_deref() == Some(PENDING_STATUS) }

    /// Start of the session, `None` when date or time do not parse.
    pub fn starts_at(&self) -> Option<NaiveDateTime> {
        let date = NaiveDate::parse_from_str(self.cita_fecha.as_deref()?.trim(), "%Y-%m-%d").ok()?;
        let raw = self.cita_hora.as_deref()?.trim();
        let time = NaiveTime::parse_from_str(raw, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
            .ok()?;
        Some(date.and_time(time))
    }
}

/// Ascending by start; records without a valid start go last in their original order.
pub fn sort_by_start(records: &mut [AppointmentRecord]) {
    records.sort_by_key(|r| match r.starts_at() {
        Some(t) => (0u8, Some(t)),
        None => (1u8, None),
    });
}

pub struct AppointmentsApi<'a> {
    client: &'a AuthClient,
}

impl<'a> AppointmentsApi<'a> {
    pub fn new(client: &'a AuthClient) -> Self { Self { client } }

    /// Book a session with `psychologist`. `now` is the caller's local time, used for
    /// the minimum lead-time check.
    pub async fn book(&self, psychologist: &Psychologist, form: &BookingForm, now: NaiveDateTime) -> AppResult<AppointmentRecord> {
        let customer = require_customer(&self.client.session().get(), "agendar una cita")?;
        let booking = form.validate(now)?;
        let body = BookingRequest {
            customer,
            psicologos: psychologist.id,
            cita_fecha: booking.date_str(),
            cita_hora: booking.time_str(),
            cita_modalidad: booking.modality.as_str(),
            cita_valor: psychologist.price.to_string(),
        };
        let created: AppointmentRecord = self.client.send_checked(Method::POST, APPOINTMENTS_PATH, Some(&body)).await?.json()?;
        info!(target: "resetmental::api", "booked {} {} with psychologist {}", body.cita_fecha, body.cita_hora, psychologist.id);
        Ok(created)
    }

    /// Pending appointments of the logged-in psychologist, earliest first.
    pub async fn pending_for_provider(&self) -> AppResult<Vec<AppointmentRecord>> {
        let session = self.client.session().get();
        if session.role != Role::Provider {
            return Err(AppError::forbidden("provider_required", "Solo los psicólogos pueden ver sus citas pendientes"));
        }
        let provider = session
            .user
            .as_ref()
            .and_then(|u| u.psychologist_id())
            .ok_or_else(|| AppError::forbidden("provider_id_missing", "El perfil no tiene un psicólogo asociado"))?;
        let all: Vec<AppointmentRecord> = self.client.get_json(APPOINTMENTS_PATH).await?;
        let total = all.len();
        let mut pending: Vec<AppointmentRecord> = all
            .into_iter()
            .filter(|r| r.provider_id() == Some(provider) && r.is_pending())
            .collect();
        sort_by_start(&mut pending);
        debug!(target: "resetmental::api", "provider {}: {} pending of {} appointments", provider, pending.len(), total);
        Ok(pending)
    }
}
