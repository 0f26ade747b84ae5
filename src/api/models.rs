//! Wire shapes of the backend resources.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::directory::Psychologist;
use crate::session::id_of;

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Token pair plus profile, returned by login and registration.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenReply {
    #[serde(default)]
    pub access: Option<String>,
    #[serde(default)]
    pub refresh: Option<String>,
    #[serde(default)]
    pub user: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub typedocument: &'a str,
    pub document_number: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub rol: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_reason: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentType {
    #[serde(alias = "typedocument_id")]
    pub id: Value,
    #[serde(alias = "typedocument_name", alias = "nombre")]
    pub name: String,
}

/// A psychologist as the backend lists it. Every field is optional on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProviderRecord {
    #[serde(alias = "id")]
    pub psicologos_id: Option<Value>,
    pub psicologos_name: Option<String>,
    pub psicologos_lastname: Option<String>,
    pub especialidad: Option<String>,
    pub precio_cita: Option<Value>,
    pub modalidad: Option<String>,
    pub curriculom: Option<String>,
    pub experiencia_anios: Option<Value>,
    pub universidad: Option<String>,
}

const DEFAULT_NAME: &str = "Psicólogo";
const DEFAULT_SPECIALTY: &str = "Especialista en bienestar";
const DEFAULT_LOCATION: &str = "VIRTUAL";
const DEFAULT_DESCRIPTION: &str = "Profesional comprometido con tu bienestar emocional.";
const DEFAULT_APPROACH: &str = "Enfoque personalizado según tus necesidades.";
const DEFAULT_EXPERIENCE: &str = "Experiencia no indicada";
const DEFAULT_EDUCATION: &str = "Universidad no registrada";

fn non_blank(s: &Option<String>) -> Option<&str> {
    s.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Price arrives as a number or as a decimal string (`"50000.00"`).
pub(crate) fn price_of(v: &Value) -> u64 {
    let f = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    f.filter(|f| f.is_finite() && *f > 0.0).map(|f| f.round() as u64).unwrap_or(0)
}

impl ProviderRecord {
    pub fn into_entry(self, fallback_id: i64) -> Psychologist {
        let id = self.psicologos_id.as_ref().and_then(id_of).unwrap_or(fallback_id);
        let full = format!(
            "{} {}",
            self.psicologos_name.as_deref().unwrap_or("").trim(),
            self.psicologos_lastname.as_deref().unwrap_or("").trim()
        );
        let name = match full.trim() {
            "" => DEFAULT_NAME.to_string(),
            n => n.to_string(),
        };
        let avatar: String = name.chars().take(2).collect::<String>().to_uppercase();
        let specialty = non_blank(&self.especialidad).unwrap_or(DEFAULT_SPECIALTY).to_string();
        let price = self.precio_cita.as_ref().map(price_of).unwrap_or(0);
        let location = non_blank(&self.modalidad).map(str::to_uppercase).unwrap_or_else(|| DEFAULT_LOCATION.to_string());
        let curriculum = non_blank(&self.curriculom);
        let description = curriculum.unwrap_or(DEFAULT_DESCRIPTION).to_string();
        let approach = curriculum.unwrap_or(DEFAULT_APPROACH).to_string();
        let experience = match self.experiencia_anios.as_ref().and_then(id_of) {
            Some(n) if n > 0 => format!("{} años", n),
            _ => DEFAULT_EXPERIENCE.to_string(),
        };
        let education = non_blank(&self.universidad).unwrap_or(DEFAULT_EDUCATION).to_string();
        Psychologist { id, name, specialty, price, location, avatar, description, approach, experience, education }
    }
}

#[derive(Debug, Serialize)]
pub struct BookingRequest {
    pub customer: i64,
    pub psicologos: i64,
    pub cita_fecha: String,
    pub cita_hora: String,
    pub cita_modalidad: &'static str,
    pub cita_valor: String,
}

/// Appointment row from `GET /citas/`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppointmentRecord {
    #[serde(alias = "id")]
    pub cita_id: Option<Value>,
    pub customer: Option<Value>,
    pub psicologos: Option<Value>,
    pub cita_fecha: Option<String>,
    pub cita_hora: Option<String>,
    pub cita_modalidad: Option<String>,
    pub cita_estado: Option<String>,
    pub cita_valor: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct PqrsRequest<'a> {
    pub customer: i64,
    pub pqrs_tipo: &'static str,
    pub asunto: &'a str,
    pub descripcion: &'a str,
}
