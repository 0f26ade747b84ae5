//! Local form validation. Failures never reach the network; each one names the field
//! it belongs to (`AppError::Validation { code: <field>, .. }`) so a caller can show it inline.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{AppError, AppResult};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"));
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?[1-9]\d{0,15}$").expect("phone regex"));
static DIGITS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").expect("digits regex"));

pub const USER_TYPE_GENERAL: &str = "usuario";
pub const USER_TYPE_PSYCHOLOGIST: &str = "psicologo";

/// Strip everything but ASCII digits (numeric-only inputs such as document number and phone).
pub fn digits_only(s: &str) -> String { s.chars().filter(|c| c.is_ascii_digit()).collect() }

fn err<T>(field: &str, msg: &str) -> AppResult<T> { Err(AppError::validation(field, msg)) }

pub fn validate_email(email: &str) -> AppResult<()> {
    let email = email.trim();
    if email.is_empty() { return err("email", "El correo electrónico es requerido"); }
    if !EMAIL_RE.is_match(email) { return err("email", "Formato de correo electrónico inválido"); }
    Ok(())
}

pub fn validate_password(password: &str) -> AppResult<()> {
    if password.is_empty() { return err("password", "La contraseña es requerida"); }
    if password.chars().count() < 8 { return err("password", "La contraseña debe tener al menos 8 caracteres"); }
    let lower = password.chars().any(|c| c.is_ascii_lowercase());
    let upper = password.chars().any(|c| c.is_ascii_uppercase());
    let digit = password.chars().any(|c| c.is_ascii_digit());
    if !(lower && upper && digit) {
        return err("password", "La contraseña debe contener al menos una mayúscula, una minúscula y un número");
    }
    Ok(())
}

pub fn validate_password_match(password: &str, confirm: &str) -> AppResult<()> {
    if password != confirm { return err("confirmPassword", "Las contraseñas no coinciden"); }
    Ok(())
}

pub fn validate_name(field: &str, value: &str) -> AppResult<()> {
    if value.trim().chars().count() < 2 {
        let msg = if field == "lastName" { "El apellido debe tener al menos 2 caracteres" } else { "El nombre debe tener al menos 2 caracteres" };
        return err(field, msg);
    }
    Ok(())
}

pub fn validate_document_number(value: &str) -> AppResult<()> {
    let v = value.trim();
    if v.is_empty() { return err("documentNumber", "El número de documento es requerido"); }
    if !DIGITS_RE.is_match(v) { return err("documentNumber", "El número de documento solo puede contener números"); }
    if v.len() < 5 { return err("documentNumber", "El número de documento debe tener al menos 5 dígitos"); }
    if v.len() > 20 { return err("documentNumber", "El número de documento no puede tener más de 20 dígitos"); }
    Ok(())
}

/// Phone is optional; when present it must be digits and look like a dialable number.
pub fn validate_phone(value: &str) -> AppResult<()> {
    let v = value.trim();
    if v.is_empty() { return Ok(()); }
    let compact: String = v.chars().filter(|c| !c.is_whitespace()).collect();
    if !DIGITS_RE.is_match(&compact) { return err("phone", "El teléfono solo puede contener números"); }
    if !PHONE_RE.is_match(&compact) { return err("phone", "Formato de teléfono inválido"); }
    Ok(())
}

/// Only general users (`usuario`) must explain why they register.
pub fn validate_registration_reason(user_type: &str, reason: Option<&str>) -> AppResult<()> {
    if user_type != USER_TYPE_GENERAL { return Ok(()); }
    let r = reason.map(str::trim).unwrap_or("");
    if r.is_empty() { return err("registrationReason", "Por favor, explica por qué quieres registrarte"); }
    if r.chars().count() < 10 { return err("registrationReason", "El motivo debe tener al menos 10 caracteres"); }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PasswordStrength {
    Weak,
    Fair,
    Good,
    Strong,
}

impl PasswordStrength {
    pub fn label(&self) -> &'static str {
        match self {
            PasswordStrength::Weak => "Débil",
            PasswordStrength::Fair => "Regular",
            PasswordStrength::Good => "Buena",
            PasswordStrength::Strong => "Fuerte",
        }
    }
}

pub fn password_strength(password: &str) -> PasswordStrength {
    let len = password.chars().count();
    let checks = [
        len >= 8,
        len >= 12,
        password.chars().any(|c| c.is_ascii_lowercase()),
        password.chars().any(|c| c.is_ascii_uppercase()),
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(|c| !c.is_ascii_alphanumeric()),
    ];
    match checks.iter().filter(|b| **b).count() {
        0..=1 => PasswordStrength::Weak,
        2..=3 => PasswordStrength::Fair,
        4..=5 => PasswordStrength::Good,
        _ => PasswordStrength::Strong,
    }
}

/// Login accepts either an email or a plain username; emails get the full email check.
pub fn validate_login(username: &str, password: &str) -> AppResult<()> {
    if username.contains('@') { validate_email(username)?; }
    else if username.trim().is_empty() { return err("email", "El correo electrónico es requerido"); }
    if password.is_empty() { return err("password", "La contraseña es requerida"); }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub document_type: String,
    pub document_number: String,
    pub phone: Option<String>,
    pub user_type: String,
    pub registration_reason: Option<String>,
}

impl RegistrationForm {
    /// Checks fields in form order and stops at the first failure.
    pub fn validate(&self) -> AppResult<()> {
        validate_name("firstName", &self.first_name)?;
        validate_name("lastName", &self.last_name)?;
        validate_email(&self.email)?;
        if self.document_type.trim().is_empty() { return err("documentType", "Selecciona un tipo de documento"); }
        validate_document_number(&self.document_number)?;
        if let Some(p) = &self.phone { validate_phone(p)?; }
        validate_password(&self.password)?;
        validate_password_match(&self.password, &self.confirm_password)?;
        match self.user_type.as_str() {
            "" => return err("userType", "Selecciona un tipo de usuario"),
            USER_TYPE_GENERAL | USER_TYPE_PSYCHOLOGIST => {}
            _ => return err("userType", "Tipo de usuario inválido"),
        }
        validate_registration_reason(&self.user_type, self.registration_reason.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modality {
    Virtual,
    InPerson,
}

impl Modality {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "VIRTUAL" => Some(Modality::Virtual),
            "PRESENCIAL" => Some(Modality::InPerson),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Virtual => "VIRTUAL",
            Modality::InPerson => "PRESENCIAL",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BookingForm {
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`
    pub time: String,
    pub modality: String,
}

/// A booking that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidBooking {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub modality: Modality,
}

impl ValidBooking {
    pub fn date_str(&self) -> String { self.date.format("%Y-%m-%d").to_string() }
    /// Backend expects seconds.
    pub fn time_str(&self) -> String { self.time.format("%H:%M:%S").to_string() }
}

/// Minimum lead time, in hours, between "now" and the start of a booked session.
pub const BOOKING_LEAD_HOURS: i64 = 1;

impl BookingForm {
    pub fn validate(&self, now: NaiveDateTime) -> AppResult<ValidBooking> {
        if self.date.trim().is_empty() { return err("booking-date", "Por favor, selecciona una fecha"); }
        if self.time.trim().is_empty() { return err("booking-time", "Por favor, selecciona una hora"); }
        if self.modality.trim().is_empty() { return err("booking-modality", "Por favor, selecciona una modalidad"); }
        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
            .map_err(|_| AppError::validation("booking-date", "Fecha inválida"))?;
        let time = NaiveTime::parse_from_str(self.time.trim(), "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(self.time.trim(), "%H:%M:%S"))
            .map_err(|_| AppError::validation("booking-time", "Hora inválida"))?;
        let modality = Modality::parse(&self.modality)
            .ok_or_else(|| AppError::validation("booking-modality", "Modalidad inválida"))?;
        if date.and_time(time) < now + Duration::hours(BOOKING_LEAD_HOURS) {
            return err("booking-date", "No puedes agendar una cita en el pasado. Selecciona una fecha y hora futura.");
        }
        Ok(ValidBooking { date, time, modality })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PqrsKind {
    Petition,
    Complaint,
    Claim,
    Suggestion,
}

impl PqrsKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "peticion" | "petición" => Some(PqrsKind::Petition),
            "queja" => Some(PqrsKind::Complaint),
            "reclamo" => Some(PqrsKind::Claim),
            "sugerencia" => Some(PqrsKind::Suggestion),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PqrsKind::Petition => "peticion",
            PqrsKind::Complaint => "queja",
            PqrsKind::Claim => "reclamo",
            PqrsKind::Suggestion => "sugerencia",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PqrsForm {
    pub kind: String,
    pub subject: String,
    pub description: String,
}

impl PqrsForm {
    pub fn validate(&self) -> AppResult<PqrsKind> {
        if self.kind.trim().is_empty() { return err("pqr-type", "Por favor, selecciona el tipo de PQRS."); }
        let kind = PqrsKind::parse(&self.kind).ok_or_else(|| AppError::validation("pqr-type", "Tipo de PQRS inválido."))?;
        let subject = self.subject.trim().chars().count();
        if subject < 5 { return err("pqr-subject", "El asunto debe tener al menos 5 caracteres."); }
        if subject > 100 { return err("pqr-subject", "El asunto no puede exceder 100 caracteres."); }
        let message = self.description.trim().chars().count();
        if message < 20 { return err("pqr-message", "La descripción debe tener al menos 20 caracteres."); }
        if message > 1000 { return err("pqr-message", "La descripción no puede exceder 1000 caracteres."); }
        Ok(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of<T: std::fmt::Debug>(r: AppResult<T>) -> String {
        match r {
            Err(AppError::Validation { code, .. }) => code,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn email_rules() {
        assert!(validate_email("ana@example.com").is_ok());
        assert!(validate_email("  ana@example.co  ").is_ok());
        assert_eq!(field_of(validate_email("")), "email");
        assert!(validate_email("ana@example").is_err());
        assert!(validate_email("ana example@x.com").is_err());
        assert!(validate_email("@x.com").is_err());
    }

    #[test]
    fn password_rules() {
        assert!(validate_password("Secreto123").is_ok());
        assert!(validate_password("").is_err());
        assert!(validate_password("Ab1").is_err());
        assert!(validate_password("alllowercase1").is_err());
        assert!(validate_password("NoDigitsHere").is_err());
        assert_eq!(field_of(validate_password_match("a", "b")), "confirmPassword");
    }

    #[test]
    fn document_and_phone_rules() {
        assert!(validate_document_number("12345").is_ok());
        assert!(validate_document_number("1234").is_err());
        assert!(validate_document_number("12a45").is_err());
        assert!(validate_document_number(&"9".repeat(21)).is_err());
        assert!(validate_phone("").is_ok());
        assert!(validate_phone("3001234567").is_ok());
        assert!(validate_phone("0300123").is_err());
        assert!(validate_phone("300-123").is_err());
        assert_eq!(digits_only("30a0-12 3"), "300123");
    }

    #[test]
    fn strength_levels() {
        assert_eq!(password_strength(""), PasswordStrength::Weak);
        assert_eq!(password_strength("abc"), PasswordStrength::Weak);
        assert_eq!(password_strength("abcdefgh"), PasswordStrength::Fair);
        assert_eq!(password_strength("Abcdefg1"), PasswordStrength::Good);
        assert_eq!(password_strength("Abcdefgh123!"), PasswordStrength::Strong);
        assert_eq!(PasswordStrength::Good.label(), "Buena");
    }

    fn registration() -> RegistrationForm {
        RegistrationForm {
            first_name: "Ana".into(),
            last_name: "Gómez".into(),
            email: "ana@example.com".into(),
            password: "Secreto123".into(),
            confirm_password: "Secreto123".into(),
            document_type: "1".into(),
            document_number: "10203040".into(),
            phone: Some("3001234567".into()),
            user_type: "usuario".into(),
            registration_reason: Some("Quiero manejar mejor el estrés".into()),
        }
    }

    #[test]
    fn registration_form_checks_in_order() {
        assert!(registration().validate().is_ok());
        let mut f = registration();
        f.first_name = "A".into();
        f.email = "bad".into();
        assert_eq!(field_of(f.validate()), "firstName");
        let mut f = registration();
        f.registration_reason = Some("corto".into());
        assert_eq!(field_of(f.validate()), "registrationReason");
        f.user_type = "psicologo".into();
        assert!(f.validate().is_ok(), "psychologists need no reason");
        f.user_type = String::new();
        assert_eq!(field_of(f.validate()), "userType");
    }

    #[test]
    fn booking_requires_lead_time() {
        let now = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap().and_hms_opt(9, 0, 0).unwrap();
        let ok = BookingForm { date: "2026-03-10".into(), time: "10:30".into(), modality: "virtual".into() }.validate(now).unwrap();
        assert_eq!(ok.modality, Modality::Virtual);
        assert_eq!(ok.time_str(), "10:30:00");
        assert_eq!(ok.date_str(), "2026-03-10");

        let too_soon = BookingForm { date: "2026-03-10".into(), time: "09:30".into(), modality: "PRESENCIAL".into() };
        assert_eq!(field_of(too_soon.validate(now)), "booking-date");
        let missing = BookingForm { date: "2026-03-11".into(), time: String::new(), modality: "VIRTUAL".into() };
        assert_eq!(field_of(missing.validate(now)), "booking-time");
        let bad_mod = BookingForm { date: "2026-03-11".into(), time: "10:00".into(), modality: "telefono".into() };
        assert_eq!(field_of(bad_mod.validate(now)), "booking-modality");
    }

    #[test]
    fn pqrs_bounds() {
        let ok = PqrsForm { kind: "queja".into(), subject: "Demora en la cita".into(), description: "La cita empezó treinta minutos tarde.".into() };
        assert_eq!(ok.validate().unwrap(), PqrsKind::Complaint);
        let short = PqrsForm { subject: "Hola".into(), ..ok.clone() };
        assert_eq!(field_of(short.validate()), "pqr-subject");
        let long = PqrsForm { description: "x".repeat(1001), ..ok.clone() };
        assert_eq!(field_of(long.validate()), "pqr-message");
        let none = PqrsForm { kind: String::new(), ..ok };
        assert_eq!(field_of(none.validate()), "pqr-type");
    }
}
