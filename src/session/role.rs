use serde_json::Value;

pub const CUSTOMER_TAG: &str = "CLIENTE";
pub const PROVIDER_TAG: &str = "PSICOLOGO";

/// Coarse role derived from the stored user profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    /// Client booking sessions (`CLIENTE`).
    Customer,
    /// Psychologist offering sessions (`PSICOLOGO`).
    Provider,
    /// Anonymous session, missing role, or a tag this client does not know.
    #[default]
    Unknown,
}

impl Role {
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag {
            Some(CUSTOMER_TAG) => Role::Customer,
            Some(PROVIDER_TAG) => Role::Provider,
            _ => Role::Unknown,
        }
    }

    pub fn tag(&self) -> Option<&'static str> {
        match self {
            Role::Customer => Some(CUSTOMER_TAG),
            Role::Provider => Some(PROVIDER_TAG),
            Role::Unknown => None,
        }
    }
}

/// Extract the raw role tag from a profile. Only the nested object form
/// `{"rol": {"rol": "<TAG>"}}` carries a role; anything else resolves to `None`.
pub fn role_tag_of(profile: &Value) -> Option<String> {
    let rol = profile.get("rol")?.as_object()?;
    match rol.get("rol")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}
