use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::role::{role_tag_of, Role};
use super::storage::{MemoryStorage, SessionStorage};
use crate::tprintln;

pub const ACCESS_KEY: &str = "rm_access_token";
pub const REFRESH_KEY: &str = "rm_refresh_token";
pub const USER_KEY: &str = "rm_user";

const ALL_KEYS: [&str; 3] = [ACCESS_KEY, REFRESH_KEY, USER_KEY];

/// Cached user profile as returned by the backend. The mapping is kept verbatim;
/// typed accessors cover the fields the client relies on.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UserProfile(Map<String, Value>);

impl UserProfile {
    pub fn from_value(v: Value) -> Option<Self> {
        match v {
            Value::Object(m) => Some(Self(m)),
            _ => None,
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> { &self.0 }
    pub fn get(&self, key: &str) -> Option<&Value> { self.0.get(key) }
    pub fn to_value(&self) -> Value { Value::Object(self.0.clone()) }

    pub fn username(&self) -> Option<&str> {
        ["username", "email"].iter().find_map(|k| self.0.get(*k).and_then(|v| v.as_str()))
    }

    /// Customer id, present for `CLIENTE` profiles.
    pub fn customer_id(&self) -> Option<i64> { self.0.get("customer_id").and_then(id_of) }

    /// Psychologist id, present for `PSICOLOGO` profiles.
    pub fn psychologist_id(&self) -> Option<i64> { self.0.get("psicologos_id").and_then(id_of) }
}

/// Ids arrive as numbers or numeric strings depending on the serializer.
pub(crate) fn id_of(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Snapshot of the persisted session.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user: Option<UserProfile>,
    pub role_tag: Option<String>,
    pub role: Role,
}

impl Session {
    pub fn is_anonymous(&self) -> bool { self.access_token.is_none() && self.refresh_token.is_none() }
    pub fn is_authenticated(&self) -> bool { self.access_token.is_some() }
}

/// Partial write: `None` (or an empty string) leaves the stored slot untouched.
#[derive(Debug, Clone, Default)]
pub struct SessionUpdate {
    pub access: Option<String>,
    pub refresh: Option<String>,
    pub user: Option<Value>,
}

impl SessionUpdate {
    pub fn access<S: Into<String>>(token: S) -> Self { Self { access: Some(token.into()), ..Default::default() } }
    pub fn refresh<S: Into<String>>(token: S) -> Self { Self { refresh: Some(token.into()), ..Default::default() } }
    pub fn user(profile: Value) -> Self { Self { user: Some(profile), ..Default::default() } }
}

/// Handle to the one session of this process. Cloning shares the same backend.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionStore(<storage>)")
    }
}

impl Default for SessionStore {
    fn default() -> Self { Self::in_memory() }
}

impl SessionStore {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self { Self { storage } }

    pub fn in_memory() -> Self { Self::new(Arc::new(MemoryStorage::new())) }

    pub fn get(&self) -> Session {
        let access_token = self.storage.get_item(ACCESS_KEY).filter(|s| !s.is_empty());
        let refresh_token = self.storage.get_item(REFRESH_KEY).filter(|s| !s.is_empty());
        let profile = self.storage.get_item(USER_KEY).and_then(|raw| parse_profile(&raw));
        let role_tag = profile.as_ref().and_then(role_tag_of);
        let user = profile.and_then(UserProfile::from_value);
        let role = Role::from_tag(role_tag.as_deref());
        Session { access_token, refresh_token, user, role_tag, role }
    }

    pub fn save(&self, update: SessionUpdate) {
        let mut items: Vec<(&str, String)> = Vec::with_capacity(3);
        if let Some(a) = update.access.filter(|s| !s.is_empty()) { items.push((ACCESS_KEY, a)); }
        if let Some(r) = update.refresh.filter(|s| !s.is_empty()) { items.push((REFRESH_KEY, r)); }
        if let Some(u) = update.user.filter(|u| !u.is_null()) {
            match serde_json::to_string(&u) {
                Ok(s) => items.push((USER_KEY, s)),
                Err(e) => warn!(target: "resetmental::session", "user profile not serializable, keeping previous: {}", e),
            }
        }
        tprintln!("session.save slots={:?}", items.iter().map(|(k, _)| *k).collect::<Vec<_>>());
        self.storage.set_items(&items);
    }

    pub fn clear(&self) {
        self.storage.remove_items(&ALL_KEYS);
        debug!(target: "resetmental::session", "session cleared");
    }

    pub fn access_token(&self) -> Option<String> { self.get().access_token }
    pub fn refresh_token(&self) -> Option<String> { self.get().refresh_token }

    pub fn role(&self) -> Role { self.get().role }
    pub fn get_user_role(&self) -> Option<String> { self.get().role_tag }
    pub fn is_psychologist(&self) -> bool { self.role() == Role::Provider }
    pub fn is_client(&self) -> bool { self.role() == Role::Customer }
}

fn parse_profile(raw: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(raw) {
        Ok(v @ Value::Object(_)) => Some(v),
        Ok(_) => {
            warn!(target: "resetmental::session", "stored user profile is not an object; ignoring");
            None
        }
        Err(e) => {
            warn!(target: "resetmental::session", "stored user profile is malformed; ignoring: {}", e);
            None
        }
    }
}
