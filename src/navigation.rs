use crate::session::{Role, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavLink {
    pub label: &'static str,
    pub href: &'static str,
}

pub const PROVIDER_LINK: NavLink = NavLink { label: "Usuarios", href: "pages/usuarios.html" };
pub const DIRECTORY_LINK: NavLink = NavLink { label: "Psicólogos", href: "pages/psicologos.html" };

/// Providers manage their patients; everyone else browses psychologists.
pub fn directory_link(session: &Session) -> NavLink {
    match session.role {
        Role::Provider => PROVIDER_LINK,
        _ => DIRECTORY_LINK,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{SessionStore, SessionUpdate};
    use serde_json::json;

    #[test]
    fn link_follows_role() {
        let store = SessionStore::in_memory();
        assert_eq!(directory_link(&store.get()), DIRECTORY_LINK);
        store.save(SessionUpdate::user(json!({"rol": {"rol": "CLIENTE"}})));
        assert_eq!(directory_link(&store.get()).label, "Psicólogos");
        store.save(SessionUpdate::user(json!({"rol": {"rol": "PSICOLOGO"}})));
        assert_eq!(directory_link(&store.get()), NavLink { label: "Usuarios", href: "pages/usuarios.html" });
    }
}
