//! Application State
//! Mission: Bundle the stores and services every handler shares

use crate::auth::{AuthState, JwtHandler, UserStore};
use crate::catalog::CatalogStore;
use crate::db::SharedConnection;
use crate::negotiation::{NegotiationStore, Optimizer};
use crate::newsletter::NewsletterStore;
use anyhow::Result;
use axum::extract::FromRef;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserStore>,
    pub jwt: Arc<JwtHandler>,
    pub catalog: Arc<CatalogStore>,
    pub negotiations: Arc<NegotiationStore>,
    pub newsletter: Arc<NewsletterStore>,
    pub optimizer: Arc<dyn Optimizer>,
    /// Mark the session cookie `Secure` (HTTPS deployments)
    pub cookie_secure: bool,
}

impl AppState {
    /// Build every store on the shared connection.
    pub fn new(
        conn: SharedConnection,
        users: UserStore,
        jwt: JwtHandler,
        optimizer: Arc<dyn Optimizer>,
        cookie_secure: bool,
    ) -> Result<Self> {
        Ok(Self {
            users: Arc::new(users),
            jwt: Arc::new(jwt),
            catalog: Arc::new(CatalogStore::new(conn.clone())?),
            negotiations: Arc::new(NegotiationStore::new(conn.clone())?),
            newsletter: Arc::new(NewsletterStore::new(conn)?),
            optimizer,
            cookie_secure,
        })
    }
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        AuthState {
            users: state.users.clone(),
            jwt: state.jwt.clone(),
        }
    }
}
