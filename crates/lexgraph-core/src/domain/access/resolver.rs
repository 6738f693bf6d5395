//! Access resolution
//!
//! Ownership comes from the session; everything else comes from shares.
//! Resolution fails closed: any lookup error yields [`AccessLevel::None`].

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::domain::graph::{Graph, GraphRepository};
use crate::domain::session::{SessionInfo, SessionSource};
use crate::error::{Error, Result};

use super::level::{AccessLevel, Action};
use super::repository::ShareRepository;

/// Result of a successful authorization
#[derive(Debug, Clone)]
pub struct AccessGrant {
    pub session: SessionInfo,
    /// `None` when the session has never been built
    pub graph: Option<Graph>,
    pub level: AccessLevel,
}

impl AccessGrant {
    /// The graph, or NotFound if none exists yet
    pub fn require_graph(&self) -> Result<&Graph> {
        self.graph
            .as_ref()
            .ok_or_else(|| Error::not_found("graph", &self.session.id))
    }
}

/// Access granted by a share-link token; carries no identity
#[derive(Debug, Clone, PartialEq)]
pub struct TokenAccess {
    pub level: AccessLevel,
    pub graph_id: Option<String>,
}

impl TokenAccess {
    fn none() -> Self {
        Self {
            level: AccessLevel::None,
            graph_id: None,
        }
    }
}

/// Computes effective access for (graph, actor) pairs
pub struct AccessResolver {
    graphs: Arc<dyn GraphRepository>,
    shares: Arc<dyn ShareRepository>,
    sessions: Arc<dyn SessionSource>,
}

impl AccessResolver {
    pub fn new(
        graphs: Arc<dyn GraphRepository>,
        shares: Arc<dyn ShareRepository>,
        sessions: Arc<dyn SessionSource>,
    ) -> Self {
        Self {
            graphs,
            shares,
            sessions,
        }
    }

    /// Effective access of `actor_id` on a graph
    pub async fn resolve_access(&self, graph_id: &str, actor_id: &str) -> AccessLevel {
        let result: Result<AccessLevel> = async {
            let Some(graph) = self.graphs.get_graph_by_id(graph_id).await? else {
                return Ok(AccessLevel::None);
            };
            let Some(session) = self.sessions.get_session(&graph.session_id).await? else {
                return Ok(AccessLevel::None);
            };
            self.level_for(&session, Some(&graph), actor_id).await
        }
        .await;

        fail_closed(result, graph_id, actor_id)
    }

    /// Effective access of `actor_id` on a session's graph.
    ///
    /// Works before the graph exists, when only the owner has access.
    pub async fn resolve_session_access(&self, session_id: &str, actor_id: &str) -> AccessLevel {
        let result: Result<AccessLevel> = async {
            let Some(session) = self.sessions.get_session(session_id).await? else {
                return Ok(AccessLevel::None);
            };
            let graph = self.graphs.get_graph(session_id).await?;
            self.level_for(&session, graph.as_ref(), actor_id).await
        }
        .await;

        fail_closed(result, session_id, actor_id)
    }

    /// Access granted by a share-link token. Expired or unknown tokens grant nothing.
    pub async fn resolve_access_by_token(&self, token: &str) -> TokenAccess {
        match self.shares.find_by_token(token).await {
            Ok(Some(share)) if !share.is_expired_at(Utc::now()) => TokenAccess {
                level: share.access.into(),
                graph_id: Some(share.graph_id),
            },
            Ok(Some(share)) => {
                debug!(share_id = %share.id, "Expired share token presented");
                TokenAccess::none()
            }
            Ok(None) => TokenAccess::none(),
            Err(e) => {
                warn!(error = %e, "Token resolution failed, denying access");
                TokenAccess::none()
            }
        }
    }

    /// Authorize `action` on a session's graph or fail with PermissionDenied.
    ///
    /// An unknown session is NotFound; lookup failures deny.
    pub async fn authorize(
        &self,
        session_id: &str,
        actor_id: &str,
        action: Action,
    ) -> Result<AccessGrant> {
        let session = match self.sessions.get_session(session_id).await {
            Ok(Some(session)) => session,
            Ok(None) => return Err(Error::not_found("session", session_id)),
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Session lookup failed, denying access");
                return Err(denied(action));
            }
        };

        let graph = match self.graphs.get_graph(session_id).await {
            Ok(graph) => graph,
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Graph lookup failed, denying access");
                return Err(denied(action));
            }
        };

        let level = fail_closed(
            self.level_for(&session, graph.as_ref(), actor_id).await,
            session_id,
            actor_id,
        );

        if !level.allows(action) {
            info!(
                session_id = %session_id,
                actor_id = %actor_id,
                level = %level,
                action = action.as_str(),
                "Access denied"
            );
            return Err(denied(action));
        }

        Ok(AccessGrant {
            session,
            graph,
            level,
        })
    }

    /// Authorize `action` on a graph addressed by its own id
    pub async fn authorize_graph(
        &self,
        graph_id: &str,
        actor_id: &str,
        action: Action,
    ) -> Result<AccessGrant> {
        let graph = match self.graphs.get_graph_by_id(graph_id).await {
            Ok(Some(graph)) => graph,
            Ok(None) => return Err(Error::not_found("graph", graph_id)),
            Err(e) => {
                warn!(graph_id = %graph_id, error = %e, "Graph lookup failed, denying access");
                return Err(denied(action));
            }
        };
        self.authorize(&graph.session_id, actor_id, action).await
    }

    async fn level_for(
        &self,
        session: &SessionInfo,
        graph: Option<&Graph>,
        actor_id: &str,
    ) -> Result<AccessLevel> {
        if session.is_owned_by(actor_id) {
            return Ok(AccessLevel::OwnerEdit);
        }

        let Some(graph) = graph else {
            return Ok(AccessLevel::None);
        };

        let now = Utc::now();
        let level = self
            .shares
            .list_shares_for_user(&graph.id, actor_id)
            .await?
            .into_iter()
            .filter(|share| !share.is_expired_at(now))
            .map(|share| AccessLevel::from(share.access))
            .max()
            .unwrap_or(AccessLevel::None);

        Ok(level)
    }
}

fn fail_closed(result: Result<AccessLevel>, target: &str, actor_id: &str) -> AccessLevel {
    result.unwrap_or_else(|e| {
        warn!(target_id = %target, actor_id = %actor_id, error = %e, "Access resolution failed, denying");
        AccessLevel::None
    })
}

fn denied(action: Action) -> Error {
    Error::denied(format!(
        "{} requires {} access",
        action.as_str(),
        action.required_level()
    ))
}
