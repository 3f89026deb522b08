//! Static authorizer for tests and single-user embedding.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use crate::board::{
    domain::{ProjectId, UserId},
    ports::{Authorizer, AuthorizerError, BoardAction},
};

/// Authorizer with a fixed decision table.
///
/// Allows everything by default; specific actors can be denied outright.
#[derive(Debug, Clone, Default)]
pub struct StaticAuthorizer {
    denied: Arc<RwLock<HashSet<UserId>>>,
}

impl StaticAuthorizer {
    /// Creates an authorizer that permits every mutation.
    #[must_use]
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Denies every mutation attempted by `actor`.
    pub fn deny(&self, actor: UserId) {
        if let Ok(mut denied) = self.denied.write() {
            denied.insert(actor);
        }
    }
}

#[async_trait]
impl Authorizer for StaticAuthorizer {
    async fn can_mutate(
        &self,
        actor: UserId,
        _project: ProjectId,
        _action: BoardAction,
    ) -> Result<bool, AuthorizerError> {
        let denied = self
            .denied
            .read()
            .map_err(|err| AuthorizerError::new(std::io::Error::other(err.to_string())))?;
        Ok(!denied.contains(&actor))
    }
}
