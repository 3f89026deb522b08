//! Recording mail gateway for tests.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use crate::board::{
    domain::EmailAddress,
    ports::{MailGateway, MailGatewayError, MailPayload, MailTemplate},
};

/// One message captured by the recording gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    /// Delivery address.
    pub recipient: EmailAddress,
    /// Template key the renderer would receive.
    pub template: MailTemplate,
    /// Rendered payload.
    pub payload: MailPayload,
}

#[derive(Debug, Default)]
struct MailState {
    sent: Vec<SentMail>,
    failing: HashSet<String>,
}

/// Mail gateway that records messages instead of delivering them.
///
/// Individual recipients can be made to fail, which lets tests exercise the
/// best-effort fan-out contract.
#[derive(Debug, Clone, Default)]
pub struct RecordingMailGateway {
    state: Arc<RwLock<MailState>>,
}

impl RecordingMailGateway {
    /// Creates a gateway with no recorded messages.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every send to `recipient` fail with a rejection.
    pub fn fail_for(&self, recipient: &EmailAddress) {
        if let Ok(mut state) = self.state.write() {
            state.failing.insert(recipient.as_str().to_owned());
        }
    }

    /// Returns every message recorded so far, in send order.
    #[must_use]
    pub fn sent(&self) -> Vec<SentMail> {
        self.state
            .read()
            .map(|state| state.sent.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl MailGateway for RecordingMailGateway {
    async fn send(
        &self,
        recipient: &EmailAddress,
        template: MailTemplate,
        payload: &MailPayload,
    ) -> Result<(), MailGatewayError> {
        let mut state = self
            .state
            .write()
            .map_err(|err| MailGatewayError::transport(std::io::Error::other(err.to_string())))?;
        if state.failing.contains(recipient.as_str()) {
            return Err(MailGatewayError::Rejected(format!(
                "recipient {recipient} is unreachable"
            )));
        }
        state.sent.push(SentMail {
            recipient: recipient.clone(),
            template,
            payload: payload.clone(),
        });
        Ok(())
    }
}
