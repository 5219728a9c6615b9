//! Registration service
//!
//! Every register/unregister path in the API goes through here. The
//! repository does the transactional bookkeeping; this layer logs the change
//! and queues the confirmation email once the transaction has committed.

use chrono::Utc;
use tracing::warn;
use uuid::Uuid;
use crate::database::repositories::RegistrationRepository;
use crate::models::registration::{Registration, RegistrationOutcome, UnregistrationOutcome};
use crate::services::notification::{RegistrationCreated, TriggerSender};
use crate::utils::errors::Result;
use crate::utils::logging::{log_event_action, log_registration_change};

#[derive(Clone)]
#[derive(Debug)]
pub struct RegistrationService {
    registrations: RegistrationRepository,
    triggers: TriggerSender,
}

impl RegistrationService {
    pub fn new(registrations: RegistrationRepository, triggers: TriggerSender) -> Self {
        Self { registrations, triggers }
    }

    /// Register a user for an event
    ///
    /// Repeating the call for an existing registration returns it with
    /// `created = false` and queues no email.
    pub async fn register(&self, event_id: Uuid, user_id: Uuid) -> Result<RegistrationOutcome> {
        let outcome = self.registrations.register(event_id, user_id, Utc::now()).await?;

        if outcome.created {
            log_registration_change(event_id, user_id, "register", outcome.attendee_count);

            if self.triggers.send(RegistrationCreated { user_id, event_id }).is_err() {
                warn!(event_id = %event_id, user_id = %user_id, "Confirmation worker is not running; email skipped");
            }
        }

        Ok(outcome)
    }

    pub async fn unregister(&self, event_id: Uuid, user_id: Uuid) -> Result<UnregistrationOutcome> {
        let outcome = self.registrations.unregister(event_id, user_id).await?;
        log_registration_change(event_id, user_id, "unregister", outcome.attendee_count);
        Ok(outcome)
    }

    pub async fn mark_attendance(&self, event_id: Uuid, user_id: Uuid, attended: bool) -> Result<Registration> {
        let registration = self.registrations.mark_attendance(event_id, user_id, attended).await?;
        log_event_action(
            event_id,
            "mark_attendance",
            user_id,
            Some(if attended { "attended" } else { "not attended" }),
        );
        Ok(registration)
    }

    pub async fn find(&self, event_id: Uuid, user_id: Uuid) -> Result<Option<Registration>> {
        self.registrations.find(event_id, user_id).await
    }
}
