//! Notification service implementation
//!
//! This service renders email templates, delivers them through the
//! transactional email HTTP API, and runs the two background jobs that send
//! mail: the confirmation worker fed by committed registrations and the
//! periodic reminder scheduler.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::{EmailConfig, ReminderConfig};
use crate::database::DatabaseService;
use crate::models::{Event, User};
use crate::utils::errors::{EventifyError, Result};
use crate::utils::helpers::{escape_html, format_date, format_time, truncate_text};
use crate::utils::logging::{log_api_error, log_email_delivery};

pub const REGISTRATION_CONFIRMATION: &str = "registration_confirmation";
pub const EVENT_REMINDER: &str = "event_reminder";
pub const PASSWORD_RESET: &str = "password_reset";

/// Longest delivery error kept on a registration row
const MAX_STORED_ERROR_LEN: usize = 500;

/// Email template with `{param}` placeholders
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailTemplate {
    pub key: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Template output ready to be addressed and sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Request body of the email API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Response body of the email API
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    pub id: Option<String>,
}

/// Posted by the registration service once a registration has committed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationCreated {
    pub user_id: Uuid,
    pub event_id: Uuid,
}

pub type TriggerSender = mpsc::UnboundedSender<RegistrationCreated>;
pub type TriggerReceiver = mpsc::UnboundedReceiver<RegistrationCreated>;

pub fn trigger_channel() -> (TriggerSender, TriggerReceiver) {
    mpsc::unbounded_channel()
}

/// Delivery counters since startup
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationStats {
    pub total_sent: u64,
    pub total_failed: u64,
}

/// HTTP client for the transactional email API
#[derive(Clone)]
#[derive(Debug)]
pub struct EmailClient {
    client: reqwest::Client,
    config: EmailConfig,
}

impl EmailClient {
    pub fn new(config: EmailConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("Eventify/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// `Name <address>` sender header
    pub fn sender(&self) -> String {
        format!("{} <{}>", self.config.from_name, self.config.from_address)
    }

    /// Deliver one message and return the provider's message id
    pub async fn send(&self, message: &EmailMessage) -> Result<DeliveryReceipt> {
        if !self.config.enabled {
            return Err(EventifyError::ServiceUnavailable("Email delivery is disabled".to_string()));
        }

        debug!(to = %message.to, subject = %message.subject, "Sending email");

        let response = self.client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(message)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log_api_error("email", &format!("HTTP {}", status), Some(&body));
            return Err(EventifyError::Email(format!(
                "Email API responded with {}: {}",
                status,
                body.trim()
            )));
        }

        let receipt = response.json::<DeliveryReceipt>().await.unwrap_or_default();
        Ok(receipt)
    }
}

/// Template registry plus delivery
#[derive(Clone)]
#[derive(Debug)]
pub struct NotificationService {
    client: EmailClient,
    templates: Arc<HashMap<String, EmailTemplate>>,
    site_url: String,
    sent: Arc<AtomicU64>,
    failed: Arc<AtomicU64>,
}

impl NotificationService {
    pub fn new(config: EmailConfig) -> Result<Self> {
        let site_url = config.site_url.trim_end_matches('/').to_string();
        let client = EmailClient::new(config)?;

        Ok(Self {
            client,
            templates: Arc::new(Self::load_default_templates()),
            site_url,
            sent: Arc::new(AtomicU64::new(0)),
            failed: Arc::new(AtomicU64::new(0)),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_enabled()
    }

    pub fn stats(&self) -> NotificationStats {
        NotificationStats {
            total_sent: self.sent.load(Ordering::Relaxed),
            total_failed: self.failed.load(Ordering::Relaxed),
        }
    }

    /// Fill a template's placeholders; values are HTML-escaped in the HTML body
    pub fn render(&self, template_key: &str, parameters: &HashMap<String, String>) -> Result<RenderedEmail> {
        let template = self.templates.get(template_key)
            .ok_or_else(|| EventifyError::InvalidInput(format!("Template not found: {}", template_key)))?;

        let mut subject = template.subject.clone();
        let mut html = template.html.clone();
        let mut text = template.text.clone();

        for (key, value) in parameters {
            let placeholder = format!("{{{}}}", key);
            subject = subject.replace(&placeholder, value);
            html = html.replace(&placeholder, &escape_html(value));
            text = text.replace(&placeholder, value);
        }

        Ok(RenderedEmail { subject, html, text })
    }

    /// Render and deliver a template to one recipient
    pub async fn send_template(
        &self,
        template_key: &str,
        to: &str,
        parameters: &HashMap<String, String>,
    ) -> Result<DeliveryReceipt> {
        let rendered = self.render(template_key, parameters)?;
        let message = EmailMessage {
            from: self.client.sender(),
            to: to.to_string(),
            subject: rendered.subject,
            html: rendered.html,
            text: rendered.text,
        };

        match self.client.send(&message).await {
            Ok(receipt) => {
                self.sent.fetch_add(1, Ordering::Relaxed);
                log_email_delivery(template_key, to, true, receipt.id.as_deref());
                Ok(receipt)
            }
            Err(e) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                log_email_delivery(template_key, to, false, Some(&e.to_string()));
                Err(e)
            }
        }
    }

    fn event_parameters(&self, recipient_name: &str, event: &Event) -> HashMap<String, String> {
        let mut parameters = HashMap::new();
        parameters.insert("name".to_string(), recipient_name.to_string());
        parameters.insert("event_title".to_string(), event.title.clone());
        parameters.insert("event_date".to_string(), format_date(event.start_at));
        parameters.insert("start_time".to_string(), format_time(event.start_at));
        parameters.insert("end_time".to_string(), format_time(event.end_at));
        parameters.insert(
            "event_location".to_string(),
            event.location.clone().unwrap_or_else(|| "TBD".to_string()),
        );
        parameters.insert(
            "event_category".to_string(),
            event.category.clone().unwrap_or_else(|| "General".to_string()),
        );
        parameters.insert(
            "event_description".to_string(),
            event.description.clone().unwrap_or_else(|| "No description available".to_string()),
        );
        parameters.insert("site_url".to_string(), self.site_url.clone());
        parameters
    }

    pub async fn send_registration_confirmation(
        &self,
        user: &User,
        event: &Event,
        registered_at: DateTime<Utc>,
    ) -> Result<DeliveryReceipt> {
        let mut parameters = self.event_parameters(&user.display_name, event);
        parameters.insert("registered_on".to_string(), format_date(registered_at));
        self.send_template(REGISTRATION_CONFIRMATION, &user.email, &parameters).await
    }

    pub async fn send_event_reminder(&self, name: &str, email: &str, event: &Event) -> Result<DeliveryReceipt> {
        let parameters = self.event_parameters(name, event);
        self.send_template(EVENT_REMINDER, email, &parameters).await
    }

    pub async fn send_password_reset(&self, user: &User, token: &str, ttl_minutes: u64) -> Result<DeliveryReceipt> {
        let mut parameters = HashMap::new();
        parameters.insert("name".to_string(), user.display_name.clone());
        parameters.insert(
            "reset_url".to_string(),
            format!("{}/reset-password?token={}", self.site_url, token),
        );
        parameters.insert("ttl_minutes".to_string(), ttl_minutes.to_string());
        self.send_template(PASSWORD_RESET, &user.email, &parameters).await
    }

    /// Load default email templates
    fn load_default_templates() -> HashMap<String, EmailTemplate> {
        let mut templates = HashMap::new();

        templates.insert(REGISTRATION_CONFIRMATION.to_string(), EmailTemplate {
            key: REGISTRATION_CONFIRMATION.to_string(),
            subject: "Event Registration Confirmation - {event_title}".to_string(),
            html: concat!(
                "<h1>Event Registration Confirmed!</h1>",
                "<p>Hello {name},</p>",
                "<p>Your registration for <strong>{event_title}</strong> has been confirmed!</p>",
                "<ul>",
                "<li><strong>Date:</strong> {event_date}</li>",
                "<li><strong>Time:</strong> {start_time} - {end_time}</li>",
                "<li><strong>Location:</strong> {event_location}</li>",
                "<li><strong>Category:</strong> {event_category}</li>",
                "<li><strong>Description:</strong> {event_description}</li>",
                "</ul>",
                "<p><strong>Registration Date:</strong> {registered_on}</p>",
                "<p>We look forward to seeing you at the event!</p>",
                "<p><a href=\"{site_url}\">Visit Eventify</a></p>",
            ).to_string(),
            text: concat!(
                "Event Registration Confirmation - {event_title}\n\n",
                "Hello {name},\n\n",
                "Your registration for {event_title} has been confirmed!\n\n",
                "Event Details:\n",
                "- Date: {event_date}\n",
                "- Time: {start_time} - {end_time}\n",
                "- Location: {event_location}\n",
                "- Category: {event_category}\n",
                "- Description: {event_description}\n\n",
                "Registration Date: {registered_on}\n\n",
                "We look forward to seeing you at the event!\n\n",
                "Best regards,\nThe Eventify Team\n\n",
                "Visit us at: {site_url}\n",
            ).to_string(),
        });

        templates.insert(EVENT_REMINDER.to_string(), EmailTemplate {
            key: EVENT_REMINDER.to_string(),
            subject: "Reminder: {event_title} starts soon".to_string(),
            html: concat!(
                "<h1>Event Reminder</h1>",
                "<p>Hello {name},</p>",
                "<p><strong>{event_title}</strong> starts soon!</p>",
                "<p><strong>Time:</strong> {event_date} {start_time}</p>",
                "<p><strong>Location:</strong> {event_location}</p>",
                "<p>Don't forget to attend!</p>",
            ).to_string(),
            text: concat!(
                "Event Reminder\n\n",
                "Hello {name},\n\n",
                "{event_title} starts soon!\n\n",
                "Time: {event_date} {start_time}\n",
                "Location: {event_location}\n\n",
                "Don't forget to attend!\n\n",
                "Best regards,\nThe Eventify Team\n",
            ).to_string(),
        });

        templates.insert(PASSWORD_RESET.to_string(), EmailTemplate {
            key: PASSWORD_RESET.to_string(),
            subject: "Reset your Eventify password".to_string(),
            html: concat!(
                "<p>Hello {name},</p>",
                "<p>We received a request to reset your password. ",
                "<a href=\"{reset_url}\">Choose a new password</a>. ",
                "The link expires in {ttl_minutes} minutes.</p>",
                "<p>If you did not ask for this, you can ignore this email.</p>",
            ).to_string(),
            text: concat!(
                "Hello {name},\n\n",
                "We received a request to reset your password. Open this link to choose a new one:\n",
                "{reset_url}\n\n",
                "The link expires in {ttl_minutes} minutes. If you did not ask for this, you can ignore this email.\n",
            ).to_string(),
        });

        templates
    }
}

/// Sends the confirmation email for each committed registration and
/// records the outcome on the registration row
pub struct ConfirmationWorker {
    db: DatabaseService,
    notifications: NotificationService,
}

impl ConfirmationWorker {
    pub fn new(db: DatabaseService, notifications: NotificationService) -> Self {
        Self { db, notifications }
    }

    /// Consume triggers until every sender is dropped
    pub fn start(self, mut receiver: TriggerReceiver) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("Confirmation email worker started");
            while let Some(trigger) = receiver.recv().await {
                if let Err(e) = self.process(trigger).await {
                    error!(
                        user_id = %trigger.user_id,
                        event_id = %trigger.event_id,
                        error = %e,
                        "Confirmation trigger failed"
                    );
                }
            }
            info!("Confirmation email worker stopped");
        })
    }

    /// Handle one trigger; returns whether an email went out
    pub async fn process(&self, trigger: RegistrationCreated) -> Result<bool> {
        let RegistrationCreated { user_id, event_id } = trigger;

        let Some(user) = self.db.users.find_by_id(user_id).await? else {
            warn!(user_id = %user_id, "Registration trigger for unknown user");
            return Ok(false);
        };
        let Some(event) = self.db.events.find_by_id(event_id).await? else {
            warn!(event_id = %event_id, "Registration trigger for unknown event");
            return Ok(false);
        };
        let registered_at = self.db.registrations
            .find(event_id, user_id)
            .await?
            .map(|r| r.registered_at)
            .unwrap_or_else(Utc::now);

        match self.notifications.send_registration_confirmation(&user, &event, registered_at).await {
            Ok(receipt) => {
                self.db.registrations
                    .record_email_sent(event_id, user_id, receipt.id.as_deref())
                    .await?;
                Ok(true)
            }
            Err(e) => {
                self.db.registrations
                    .record_email_failure(event_id, user_id, &truncate_text(&e.to_string(), MAX_STORED_ERROR_LEN))
                    .await?;
                Ok(false)
            }
        }
    }
}

/// Counts from one reminder run
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReminderRunReport {
    pub events: usize,
    pub sent: usize,
    pub failed: usize,
}

/// Emails attendees of events that start within the lead window
pub struct ReminderScheduler {
    db: DatabaseService,
    notifications: NotificationService,
    config: ReminderConfig,
}

impl ReminderScheduler {
    pub fn new(db: DatabaseService, notifications: NotificationService, config: ReminderConfig) -> Self {
        Self { db, notifications, config }
    }

    /// Run on a fixed interval; the first run happens immediately
    pub fn start(self) -> JoinHandle<()> {
        let period = Duration::from_secs(self.config.interval_minutes.max(1) * 60);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            info!(interval = ?period, lead_minutes = self.config.lead_minutes, "Reminder scheduler started");

            loop {
                interval.tick().await;

                match self.run_once(Utc::now()).await {
                    Ok(report) => {
                        if report.events > 0 {
                            info!(events = report.events, sent = report.sent, failed = report.failed, "Reminder run completed");
                        } else {
                            debug!("Reminder run found no upcoming events");
                        }
                    }
                    Err(e) => {
                        e.log();
                    }
                }
            }
        })
    }

    /// Send reminders for events with `now < start_at <= now + lead`
    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<ReminderRunReport> {
        let until = now + chrono::Duration::minutes(self.config.lead_minutes);
        let events = self.db.events.starting_between(now, until).await?;

        let mut report = ReminderRunReport {
            events: events.len(),
            ..Default::default()
        };

        for event in &events {
            // A failed lookup skips this event, not the run
            let attendees = match self.db.events.list_attendees(event.id).await {
                Ok(attendees) => attendees,
                Err(e) => {
                    report.failed += 1;
                    warn!(event_id = %event.id, error = %e, "Could not load attendees for reminders");
                    continue;
                }
            };
            for attendee in attendees {
                match self.notifications.send_event_reminder(&attendee.name, &attendee.email, event).await {
                    Ok(_) => report.sent += 1,
                    Err(e) => {
                        report.failed += 1;
                        warn!(event_id = %event.id, user_id = %attendee.user_id, error = %e, "Reminder email failed");
                    }
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    fn service() -> NotificationService {
        let mut config = Settings::default().email;
        config.site_url = "https://events.example.edu/".to_string();
        NotificationService::new(config).unwrap()
    }

    #[test]
    fn test_render_fills_placeholders() {
        let service = service();
        let mut parameters = HashMap::new();
        parameters.insert("name".to_string(), "Ada".to_string());
        parameters.insert("event_title".to_string(), "Rust Meetup".to_string());

        let rendered = service.render(EVENT_REMINDER, &parameters).unwrap();
        assert_eq!(rendered.subject, "Reminder: Rust Meetup starts soon");
        assert!(rendered.text.contains("Hello Ada,"));
        assert!(rendered.html.contains("<strong>Rust Meetup</strong>"));
    }

    #[test]
    fn test_render_escapes_html_only_in_html_body() {
        let service = service();
        let mut parameters = HashMap::new();
        parameters.insert("name".to_string(), "<script>".to_string());

        let rendered = service.render(PASSWORD_RESET, &parameters).unwrap();
        assert!(rendered.html.contains("&lt;script&gt;"));
        assert!(rendered.text.contains("Hello <script>,"));
    }

    #[test]
    fn test_unknown_template() {
        let service = service();
        assert!(matches!(
            service.render("welcome", &HashMap::new()),
            Err(EventifyError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_site_url_trailing_slash_trimmed() {
        assert_eq!(service().site_url, "https://events.example.edu");
    }

    #[tokio::test]
    async fn test_disabled_client_refuses_to_send() {
        let service = service();
        assert!(!service.is_enabled());

        let result = service.send_template(PASSWORD_RESET, "a@uni.edu", &HashMap::new()).await;
        assert!(matches!(result, Err(EventifyError::ServiceUnavailable(_))));
        assert_eq!(service.stats(), NotificationStats { total_sent: 0, total_failed: 1 });
    }

    #[test]
    fn test_trigger_channel_keeps_order_and_closes() {
        let (tx, mut rx) = trigger_channel();
        let first = RegistrationCreated { user_id: Uuid::new_v4(), event_id: Uuid::new_v4() };
        let second = RegistrationCreated { user_id: Uuid::new_v4(), event_id: first.event_id };

        tx.send(first).unwrap();
        tx.send(second).unwrap();
        drop(tx);

        tokio_test::block_on(async {
            assert_eq!(rx.recv().await, Some(first));
            assert_eq!(rx.recv().await, Some(second));
            assert_eq!(rx.recv().await, None);
        });
    }
}
