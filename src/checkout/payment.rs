//! UPI hand-off and payment confirmation polling.

use std::time::Duration;

use url::form_urlencoded;
use uuid::Uuid;

use crate::client::StorefrontApi;
use crate::config::CheckoutSettings;
use crate::domain::aggregates::PaymentStatus;
use crate::domain::value_objects::Money;

/// `upi://pay` deep link that opens a UPI app with the payment prefilled.
pub fn upi_link(payee: &str, merchant_name: &str, amount: Money, order_id: Uuid) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("pa", payee)
        .append_pair("pn", merchant_name)
        .append_pair("am", &amount.rounded().amount().normalize().to_string())
        .append_pair("tn", &format!("Order {order_id}"))
        .append_pair("cu", "INR")
        .finish();
    format!("upi://pay?{query}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Leave the checkout after `redirect_after`.
    Confirmed { redirect_after: Duration },
    Failed,
    Exhausted { attempts: u32 },
    Cancelled,
}

/// Poll the order until its payment settles or the attempts run out.
///
/// The first check runs immediately, then one every `poll_interval`. Read
/// errors are logged and still use up an attempt.
pub async fn poll_until_settled(api: &dyn StorefrontApi, order_id: Uuid, settings: &CheckoutSettings) -> PollOutcome {
    let attempts = settings.max_poll_attempts;
    for attempt in 1..=attempts {
        if attempt > 1 {
            tokio::time::sleep(settings.poll_interval).await;
        }
        match api.get_order(order_id).await {
            Ok(order) => match order.payment_status() {
                PaymentStatus::Completed => {
                    tracing::info!(%order_id, attempt, "payment confirmed");
                    return PollOutcome::Confirmed { redirect_after: settings.redirect_delay };
                }
                PaymentStatus::Failed => {
                    tracing::warn!(%order_id, attempt, "payment reported failed");
                    return PollOutcome::Failed;
                }
                PaymentStatus::Pending => tracing::debug!(%order_id, attempt, "payment still pending"),
            },
            Err(e) => tracing::warn!(%order_id, attempt, error = %e, "payment status check failed"),
        }
    }
    tracing::warn!(%order_id, attempts, "payment not confirmed, falling back to manual reference");
    PollOutcome::Exhausted { attempts }
}
