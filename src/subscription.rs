use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_CURRENCY: &str = "TWD";
pub const DEFAULT_ICON: &str = "📦";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionCategory {
    Entertainment,
    Productivity,
    Lifestyle,
    Other,
}

impl SubscriptionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionCategory::Entertainment => "entertainment",
            SubscriptionCategory::Productivity => "productivity",
            SubscriptionCategory::Lifestyle => "lifestyle",
            SubscriptionCategory::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl BillingCycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingCycle::Weekly => "weekly",
            BillingCycle::Monthly => "monthly",
            BillingCycle::Quarterly => "quarterly",
            BillingCycle::Yearly => "yearly",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRecord {
    pub id: String,
    pub name: String,
    pub category: SubscriptionCategory,
    pub price: f64,
    pub currency: String,
    pub billing_cycle: BillingCycle,
    pub start_date: String,
    pub next_billing_date: String,
    pub icon: String,
    pub reminder_enabled: bool,
}

pub fn subscription_id_from_name(name: &str) -> String {
    let digest = Uuid::new_v5(
        &Uuid::NAMESPACE_URL,
        format!("subwise:subscription:{name}").as_bytes(),
    );
    let hex = digest.simple().to_string();
    format!("sub_{}", &hex[..12])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_ids_are_stable_per_name() {
        let a = subscription_id_from_name("Netflix");
        let b = subscription_id_from_name("Netflix");
        let c = subscription_id_from_name("Spotify");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("sub_"));
        assert_eq!(a.len(), "sub_".len() + 12);
    }

    #[test]
    fn record_serializes_with_app_schema_field_names() {
        let record = SubscriptionRecord {
            id: subscription_id_from_name("Netflix"),
            name: "Netflix".to_string(),
            category: SubscriptionCategory::Entertainment,
            price: 15.99,
            currency: "USD".to_string(),
            billing_cycle: BillingCycle::Monthly,
            start_date: "2026-01-01".to_string(),
            next_billing_date: "2026-02-01".to_string(),
            icon: DEFAULT_ICON.to_string(),
            reminder_enabled: false,
        };
        let value = serde_json::to_value(&record).expect("serialize record");
        assert_eq!(
            value.get("category").and_then(|v| v.as_str()),
            Some("entertainment")
        );
        assert_eq!(
            value.get("billingCycle").and_then(|v| v.as_str()),
            Some("monthly")
        );
        assert_eq!(
            value.get("nextBillingDate").and_then(|v| v.as_str()),
            Some("2026-02-01")
        );
        assert_eq!(
            value.get("reminderEnabled").and_then(|v| v.as_bool()),
            Some(false)
        );
    }
}
