//! Store (merchant) Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::domain::snapshots::{Branding, SocialHandles, StoreSnapshot};
use crate::domain::value_objects::Money;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Store {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub social_media: SocialHandles,
    pub branding: Branding,
    pub website: WebsiteSettings,
    pub sales: SalesMetrics,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebsiteSettings {
    pub enabled: bool,
    pub order_count: u64,
    pub last_visit: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesMetrics {
    /// Orders that contained at least one line from this store.
    pub total_sales: u64,
    pub total_revenue: Money,
}

impl Store {
    pub fn create(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: Uuid::now_v7(),
            slug: name.trim().to_lowercase().replace(' ', "-"),
            name,
            phone: None,
            email: None,
            address: None,
            social_media: SocialHandles::default(),
            branding: Branding::default(),
            website: WebsiteSettings::default(),
            sales: SalesMetrics::default(),
            created_at: Utc::now(),
        }
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            name: self.name.clone(),
            phone: self.phone.clone(),
            email: self.email.clone(),
            address: self.address.clone(),
            social_media: self.social_media.clone(),
            branding: self.branding.clone(),
        }
    }

    /// Credits this store with its share of a placed order.
    pub fn record_order(&mut self, store_subtotal: Money, at: DateTime<Utc>) {
        self.sales.total_sales += 1;
        self.sales.total_revenue += store_subtotal;
        if self.website.enabled {
            self.website.order_count += 1;
            self.website.last_visit = Some(at);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_order_without_website() {
        let mut store = Store::create("Mama Put Kitchen");
        assert_eq!(store.slug, "mama-put-kitchen");
        store.record_order(Money::naira(2500), Utc::now());
        store.record_order(Money::naira(500), Utc::now());
        assert_eq!(store.sales.total_sales, 2);
        assert_eq!(store.sales.total_revenue, Money::naira(3000));
        assert_eq!(store.website, WebsiteSettings::default());
    }

    #[test]
    fn test_record_order_bumps_website_metrics() {
        let mut store = Store::create("Ade Gadgets");
        store.website.enabled = true;
        let at = Utc::now();
        store.record_order(Money::naira(10_000), at);
        assert_eq!(store.website.order_count, 1);
        assert_eq!(store.website.last_visit, Some(at));
    }
}
