//! Customer Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::domain::snapshots::CustomerSnapshot;
use crate::domain::value_objects::Money;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub stats: ShoppingStats,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoppingStats {
    pub total_orders: u32,
    pub total_spent: Money,
    pub average_order_value: Money,
    pub last_order_at: Option<DateTime<Utc>>,
}

impl Customer {
    pub fn register(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(), name: name.into(), email: email.into().trim().to_lowercase(),
            phone: None, stats: ShoppingStats::default(), created_at: Utc::now(),
        }
    }

    pub fn snapshot(&self) -> CustomerSnapshot {
        CustomerSnapshot { name: self.name.clone(), email: self.email.clone(), phone: self.phone.clone() }
    }

    pub fn update_shopping_stats(&mut self, order_total: Money, at: DateTime<Utc>) {
        let stats = &mut self.stats;
        stats.total_orders += 1;
        stats.total_spent += order_total;
        let average = stats.total_spent.amount() / Decimal::from(stats.total_orders);
        stats.average_order_value = Money::new(average.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero));
        stats.last_order_at = Some(at);
    }
}
