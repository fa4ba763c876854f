//! Read-only aggregates served to the admin dashboards.

use crate::OrderWithOwner;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Headline counters for the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
	pub total_orders: usize,
	pub pending_orders: usize,
	pub preparing_orders: usize,
	pub ready_orders: usize,
	pub completed_orders: usize,
	/// Number of non-admin users.
	pub total_users: usize,
	pub total_products: usize,
	#[serde(with = "rust_decimal::serde::float")]
	pub revenue: Decimal,
}

/// Response of `GET /api/admin/dashboard`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
	pub stats: DashboardStats,
	pub recent_orders: Vec<OrderWithOwner>,
}

/// Revenue figures for one time window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowStats {
	#[serde(with = "rust_decimal::serde::float")]
	pub revenue: Decimal,
	pub order_count: usize,
	#[serde(with = "rust_decimal::serde::float")]
	pub average_order_value: Decimal,
}

/// Revenue figures for each reporting window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialStats {
	pub today: WindowStats,
	pub this_week: WindowStats,
	pub this_month: WindowStats,
	pub all_time: WindowStats,
}

/// Response of `GET /api/admin/financials`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Financials {
	pub stats: FinancialStats,
	pub recent_transactions: Vec<OrderWithOwner>,
}
