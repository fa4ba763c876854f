//! Reporting handler for the admin dashboard, financials and user list.
//!
//! Every report is computed from a full scan of the relevant namespaces.
//! Time windows are taken in UTC relative to the `now` the caller passes in.

use crate::handlers::order::load_orders_with_owners;
use crate::EngineError;
use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use pickup_auth::Identity;
use pickup_storage::StorageService;
use pickup_types::{
	round_money, Dashboard, DashboardStats, FinancialStats, Financials, Order, OrderStatus,
	OrderWithOwner, Product, PublicUser, Role, StorageKey, User, UserSummary, WindowStats,
};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

const RECENT_ORDERS: usize = 5;
const RECENT_TRANSACTIONS: usize = 10;

/// Handler for admin reports. Every operation requires the admin role.
pub struct ReportingHandler {
	storage: Arc<StorageService>,
}

impl ReportingHandler {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage }
	}

	/// Order counts per status, customer and product counts, revenue and the
	/// five newest orders.
	pub async fn dashboard(&self, identity: &Identity) -> Result<Dashboard, EngineError> {
		identity.require_role(Role::Admin)?;

		let orders = load_orders_with_owners(&self.storage).await?;
		let users: Vec<User> = self.storage.list(StorageKey::Users.as_str()).await?;
		let products: Vec<Product> = self.storage.list(StorageKey::Products.as_str()).await?;

		let count = |status: OrderStatus| {
			orders
				.iter()
				.filter(|entry| entry.order.status == status)
				.count()
		};

		let stats = DashboardStats {
			total_orders: orders.len(),
			pending_orders: count(OrderStatus::Pending),
			preparing_orders: count(OrderStatus::Preparing),
			ready_orders: count(OrderStatus::Ready),
			completed_orders: count(OrderStatus::Completed),
			total_users: users.iter().filter(|u| u.role != Role::Admin).count(),
			total_products: products.len(),
			revenue: round_money(
				orders
					.iter()
					.fold(Decimal::ZERO, |sum, entry| sum.saturating_add(entry.order.total)),
			),
		};

		Ok(Dashboard {
			stats,
			recent_orders: orders.into_iter().take(RECENT_ORDERS).collect(),
		})
	}

	/// Revenue, order count and average order value for today, this week,
	/// this month and all time, plus the ten newest orders.
	///
	/// Weeks start on Sunday.
	pub async fn financials(
		&self,
		identity: &Identity,
		now: DateTime<Utc>,
	) -> Result<Financials, EngineError> {
		identity.require_role(Role::Admin)?;

		let orders = load_orders_with_owners(&self.storage).await?;
		let windows = Windows::at(now);

		let stats = FinancialStats {
			today: window_stats(&orders, Some(windows.today)),
			this_week: window_stats(&orders, Some(windows.week)),
			this_month: window_stats(&orders, Some(windows.month)),
			all_time: window_stats(&orders, None),
		};

		Ok(Financials {
			stats,
			recent_transactions: orders.into_iter().take(RECENT_TRANSACTIONS).collect(),
		})
	}

	/// Lists customers (never admins) with how many orders each has placed.
	pub async fn list_users(&self, identity: &Identity) -> Result<Vec<UserSummary>, EngineError> {
		identity.require_role(Role::Admin)?;

		let orders: Vec<Order> = self.storage.list(StorageKey::Orders.as_str()).await?;
		let mut order_counts: HashMap<Uuid, usize> = HashMap::new();
		for order in &orders {
			*order_counts.entry(order.user_id).or_default() += 1;
		}

		let mut users: Vec<User> = self.storage.list(StorageKey::Users.as_str()).await?;
		users.retain(|user| user.role != Role::Admin);
		users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

		Ok(users
			.into_iter()
			.map(|user| UserSummary {
				order_count: order_counts.get(&user.id).copied().unwrap_or(0),
				user: PublicUser::from(user),
			})
			.collect())
	}
}

/// Start instants of the reporting windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Windows {
	today: DateTime<Utc>,
	week: DateTime<Utc>,
	month: DateTime<Utc>,
}

impl Windows {
	fn at(now: DateTime<Utc>) -> Self {
		let today = now.date_naive().and_time(NaiveTime::MIN).and_utc();
		Self {
			today,
			week: today - Duration::days(i64::from(now.weekday().num_days_from_sunday())),
			month: today - Duration::days(i64::from(now.day0())),
		}
	}
}

fn window_stats(orders: &[OrderWithOwner], since: Option<DateTime<Utc>>) -> WindowStats {
	let (revenue, order_count) = orders
		.iter()
		.filter(|entry| since.is_none_or(|start| entry.order.created_at >= start))
		.fold((Decimal::ZERO, 0usize), |(sum, count), entry| {
			(sum.saturating_add(entry.order.total), count + 1)
		});

	let average_order_value = if order_count == 0 {
		Decimal::ZERO
	} else {
		round_money(revenue / Decimal::from(order_count))
	};

	WindowStats {
		revenue: round_money(revenue),
		order_count,
		average_order_value,
	}
}
