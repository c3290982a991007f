//! Background scheduled tasks for the application.
//!
//! This module centralizes the recurring reconciliation jobs (expiring stale
//! pending orders, releasing lapsed waitlist reservations, and retiring
//! memberships past their renewal date). Call `spawn_all` once during startup
//! to launch them.

use crate::services::{MembershipService, OrderService, WaitlistService};
use chrono::Duration;

/// 待支付订单超时时长
const PENDING_ORDER_TTL_MINUTES: i64 = 30;
const PENDING_ORDER_SWEEP_SECS: u64 = 5 * 60;
const RESERVATION_SWEEP_SECS: u64 = 10 * 60;
const MEMBERSHIP_SWEEP_SECS: u64 = 6 * 3600;

/// Spawn all background tasks.
///
/// Notes
/// - Each sweep is idempotent as implemented in its service and runs on its
///   own schedule.
/// - This function detaches tasks via `tokio::spawn`; it does not block.
pub fn spawn_all(
    order_service: OrderService,
    waitlist_service: WaitlistService,
    membership_service: MembershipService,
) {
    // 超时未支付订单：取消并释放库存（每 5 分钟）
    {
        let svc = order_service.clone();
        tokio::spawn(async move {
            loop {
                match svc
                    .expire_pending_orders(Duration::minutes(PENDING_ORDER_TTL_MINUTES))
                    .await
                {
                    Ok(n) if n > 0 => log::info!("Expired pending orders: {n}"),
                    Ok(_) => {}
                    Err(e) => log::error!("Failed to expire pending orders: {e:?}"),
                }
                tokio::time::sleep(std::time::Duration::from_secs(PENDING_ORDER_SWEEP_SECS)).await;
            }
        });
    }

    // 候补购票窗口过期：作废资格并放回库存（每 10 分钟）
    {
        let svc = waitlist_service.clone();
        tokio::spawn(async move {
            loop {
                match svc.expire_reservations().await {
                    Ok(n) if n > 0 => log::info!("Expired waitlist reservations: {n}"),
                    Ok(_) => {}
                    Err(e) => log::error!("Failed to expire waitlist reservations: {e:?}"),
                }
                tokio::time::sleep(std::time::Duration::from_secs(RESERVATION_SWEEP_SECS)).await;
            }
        });
    }

    // 会员到期检查（每 6 小时）
    {
        let svc = membership_service.clone();
        tokio::spawn(async move {
            loop {
                match svc.expire_memberships().await {
                    Ok(n) if n > 0 => log::info!("Expired memberships processed: {n}"),
                    Ok(_) => {}
                    Err(e) => log::error!("Failed to expire memberships: {e:?}"),
                }
                tokio::time::sleep(std::time::Duration::from_secs(MEMBERSHIP_SWEEP_SECS)).await;
            }
        });
    }
}
