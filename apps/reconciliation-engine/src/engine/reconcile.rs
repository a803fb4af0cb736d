//! Fill reconciliation.
//!
//! A fill becomes final only when three messages have arrived: the status
//! checkpoint (held in the pending-fill ledger), the execution, and the
//! commission report. The commission report is the venue's last word on a
//! fill, so its arrival drives the join: execution and checkpoint are popped,
//! the position is updated, commission and P&L are attributed across the
//! opened and closed portions, and the resulting fill is folded into the
//! order.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::events::{CommissionReport, ExecutionEvent, StatusCode};
use super::{ReconcileError, ReconciliationEngine};

impl ReconciliationEngine {
    /// Handle an execution event: held until its commission report arrives.
    pub fn on_execution(&self, event: ExecutionEvent) {
        let mut state = self.lock_state();
        state.executions.insert(event.exec_id.clone(), event);
    }

    /// Handle a commission report, completing the fill it belongs to.
    ///
    /// Failures are contained here: the event is logged and dropped, never
    /// retried.
    pub fn on_commission_report(&self, report: &CommissionReport) {
        if let Err(err) = self.apply_commission_report(report) {
            warn!(exec_id = %report.exec_id, error = %err, "commission report dropped");
        }
    }

    fn apply_commission_report(&self, report: &CommissionReport) -> Result<(), ReconcileError> {
        let snapshot_id = {
            let mut state = self.lock_state();

            let execution = state.executions.remove(&report.exec_id).ok_or_else(|| {
                ReconcileError::UnknownExecution {
                    exec_id: report.exec_id.clone(),
                }
            })?;

            let order_id = execution.order_id;
            if !state.orders.contains_key(&order_id) {
                return Err(ReconcileError::UnknownOrder { order_id });
            }

            let checkpoint = state.ledger.take(order_id, execution.cum_qty).ok_or(
                ReconcileError::LedgerJoinMiss {
                    order_id,
                    cum_qty: execution.cum_qty,
                },
            )?;

            let size = execution.side.signed(execution.shares);
            if size.is_zero() {
                return Err(ReconcileError::ZeroSizeFill { order_id });
            }

            let order = state
                .orders
                .get_mut(&order_id)
                .ok_or(ReconcileError::UnknownOrder { order_id })?;
            let instrument = order.instrument().clone();

            // An overfilled lot must be caught before the position book is
            // touched, or dropping the event would leave a phantom position.
            let prospective = order.executed().size + size;
            if prospective.abs() > order.quantity() {
                return Err(crate::domain::order::OrderError::Overfill {
                    filled: prospective.abs(),
                    requested: order.quantity(),
                }
                .into());
            }

            // Like the overfill check, the timestamp must parse before the
            // position book is touched: dropping the report afterwards would
            // leave a phantom position.
            let executed_at = parse_exec_time(&execution.time)?;

            // Entry price before the update prices the closed portion.
            let entry_price = self.positions.get(&instrument).price;
            let update = self.positions.update(&instrument, size, execution.price);

            let (closed_commission, opened_commission) =
                split_commission(report.commission, update.closed, size);

            let comm = self.commission_info(&instrument);
            let closed_value = comm.operation_cost(update.closed, entry_price);
            let opened_value = comm.operation_cost(update.opened, execution.price);

            // The venue's realized figure is authoritative, but only
            // meaningful when something closed.
            let pnl = if update.closed.is_zero() {
                Decimal::ZERO
            } else {
                report.realized_pnl
            };

            let fill = crate::domain::order::Fill {
                executed_at,
                size,
                price: execution.price,
                closed_qty: update.closed,
                closed_value,
                closed_commission,
                opened_qty: update.opened,
                opened_value,
                opened_commission,
                margin: self.gateway.last_close(&instrument),
                pnl,
                position_size: update.size,
                position_price: update.price,
            };

            order.execute(&fill)?;

            let result = if checkpoint.status == StatusCode::Filled {
                let result = order.completed();
                state.ledger.drop_order(order_id);
                result
            } else {
                order.partial()
            };
            if let Err(err) = result {
                debug!(order_id = %order_id, error = %err, "fill status transition dropped");
            }

            if !state.to_notify.contains(&order_id) {
                state.to_notify.push_back(order_id);
            }
            order_id
        };

        debug!(order_id = %snapshot_id, exec_id = %report.exec_id, "fill reconciled");
        Ok(())
    }
}

/// Split a commission across the closed and opened portions of a fill,
/// proportional to quantity. The two parts always sum to the original
/// commission exactly, rounding error included.
#[must_use]
pub fn split_commission(
    commission: Decimal,
    closed: Decimal,
    size: Decimal,
) -> (Decimal, Decimal) {
    let closed_commission = commission * closed.abs() / size.abs();
    (closed_commission, commission - closed_commission)
}

/// Parse a venue execution timestamp.
///
/// Two shapes are seen on the wire: `"YYYYMMDD HH:MM:SS TZ"` (zone name
/// appended) and `"YYYYMMDD HH:MM:SS Weekday"`. The trailing token carries
/// no usable offset, so it is discarded and the timestamp kept naive.
///
/// # Errors
///
/// Returns error if the string does not contain a parseable date and time.
pub fn parse_exec_time(raw: &str) -> Result<NaiveDateTime, ReconcileError> {
    let mut tokens = raw.split_whitespace();
    let (Some(date), Some(time)) = (tokens.next(), tokens.next()) else {
        return Err(ReconcileError::BadExecTime {
            raw: raw.to_string(),
        });
    };

    NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%Y%m%d %H:%M:%S").map_err(|_| {
        ReconcileError::BadExecTime {
            raw: raw.to_string(),
        }
    })
}
