//! Defines the dashboard endpoint, which summarises a user's balances and
//! transactions.

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Serialize;
use serde_json::json;
use time::{Month, OffsetDateTime};

use crate::{
    Error,
    account::{Account, get_accounts_for_user},
    auth::CurrentUser,
    user::UserID,
};

use super::{
    TransactionState, TransactionType, core::Transaction, get_transactions_for_user,
};

/// How many of the newest transactions the dashboard shows.
const RECENT_TRANSACTION_COUNT: usize = 5;
/// How many of the newest accounts the dashboard shows.
const RECENT_ACCOUNT_COUNT: usize = 4;

/// Income and expense totals for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTotals {
    /// The full month name, e.g. "January".
    pub label: String,
    pub income: f64,
    pub expense: f64,
}

/// The figures shown on a user's dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    /// The sum of the balances of all the user's accounts.
    pub available_balance: f64,
    /// The sum of every income transaction.
    pub total_income: f64,
    /// The sum of every expense transaction.
    pub total_expense: f64,
    /// One entry per month of the requested year, January first.
    pub chart_data: Vec<MonthlyTotals>,
    /// The newest transactions, newest first.
    pub last_transactions: Vec<Transaction>,
    /// The most recently created accounts, newest first.
    pub last_account: Vec<Account>,
}

/// A route handler that responds with the caller's dashboard summary for the
/// current year.
pub async fn dashboard_endpoint(
    State(state): State<TransactionState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Response, Error> {
    let year = OffsetDateTime::now_utc().year();

    let summary = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        get_dashboard_summary(user_id, year, &connection)?
    };

    Ok(Json(json!({
        "status": "success",
        "message": "Dashboard data fetched successfully",
        "data": summary,
    }))
    .into_response())
}

/// Summarise the accounts and transactions of `user_id`, with the monthly
/// chart covering `year`.
///
/// # Errors
/// Returns [Error::SqlError] if a query fails.
pub fn get_dashboard_summary(
    user_id: UserID,
    year: i32,
    connection: &Connection,
) -> Result<DashboardSummary, Error> {
    let accounts = get_accounts_for_user(user_id, connection)?;
    let transactions = get_transactions_for_user(user_id, None, connection)?;

    let available_balance = accounts.iter().map(|account| account.balance).sum();
    let total_income = sum_of_kind(&transactions, TransactionType::Income);
    let total_expense = sum_of_kind(&transactions, TransactionType::Expense);
    let chart_data = aggregate_by_month(&transactions, year);

    let last_transactions = transactions
        .into_iter()
        .take(RECENT_TRANSACTION_COUNT)
        .collect();
    // Accounts come back in creation order.
    let last_account = accounts
        .into_iter()
        .rev()
        .take(RECENT_ACCOUNT_COUNT)
        .collect();

    Ok(DashboardSummary {
        available_balance,
        total_income,
        total_expense,
        chart_data,
        last_transactions,
        last_account,
    })
}

fn sum_of_kind(transactions: &[Transaction], kind: TransactionType) -> f64 {
    transactions
        .iter()
        .filter(|transaction| transaction.kind == kind)
        .map(|transaction| transaction.amount)
        .sum()
}

/// Total the income and expenses of each month in `year`.
///
/// Months without transactions are included with zero totals.
fn aggregate_by_month(transactions: &[Transaction], year: i32) -> Vec<MonthlyTotals> {
    let mut month = Month::January;
    let mut totals: Vec<MonthlyTotals> = (0..12)
        .map(|_| {
            let label = month.to_string();
            month = month.next();

            MonthlyTotals {
                label,
                income: 0.0,
                expense: 0.0,
            }
        })
        .collect();

    for transaction in transactions
        .iter()
        .filter(|transaction| transaction.created_at.year() == year)
    {
        let index = usize::from(u8::from(transaction.created_at.month())) - 1;

        match transaction.kind {
            TransactionType::Income => totals[index].income += transaction.amount,
            TransactionType::Expense => totals[index].expense += transaction.amount,
        }
    }

    totals
}
