//! Query handlers for the accounts context.
//!
//! Queries read the balance view. Passing a context with a min version
//! (the version returned by the last write) gives read-your-writes through
//! a `VersionedRepository`.

use chronicle_core::context::Context;
use chronicle_core::error::DomainError;
use chronicle_core::repository::ReadRepository;
use uuid::Uuid;

use super::projector::AccountBalance;

/// Retrieves the balance view of one account.
///
/// # Errors
///
/// Returns `DomainError::EntityNotFound` if the account has no view yet and
/// `DomainError::Timeout` if a requested min version is not reached in time.
pub async fn get_account_balance(
    ctx: &Context,
    account_id: Uuid,
    repo: &dyn ReadRepository<AccountBalance>,
) -> Result<AccountBalance, DomainError> {
    repo.find(ctx, account_id).await
}

/// Lists every account balance, ordered by owner then account id.
///
/// # Errors
///
/// Returns `DomainError` if the repository cannot be read.
pub async fn list_account_balances(
    ctx: &Context,
    repo: &dyn ReadRepository<AccountBalance>,
) -> Result<Vec<AccountBalance>, DomainError> {
    let mut balances = repo.find_all(ctx).await?;
    balances.sort_by(|a, b| {
        a.owner
            .cmp(&b.owner)
            .then_with(|| a.account_id.cmp(&b.account_id))
    });
    Ok(balances)
}

/// Returns the sum of all account balances.
///
/// # Errors
///
/// Returns `DomainError` if the repository cannot be read.
pub async fn total_holdings(
    ctx: &Context,
    repo: &dyn ReadRepository<AccountBalance>,
) -> Result<i64, DomainError> {
    let balances = repo.find_all(ctx).await?;
    Ok(balances.iter().map(|b| b.balance).sum())
}
