//! # Wallet Ledger
//!
//! The in-memory store of per-currency balances.
//!
//! All mutations happen under a single lock, so a debit and its matching
//! credit are always observed together. Funds for an in-flight conversion are
//! moved into a hold with [`Ledger::reserve`]; the hold is either settled into
//! the destination currency or released back.

use parking_lot::Mutex;
use rust_decimal::Decimal;
use tokio::sync::watch;
use wallet_types::{Balances, Currency, LedgerError};


struct LedgerState {
    balances: Balances,
    held: Balances,
}

/// Process-wide wallet balances, shared by `Arc` handle.
pub struct Ledger {
    state: Mutex<LedgerState>,
    updates: watch::Sender<Balances>,
}

impl Ledger {
    /// Creates a ledger with the default starting balances.
    pub fn new() -> Self {
        Self::with_balances(Balances::default())
    }

    /// Creates a ledger with explicit starting balances.
    pub fn with_balances(balances: Balances) -> Self {
        let (updates, _) = watch::channel(balances.clone());
        Self {
            state: Mutex::new(LedgerState {
                balances,
                held: Balances::zero(),
            }),
            updates,
        }
    }

    /// Returns the spendable balance in `currency`.
    ///
    /// Funds held by pending reservations are not included.
    pub fn balance(&self, currency: Currency) -> Decimal {
        self.state.lock().balances.get(currency)
    }

    /// Returns the total amount of `currency` held by pending reservations.
    pub fn held(&self, currency: Currency) -> Decimal {
        self.state.lock().held.get(currency)
    }

    /// Returns a copy of all spendable balances.
    pub fn snapshot(&self) -> Balances {
        self.state.lock().balances.clone()
    }

    /// Subscribes to balance changes. The receiver starts at the current snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Balances> {
        self.updates.subscribe()
    }

    /// Checks whether `currency` holds at least `amount`.
    pub fn has_sufficient_balance(&self, currency: Currency, amount: Decimal) -> bool {
        self.state.lock().balances.has_at_least(currency, amount)
    }

    /// Debits `source` and credits `dest` as one step.
    ///
    /// Sufficiency is re-checked under the lock; on any error nothing changes.
    pub fn apply_transaction(
        &self,
        source: Currency,
        source_amount: Decimal,
        dest: Currency,
        dest_amount: Decimal,
    ) -> Result<(), LedgerError> {
        let mut state = self.state.lock();
        let mut balances = state.balances.clone();
        balances.debit(source, source_amount)?;
        balances.credit(dest, dest_amount)?;
        state.balances = balances;

        tracing::debug!(
            %source,
            %source_amount,
            %dest,
            %dest_amount,
            "Applied transaction"
        );
        self.publish(&state);
        Ok(())
    }

    /// Moves `amount` of `currency` out of the spendable balance into a hold.
    ///
    /// Fails with `InsufficientBalance` if the spendable balance is short. The
    /// returned reservation releases its funds when dropped unless settled.
    pub fn reserve(&self, currency: Currency, amount: Decimal) -> Result<Reservation<'_>, LedgerError> {
        let mut state = self.state.lock();
        let mut balances = state.balances.clone();
        let mut held = state.held.clone();
        balances.debit(currency, amount)?;
        held.credit(currency, amount)?;
        state.balances = balances;
        state.held = held;

        tracing::debug!(%currency, %amount, "Reserved funds");
        self.publish(&state);
        Ok(Reservation {
            ledger: self,
            currency,
            amount,
            open: true,
        })
    }

    fn publish(&self, state: &LedgerState) {
        self.updates.send_replace(state.balances.clone());
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

/// Funds held for a pending conversion.
#[must_use = "an unsettled reservation releases its funds when dropped"]
pub struct Reservation<'a> {
    ledger: &'a Ledger,
    currency: Currency,
    amount: Decimal,
    open: bool,
}

impl Reservation<'_> {
    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Spends the held funds and credits `dest_amount` to `dest`.
    ///
    /// On error the reservation is still open and is released on drop.
    pub fn settle(mut self, dest: Currency, dest_amount: Decimal) -> Result<(), LedgerError> {
        let ledger = self.ledger;
        let mut state = ledger.state.lock();
        let mut balances = state.balances.clone();
        let mut held = state.held.clone();
        held.debit(self.currency, self.amount)?;
        balances.credit(dest, dest_amount)?;
        state.balances = balances;
        state.held = held;
        self.open = false;

        tracing::debug!(
            source = %self.currency,
            source_amount = %self.amount,
            %dest,
            %dest_amount,
            "Settled reservation"
        );
        ledger.publish(&state);
        Ok(())
    }

    /// Returns the held funds to the spendable balance.
    pub fn release(mut self) {
        self.release_held();
    }

    fn release_held(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;

        let ledger = self.ledger;
        let mut state = ledger.state.lock();
        let mut balances = state.balances.clone();
        let mut held = state.held.clone();
        let restored = held
            .debit(self.currency, self.amount)
            .and_then(|_| balances.credit(self.currency, self.amount));
        match restored {
            Ok(()) => {
                state.balances = balances;
                state.held = held;
                tracing::debug!(currency = %self.currency, amount = %self.amount, "Released reservation");
                ledger.publish(&state);
            }
            Err(e) => {
                tracing::error!(currency = %self.currency, amount = %self.amount, error = %e, "Failed to release reservation");
            }
        }
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        self.release_held();
    }
}
