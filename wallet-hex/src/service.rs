//! Conversion Engine
//!
//! Orchestrates a currency conversion: validation, balance hold, quote lookup,
//! rate application, and settlement. Contains NO infrastructure logic - the
//! quote source is injected through the `QuoteProvider` port.

use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use rust_decimal::Decimal;
use tokio::sync::{Mutex, watch};
use wallet_ledger::Ledger;
use wallet_types::{
    ConversionError, ConversionOutcome, ConversionRequest, ConversionState, Currency, PairQuote,
    QuoteProvider,
};

/// Conversion engine for one wallet screen.
///
/// Generic over `Q: QuoteProvider` - the adapter is injected at compile time.
/// This enables:
/// - Swapping quote sources without code changes
/// - Testing with a scripted provider
///
/// Conversions on one engine run one at a time; a second call waits for the
/// first to finish. Funds are reserved in the ledger before the quote is
/// requested, so engines sharing a ledger cannot overdraw it either.
pub struct ConversionEngine<Q: QuoteProvider> {
    quotes: Q,
    ledger: Arc<Ledger>,
    state: watch::Sender<ConversionState>,
    /// Bumped on every reset; results started under an older epoch are not published.
    epoch: AtomicU64,
    in_flight: Mutex<()>,
}

impl<Q: QuoteProvider> ConversionEngine<Q> {
    /// Creates an engine over the given quote source and shared ledger.
    pub fn new(quotes: Q, ledger: Arc<Ledger>) -> Self {
        let (state, _) = watch::channel(ConversionState::Idle);
        Self {
            quotes,
            ledger,
            state,
            epoch: AtomicU64::new(0),
            in_flight: Mutex::new(()),
        }
    }

    /// Returns a reference to the underlying quote provider.
    pub fn quotes(&self) -> &Q {
        &self.quotes
    }

    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    /// Returns the current workflow state.
    pub fn state(&self) -> ConversionState {
        self.state.borrow().clone()
    }

    /// Subscribes to state transitions.
    pub fn subscribe(&self) -> watch::Receiver<ConversionState> {
        self.state.subscribe()
    }

    /// Returns the workflow to `Idle`, whatever it is doing.
    ///
    /// A conversion still waiting on its quote keeps running and settles the
    /// ledger, but its final state is not published over this `Idle`.
    pub fn reset_state(&self) {
        self.state.send_modify(|state| {
            self.epoch.fetch_add(1, Ordering::SeqCst);
            *state = ConversionState::Idle;
        });
        tracing::debug!("Conversion state reset");
    }

    /// Converts `raw_amount` of `source` into `dest` at the live quote.
    ///
    /// Every failure is published as `ConversionState::Error` and returned;
    /// balances are only touched when the whole conversion succeeds.
    #[tracing::instrument(skip(self))]
    pub async fn start_conversion(
        &self,
        source: Currency,
        dest: Currency,
        raw_amount: &str,
    ) -> Result<ConversionOutcome, ConversionError> {
        let _turn = self.in_flight.lock().await;
        let epoch = self.epoch.load(Ordering::SeqCst);

        let result = self.convert(source, dest, raw_amount, epoch).await;
        match &result {
            Ok(outcome) => {
                tracing::info!(
                    source_amount = %outcome.source_amount,
                    dest_amount = %outcome.dest_amount,
                    rate = %outcome.rate,
                    "Conversion completed"
                );
                self.publish(
                    epoch,
                    ConversionState::Success {
                        dest: outcome.dest,
                        dest_amount: outcome.dest_amount,
                    },
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, "Conversion failed");
                self.publish(epoch, ConversionState::Error(e.clone()));
            }
        }
        result
    }

    async fn convert(
        &self,
        source: Currency,
        dest: Currency,
        raw_amount: &str,
        epoch: u64,
    ) -> Result<ConversionOutcome, ConversionError> {
        let request = ConversionRequest::parse(source, dest, raw_amount)?;

        // Held until settled; dropping it on any early return gives the funds back.
        let reservation = self.ledger.reserve(request.source, request.amount)?;

        self.publish(epoch, ConversionState::Loading);
        let pair = PairQuote::resolve(request.source, request.dest);
        tracing::debug!(query = %pair.pair_query, invert = pair.invert, "Fetching quote");

        let quote = self.quotes.fetch(&pair.pair_query).await?;
        let bid = quote
            .bid(&pair.response_key)
            .ok_or_else(|| ConversionError::PairNotFound(pair.response_key.clone()))?;
        let rate = Decimal::from_str(bid.trim())
            .ok()
            .and_then(|bid| pair.apply(bid))
            .ok_or_else(|| ConversionError::InvalidRate(bid.to_string()))?;
        let dest_amount = request
            .amount
            .checked_mul(rate)
            .ok_or_else(|| ConversionError::InvalidRate(rate.to_string()))?;

        reservation.settle(request.dest, dest_amount)?;

        Ok(ConversionOutcome {
            source: request.source,
            source_amount: request.amount,
            dest: request.dest,
            dest_amount,
            rate,
        })
    }

    fn publish(&self, epoch: u64, next: ConversionState) {
        let published = self.state.send_if_modified(|state| {
            if self.epoch.load(Ordering::SeqCst) != epoch {
                return false;
            }
            *state = next;
            true
        });
        if !published {
            tracing::debug!("Dropped state update from a conversion started before reset");
        }
    }
}
