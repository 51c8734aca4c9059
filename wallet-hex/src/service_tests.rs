//! ConversionEngine unit tests.

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use tokio::sync::Semaphore;

    use wallet_ledger::Ledger;
    use wallet_types::{
        Balances, ConversionError, ConversionState, Currency, QuoteError, QuoteItem,
        QuoteProvider, RawQuote,
    };

    use crate::ConversionEngine;

    /// Scripted quote source that records every query it receives.
    pub struct MockQuotes {
        responses: Mutex<HashMap<String, Result<RawQuote, QuoteError>>>,
        calls: Mutex<Vec<String>>,
        gate: Option<Semaphore>,
    }

    impl MockQuotes {
        pub fn new() -> Self {
            Self {
                responses: Mutex::new(HashMap::new()),
                calls: Mutex::new(Vec::new()),
                gate: None,
            }
        }

        /// Every fetch waits for a permit added with `open_gate`.
        pub fn gated() -> Self {
            Self {
                gate: Some(Semaphore::new(0)),
                ..Self::new()
            }
        }

        pub fn with_bid(self, query: &str, key: &str, bid: &str) -> Self {
            let (code, codein) = query.split_once('-').unwrap();
            let quote = RawQuote::from_iter([(key.to_string(), QuoteItem::new(code, codein, bid))]);
            self.with_response(query, Ok(quote))
        }

        pub fn with_response(self, query: &str, response: Result<RawQuote, QuoteError>) -> Self {
            self.responses
                .lock()
                .unwrap()
                .insert(query.to_string(), response);
            self
        }

        pub fn open_gate(&self) {
            if let Some(gate) = &self.gate {
                gate.add_permits(1);
            }
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl QuoteProvider for MockQuotes {
        async fn fetch(&self, query: &str) -> Result<RawQuote, QuoteError> {
            self.calls.lock().unwrap().push(query.to_string());
            if let Some(gate) = &self.gate {
                gate.acquire().await.unwrap().forget();
            }
            self.responses
                .lock()
                .unwrap()
                .get(query)
                .cloned()
                .unwrap_or(Err(QuoteError::Http(404)))
        }
    }

    fn setup(quotes: MockQuotes) -> (ConversionEngine<Arc<MockQuotes>>, Arc<MockQuotes>) {
        let quotes = Arc::new(quotes);
        let engine = ConversionEngine::new(quotes.clone(), Arc::new(Ledger::new()));
        (engine, quotes)
    }

    async fn wait_for_loading(engine: &ConversionEngine<Arc<MockQuotes>>) {
        let mut rx = engine.subscribe();
        tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| s.is_loading()))
            .await
            .unwrap()
            .unwrap();
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Successful conversions
    // ─────────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_convert_usd_to_brl() {
        let (engine, quotes) = setup(MockQuotes::new().with_bid("USD-BRL", "USDBRL", "5.10"));

        let outcome = engine
            .start_conversion(Currency::USD, Currency::BRL, "100")
            .await
            .unwrap();

        assert_eq!(outcome.dest_amount, dec!(510.00));
        assert_eq!(outcome.rate, dec!(5.10));
        assert_eq!(
            engine.state(),
            ConversionState::Success {
                dest: Currency::BRL,
                dest_amount: dec!(510.00)
            }
        );
        assert_eq!(engine.ledger().balance(Currency::USD), dec!(49900.00));
        assert_eq!(engine.ledger().balance(Currency::BRL), dec!(100510.00));
        assert_eq!(engine.ledger().balance(Currency::BTC), dec!(0.5));
        assert_eq!(quotes.calls(), vec!["USD-BRL"]);
    }

    #[tokio::test]
    async fn test_convert_brl_to_btc_inverts_rate() {
        let (engine, quotes) = setup(MockQuotes::new().with_bid("BTC-BRL", "BTCBRL", "400000"));

        let outcome = engine
            .start_conversion(Currency::BRL, Currency::BTC, "4000")
            .await
            .unwrap();

        assert_eq!(quotes.calls(), vec!["BTC-BRL"]);
        assert_eq!(outcome.rate, dec!(0.0000025));
        assert_eq!(outcome.dest_amount, dec!(0.01));
        assert_eq!(engine.ledger().balance(Currency::BRL), dec!(96000));
        assert_eq!(engine.ledger().balance(Currency::BTC), dec!(0.51));
    }

    #[tokio::test]
    async fn test_convert_btc_to_usd_uses_direct_pair() {
        let (engine, quotes) = setup(MockQuotes::new().with_bid("BTC-USD", "BTCUSD", "60000.50"));

        let outcome = engine
            .start_conversion(Currency::BTC, Currency::USD, "0,1")
            .await
            .unwrap();

        assert_eq!(quotes.calls(), vec!["BTC-USD"]);
        assert_eq!(outcome.dest_amount, dec!(6000.05));
        assert_eq!(engine.ledger().balance(Currency::BTC), dec!(0.4));
        assert_eq!(engine.ledger().balance(Currency::USD), dec!(56000.05));
    }

    #[tokio::test]
    async fn test_comma_and_dot_amounts_convert_identically() {
        let quotes = MockQuotes::new().with_bid("USD-BRL", "USDBRL", "5");
        let (engine, _) = setup(quotes);

        let comma = engine
            .start_conversion(Currency::USD, Currency::BRL, "10,50")
            .await
            .unwrap();
        let dot = engine
            .start_conversion(Currency::USD, Currency::BRL, "10.50")
            .await
            .unwrap();

        assert_eq!(comma.source_amount, dec!(10.50));
        assert_eq!(comma, dot);
    }

    #[tokio::test]
    async fn test_whole_balance_can_be_converted() {
        let (engine, _) = setup(MockQuotes::new().with_bid("BTC-BRL", "BTCBRL", "300000"));

        engine
            .start_conversion(Currency::BTC, Currency::BRL, "0.5")
            .await
            .unwrap();

        assert_eq!(engine.ledger().balance(Currency::BTC), Decimal::ZERO);
        assert_eq!(engine.ledger().balance(Currency::BRL), dec!(250000));
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Validation failures (no network call)
    // ─────────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_invalid_amounts_rejected() {
        let (engine, quotes) = setup(MockQuotes::new().with_bid("USD-BRL", "USDBRL", "5.10"));
        let before = engine.ledger().snapshot();

        for raw in ["0", "-5", "abc"] {
            let result = engine
                .start_conversion(Currency::USD, Currency::BRL, raw)
                .await;

            assert!(matches!(result, Err(ConversionError::InvalidAmount(_))));
            assert!(matches!(
                engine.state(),
                ConversionState::Error(ConversionError::InvalidAmount(_))
            ));
        }

        assert!(quotes.calls().is_empty());
        assert_eq!(engine.ledger().snapshot(), before);
    }

    #[tokio::test]
    async fn test_same_currency_rejected_without_network_call() {
        let (engine, quotes) = setup(MockQuotes::new());

        let result = engine
            .start_conversion(Currency::BRL, Currency::BRL, "10")
            .await;

        assert_eq!(result, Err(ConversionError::SameCurrency(Currency::BRL)));
        assert_eq!(
            engine.state(),
            ConversionState::Error(ConversionError::SameCurrency(Currency::BRL))
        );
        assert!(quotes.calls().is_empty());
    }

    #[tokio::test]
    async fn test_insufficient_balance_rejected_without_network_call() {
        let (engine, quotes) = setup(MockQuotes::new().with_bid("BTC-BRL", "BTCBRL", "350000"));

        let result = engine
            .start_conversion(Currency::BTC, Currency::BRL, "0.5001")
            .await;

        assert!(matches!(
            result,
            Err(ConversionError::InsufficientBalance {
                currency: Currency::BTC,
                ..
            })
        ));
        assert!(quotes.calls().is_empty());
        assert_eq!(engine.ledger().balance(Currency::BTC), dec!(0.5));
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Quote failures (balances untouched)
    // ─────────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_missing_pair_is_pair_not_found() {
        let (engine, _) = setup(MockQuotes::new().with_bid("USD-BRL", "BRLUSD", "0.19"));
        let before = engine.ledger().snapshot();

        let result = engine
            .start_conversion(Currency::USD, Currency::BRL, "100")
            .await;

        assert_eq!(result, Err(ConversionError::PairNotFound("USDBRL".into())));
        assert_eq!(engine.ledger().snapshot(), before);
        assert_eq!(engine.ledger().held(Currency::USD), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_bad_bids_are_invalid_rate() {
        for bid in ["abc", "0", "-5.10", ""] {
            let (engine, _) = setup(MockQuotes::new().with_bid("USD-BRL", "USDBRL", bid));
            let before = engine.ledger().snapshot();

            let result = engine
                .start_conversion(Currency::USD, Currency::BRL, "100")
                .await;

            assert!(
                matches!(result, Err(ConversionError::InvalidRate(_))),
                "bid {bid:?} should be rejected"
            );
            assert_eq!(engine.ledger().snapshot(), before);
        }
    }

    #[tokio::test]
    async fn test_quote_errors_surface_as_error_state() {
        let cases = [
            (QuoteError::Network("connection refused".into()), ConversionError::Network("connection refused".into())),
            (QuoteError::Http(503), ConversionError::Http(503)),
            (QuoteError::Parse("expected value".into()), ConversionError::Parse("expected value".into())),
            (QuoteError::EmptyBody, ConversionError::EmptyBody),
        ];

        for (quote_error, expected) in cases {
            let (engine, _) = setup(MockQuotes::new().with_response("USD-BRL", Err(quote_error)));
            let before = engine.ledger().snapshot();

            let result = engine
                .start_conversion(Currency::USD, Currency::BRL, "100")
                .await;

            assert_eq!(result, Err(expected.clone()));
            assert_eq!(engine.state(), ConversionState::Error(expected));
            assert_eq!(engine.ledger().snapshot(), before);
            assert_eq!(engine.ledger().held(Currency::USD), Decimal::ZERO);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // State machine
    // ─────────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_reset_state_always_returns_to_idle() {
        let (engine, _) = setup(MockQuotes::new().with_bid("USD-BRL", "USDBRL", "5.10"));
        engine.reset_state();
        assert_eq!(engine.state(), ConversionState::Idle);

        engine
            .start_conversion(Currency::USD, Currency::BRL, "1")
            .await
            .unwrap();
        engine.reset_state();
        assert_eq!(engine.state(), ConversionState::Idle);

        let _ = engine
            .start_conversion(Currency::USD, Currency::BRL, "abc")
            .await;
        engine.reset_state();
        assert_eq!(engine.state(), ConversionState::Idle);
    }

    #[tokio::test]
    async fn test_loading_is_published_while_quote_pending() {
        let quotes = MockQuotes::gated().with_bid("USD-BRL", "USDBRL", "5.10");
        let (engine, quotes) = setup(quotes);
        let engine = Arc::new(engine);

        let task = {
            let engine = engine.clone();
            tokio::spawn(async move {
                engine
                    .start_conversion(Currency::USD, Currency::BRL, "100")
                    .await
            })
        };

        wait_for_loading(&engine).await;
        assert_eq!(engine.ledger().balance(Currency::USD), dec!(49900));
        assert_eq!(engine.ledger().held(Currency::USD), dec!(100));
        assert_eq!(engine.ledger().balance(Currency::BRL), dec!(100000));

        quotes.open_gate();
        task.await.unwrap().unwrap();

        assert!(matches!(engine.state(), ConversionState::Success { .. }));
        assert_eq!(engine.ledger().held(Currency::USD), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_late_result_after_reset_keeps_idle() {
        let quotes = MockQuotes::gated().with_bid("USD-BRL", "USDBRL", "5.10");
        let (engine, quotes) = setup(quotes);
        let engine = Arc::new(engine);

        let task = {
            let engine = engine.clone();
            tokio::spawn(async move {
                engine
                    .start_conversion(Currency::USD, Currency::BRL, "100")
                    .await
            })
        };

        wait_for_loading(&engine).await;
        engine.reset_state();
        quotes.open_gate();
        let outcome = task.await.unwrap().unwrap();

        assert_eq!(outcome.dest_amount, dec!(510.00));
        assert_eq!(engine.state(), ConversionState::Idle);
        assert_eq!(engine.ledger().balance(Currency::BRL), dec!(100510.00));
    }

    #[tokio::test]
    async fn test_conversions_on_one_engine_are_serialized() {
        let quotes = MockQuotes::gated().with_bid("USD-BRL", "USDBRL", "5");
        let (engine, quotes) = setup(quotes);
        let engine = Arc::new(engine);

        let first = {
            let engine = engine.clone();
            tokio::spawn(async move {
                engine
                    .start_conversion(Currency::USD, Currency::BRL, "30000")
                    .await
            })
        };
        wait_for_loading(&engine).await;

        let second = {
            let engine = engine.clone();
            tokio::spawn(async move {
                engine
                    .start_conversion(Currency::USD, Currency::BRL, "30000")
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(quotes.calls().len(), 1);

        quotes.open_gate();
        first.await.unwrap().unwrap();

        // The second request is validated against the updated balance.
        let result = second.await.unwrap();
        assert!(matches!(
            result,
            Err(ConversionError::InsufficientBalance { .. })
        ));
        assert_eq!(quotes.calls().len(), 1);
        assert_eq!(engine.ledger().balance(Currency::USD), dec!(20000));
    }

    #[tokio::test]
    async fn test_engines_sharing_a_ledger_cannot_double_spend() {
        let ledger = Arc::new(Ledger::with_balances(
            Balances::new(dec!(0), dec!(100), dec!(0)).unwrap(),
        ));
        let quotes = Arc::new(MockQuotes::gated().with_bid("USD-BRL", "USDBRL", "5"));
        let first_engine = Arc::new(ConversionEngine::new(quotes.clone(), ledger.clone()));
        let second_engine = ConversionEngine::new(quotes.clone(), ledger.clone());

        let first = {
            let engine = first_engine.clone();
            tokio::spawn(async move {
                engine
                    .start_conversion(Currency::USD, Currency::BRL, "70")
                    .await
            })
        };
        let mut rx = first_engine.subscribe();
        tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| s.is_loading()))
            .await
            .unwrap()
            .unwrap();

        let second = second_engine
            .start_conversion(Currency::USD, Currency::BRL, "70")
            .await;
        assert!(matches!(
            second,
            Err(ConversionError::InsufficientBalance { .. })
        ));

        quotes.open_gate();
        first.await.unwrap().unwrap();

        assert_eq!(ledger.balance(Currency::USD), dec!(30));
        assert_eq!(ledger.balance(Currency::BRL), dec!(350));
        assert_eq!(quotes.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_observers_see_balance_updates() {
        let (engine, _) = setup(MockQuotes::new().with_bid("USD-BRL", "USDBRL", "5.10"));
        let mut balances = engine.ledger().subscribe();
        balances.borrow_and_update();

        engine
            .start_conversion(Currency::USD, Currency::BRL, "100")
            .await
            .unwrap();

        assert!(balances.has_changed().unwrap());
        assert_eq!(
            balances.borrow_and_update().get(Currency::BRL),
            dec!(100510.00)
        );
    }
}
