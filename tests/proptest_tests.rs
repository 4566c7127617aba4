//! Property-based tests for the aggregation and formatting rules.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use anexo::aggregate::{compact_voided, group_sales, period_total_sales};
use anexo::core::*;
use anexo::document::format;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ── Strategies ──────────────────────────────────────────────────────────────

/// Amounts from 0.00 to 99999.99, always in whole cents.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (0u64..10_000_000u64).prop_map(|cents| Decimal::new(cents as i64, 2))
}

fn arb_customer() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("1790012345001"),
        Just("0998877665001"),
        Just("1712345678"),
    ]
}

fn arb_doc_type() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("01"), Just("04"), Just("05")]
}

fn arb_channel() -> impl Strategy<Value = EmissionChannel> {
    prop_oneof![
        Just(EmissionChannel::Physical),
        Just(EmissionChannel::Electronic),
    ]
}

fn arb_state() -> impl Strategy<Value = RecordState> {
    prop_oneof![
        Just(RecordState::Validated),
        Just(RecordState::IncludedInAts),
        Just(RecordState::Draft),
        Just(RecordState::Voided),
    ]
}

fn arb_sale() -> impl Strategy<Value = SaleRecord> {
    (
        arb_customer(),
        arb_doc_type(),
        arb_channel(),
        arb_state(),
        arb_amount(),
        arb_amount(),
        1u8..=4u8,
    )
        .prop_map(|(customer, doc_type, channel, state, base, iva, estab)| {
            SaleRecord {
                id: format!("s-{customer}-{doc_type}"),
                customer_id_type: "04".to_string(),
                customer_id: customer.to_string(),
                customer_name: "CLIENTE".to_string(),
                document_type: doc_type.to_string(),
                establishment: estab.to_string(),
                channel,
                emission_date: date(2024, 6, 15),
                bases: TaxBases {
                    zero_rated: dec!(0),
                    iva_rated: base,
                    non_object: dec!(0),
                    exempt: dec!(0),
                },
                iva,
                ice: dec!(0),
                withheld_iva: dec!(0),
                withheld_income: dec!(0),
                total_sale: base + iva,
                payment_methods: vec!["01".to_string()],
                related_party: false,
                state,
            }
        })
}

fn arb_sales() -> impl Strategy<Value = Vec<SaleRecord>> {
    prop::collection::vec(arb_sale(), 0..40)
}

fn arb_stub() -> impl Strategy<Value = VoidedDocumentStub> {
    (arb_doc_type(), 1u8..=2u8, 1u64..200u64).prop_map(|(doc_type, estab, seq)| {
        VoidedDocumentStub {
            document_type: doc_type.to_string(),
            document: DocumentRef::new(estab.to_string(), "1", seq.to_string(), "999"),
        }
    })
}

fn arb_stubs() -> impl Strategy<Value = Vec<VoidedDocumentStub>> {
    prop::collection::vec(arb_stub(), 0..60)
}

// ── Grouping ────────────────────────────────────────────────────────────────

proptest! {
    /// Grouping never gains or loses money or documents, whatever the
    /// input order or mix of lifecycle states.
    #[test]
    fn grouping_preserves_counts_and_sums(sales in arb_sales()) {
        let groups = group_sales(&sales);

        let declarable: Vec<_> = sales
            .iter()
            .filter(|s| s.state.is_declarable())
            .collect();

        let grouped_count: u32 = groups.iter().map(|g| g.document_count).sum();
        prop_assert_eq!(grouped_count as usize, declarable.len());

        let grouped_total: Decimal = groups.iter().map(|g| g.total).sum();
        let input_total: Decimal = declarable.iter().map(|s| s.total_sale).sum();
        prop_assert_eq!(grouped_total, input_total);

        let grouped_iva: Decimal = groups.iter().map(|g| g.iva).sum();
        let input_iva: Decimal = declarable.iter().map(|s| s.iva).sum();
        prop_assert_eq!(grouped_iva, input_iva);
    }

    /// One group per (customer, document type) pair, never more.
    #[test]
    fn grouping_keys_are_unique(sales in arb_sales()) {
        let groups = group_sales(&sales);
        let mut keys: Vec<_> = groups
            .iter()
            .map(|g| (g.customer_id.clone(), g.document_type.clone()))
            .collect();
        keys.sort();
        keys.dedup();
        prop_assert_eq!(keys.len(), groups.len());
    }

    /// Electronic documents count toward groups but never toward the
    /// period sales total.
    #[test]
    fn period_total_ignores_electronic(sales in arb_sales()) {
        let total = period_total_sales(&sales, &[]);
        let expected: Decimal = sales
            .iter()
            .filter(|s| s.state.is_declarable() && s.channel == EmissionChannel::Physical)
            .map(|s| s.total_sale)
            .sum();
        prop_assert_eq!(total, expected);
    }
}

// ── Voided compaction ───────────────────────────────────────────────────────

proptest! {
    /// Compaction covers every stub exactly once: range widths add up to
    /// the stub count and every sequential lands inside a range of its key.
    #[test]
    fn compaction_is_lossless(stubs in arb_stubs()) {
        let ranges = compact_voided(&stubs);

        let covered: u64 = ranges.iter().map(|r| r.end - r.start + 1).sum();
        prop_assert_eq!(covered, stubs.len() as u64);

        for stub in &stubs {
            let seq: u64 = stub.document.sequential.parse().unwrap();
            let hit = ranges.iter().any(|r| {
                r.document_type == stub.document_type
                    && r.establishment == stub.document.establishment
                    && r.point_of_emission == stub.document.point_of_emission
                    && (r.start..=r.end).contains(&seq)
            });
            prop_assert!(hit, "sequential {} not covered", seq);
        }
    }

    /// Within one document key the ranges come out in ascending order.
    #[test]
    fn compaction_orders_ranges(stubs in arb_stubs()) {
        let ranges = compact_voided(&stubs);
        for pair in ranges.windows(2) {
            let same_key = pair[0].document_type == pair[1].document_type
                && pair[0].establishment == pair[1].establishment
                && pair[0].point_of_emission == pair[1].point_of_emission;
            if same_key {
                prop_assert!(pair[0].start <= pair[1].start);
                prop_assert!(pair[0].end <= pair[1].end);
            }
        }
    }
}

// ── Formatting ──────────────────────────────────────────────────────────────

proptest! {
    /// Money always renders with exactly two decimals and reparses to the
    /// same value.
    #[test]
    fn money_has_two_decimals(amount in arb_amount()) {
        let text = format::money(amount);
        let (_, frac) = text.split_once('.').expect("decimal point");
        prop_assert_eq!(frac.len(), 2);
        let back: Decimal = text.parse().unwrap();
        prop_assert_eq!(back, amount);
    }

    /// Plain digit authorizations pass through byte for byte.
    #[test]
    fn digit_authorizations_survive(digits in "[0-9]{1,49}") {
        prop_assert_eq!(format::authorization(&digits), digits);
    }

    /// Scientific notation never reaches the declaration.
    #[test]
    fn rescued_authorizations_have_no_exponent(
        mantissa in 1u64..10_000u64,
        exponent in 1u32..=20u32,
    ) {
        let raw = format!("{mantissa}E{exponent}");
        let cleaned = format::authorization(&raw);
        prop_assert!(!cleaned.contains(['e', 'E']), "got {cleaned}");
        prop_assert!(cleaned.chars().all(|c| c.is_ascii_digit()));
    }

    /// Legal names come out printable: alphanumerics and single spaces,
    /// padded to at least five characters, capped at five hundred.
    #[test]
    fn legal_names_are_clean(raw in "\\PC{0,60}") {
        let cleaned = format::clean_legal_name(&raw);
        let len = cleaned.chars().count();
        prop_assert!((5..=500).contains(&len));
        prop_assert!(cleaned.chars().all(|c| c.is_alphanumeric() || c == ' '));
        // Words are joined by single spaces; only the length padding may
        // append runs of them.
        prop_assert!(!cleaned.trim_end().contains("  "), "double space in {cleaned:?}");
    }
}
