use order_book_engine::instrument::*;

#[test]
fn pair_code_and_display_agree() {
    assert_eq!(BTC_USD.code(), "BTC-USD");
    assert_eq!(ETH_USD.code(), "ETH-USD");
    assert_eq!(BTC_USD.to_string(), BTC_USD.code());
}

#[test]
fn pair_fromstr_parses_supported_pairs() {
    assert_eq!("BTC-USD".parse::<Pair>().unwrap(), BTC_USD);
    assert_eq!("ETH-USD".parse::<Pair>().unwrap(), ETH_USD);
}

#[test]
fn pair_fromstr_rejects_unsupported() {
    assert!("BTC-EUR".parse::<Pair>().is_err());
}

#[test]
fn pair_symbol_matches_code() {
    assert_eq!(BTC_USD.symbol(), Symbol::new("BTC-USD"));
}

#[test]
fn crypto_usd_factory_sets_usd_quote() {
    assert_eq!(Pair::crypto_usd(Asset::BTC), BTC_USD);
    assert_eq!(Pair::crypto_usd(Asset::ETH), ETH_USD);
}

#[test]
fn supported_pairs_round_trip_through_display_and_fromstr() {
    for p in Pair::supported() {
        let parsed: Pair = p.to_string().parse().unwrap();
        assert_eq!(&parsed, p);
    }
}

#[test]
fn pair_is_hashable_and_equatable() {
    use std::collections::HashMap;
    let mut m = HashMap::new();
    m.insert(BTC_USD, 42u32);
    assert_eq!(m.get(&BTC_USD), Some(&42));
}

#[test]
fn asset_serializes_as_bare_string() {
    assert_eq!(serde_json::to_string(&Asset::BTC).unwrap(), "\"BTC\"");
    let a: Asset = serde_json::from_str("\"ETH\"").unwrap();
    assert_eq!(a, Asset::ETH);
}

#[test]
fn pair_serde_round_trips_as_object() {
    let json = serde_json::to_string(&BTC_USD).unwrap();
    let back: Pair = serde_json::from_str(&json).unwrap();
    assert_eq!(back, BTC_USD);
}
