use std::collections::HashMap;

use super::*;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
    move |key| map.get(key).cloned()
}

#[test]
fn defaults_when_nothing_is_set() {
    let cfg = Config::from_lookup(lookup(&[])).unwrap();
    assert_eq!(cfg, Config::default());
    assert_eq!(cfg.listen_addr(), "0.0.0.0:3000");
    assert_eq!(cfg.outbox_capacity, DEFAULT_OUTBOX_CAPACITY);
    assert_eq!(cfg.chat_max_len, DEFAULT_CHAT_MAX_LEN);
}

#[test]
fn overrides_are_parsed() {
    let cfg = Config::from_lookup(lookup(&[
        ("PORT", "8080"),
        ("BIND_ADDR", "127.0.0.1"),
        ("OUTBOX_CAPACITY", " 32 "),
        ("CHAT_MAX_LEN", "500"),
    ]))
    .unwrap();
    assert_eq!(cfg.listen_addr(), "127.0.0.1:8080");
    assert_eq!(cfg.outbox_capacity, 32);
    assert_eq!(cfg.chat_max_len, 500);
}

#[test]
fn blank_bind_addr_falls_back() {
    let cfg = Config::from_lookup(lookup(&[("BIND_ADDR", "  ")])).unwrap();
    assert_eq!(cfg.bind_addr, DEFAULT_BIND_ADDR);
}

#[test]
fn bad_port_is_an_error() {
    let err = Config::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
    assert_eq!(err.error_code(), "E_CONFIG");
    assert!(err.to_string().starts_with("PORT="));
}

#[test]
fn zero_capacity_is_rejected() {
    let err = Config::from_lookup(lookup(&[("OUTBOX_CAPACITY", "0")])).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { var: "OUTBOX_CAPACITY", .. }));
}

#[test]
fn zero_chat_limit_is_rejected() {
    let err = Config::from_lookup(lookup(&[("CHAT_MAX_LEN", "0")])).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { var: "CHAT_MAX_LEN", .. }));
}
