//! Edge case tests: role collisions, self-binding, empty attestor sets,
//! invalid configurations, sinks, and identities that look alike.

use agent_registry::{
    AccountStore, EventLog, EventSink, LogSink, Principal, Registry, RegistryConfig,
    RegistryError, RegistryEvent,
};

fn p(s: &str) -> Principal {
    Principal::new(s).expect("valid principal")
}

fn config() -> RegistryConfig {
    RegistryConfig::new(p("registrar"), vec![p("attestor-a"), p("attestor-b")])
        .expect("valid config")
}

// === Registration Edge Cases ===

#[test]
fn edge_agent_cannot_become_owner() {
    let mut reg = Registry::new(config());
    reg.register(&p("registrar"), p("alice"), p("alice-bot"))
        .unwrap();

    let result = reg.register(&p("registrar"), p("alice-bot"), p("other-bot"));
    assert!(matches!(result, Err(RegistryError::AlreadyRegistered)));
    assert!(reg.get_account_by_agent(&p("other-bot")).is_none());
}

#[test]
fn edge_owner_cannot_become_agent() {
    let mut reg = Registry::new(config());
    reg.register(&p("registrar"), p("alice"), p("alice-bot"))
        .unwrap();

    let result = reg.register(&p("registrar"), p("bob"), p("alice"));
    assert!(matches!(result, Err(RegistryError::AlreadyRegistered)));
    assert!(reg.get_account_by_owner(&p("bob")).is_none());
}

#[test]
fn edge_self_binding_has_its_own_error() {
    let mut reg = Registry::new(config());
    let result = reg.register(&p("registrar"), p("alice"), p("alice"));
    assert!(matches!(result, Err(RegistryError::InvalidBinding(_))));
    assert_eq!(result.unwrap_err().code(), 807);
}

#[test]
fn edge_registrar_may_bind_configured_identities() {
    // Attestors and the registrar are ordinary identities as far as
    // bindings are concerned.
    let mut reg = Registry::new(config());
    reg.register(&p("registrar"), p("registrar"), p("registrar-bot"))
        .unwrap();
    reg.register(&p("registrar"), p("attestor-a"), p("attestor-a-bot"))
        .unwrap();

    assert_eq!(reg.attest(&p("attestor-a"), &p("attestor-a")).unwrap(), 2);
    assert_eq!(reg.attest(&p("attestor-b"), &p("registrar")).unwrap(), 2);
}

#[test]
fn edge_failed_operations_emit_nothing() {
    let mut reg = Registry::new(config());
    let _ = reg.register(&p("mallory"), p("alice"), p("alice-bot"));
    let _ = reg.attest(&p("mallory"), &p("alice"));
    let _ = reg.attest(&p("attestor-a"), &p("alice"));
    assert!(reg.sink().is_empty());
}

// === Attestation Edge Cases ===

#[test]
fn edge_attestation_is_per_account() {
    let mut reg = Registry::new(config());
    reg.register(&p("registrar"), p("alice"), p("alice-bot"))
        .unwrap();
    reg.register(&p("registrar"), p("bob"), p("bob-bot"))
        .unwrap();

    reg.attest(&p("attestor-a"), &p("alice")).unwrap();
    // The same attestor may still sign a different account.
    assert_eq!(reg.attest(&p("attestor-a"), &p("bob")).unwrap(), 2);
    assert!(!reg.has_attestor_signed(&p("bob"), &p("attestor-b")));
}

#[test]
fn edge_attest_by_agent_key_is_not_found() {
    let mut reg = Registry::new(config());
    reg.register(&p("registrar"), p("alice"), p("alice-bot"))
        .unwrap();

    // Attestation targets owners; the agent identity is not a key.
    let result = reg.attest(&p("attestor-a"), &p("alice-bot"));
    assert!(matches!(result, Err(RegistryError::AccountNotFound(_))));
}

#[test]
fn edge_empty_attestor_set() {
    let config = RegistryConfig::new(p("registrar"), vec![]).unwrap();
    let mut reg = Registry::new(config);
    reg.register(&p("registrar"), p("alice"), p("alice-bot"))
        .unwrap();

    assert_eq!(reg.get_registry_config().max_attestation_level(), 1);
    assert!(reg.is_account_attested(&p("alice"), 1));
    assert!(!reg.is_account_attested(&p("alice"), 2));
    assert!(matches!(
        reg.attest(&p("registrar"), &p("alice")),
        Err(RegistryError::NotAttestor(_))
    ));
}

#[test]
fn edge_similar_identities_are_distinct() {
    let mut reg = Registry::new(config());
    reg.register(&p("registrar"), p("alice"), p("alice-bot"))
        .unwrap();

    assert!(!reg.is_attestor(&p("Attestor-a")));
    assert!(reg.get_account_by_owner(&p("Alice")).is_none());
    assert!(reg
        .register(&p("registrar"), p("Alice"), p("Alice-bot"))
        .is_ok());
}

// === Configuration Edge Cases ===

#[test]
fn edge_invalid_configs() {
    assert!(matches!(
        RegistryConfig::new(p("r"), vec![p("a"), p("b"), p("a")]),
        Err(RegistryError::InvalidConfig(_))
    ));
    assert!(matches!(
        RegistryConfig::new(p("r"), vec![p("r")]),
        Err(RegistryError::InvalidConfig(_))
    ));
}

#[test]
fn edge_principal_rejects_blank_identity() {
    assert!(matches!(
        Principal::new("   "),
        Err(RegistryError::InvalidPrincipal(_))
    ));
}

// === Sink Edge Cases ===

#[test]
fn edge_log_sink_registry() {
    let mut reg = Registry::with_sink(config(), LogSink);
    reg.register(&p("registrar"), p("alice"), p("alice-bot"))
        .unwrap();
    assert_eq!(reg.attest(&p("attestor-b"), &p("alice")).unwrap(), 2);
}

#[test]
fn edge_custom_sink_counts_tags() {
    #[derive(Default)]
    struct TagCounter {
        registered: usize,
        attested: usize,
    }

    impl EventSink for TagCounter {
        fn emit(&mut self, event: RegistryEvent) {
            match event {
                RegistryEvent::AccountRegistered { .. } => self.registered += 1,
                RegistryEvent::AccountAttested { .. } => self.attested += 1,
            }
        }
    }

    let mut reg = Registry::with_sink(config(), TagCounter::default());
    reg.register(&p("registrar"), p("alice"), p("alice-bot"))
        .unwrap();
    reg.attest(&p("attestor-a"), &p("alice")).unwrap();
    reg.attest(&p("attestor-b"), &p("alice")).unwrap();
    let _ = reg.attest(&p("attestor-b"), &p("alice"));

    assert_eq!(reg.sink().registered, 1);
    assert_eq!(reg.sink().attested, 2);
}

#[test]
fn edge_borrowed_sink() {
    let mut log = EventLog::new();
    {
        let mut reg = Registry::with_sink(config(), &mut log);
        reg.register(&p("registrar"), p("alice"), p("alice-bot"))
            .unwrap();
    }
    assert_eq!(log.len(), 1);
}

#[test]
fn edge_from_parts_with_store_from_other_config() {
    let mut reg = Registry::new(config());
    reg.register(&p("registrar"), p("alice"), p("alice-bot"))
        .unwrap();
    reg.attest(&p("attestor-a"), &p("alice")).unwrap();
    let (_, accounts, _) = reg.into_parts();

    // A configuration that no longer lists attestor-a cannot adopt the
    // signed record.
    let other = RegistryConfig::new(p("registrar"), vec![p("attestor-b")])
        .unwrap();
    let result = Registry::from_parts(other, accounts.clone(), EventLog::new());
    assert!(matches!(result, Err(RegistryError::InvalidFileFormat(_))));

    let same = Registry::from_parts(config(), accounts, EventLog::new())
        .unwrap();
    assert_eq!(same.get_attestation_level(&p("alice")), Some(2));

    assert!(AccountStore::new().is_empty());
}
