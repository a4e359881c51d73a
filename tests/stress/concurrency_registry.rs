//! Concurrency test: many threads registering and attesting through one
//! shared registry.
//!
//! Validates that check-then-mutate sequences stay indivisible: exactly one
//! caller wins each contested binding and each attestor signs once.

use std::sync::{Arc, Barrier};
use std::thread;

use agent_registry::{
    Principal, Registry, RegistryConfig, RegistryError, RegistryEvent, SharedRegistry,
};

fn p(s: impl Into<String>) -> Principal {
    Principal::new(s).expect("valid principal")
}

fn shared(attestors: usize) -> SharedRegistry {
    let attestors = (0..attestors).map(|i| p(format!("attestor-{i}"))).collect();
    let config = RegistryConfig::new(p("registrar"), attestors)
        .expect("valid config");
    SharedRegistry::new(Registry::new(config))
}

#[test]
fn stress_contested_owner_has_one_winner() {
    let reg = shared(0);
    let barrier = Arc::new(Barrier::new(32));

    let handles: Vec<_> = (0..32)
        .map(|t| {
            let reg = reg.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                reg.register(
                    &p("registrar"),
                    p("contested-owner"),
                    p(format!("agent-{t}")),
                )
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let wins = results.iter().filter(|r| r.is_ok()).count();
    let already = results
        .iter()
        .filter(|r| matches!(r, Err(RegistryError::AlreadyRegistered)))
        .count();

    assert_eq!(wins, 1);
    assert_eq!(already, 31);
    assert_eq!(reg.len(), 1);

    // The winning agent is the only one indexed.
    let indexed = (0..32)
        .filter(|t| reg.get_account_by_agent(&p(format!("agent-{t}"))).is_some())
        .count();
    assert_eq!(indexed, 1);
}

#[test]
fn stress_contested_agent_has_one_winner() {
    let reg = shared(0);
    let barrier = Arc::new(Barrier::new(16));

    let handles: Vec<_> = (0..16)
        .map(|t| {
            let reg = reg.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                reg.register(
                    &p("registrar"),
                    p(format!("owner-{t}")),
                    p("contested-agent"),
                )
                .is_ok()
            })
        })
        .collect();

    let wins = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();
    assert_eq!(wins, 1);
    assert_eq!(reg.len(), 1);
}

#[test]
fn stress_parallel_attestors_each_sign_once() {
    const ATTESTORS: usize = 8;
    let reg = shared(ATTESTORS);
    let owner = p("owner");
    reg.register(&p("registrar"), owner.clone(), p("agent"))
        .unwrap();

    // Every attestor tries to sign ten times from its own thread.
    let handles: Vec<_> = (0..ATTESTORS)
        .map(|i| {
            let reg = reg.clone();
            let owner = owner.clone();
            thread::spawn(move || {
                (0..10)
                    .filter(|_| reg.attest(&p(format!("attestor-{i}")), &owner).is_ok())
                    .count()
            })
        })
        .collect();

    for h in handles {
        assert_eq!(h.join().unwrap(), 1, "each attestor signs exactly once");
    }

    assert_eq!(
        reg.get_attestation_level(&owner),
        Some(1 + ATTESTORS as u32)
    );

    // Levels reported by the events are exactly 2..=max, each once.
    let mut levels: Vec<u32> = reg.read(|r| {
        r.sink()
            .events()
            .iter()
            .filter_map(|e| match e {
                RegistryEvent::AccountAttested {
                    new_attestation_level,
                    ..
                } => Some(*new_attestation_level),
                _ => None,
            })
            .collect()
    });
    levels.sort_unstable();
    assert_eq!(levels, (2..=1 + ATTESTORS as u32).collect::<Vec<_>>());
}

#[test]
fn stress_many_threads_many_accounts() {
    let reg = shared(2);

    let handles: Vec<_> = (0..20)
        .map(|t| {
            let reg = reg.clone();
            thread::spawn(move || {
                for i in 0..50 {
                    let owner = p(format!("owner-{t}-{i}"));
                    reg.register(
                        &p("registrar"),
                        owner.clone(),
                        p(format!("agent-{t}-{i}")),
                    )
                    .expect("unique pair registers");
                    reg.attest(&p("attestor-0"), &owner)
                        .expect("first signature succeeds");
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(reg.len(), 1_000);
    assert!(reg.is_account_attested(&p("owner-7-42"), 2));
    assert!(!reg.is_account_attested(&p("owner-7-42"), 3));
}
