//! Environment and store primitives.

use serde_json::json;

use colloquy_core::testkit::{expect_failure, expect_success, run_scripted};
use colloquy_core::{
    env_get, env_let, env_set, fail, seq, store_get, store_set, succeed, Action, Cont, Outcome,
};

async fn run(action: &Action) -> Outcome {
    run_scripted(action, &[]).await
}

#[tokio::test]
async fn test_env_set_succeeds_with_stored_value() {
    expect_success(&run(&env_set("a.b", 12)).await, 12);
}

#[tokio::test]
async fn test_env_get_missing_key_fails() {
    expect_failure(&run(&env_get("a.b")).await, Some("missing_value"));
}

#[tokio::test]
async fn test_env_round_trip() {
    let action = seq([env_set("a.b", 12).into(), env_get("a.b").into()]);
    expect_success(&run(&action).await, 12);
}

#[tokio::test]
async fn test_env_get_returns_nested_object() {
    let action = seq([env_set("a.b.c", 999).into(), env_get("a.b").into()]);
    expect_success(&run(&action).await, json!({ "c": 999 }));
}

#[tokio::test]
async fn test_env_let_binds_action_result() {
    let action = seq([
        env_let("a.b.c", succeed(12)).into(),
        env_get("a.b.c").into(),
    ]);
    expect_success(&run(&action).await, 12);
}

#[tokio::test]
async fn test_env_let_propagates_failure() {
    expect_failure(&run(&env_let("a.b.c", fail("boom"))).await, Some("boom"));
}

#[tokio::test]
async fn test_env_let_from_prior_value() {
    let action = seq([
        succeed(12).into(),
        Cont::bind(|value| env_set("a.b", value)),
        env_get("a.b").into(),
    ]);
    expect_success(&run(&action).await, 12);
}

#[tokio::test]
async fn test_failed_inner_chain_short_circuits_outer_reads() {
    // The inner chain fails after setting the variable; the outer chain
    // stops before reading it.
    let inner = seq([
        env_let("a.b.c", succeed(12)).into(),
        env_get("a.b.c").into(),
        fail("inner").into(),
    ]);
    let action = seq([inner.into(), env_get("a.b.c").into()]);
    expect_failure(&run(&action).await, Some("inner"));
}

#[tokio::test]
async fn test_store_round_trip() {
    let action = seq([
        store_set("backend.balance", 100).into(),
        store_get("backend.balance").into(),
    ]);
    expect_success(&run(&action).await, 100);
}

#[tokio::test]
async fn test_store_missing_key_fails() {
    expect_failure(&run(&store_get("nothing")).await, Some("missing_value"));
}

#[tokio::test]
async fn test_env_and_store_are_separate_spaces() {
    let action = seq([env_set("k", 1).into(), store_get("k").into()]);
    expect_failure(&run(&action).await, Some("missing_value"));
}
