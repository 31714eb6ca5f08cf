//! Combinator contracts: sequencing, alternation, dispatch, branching,
//! guards, filters.

use serde_json::{json, Value as Json};

use colloquy_core::testkit::{expect_failure, expect_success, run_scripted, Counter};
use colloquy_core::{
    alt, alt_for, branch, call, equals, exec, fail, guard, pass, seq, seq_for, succeed,
    succeed_if, switch,
};
use colloquy_core::{Case, Cont, Outcome, Value};

async fn run(action: &colloquy_core::Action) -> Outcome {
    run_scripted(action, &[]).await
}

#[tokio::test]
async fn test_then_discards_value_and_sequences() {
    expect_success(&run(&succeed(11).then(succeed(12))).await, 12);
    expect_failure(&run(&succeed(12).then(fail("boom"))).await, Some("boom"));
}

#[tokio::test]
async fn test_bind_passes_prior_success_value() {
    let action = succeed(11).bind(|value| {
        let n = value.resolved().as_i64().unwrap_or_default();
        succeed(9 * n)
    });
    expect_success(&run(&action).await, 99);
}

#[tokio::test]
async fn test_seq_returns_last_success_value() {
    expect_success(&run(&seq([succeed("x").into()])).await, "x");
    expect_success(&run(&seq([succeed("x").into(), succeed("y").into()])).await, "y");

    let nested = seq([
        seq([succeed("x").into(), succeed("x").into()]).into(),
        succeed("y").into(),
    ]);
    expect_success(&run(&nested).await, "y");
}

#[tokio::test]
async fn test_seq_map_step_transforms_value() {
    let action = seq([
        succeed(1).into(),
        Cont::map(|value| {
            let n = value.resolved().as_i64().unwrap_or_default();
            Value::from(n + 1)
        }),
    ]);
    expect_success(&run(&action).await, 2);
}

#[tokio::test]
async fn test_seq_bind_law() {
    // seq([succeed(x), bind(f)]) behaves as f(x)
    let action = seq([
        succeed(1).into(),
        Cont::bind(|value| {
            let n = value.resolved().as_i64().unwrap_or_default();
            succeed(9 * n)
        }),
    ]);
    expect_success(&run(&action).await, 9);
}

#[tokio::test]
async fn test_seq_stops_at_first_failure() {
    let action = seq([
        succeed("x").into(),
        fail("mid").into(),
        succeed("y").into(),
    ]);
    expect_failure(&run(&action).await, Some("mid"));

    let with_map = seq([
        succeed(1).into(),
        fail("mid").into(),
        Cont::map(|value| value),
    ]);
    expect_failure(&run(&with_map).await, Some("mid"));
}

#[tokio::test]
async fn test_alt_first_success_wins() {
    expect_success(&run(&alt(vec![succeed("x"), succeed("y")])).await, "x");
    expect_success(&run(&alt(vec![fail("a"), succeed("y")])).await, "y");
    expect_success(
        &run(&alt(vec![fail("a"), succeed("x"), fail("b")])).await,
        "x",
    );
    expect_success(
        &run(&alt(vec![
            fail("a"),
            fail("b"),
            fail("c"),
            fail("d"),
            succeed(12),
        ]))
        .await,
        12,
    );
}

#[tokio::test]
async fn test_alt_fails_when_exhausted() {
    expect_failure(&run(&alt(vec![fail("a"), fail("b")])).await, None);
    expect_failure(&run(&alt(vec![fail("a")])).await, None);
    expect_failure(&run(&alt(vec![])).await, Some("alt_exhausted"));
}

#[tokio::test]
async fn test_alt_threads_context_from_failed_alternative() {
    // A failed alternative's side effects are kept: the next alternative
    // and everything after it observe them.
    use colloquy_core::{env_get, env_set};
    let action = seq([
        env_set("a", 1).into(),
        alt(vec![
            seq([env_set("a", 2).into(), fail("nope").into()]),
            succeed(true),
        ])
        .into(),
        env_get("a").into(),
    ]);
    expect_success(&run(&action).await, 2);
}

#[tokio::test]
async fn test_alt_for_first_success_wins() {
    let items = vec![json!(10), json!(20), json!(30)];
    let over = |limit: i64| {
        move |item: Json| {
            succeed_if(move |value: &Value| {
                value.resolved().as_i64().is_some_and(|n| n > limit)
            })(Value::Data(item))
        }
    };
    expect_success(&run(&alt_for(items.clone(), over(0))).await, 10);
    expect_success(&run(&alt_for(items.clone(), over(15))).await, 20);
    expect_failure(&run(&alt_for(items, over(100))).await, Some("alt_exhausted"));
    expect_failure(
        &run(&alt_for(vec![], over(0))).await,
        Some("alt_exhausted"),
    );
}

#[tokio::test]
async fn test_seq_for_folds_and_short_circuits() {
    let items = vec![json!(10), json!(20), json!(30)];
    let over = |limit: i64| {
        move |item: Json| {
            succeed_if(move |value: &Value| {
                value.resolved().as_i64().is_some_and(|n| n > limit)
            })(Value::Data(item))
        }
    };
    expect_success(&run(&seq_for(items.clone(), over(0), false)).await, 30);
    expect_failure(&run(&seq_for(items, over(20), false)).await, None);
    expect_success(&run(&seq_for(vec![], over(20), false)).await, true);
}

#[tokio::test]
async fn test_switch_dispatches_by_value_equality() {
    use colloquy_core::env_set;
    let cases = || {
        vec![
            Case::when("x", succeed("sx")),
            Case::when("y", succeed("sy")),
        ]
    };
    expect_success(&run(&switch(succeed("x"), cases())).await, "sx");
    expect_success(&run(&switch(env_set("var", "y"), cases())).await, "sy");
    expect_failure(
        &run(&switch(succeed("z"), cases())).await,
        Some("no_matching_case"),
    );

    let mut with_default = cases();
    with_default.push(Case::otherwise(succeed("sz")));
    expect_success(&run(&switch(succeed("z"), with_default)).await, "sz");
}

#[tokio::test]
async fn test_switch_discriminant_failure() {
    let action = switch(fail("boom"), vec![Case::when("x", succeed("sx"))]);
    expect_failure(&run(&action).await, Some("switch_discriminant_failed"));
}

#[tokio::test]
async fn test_branch_follows_test_outcome() {
    let sx = || succeed("x");
    let sy = || succeed("y");
    expect_success(&run(&branch(sx(), sx(), sy())).await, "x");
    expect_success(&run(&branch(fail("t"), sx(), sy())).await, "y");
    expect_success(&run(&branch(fail("t"), fail("a"), sy())).await, "y");
    expect_failure(&run(&branch(sx(), fail("a"), sy())).await, Some("a"));
    expect_failure(&run(&branch(fail("t"), sy(), fail("b"))).await, Some("b"));
}

#[tokio::test]
async fn test_branch_default_else_passes() {
    let action = branch(fail("t"), succeed("y"), pass());
    let outcome = run(&action).await;
    expect_success(&outcome, Json::Null);
}

#[tokio::test]
async fn test_guard_fails_only_on_false() {
    expect_success(&run(&guard(|_| Value::from(true))).await, true);
    expect_failure(&run(&guard(|_| Value::from(false))).await, Some("guard_failed"));
    // Zero is not false.
    expect_success(&run(&guard(|_| Value::from(0))).await, 0);
}

#[tokio::test]
async fn test_guard_inside_seq_chain() {
    let over_ten = seq([
        succeed(2).into(),
        Cont::bind(|value| {
            let n = value.resolved().as_i64().unwrap_or_default();
            guard(move |_| Value::from(n > 10))
        }),
        succeed(10).into(),
    ]);
    expect_failure(&run(&over_ten).await, Some("guard_failed"));

    let over_zero = seq([
        succeed(2).into(),
        Cont::bind(|value| {
            let n = value.resolved().as_i64().unwrap_or_default();
            guard(move |_| Value::from(n > 0))
        }),
        succeed(10).into(),
    ]);
    expect_success(&run(&over_zero).await, 10);
}

#[tokio::test]
async fn test_filter_passes_matching_values() {
    let keep = succeed(12).filter(|v| v.resolved().as_i64().is_some_and(|n| n > 10));
    expect_success(&run(&keep).await, 12);

    let drop = succeed(5).filter(|v| v.resolved().as_i64().is_some_and(|n| n > 10));
    expect_failure(&run(&drop).await, Some("filtered_out"));

    let failed = fail("boom").filter(|_| true);
    expect_failure(&run(&failed).await, Some("boom"));
}

#[tokio::test]
async fn test_equals_compares_resolved_values() {
    expect_success(&run(&equals(12, succeed(12))).await, 12);
    expect_failure(&run(&equals(10, succeed(12))).await, Some("filtered_out"));
}

#[tokio::test]
async fn test_exec_and_call() {
    expect_success(&run(&exec(|| Value::from(2))).await, 2);
    expect_success(
        &run(&call(|ctx| async move { Outcome::success(2, ctx) })).await,
        2,
    );
    expect_failure(
        &run(&call(|ctx| async move { Outcome::failure("err", ctx) })).await,
        Some("err"),
    );
}

#[tokio::test]
async fn test_map_method_transforms_success_only() {
    let mapped = succeed("x").map(|value| {
        let text = value.as_str().unwrap_or_default().to_string();
        Value::from(format!("{text}y"))
    });
    expect_success(&run(&mapped).await, "xy");

    let failed = fail("boom").map(|value| value);
    expect_failure(&run(&failed).await, Some("boom"));
}

#[tokio::test]
async fn test_cancellation_bypasses_failure_fallback() {
    use colloquy_core::cancel;
    // alt does not catch cancellation
    let alt_action = alt(vec![cancel("stop"), succeed("y")]);
    assert!(run(&alt_action).await.is_cancellation());

    // only a dedicated cancel continuation catches it
    let handled = cancel("stop").on_cancel(succeed("recovered"));
    expect_success(&run(&handled).await, "recovered");

    // or_else does not
    let or_else = cancel("stop").or_else(succeed("nope"));
    assert!(run(&or_else).await.is_cancellation());
}

#[tokio::test]
async fn test_or_else_recovers_from_failure() {
    let action = fail("boom").or_else(succeed("recovered"));
    expect_success(&run(&action).await, "recovered");
}

#[tokio::test]
async fn test_panic_becomes_runtime_fault_failure() {
    use colloquy_core::RUNTIME_FAULT;
    let action = exec(|| panic!("user code exploded"));
    let outcome = run(&action).await;
    match &outcome {
        Outcome::Failure {
            reason, message, ..
        } => {
            assert_eq!(reason, RUNTIME_FAULT);
            assert!(message.as_deref().unwrap_or_default().contains("exploded"));
        }
        other => panic!("expected runtime fault failure, got {other:?}"),
    }
    // Not interceptable by handler tables.
    let guarded = exec(|| panic!("again")).on_exception(RUNTIME_FAULT, succeed("nope"));
    assert!(run(&guarded).await.is_failure());
}

#[tokio::test]
async fn test_counter_iterates_to_bound() {
    let counter = Counter::new(Some(2));
    let (ctx, _) = colloquy_core::testkit::scripted_context(&[]);
    expect_success(&counter.iter().run(ctx.clone()).await, 1);
    expect_success(&counter.iter().run(ctx.clone()).await, 2);
    expect_failure(&counter.iter().run(ctx).await, Some("guard_failed"));
}
