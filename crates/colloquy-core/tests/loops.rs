//! Loop contracts: bounded iteration, condition-driven loops, repeat.

use colloquy_core::testkit::{expect_success, run_scripted, Counter};
use colloquy_core::{fail, loop_run, loop_while, repeat, seq, succeed, Action, Cont, Outcome, Value};

async fn run(action: &Action) -> Outcome {
    run_scripted(action, &[]).await
}

#[tokio::test]
async fn test_counter_chains_accumulate() {
    let counter = Counter::new(Some(5));
    let action = seq([
        counter.iter().into(),
        counter.iter().into(),
        counter.count().into(),
    ]);
    expect_success(&run(&action).await, 2);
}

#[tokio::test]
async fn test_counter_reset_between_steps() {
    let counter = Counter::new(Some(5));
    let reset = counter.clone();
    let action = seq([
        counter.iter().into(),
        Cont::map(move |_| {
            reset.reset();
            Value::from(true)
        }),
        counter.count().into(),
    ]);
    expect_success(&run(&action).await, 0);
}

#[tokio::test]
async fn test_independent_counters() {
    let first = Counter::new(Some(5));
    let second = Counter::new(Some(5));
    let action = seq([
        first.iter().into(),
        first.iter().into(),
        second.iter().into(),
    ]);
    expect_success(&run(&action).await, 1);
    assert_eq!(first.value(), 2);
    assert_eq!(second.value(), 1);
}

#[tokio::test]
async fn test_loop_stops_at_first_failing_iteration() {
    let counter = Counter::new(Some(5));
    let action = seq([
        loop_run(counter.iter(), false).into(),
        counter.count().into(),
    ]);
    // Five successful iterations, the sixth fails and ends the loop.
    expect_success(&run(&action).await, 5);
}

#[tokio::test]
async fn test_loop_succeeds_with_failed_iteration_context() {
    use colloquy_core::{env_get, env_set};
    // The failing iteration's side effects survive the loop exit.
    let counter = Counter::new(Some(2));
    let body = seq([env_set("seen", true).into(), counter.iter().into()]);
    let action = seq([loop_run(body, false).into(), env_get("seen").into()]);
    expect_success(&run(&action).await, true);
}

#[tokio::test]
async fn test_loop_while_runs_until_condition_fails() {
    let counter = Counter::new(Some(5));
    let action = seq([
        loop_while(counter.iter(), succeed(true)).into(),
        counter.count().into(),
    ]);
    expect_success(&run(&action).await, 5);
}

#[tokio::test]
async fn test_loop_while_swallows_body_failures() {
    let counter = Counter::new(Some(5));
    let action = seq([
        loop_while(counter.iter(), fail("body")).into(),
        counter.count().into(),
    ]);
    expect_success(&run(&action).await, 5);
}

#[tokio::test]
async fn test_loop_while_zero_iterations() {
    let counter = Counter::new(Some(5));
    let action = seq([
        loop_while(fail("cond"), counter.iter()).into(),
        counter.count().into(),
    ]);
    expect_success(&run(&action).await, 0);
}

#[tokio::test]
async fn test_repeat_returns_last_result() {
    expect_success(&run(&repeat(3, succeed(12))).await, 12);
    expect_success(&run(&repeat(1, succeed(12))).await, 12);
}

#[tokio::test]
async fn test_repeat_runs_exactly_n_times() {
    let counter = Counter::new(None);
    let action = seq([repeat(3, counter.iter()).into(), counter.count().into()]);
    expect_success(&run(&action).await, 3);
}

#[tokio::test]
async fn test_repeat_stops_on_failure() {
    let outcome = run(&repeat(12, fail("boom"))).await;
    assert!(outcome.is_failure());
}

#[tokio::test]
async fn test_repeat_zero_or_negative_runs_nothing() {
    let counter = Counter::new(None);
    let action = seq([repeat(0, counter.iter()).into(), counter.count().into()]);
    expect_success(&run(&action).await, 0);

    let counter = Counter::new(None);
    let action = seq([repeat(-3, counter.iter()).into(), counter.count().into()]);
    expect_success(&run(&action).await, 0);

    expect_success(&run(&repeat(0, fail("never runs"))).await, true);
}
