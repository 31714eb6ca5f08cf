//! Slot-filling dialogues: the fill loop, dynamic requiredness, slot
//! commands, confirmation.

use std::sync::Arc;

use serde_json::json;

use colloquy_core::testkit::{
    expect_failure, expect_success, read_answer, run_scripted, run_scripted_with_output,
};
use colloquy_core::{
    fill_dataframe, frame_get, seq, slot_set, succeed, with_dataframe, CollectingOutput,
    Conversation, EntityType, FrameDef, ReactorLevel, ScriptedSource, SlotDef, TypeCatalog,
};

fn two_slot_form() -> FrameDef {
    FrameDef::new("form")
        .slot(SlotDef::leaf("a", "any"))
        .slot(SlotDef::leaf("b", "any").optional())
}

#[tokio::test]
async fn test_fill_collects_required_and_skips_optional() {
    let outcome = run_scripted(&fill_dataframe(two_slot_form()), &["answer", "yes"]).await;
    expect_success(&outcome, json!({ "a": "answer", "b": null }));
}

#[tokio::test]
async fn test_fill_uses_derived_ask_prompts_and_confirm() {
    let (outcome, texts) =
        run_scripted_with_output(&fill_dataframe(two_slot_form()), &["answer", "yes"]).await;
    assert!(outcome.is_success());
    assert_eq!(texts, vec!["ask_a", "confirm"]);
}

#[tokio::test]
async fn test_fill_confirmation_failure_fails_whole_fill() {
    let outcome = run_scripted(&fill_dataframe(two_slot_form()), &["answer", "no"]).await;
    expect_failure(&outcome, Some("confirmation_failure"));
}

#[tokio::test]
async fn test_fill_asks_slots_in_declaration_order() {
    let def = FrameDef::new("order")
        .slot(SlotDef::group(
            "contact",
            vec![SlotDef::leaf("name", "any"), SlotDef::leaf("phone", "any")],
        ))
        .slot(SlotDef::leaf("item", "any"));
    let (outcome, texts) =
        run_scripted_with_output(&fill_dataframe(def), &["Homer", "555", "tea", "yes"]).await;
    expect_success(
        &outcome,
        json!({ "contact": null, "name": "Homer", "phone": "555", "item": "tea" }),
    );
    assert_eq!(texts, vec!["ask_name", "ask_phone", "ask_item", "confirm"]);
}

#[tokio::test]
async fn test_dynamic_required_slot_asked_only_when_triggered() {
    let def = || {
        FrameDef::new("transfer")
            .slot(SlotDef::leaf("kind", "any"))
            .slot(
                SlotDef::leaf("phone", "any")
                    .required_when(|values| values.get("kind") == Some(&json!("callback"))),
            )
    };
    expect_success(
        &run_scripted(&fill_dataframe(def()), &["chat", "yes"]).await,
        json!({ "kind": "chat", "phone": null }),
    );
    expect_success(
        &run_scripted(&fill_dataframe(def()), &["callback", "555", "yes"]).await,
        json!({ "kind": "callback", "phone": "555" }),
    );
}

#[tokio::test]
async fn test_explicit_slot_dialog_replaces_generated_ask() {
    let def = FrameDef::new("form")
        .slot(SlotDef::leaf("a", "any").with_dialog(succeed("fixed")))
        .slot(SlotDef::leaf("b", "any").with_prompt("which_b"));
    let (outcome, texts) = run_scripted_with_output(&fill_dataframe(def), &["beta", "yes"]).await;
    expect_success(&outcome, json!({ "a": "fixed", "b": "beta" }));
    assert_eq!(texts, vec!["which_b", "confirm"]);
}

#[tokio::test]
async fn test_set_command_fills_slot_between_prompts() {
    let def = FrameDef::new("form")
        .slot(SlotDef::leaf("a", "any"))
        .slot(SlotDef::leaf("b", "any"));
    let (outcome, texts) =
        run_scripted_with_output(&fill_dataframe(def), &["#set b beta", "alpha", "yes"]).await;
    expect_success(&outcome, json!({ "a": "alpha", "b": "beta" }));
    assert!(texts.contains(&"Changed b to beta".to_string()));
    // b never gets its own prompt.
    assert!(!texts.contains(&"ask_b".to_string()));
}

#[tokio::test]
async fn test_show_and_reset_commands_report_and_clear() {
    let def = FrameDef::new("form")
        .slot(SlotDef::leaf("a", "any"))
        .slot(SlotDef::leaf("b", "any"));
    let answers = [
        "#set b beta",
        "#show b",
        "#reset b",
        "alpha",
        "beta again",
        "yes",
    ];
    let (outcome, texts) = run_scripted_with_output(&fill_dataframe(def), &answers).await;
    expect_success(&outcome, json!({ "a": "alpha", "b": "beta again" }));
    assert!(texts.contains(&"The current value of b is: **beta**".to_string()));
    assert!(texts.contains(&"Reset value for: b".to_string()));
}

#[tokio::test]
async fn test_showchoices_command_lists_type_choices() {
    let mut types = TypeCatalog::standard();
    types.define(EntityType::from_list(
        "size",
        vec!["small".to_string(), "large".to_string()],
    ));
    let output = Arc::new(CollectingOutput::new());
    let conversation = Conversation::builder()
        .source(Arc::new(ScriptedSource::new(
            ["#showchoices size", "small", "yes"]
                .iter()
                .map(|answer| read_answer(answer)),
        )))
        .output(output.clone())
        .types(Arc::new(types))
        .build();

    let def = FrameDef::new("cup").slot(SlotDef::leaf("size", "size"));
    let outcome = fill_dataframe(def).run(conversation.context()).await;
    expect_success(&outcome, json!({ "size": "small" }));
    assert!(output
        .texts()
        .contains(&"Choices for size: small, large".to_string()));
}

#[tokio::test]
async fn test_with_dataframe_scope_cleans_up_on_exit() {
    let def = FrameDef::new("scoped").slot(SlotDef::leaf("a", "any"));
    let action = with_dataframe(def, |_| succeed(true));
    let outcome = run_scripted(&action, &[]).await;
    assert!(outcome.is_success());
    let ctx = outcome.ctx();
    assert!(ctx.frame("scoped").is_none());
    assert!(ctx.reactors.at_level(ReactorLevel::Dataframe).is_empty());
}

#[tokio::test]
async fn test_frame_accessors_inside_scope() {
    let def = FrameDef::new("form").slot(SlotDef::leaf("a", "any"));
    let action = with_dataframe(def, |_| {
        seq([
            slot_set("form", "a", "alpha").into(),
            frame_get("form").into(),
        ])
    });
    expect_success(&run_scripted(&action, &[]).await, json!({ "a": "alpha" }));
}

#[tokio::test]
async fn test_invalid_frame_definition_is_fatal() {
    let def = FrameDef::new("broken").slot(SlotDef::group("empty", vec![]));
    let outcome = run_scripted(&fill_dataframe(def), &[]).await;
    assert!(outcome.is_exception());
}

#[tokio::test]
async fn test_custom_confirm_dialog_sees_collected_values() {
    let def = FrameDef::new("form")
        .slot(SlotDef::leaf("a", "any"))
        .with_confirm(|values| {
            let a = values.get("a").cloned().unwrap_or_default();
            if a == json!("alpha") {
                succeed(true)
            } else {
                colloquy_core::fail("wrong_value")
            }
        });
    expect_success(
        &run_scripted(&fill_dataframe(def), &["alpha"]).await,
        json!({ "a": "alpha" }),
    );
}
