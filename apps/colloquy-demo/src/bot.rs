//! The demo coffee-counter bot: one slot-filled order per loop iteration,
//! a menu reactor live while any question is pending.

use serde_json::Value as Json;

use colloquy_core::{
    ask_with, fill_dataframe, loop_run, on_intent, say, say_with, seq, Action, Agent, AskParams,
    Cont, EntityType, FrameDef, IntentCatalog, MessageCatalog, SlotDef, TypeCatalog,
};

pub fn agent() -> Agent {
    let main = seq([
        say("welcome").into(),
        on_intent("menu", |_| say("menu_info")).into(),
        loop_run(order_once(), false).into(),
        say("goodbye").into(),
    ]);
    Agent::new("coffeebot").with_icon("☕").with_main(main)
}

/// Collect one order and read back the receipt.
fn order_once() -> Action {
    seq([
        fill_dataframe(order_frame()).into(),
        Cont::bind(|values| say_with("receipt", values.into_resolved())),
    ])
}

fn order_frame() -> FrameDef {
    FrameDef::new("order")
        .slot(SlotDef::leaf("drink", "drink"))
        .slot(SlotDef::leaf("size", "size"))
        .slot(SlotDef::leaf("quantity", "int"))
        .with_confirm(|values| {
            let data = Json::Object(values.clone());
            ask_with(AskParams::typed("confirm_order", "yes_no").with_data(data))
                .filter(|value| value.as_str() == Some("yes"))
        })
}

pub fn types() -> TypeCatalog {
    let mut catalog = TypeCatalog::standard();
    catalog.define(EntityType::from_list(
        "drink",
        vec![
            "espresso".to_string(),
            "latte".to_string(),
            "tea".to_string(),
        ],
    ));
    catalog.define(EntityType::from_synonyms(
        "size",
        vec![
            (
                "small".to_string(),
                vec!["small".to_string(), "s".to_string()],
            ),
            (
                "large".to_string(),
                vec!["large".to_string(), "l".to_string()],
            ),
        ],
    ));
    catalog
}

pub fn intents() -> IntentCatalog {
    let mut catalog = IntentCatalog::new();
    catalog.define(
        "menu",
        vec!["menu".to_string(), "what do you have".to_string()],
    );
    catalog
}

pub fn messages() -> MessageCatalog {
    let mut catalog = MessageCatalog::new();
    let entries = [
        (
            "welcome",
            "Welcome to the coffee counter! Ask for the menu any time; 'exit' leaves.",
        ),
        ("menu_info", "Today we serve espresso, latte, and tea."),
        ("ask_drink", "What would you like to drink?"),
        (
            "ask_drink_error_1",
            "Sorry, we only serve espresso, latte, or tea. Which one?",
        ),
        ("ask_drink_error_2", "Last try: espresso, latte, or tea?"),
        ("ask_drink_help", "Type one of: espresso, latte, tea."),
        ("ask_size", "What size - small or large?"),
        ("ask_size_error_1", "Just 'small' or 'large', please."),
        ("ask_size_error_2", "Small or large?"),
        ("ask_quantity", "How many?"),
        ("ask_quantity_error_1", "A number, please - how many?"),
        ("ask_quantity_error_2", "How many? Digits only."),
        (
            "confirm_order",
            "Place the order: #{quantity} x #{size} #{drink}? (yes/no)",
        ),
        ("receipt", "Coming right up: #{quantity} x #{size} #{drink}!"),
        ("goodbye", "Thanks for stopping by!"),
    ];
    for (key, pattern) in entries {
        catalog.insert("en_US", key, pattern);
    }
    catalog
}
