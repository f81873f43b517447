//! Shared test helpers to reduce duplication across integration tests.

#![allow(dead_code)]

#[allow(clippy::duplicate_mod)]
#[path = "fixtures/mod.rs"]
pub mod fixtures;

use fixtures::{AdcControl, ScriptedAdc};
use std::sync::Arc;
use thermistron::{
    AcquisitionEngine, AdcChannel, ChannelConfig, ChannelSlot, CommandInterface, CommandOutcome,
    ConfigStore, Label,
};

pub type TestStore = Arc<ConfigStore<ScriptedAdc>>;
pub type TestEngine = Arc<AcquisitionEngine<ScriptedAdc>>;

// ============================================================================
// Component Creation Helpers
// ============================================================================

/// Store with board defaults over a scripted ADC.
pub fn create_store() -> (TestStore, AdcControl) {
    let (adc, control) = ScriptedAdc::new();
    (Arc::new(ConfigStore::new(adc)), control)
}

/// Store plus an initialized engine.
pub fn create_engine() -> (TestStore, TestEngine, AdcControl) {
    let (store, control) = create_store();
    let engine = Arc::new(AcquisitionEngine::init(store.clone()).unwrap());
    (store, engine, control)
}

/// Store, engine and command interface wired together.
pub fn create_interface() -> (
    TestStore,
    TestEngine,
    CommandInterface<ScriptedAdc>,
    AdcControl,
) {
    let (store, engine, control) = create_engine();
    let commands = CommandInterface::new(store.clone(), engine.clone());
    (store, engine, commands, control)
}

/// Active slot with zero calibration.
pub fn active_slot(label: &str, divider: u32, channel: u8) -> ChannelSlot {
    ChannelSlot::Active(ChannelConfig {
        label: Label::new(label).unwrap(),
        divider_resistance: divider,
        calibration_offset: 0,
        hardware_channel: AdcChannel(channel),
    })
}

// ============================================================================
// Command Execution Helpers
// ============================================================================

/// Handle a line and return the reply, failing the test if there is none.
pub fn reply(commands: &CommandInterface<ScriptedAdc>, line: &str) -> String {
    match commands.handle_line(line) {
        CommandOutcome::Reply(reply) => reply,
        CommandOutcome::Ignored => panic!("no reply for {:?}", line),
    }
}

/// Handle a line and parse the reply as JSON.
pub fn reply_json(commands: &CommandInterface<ScriptedAdc>, line: &str) -> serde_json::Value {
    let text = reply(commands, line);
    serde_json::from_str(&text).unwrap_or_else(|e| panic!("invalid JSON {:?}: {}", text, e))
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert that a reply is the error object with `code`.
pub fn assert_error_reply(reply: &str, code: &str) {
    assert_eq!(
        reply,
        format!(r#"{{"error":"{}"}}"#, code),
        "expected error '{}'",
        code
    );
}

/// Assert that a JSON reply is a flat object (no nested objects).
pub fn assert_flat_object(value: &serde_json::Value) {
    let object = value.as_object().expect("reply must be a JSON object");
    for (key, field) in object {
        assert!(!field.is_object(), "field '{}' is nested: {}", key, value);
    }
}
