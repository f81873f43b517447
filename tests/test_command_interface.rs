//! Command interface tests.
//!
//! Tests command replies, index translation, error shapes, the dispatcher
//! step and character-level line framing.

#[allow(clippy::duplicate_mod)]
#[path = "helpers.rs"]
mod helpers;

use helpers::fixtures::{MockIo, RecordingSink};
use thermistron::command::{self, CommandLine};
use thermistron::config::COMMAND_QUEUE_LENGTH;
use thermistron::{CharLineSink, CharLineSource, CommandOutcome, DispatchStep, Flag, LineSink, LineSource, MonitorError};

// ============================================================================
// Reply Tests
// ============================================================================

#[test]
fn test_help_reply() {
    let (_, _, commands, _) = helpers::create_interface();
    let value = helpers::reply_json(&commands, "help");
    helpers::assert_flat_object(&value);

    let list = value["commands"].as_str().unwrap();
    for phrase in ["status", "get temps", "force cache refresh", "set cal res"] {
        assert!(list.contains(phrase), "'{}' missing from help", phrase);
    }
}

#[test]
fn test_sampling_interval_commands() {
    let (store, _, commands, _) = helpers::create_interface();

    assert_eq!(
        helpers::reply(&commands, "set sampling interval 5000"),
        r#"{"sampling_interval_ms":5000}"#
    );
    assert_eq!(store.sampling_interval_ms(), 5_000);
    assert_eq!(
        helpers::reply(&commands, "get sampling interval"),
        r#"{"sampling_interval_ms":5000}"#
    );
}

#[test]
fn test_sampling_interval_rejections() {
    let (store, _, commands, _) = helpers::create_interface();

    let cases = [
        ("set sampling interval 999", "invalid_argument"),
        ("set sampling interval -5", "invalid_argument"),
        ("set sampling interval 99999999999", "invalid_argument"),
        ("set sampling interval soon", "malformed_command"),
        ("set sampling interval", "malformed_command"),
    ];
    for (line, code) in cases {
        helpers::assert_error_reply(&helpers::reply(&commands, line), code);
    }
    assert_eq!(store.sampling_interval_ms(), 10_000);
}

#[test]
fn test_toggle_commands() {
    let (store, _, commands, _) = helpers::create_interface();

    assert_eq!(
        helpers::reply(&commands, "toggle serial stream"),
        r#"{"serial_stream_active":true}"#
    );
    assert!(store.stream_active());
    assert_eq!(
        helpers::reply(&commands, "toggle temp log"),
        r#"{"temp_log_active":true}"#
    );
    assert_eq!(
        helpers::reply(&commands, "toggle serial stream"),
        r#"{"serial_stream_active":false}"#
    );
}

#[test]
fn test_calibration_commands_use_one_based_index() {
    let (store, _, commands, _) = helpers::create_interface();

    assert_eq!(
        helpers::reply(&commands, "set cal res 2 150"),
        r#"{"index":2,"cal_R":150}"#
    );
    assert_eq!(
        helpers::reply(&commands, "incr cal res 2"),
        r#"{"index":2,"cal_R":151}"#
    );
    assert_eq!(store.calibration_offset(1).unwrap(), 151);
    assert_eq!(store.calibration_offset(0).unwrap(), 0);

    assert_eq!(
        helpers::reply(&commands, "decr cal res 1"),
        r#"{"index":1,"cal_R":-1}"#
    );
    assert_eq!(store.calibration_offset(0).unwrap(), -1);
}

#[test]
fn test_calibration_index_errors() {
    let (_, _, commands, _) = helpers::create_interface();

    let cases = [
        ("incr cal res 0", "out_of_range"),
        ("incr cal res -3", "out_of_range"),
        ("decr cal res 7", "out_of_range"),
        ("set cal res 99 1", "out_of_range"),
        // Slot 6 exists but is unused
        ("incr cal res 6", "invalid_argument"),
        ("set cal res 1 3000000000", "invalid_argument"),
        ("set cal res 1", "malformed_command"),
        ("incr cal res first", "malformed_command"),
    ];
    for (line, code) in cases {
        helpers::assert_error_reply(&helpers::reply(&commands, line), code);
    }
}

#[test]
fn test_temperature_commands() {
    let (_, engine, commands, _) = helpers::create_interface();
    engine.sample_cycle();

    let status = helpers::reply(&commands, "status");
    let temps = helpers::reply(&commands, "get temps");
    assert_eq!(status, temps);

    let value: serde_json::Value = serde_json::from_str(&status).unwrap();
    assert_eq!(value["names"].as_array().unwrap().len(), 5);
    assert_eq!(value["temperatures"].as_array().unwrap().len(), 5);
}

#[test]
fn test_force_cache_refresh() {
    let (_, _, commands, control) = helpers::create_interface();

    assert_eq!(
        helpers::reply(&commands, "force cache refresh"),
        r#"{"temp_component_cache_refresh_ok":true}"#
    );

    control.fail_binds(2, true);
    helpers::assert_error_reply(
        &helpers::reply(&commands, "force cache refresh"),
        "channel_bind_failure",
    );
}

#[test]
fn test_unrecognized_lines_ignored() {
    let (_, _, commands, _) = helpers::create_interface();

    for line in ["", "   ", "reboot", "status please", "get temps now", "Help"] {
        assert_eq!(
            commands.handle_line(line),
            CommandOutcome::Ignored,
            "line {:?}",
            line
        );
    }
}

#[test]
fn test_surrounding_whitespace_trimmed() {
    let (_, _, commands, _) = helpers::create_interface();
    assert_eq!(
        helpers::reply(&commands, "  get sampling interval \r"),
        r#"{"sampling_interval_ms":10000}"#
    );
}

#[test]
fn test_every_reply_is_flat_json() {
    let (_, _, commands, _) = helpers::create_interface();
    for line in [
        "help",
        "status",
        "toggle temp log",
        "get sampling interval",
        "set cal res 3 12",
        "incr cal res 9",
        "set sampling interval x",
    ] {
        let value = helpers::reply_json(&commands, line);
        if value.get("names").is_none() {
            helpers::assert_flat_object(&value);
        }
    }
}

// ============================================================================
// Dispatcher Tests
// ============================================================================

fn line(text: &str) -> CommandLine {
    let mut line = CommandLine::new();
    line.push_str(text).unwrap();
    line
}

#[test]
fn test_dispatch_handles_queued_line() {
    let (store, _, commands, _) = helpers::create_interface();
    store.set_sampling_interval(1_000).unwrap();

    let (tx, rx) = command::command_queue();
    let mut sink = RecordingSink::default();
    tx.send(line("get sampling interval")).unwrap();
    tx.send(line("nonsense")).unwrap();

    assert_eq!(commands.dispatch_next(&rx, &mut sink), DispatchStep::Handled);
    assert_eq!(commands.dispatch_next(&rx, &mut sink), DispatchStep::Handled);
    assert_eq!(sink.lines(), vec![r#"{"sampling_interval_ms":1000}"#]);
}

#[test]
fn test_dispatch_streams_only_when_enabled() {
    let (store, engine, commands, _) = helpers::create_interface();
    store.set_sampling_interval(1_000).unwrap();
    engine.sample_cycle();

    let (_tx, rx) = command::command_queue();
    let mut sink = RecordingSink::default();

    assert_eq!(commands.dispatch_next(&rx, &mut sink), DispatchStep::Idle);
    assert!(sink.lines().is_empty());

    store.set_flag(Flag::StreamActive, true);
    assert_eq!(commands.dispatch_next(&rx, &mut sink), DispatchStep::Streamed);
    let lines = sink.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with(r#"{"names":["Therm1""#));
}

#[test]
fn test_dispatch_reports_disconnect() {
    let (_, _, commands, _) = helpers::create_interface();
    let (tx, rx) = command::command_queue();
    drop(tx);

    let mut sink = RecordingSink::default();
    assert_eq!(
        commands.dispatch_next(&rx, &mut sink),
        DispatchStep::Disconnected
    );
}

#[test]
fn test_stream_tick() {
    let (store, _, commands, _) = helpers::create_interface();
    let mut sink = RecordingSink::default();

    assert!(!commands.stream_tick(&mut sink).unwrap());
    store.set_flag(Flag::StreamActive, true);
    assert!(commands.stream_tick(&mut sink).unwrap());
    assert_eq!(sink.lines().len(), 1);
}

#[test]
fn test_queue_capacity() {
    let (tx, _rx) = command::command_queue();
    for n in 0..COMMAND_QUEUE_LENGTH {
        tx.try_send(line(&format!("incr cal res {}", n + 1))).unwrap();
    }
    assert!(tx.try_send(line("help")).is_err());
}

// ============================================================================
// Character Framing Tests
// ============================================================================

#[test]
fn test_char_source_frames_and_echoes() {
    let mut source = CharLineSource::new(MockIo::with_input("help\r\nstatus\n"));
    let mut buffer = CommandLine::new();

    assert_eq!(source.receive_line(&mut buffer).unwrap(), 4);
    assert_eq!(buffer.as_str(), "help");
    assert_eq!(source.io().output(), "help\r\n");

    assert_eq!(source.receive_line(&mut buffer).unwrap(), 6);
    assert_eq!(buffer.as_str(), "status");

    // Nothing pending
    assert_eq!(source.receive_line(&mut buffer).unwrap(), 0);
}

#[test]
fn test_char_source_keeps_partial_line() {
    let mut source = CharLineSource::new(MockIo::with_input("get te"));
    let mut buffer = CommandLine::new();

    assert_eq!(source.receive_line(&mut buffer).unwrap(), 0);
    source.io_mut().push_input("mps\r");
    assert_eq!(source.receive_line(&mut buffer).unwrap(), 9);
    assert_eq!(buffer.as_str(), "get temps");
}

#[test]
fn test_char_source_backspace() {
    let mut source = CharLineSource::new(MockIo::with_input("helq\x7fp\n"));
    let mut buffer = CommandLine::new();

    assert_eq!(source.receive_line(&mut buffer).unwrap(), 4);
    assert_eq!(buffer.as_str(), "help");
    assert!(source.io().output().contains("\x08 \x08"));
}

#[test]
fn test_char_source_overflow() {
    let long = "x".repeat(200);
    let mut source = CharLineSource::new(MockIo::with_input(&format!("{}\nhelp\n", long)));
    let mut buffer = CommandLine::new();

    assert!(matches!(
        source.receive_line(&mut buffer),
        Err(MonitorError::LineOverflow)
    ));
    assert!(buffer.is_empty());

    assert_eq!(source.receive_line(&mut buffer).unwrap(), 4);
    assert_eq!(buffer.as_str(), "help");
}

#[test]
fn test_empty_line_reports_zero() {
    let mut source = CharLineSource::new(MockIo::with_input("\r\n"));
    let mut buffer = CommandLine::new();
    assert_eq!(source.receive_line(&mut buffer).unwrap(), 0);
}

#[test]
fn test_char_sink_appends_crlf() {
    let mut sink = CharLineSink::new(MockIo::default());
    sink.send_line(r#"{"temp_log_active":true}"#).unwrap();
    assert_eq!(sink.io().output(), "{\"temp_log_active\":true}\r\n");
}
