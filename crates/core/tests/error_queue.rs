//! Error reporting through the parser: queue draining, eviction, and the
//! error callback.

mod common;

use common::{call_log, demo_parser, drain_errors};
use scpi_toolkit_core::limits::ERROR_CAPACITY;
use scpi_toolkit_core::{ErrorCode, ScpiParser};
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn errors_drain_oldest_first() {
    let log = call_log();
    let mut parser = demo_parser(&log);
    let mut out = Vec::new();
    parser.execute("NOPE", &mut out);
    parser.execute("ALSO:NOPE?", &mut out);
    let first = parser.get_message();
    assert_eq!(first.code, ErrorCode::UnknownCommand);
    assert_eq!(first.to_string(), "-113,\"Undefined header\"");
    assert_eq!(parser.get_message().code, ErrorCode::UnknownCommand);
    assert!(parser.get_message().is_no_error());
}

#[test]
fn sentinel_repeats_on_an_empty_queue() {
    let log = call_log();
    let mut parser = demo_parser(&log);
    assert!(parser.get_message().is_no_error());
    assert!(parser.get_message().is_no_error());
    assert_eq!(parser.pending_errors(), 0);
}

#[test]
fn full_queue_evicts_the_oldest_error() {
    let mut parser = ScpiParser::new();
    parser
        .register("RAISe", |mut ctx| ctx.raise(ErrorCode::Timeout))
        .unwrap();
    let mut out = Vec::new();

    // One handler-raised Timeout, then enough unknowns to push it out.
    parser.execute("RAIS", &mut out);
    for _ in 0..ERROR_CAPACITY {
        parser.execute("NOPE", &mut out);
    }

    let drained = drain_errors(&mut parser);
    assert_eq!(drained.len(), ERROR_CAPACITY);
    assert!(drained.iter().all(|c| *c == ErrorCode::UnknownCommand));
}

#[test]
fn handler_raise_is_queued() {
    let mut parser = ScpiParser::new();
    parser
        .register("TEST:FAIL", |mut ctx| ctx.raise(ErrorCode::BufferOverflow))
        .unwrap();
    let mut out = Vec::new();
    parser.execute("TEST:FAIL", &mut out);
    assert_eq!(drain_errors(&mut parser), [ErrorCode::BufferOverflow]);
}

#[test]
fn error_callback_sees_every_raise() {
    let seen: Rc<RefCell<Vec<ErrorCode>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);

    let mut parser = ScpiParser::new();
    parser
        .register("RAISe", |mut ctx| ctx.raise(ErrorCode::Timeout))
        .unwrap();
    parser.set_error_handler(move |code| sink.borrow_mut().push(code));

    let mut out = Vec::new();
    parser.execute("NOPE", &mut out);
    parser.execute("RAIS", &mut out);

    assert_eq!(
        seen.borrow().as_slice(),
        [ErrorCode::UnknownCommand, ErrorCode::Timeout]
    );
    // The callback observes errors; the queue still records them.
    assert_eq!(parser.pending_errors(), 2);
}

#[test]
fn callback_installed_late_misses_earlier_errors() {
    let seen: Rc<RefCell<Vec<ErrorCode>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);

    let log = call_log();
    let mut parser = demo_parser(&log);
    let mut out = Vec::new();
    parser.execute("NOPE", &mut out);
    parser.set_error_handler(move |code| sink.borrow_mut().push(code));
    parser.execute("NOPE", &mut out);

    assert_eq!(seen.borrow().len(), 1);
    assert_eq!(parser.pending_errors(), 2);
}
