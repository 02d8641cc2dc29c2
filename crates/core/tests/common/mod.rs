//! Shared test helpers for `scpi_toolkit_core` integration tests.

#![allow(unreachable_pub, dead_code)]

use scpi_toolkit_core::{Context, ErrorCode, ScpiParser};
use std::cell::RefCell;
use std::rc::Rc;

/// Shared record of handler invocations, `name(arg,arg)` per call.
pub type CallLog = Rc<RefCell<Vec<String>>>;

/// Fresh empty call log.
pub fn call_log() -> CallLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// Handler that appends `name(args...)` to the log on every invocation.
pub fn logging_handler(
    log: &CallLog,
    name: &'static str,
) -> impl FnMut(Context<'_, '_>) + 'static {
    let log = Rc::clone(log);
    move |ctx: Context<'_, '_>| {
        let args: Vec<&str> = ctx.args.iter().map(|a| a.text).collect();
        log.borrow_mut().push(format!("{name}({})", args.join(",")));
    }
}

/// A demo instrument command set shared by most tests.
pub fn demo_parser(log: &CallLog) -> ScpiParser {
    let mut parser = ScpiParser::new();
    parser.register("*IDN?", logging_handler(log, "idn")).unwrap();
    parser.register("*RST", logging_handler(log, "rst")).unwrap();
    parser
        .register("MEASure:VOLTage?", logging_handler(log, "volt"))
        .unwrap();
    parser
        .register("MEASure:CURRent?", logging_handler(log, "curr"))
        .unwrap();
    parser
        .register("MEASure:VOLTage:DC?", logging_handler(log, "volt_dc"))
        .unwrap();
    parser
        .register("MEASure:VOLTage:AC?", logging_handler(log, "volt_ac"))
        .unwrap();
    parser
        .register("SYSTem:LED:BRIGhtness", logging_handler(log, "brig_set"))
        .unwrap();
    parser
        .register("SYSTem:LED:BRIGhtness?", logging_handler(log, "brig_get"))
        .unwrap();
    parser
}

/// Drain every queued error code, oldest first.
pub fn drain_errors(parser: &mut ScpiParser) -> Vec<ErrorCode> {
    let mut out = Vec::new();
    loop {
        let report = parser.get_message();
        if report.is_no_error() {
            return out;
        }
        out.push(report.code);
    }
}

/// Execute one message against a throwaway sink and return the call log
/// entries it produced.
pub fn run(parser: &mut ScpiParser, log: &CallLog, message: &str) -> Vec<String> {
    let before = log.borrow().len();
    let mut sink = Vec::new();
    parser.execute(message, &mut sink);
    log.borrow()[before..].to_vec()
}
