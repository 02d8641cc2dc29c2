//! The built-in demo instrument: a small DMM-style command set used by the
//! `run` and `tree` subcommands.
//!
//! The instrument keeps just enough state to make the command set worth
//! exercising: an LED brightness setting and a bank of switchable outputs.
//! Measurement queries return canned readings.

use scpi_toolkit_core::{RegisterError, ScpiParser};
use std::cell::RefCell;
use std::rc::Rc;

const IDENTITY: &str = "scpi-toolkit,demo-dmm,0,0.1.0";

const OUTPUT_CHANNELS: usize = 4;

#[derive(Debug)]
struct State {
    brightness: u8,
    outputs: [bool; OUTPUT_CHANNELS],
}

impl Default for State {
    fn default() -> Self {
        Self {
            brightness: 50,
            outputs: [false; OUTPUT_CHANNELS],
        }
    }
}

/// Build a parser with the demo instrument's command set registered.
pub(crate) fn demo_parser() -> Result<ScpiParser, RegisterError> {
    let state = Rc::new(RefCell::new(State::default()));
    let mut parser = ScpiParser::new();

    parser.register("*IDN?", |mut ctx| {
        let _ = ctx.reply(IDENTITY);
    })?;

    {
        let state = Rc::clone(&state);
        parser.register("*RST", move |_| {
            *state.borrow_mut() = State::default();
        })?;
    }

    {
        let mut meas = parser.subtree("MEASure")?;
        meas.register("VOLTage:DC?", |mut ctx| {
            let _ = ctx.reply("12.500");
        })?;
        meas.register("VOLTage:AC?", |mut ctx| {
            let _ = ctx.reply("0.003");
        })?;
        meas.register("CURRent:DC?", |mut ctx| {
            let _ = ctx.reply("0.042");
        })?;
    }

    {
        let mut led = parser.subtree("SYSTem:LED")?;
        let setter = Rc::clone(&state);
        led.register("BRIGhtness", move |ctx| {
            // Out-of-range or non-numeric values leave the setting untouched.
            if let Some(arg) = ctx.args.first()
                && let Ok(value) = arg.text.parse::<u8>()
                && value <= 100
            {
                setter.borrow_mut().brightness = value;
            }
        })?;
        let getter = Rc::clone(&state);
        led.register("BRIGhtness?", move |mut ctx| {
            let value = getter.borrow().brightness;
            let _ = ctx.reply(&value.to_string());
        })?;
    }

    {
        let setter = Rc::clone(&state);
        parser.register("OUTPut#:STATe", move |ctx| {
            let Some(channel) = channel_index(ctx.numeric_suffix(0)) else {
                return;
            };
            let on = match ctx.args.first().map(|a| a.text) {
                Some(arg) => arg.eq_ignore_ascii_case("ON") || arg == "1",
                None => return,
            };
            setter.borrow_mut().outputs[channel] = on;
        })?;
        let getter = Rc::clone(&state);
        parser.register("OUTPut#:STATe?", move |mut ctx| {
            let Some(channel) = channel_index(ctx.numeric_suffix(0)) else {
                return;
            };
            let on = getter.borrow().outputs[channel];
            let _ = ctx.reply(if on { "1" } else { "0" });
        })?;
    }

    Ok(parser)
}

/// Map a 1-based `OUTPut#` suffix to an array index. A bare `OUTP` means
/// channel 1; suffixes outside the bank are ignored.
fn channel_index(suffix: Option<u32>) -> Option<usize> {
    let channel = suffix.unwrap_or(1) as usize;
    (1..=OUTPUT_CHANNELS).contains(&channel).then(|| channel - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(parser: &mut ScpiParser, message: &str) -> String {
        let mut out = Vec::new();
        parser.execute(message, &mut out);
        String::from_utf8(out).expect("utf-8 response")
    }

    #[test]
    fn identity_query() {
        let mut parser = demo_parser().unwrap();
        assert_eq!(run(&mut parser, "*IDN?"), format!("{IDENTITY}\n"));
    }

    #[test]
    fn brightness_set_and_query() {
        let mut parser = demo_parser().unwrap();
        run(&mut parser, "SYST:LED:BRIG 75");
        assert_eq!(run(&mut parser, "SYST:LED:BRIG?"), "75\n");
        // Out-of-range value is ignored.
        run(&mut parser, "SYST:LED:BRIG 250");
        assert_eq!(run(&mut parser, "SYST:LED:BRIG?"), "75\n");
    }

    #[test]
    fn rst_restores_defaults() {
        let mut parser = demo_parser().unwrap();
        run(&mut parser, "SYST:LED:BRIG 5");
        run(&mut parser, "*RST");
        assert_eq!(run(&mut parser, "SYST:LED:BRIG?"), "50\n");
    }

    #[test]
    fn outputs_are_per_channel() {
        let mut parser = demo_parser().unwrap();
        run(&mut parser, "OUTP2:STAT ON");
        assert_eq!(run(&mut parser, "OUTP1:STAT?"), "0\n");
        assert_eq!(run(&mut parser, "OUTP2:STAT?"), "1\n");
        // Bare OUTP addresses channel 1.
        run(&mut parser, "OUTP:STAT ON");
        assert_eq!(run(&mut parser, "OUTP1:STAT?"), "1\n");
    }
}
