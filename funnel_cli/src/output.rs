//! Invocation and summary lines, as plain text or JSON lines.

use std::io::Write;

use eyre::{Result, WrapErr};
use serde::Serialize;
use serde_json::{Value, json};

pub struct Printer<W: Write> {
    out: W,
    json: bool,
}

impl<W: Write> Printer<W> {
    pub fn new(out: W, json: bool) -> Self {
        Self { out, json }
    }

    /// One effect invocation at `at_ms` after the start of the run.
    pub fn invocation(&mut self, at_ms: u64, value: &impl Serialize) -> Result<()> {
        let value = serde_json::to_value(value).wrap_err("serialize invocation value")?;
        if self.json {
            writeln!(self.out, "{}", json!({ "at_ms": at_ms, "value": value }))?;
        } else {
            writeln!(self.out, "{at_ms:>8} ms  {}", plain(&value))?;
        }
        self.out.flush()?;
        Ok(())
    }

    pub fn summary(&mut self, calls: u64, invocations: u64) -> Result<()> {
        if self.json {
            writeln!(
                self.out,
                "{}",
                json!({ "summary": { "calls": calls, "invocations": invocations } })
            )?;
        } else {
            writeln!(self.out, "calls={calls} invocations={invocations}")?;
        }
        self.out.flush()?;
        Ok(())
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Strings print bare, everything else as compact JSON.
fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
