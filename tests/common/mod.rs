#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use rox::error::RunError;
use rox::lox::Lox;

/// `Write` sink whose bytes stay readable after the session takes ownership.
#[derive(Clone, Default)]
pub struct Captured(Rc<RefCell<Vec<u8>>>);

impl Captured {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.text().lines().map(str::to_owned).collect()
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn session() -> (Lox, Captured) {
    let out = Captured::default();
    (Lox::with_output(out.clone()), out)
}

/// Run `source` in a fresh session, returning printed lines and the outcome.
pub fn run(source: &str) -> (Vec<String>, Result<(), RunError>) {
    let (mut lox, out) = session();
    let result = lox.run(source);
    (out.lines(), result)
}

/// Run a program that must succeed and return what it printed.
pub fn run_ok(source: &str) -> Vec<String> {
    let (lines, result) = run(source);
    if let Err(e) = result {
        panic!("program failed:\n{}", e);
    }
    lines
}

/// Diagnostics of a failed run, as displayed.
pub fn diagnostics(error: &RunError) -> Vec<String> {
    error.diagnostics().iter().map(|e| e.to_string()).collect()
}
