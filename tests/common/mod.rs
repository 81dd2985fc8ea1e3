#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use rox::interpreter::Config;
use rox::session::{Lox, Outcome};

/// `Write` sink that tests can read back after the interpreter is done.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A session whose printed output is captured.
pub fn session() -> (Lox, SharedBuffer) {
    let buffer = SharedBuffer::default();
    let lox = Lox::with_output(Box::new(buffer.clone()));
    (lox, buffer)
}

/// Run `source` once, returning stdout and the outcome.
pub fn run(source: &str) -> (String, Outcome) {
    let (mut lox, buffer) = session();
    let outcome = lox.run(source, Config::default());
    (buffer.contents(), outcome)
}

/// Run a program that must succeed; returns its output.
pub fn run_ok(source: &str) -> String {
    let (stdout, outcome) = run(source);
    assert!(
        outcome.is_success(),
        "expected success, got {:?} (stdout so far: {:?})",
        outcome,
        stdout
    );
    stdout
}

/// Run a program that must fail at runtime; returns (stdout, diagnostic).
pub fn run_runtime_error(source: &str) -> (String, String) {
    let (stdout, outcome) = run(source);
    match outcome {
        Outcome::RuntimeError(e) => (stdout, e.to_string()),
        other => panic!("expected a runtime error, got {:?}", other),
    }
}

/// Run a program that must be rejected before execution; returns every
/// diagnostic as displayed.
pub fn static_errors(source: &str) -> Vec<String> {
    let (stdout, outcome) = run(source);
    assert!(stdout.is_empty(), "nothing may run: {:?}", stdout);
    match outcome {
        Outcome::StaticErrors(errors) => errors.iter().map(|e| e.to_string()).collect(),
        other => panic!("expected static errors, got {:?}", other),
    }
}
