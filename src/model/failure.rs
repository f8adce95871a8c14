//! Uniform view over whatever made an operation fail.

use std::any::Any;
use std::error::Error;

const FALLBACK_TYPE_NAME: &str = "Error";
const PANIC_TYPE_NAME: &str = "Panic";

/// Failure handed to classifiers and listeners.
///
/// Either a returned error (downcastable through [`Failure::error`]) or a
/// caught panic.
#[derive(Debug, Clone, Copy)]
pub struct Failure<'a> {
    type_name: &'a str,
    message: FailureMessage<'a>,
    error: Option<&'a (dyn Error + 'static)>,
    panic: bool,
}

#[derive(Debug, Clone, Copy)]
enum FailureMessage<'a> {
    Error(&'a (dyn Error + 'static)),
    Text(&'a str),
}

impl<'a> Failure<'a> {
    pub fn from_error<E>(error: &'a E) -> Self
    where
        E: Error + 'static,
    {
        Self {
            type_name: simple_type_name(std::any::type_name::<E>()),
            message: FailureMessage::Error(error),
            error: Some(error),
            panic: false,
        }
    }

    /// View over a caught panic payload.
    pub fn from_panic(payload: &'a (dyn Any + Send)) -> Self {
        let text = payload
            .downcast_ref::<&'static str>()
            .copied()
            .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
            .unwrap_or("panic");
        Self {
            type_name: PANIC_TYPE_NAME,
            message: FailureMessage::Text(text),
            error: None,
            panic: true,
        }
    }

    /// Concrete type name without module path or generics.
    pub fn type_name(&self) -> &'a str {
        self.type_name
    }

    pub fn message(&self) -> String {
        match self.message {
            FailureMessage::Error(e) => e.to_string(),
            FailureMessage::Text(t) => t.to_string(),
        }
    }

    pub fn error(&self) -> Option<&'a (dyn Error + 'static)> {
        self.error
    }

    pub fn downcast_ref<T: Error + 'static>(&self) -> Option<&'a T> {
        self.error.and_then(|e| e.downcast_ref::<T>())
    }

    pub fn is_panic(&self) -> bool {
        self.panic
    }
}

const WRAPPERS: &[&str] = &["Box", "Arc", "Rc"];

/// `my_crate::errors::NotFound<u32>` → `NotFound`.
///
/// References and `Box`/`Arc`/`Rc` are looked through, so
/// `alloc::boxed::Box<my_crate::Locked>` → `Locked`. Trait objects have no
/// static name and fall back to `Error`.
pub(crate) fn simple_type_name(full: &str) -> &str {
    let mut current = full.trim();
    loop {
        current = current
            .trim_start_matches('&')
            .trim_start_matches("mut ")
            .trim_start();
        if current.starts_with("dyn ") {
            return FALLBACK_TYPE_NAME;
        }

        let (path, args) = match current.split_once('<') {
            Some((path, args)) => (path, Some(args)),
            None => (current, None),
        };
        let simple = path.rsplit("::").next().unwrap_or(path).trim();

        match args {
            Some(args) if WRAPPERS.contains(&simple) => current = first_argument(args),
            _ if simple.is_empty() => return FALLBACK_TYPE_NAME,
            _ => return simple,
        }
    }
}

/// `A<B, C>, D>` → `A<B, C>`.
fn first_argument(args: &str) -> &str {
    let mut depth = 0usize;
    for (i, c) in args.char_indices() {
        match c {
            '<' => depth += 1,
            '>' if depth == 0 => return args[..i].trim(),
            '>' => depth -= 1,
            ',' if depth == 0 => return args[..i].trim(),
            _ => {}
        }
    }
    args.trim()
}
